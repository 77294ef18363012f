use stackpick_core::errors::EvaluationError;
use stackpick_core::project::ProjectDefinition;
use stackpick_core::recipe::{RecipeDefinition, RuleEffect, RuleGroup};
use stackpick_core::traits::RecommendationTestInput;

use crate::registry::TestRegistry;

/// Outcome of evaluating one recipe's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesResult {
    pub include: bool,
    pub priority_adjustment: i32,
}

/// Evaluates a recipe's rule groups against a project.
///
/// Algorithm:
/// 1. No rule groups → excluded
/// 2. Every group runs in declaration order; tests inside a group run one at a
///    time and stop at the first failure
/// 3. The group's vote is the effect's `include` when set, else the raw outcome;
///    votes are ANDed
/// 4. The effect's priority adjustment is summed whatever the vote
pub struct RuleEvaluator<'a> {
    registry: &'a TestRegistry,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(registry: &'a TestRegistry) -> Self {
        Self { registry }
    }

    pub async fn evaluate(
        &self,
        recipe: &RecipeDefinition,
        project: &ProjectDefinition,
    ) -> Result<RulesResult, EvaluationError> {
        if recipe.recommendation_rules.is_empty() {
            return Ok(RulesResult {
                include: false,
                priority_adjustment: 0,
            });
        }

        let mut results = RulesResult {
            include: true,
            priority_adjustment: 0,
        };

        for (index, group) in recipe.recommendation_rules.iter().enumerate() {
            let passed = self.run_group(recipe, group, project).await?;

            results.include &= should_include(group.effect.as_ref(), passed);

            if let Some(adjustment) = group
                .effect
                .as_ref()
                .and_then(|e| e.options_for(passed))
                .and_then(|o| o.priority_adjustment)
            {
                results.priority_adjustment =
                    results.priority_adjustment.saturating_add(adjustment);
            }

            tracing::debug!(
                recipe = %recipe.id,
                group = index,
                passed,
                include = results.include,
                adjustment = results.priority_adjustment,
                "rule group evaluated"
            );
        }

        Ok(results)
    }

    /// Run a group's tests in order. An empty group passes.
    async fn run_group(
        &self,
        recipe: &RecipeDefinition,
        group: &RuleGroup,
        project: &ProjectDefinition,
    ) -> Result<bool, EvaluationError> {
        for test in &group.tests {
            let implementation = self.registry.resolve(&test.test_type).map_err(|_| {
                EvaluationError::InvalidRecipeDefinition {
                    recipe_id: recipe.id.clone(),
                    test_type: test.test_type.clone(),
                }
            })?;

            let input = RecommendationTestInput {
                test,
                project,
                recipe_id: &recipe.id,
            };
            let pass = implementation
                .execute(input)
                .await
                .map_err(|source| EvaluationError::TestFailed {
                    recipe_id: recipe.id.clone(),
                    test_type: test.test_type.clone(),
                    source,
                })?;

            if !pass {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A group's inclusion vote: an explicit `include` on the matching branch wins,
/// otherwise the raw outcome stands.
pub fn should_include(effect: Option<&RuleEffect>, passed: bool) -> bool {
    effect
        .and_then(|e| e.options_for(passed))
        .and_then(|o| o.include)
        .unwrap_or(passed)
}
