use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use stackpick_core::errors::{EvaluationError, RecipeError};
use stackpick_core::project::ProjectDefinition;
use stackpick_core::recipe::RecipeDefinition;
use stackpick_core::recommendation::Recommendation;

use crate::loader::load_recipes;
use crate::registry::TestRegistry;
use crate::rules::RuleEvaluator;

/// Ranks loaded recipes for a project.
///
/// The recipe set is immutable after construction and can be shared between
/// concurrent computations.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    recipes: Vec<Arc<RecipeDefinition>>,
    registry: Arc<TestRegistry>,
}

impl RecommendationEngine {
    /// Build an engine over recipes that are already in memory, in the given order.
    pub fn new(recipes: Vec<RecipeDefinition>, registry: TestRegistry) -> Self {
        Self {
            recipes: recipes.into_iter().map(Arc::new).collect(),
            registry: Arc::new(registry),
        }
    }

    /// Load recipes from directories. Any malformed recipe fails construction.
    pub fn load<P: AsRef<Path>>(dirs: &[P], registry: TestRegistry) -> Result<Self, RecipeError> {
        Ok(Self::new(load_recipes(dirs)?, registry))
    }

    pub fn recipes(&self) -> impl Iterator<Item = &RecipeDefinition> {
        self.recipes.iter().map(|r| r.as_ref())
    }

    pub fn recipe(&self, id: &str) -> Option<&RecipeDefinition> {
        self.recipes().find(|r| r.id == id)
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// Evaluate every recipe and return the applicable ones, highest priority first.
    ///
    /// Equal priorities keep recipe load order. Recipes that fail their rules
    /// or end with a negative priority are left out. A configuration or test
    /// error aborts the whole computation.
    pub async fn compute_recommendations(
        &self,
        project: &ProjectDefinition,
        additional_replacements: Option<HashMap<String, String>>,
    ) -> Result<Vec<Recommendation>, EvaluationError> {
        let replacements = additional_replacements.unwrap_or_default();
        let evaluator = RuleEvaluator::new(&self.registry);
        let mut recommendations = Vec::new();

        for recipe in &self.recipes {
            let results = evaluator.evaluate(recipe, project).await?;
            if !results.include {
                tracing::debug!(recipe = %recipe.id, "recipe excluded by rules");
                continue;
            }

            let priority = recipe.priority.saturating_add(results.priority_adjustment);
            // Negative priority means never recommend.
            if priority < 0 {
                tracing::debug!(recipe = %recipe.id, priority, "recipe excluded by negative priority");
                continue;
            }

            recommendations.push(Recommendation::new(
                Arc::clone(recipe),
                project.project_path.clone(),
                priority,
                replacements.clone(),
            ));
        }

        // Stable: ties stay in load order.
        recommendations.sort_by(|a, b| b.computed_priority().cmp(&a.computed_priority()));

        tracing::info!(
            project = %project.project_path.display(),
            evaluated = self.recipes.len(),
            recommended = recommendations.len(),
            "recommendations computed"
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackpick_core::recipe::{EffectOptions, RuleGroup, RuleTest};

    fn sdk_is(value: &str) -> RuleTest {
        RuleTest::new("MSProjectSdkAttribute", json!({ "value": value }))
    }

    fn ids(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations.iter().map(|r| r.recipe_id()).collect()
    }

    fn web_project(dir: &Path) -> ProjectDefinition {
        ProjectDefinition::new(dir.join("WebApp.csproj"), "Web")
    }

    fn engine(recipes: Vec<RecipeDefinition>) -> RecommendationEngine {
        RecommendationEngine::new(recipes, TestRegistry::with_builtins())
    }

    fn recipe_b() -> RecipeDefinition {
        RecipeDefinition::new("B", 50).with_rule(
            RuleGroup::new(vec![RuleTest::new(
                "FileExists",
                json!({ "fileName": "Dockerfile" }),
            )])
            .on_pass(EffectOptions::adjust(20)),
        )
    }

    #[tokio::test]
    async fn sdk_match_keeps_base_priority() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = RecipeDefinition::new("A", 100).with_rule(
            RuleGroup::new(vec![sdk_is("Web")]).on_fail(EffectOptions::include(false)),
        );
        let recs = engine(vec![recipe])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert_eq!(ids(&recs), vec!["A"]);
        assert_eq!(recs[0].computed_priority(), 100);
    }

    #[tokio::test]
    async fn dockerfile_adds_priority() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
        let recs = engine(vec![recipe_b()])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert_eq!(ids(&recs), vec!["B"]);
        assert_eq!(recs[0].computed_priority(), 70);
    }

    #[tokio::test]
    async fn missing_dockerfile_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let recs = engine(vec![recipe_b()])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn negative_priority_excludes_even_when_included() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = RecipeDefinition::new("C", 10).with_rule(
            RuleGroup::new(vec![RuleTest::new(
                "NuGetPackageReference",
                json!({ "packageName": "Foo" }),
            )])
            .on_fail(EffectOptions {
                include: Some(true),
                priority_adjustment: Some(-50),
            }),
        );
        let recs = engine(vec![recipe])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn zero_priority_is_still_recommended() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = RecipeDefinition::new("Z", 10).with_rule(
            RuleGroup::new(vec![sdk_is("Web")]).on_pass(EffectOptions::adjust(-10)),
        );
        let recs = engine(vec![recipe])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert_eq!(recs[0].computed_priority(), 0);
    }

    #[tokio::test]
    async fn ties_keep_load_order() {
        let dir = tempfile::tempdir().unwrap();
        let rule = || RuleGroup::new(vec![sdk_is("Web")]);
        let recipes = vec![
            RecipeDefinition::new("D", 5).with_rule(rule()),
            RecipeDefinition::new("Low", 1).with_rule(rule()),
            RecipeDefinition::new("E", 5).with_rule(rule()),
            RecipeDefinition::new("High", 9).with_rule(rule()),
        ];
        let engine = engine(recipes);
        let project = web_project(dir.path());

        let first = engine.compute_recommendations(&project, None).await.unwrap();
        assert_eq!(ids(&first), vec!["High", "D", "E", "Low"]);

        let second = engine.compute_recommendations(&project, None).await.unwrap();
        assert_eq!(ids(&first), ids(&second));
        let priorities = |r: &[Recommendation]| -> Vec<i32> {
            r.iter().map(Recommendation::computed_priority).collect()
        };
        assert_eq!(priorities(&first), priorities(&second));
    }

    #[tokio::test]
    async fn recipe_without_rules_is_never_recommended() {
        let dir = tempfile::tempdir().unwrap();
        let recs = engine(vec![RecipeDefinition::new("Bare", 1000)])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn unknown_test_aborts_computation() {
        let dir = tempfile::tempdir().unwrap();
        let good = RecipeDefinition::new("Good", 10).with_rule(RuleGroup::new(vec![sdk_is("Web")]));
        let bad = RecipeDefinition::new("Bad", 10)
            .with_rule(RuleGroup::new(vec![RuleTest::new("HasDockerCompose", json!({}))]));
        let err = engine(vec![good, bad])
            .compute_recommendations(&web_project(dir.path()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidRecipeDefinition { .. }));
    }

    #[tokio::test]
    async fn replacements_reach_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = RecipeDefinition::new("A", 1)
            .with_rule(RuleGroup::new(vec![sdk_is("Web")]))
            .with_option_setting(stackpick_core::recipe::OptionSettingItem::new(
                "StackName",
                Some(json!("{ProjectName}-{Env}")),
            ));
        let mut replacements = HashMap::new();
        replacements.insert("{Env}".to_string(), "staging".to_string());
        let recs = engine(vec![recipe])
            .compute_recommendations(&web_project(dir.path()), Some(replacements))
            .await
            .unwrap();
        assert_eq!(
            recs[0].get_option_setting_value("StackName"),
            Some(json!("WebApp-staging"))
        );
        assert_eq!(recs[0].project_path(), dir.path().join("WebApp.csproj"));
    }

    #[tokio::test]
    async fn shared_engine_serves_concurrent_projects() {
        let web = tempfile::tempdir().unwrap();
        let worker = tempfile::tempdir().unwrap();
        let recipe = RecipeDefinition::new("A", 1).with_rule(RuleGroup::new(vec![sdk_is("Web")]));
        let engine = Arc::new(engine(vec![recipe]));

        let web_project = web_project(web.path());
        let worker_project = ProjectDefinition::new(worker.path().join("Worker.csproj"), "Worker");

        let (a, b) = tokio::join!(
            engine.compute_recommendations(&web_project, None),
            engine.compute_recommendations(&worker_project, None)
        );
        assert_eq!(a.unwrap().len(), 1);
        assert!(b.unwrap().is_empty());
    }

    /// Counts its runs and never completes.
    struct Hang {
        calls: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl stackpick_core::traits::RecommendationTest for Hang {
        async fn execute(
            &self,
            _input: stackpick_core::traits::RecommendationTestInput<'_>,
        ) -> Result<bool, stackpick_core::errors::TestError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn timeout_cancels_and_discards_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut registry = TestRegistry::with_builtins();
        registry
            .register("Hang", Arc::new(Hang { calls: calls.clone() }))
            .unwrap();

        let recipes = vec![
            RecipeDefinition::new("Ready", 10).with_rule(RuleGroup::new(vec![sdk_is("Web")])),
            RecipeDefinition::new("Stuck", 10)
                .with_rule(RuleGroup::new(vec![RuleTest::new("Hang", json!({}))])),
            RecipeDefinition::new("Later", 10).with_rule(RuleGroup::new(vec![sdk_is("Web")])),
        ];
        let engine = RecommendationEngine::new(recipes, registry);
        let project = web_project(dir.path());

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            engine.compute_recommendations(&project, None),
        )
        .await;
        assert!(outcome.is_err(), "computation should have timed out");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn lookup_by_id() {
        let engine = engine(vec![RecipeDefinition::new("A", 1), RecipeDefinition::new("B", 2)]);
        assert_eq!(engine.recipe("B").map(|r| r.priority), Some(2));
        assert!(engine.recipe("C").is_none());
        assert_eq!(engine.recipes().count(), 2);
    }
}
