use async_trait::async_trait;

use crate::errors::TestError;
use crate::project::ProjectDefinition;
use crate::recipe::RuleTest;

/// Everything a test sees while it runs.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationTestInput<'a> {
    pub test: &'a RuleTest,
    pub project: &'a ProjectDefinition,
    pub recipe_id: &'a str,
}

/// A named predicate over a project, referenced from recipes by its registry key.
///
/// Implementations may perform I/O. The evaluator awaits each test before
/// starting the next one in the same rule group.
#[async_trait]
pub trait RecommendationTest: Send + Sync {
    /// Returns `Ok(true)` when the project satisfies the test's condition.
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError>;
}
