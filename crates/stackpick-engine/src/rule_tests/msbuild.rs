use async_trait::async_trait;

use stackpick_core::errors::TestError;
use stackpick_core::traits::{RecommendationTest, RecommendationTestInput};

/// Passes when a build property is set to one of `allowedValues` (exact match).
pub struct MsPropertyTest;

impl MsPropertyTest {
    pub const NAME: &'static str = "MSProperty";
}

#[async_trait]
impl RecommendationTest for MsPropertyTest {
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError> {
        let condition = &input.test.condition;
        let property = condition.require_str(Self::NAME, "propertyName")?;
        let allowed = condition.str_list(Self::NAME, "allowedValues")?;

        Ok(input
            .project
            .get_property_value(property)
            .is_some_and(|value| allowed.contains(&value)))
    }
}

/// Passes when a build property exists with a non-empty value.
pub struct MsPropertyExistsTest;

impl MsPropertyExistsTest {
    pub const NAME: &'static str = "MSPropertyExists";
}

#[async_trait]
impl RecommendationTest for MsPropertyExistsTest {
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError> {
        let property = input
            .test
            .condition
            .require_str(Self::NAME, "propertyName")?;

        Ok(input
            .project
            .get_property_value(property)
            .is_some_and(|value| !value.is_empty()))
    }
}
