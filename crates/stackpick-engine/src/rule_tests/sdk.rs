use async_trait::async_trait;

use stackpick_core::errors::TestError;
use stackpick_core::traits::{RecommendationTest, RecommendationTestInput};

/// Checks the SDK type of the project.
///
/// `value` matches case-insensitively. Without `value`, `allowedValues` is
/// consulted with exact matching.
pub struct SdkAttributeTest;

impl SdkAttributeTest {
    pub const NAME: &'static str = "MSProjectSdkAttribute";
}

#[async_trait]
impl RecommendationTest for SdkAttributeTest {
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError> {
        let condition = &input.test.condition;
        let sdk_type = input.project.sdk_type.as_str();

        if let Some(value) = condition.opt_str(Self::NAME, "value")? {
            if !value.is_empty() {
                return Ok(sdk_type.eq_ignore_ascii_case(value));
            }
        }

        let allowed = condition.str_list(Self::NAME, "allowedValues")?;
        Ok(allowed.contains(&sdk_type))
    }
}
