use async_trait::async_trait;

use stackpick_core::errors::TestError;
use stackpick_core::traits::{RecommendationTest, RecommendationTestInput};

/// Passes when the project references `packageName` with a non-empty version.
pub struct NuGetPackageReferenceTest;

impl NuGetPackageReferenceTest {
    pub const NAME: &'static str = "NuGetPackageReference";
}

#[async_trait]
impl RecommendationTest for NuGetPackageReferenceTest {
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError> {
        let package = input
            .test
            .condition
            .require_str(Self::NAME, "packageName")?;

        Ok(input
            .project
            .get_package_reference_version(package)
            .is_some_and(|version| !version.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_tests::testing::run;
    use serde_json::json;
    use stackpick_core::project::ProjectDefinition;

    #[tokio::test]
    async fn requires_versioned_reference() {
        let project = ProjectDefinition::new("/src/Api/Api.csproj", "Microsoft.NET.Sdk.Web")
            .with_package_reference("Amazon.Lambda.AspNetCoreServer", "9.0.0")
            .with_package_reference("Floating", "");
        let check = |name: &str| json!({ "packageName": name });

        let name = NuGetPackageReferenceTest::NAME;
        let test = &NuGetPackageReferenceTest;
        assert!(run(test, name, check("Amazon.Lambda.AspNetCoreServer"), &project)
            .await
            .unwrap());
        assert!(!run(test, name, check("Floating"), &project).await.unwrap());
        assert!(!run(test, name, check("Foo"), &project).await.unwrap());
    }
}
