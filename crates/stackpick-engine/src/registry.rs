use std::collections::BTreeMap;
use std::sync::Arc;

use stackpick_core::errors::RegistryError;
use stackpick_core::traits::RecommendationTest;

use crate::rule_tests::{
    FileExistsTest, MsPropertyExistsTest, MsPropertyTest, NuGetPackageReferenceTest,
    SdkAttributeTest,
};

/// Maps test type names (as written in recipes) to implementations.
///
/// Names are case-sensitive. Registering a name twice is rejected.
#[derive(Clone, Default)]
pub struct TestRegistry {
    tests: BTreeMap<String, Arc<dyn RecommendationTest>>,
}

impl TestRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in test type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, Arc<dyn RecommendationTest>); 5] = [
            (SdkAttributeTest::NAME, Arc::new(SdkAttributeTest)),
            (MsPropertyTest::NAME, Arc::new(MsPropertyTest)),
            (MsPropertyExistsTest::NAME, Arc::new(MsPropertyExistsTest)),
            (NuGetPackageReferenceTest::NAME, Arc::new(NuGetPackageReferenceTest)),
            (FileExistsTest::NAME, Arc::new(FileExistsTest)),
        ];
        for (name, test) in builtins {
            registry.tests.insert(name.to_string(), test);
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        test: Arc<dyn RecommendationTest>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.tests.contains_key(&name) {
            return Err(RegistryError::DuplicateTestType(name));
        }
        tracing::debug!(test_type = %name, "registered recommendation test");
        self.tests.insert(name, test);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn RecommendationTest>, RegistryError> {
        self.tests
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTestType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tests.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tests.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRegistry")
            .field("tests", &self.names())
            .finish()
    }
}
