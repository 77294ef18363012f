#![no_main]
use libfuzzer_sys::fuzz_target;
use stackpick_core::project::ProjectDefinition;
use stackpick_core::recipe::RecipeDefinition;
use stackpick_engine::{RecommendationEngine, TestRegistry};

fuzz_target!(|data: &[u8]| {
    let Ok(recipe) = serde_json::from_slice::<RecipeDefinition>(data) else {
        return;
    };
    let project = ProjectDefinition::new("/nonexistent/App/App.csproj", "Microsoft.NET.Sdk.Web")
        .with_property("TargetFramework", "net8.0")
        .with_package_reference("AWSSDK.S3", "3.7.0");
    let engine = RecommendationEngine::new(vec![recipe], TestRegistry::with_builtins());
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    if let Ok(recs) = runtime.block_on(engine.compute_recommendations(&project, None)) {
        assert!(recs.iter().all(|r| r.computed_priority() >= 0));
    }
});
