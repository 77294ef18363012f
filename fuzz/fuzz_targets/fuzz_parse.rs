#![no_main]
use libfuzzer_sys::fuzz_target;
use stackpick_core::recipe::RecipeDefinition;

fuzz_target!(|data: &[u8]| {
    if let Ok(recipe) = serde_json::from_slice::<RecipeDefinition>(data) {
        for group in &recipe.recommendation_rules {
            for test in &group.tests {
                let _ = test.condition.opt_str(&test.test_type, "value");
                let _ = test.condition.str_list(&test.test_type, "allowedValues");
            }
        }
        let _ = serde_json::to_string(&recipe);
    }
});
