#![no_main]
use libfuzzer_sys::fuzz_target;
use stackpick_engine::TestRegistry;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let registry = TestRegistry::with_builtins();
        let _ = stackpick_core::schema::check_str(content, "fuzz.recipe", true, &registry.names());
    }
});
