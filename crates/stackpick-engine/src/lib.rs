#![forbid(unsafe_code)]

pub mod engine;
pub mod loader;
pub mod registry;
pub mod rule_tests;
pub mod rules;

pub use engine::RecommendationEngine;
pub use registry::TestRegistry;
