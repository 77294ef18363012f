pub mod evaluator;

pub use evaluator::{should_include, RuleEvaluator, RulesResult};
