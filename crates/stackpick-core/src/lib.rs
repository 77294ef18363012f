#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod project;
pub mod recipe;
pub mod recommendation;
pub mod schema;
pub mod traits;
