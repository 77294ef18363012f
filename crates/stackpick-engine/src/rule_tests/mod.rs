//! Built-in recommendation tests.
//!
//! Each test reads its own condition fields and reports missing or
//! mistyped ones as [`TestError`](stackpick_core::errors::TestError).

mod file_exists;
mod msbuild;
mod package;
mod sdk;

pub use file_exists::FileExistsTest;
pub use msbuild::{MsPropertyExistsTest, MsPropertyTest};
pub use package::NuGetPackageReferenceTest;
pub use sdk::SdkAttributeTest;
