use async_trait::async_trait;
use globset::GlobBuilder;

use stackpick_core::errors::TestError;
use stackpick_core::traits::{RecommendationTest, RecommendationTestInput};

/// Passes when exactly one file in the project directory matches `fileName`.
///
/// Only the top level of the directory is searched. `fileName` may contain
/// `*` and `?` wildcards. Zero matches and several matches both fail.
pub struct FileExistsTest;

impl FileExistsTest {
    pub const NAME: &'static str = "FileExists";
}

#[async_trait]
impl RecommendationTest for FileExistsTest {
    async fn execute(&self, input: RecommendationTestInput<'_>) -> Result<bool, TestError> {
        let pattern = input.test.condition.require_str(Self::NAME, "fileName")?;
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| TestError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        let dir = input.project.project_directory();
        let io_err = |source| TestError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut matches = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            if !matcher.is_match(entry.file_name()) {
                continue;
            }
            // Follows symlinks; a dangling link is not a file.
            let is_file = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_file(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                Err(e) => return Err(io_err(e)),
            };
            if is_file {
                matches += 1;
                if matches > 1 {
                    break;
                }
            }
        }

        tracing::trace!(
            recipe = input.recipe_id,
            pattern,
            dir = %dir.display(),
            matches,
            "file existence check"
        );
        Ok(matches == 1)
    }
}
