use std::path::PathBuf;

/// Failure while reading recipe definitions from disk.
///
/// Any of these aborts engine construction; a half-loaded recipe set is never used.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize recipe [{}]: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("test type already registered: {0}")]
    DuplicateTestType(String),
    #[error("no test registered for type: {0}")]
    UnknownTestType(String),
}

/// Failure raised by a single recommendation test while executing.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("{test_type}: missing condition field `{field}`")]
    MissingCondition { test_type: String, field: String },
    #[error("{test_type}: invalid condition field `{field}`: {reason}")]
    InvalidCondition {
        test_type: String,
        field: String,
        reason: String,
    },
    #[error("invalid file pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("cannot inspect {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while evaluating a recipe's rules against a project.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("invalid recipe definition [{recipe_id}]: invalid test type [{test_type}] found in rule")]
    InvalidRecipeDefinition { recipe_id: String, test_type: String },
    #[error("recipe [{recipe_id}]: test [{test_type}] failed to execute: {source}")]
    TestFailed {
        recipe_id: String,
        test_type: String,
        #[source]
        source: TestError,
    },
}

/// Structured check result for `spk check --json`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    pub pass: bool,
    pub errors: Vec<CheckIssue>,
    pub warnings: Vec<CheckIssue>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckIssue {
    pub code: String,
    pub check: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
