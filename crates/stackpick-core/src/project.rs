use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A package dependency declared by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageReference {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Build metadata of a single project, as seen by the recommendation tests.
///
/// Read-only to the engine. Parsing real build files is left to the caller;
/// this type only offers the query surface the tests need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDefinition {
    pub project_path: PathBuf,

    #[serde(default)]
    pub sdk_type: String,

    #[serde(default)]
    properties: HashMap<String, String>,

    #[serde(default)]
    package_references: Vec<PackageReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_path: Option<PathBuf>,
}

impl ProjectDefinition {
    pub fn new(project_path: impl Into<PathBuf>, sdk_type: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            sdk_type: sdk_type.into(),
            properties: HashMap::new(),
            package_references: Vec::new(),
            solution_path: None,
        }
    }

    /// Set a build property. A later value for the same name replaces the earlier one.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_package_reference(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.package_references.push(PackageReference {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    pub fn with_solution(mut self, solution_path: impl Into<PathBuf>) -> Self {
        self.solution_path = Some(solution_path.into());
        self
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Version of the first reference to `name`, if the project declares one.
    pub fn get_package_reference_version(&self, name: &str) -> Option<&str> {
        self.package_references
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.version.as_str())
    }

    pub fn package_references(&self) -> &[PackageReference] {
        &self.package_references
    }

    /// Directory that contains the project file.
    pub fn project_directory(&self) -> &Path {
        match self.project_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Project file name without its extension, used for `{ProjectName}` tokens.
    pub fn project_name(&self) -> String {
        project_name_of(&self.project_path)
    }
}

pub(crate) fn project_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Load a project description document (JSON).
///
/// A relative `projectPath` is resolved against the directory holding the document.
pub fn load_project(path: &Path) -> Result<ProjectDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read project {}", path.display()))?;
    let mut project: ProjectDefinition = serde_json::from_str(&content)
        .with_context(|| format!("{}: invalid project JSON", path.display()))?;
    if project.project_path.is_relative() {
        let base = path.parent().unwrap_or(Path::new("."));
        project.project_path = base.join(&project.project_path);
    }
    Ok(project)
}
