use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".stackpick";
pub const CONFIG_FILE: &str = "config.json";

/// Workspace defaults read from `.stackpick/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Extra recipe directories, searched after the ones given on the command line.
    #[serde(default)]
    pub recipe_paths: Vec<PathBuf>,

    /// Additional template replacement tokens for every computation.
    #[serde(default)]
    pub replacements: HashMap<String, String>,
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the workspace config. Absent is fine; present but malformed is an error.
///
/// Relative recipe paths are resolved against `workspace`.
pub fn load_workspace_config(workspace: &Path) -> Result<Option<WorkspaceConfig>> {
    let path = config_path(workspace);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let mut config: WorkspaceConfig = serde_json::from_str(&content)
        .with_context(|| format!("{}: invalid config JSON", path.display()))?;
    for dir in &mut config.recipe_paths {
        if dir.is_relative() {
            *dir = workspace.join(&*dir);
        }
    }
    Ok(Some(config))
}

/// Write a config file, creating `.stackpick/` if needed.
pub fn write_workspace_config(workspace: &Path, config: &WorkspaceConfig) -> Result<PathBuf> {
    let path = config_path(workspace);
    let dir = workspace.join(CONFIG_DIR);
    std::fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}
