use std::collections::HashSet;
use std::path::{Path, PathBuf};

use stackpick_core::errors::RecipeError;
use stackpick_core::recipe::RecipeDefinition;

pub const RECIPE_EXTENSION: &str = "recipe";

/// Load every `.recipe` file from each directory, in order.
///
/// Directories are read non-recursively and their files in name order. The
/// first recipe seen for an id wins; later duplicates are skipped. Any
/// unreadable or malformed file fails the whole load.
pub fn load_recipes<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<RecipeDefinition>, RecipeError> {
    let mut recipes = Vec::new();
    let mut seen = HashSet::new();

    for dir in dirs {
        let dir = dir.as_ref();
        for path in recipe_files(dir)? {
            let recipe = load_recipe(&path)?;
            if !seen.insert(recipe.id.clone()) {
                tracing::warn!(
                    recipe = %recipe.id,
                    path = %path.display(),
                    "duplicate recipe id, keeping the first definition"
                );
                continue;
            }
            recipes.push(recipe);
        }
    }

    tracing::debug!(count = recipes.len(), "recipes loaded");
    Ok(recipes)
}

/// Read a single recipe file and record where it came from.
pub fn load_recipe(path: &Path) -> Result<RecipeDefinition, RecipeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut recipe: RecipeDefinition =
        serde_json::from_str(&content).map_err(|source| RecipeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    recipe.recipe_path = Some(path.to_path_buf());
    Ok(recipe)
}

fn recipe_files(dir: &Path) -> Result<Vec<PathBuf>, RecipeError> {
    if !dir.is_dir() {
        return Err(RecipeError::MissingDirectory(dir.to_path_buf()));
    }
    let io_err = |source| RecipeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == RECIPE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
