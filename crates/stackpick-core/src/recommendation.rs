use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::project::project_name_of;
use crate::recipe::RecipeDefinition;

const REPLACE_TOKEN_PROJECT_NAME: &str = "{ProjectName}";

/// Where the effective value of an option setting comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    Override,
    Default,
    Unset,
}

/// A recipe judged applicable to a project, with its computed rank.
///
/// The priority is fixed at construction. Option setting overrides are a
/// mutable layer on top of the recipe defaults and are never validated here.
#[derive(Debug, Clone)]
pub struct Recommendation {
    recipe: Arc<RecipeDefinition>,
    project_path: PathBuf,
    computed_priority: i32,
    replacements: BTreeMap<String, String>,
    overrides: HashMap<String, Value>,
}

impl Recommendation {
    pub fn new(
        recipe: Arc<RecipeDefinition>,
        project_path: impl Into<PathBuf>,
        computed_priority: i32,
        replacements: HashMap<String, String>,
    ) -> Self {
        Self {
            recipe,
            project_path: project_path.into(),
            computed_priority,
            replacements: replacements.into_iter().collect(),
            overrides: HashMap::new(),
        }
    }

    pub fn recipe(&self) -> &RecipeDefinition {
        &self.recipe
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe.id
    }

    pub fn name(&self) -> &str {
        &self.recipe.name
    }

    pub fn description(&self) -> &str {
        &self.recipe.description
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn computed_priority(&self) -> i32 {
        self.computed_priority
    }

    /// Identity of a recommendation: recipe id plus target project.
    pub fn identity(&self) -> (&str, &Path) {
        (&self.recipe.id, &self.project_path)
    }

    /// Effective value: the override when set, else the recipe default with tokens replaced.
    pub fn get_option_setting_value(&self, setting_id: &str) -> Option<Value> {
        self.get_override(setting_id)
            .cloned()
            .or_else(|| self.get_default_option_setting_value(setting_id))
    }

    pub fn get_override(&self, setting_id: &str) -> Option<&Value> {
        self.overrides.get(setting_id)
    }

    pub fn get_default_option_setting_value(&self, setting_id: &str) -> Option<Value> {
        let default = self.recipe.option_setting(setting_id)?.default_value.as_ref()?;
        Some(match default {
            Value::String(s) => Value::String(self.apply_replacement_tokens(s)),
            other => other.clone(),
        })
    }

    pub fn option_setting_source(&self, setting_id: &str) -> SettingSource {
        if self.overrides.contains_key(setting_id) {
            SettingSource::Override
        } else if self.get_default_option_setting_value(setting_id).is_some() {
            SettingSource::Default
        } else {
            SettingSource::Unset
        }
    }

    pub fn set_override_option_setting_value(&mut self, setting_id: impl Into<String>, value: Value) {
        self.overrides.insert(setting_id.into(), value);
    }

    /// Copy settings persisted by an earlier deployment. Keys the recipe does not declare are ignored.
    pub fn apply_previous_settings(&mut self, previous: &HashMap<String, Value>) {
        for setting in &self.recipe.option_settings {
            if let Some(value) = previous.get(&setting.id) {
                self.overrides.insert(setting.id.clone(), value.clone());
            }
        }
    }

    pub fn overrides(&self) -> &HashMap<String, Value> {
        &self.overrides
    }

    /// Replace `{ProjectName}`, then every extra token in token order.
    pub fn apply_replacement_tokens(&self, value: &str) -> String {
        let mut out = value.replace(REPLACE_TOKEN_PROJECT_NAME, &project_name_of(&self.project_path));
        for (token, replacement) in &self.replacements {
            out = out.replace(token.as_str(), replacement);
        }
        out
    }
}
