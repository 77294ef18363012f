use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::TestError;

/// A deployment recipe as read from a `.recipe` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDefinition {
    /// Stable id; persisted by redeployments, so it never changes once released.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default)]
    pub target_service: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<DeploymentType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_bundle: Option<DeploymentBundleType>,

    /// Location of the file this recipe was loaded from. Set by the loader.
    #[serde(skip)]
    pub recipe_path: Option<PathBuf>,

    #[serde(default, alias = "recipePriority")]
    pub priority: i32,

    #[serde(default)]
    pub recommendation_rules: Vec<RuleGroup>,

    #[serde(default)]
    pub option_settings: Vec<OptionSettingItem>,
}

impl RecipeDefinition {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: None,
            description: String::new(),
            short_description: None,
            target_service: String::new(),
            deployment_type: None,
            deployment_bundle: None,
            recipe_path: None,
            priority,
            recommendation_rules: Vec::new(),
            option_settings: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: RuleGroup) -> Self {
        self.recommendation_rules.push(rule);
        self
    }

    pub fn with_option_setting(mut self, setting: OptionSettingItem) -> Self {
        self.option_settings.push(setting);
        self
    }

    /// Case-insensitive lookup of an option setting by id.
    pub fn option_setting(&self, id: &str) -> Option<&OptionSettingItem> {
        self.option_settings
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for RecipeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentType {
    CdkProject,
    BeanstalkEnvironment,
    ElasticContainerRegistryImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentBundleType {
    DotnetPublishZipFile,
    Container,
}

/// One unit of applicability logic: tests that must all pass, plus the effect of the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    #[serde(default)]
    pub tests: Vec<RuleTest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<RuleEffect>,
}

impl RuleGroup {
    pub fn new(tests: Vec<RuleTest>) -> Self {
        Self {
            tests,
            effect: None,
        }
    }

    pub fn on_pass(mut self, options: EffectOptions) -> Self {
        self.effect.get_or_insert_with(RuleEffect::default).pass = Some(options);
        self
    }

    pub fn on_fail(mut self, options: EffectOptions) -> Self {
        self.effect.get_or_insert_with(RuleEffect::default).fail = Some(options);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTest {
    /// Registry key of the test implementation.
    #[serde(rename = "type")]
    pub test_type: String,

    #[serde(default)]
    pub condition: RuleCondition,
}

impl RuleTest {
    pub fn new(test_type: impl Into<String>, condition: Value) -> Self {
        Self {
            test_type: test_type.into(),
            condition: RuleCondition::from_value(condition),
        }
    }
}

/// Loosely typed condition fields. Each test reads and validates the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCondition(Map<String, Value>);

impl RuleCondition {
    /// Non-object values produce an empty condition.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Optional string field. Present but non-string is an error.
    pub fn opt_str(&self, test_type: &str, field: &str) -> Result<Option<&str>, TestError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(TestError::InvalidCondition {
                test_type: test_type.to_string(),
                field: field.to_string(),
                reason: "expected a string".to_string(),
            }),
        }
    }

    /// Required string field.
    pub fn require_str(&self, test_type: &str, field: &str) -> Result<&str, TestError> {
        self.opt_str(test_type, field)?
            .ok_or_else(|| TestError::MissingCondition {
                test_type: test_type.to_string(),
                field: field.to_string(),
            })
    }

    /// Optional list of strings. Absent yields an empty list.
    pub fn str_list(&self, test_type: &str, field: &str) -> Result<Vec<&str>, TestError> {
        let invalid = || TestError::InvalidCondition {
            test_type: test_type.to_string(),
            field: field.to_string(),
            reason: "expected an array of strings".to_string(),
        };
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().ok_or_else(invalid))
                .collect(),
            Some(_) => Err(invalid()),
        }
    }
}

/// Pass and fail branches of a rule group's effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<EffectOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<EffectOptions>,
}

impl RuleEffect {
    /// The branch that applies to a group outcome.
    pub fn options_for(&self, passed: bool) -> Option<&EffectOptions> {
        if passed {
            self.pass.as_ref()
        } else {
            self.fail.as_ref()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectOptions {
    /// `None` defers to the raw test outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_adjustment: Option<i32>,
}

impl EffectOptions {
    pub fn include(include: bool) -> Self {
        Self {
            include: Some(include),
            priority_adjustment: None,
        }
    }

    pub fn adjust(priority_adjustment: i32) -> Self {
        Self {
            include: None,
            priority_adjustment: Some(priority_adjustment),
        }
    }
}

/// A setting a user may configure before deploying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSettingItem {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub value_type: OptionSettingValueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default)]
    pub advanced_setting: bool,

    #[serde(default)]
    pub updatable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl OptionSettingItem {
    pub fn new(id: impl Into<String>, default_value: Option<Value>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            value_type: OptionSettingValueType::default(),
            type_hint: None,
            default_value,
            advanced_setting: false,
            updatable: false,
            allowed_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptionSettingValueType {
    #[default]
    String,
    Int,
    Double,
    Bool,
    List,
    KeyValue,
    Object,
}
