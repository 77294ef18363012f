use std::collections::HashSet;

use anyhow::{Context, Result};
use jsonschema::Validator;
use serde_json::Value;

use crate::errors::{CheckIssue, CheckReport};

const RECIPE_SCHEMA: &str = include_str!("../schema/recipe.schema.json");

/// Compile the embedded recipe schema.
pub fn validator() -> Result<Validator> {
    let schema: Value =
        serde_json::from_str(RECIPE_SCHEMA).context("embedded schema is invalid JSON")?;
    Validator::new(&schema).map_err(|e| anyhow::anyhow!("schema compilation failed: {e}"))
}

/// Check raw recipe text. Invalid JSON is reported as E003 rather than returned as an error.
pub fn check_str(content: &str, file: &str, strict: bool, known_tests: &[&str]) -> CheckReport {
    match serde_json::from_str::<Value>(content) {
        Ok(data) => check(&data, file, strict, known_tests),
        Err(e) => CheckReport {
            file: file.to_string(),
            recipe_id: None,
            pass: false,
            errors: vec![CheckIssue {
                code: "E003".to_string(),
                check: "json".to_string(),
                message: format!("invalid JSON: {e}"),
                path: None,
            }],
            warnings: Vec::new(),
        },
    }
}

/// Full check of a recipe document: schema, test vocabulary, lint.
pub fn check(data: &Value, file: &str, strict: bool, known_tests: &[&str]) -> CheckReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match validator() {
        Ok(v) => {
            for error in v.iter_errors(data) {
                let path = error.instance_path.to_string();
                errors.push(CheckIssue {
                    code: "E001".to_string(),
                    check: "schema".to_string(),
                    message: error.to_string(),
                    path: Some(if path.is_empty() {
                        "$(root)".to_string()
                    } else {
                        format!("${path}")
                    }),
                });
            }
        }
        Err(e) => errors.push(CheckIssue {
            code: "E001".to_string(),
            check: "schema".to_string(),
            message: e.to_string(),
            path: None,
        }),
    }

    check_test_vocabulary(data, known_tests, &mut errors);
    lint_checks(data, &mut warnings);

    let pass = errors.is_empty() && (!strict || warnings.is_empty());
    CheckReport {
        file: file.to_string(),
        recipe_id: data.get("id").and_then(Value::as_str).map(str::to_string),
        pass,
        errors,
        warnings,
    }
}

fn rule_groups(data: &Value) -> &[Value] {
    data.get("recommendationRules")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn check_test_vocabulary(data: &Value, known_tests: &[&str], errors: &mut Vec<CheckIssue>) {
    for (i, group) in rule_groups(data).iter().enumerate() {
        let Some(tests) = group.get("tests").and_then(Value::as_array) else {
            continue;
        };
        for (j, test) in tests.iter().enumerate() {
            let Some(name) = test.get("type").and_then(Value::as_str) else {
                continue;
            };
            if known_tests.contains(&name) {
                continue;
            }
            let suggestion = known_tests
                .iter()
                .find(|known| known.eq_ignore_ascii_case(name));
            let message = match suggestion {
                Some(s) => format!("unknown test type '{name}' (did you mean '{s}'?)"),
                None => format!("unknown test type '{name}'"),
            };
            errors.push(CheckIssue {
                code: "E002".to_string(),
                check: "test_vocab".to_string(),
                message,
                path: Some(format!("$.recommendationRules[{i}].tests[{j}].type")),
            });
        }
    }
}

fn lint_checks(data: &Value, warnings: &mut Vec<CheckIssue>) {
    let groups = rule_groups(data);

    // W001: no rule groups means the recipe is never recommended
    if groups.is_empty() {
        warnings.push(CheckIssue {
            code: "W001".to_string(),
            check: "lint".to_string(),
            message: "recipe has no recommendation rules and will never be recommended"
                .to_string(),
            path: Some("$.recommendationRules".to_string()),
        });
    }

    // W002: empty test list passes vacuously
    for (i, group) in groups.iter().enumerate() {
        let empty = group
            .get("tests")
            .and_then(Value::as_array)
            .is_some_and(|t| t.is_empty());
        if empty {
            warnings.push(CheckIssue {
                code: "W002".to_string(),
                check: "lint".to_string(),
                message: "rule group has no tests and always passes".to_string(),
                path: Some(format!("$.recommendationRules[{i}].tests")),
            });
        }
    }

    // W003: option setting ids are matched case-insensitively
    if let Some(settings) = data.get("optionSettings").and_then(Value::as_array) {
        let mut seen = HashSet::new();
        for (i, setting) in settings.iter().enumerate() {
            if let Some(id) = setting.get("id").and_then(Value::as_str) {
                if !seen.insert(id.to_ascii_lowercase()) {
                    warnings.push(CheckIssue {
                        code: "W003".to_string(),
                        check: "lint".to_string(),
                        message: format!("duplicate option setting id '{id}'"),
                        path: Some(format!("$.optionSettings[{i}].id")),
                    });
                }
            }
        }
    }
}
