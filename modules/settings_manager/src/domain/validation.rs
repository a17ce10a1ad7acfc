//! Rule-set validation of setting values
//!
//! Rule descriptors are opaque to the manager; it hands them to a
//! [`ValueValidator`]. The bundled [`RuleValidator`] understands
//! `name[:params]` string rules and treats object descriptors as JSON Schema.

use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;

/// Validation collaborator
pub trait ValueValidator: Send + Sync {
    /// Every violation message for `value`; empty when it passes
    fn validate(&self, value: &Value, rules: &[Value]) -> Vec<String>;
}

/// Built-in validator for string rules and JSON Schema descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleValidator;

impl ValueValidator for RuleValidator {
    fn validate(&self, value: &Value, rules: &[Value]) -> Vec<String> {
        let names: Vec<&str> = rules.iter().filter_map(Value::as_str).collect();

        if value.is_null() && !names.contains(&"required") && names.contains(&"nullable") {
            return Vec::new();
        }

        let numeric = names
            .iter()
            .any(|r| matches!(*r, "integer" | "numeric"));

        let mut errors = Vec::new();
        for rule in rules {
            match rule {
                Value::String(rule) => {
                    if let Some(message) = check_rule(value, rule, numeric) {
                        errors.push(message);
                    }
                }
                Value::Object(_) => errors.extend(validate_against_schema(value, rule)),
                other => {
                    tracing::warn!(rule = %other, "ignoring unsupported validation rule descriptor");
                }
            }
        }
        errors
    }
}

/// Validate a value against a JSON Schema descriptor
pub fn validate_against_schema(data: &Value, schema: &Value) -> Vec<String> {
    let validator = match Validator::new(schema) {
        Ok(v) => v,
        Err(e) => return vec![format!("The value field has an invalid schema: {}", e)],
    };

    validator
        .iter_errors(data)
        .map(|error| format!("The value field is invalid: {}", error))
        .collect()
}

fn check_rule(value: &Value, rule: &str, numeric: bool) -> Option<String> {
    let (name, params) = match rule.split_once(':') {
        Some((name, params)) => (name, Some(params)),
        None => (rule, None),
    };

    let ok = match name {
        "nullable" | "sometimes" | "bail" => true,
        "required" => is_present(value),
        "string" => value.is_string(),
        "integer" => is_integer(value),
        "numeric" => as_number(value).is_some(),
        "boolean" => is_boolean(value),
        "array" => value.is_array() || value.is_object(),
        "email" => value.as_str().is_some_and(is_email),
        "url" => value
            .as_str()
            .is_some_and(|s| url::Url::parse(s).is_ok_and(|u| u.has_host())),
        "alpha" => value
            .as_str()
            .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_alphabetic)),
        "alpha_num" => value
            .as_str()
            .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_alphanumeric)),
        "min" => match parse_bound(params) {
            Some(min) => size_of(value, numeric).is_some_and(|s| s >= min),
            None => return unsupported(rule),
        },
        "max" => match parse_bound(params) {
            Some(max) => size_of(value, numeric).is_some_and(|s| s <= max),
            None => return unsupported(rule),
        },
        "between" => {
            let bounds: Vec<f64> = params
                .unwrap_or_default()
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect();
            match bounds.as_slice() {
                [lo, hi] => size_of(value, numeric).is_some_and(|s| s >= *lo && s <= *hi),
                _ => return unsupported(rule),
            }
        }
        "in" => list_param(params).contains(&scalar_text(value)),
        "not_in" => !list_param(params).contains(&scalar_text(value)),
        "regex" => {
            let pattern = params.unwrap_or_default();
            let pattern = pattern
                .strip_prefix('/')
                .and_then(|p| p.rsplit_once('/').map(|(body, _flags)| body))
                .unwrap_or(pattern);
            match Regex::new(pattern) {
                Ok(re) => value.as_str().is_some_and(|s| re.is_match(s)),
                Err(_) => return unsupported(rule),
            }
        }
        _ => return unsupported(rule),
    };

    if ok {
        None
    } else {
        Some(message_for(name, params, value, numeric))
    }
}

fn unsupported(rule: &str) -> Option<String> {
    tracing::warn!(rule, "ignoring unknown validation rule");
    None
}

fn message_for(name: &str, params: Option<&str>, value: &Value, numeric: bool) -> String {
    let params = params.unwrap_or_default();
    match name {
        "required" => "The value field is required.".to_string(),
        "string" => "The value field must be a string.".to_string(),
        "integer" => "The value field must be an integer.".to_string(),
        "numeric" => "The value field must be a number.".to_string(),
        "boolean" => "The value field must be true or false.".to_string(),
        "array" => "The value field must be an array.".to_string(),
        "email" => "The value field must be a valid email address.".to_string(),
        "url" => "The value field must be a valid URL.".to_string(),
        "alpha" => "The value field must only contain letters.".to_string(),
        "alpha_num" => "The value field must only contain letters and numbers.".to_string(),
        "min" | "max" | "between" => {
            let bound = match name {
                "min" => format!("be at least {}", params),
                "max" => format!("not be greater than {}", params),
                _ => format!("be between {}", params.replace(',', " and ")),
            };
            let unit = match value {
                _ if numeric => "",
                Value::String(_) => " characters",
                Value::Array(_) | Value::Object(_) => " items",
                _ => "",
            };
            format!("The value field must {}{}.", bound, unit)
        }
        "in" => "The selected value is invalid.".to_string(),
        "not_in" => "The selected value is invalid.".to_string(),
        "regex" => "The value field format is invalid.".to_string(),
        other => format!("The value field failed the {} rule.", other),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Size used by min/max/between: numeric value, string length or item count
fn size_of(value: &Value, numeric: bool) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if numeric => s.trim().parse().ok(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        Value::Object(o) => Some(o.len() as f64),
        _ => None,
    }
}

fn parse_bound(params: Option<&str>) -> Option<f64> {
    params.and_then(|p| p.trim().parse().ok())
}

fn list_param(params: Option<&str>) -> Vec<String> {
    params
        .unwrap_or_default()
        .split(',')
        .map(|p| p.trim().to_string())
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => other.to_string(),
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
}
