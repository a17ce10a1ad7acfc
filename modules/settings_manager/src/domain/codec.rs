//! Value codec: typed values <-> stored text + type tag

use crate::contract::SettingType;
use serde_json::Value;

/// Stored representation of a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub text: Option<String>,
    pub r#type: SettingType,
}

/// Infer the type tag and render the stored text.
///
/// Integers map to `int`, booleans to `bool`, other numbers to `float`,
/// lists and maps to `array` (JSON text), everything else to `string`.
pub fn encode(value: &Value) -> StoredValue {
    match value {
        Value::Null => StoredValue {
            text: None,
            r#type: SettingType::String,
        },
        Value::Bool(b) => StoredValue {
            text: Some(if *b { "1" } else { "0" }.to_string()),
            r#type: SettingType::Bool,
        },
        Value::Number(n) if n.is_i64() || n.is_u64() => StoredValue {
            text: Some(n.to_string()),
            r#type: SettingType::Int,
        },
        Value::Number(n) => StoredValue {
            text: Some(n.to_string()),
            r#type: SettingType::Float,
        },
        Value::String(s) => StoredValue {
            text: Some(s.clone()),
            r#type: SettingType::String,
        },
        Value::Array(_) | Value::Object(_) => StoredValue {
            text: Some(value.to_string()),
            r#type: SettingType::Array,
        },
    }
}

/// Inverse of [`encode`] driven by the stored type tag
pub fn decode(text: Option<&str>, r#type: SettingType) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };

    match r#type {
        SettingType::Int => parse_int(text),
        SettingType::Bool => Value::Bool(parse_bool(text)),
        SettingType::Float => float_value(parse_float(text)),
        SettingType::Array => match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stored array value is not valid JSON");
                Value::Null
            }
        },
        SettingType::String => Value::String(text.to_string()),
    }
}

/// Text form of a value used as encryption plaintext and for display
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => encode(other).text.unwrap_or_default(),
    }
}

/// Permissive boolean parse: "1", "true", "on", "yes" are truthy
pub fn parse_bool(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Signed first, then unsigned above `i64::MAX`, then a truncated float
fn parse_int(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Value::from(u);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f.trunc() as i64);
        }
    }
    Value::from(0)
}

fn parse_float(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(v: Value) -> Value {
        let stored = encode(&v);
        decode(stored.text.as_deref(), stored.r#type)
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(encode(&json!(42)).r#type, SettingType::Int);
        assert_eq!(encode(&json!(true)).r#type, SettingType::Bool);
        assert_eq!(encode(&json!(1.5)).r#type, SettingType::Float);
        assert_eq!(encode(&json!([1, 2])).r#type, SettingType::Array);
        assert_eq!(encode(&json!({"a": 1})).r#type, SettingType::Array);
        assert_eq!(encode(&json!("x")).r#type, SettingType::String);
        assert_eq!(encode(&Value::Null).r#type, SettingType::String);
    }

    #[test]
    fn test_edge_values_roundtrip() {
        for v in [
            json!(""),
            json!(0),
            json!(false),
            json!([]),
            json!({}),
            json!(-17),
            json!(i64::MIN),
            json!(i64::MAX),
            json!(u64::MAX),
            json!(2.0),
            json!(3.25),
            json!("hello"),
            json!({"color": "blue", "size": ["l", "xl"]}),
            Value::Null,
        ] {
            assert_eq!(roundtrip(v.clone()), v);
        }
    }

    #[test]
    fn test_large_unsigned_int_is_not_saturated() {
        let stored = encode(&json!(u64::MAX));
        assert_eq!(stored.r#type, SettingType::Int);
        assert_eq!(stored.text.as_deref(), Some("18446744073709551615"));
        assert_eq!(
            decode(Some("9223372036854775808"), SettingType::Int),
            json!(9_223_372_036_854_775_808u64)
        );
    }

    #[test]
    fn test_permissive_bool_decode() {
        assert_eq!(decode(Some("true"), SettingType::Bool), json!(true));
        assert_eq!(decode(Some("1"), SettingType::Bool), json!(true));
        assert_eq!(decode(Some("yes"), SettingType::Bool), json!(true));
        assert_eq!(decode(Some("0"), SettingType::Bool), json!(false));
        assert_eq!(decode(Some("false"), SettingType::Bool), json!(false));
        assert_eq!(decode(Some(""), SettingType::Bool), json!(false));
    }

    #[test]
    fn test_lenient_numeric_decode() {
        assert_eq!(decode(Some(" 12 "), SettingType::Int), json!(12));
        assert_eq!(decode(Some("7.9"), SettingType::Int), json!(7));
        assert_eq!(decode(Some("abc"), SettingType::Int), json!(0));
        assert_eq!(decode(Some("abc"), SettingType::Float), json!(0.0));
    }

    #[test]
    fn test_array_passthrough_and_invalid_json() {
        assert_eq!(decode(Some("[1,2,3]"), SettingType::Array), json!([1, 2, 3]));
        assert_eq!(decode(Some("{broken"), SettingType::Array), Value::Null);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&json!("secret")), "secret");
        assert_eq!(plain_text(&json!(5)), "5");
        assert_eq!(plain_text(&json!(["a"])), "[\"a\"]");
        assert_eq!(plain_text(&Value::Null), "");
    }
}
