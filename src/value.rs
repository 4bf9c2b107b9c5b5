//! Bindable values.
//!
//! [`Value`] is the closed set of things a placeholder can be bound to.
//! Anything outside of it (booleans, objects, dates) is rejected when a
//! foreign value is converted, so the encoder never has to guess.

use crate::error::{BindError, BindResult};

/// A value that can be bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Human readable name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// Length as seen by length placeholders (`#:name`, `#%(name)s`).
    ///
    /// Lists count their elements and strings count characters. Other kinds
    /// have no length.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Null | Value::Int(_) | Value::Float(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = BindError;

    fn try_from(json: serde_json::Value) -> BindResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Value::Null),
            Json::String(s) => Ok(Value::String(s)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    // past i64::MAX; as a real it would no longer be the same number
                    Err(BindError::unsupported("integer", n.to_string()))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(BindError::unsupported("number", n.to_string()))
                }
            }
            Json::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<BindResult<Vec<_>>>()
                .map(Value::List),
            Json::Bool(b) => Err(BindError::unsupported("boolean", b.to_string())),
            Json::Object(_) => Err(BindError::unsupported("object", json.to_string())),
        }
    }
}

impl TryFrom<toml::Value> for Value {
    type Error = BindError;

    fn try_from(value: toml::Value) -> BindResult<Self> {
        use toml::Value as Toml;

        match value {
            Toml::String(s) => Ok(Value::String(s)),
            Toml::Integer(i) => Ok(Value::Int(i)),
            Toml::Float(f) => Ok(Value::Float(f)),
            Toml::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<BindResult<Vec<_>>>()
                .map(Value::List),
            Toml::Boolean(b) => Err(BindError::unsupported("boolean", b.to_string())),
            Toml::Datetime(d) => Err(BindError::unsupported("datetime", d.to_string())),
            Toml::Table(t) => Err(BindError::unsupported("table", t.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(42), Value::Int(42));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_length() {
        assert_eq!(Value::from(vec![1, 2, 3]).length(), Some(3));
        assert_eq!(Value::from("héllo").length(), Some(5));
        assert_eq!(Value::from(Vec::<i64>::new()).length(), Some(0));
        assert_eq!(Value::Int(7).length(), None);
        assert_eq!(Value::Null.length(), None);
    }

    #[test]
    fn test_from_json() {
        let value = Value::try_from(json!([1, 2.5, "x", null, [3]])).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("x".to_string()),
                Value::Null,
                Value::List(vec![Value::Int(3)]),
            ])
        );
    }

    #[test]
    fn test_from_json_rejects_bool() {
        let err = Value::try_from(json!([1, true])).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnsupportedValueType { kind: "boolean", .. }
        ));
    }

    #[test]
    fn test_from_json_rejects_object() {
        let err = Value::try_from(json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnsupportedValueType { kind: "object", .. }
        ));
    }

    #[test]
    fn test_from_json_rejects_out_of_range_integer() {
        let json: serde_json::Value = serde_json::from_str("18446744073709551615").unwrap();
        match Value::try_from(json).unwrap_err() {
            BindError::UnsupportedValueType { kind, value } => {
                assert_eq!(kind, "integer");
                assert_eq!(value, "18446744073709551615");
            }
            other => panic!("expected unsupported value, got {other:?}"),
        }

        let json: serde_json::Value = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(Value::try_from(json).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_from_toml() {
        let table: toml::Table = toml::from_str("ids = [1, 2]\nname = 'x'").unwrap();
        let ids = Value::try_from(table["ids"].clone()).unwrap();
        assert_eq!(ids, Value::from(vec![1, 2]));
        let name = Value::try_from(table["name"].clone()).unwrap();
        assert_eq!(name, Value::from("x"));
    }

    #[test]
    fn test_from_toml_rejects_datetime() {
        let table: toml::Table = toml::from_str("at = 1979-05-27T07:32:00Z").unwrap();
        let err = Value::try_from(table["at"].clone()).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnsupportedValueType { kind: "datetime", .. }
        ));
    }
}
