//! SQL literal encoding.
//!
//! Converts a [`Value`] into text suitable for splicing into a SQL statement.
//! There is a single dialect: strings are single-quoted with embedded quotes
//! doubled, numbers are bare, lists become parenthesized tuples and null is
//! `null`. Date and time values are deliberately not supported.

use crate::error::{BindError, BindResult};
use crate::value::Value;

/// Encode a value as a SQL literal.
///
/// # Example
///
/// ```
/// use sqlbind::{encode, Value};
///
/// let ids = Value::from(vec![1, 2, 3]);
/// assert_eq!(encode(&ids).unwrap(), "(1, 2, 3)");
/// assert_eq!(encode(&Value::from("O'Brien")).unwrap(), "'O''Brien'");
/// ```
pub fn encode(value: &Value) -> BindResult<String> {
    let mut sql = String::new();
    write_literal(&mut sql, value)?;
    Ok(sql)
}

fn write_literal(sql: &mut String, value: &Value) -> BindResult<()> {
    match value {
        Value::Null => sql.push_str("null"),
        Value::Int(i) => sql.push_str(&i.to_string()),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(BindError::unsupported("non-finite real", f.to_string()));
            }
            // Debug keeps the fractional part on integral reals (`5.0`).
            sql.push_str(&format!("{:?}", f));
        }
        Value::String(s) => {
            sql.push('\'');
            sql.push_str(&s.replace('\'', "''"));
            sql.push('\'');
        }
        Value::List(items) => {
            sql.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                write_literal(sql, item)?;
            }
            sql.push(')');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo quote doubling on an encoded string literal.
    fn decode_string(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        inner.replace("''", "'")
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(encode(&Value::from("hello")).unwrap(), "'hello'");
        assert_eq!(encode(&Value::from("")).unwrap(), "''");
        assert_eq!(encode(&Value::from("it's")).unwrap(), "'it''s'");
    }

    #[test]
    fn test_encode_string_passes_through_other_characters() {
        assert_eq!(
            encode(&Value::from("a\\b\n\"c\"")).unwrap(),
            "'a\\b\n\"c\"'"
        );
    }

    #[test]
    fn test_string_round_trip() {
        for s in ["", "'", "''", "O'Brien", "'lead", "trail'", "no quotes", "ünï'cödé"] {
            let encoded = encode(&Value::from(s)).unwrap();
            assert!(encoded.starts_with('\'') && encoded.ends_with('\''));
            assert_eq!(decode_string(&encoded), s);
        }
    }

    #[test]
    fn test_encode_numbers() {
        assert_eq!(encode(&Value::Int(5)).unwrap(), "5");
        assert_eq!(encode(&Value::Int(-12)).unwrap(), "-12");
        assert_eq!(encode(&Value::Float(2.5)).unwrap(), "2.5");
        assert_eq!(encode(&Value::Float(5.0)).unwrap(), "5.0");
        assert_eq!(encode(&Value::Float(-0.125)).unwrap(), "-0.125");
    }

    #[test]
    fn test_encode_non_finite_real() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&Value::Float(f)).unwrap_err();
            assert!(matches!(
                err,
                BindError::UnsupportedValueType { kind: "non-finite real", .. }
            ));
        }
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(encode(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn test_encode_list() {
        assert_eq!(encode(&Value::from(vec![1, 2, 3])).unwrap(), "(1, 2, 3)");
        assert_eq!(encode(&Value::List(vec![])).unwrap(), "()");
        assert_eq!(
            encode(&Value::List(vec![
                Value::from("a'b"),
                Value::Null,
                Value::Float(1.5)
            ]))
            .unwrap(),
            "('a''b', null, 1.5)"
        );
    }

    #[test]
    fn test_encode_nested_list() {
        let nested = Value::List(vec![
            Value::from(vec![1, 2]),
            Value::List(vec![]),
            Value::List(vec![Value::from(vec!["x"])]),
        ]);
        assert_eq!(encode(&nested).unwrap(), "((1, 2), (), (('x')))");
    }

    #[test]
    fn test_encode_list_with_bad_element() {
        let list = Value::List(vec![Value::Int(1), Value::Float(f64::NAN)]);
        assert!(encode(&list).is_err());
    }
}
