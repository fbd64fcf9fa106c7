//! Runtime validation of caller values against logical column types.

use serde_json::Value as JsonValue;

use crate::core::{ColumnDefinition, ColumnType, DbError, Result, Value};

/// Converts a non-null JSON value into a bind parameter for the given
/// column. Null handling (nullability) is the caller's job; this only
/// answers "is this value of the column's logical type".
///
/// The match is exhaustive over `ColumnType` with no fallback arm: a
/// logical type without a rule here fails to compile instead of silently
/// passing values through.
pub fn coerce(column: &ColumnDefinition, value: &JsonValue) -> Result<Value> {
    match column.column_type {
        ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => match value {
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            other => Err(mismatch(column, other)),
        },
        ColumnType::Integer => match value {
            JsonValue::Number(n) => n
                .as_i64()
                .filter(|i| i32::try_from(*i).is_ok())
                .map(Value::Integer)
                .ok_or_else(|| mismatch(column, value)),
            other => Err(mismatch(column, other)),
        },
        ColumnType::BigInt => match value {
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| mismatch(column, value)),
            other => Err(mismatch(column, other)),
        },
        ColumnType::Decimal => match value {
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(mismatch(column, value))
                }
            }
            other => Err(mismatch(column, other)),
        },
        ColumnType::Boolean => match value {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            other => Err(mismatch(column, other)),
        },
    }
}

fn mismatch(column: &ColumnDefinition, value: &JsonValue) -> DbError {
    DbError::TypeMismatch(
        column.name.clone(),
        column.column_type.to_string(),
        json_type_name(value).to_string(),
    )
}

pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, column_type: ColumnType) -> ColumnDefinition {
        ColumnDefinition::new(name, column_type, true)
    }

    #[test]
    fn test_textual_types_take_strings_only() {
        for ct in [ColumnType::Text, ColumnType::Date, ColumnType::Timestamp] {
            let col = column("note_x", ct);
            assert_eq!(coerce(&col, &json!("hello")).unwrap(), Value::from("hello"));
            assert!(coerce(&col, &json!(5)).is_err());
            assert!(coerce(&col, &json!(true)).is_err());
        }
    }

    #[test]
    fn test_integer_respects_32_bit_range() {
        let col = column("count_x", ColumnType::Integer);
        assert_eq!(coerce(&col, &json!(42)).unwrap(), Value::Integer(42));
        assert_eq!(
            coerce(&col, &json!(i32::MAX)).unwrap(),
            Value::Integer(i32::MAX as i64)
        );

        let err = coerce(&col, &json!(i32::MAX as i64 + 1)).unwrap_err();
        assert!(matches!(
            err,
            DbError::TypeMismatch(name, expected, _) if name == "count_x" && expected == "INTEGER"
        ));
        assert!(coerce(&col, &json!(1.5)).is_err());
        assert!(coerce(&col, &json!("42")).is_err());
    }

    #[test]
    fn test_bigint_takes_any_integral() {
        let col = column("big_x", ColumnType::BigInt);
        assert_eq!(coerce(&col, &json!(7)).unwrap(), Value::Integer(7));
        assert_eq!(
            coerce(&col, &json!(i64::MAX)).unwrap(),
            Value::Integer(i64::MAX)
        );
        assert!(coerce(&col, &json!(2.5)).is_err());
    }

    #[test]
    fn test_decimal_takes_integral_and_fractional() {
        let col = column("price_x", ColumnType::Decimal);
        assert_eq!(coerce(&col, &json!(10)).unwrap(), Value::Integer(10));
        assert_eq!(coerce(&col, &json!(10.25)).unwrap(), Value::Float(10.25));
        assert!(coerce(&col, &json!("10.25")).is_err());
    }

    #[test]
    fn test_boolean_strict() {
        let col = column("flag_x", ColumnType::Boolean);
        assert_eq!(coerce(&col, &json!(false)).unwrap(), Value::Boolean(false));
        let err = coerce(&col, &json!("true")).unwrap_err();
        assert!(matches!(
            err,
            DbError::TypeMismatch(_, expected, actual)
                if expected == "BOOLEAN" && actual == "string"
        ));
    }
}
