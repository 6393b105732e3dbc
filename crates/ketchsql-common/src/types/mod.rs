
use std::fmt;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One element of a tuple type. Elements may carry explicit names; name
/// preservation matters when encodings are stripped and re-applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleField {
    pub name: Option<String>,
    pub data_type: DataType,
}

impl TupleField {
    pub fn unnamed(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }

    pub fn named(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int64,
    Float64,
    Numeric,
    String,
    Date,
    /// The type of a value that can only be NULL.
    Nothing,
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Tuple(Vec<TupleField>),
    /// Dictionary (low-cardinality) encoding of the inner type.
    Dictionary(Box<DataType>),
}

impl DataType {
    pub fn is_nullable(&self) -> bool {
        matches!(self, DataType::Nullable(_))
    }

    /// True for the types whose columns hold nothing but NULLs.
    pub fn only_null(&self) -> bool {
        match self {
            DataType::Nothing => true,
            DataType::Nullable(inner) => matches!(**inner, DataType::Nothing),
            _ => false,
        }
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, DataType::Dictionary(_))
    }

    /// Wraps in `Nullable`. Idempotent; container and dictionary types cannot
    /// go inside `Nullable` and are returned unchanged.
    pub fn make_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(_)
            | DataType::Array(_)
            | DataType::Tuple(_)
            | DataType::Dictionary(_) => self.clone(),
            other => DataType::Nullable(Box::new(other.clone())),
        }
    }

    /// Unwraps one level of `Nullable`, identity otherwise.
    pub fn remove_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOL"),
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::Numeric => write!(f, "NUMERIC"),
            DataType::String => write!(f, "STRING"),
            DataType::Date => write!(f, "DATE"),
            DataType::Nothing => write!(f, "NOTHING"),
            DataType::Nullable(inner) => write!(f, "NULLABLE<{}>", inner),
            DataType::Array(inner) => write!(f, "ARRAY<{}>", inner),
            DataType::Tuple(fields) => {
                write!(f, "TUPLE<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &field.name {
                        Some(name) => write!(f, "{} {}", name, field.data_type)?,
                        None => write!(f, "{}", field.data_type)?,
                    }
                }
                write!(f, ">")
            }
            DataType::Dictionary(inner) => write!(f, "DICTIONARY<{}>", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Numeric(Decimal),
    String(String),
    Date(NaiveDate),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn float64(v: f64) -> Self {
        Value::Float64(OrderedFloat(v))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(v.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The narrowest type this single value belongs to. `Null` reports
    /// `Nothing`; containers recurse element-wise on the first element.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Nothing,
            Value::Bool(_) => DataType::Bool,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Numeric(_) => DataType::Numeric,
            Value::String(_) => DataType::String,
            Value::Date(_) => DataType::Date,
            Value::Array(elements) => {
                let inner = elements
                    .first()
                    .map(|e| e.data_type())
                    .unwrap_or(DataType::Nothing);
                DataType::Array(Box::new(inner))
            }
            Value::Tuple(elements) => DataType::Tuple(
                elements
                    .iter()
                    .map(|e| TupleField::unnamed(e.data_type()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_null() {
        assert!(DataType::Nothing.only_null());
        assert!(DataType::Nullable(Box::new(DataType::Nothing)).only_null());
        assert!(!DataType::Nullable(Box::new(DataType::Int64)).only_null());
        assert!(!DataType::Int64.only_null());
    }

    #[test]
    fn test_make_nullable_idempotent() {
        let t = DataType::Int64.make_nullable();
        assert_eq!(t, DataType::Nullable(Box::new(DataType::Int64)));
        assert_eq!(t.make_nullable(), t);
    }

    #[test]
    fn test_make_nullable_skips_containers() {
        let arr = DataType::Array(Box::new(DataType::Int64));
        assert_eq!(arr.make_nullable(), arr);
        let dict = DataType::Dictionary(Box::new(DataType::String));
        assert_eq!(dict.make_nullable(), dict);
    }

    #[test]
    fn test_remove_nullable() {
        let t = DataType::Nullable(Box::new(DataType::String));
        assert_eq!(t.remove_nullable(), DataType::String);
        assert_eq!(DataType::String.remove_nullable(), DataType::String);
    }

    #[test]
    fn test_display_nested() {
        let t = DataType::Dictionary(Box::new(DataType::Nullable(Box::new(DataType::String))));
        assert_eq!(t.to_string(), "DICTIONARY<NULLABLE<STRING>>");
        let t = DataType::Tuple(vec![
            TupleField::named("a", DataType::Int64),
            TupleField::unnamed(DataType::Bool),
        ]);
        assert_eq!(t.to_string(), "TUPLE<a INT64, BOOL>");
    }

    #[test]
    fn test_value_data_type() {
        assert_eq!(Value::Null.data_type(), DataType::Nothing);
        assert_eq!(Value::Int64(1).data_type(), DataType::Int64);
        assert_eq!(
            Value::Array(vec![Value::Int64(1)]).data_type(),
            DataType::Array(Box::new(DataType::Int64))
        );
    }
}
