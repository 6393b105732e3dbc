
use std::sync::Arc;

use ketchsql_common::types::Value;

use super::{Column, Dictionary};
use crate::NullBitmap;

impl Column {
    pub fn is_constant(&self) -> bool {
        matches!(self, Column::Constant { .. })
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Column::Nullable { .. })
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, Column::Dictionary { .. })
    }

    /// True when every row of this column is NULL by construction: a
    /// `Nothing` column, or a constant whose single value is NULL.
    pub fn only_null(&self) -> bool {
        match self {
            Column::Nothing { .. } => true,
            Column::Constant { value, .. } => value.is_null_at(0),
            _ => false,
        }
    }

    pub fn is_null_at(&self, row: usize) -> bool {
        match self {
            Column::Nothing { .. } => true,
            Column::Constant { value, .. } => value.is_null_at(0),
            Column::Nullable { nulls, .. } => nulls.is_null(row),
            _ => false,
        }
    }

    pub fn as_constant(&self) -> Option<(&Arc<Column>, usize)> {
        match self {
            Column::Constant { value, len } => Some((value, *len)),
            _ => None,
        }
    }

    pub fn as_nullable(&self) -> Option<(&Arc<Column>, &Arc<NullBitmap>)> {
        match self {
            Column::Nullable { values, nulls } => Some((values, nulls)),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<(&Arc<Dictionary>, &Arc<Vec<u32>>, bool)> {
        match self {
            Column::Dictionary {
                dict,
                indexes,
                shared,
            } => Some((dict, indexes, *shared)),
            _ => None,
        }
    }

    pub fn get_value(&self, row: usize) -> Value {
        match self {
            Column::Bool { data } => Value::Bool(data[row]),
            Column::Int64 { data } => Value::Int64(data[row]),
            Column::Float64 { data } => Value::float64(data[row]),
            Column::Numeric { data } => Value::Numeric(data[row]),
            Column::String { data } => Value::String(data[row].clone()),
            Column::Date { data } => Value::Date(data[row]),
            Column::Nothing { .. } => Value::Null,
            Column::Constant { value, .. } => value.get_value(0),
            Column::Nullable { values, nulls } => {
                if nulls.is_null(row) {
                    Value::Null
                } else {
                    values.get_value(row)
                }
            }
            Column::Dictionary { dict, indexes, .. } => {
                dict.values().get_value(indexes[row] as usize)
            }
            Column::Array { offsets, inner } => {
                let start = if row == 0 { 0 } else { offsets[row - 1] as usize };
                let end = offsets[row] as usize;
                Value::Array((start..end).map(|i| inner.get_value(i)).collect())
            }
            Column::Tuple { fields } => {
                Value::Tuple(fields.iter().map(|f| f.get_value(row)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ketchsql_common::types::DataType;

    use super::*;

    #[test]
    fn test_only_null() {
        assert!(Column::Nothing { len: 5 }.only_null());
        let const_null = Column::Constant {
            value: Arc::new(Column::Nothing { len: 1 }),
            len: 5,
        };
        assert!(const_null.only_null());
        let const_int = Column::constant(Value::Int64(1), 5);
        assert!(!const_int.only_null());
        assert!(!Column::new(&DataType::Int64).only_null());
    }

    #[test]
    fn test_only_null_constant_over_nullable() {
        let mut inner = Column::new(&DataType::Nullable(Box::new(DataType::Int64)));
        inner.push_value(Value::Null).unwrap();
        let col = Column::Constant {
            value: Arc::new(inner),
            len: 3,
        };
        assert!(col.only_null());
    }

    #[test]
    fn test_get_value_nullable() {
        let mut col = Column::new(&DataType::Nullable(Box::new(DataType::Int64)));
        col.push_value(Value::Int64(1)).unwrap();
        col.push_value(Value::Null).unwrap();
        col.push_value(Value::Int64(3)).unwrap();
        assert_eq!(col.get_value(0), Value::Int64(1));
        assert_eq!(col.get_value(1), Value::Null);
        assert_eq!(col.get_value(2), Value::Int64(3));
    }

    #[test]
    fn test_get_value_constant() {
        let col = Column::constant(Value::String("x".to_string()), 10);
        assert_eq!(col.get_value(7), Value::String("x".to_string()));
    }

    #[test]
    fn test_get_value_array() {
        let mut col = Column::new(&DataType::Array(Box::new(DataType::Int64)));
        col.push_value(Value::Array(vec![Value::Int64(1), Value::Int64(2)]))
            .unwrap();
        col.push_value(Value::Array(vec![])).unwrap();
        col.push_value(Value::Array(vec![Value::Int64(3)])).unwrap();
        assert_eq!(
            col.get_value(0),
            Value::Array(vec![Value::Int64(1), Value::Int64(2)])
        );
        assert_eq!(col.get_value(1), Value::Array(vec![]));
        assert_eq!(col.get_value(2), Value::Array(vec![Value::Int64(3)]));
    }
}
