
use std::sync::Arc;

use ketchsql_common::error::Result;
use ketchsql_common::types::{DataType, TupleField};

use crate::Column;

/// Recursively removes dictionary encoding from a type: `Array` and `Tuple`
/// descend structurally (tuple element names are preserved), `Dictionary`
/// unwraps to its inner type, everything else is identity. Idempotent.
pub fn remove_dictionary_type(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Array(inner) => DataType::Array(Box::new(remove_dictionary_type(inner))),
        DataType::Tuple(fields) => DataType::Tuple(
            fields
                .iter()
                .map(|f| TupleField {
                    name: f.name.clone(),
                    data_type: remove_dictionary_type(&f.data_type),
                })
                .collect(),
        ),
        DataType::Dictionary(inner) => (**inner).clone(),
        other => other.clone(),
    }
}

/// Recursively removes dictionary encoding from a column, materializing
/// dictionaries to full columns. When no dictionary is present anywhere in
/// the column, the original allocation is returned untouched.
pub fn remove_dictionary_column(column: &Arc<Column>) -> Result<Arc<Column>> {
    match &**column {
        Column::Array { offsets, inner } => {
            let stripped = remove_dictionary_column(inner)?;
            if Arc::ptr_eq(&stripped, inner) {
                Ok(column.clone())
            } else {
                Ok(Arc::new(Column::Array {
                    offsets: offsets.clone(),
                    inner: stripped,
                }))
            }
        }
        Column::Constant { value, len } => {
            let stripped = remove_dictionary_column(value)?;
            if Arc::ptr_eq(&stripped, value) {
                Ok(column.clone())
            } else {
                Ok(Arc::new(Column::Constant {
                    value: stripped,
                    len: *len,
                }))
            }
        }
        Column::Tuple { fields } => {
            let stripped = fields
                .iter()
                .map(remove_dictionary_column)
                .collect::<Result<Vec<_>>>()?;
            if stripped
                .iter()
                .zip(fields.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
            {
                Ok(column.clone())
            } else {
                Ok(Arc::new(Column::Tuple { fields: stripped }))
            }
        }
        Column::Dictionary { dict, indexes, .. } => {
            Ok(Arc::new(dict.values().take(indexes)?))
        }
        _ => Ok(column.clone()),
    }
}

#[cfg(test)]
mod tests {
    use ketchsql_common::types::Value;

    use super::*;
    use crate::Dictionary;

    fn dict_column(values: &[&str], indexes: Vec<u32>) -> Arc<Column> {
        let mut keys = Column::new(&DataType::String);
        for v in values {
            keys.push_value(Value::String(v.to_string())).unwrap();
        }
        let dict = Arc::new(Dictionary::new(Arc::new(keys)));
        Arc::new(Column::Dictionary {
            dict,
            indexes: Arc::new(indexes),
            shared: false,
        })
    }

    #[test]
    fn test_type_strip_plain_is_identity() {
        assert_eq!(remove_dictionary_type(&DataType::Int64), DataType::Int64);
        let nullable = DataType::Nullable(Box::new(DataType::String));
        assert_eq!(remove_dictionary_type(&nullable), nullable);
    }

    #[test]
    fn test_type_strip_dictionary() {
        let dict = DataType::Dictionary(Box::new(DataType::String));
        assert_eq!(remove_dictionary_type(&dict), DataType::String);
    }

    #[test]
    fn test_type_strip_through_containers() {
        let t = DataType::Array(Box::new(DataType::Dictionary(Box::new(DataType::String))));
        assert_eq!(
            remove_dictionary_type(&t),
            DataType::Array(Box::new(DataType::String))
        );

        let t = DataType::Tuple(vec![
            TupleField::named("k", DataType::Dictionary(Box::new(DataType::Int64))),
            TupleField::unnamed(DataType::Bool),
        ]);
        assert_eq!(
            remove_dictionary_type(&t),
            DataType::Tuple(vec![
                TupleField::named("k", DataType::Int64),
                TupleField::unnamed(DataType::Bool),
            ])
        );
    }

    #[test]
    fn test_type_strip_idempotent() {
        let t = DataType::Array(Box::new(DataType::Dictionary(Box::new(DataType::String))));
        let once = remove_dictionary_type(&t);
        assert_eq!(remove_dictionary_type(&once), once);
    }

    #[test]
    fn test_column_strip_materializes_dictionary() {
        let col = dict_column(&["a", "b"], vec![1, 0, 1]);
        let full = remove_dictionary_column(&col).unwrap();
        assert!(!full.is_dictionary());
        assert_eq!(full.len(), 3);
        assert_eq!(full.get_value(0), Value::String("b".to_string()));
        assert_eq!(full.get_value(1), Value::String("a".to_string()));
        assert_eq!(full.get_value(2), Value::String("b".to_string()));
    }

    #[test]
    fn test_column_strip_identity_shares_allocation() {
        let col = Arc::new(Column::broadcast(Value::Int64(1), 4));
        let stripped = remove_dictionary_column(&col).unwrap();
        assert!(Arc::ptr_eq(&col, &stripped));

        let arr = Arc::new(Column::Array {
            offsets: Arc::new(vec![2, 4]),
            inner: Arc::new(Column::broadcast(Value::Int64(1), 4)),
        });
        let stripped = remove_dictionary_column(&arr).unwrap();
        assert!(Arc::ptr_eq(&arr, &stripped));
    }

    #[test]
    fn test_column_strip_through_constant() {
        let inner = dict_column(&["x"], vec![0]);
        let col = Arc::new(Column::Constant {
            value: inner,
            len: 6,
        });
        let stripped = remove_dictionary_column(&col).unwrap();
        let (value, len) = stripped.as_constant().unwrap();
        assert_eq!(len, 6);
        assert!(!value.is_dictionary());
        assert_eq!(value.get_value(0), Value::String("x".to_string()));
    }

    #[test]
    fn test_column_strip_through_tuple() {
        let col = Arc::new(Column::Tuple {
            fields: vec![
                dict_column(&["a", "b"], vec![0, 1]),
                Arc::new(Column::broadcast(Value::Int64(1), 2)),
            ],
        });
        let stripped = remove_dictionary_column(&col).unwrap();
        match &*stripped {
            Column::Tuple { fields } => {
                assert!(!fields[0].is_dictionary());
                assert_eq!(fields[0].get_value(1), Value::String("b".to_string()));
            }
            other => panic!("expected tuple, got {:?}", other.data_type()),
        }
    }
}
