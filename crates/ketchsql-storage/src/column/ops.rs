
use std::sync::Arc;

use aligned_vec::AVec;
use chrono::NaiveDate;
use ketchsql_common::error::{Error, Result};
use ketchsql_common::types::{DataType, Value};
use rust_decimal::Decimal;

use super::Column;
use crate::NullBitmap;

impl Column {
    /// A plain column of `len` copies of `value`. NULL broadcasts to a
    /// `Nothing` column.
    pub fn broadcast(value: Value, len: usize) -> Self {
        match value {
            Value::Null => Column::Nothing { len },
            Value::Bool(v) => Column::Bool { data: vec![v; len] },
            Value::Int64(v) => Column::Int64 {
                data: AVec::from_iter(64, std::iter::repeat_n(v, len)),
            },
            Value::Float64(v) => Column::Float64 {
                data: AVec::from_iter(64, std::iter::repeat_n(v.0, len)),
            },
            Value::Numeric(v) => Column::Numeric { data: vec![v; len] },
            Value::String(v) => Column::String { data: vec![v; len] },
            Value::Date(v) => Column::Date { data: vec![v; len] },
            Value::Array(elements) => {
                let mut inner = match elements.first() {
                    Some(first) => Column::new(&first.data_type()),
                    None => Column::Nothing { len: 0 },
                };
                let mut offsets = Vec::with_capacity(len);
                for _ in 0..len {
                    for element in &elements {
                        // Elements of one array value share a type.
                        let _ = inner.push_value(element.clone());
                    }
                    offsets.push(inner.len() as u64);
                }
                Column::Array {
                    offsets: Arc::new(offsets),
                    inner: Arc::new(inner),
                }
            }
            Value::Tuple(elements) => Column::Tuple {
                fields: elements
                    .into_iter()
                    .map(|e| Arc::new(Column::broadcast(e, len)))
                    .collect(),
            },
        }
    }

    /// A constant column projecting `value` to `len` rows.
    pub fn constant(value: Value, len: usize) -> Self {
        Column::Constant {
            value: Arc::new(Column::broadcast(value, 1)),
            len,
        }
    }

    /// A constant-NULL column of the given type. The type must be able to
    /// hold NULL (`Nullable` or `Nothing`).
    pub fn constant_null(data_type: &DataType, len: usize) -> Result<Self> {
        let value = match data_type {
            DataType::Nothing => Column::Nothing { len: 1 },
            DataType::Nullable(inner) => Column::Nullable {
                values: Arc::new(Column::filled_with_default(inner, 1)),
                nulls: Arc::new(NullBitmap::new_null(1)),
            },
            other => {
                return Err(Error::internal(format!(
                    "type {} cannot hold NULL",
                    other
                )));
            }
        };
        Ok(Column::Constant {
            value: Arc::new(value),
            len,
        })
    }

    /// A column of `len` default values of the given type.
    pub fn filled_with_default(data_type: &DataType, len: usize) -> Self {
        match data_type {
            DataType::Bool => Column::Bool {
                data: vec![false; len],
            },
            DataType::Int64 => Column::Int64 {
                data: AVec::from_iter(64, std::iter::repeat_n(0, len)),
            },
            DataType::Float64 => Column::Float64 {
                data: AVec::from_iter(64, std::iter::repeat_n(0.0, len)),
            },
            DataType::Numeric => Column::Numeric {
                data: vec![Decimal::ZERO; len],
            },
            DataType::String => Column::String {
                data: vec![String::new(); len],
            },
            DataType::Date => Column::Date {
                data: vec![NaiveDate::default(); len],
            },
            DataType::Nothing => Column::Nothing { len },
            DataType::Nullable(inner) => Column::Nullable {
                values: Arc::new(Column::filled_with_default(inner, len)),
                nulls: Arc::new(NullBitmap::new_valid(len)),
            },
            DataType::Array(inner) => Column::Array {
                offsets: Arc::new(vec![0; len]),
                inner: Arc::new(Column::new(inner)),
            },
            DataType::Tuple(fields) => Column::Tuple {
                fields: fields
                    .iter()
                    .map(|f| Arc::new(Column::filled_with_default(&f.data_type, len)))
                    .collect(),
            },
            DataType::Dictionary(inner) => Column::Dictionary {
                dict: Arc::new(super::Dictionary::new(Arc::new(Column::filled_with_default(
                    inner, 1,
                )))),
                indexes: Arc::new(vec![0; len]),
                shared: false,
            },
        }
    }

    /// Copy with the logical length changed. Constants keep their value;
    /// plain columns are truncated or padded with defaults.
    pub fn clone_resized(&self, len: usize) -> Result<Self> {
        match self {
            Column::Constant { value, .. } => Ok(Column::Constant {
                value: value.clone(),
                len,
            }),
            Column::Nothing { .. } => Ok(Column::Nothing { len }),
            Column::Bool { data } => {
                let mut data = data.clone();
                data.resize(len, false);
                Ok(Column::Bool { data })
            }
            Column::Int64 { data } => {
                let mut out = AVec::with_capacity(64, len);
                for &v in data.iter().take(len) {
                    out.push(v);
                }
                for _ in data.len()..len {
                    out.push(0);
                }
                Ok(Column::Int64 { data: out })
            }
            Column::Float64 { data } => {
                let mut out = AVec::with_capacity(64, len);
                for &v in data.iter().take(len) {
                    out.push(v);
                }
                for _ in data.len()..len {
                    out.push(0.0);
                }
                Ok(Column::Float64 { data: out })
            }
            Column::Numeric { data } => {
                let mut data = data.clone();
                data.resize(len, Decimal::ZERO);
                Ok(Column::Numeric { data })
            }
            Column::String { data } => {
                let mut data = data.clone();
                data.resize(len, String::new());
                Ok(Column::String { data })
            }
            Column::Date { data } => {
                let mut data = data.clone();
                data.resize(len, NaiveDate::default());
                Ok(Column::Date { data })
            }
            Column::Nullable { values, nulls } => Ok(Column::Nullable {
                values: Arc::new(values.clone_resized(len)?),
                nulls: Arc::new(nulls.resized(len)),
            }),
            Column::Dictionary {
                dict,
                indexes,
                shared,
            } => {
                if len > indexes.len() && dict.is_empty() {
                    return Err(Error::internal(
                        "cannot grow a dictionary column with an empty dictionary",
                    ));
                }
                let mut indexes = (**indexes).clone();
                indexes.resize(len, 0);
                Ok(Column::Dictionary {
                    dict: dict.clone(),
                    indexes: Arc::new(indexes),
                    shared: *shared,
                })
            }
            Column::Array { .. } | Column::Tuple { .. } => Err(Error::internal(format!(
                "cannot resize column of type {}",
                self.data_type()
            ))),
        }
    }

    /// Row gather: `out[i] = self[indexes[i]]`.
    pub fn take(&self, indexes: &[u32]) -> Result<Self> {
        let len = self.len();
        if let Some(&bad) = indexes.iter().find(|&&i| i as usize >= len) {
            return Err(Error::internal(format!(
                "take index {} out of bounds (len: {})",
                bad, len
            )));
        }
        Ok(match self {
            Column::Bool { data } => Column::Bool {
                data: indexes.iter().map(|&i| data[i as usize]).collect(),
            },
            Column::Int64 { data } => Column::Int64 {
                data: AVec::from_iter(64, indexes.iter().map(|&i| data[i as usize])),
            },
            Column::Float64 { data } => Column::Float64 {
                data: AVec::from_iter(64, indexes.iter().map(|&i| data[i as usize])),
            },
            Column::Numeric { data } => Column::Numeric {
                data: indexes.iter().map(|&i| data[i as usize]).collect(),
            },
            Column::String { data } => Column::String {
                data: indexes.iter().map(|&i| data[i as usize].clone()).collect(),
            },
            Column::Date { data } => Column::Date {
                data: indexes.iter().map(|&i| data[i as usize]).collect(),
            },
            Column::Nothing { .. } => Column::Nothing {
                len: indexes.len(),
            },
            Column::Constant { value, .. } => Column::Constant {
                value: value.clone(),
                len: indexes.len(),
            },
            Column::Nullable { values, nulls } => Column::Nullable {
                values: Arc::new(values.take(indexes)?),
                nulls: Arc::new(nulls.take(indexes)),
            },
            Column::Dictionary {
                dict,
                indexes: own,
                shared,
            } => Column::Dictionary {
                dict: dict.clone(),
                indexes: Arc::new(indexes.iter().map(|&i| own[i as usize]).collect()),
                shared: *shared,
            },
            Column::Array { offsets, inner } => {
                let mut expanded = Vec::new();
                let mut new_offsets = Vec::with_capacity(indexes.len());
                for &row in indexes {
                    let row = row as usize;
                    let start = if row == 0 { 0 } else { offsets[row - 1] };
                    let end = offsets[row];
                    for i in start..end {
                        expanded.push(i as u32);
                    }
                    new_offsets.push(expanded.len() as u64);
                }
                Column::Array {
                    offsets: Arc::new(new_offsets),
                    inner: Arc::new(inner.take(&expanded)?),
                }
            }
            Column::Tuple { fields } => Column::Tuple {
                fields: fields
                    .iter()
                    .map(|f| f.take(indexes).map(Arc::new))
                    .collect::<Result<Vec<_>>>()?,
            },
        })
    }

    pub fn push_value(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (Column::Bool { data }, Value::Bool(v)) => data.push(v),
            (Column::Int64 { data }, Value::Int64(v)) => data.push(v),
            (Column::Float64 { data }, Value::Float64(v)) => data.push(v.0),
            (Column::Numeric { data }, Value::Numeric(v)) => data.push(v),
            (Column::String { data }, Value::String(v)) => data.push(v),
            (Column::Date { data }, Value::Date(v)) => data.push(v),
            (Column::Nothing { len }, Value::Null) => *len += 1,
            (Column::Nullable { values, nulls }, Value::Null) => {
                let default = default_value(&values.data_type());
                Arc::make_mut(values).push_value(default)?;
                Arc::make_mut(nulls).push(true);
            }
            (Column::Nullable { values, nulls }, v) => {
                Arc::make_mut(values).push_value(v)?;
                Arc::make_mut(nulls).push(false);
            }
            (Column::Array { offsets, inner }, Value::Array(elements)) => {
                let inner = Arc::make_mut(inner);
                for element in elements {
                    inner.push_value(element)?;
                }
                Arc::make_mut(offsets).push(inner.len() as u64);
            }
            (Column::Tuple { fields }, Value::Tuple(elements)) => {
                if fields.len() != elements.len() {
                    return Err(Error::internal(format!(
                        "tuple width mismatch: column has {} fields, value has {}",
                        fields.len(),
                        elements.len()
                    )));
                }
                for (field, element) in fields.iter_mut().zip(elements) {
                    Arc::make_mut(field).push_value(element)?;
                }
            }
            (col, v) => {
                return Err(Error::type_mismatch(
                    col.data_type().to_string(),
                    v.data_type().to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_value(data_type: &DataType) -> Value {
    match data_type {
        DataType::Bool => Value::Bool(false),
        DataType::Int64 => Value::Int64(0),
        DataType::Float64 => Value::float64(0.0),
        DataType::Numeric => Value::Numeric(Decimal::ZERO),
        DataType::String => Value::String(String::new()),
        DataType::Date => Value::Date(NaiveDate::default()),
        DataType::Nothing => Value::Null,
        DataType::Nullable(inner) => default_value(inner),
        DataType::Array(_) => Value::Array(Vec::new()),
        DataType::Tuple(fields) => {
            Value::Tuple(fields.iter().map(|f| default_value(&f.data_type)).collect())
        }
        DataType::Dictionary(inner) => default_value(inner),
    }
}

/// Materializes a constant into its full column; identity for everything
/// else (same allocation).
pub fn convert_to_full_if_const(column: &Arc<Column>) -> Result<Arc<Column>> {
    match &**column {
        Column::Constant { value, len } => {
            let value = convert_to_full_if_const(value)?;
            Ok(Arc::new(value.take(&vec![0; *len])?))
        }
        _ => Ok(column.clone()),
    }
}
