
mod access;
mod dictionary;
mod ops;

use std::sync::Arc;

use aligned_vec::{AVec, ConstAlign};
use chrono::NaiveDate;
use ketchsql_common::types::{DataType, TupleField};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use self::dictionary::{Dictionary, compose_indexes};
pub use self::ops::convert_to_full_if_const;
use crate::NullBitmap;

pub type A64 = ConstAlign<64>;

/// Serde for the 64-byte-aligned payload vectors. The wire format is a plain
/// sequence; alignment is re-imposed when the column is read back.
mod avec_serde {
    use aligned_vec::AVec;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::A64;

    pub fn serialize<S, T>(data: &AVec<T, A64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(data.iter())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<AVec<T, A64>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(AVec::from_iter(64, Vec::<T>::deserialize(deserializer)?))
    }
}

/// A column of values under one of the engine's encodings.
///
/// Ground variants are dense vectors. The remaining variants are the
/// encodings a function kernel is allowed to ignore: `Constant` projects a
/// one-row inner column to a length, `Nullable` pairs values with an explicit
/// null map, `Dictionary` stores unique values plus per-row indexes, and
/// `Array`/`Tuple` are recursive containers. `Nothing` carries rows that can
/// only be NULL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Column {
    Bool {
        data: Vec<bool>,
    },
    Int64 {
        #[serde(with = "avec_serde")]
        data: AVec<i64, A64>,
    },
    Float64 {
        #[serde(with = "avec_serde")]
        data: AVec<f64, A64>,
    },
    Numeric {
        data: Vec<Decimal>,
    },
    String {
        data: Vec<String>,
    },
    Date {
        data: Vec<NaiveDate>,
    },
    Nothing {
        len: usize,
    },
    Constant {
        value: Arc<Column>,
        len: usize,
    },
    Nullable {
        values: Arc<Column>,
        nulls: Arc<NullBitmap>,
    },
    Dictionary {
        dict: Arc<Dictionary>,
        indexes: Arc<Vec<u32>>,
        shared: bool,
    },
    Array {
        offsets: Arc<Vec<u64>>,
        inner: Arc<Column>,
    },
    Tuple {
        fields: Vec<Arc<Column>>,
    },
}

impl Column {
    /// An empty column of the given type.
    pub fn new(data_type: &DataType) -> Self {
        match data_type {
            DataType::Bool => Column::Bool { data: Vec::new() },
            DataType::Int64 => Column::Int64 {
                data: AVec::new(64),
            },
            DataType::Float64 => Column::Float64 {
                data: AVec::new(64),
            },
            DataType::Numeric => Column::Numeric { data: Vec::new() },
            DataType::String => Column::String { data: Vec::new() },
            DataType::Date => Column::Date { data: Vec::new() },
            DataType::Nothing => Column::Nothing { len: 0 },
            DataType::Nullable(inner) => Column::Nullable {
                values: Arc::new(Column::new(inner)),
                nulls: Arc::new(NullBitmap::new()),
            },
            DataType::Array(inner) => Column::Array {
                offsets: Arc::new(Vec::new()),
                inner: Arc::new(Column::new(inner)),
            },
            DataType::Tuple(fields) => Column::Tuple {
                fields: fields
                    .iter()
                    .map(|f| Arc::new(Column::new(&f.data_type)))
                    .collect(),
            },
            DataType::Dictionary(inner) => Column::Dictionary {
                dict: Arc::new(Dictionary::new(Arc::new(Column::new(inner)))),
                indexes: Arc::new(Vec::new()),
                shared: false,
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Bool { data } => data.len(),
            Column::Int64 { data } => data.len(),
            Column::Float64 { data } => data.len(),
            Column::Numeric { data } => data.len(),
            Column::String { data } => data.len(),
            Column::Date { data } => data.len(),
            Column::Nothing { len } => *len,
            Column::Constant { len, .. } => *len,
            Column::Nullable { values, .. } => values.len(),
            Column::Dictionary { indexes, .. } => indexes.len(),
            Column::Array { offsets, .. } => offsets.len(),
            Column::Tuple { fields } => fields.first().map(|f| f.len()).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Bool { .. } => DataType::Bool,
            Column::Int64 { .. } => DataType::Int64,
            Column::Float64 { .. } => DataType::Float64,
            Column::Numeric { .. } => DataType::Numeric,
            Column::String { .. } => DataType::String,
            Column::Date { .. } => DataType::Date,
            Column::Nothing { .. } => DataType::Nothing,
            Column::Constant { value, .. } => value.data_type(),
            Column::Nullable { values, .. } => DataType::Nullable(Box::new(values.data_type())),
            Column::Dictionary { dict, .. } => {
                DataType::Dictionary(Box::new(dict.values().data_type()))
            }
            Column::Array { inner, .. } => DataType::Array(Box::new(inner.data_type())),
            Column::Tuple { fields } => DataType::Tuple(
                fields
                    .iter()
                    .map(|f| TupleField::unnamed(f.data_type()))
                    .collect(),
            ),
        }
    }
}
