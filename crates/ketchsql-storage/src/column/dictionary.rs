
use std::sync::Arc;

use chrono::Datelike;
use ketchsql_common::error::Result;
use ketchsql_common::types::Value;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use super::Column;

/// A unique-valued dictionary backing a dictionary-encoded column.
///
/// The content hash is computed once at construction and is the dictionary's
/// stable identity: two live dictionaries with the same hash are assumed to
/// hold the same keys (size is the tiebreaker downstream).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dictionary {
    values: Arc<Column>,
    hash: u128,
}

impl Dictionary {
    pub fn new(values: Arc<Column>) -> Self {
        let hash = hash_values(&values);
        Self { values, hash }
    }

    pub fn values(&self) -> &Arc<Column> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn hash(&self) -> u128 {
        self.hash
    }

    /// The dictionary's full values column, shared.
    pub fn nested_column(&self) -> Arc<Column> {
        self.values.clone()
    }

    /// Builds a unique dictionary from `keys` and returns it together with
    /// the index of each input row in the new dictionary.
    pub fn unique_insert_range(keys: &Column) -> Result<(Arc<Dictionary>, Vec<u32>)> {
        let mut positions: FxHashMap<Value, u32> = FxHashMap::default();
        let mut values = Column::new(&keys.data_type());
        let mut indexes = Vec::with_capacity(keys.len());
        for row in 0..keys.len() {
            let value = keys.get_value(row);
            match positions.get(&value) {
                Some(&index) => indexes.push(index),
                None => {
                    let index = values.len() as u32;
                    values.push_value(value.clone())?;
                    positions.insert(value, index);
                    indexes.push(index);
                }
            }
        }
        Ok((Arc::new(Dictionary::new(Arc::new(values))), indexes))
    }

    /// Restricts the dictionary to the values actually referenced by
    /// `indexes`: returns the referenced values (in first-appearance order)
    /// and the remapped index vector.
    pub fn minimal_encoding(&self, indexes: &[u32]) -> Result<(Arc<Column>, Vec<u32>)> {
        let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
        let mut referenced = Vec::new();
        let mut new_indexes = Vec::with_capacity(indexes.len());
        for &index in indexes {
            match remap.get(&index) {
                Some(&new_index) => new_indexes.push(new_index),
                None => {
                    let new_index = referenced.len() as u32;
                    remap.insert(index, new_index);
                    referenced.push(index);
                    new_indexes.push(new_index);
                }
            }
        }
        let values = self.values.take(&referenced)?;
        Ok((Arc::new(values), new_indexes))
    }
}

/// Remap composition: `out[i] = mapping[indexes[i]]`. Every index must be a
/// valid position in `mapping`.
pub fn compose_indexes(mapping: &[u32], indexes: &[u32]) -> Vec<u32> {
    indexes.iter().map(|&i| mapping[i as usize]).collect()
}

fn hash_values(column: &Column) -> u128 {
    let mut hasher = Xxh3::new();
    hasher.update(&(column.len() as u64).to_le_bytes());
    for row in 0..column.len() {
        hash_value(&column.get_value(row), &mut hasher);
    }
    hasher.digest128()
}

fn hash_value(value: &Value, hasher: &mut Xxh3) {
    match value {
        Value::Null => hasher.update(&[0]),
        Value::Bool(v) => hasher.update(&[1, *v as u8]),
        Value::Int64(v) => {
            hasher.update(&[2]);
            hasher.update(&v.to_le_bytes());
        }
        Value::Float64(v) => {
            hasher.update(&[3]);
            hasher.update(&v.0.to_bits().to_le_bytes());
        }
        Value::Numeric(v) => {
            hasher.update(&[4]);
            hasher.update(&v.serialize());
        }
        Value::String(v) => {
            hasher.update(&[5]);
            hasher.update(&(v.len() as u64).to_le_bytes());
            hasher.update(v.as_bytes());
        }
        Value::Date(v) => {
            hasher.update(&[6]);
            hasher.update(&v.num_days_from_ce().to_le_bytes());
        }
        Value::Array(elements) => {
            hasher.update(&[7]);
            hasher.update(&(elements.len() as u64).to_le_bytes());
            for element in elements {
                hash_value(element, hasher);
            }
        }
        Value::Tuple(elements) => {
            hasher.update(&[8]);
            hasher.update(&(elements.len() as u64).to_le_bytes());
            for element in elements {
                hash_value(element, hasher);
            }
        }
    }
}
