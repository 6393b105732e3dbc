
use std::sync::Arc;

use ketchsql_common::error::{Error, Result};
use ketchsql_common::types::DataType;

use crate::Column;

/// One position of a block: a named, typed, optionally populated column.
/// The result position starts unpopulated and is filled by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    pub name: String,
    pub data_type: DataType,
    pub column: Option<Arc<Column>>,
}

impl BlockEntry {
    pub fn new(name: impl Into<String>, data_type: DataType, column: Arc<Column>) -> Self {
        Self {
            name: name.into(),
            data_type,
            column: Some(column),
        }
    }

    pub fn empty(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            column: None,
        }
    }
}

/// A horizontal slab of rows in columnar layout; the unit of dispatch.
/// Positions are addressed by integer index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    entries: Vec<BlockEntry>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<BlockEntry>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, entry: BlockEntry) {
        self.entries.push(entry);
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, position: usize) -> Result<&BlockEntry> {
        self.entries.get(position).ok_or_else(|| {
            Error::internal(format!(
                "block position {} out of bounds ({} positions)",
                position,
                self.entries.len()
            ))
        })
    }

    pub fn entry_mut(&mut self, position: usize) -> Result<&mut BlockEntry> {
        let num_entries = self.entries.len();
        self.entries.get_mut(position).ok_or_else(|| {
            Error::internal(format!(
                "block position {} out of bounds ({} positions)",
                position, num_entries
            ))
        })
    }

    /// Number of rows: the length of the first populated column. Constant
    /// columns report their projected length.
    pub fn rows(&self) -> usize {
        self.entries
            .iter()
            .find_map(|e| e.column.as_ref().map(|c| c.len()))
            .unwrap_or(0)
    }

    /// Same names and types, no columns. Used to build shadow blocks that
    /// then share the caller's column references.
    pub fn clone_without_columns(&self) -> Block {
        Block {
            entries: self
                .entries
                .iter()
                .map(|e| BlockEntry::empty(e.name.clone(), e.data_type.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ketchsql_common::types::Value;

    use super::*;

    #[test]
    fn test_rows_skips_unpopulated() {
        let mut block = Block::new();
        block.insert(BlockEntry::empty("result", DataType::Int64));
        block.insert(BlockEntry::new(
            "a",
            DataType::Int64,
            Arc::new(Column::broadcast(Value::Int64(1), 7)),
        ));
        assert_eq!(block.rows(), 7);
    }

    #[test]
    fn test_rows_empty_block() {
        assert_eq!(Block::new().rows(), 0);
    }

    #[test]
    fn test_entry_out_of_bounds() {
        let block = Block::new();
        assert!(block.entry(0).is_err());
    }

    #[test]
    fn test_clone_without_columns_shares_nothing() {
        let mut block = Block::new();
        block.insert(BlockEntry::new(
            "a",
            DataType::Int64,
            Arc::new(Column::broadcast(Value::Int64(1), 3)),
        ));
        let shadow = block.clone_without_columns();
        assert_eq!(shadow.num_entries(), 1);
        assert!(shadow.entry(0).unwrap().column.is_none());
        assert_eq!(shadow.entry(0).unwrap().data_type, DataType::Int64);
    }
}
