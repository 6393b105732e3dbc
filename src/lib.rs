
//! KetchSQL - the function execution dispatch core of a columnar analytical
//! query engine.
//!
//! Given a scalar function and a block (a horizontal slab of typed columns),
//! the dispatch engine invokes the function's kernel correctly in the
//! presence of three orthogonal column encodings the kernel author may
//! ignore: constant columns, nullable columns with an explicit null map, and
//! dictionary-encoded (low-cardinality) columns.
//!
//! # Architecture
//!
//! ```text
//! Block → FunctionExecutor (strip dictionaries → constants → nulls)
//!       → ScalarFunction::execute_impl → re-wrap encodings → result column
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ketchsql::scalar_functions::build_function;
//! use ketchsql::{Block, BlockEntry, Column, DataType, FunctionExecutor, Value};
//!
//! let executor = FunctionExecutor::new(build_function("plus").unwrap());
//! let entries = vec![
//!     BlockEntry::new("a", DataType::Int64, Arc::new(Column::constant(Value::Int64(2), 4))),
//!     BlockEntry::new("b", DataType::Int64, Arc::new(Column::constant(Value::Int64(3), 4))),
//! ];
//! let result_type = executor.return_type(&entries).unwrap();
//!
//! let mut block = Block::from_entries(entries);
//! block.insert(BlockEntry::empty("result", result_type));
//! executor.execute(&mut block, &[0, 1], 2, 4).unwrap();
//!
//! let result = block.entry(2).unwrap().column.as_ref().unwrap();
//! assert!(result.is_constant());
//! assert_eq!(result.get_value(0), Value::Int64(5));
//! ```

pub use ketchsql_common::error::{Error, Result};
pub use ketchsql_common::types::{DataType, TupleField, Value};
pub use ketchsql_executor::{
    CachedValues, DictionaryKey, DictionaryResultCache, FunctionExecutor, ScalarFunction,
    scalar_functions, wrap_in_nullable,
};
pub use ketchsql_storage::{
    Block, BlockEntry, Column, Dictionary, NullBitmap, compose_indexes, convert_to_full_if_const,
    remove_dictionary_column, remove_dictionary_type,
};
