
pub mod math;
pub mod nulls;
pub mod string;

use std::sync::Arc;

use ketchsql_common::error::{Error, Result};
use ketchsql_storage::{Block, Column, convert_to_full_if_const};

pub use math::Plus;
pub use nulls::IsNull;
pub use string::{Concat, Repeat, Upper};

use crate::function::ScalarFunction;

pub fn build_function(name: &str) -> Result<Arc<dyn ScalarFunction>> {
    match name {
        "plus" => Ok(Arc::new(Plus)),
        "upper" => Ok(Arc::new(Upper)),
        "concat" => Ok(Arc::new(Concat)),
        "repeat" => Ok(Arc::new(Repeat)),
        "is_null" => Ok(Arc::new(IsNull)),
        other => Err(Error::function_not_found(other)),
    }
}

/// An argument column with any constant wrapper materialized. Kernels that
/// iterate dense vectors use this when a block mixes plain and constant
/// arguments (the constants default only fires when every argument is
/// constant).
pub fn argument_column(block: &Block, position: usize) -> Result<Arc<Column>> {
    let column = block
        .entry(position)?
        .column
        .as_ref()
        .ok_or_else(|| Error::internal("unpopulated argument column"))?;
    convert_to_full_if_const(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_function_known() {
        assert_eq!(build_function("plus").unwrap().name(), "plus");
        assert_eq!(build_function("upper").unwrap().name(), "upper");
    }

    #[test]
    fn test_build_function_unknown() {
        assert!(matches!(
            build_function("no_such_function"),
            Err(Error::FunctionNotFound(_))
        ));
    }
}
