
use std::sync::Arc;

use ketchsql_common::error::Result;
use ketchsql_common::types::DataType;
use ketchsql_storage::{Block, Column};

use super::argument_column;
use crate::function::ScalarFunction;

/// `is_null(x)`. Opts out of the nulls default: the kernel inspects
/// nullability itself, so nullable arguments reach it unstripped.
pub struct IsNull;

impl ScalarFunction for IsNull {
    fn name(&self) -> &str {
        "is_null"
    }

    fn num_arguments(&self) -> usize {
        1
    }

    fn use_default_for_nulls(&self) -> bool {
        false
    }

    fn can_execute_on_dictionary(&self) -> bool {
        false
    }

    fn return_type_impl(&self, _args: &[DataType]) -> Result<DataType> {
        Ok(DataType::Bool)
    }

    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()> {
        let col = argument_column(block, args[0])?;
        let data = match &*col {
            Column::Nullable { nulls, .. } => {
                (0..input_rows_count).map(|i| nulls.is_null(i)).collect()
            }
            Column::Nothing { .. } => vec![true; input_rows_count],
            _ => vec![false; input_rows_count],
        };
        block.entry_mut(result)?.column = Some(Arc::new(Column::Bool { data }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ketchsql_common::types::Value;
    use ketchsql_storage::BlockEntry;

    use super::*;

    #[test]
    fn test_is_null_sees_the_nullable_column() {
        let nullable_type = DataType::Nullable(Box::new(DataType::Int64));
        let mut col = Column::new(&nullable_type);
        col.push_value(Value::Int64(1)).unwrap();
        col.push_value(Value::Null).unwrap();
        let mut block = Block::new();
        block.insert(BlockEntry::new("x", nullable_type, Arc::new(col)));
        block.insert(BlockEntry::empty("result", DataType::Bool));
        IsNull.execute_impl(&mut block, &[0], 1, 2).unwrap();
        let out = block.entry(1).unwrap().column.as_ref().unwrap().clone();
        assert_eq!(out.get_value(0), Value::Bool(false));
        assert_eq!(out.get_value(1), Value::Bool(true));
    }

    #[test]
    fn test_is_null_plain_column() {
        let mut block = Block::new();
        block.insert(BlockEntry::new(
            "x",
            DataType::Int64,
            Arc::new(Column::broadcast(Value::Int64(1), 3)),
        ));
        block.insert(BlockEntry::empty("result", DataType::Bool));
        IsNull.execute_impl(&mut block, &[0], 1, 3).unwrap();
        let out = block.entry(1).unwrap().column.as_ref().unwrap().clone();
        for i in 0..3 {
            assert_eq!(out.get_value(i), Value::Bool(false));
        }
    }
}
