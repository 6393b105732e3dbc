
use std::sync::Arc;

use ketchsql_common::error::{Error, Result};
use ketchsql_common::types::DataType;
use ketchsql_storage::{Block, Column};

use super::argument_column;
use crate::function::ScalarFunction;

pub struct Upper;

impl ScalarFunction for Upper {
    fn name(&self) -> &str {
        "upper"
    }

    fn num_arguments(&self) -> usize {
        1
    }

    fn return_type_impl(&self, args: &[DataType]) -> Result<DataType> {
        match args {
            [DataType::String] => Ok(DataType::String),
            [other] => Err(Error::type_mismatch("STRING", other.to_string())),
            _ => Err(Error::argument_count_mismatch("upper requires 1 argument")),
        }
    }

    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        _input_rows_count: usize,
    ) -> Result<()> {
        let col = argument_column(block, args[0])?;
        let out = match &*col {
            Column::String { data } => Column::String {
                data: data.iter().map(|s| s.to_ascii_uppercase()).collect(),
            },
            other => {
                return Err(Error::type_mismatch("STRING", other.data_type().to_string()));
            }
        };
        block.entry_mut(result)?.column = Some(Arc::new(out));
        Ok(())
    }
}

pub struct Concat;

impl ScalarFunction for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn num_arguments(&self) -> usize {
        0
    }

    fn is_variadic(&self) -> bool {
        true
    }

    fn return_type_impl(&self, args: &[DataType]) -> Result<DataType> {
        if args.len() < 2 {
            return Err(Error::argument_count_mismatch(
                "concat requires at least 2 arguments",
            ));
        }
        for arg in args {
            if *arg != DataType::String {
                return Err(Error::type_mismatch("STRING", arg.to_string()));
            }
        }
        Ok(DataType::String)
    }

    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()> {
        let mut columns = Vec::with_capacity(args.len());
        for &arg in args {
            let col = argument_column(block, arg)?;
            match &*col {
                Column::String { .. } => columns.push(col),
                other => {
                    return Err(Error::type_mismatch(
                        "STRING",
                        other.data_type().to_string(),
                    ));
                }
            }
        }

        let mut data = Vec::with_capacity(input_rows_count);
        for row in 0..input_rows_count {
            let mut out = String::new();
            for col in &columns {
                if let Column::String { data } = &**col {
                    out.push_str(&data[row]);
                }
            }
            data.push(out);
        }
        block.entry_mut(result)?.column = Some(Arc::new(Column::String { data }));
        Ok(())
    }
}

/// `repeat(s, n)` with a constant repetition count. The count argument is
/// declared always-constant and reaches the kernel as a constant column.
pub struct Repeat;

impl ScalarFunction for Repeat {
    fn name(&self) -> &str {
        "repeat"
    }

    fn num_arguments(&self) -> usize {
        2
    }

    fn always_constant_args(&self) -> &[usize] {
        &[1]
    }

    fn return_type_impl(&self, args: &[DataType]) -> Result<DataType> {
        match args {
            [DataType::String, DataType::Int64] => Ok(DataType::String),
            [lhs, rhs] => Err(Error::type_mismatch(
                "STRING, INT64",
                format!("{}, {}", lhs, rhs),
            )),
            _ => Err(Error::argument_count_mismatch("repeat requires 2 arguments")),
        }
    }

    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        _input_rows_count: usize,
    ) -> Result<()> {
        let count_column = block
            .entry(args[1])?
            .column
            .as_ref()
            .ok_or_else(|| Error::internal("unpopulated argument column"))?;
        let count = count_column
            .get_value(0)
            .as_i64()
            .ok_or_else(|| Error::type_mismatch("INT64", count_column.data_type().to_string()))?;
        let count = count.max(0) as usize;

        let col = argument_column(block, args[0])?;
        let out = match &*col {
            Column::String { data } => Column::String {
                data: data.iter().map(|s| s.repeat(count)).collect(),
            },
            other => {
                return Err(Error::type_mismatch("STRING", other.data_type().to_string()));
            }
        };
        block.entry_mut(result)?.column = Some(Arc::new(out));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ketchsql_common::types::Value;
    use ketchsql_storage::BlockEntry;

    use super::*;

    fn string_column(values: &[&str]) -> Arc<Column> {
        let mut col = Column::new(&DataType::String);
        for v in values {
            col.push_value(Value::String(v.to_string())).unwrap();
        }
        Arc::new(col)
    }

    #[test]
    fn test_upper() {
        let mut block = Block::new();
        block.insert(BlockEntry::new(
            "s",
            DataType::String,
            string_column(&["abc", "Def"]),
        ));
        block.insert(BlockEntry::empty("result", DataType::String));
        Upper.execute_impl(&mut block, &[0], 1, 2).unwrap();
        let out = block.entry(1).unwrap().column.as_ref().unwrap().clone();
        assert_eq!(out.get_value(0), Value::String("ABC".to_string()));
        assert_eq!(out.get_value(1), Value::String("DEF".to_string()));
    }

    #[test]
    fn test_concat_variadic_return_type() {
        assert!(Concat.return_type_impl(&[DataType::String]).is_err());
        assert_eq!(
            Concat
                .return_type_impl(&[DataType::String, DataType::String, DataType::String])
                .unwrap(),
            DataType::String
        );
    }

    #[test]
    fn test_concat() {
        let mut block = Block::new();
        block.insert(BlockEntry::new(
            "a",
            DataType::String,
            string_column(&["x", "y"]),
        ));
        block.insert(BlockEntry::new(
            "b",
            DataType::String,
            string_column(&["1", "2"]),
        ));
        block.insert(BlockEntry::empty("result", DataType::String));
        Concat.execute_impl(&mut block, &[0, 1], 2, 2).unwrap();
        let out = block.entry(2).unwrap().column.as_ref().unwrap().clone();
        assert_eq!(out.get_value(0), Value::String("x1".to_string()));
        assert_eq!(out.get_value(1), Value::String("y2".to_string()));
    }

    #[test]
    fn test_repeat_with_constant_count() {
        let mut block = Block::new();
        block.insert(BlockEntry::new(
            "s",
            DataType::String,
            string_column(&["ab", "c"]),
        ));
        block.insert(BlockEntry::new(
            "n",
            DataType::Int64,
            Arc::new(Column::constant(Value::Int64(3), 2)),
        ));
        block.insert(BlockEntry::empty("result", DataType::String));
        Repeat.execute_impl(&mut block, &[0, 1], 2, 2).unwrap();
        let out = block.entry(2).unwrap().column.as_ref().unwrap().clone();
        assert_eq!(out.get_value(0), Value::String("ababab".to_string()));
        assert_eq!(out.get_value(1), Value::String("ccc".to_string()));
    }
}
