
use std::sync::Arc;

use aligned_vec::AVec;
use ketchsql_common::error::{Error, Result};
use ketchsql_common::types::DataType;
use ketchsql_storage::{Block, Column};

use super::argument_column;
use crate::function::ScalarFunction;

pub struct Plus;

impl ScalarFunction for Plus {
    fn name(&self) -> &str {
        "plus"
    }

    fn num_arguments(&self) -> usize {
        2
    }

    fn return_type_impl(&self, args: &[DataType]) -> Result<DataType> {
        let (lhs, rhs) = match args {
            [lhs, rhs] => (lhs, rhs),
            _ => {
                return Err(Error::argument_count_mismatch("plus requires 2 arguments"));
            }
        };
        match (lhs, rhs) {
            (DataType::Int64, DataType::Int64) => Ok(DataType::Int64),
            (DataType::Int64 | DataType::Float64, DataType::Int64 | DataType::Float64) => {
                Ok(DataType::Float64)
            }
            _ => Err(Error::type_mismatch(
                "numeric arguments",
                format!("{}, {}", lhs, rhs),
            )),
        }
    }

    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()> {
        let lhs = argument_column(block, args[0])?;
        let rhs = argument_column(block, args[1])?;

        let out = match (&*lhs, &*rhs) {
            (Column::Int64 { data: a }, Column::Int64 { data: b }) => {
                let mut data = AVec::with_capacity(64, input_rows_count);
                for i in 0..input_rows_count {
                    data.push(a[i].wrapping_add(b[i]));
                }
                Column::Int64 { data }
            }
            (Column::Float64 { data: a }, Column::Float64 { data: b }) => {
                let mut data = AVec::with_capacity(64, input_rows_count);
                for i in 0..input_rows_count {
                    data.push(a[i] + b[i]);
                }
                Column::Float64 { data }
            }
            (Column::Int64 { data: a }, Column::Float64 { data: b }) => {
                let mut data = AVec::with_capacity(64, input_rows_count);
                for i in 0..input_rows_count {
                    data.push(a[i] as f64 + b[i]);
                }
                Column::Float64 { data }
            }
            (Column::Float64 { data: a }, Column::Int64 { data: b }) => {
                let mut data = AVec::with_capacity(64, input_rows_count);
                for i in 0..input_rows_count {
                    data.push(a[i] + b[i] as f64);
                }
                Column::Float64 { data }
            }
            _ => {
                return Err(Error::type_mismatch(
                    "numeric arguments",
                    format!("{}, {}", lhs.data_type(), rhs.data_type()),
                ));
            }
        };

        block.entry_mut(result)?.column = Some(Arc::new(out));
        Ok(())
    }
}
