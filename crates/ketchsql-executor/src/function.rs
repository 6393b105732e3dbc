
use ketchsql_common::error::Result;
use ketchsql_common::types::DataType;
use ketchsql_storage::Block;

/// The kernel contract a scalar function exposes to the dispatch engine.
///
/// The capability methods declare which encodings the dispatcher may strip on
/// the kernel's behalf. With the defaults, `execute_impl` never sees constant,
/// nullable, or dictionary-encoded argument columns; a kernel that opts out of
/// a default must handle that encoding itself.
pub trait ScalarFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Fixed arity. Ignored when [`is_variadic`](Self::is_variadic) is true.
    fn num_arguments(&self) -> usize;

    fn is_variadic(&self) -> bool {
        false
    }

    /// If every argument is constant, execute on one-row inputs and project
    /// the result back to a constant.
    fn use_default_for_constants(&self) -> bool {
        true
    }

    /// NULL in any argument row forces NULL in the result row; an
    /// all-NULL-typed argument short-circuits to a constant NULL.
    fn use_default_for_nulls(&self) -> bool {
        true
    }

    /// Dictionary-encoded arguments are stripped before the kernel runs.
    fn use_default_for_dictionary(&self) -> bool {
        true
    }

    /// The result of a dictionary-encoded argument may itself be
    /// dictionary-encoded (gates the return-type re-wrap).
    fn can_execute_on_dictionary(&self) -> bool {
        true
    }

    /// The kernel may be fed a whole dictionary regardless of which entries
    /// the index vector references. Required for result caching.
    fn can_execute_on_default_arguments(&self) -> bool {
        true
    }

    /// Argument positions that must be constant columns. These are never
    /// unwrapped by the constants default.
    fn always_constant_args(&self) -> &[usize] {
        &[]
    }

    fn return_type_impl(&self, args: &[DataType]) -> Result<DataType>;

    /// Writes the result column to `block[result]`. The result column must
    /// have exactly `input_rows_count` rows.
    fn execute_impl(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()>;
}
