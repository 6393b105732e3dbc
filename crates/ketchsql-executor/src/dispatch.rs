
use std::num::NonZeroUsize;
use std::sync::Arc;

use ketchsql_common::error::{Error, Result};
use ketchsql_common::types::DataType;
use ketchsql_storage::{
    Block, BlockEntry, Column, Dictionary, NullBitmap, compose_indexes, convert_to_full_if_const,
    remove_dictionary_column, remove_dictionary_type,
};

use crate::function::ScalarFunction;
use crate::result_cache::{CachedValues, DictionaryKey, DictionaryResultCache};

/// Executes a scalar function over blocks, stripping the encodings the
/// kernel declared it does not handle and reconstructing them on the result.
///
/// Three cascading defaults form a priority chain: dictionaries are stripped
/// first (here), then constants, then nulls (both in
/// `execute_without_dictionary`). The executor is re-entrant: one instance is
/// shared by many worker threads, each invoking [`execute`](Self::execute) on
/// its own block. The dictionary result cache is the only shared state.
pub struct FunctionExecutor {
    function: Arc<dyn ScalarFunction>,
    result_cache: Option<Arc<DictionaryResultCache>>,
}

impl FunctionExecutor {
    pub fn new(function: Arc<dyn ScalarFunction>) -> Self {
        Self {
            function,
            result_cache: None,
        }
    }

    /// Enables memoization of kernel runs over shared dictionaries.
    /// `cache_size` should be the number of concurrent reader streams.
    pub fn with_dictionary_result_cache(mut self, cache_size: NonZeroUsize) -> Self {
        if self.result_cache.is_none() {
            self.result_cache = Some(Arc::new(DictionaryResultCache::new(cache_size)));
        }
        self
    }

    pub fn function(&self) -> &Arc<dyn ScalarFunction> {
        &self.function
    }

    pub fn result_cache(&self) -> Option<&Arc<DictionaryResultCache>> {
        self.result_cache.as_ref()
    }

    /// Outer dispatch entry. Writes the result column to `block[result]`.
    pub fn execute(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()> {
        if !self.function.use_default_for_dictionary() {
            return self.execute_without_dictionary(block, args, result, input_rows_count);
        }

        let result_type = block.entry(result)?.data_type.clone();
        let mut shadow = block.clone_without_columns();
        for &arg in args {
            shadow.entry_mut(arg)?.column = block.entry(arg)?.column.clone();
        }

        if let DataType::Dictionary(result_inner) = &result_type {
            let dict_arg = find_dictionary_argument(block, args)?;
            let can_execute_on_defaults = self.function.can_execute_on_default_arguments();
            let use_cache = self.result_cache.is_some()
                && can_execute_on_defaults
                && dict_arg.as_ref().is_some_and(|d| d.shared);

            let mut cache_key = None;
            if use_cache {
                if let (Some(cache), Some(d)) = (&self.result_cache, &dict_arg) {
                    let key = DictionaryKey {
                        hash: d.dict.hash(),
                        size: d.dict.len() as u64,
                    };
                    if let Some(cached) = cache.get(&key) {
                        log::trace!(
                            "function {}: dictionary result cache hit",
                            self.function.name()
                        );
                        let indexes = compose_indexes(&cached.index_mapping, &d.indexes);
                        block.entry_mut(result)?.column = Some(Arc::new(Column::Dictionary {
                            dict: cached.function_result.clone(),
                            indexes: Arc::new(indexes),
                            shared: true,
                        }));
                        return Ok(());
                    }
                    cache_key = Some(key);
                }
            }

            shadow.entry_mut(result)?.data_type = (**result_inner).clone();
            let (surviving_indexes, shadow_rows) = replace_dictionary_columns(
                &mut shadow,
                args,
                can_execute_on_defaults,
                input_rows_count,
            )?;
            self.execute_without_dictionary(&mut shadow, args, result, shadow_rows)?;

            let keys = shadow
                .entry(result)?
                .column
                .clone()
                .ok_or_else(|| Error::internal("kernel produced no result column"))?;
            let keys = convert_to_full_if_const(&keys)?;
            let (mut result_dict, result_indexes) = Dictionary::unique_insert_range(&keys)?;
            let mut result_indexes = Arc::new(result_indexes);

            match surviving_indexes {
                Some(surviving) => {
                    if let (Some(cache), Some(key), Some(d)) =
                        (&self.result_cache, cache_key, &dict_arg)
                    {
                        let values = Arc::new(CachedValues {
                            dictionary_holder: d.dict.clone(),
                            function_result: result_dict.clone(),
                            index_mapping: result_indexes.clone(),
                        });
                        // The loser of a concurrent insert adopts the
                        // winner's dictionary to keep identity-sharing.
                        let canonical = cache.get_or_set(key, values);
                        result_dict = canonical.function_result.clone();
                        result_indexes = canonical.index_mapping.clone();
                    }
                    block.entry_mut(result)?.column = Some(Arc::new(Column::Dictionary {
                        dict: result_dict,
                        indexes: Arc::new(compose_indexes(&result_indexes, &surviving)),
                        shared: use_cache,
                    }));
                }
                None => {
                    block.entry_mut(result)?.column = Some(Arc::new(Column::Dictionary {
                        dict: result_dict,
                        indexes: result_indexes,
                        shared: false,
                    }));
                }
            }
            Ok(())
        } else {
            for &arg in args {
                let entry = shadow.entry_mut(arg)?;
                if let Some(column) = &entry.column {
                    entry.column = Some(remove_dictionary_column(column)?);
                }
                entry.data_type = remove_dictionary_type(&entry.data_type);
            }
            self.execute_without_dictionary(&mut shadow, args, result, input_rows_count)?;
            block.entry_mut(result)?.column = shadow.entry(result)?.column.clone();
            Ok(())
        }
    }

    /// Inner dispatch entry: constants default, then nulls default, then the
    /// kernel itself.
    fn execute_without_dictionary(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<()> {
        if self.default_for_constant_arguments(block, args, result, input_rows_count)? {
            return Ok(());
        }
        if self.default_for_nulls(block, args, result, input_rows_count)? {
            return Ok(());
        }
        log::trace!(
            "function {}: kernel on {} rows",
            self.function.name(),
            input_rows_count
        );
        self.function.execute_impl(block, args, result, input_rows_count)
    }

    fn default_for_constant_arguments(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<bool> {
        let remain_constant = self.function.always_constant_args();

        for &arg_num in remain_constant {
            if arg_num < args.len() {
                let is_const = block
                    .entry(args[arg_num])?
                    .column
                    .as_ref()
                    .is_some_and(|c| c.is_constant());
                if !is_const {
                    return Err(Error::illegal_column(format!(
                        "argument {} of function {} must be constant",
                        arg_num,
                        self.function.name()
                    )));
                }
            }
        }

        if args.is_empty()
            || !self.function.use_default_for_constants()
            || !all_arguments_are_constants(block, args)?
        {
            return Ok(false);
        }

        let mut temporary = Block::new();
        let mut have_converted = false;
        for (arg_num, &arg) in args.iter().enumerate() {
            let entry = block.entry(arg)?;
            if remain_constant.contains(&arg_num) {
                temporary.insert(entry.clone());
            } else {
                have_converted = true;
                let column = entry
                    .column
                    .as_ref()
                    .ok_or_else(|| Error::internal("unpopulated argument column"))?;
                let (value, _) = column
                    .as_constant()
                    .ok_or_else(|| Error::internal("expected a constant column"))?;
                temporary.insert(BlockEntry::new(
                    entry.name.clone(),
                    entry.data_type.clone(),
                    value.clone(),
                ));
            }
        }

        // Unwrapping nothing would recurse forever.
        if !have_converted {
            return Err(Error::argument_count_mismatch(format!(
                "function {} requires at least one argument that is not always constant",
                self.function.name()
            )));
        }

        temporary.insert(block.entry(result)?.clone());
        let temporary_args: Vec<usize> = (0..args.len()).collect();
        let temporary_result = args.len();
        self.execute_without_dictionary(&mut temporary, &temporary_args, temporary_result, 1)?;

        let inner = temporary
            .entry(temporary_result)?
            .column
            .clone()
            .ok_or_else(|| Error::internal("kernel produced no result column"))?;
        let inner = convert_to_full_if_const(&inner)?;
        block.entry_mut(result)?.column = Some(Arc::new(Column::Constant {
            value: inner,
            len: input_rows_count,
        }));
        Ok(true)
    }

    fn default_for_nulls(
        &self,
        block: &mut Block,
        args: &[usize],
        result: usize,
        input_rows_count: usize,
    ) -> Result<bool> {
        if args.is_empty() || !self.function.use_default_for_nulls() {
            return Ok(false);
        }

        let mut has_nullable = false;
        let mut has_null_constant = false;
        for &arg in args {
            let data_type = &block.entry(arg)?.data_type;
            has_nullable |= data_type.is_nullable();
            has_null_constant |= data_type.only_null();
        }

        if has_null_constant {
            let result_type = block.entry(result)?.data_type.clone();
            block.entry_mut(result)?.column =
                Some(Arc::new(Column::constant_null(&result_type, input_rows_count)?));
            return Ok(true);
        }

        if has_nullable {
            let mut temporary = block_with_nested_columns(block, args, result)?;
            let rows = temporary.rows();
            self.execute_without_dictionary(&mut temporary, args, result, rows)?;
            let src = temporary
                .entry(result)?
                .column
                .clone()
                .ok_or_else(|| Error::internal("kernel produced no result column"))?;
            block.entry_mut(result)?.column =
                Some(wrap_in_nullable(&src, block, args, result, input_rows_count)?);
            return Ok(true);
        }

        Ok(false)
    }

    /// Result type for the given argument entries. Mirrors the encoding
    /// stripping of [`execute`](Self::execute) purely at type level, so for
    /// every block the executed result column has exactly this type.
    pub fn return_type(&self, args: &[BlockEntry]) -> Result<DataType> {
        if !self.function.use_default_for_dictionary() {
            return self.return_type_without_dictionary(args);
        }

        let mut has_dictionary = false;
        let mut num_full_dictionary = 0usize;
        let mut num_full_ordinary = 0usize;

        let mut stripped = Vec::with_capacity(args.len());
        for arg in args {
            let mut entry = arg.clone();
            let is_const = entry.column.as_ref().is_some_and(|c| c.is_constant());
            if let DataType::Dictionary(inner) = &entry.data_type {
                has_dictionary = true;
                if !is_const {
                    num_full_dictionary += 1;
                }
                entry.data_type = (**inner).clone();
            } else if !is_const {
                num_full_ordinary += 1;
            }
            entry.data_type = remove_dictionary_type(&entry.data_type);
            if let Some(column) = &entry.column {
                entry.column = Some(remove_dictionary_column(column)?);
            }
            stripped.push(entry);
        }

        if self.function.can_execute_on_dictionary()
            && has_dictionary
            && num_full_dictionary <= 1
            && num_full_ordinary == 0
        {
            Ok(DataType::Dictionary(Box::new(
                self.return_type_without_dictionary(&stripped)?,
            )))
        } else {
            self.return_type_without_dictionary(&stripped)
        }
    }

    /// Convenience over [`return_type`](Self::return_type) when only types
    /// are known (no constness information).
    pub fn return_type_from_types(&self, types: &[DataType]) -> Result<DataType> {
        let entries: Vec<BlockEntry> = types
            .iter()
            .map(|t| BlockEntry::empty("", t.clone()))
            .collect();
        self.return_type(&entries)
    }

    fn return_type_without_dictionary(&self, args: &[BlockEntry]) -> Result<DataType> {
        self.check_number_of_arguments(args.len())?;

        if !args.is_empty() && self.function.use_default_for_nulls() {
            let mut has_nullable = false;
            let mut has_null_constant = false;
            for arg in args {
                has_nullable |= arg.data_type.is_nullable();
                has_null_constant |= arg.data_type.only_null();
            }
            if has_null_constant {
                return Ok(DataType::Nullable(Box::new(DataType::Nothing)));
            }
            if has_nullable {
                let nested: Vec<DataType> =
                    args.iter().map(|a| a.data_type.remove_nullable()).collect();
                return Ok(self.function.return_type_impl(&nested)?.make_nullable());
            }
        }

        let types: Vec<DataType> = args.iter().map(|a| a.data_type.clone()).collect();
        self.function.return_type_impl(&types)
    }

    fn check_number_of_arguments(&self, passed: usize) -> Result<()> {
        if self.function.is_variadic() {
            return Ok(());
        }
        let expected = self.function.num_arguments();
        if passed != expected {
            return Err(Error::argument_count_mismatch(format!(
                "function {}: passed {}, should be {}",
                self.function.name(),
                passed,
                expected
            )));
        }
        Ok(())
    }
}

struct DictionaryArgument {
    dict: Arc<Dictionary>,
    indexes: Arc<Vec<u32>>,
    shared: bool,
}

fn find_dictionary_argument(block: &Block, args: &[usize]) -> Result<Option<DictionaryArgument>> {
    let mut found: Option<DictionaryArgument> = None;
    for &arg in args {
        if let Some(column) = &block.entry(arg)?.column {
            if let Column::Dictionary {
                dict,
                indexes,
                shared,
            } = &**column
            {
                if found.is_some() {
                    return Err(Error::internal(
                        "expected a single dictionary argument for function",
                    ));
                }
                found = Some(DictionaryArgument {
                    dict: dict.clone(),
                    indexes: indexes.clone(),
                    shared: *shared,
                });
            }
        }
    }
    Ok(found)
}

/// Strips the dictionary argument (and any constants) out of the shadow
/// block. Returns the per-row indexes that survive into the result, and the
/// row count the kernel will run on: the dictionary rows actually fed to the
/// kernel, or `input_rows_count` when no dictionary argument exists.
fn replace_dictionary_columns(
    shadow: &mut Block,
    args: &[usize],
    can_execute_on_defaults: bool,
    input_rows_count: usize,
) -> Result<(Option<Arc<Vec<u32>>>, usize)> {
    let mut dict_position = None;
    for &arg in args {
        let entry = shadow.entry(arg)?;
        if entry.column.as_ref().is_some_and(|c| c.is_dictionary()) {
            if dict_position.is_some() {
                return Err(Error::internal(
                    "expected a single dictionary argument for function",
                ));
            }
            dict_position = Some(arg);
        }
    }

    let mut surviving_indexes = None;
    let mut rows = input_rows_count;

    if let Some(position) = dict_position {
        let entry = shadow.entry_mut(position)?;
        if !entry.data_type.is_dictionary() {
            return Err(Error::internal(format!(
                "column at position {} is dictionary-encoded but its type is {}",
                position, entry.data_type
            )));
        }
        let column = entry
            .column
            .clone()
            .ok_or_else(|| Error::internal("unpopulated argument column"))?;
        if let Column::Dictionary { dict, indexes, .. } = &*column {
            if can_execute_on_defaults {
                entry.column = Some(dict.nested_column());
                surviving_indexes = Some(indexes.clone());
                rows = dict.len();
            } else {
                let (values, new_indexes) = dict.minimal_encoding(indexes)?;
                rows = values.len();
                entry.column = Some(values);
                surviving_indexes = Some(Arc::new(new_indexes));
            }
        }
        entry.data_type = remove_dictionary_type(&entry.data_type);
    }

    for &arg in args {
        let entry = shadow.entry_mut(arg)?;
        let Some(column) = entry.column.clone() else {
            continue;
        };
        if column.is_constant() {
            let stripped = remove_dictionary_column(&column)?;
            entry.column = Some(Arc::new(stripped.clone_resized(rows)?));
            entry.data_type = remove_dictionary_type(&entry.data_type);
        }
    }

    Ok((surviving_indexes, rows))
}

fn all_arguments_are_constants(block: &Block, args: &[usize]) -> Result<bool> {
    for &arg in args {
        let is_const = block
            .entry(arg)?
            .column
            .as_ref()
            .is_some_and(|c| c.is_constant());
        if !is_const {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The temporary block for the nulls default: nullable arguments are
/// replaced by their inner values (types become non-nullable), and the
/// result slot expects the kernel's non-nullable type.
fn block_with_nested_columns(block: &Block, args: &[usize], result: usize) -> Result<Block> {
    let mut nested = block.clone();
    for &arg in args {
        let entry = nested.entry_mut(arg)?;
        if !entry.data_type.is_nullable() {
            continue;
        }
        let column = entry
            .column
            .as_ref()
            .ok_or_else(|| Error::internal("unpopulated argument column"))?;
        let inner_column = match &**column {
            Column::Nullable { values, .. } => values.clone(),
            Column::Constant { value, len } => match &**value {
                Column::Nullable { values, .. } => Arc::new(Column::Constant {
                    value: values.clone(),
                    len: *len,
                }),
                _ => {
                    return Err(Error::internal(
                        "constant of nullable type does not wrap a nullable column",
                    ));
                }
            },
            _ => {
                return Err(Error::internal(
                    "column of nullable type is not nullable",
                ));
            }
        };
        entry.data_type = entry.data_type.remove_nullable();
        entry.column = Some(inner_column);
    }
    let result_entry = nested.entry_mut(result)?;
    result_entry.data_type = result_entry.data_type.remove_nullable();
    result_entry.column = None;
    Ok(nested)
}

/// Merges the arguments' null maps into a kernel-produced column.
///
/// The first nullable argument's map is reused by reference; merging a
/// second map triggers a private copy which is OR'd in place. An argument
/// that is a constant NULL short-circuits the whole result to a constant
/// NULL of the result type.
pub fn wrap_in_nullable(
    src: &Arc<Column>,
    block: &Block,
    args: &[usize],
    result: usize,
    input_rows_count: usize,
) -> Result<Arc<Column>> {
    if src.only_null() {
        return Ok(src.clone());
    }

    let (src_not_nullable, mut null_map) = match &**src {
        Column::Nullable { values, nulls } => (values.clone(), Some(nulls.clone())),
        _ => (src.clone(), None),
    };

    for &arg in args {
        let entry = block.entry(arg)?;
        if !entry.data_type.is_nullable() {
            continue;
        }
        let column = entry
            .column
            .as_ref()
            .ok_or_else(|| Error::internal("unpopulated argument column"))?;

        if column.only_null() {
            let result_type = &block.entry(result)?.data_type;
            return Ok(Arc::new(Column::constant_null(result_type, input_rows_count)?));
        }
        if column.is_constant() {
            continue;
        }
        if let Column::Nullable { nulls, .. } = &**column {
            match &mut null_map {
                None => null_map = Some(nulls.clone()),
                Some(accumulated) => Arc::make_mut(accumulated).or_with(nulls),
            }
        }
    }

    match null_map {
        None => Ok(make_nullable_column(src)),
        Some(nulls) => {
            let values = convert_to_full_if_const(&src_not_nullable)?;
            Ok(Arc::new(Column::Nullable { values, nulls }))
        }
    }
}

fn make_nullable_column(column: &Arc<Column>) -> Arc<Column> {
    match &**column {
        Column::Nullable { .. } | Column::Nothing { .. } => column.clone(),
        Column::Constant { value, len } => Arc::new(Column::Constant {
            value: make_nullable_column(value),
            len: *len,
        }),
        _ => Arc::new(Column::Nullable {
            values: column.clone(),
            nulls: Arc::new(NullBitmap::new_valid(column.len())),
        }),
    }
}
