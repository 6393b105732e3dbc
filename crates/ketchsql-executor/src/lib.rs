#![allow(clippy::too_many_arguments)]

mod dispatch;
mod function;
mod result_cache;
pub mod scalar_functions;

pub use dispatch::{FunctionExecutor, wrap_in_nullable};
pub use function::ScalarFunction;
pub use result_cache::{CachedValues, DictionaryKey, DictionaryResultCache};
