
mod bitmap;
mod block;
mod column;
mod strip;

pub use bitmap::NullBitmap;
pub use block::{Block, BlockEntry};
pub use column::{A64, Column, Dictionary, compose_indexes, convert_to_full_if_const};
pub use strip::{remove_dictionary_column, remove_dictionary_type};
