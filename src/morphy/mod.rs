//! Core morphological dictionary module

pub mod format;
pub mod fsa;
pub mod graminfo;
pub mod gramtab;
pub mod morphier;
pub mod reader;
pub mod storage;
pub mod types;
mod utils;

pub use reader::Morphy;
pub use types::error::{MorphyError, Result};
