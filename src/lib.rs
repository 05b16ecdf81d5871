//! # morphy-reader
//!
//! A reader for precompiled morphological dictionaries: a word automaton with
//! packed annotations, a table of inflection endings and a grammar tag table.
//! Answers base-form, all-forms and grammatical-information queries for single
//! words and batches, with optional prediction for unknown words.
pub mod morphy;

// Re-export the main types for convenience
pub use morphy::{
    Morphy,
    MorphyError,
    morphier::Morphier,
    storage::{ByteStore, StorageKind},
    types::{
        models::{FormSet, FormsWithGramInfo, WordGramInfo},
        options::{FilesBundle, MorphyOptions},
    },
};
