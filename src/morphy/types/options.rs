//! Configuration accepted by the [`Morphy`](crate::Morphy) facade.

use std::path::{Path, PathBuf};

use crate::morphy::storage::StorageKind;

/// Locates the four files making up one compiled dictionary.
///
/// Files are named `<kind>.<lang>.bin` inside `dir`, with `lang` lower-cased.
#[derive(Debug, Clone)]
pub struct FilesBundle {
    dir: PathBuf,
    lang: String,
}

impl FilesBundle {
    pub fn new(dir: impl AsRef<Path>, lang: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            lang: lang.into(),
        }
    }

    pub fn common_automat_file(&self) -> PathBuf {
        self.file_name("common_aut")
    }

    pub fn predict_automat_file(&self) -> PathBuf {
        self.file_name("predict_aut")
    }

    pub fn graminfo_file(&self) -> PathBuf {
        self.file_name("morph_data")
    }

    pub fn gramtab_file(&self) -> PathBuf {
        self.file_name("gramtab")
    }

    fn file_name(&self, kind: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}.bin", kind, self.lang.to_lowercase()))
    }
}

/// Options controlling how the facade assembles its pipelines.
#[derive(Debug, Clone)]
pub struct MorphyOptions {
    /// Where dictionary bytes are served from.
    pub storage: StorageKind,
    /// Render ancodes as human-readable tags.
    pub with_gramtab: bool,
    /// Fall back to suffix prediction for unknown words.
    pub predict_by_suffix: bool,
    /// Fall back to the reversed prediction automaton for unknown words.
    pub predict_by_db: bool,
    /// Explicit text encoding label, overriding the codepage in the dictionary header.
    pub encoding: Option<String>,
    pub min_suffix_length: usize,
    pub min_postfix_match: usize,
    pub collect_limit: usize,
    /// Separator placed between rendered tags.
    pub tag_separator: String,
}

impl Default for MorphyOptions {
    fn default() -> Self {
        Self {
            storage: StorageKind::File,
            with_gramtab: false,
            predict_by_suffix: false,
            predict_by_db: false,
            encoding: None,
            min_suffix_length: 4,
            min_postfix_match: 2,
            collect_limit: 32,
            tag_separator: ";".to_string(),
        }
    }
}
