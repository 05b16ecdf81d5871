use std::sync::Arc;

use super::Morphier;
use crate::morphy::gramtab::GramTab;
use crate::morphy::types::error::Result;
use crate::morphy::types::models::{BatchResult, FormSet, FormsWithGramInfo};

/// Replaces raw ancodes in grammatical results with rendered tags.
///
/// Form queries pass through untouched.
#[derive(Debug, Clone)]
pub struct WithGramTab {
    inner: Arc<dyn Morphier>,
    gramtab: Arc<GramTab>,
}

impl WithGramTab {
    pub fn new(inner: Arc<dyn Morphier>, gramtab: Arc<GramTab>) -> Self {
        Self { inner, gramtab }
    }

    pub fn inner(&self) -> &Arc<dyn Morphier> {
        &self.inner
    }

    fn resolve_items(&self, items: &mut [FormsWithGramInfo]) -> Result<()> {
        for item in items {
            item.common = self.gramtab.resolve(&item.common)?;
            for ancodes in &mut item.all {
                *ancodes = self.gramtab.resolve(ancodes)?;
            }
        }
        Ok(())
    }
}

impl Morphier for WithGramTab {
    fn base_form(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.inner.base_form(word)
    }

    fn all_forms(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.inner.all_forms(word)
    }

    fn all_forms_with_gram_info(&self, word: &[u8]) -> Result<Option<Vec<FormsWithGramInfo>>> {
        let mut result = self.inner.all_forms_with_gram_info(word)?;
        if let Some(items) = result.as_mut() {
            self.resolve_items(items)?;
        }
        Ok(result)
    }

    fn base_form_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.inner.base_form_batch(words)
    }

    fn all_forms_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.inner.all_forms_batch(words)
    }

    fn all_forms_with_gram_info_batch(
        &self,
        words: &[Vec<u8>],
    ) -> Result<BatchResult<Vec<FormsWithGramInfo>>> {
        let mut result = self.inner.all_forms_with_gram_info_batch(words)?;
        for items in result.values_mut().flatten() {
            self.resolve_items(items)?;
        }
        Ok(result)
    }
}
