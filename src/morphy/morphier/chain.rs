use std::sync::Arc;

use super::Morphier;
use crate::morphy::types::error::Result;
use crate::morphy::types::models::{BatchResult, FormSet, FormsWithGramInfo};

/// Tries its morphiers in order and returns the first result found.
///
/// For batches, each member only sees the words its predecessors missed.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    morphiers: Vec<Arc<dyn Morphier>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, morphier: Arc<dyn Morphier>) {
        self.morphiers.push(morphier);
    }

    pub fn morphiers(&self) -> &[Arc<dyn Morphier>] {
        &self.morphiers
    }

    pub fn is_empty(&self) -> bool {
        self.morphiers.is_empty()
    }

    fn first<T>(
        &self,
        word: &[u8],
        query: impl Fn(&dyn Morphier, &[u8]) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        for morphier in &self.morphiers {
            if let Some(found) = query(morphier.as_ref(), word)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn first_batch<T>(
        &self,
        words: &[Vec<u8>],
        query: impl Fn(&dyn Morphier, &[Vec<u8>]) -> Result<BatchResult<T>>,
    ) -> Result<BatchResult<T>> {
        let mut result: BatchResult<T> = words.iter().map(|word| (word.clone(), None)).collect();
        let mut pending: Vec<Vec<u8>> = result.keys().cloned().collect();

        for morphier in &self.morphiers {
            if pending.is_empty() {
                break;
            }
            for (word, found) in query(morphier.as_ref(), &pending)? {
                if found.is_some() {
                    result.insert(word, found);
                }
            }
            pending.retain(|word| matches!(result.get(word), Some(None)));
        }
        Ok(result)
    }
}

impl Morphier for Chain {
    fn base_form(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.first(word, |morphier, word| morphier.base_form(word))
    }

    fn all_forms(&self, word: &[u8]) -> Result<Option<FormSet>> {
        self.first(word, |morphier, word| morphier.all_forms(word))
    }

    fn all_forms_with_gram_info(&self, word: &[u8]) -> Result<Option<Vec<FormsWithGramInfo>>> {
        self.first(word, |morphier, word| morphier.all_forms_with_gram_info(word))
    }

    fn base_form_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.first_batch(words, |morphier, words| morphier.base_form_batch(words))
    }

    fn all_forms_batch(&self, words: &[Vec<u8>]) -> Result<BatchResult<FormSet>> {
        self.first_batch(words, |morphier, words| morphier.all_forms_batch(words))
    }

    fn all_forms_with_gram_info_batch(
        &self,
        words: &[Vec<u8>],
    ) -> Result<BatchResult<Vec<FormsWithGramInfo>>> {
        self.first_batch(words, |morphier, words| {
            morphier.all_forms_with_gram_info_batch(words)
        })
    }
}
