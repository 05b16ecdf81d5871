use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use encoding_rs::Encoding;
use log::{debug, info, warn};

use super::fsa::{self, Fsa};
use super::graminfo::{CachedGramInfo, GramInfo, GramInfoSource};
use super::gramtab::{GramTab, StandardTagBuilder};
use super::morphier::{
    Chain, DictBulk, DictSingle, Morphier, PredictByDatabase, PredictBySuffix, WithGramTab,
};
use super::types::error::Result;
use super::types::models::{FormSet, FormsWithGramInfo, WordGramInfo};
use super::types::options::{FilesBundle, MorphyOptions};
use super::utils;

/// Morphological dictionary: base forms, inflected forms and grammatical
/// information of words.
///
/// Words are given and returned as Rust strings and converted to and from the
/// dictionary codepage internally. A word that cannot be represented in that
/// codepage is reported as unknown.
#[derive(Debug)]
pub struct Morphy {
    single: Arc<dyn Morphier>,
    bulk: Arc<dyn Morphier>,
    common_fsa: Arc<dyn Fsa>,
    graminfo: Arc<dyn GramInfoSource>,
    encoding: &'static Encoding,
}

impl Morphy {
    /// Opens the dictionary described by `bundle`.
    ///
    /// Priority for determining text encoding (highest → lowest):
    /// 1. `options.encoding` (explicit override provided by caller/CLI)
    /// 2. Codepage declared in the graminfo header
    /// 3. UTF-8
    ///
    /// # Errors
    /// Returns an error if:
    /// - A required file cannot be opened
    /// - A file header is invalid or uses an unsupported layout
    /// - The gramtab cannot be deserialized (with `with_gramtab`)
    pub fn open(bundle: &FilesBundle, options: &MorphyOptions) -> Result<Self> {
        let storage = options.storage;

        let common_fsa = fsa::open(storage.open(bundle.common_automat_file())?)?;
        let graminfo: Arc<dyn GramInfoSource> = Arc::new(CachedGramInfo::new(GramInfo::open(
            storage.open(bundle.graminfo_file())?,
        )?));

        let mut predictors = Chain::new();
        if options.predict_by_suffix {
            predictors.add(Arc::new(PredictBySuffix::new(
                Arc::clone(&common_fsa),
                Arc::clone(&graminfo),
                options.min_suffix_length,
            )));
        }
        if options.predict_by_db {
            let predict_fsa = fsa::open(storage.open(bundle.predict_automat_file())?)?;
            predictors.add(Arc::new(PredictByDatabase::new(
                predict_fsa,
                Arc::clone(&graminfo),
                options.min_postfix_match,
                options.collect_limit,
            )));
        }

        let predictor: Option<Arc<dyn Morphier>> = match predictors.morphiers().len() {
            0 => None,
            1 => Some(Arc::clone(&predictors.morphiers()[0])),
            _ => Some(Arc::new(predictors)),
        };

        let dict: Arc<dyn Morphier> =
            Arc::new(DictSingle::new(Arc::clone(&common_fsa), Arc::clone(&graminfo)));
        let mut single = match &predictor {
            Some(predictor) => {
                let mut chain = Chain::new();
                chain.add(dict);
                chain.add(Arc::clone(predictor));
                Arc::new(chain) as Arc<dyn Morphier>
            }
            None => dict,
        };
        let mut bulk: Arc<dyn Morphier> = Arc::new(DictBulk::new(
            Arc::clone(&common_fsa),
            Arc::clone(&graminfo),
            predictor,
        ));

        if options.with_gramtab {
            let builder = StandardTagBuilder::new(options.tag_separator.as_bytes());
            let store = storage.open(bundle.gramtab_file())?;
            let gramtab = Arc::new(GramTab::open(store.as_ref(), Box::new(builder))?);
            single = Arc::new(WithGramTab::new(single, Arc::clone(&gramtab)));
            bulk = Arc::new(WithGramTab::new(bulk, gramtab));
        }

        let encoding = Self::resolve_encoding(options.encoding.as_deref(), graminfo.codepage());

        info!(
            "Morphy ready: language={}, encoding={}, suffix prediction={}, db prediction={}, gramtab={}",
            graminfo.language(),
            encoding.name(),
            options.predict_by_suffix,
            options.predict_by_db,
            options.with_gramtab
        );

        Ok(Self {
            single,
            bulk,
            common_fsa,
            graminfo,
            encoding,
        })
    }

    fn resolve_encoding(user: Option<&str>, codepage: &str) -> &'static Encoding {
        if let Some(label) = user {
            match utils::parse_encoding(label) {
                Some(encoding) => {
                    debug!(
                        "Text encoding overridden: header='{}', final='{}'",
                        codepage,
                        encoding.name()
                    );
                    return encoding;
                }
                None => warn!("Unknown encoding '{}', ignoring override", label),
            }
        }
        utils::parse_encoding(codepage).unwrap_or_else(|| {
            warn!("Unknown dictionary codepage '{}', falling back to UTF-8", codepage);
            encoding_rs::UTF_8
        })
    }

    /// Codepage named in the dictionary header.
    pub fn codepage(&self) -> &str {
        self.graminfo.codepage()
    }

    pub fn language(&self) -> &str {
        self.graminfo.language()
    }

    /// Encoding used to convert words to and from dictionary bytes.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn common_fsa(&self) -> &Arc<dyn Fsa> {
        &self.common_fsa
    }

    pub fn graminfo(&self) -> &Arc<dyn GramInfoSource> {
        &self.graminfo
    }

    /// The pipeline answering single-word queries, working on codepage bytes.
    pub fn single_morphier(&self) -> &Arc<dyn Morphier> {
        &self.single
    }

    /// The pipeline answering batch queries, working on codepage bytes.
    pub fn bulk_morphier(&self) -> &Arc<dyn Morphier> {
        &self.bulk
    }

    pub fn base_form(&self, word: &str) -> Result<Option<Vec<String>>> {
        let Some(raw) = self.encode(word) else {
            return Ok(None);
        };
        Ok(self.single.base_form(&raw)?.map(|forms| self.decode_forms(&forms)))
    }

    pub fn all_forms(&self, word: &str) -> Result<Option<Vec<String>>> {
        let Some(raw) = self.encode(word) else {
            return Ok(None);
        };
        Ok(self.single.all_forms(&raw)?.map(|forms| self.decode_forms(&forms)))
    }

    pub fn all_forms_with_gram_info(&self, word: &str) -> Result<Option<Vec<WordGramInfo>>> {
        let Some(raw) = self.encode(word) else {
            return Ok(None);
        };
        Ok(self
            .single
            .all_forms_with_gram_info(&raw)?
            .map(|items| self.decode_gram_info(&items)))
    }

    pub fn base_form_batch<S: AsRef<str>>(
        &self,
        words: &[S],
    ) -> Result<BTreeMap<String, Option<Vec<String>>>> {
        self.batch(
            words,
            |raw| self.bulk.base_form_batch(raw),
            |forms: &FormSet| self.decode_forms(forms),
        )
    }

    pub fn all_forms_batch<S: AsRef<str>>(
        &self,
        words: &[S],
    ) -> Result<BTreeMap<String, Option<Vec<String>>>> {
        self.batch(
            words,
            |raw| self.bulk.all_forms_batch(raw),
            |forms: &FormSet| self.decode_forms(forms),
        )
    }

    pub fn all_forms_with_gram_info_batch<S: AsRef<str>>(
        &self,
        words: &[S],
    ) -> Result<BTreeMap<String, Option<Vec<WordGramInfo>>>> {
        self.batch(
            words,
            |raw| self.bulk.all_forms_with_gram_info_batch(raw),
            |items: &Vec<FormsWithGramInfo>| self.decode_gram_info(items),
        )
    }

    /// Runs a batch query over the encodable words; the rest are reported as unknown.
    fn batch<S, T, U>(
        &self,
        words: &[S],
        query: impl FnOnce(&[Vec<u8>]) -> Result<BTreeMap<Vec<u8>, Option<T>>>,
        decode: impl Fn(&T) -> U,
    ) -> Result<BTreeMap<String, Option<U>>>
    where
        S: AsRef<str>,
        U: Clone,
    {
        let mut result = BTreeMap::new();
        let mut raw_words = Vec::with_capacity(words.len());
        let mut originals: BTreeMap<Vec<u8>, Vec<&str>> = BTreeMap::new();

        for word in words {
            let word = word.as_ref();
            match self.encode(word) {
                Some(raw) => {
                    let raw = raw.into_owned();
                    originals.entry(raw.clone()).or_default().push(word);
                    raw_words.push(raw);
                }
                None => {
                    result.insert(word.to_string(), None);
                }
            }
        }

        for (raw, found) in query(&raw_words)? {
            let decoded = found.as_ref().map(&decode);
            for original in originals.get(&raw).into_iter().flatten() {
                result.insert(original.to_string(), decoded.clone());
            }
        }
        Ok(result)
    }

    fn encode<'a>(&self, word: &'a str) -> Option<Cow<'a, [u8]>> {
        let (raw, _, had_errors) = self.encoding.encode(word);
        if had_errors {
            debug!("'{}' is not representable in {}", word, self.encoding.name());
            return None;
        }
        Some(raw)
    }

    fn decode(&self, raw: &[u8]) -> String {
        let (text, _) = self.encoding.decode_without_bom_handling(raw);
        text.into_owned()
    }

    fn decode_forms(&self, forms: &FormSet) -> Vec<String> {
        forms.iter().map(|form| self.decode(form)).collect()
    }

    fn decode_gram_info(&self, items: &[FormsWithGramInfo]) -> Vec<WordGramInfo> {
        items
            .iter()
            .map(|item| WordGramInfo {
                common: self.decode(&item.common),
                all: item.all.iter().map(|ancodes| self.decode(ancodes)).collect(),
                forms: self.decode_forms(&item.forms),
            })
            .collect()
    }
}
