use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PageId = u32;

/// Corpus-wide word -> count. Ordered so the persisted object is stable.
pub type GlobalWordCounts = BTreeMap<String, u64>;

/// Stem -> chosen surface form.
pub type StemDictionary = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StemmedRevision {
    #[serde(default)]
    pub text: Vec<String>,
}

/// One page's revision history after external cleaning and stemming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StemmedPage {
    pub page_id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "revision")]
    pub revisions: Vec<StemmedRevision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWordCounts {
    pub page_id: PageId,
    pub title: String,
    pub words: BTreeMap<String, u32>,
}

impl PageWordCounts {
    /// Collapse every revision into one frequency map. Repeats across revisions count again.
    pub fn from_stemmed(page: &StemmedPage) -> Self {
        let mut words: BTreeMap<String, u32> = BTreeMap::new();
        for rev in &page.revisions {
            for token in &rev.text {
                *words.entry(token.clone()).or_insert(0) += 1;
            }
        }
        Self { page_id: page.page_id, title: page.title.clone(), words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfEntry {
    pub word: String,
    pub score: f64,
}

/// Ranked top-N TF-IDF words of one page, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTfidf {
    pub page_id: PageId,
    pub title: String,
    pub words: Vec<TfidfEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    /// Seed word of the group, unique across groups.
    pub topic: String,
    /// Human-readable form of the seed.
    pub label: String,
    pub words: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadWordsPage {
    pub page_id: PageId,
    pub title: String,
    pub words: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub language: String,
    pub pages: u64,
    pub vocabulary: u64,
    pub top_n_words_pages: usize,
    pub top_n_global_words: usize,
    pub top_n_topic_words: usize,
    pub created_at: String,
    pub version: u32,
}
