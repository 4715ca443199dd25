//! TFIDFComputer: per-page top-N words by `tf * idf`, streamed page by page.

use crate::error::{AnalyzerError, Result};
use crate::global_words::merge_counts;
use crate::model::{PageTfidf, PageWordCounts, TfidfEntry};
use crate::persist::{stream_batches, NdjsonWriter, WorkDir};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

pub const STAGE: &str = "tfidf";
const BATCH: usize = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TfidfReport {
    pub pages: u64,
    pub vocabulary: usize,
}

/// Number of pages each word appears on, plus the page total.
#[derive(Debug, Default, Clone)]
pub struct DocumentFrequencies {
    pub total_pages: u64,
    pub df: HashMap<String, u64>,
}

impl DocumentFrequencies {
    pub fn from_pages<'a, I: IntoIterator<Item = &'a PageWordCounts>>(pages: I) -> Self {
        let mut out = Self::default();
        for page in pages {
            out.add(page);
        }
        out
    }

    pub fn add(&mut self, page: &PageWordCounts) {
        self.total_pages += 1;
        for word in page.words.keys() {
            *self.df.entry(word.clone()).or_insert(0) += 1;
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self { total_pages: self.total_pages + other.total_pages, df: merge_counts(self.df, other.df) }
    }

    pub fn idf(&self, word: &str, smoothed: bool) -> f64 {
        idf(self.total_pages, self.df.get(word).copied().unwrap_or(0), smoothed)
    }
}

/// `ln(N/df)`, or `ln(1 + N/df)` when smoothed. Zero for a word on every page, never negative.
pub fn idf(total_pages: u64, df: u64, smoothed: bool) -> f64 {
    let n = total_pages.max(1) as f64;
    let df = df.clamp(1, total_pages.max(1)) as f64;
    if smoothed { (1.0 + n / df).ln() } else { (n / df).ln() }
}

/// Score every word of a page and keep the best `top_n`, score descending then word ascending.
pub fn rank_page(page: &PageWordCounts, freqs: &DocumentFrequencies, top_n: usize, smoothed: bool) -> PageTfidf {
    let mut words: Vec<TfidfEntry> = page
        .words
        .iter()
        .map(|(word, &tf)| TfidfEntry { word: word.clone(), score: f64::from(tf) * freqs.idf(word, smoothed) })
        .collect();
    words.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.word.cmp(&b.word)));
    words.truncate(top_n);
    PageTfidf { page_id: page.page_id, title: page.title.clone(), words }
}

pub fn document_frequencies(work: &WorkDir) -> Result<DocumentFrequencies> {
    let mut freqs = DocumentFrequencies::default();
    stream_batches::<PageWordCounts, _>(&work.global_pages(), BATCH, |pages| {
        let part = pages
            .par_iter()
            .fold(DocumentFrequencies::default, |mut acc, page| {
                acc.add(page);
                acc
            })
            .reduce(DocumentFrequencies::default, DocumentFrequencies::merge);
        freqs = std::mem::take(&mut freqs).merge(part);
        Ok(())
    })?;
    Ok(freqs)
}

pub fn compute_tfidf(work: &WorkDir, top_n: usize, smoothed: bool) -> Result<TfidfReport> {
    let freqs = document_frequencies(work)?;
    info!(pages = freqs.total_pages, vocabulary = freqs.df.len(), smoothed, "document frequencies ready");

    let out_path = work.pages_tfidf(top_n);
    let mut writer = NdjsonWriter::create(&out_path)?;
    stream_batches::<PageWordCounts, _>(&work.global_pages(), BATCH, |pages| {
        let lines = pages
            .par_iter()
            .map(|page| {
                serde_json::to_vec(&rank_page(page, &freqs, top_n, smoothed))
                    .map_err(|e| AnalyzerError::io(&out_path, e.into()))
            })
            .collect::<Result<Vec<_>>>()?;
        for line in &lines {
            writer.append_raw(line)?;
        }
        Ok(())
    })?;
    let pages = writer.commit()?;
    Ok(TfidfReport { pages, vocabulary: freqs.df.len() })
}
