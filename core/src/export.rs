//! Readers over the persisted artifacts, for downstream report consumers.

use crate::error::Result;
use crate::global_words::load_global_words;
use crate::model::{BadWordsPage, PageTfidf, RunMeta, TopicGroup};
use crate::persist::{read_json, NdjsonReader, WorkDir};
use crate::topics::top_global_words;
use std::collections::BTreeMap;

/// Top `n` global words. Uses the persisted top-N artifact when one exists for `n`.
pub fn global_words_top_n(work: &WorkDir, n: usize) -> Result<Vec<(String, u64)>> {
    let persisted = work.global_words_top(n);
    if persisted.exists() {
        let map: BTreeMap<String, u64> = read_json(&persisted)?;
        return Ok(top_global_words(&map, n));
    }
    Ok(top_global_words(&load_global_words(work)?, n))
}

pub fn pages_tfidf(work: &WorkDir, top_n: usize) -> Result<NdjsonReader<PageTfidf>> {
    NdjsonReader::open(&work.pages_tfidf(top_n))
}

pub fn topics(work: &WorkDir, top_n: usize) -> Result<NdjsonReader<TopicGroup>> {
    NdjsonReader::open(&work.topics(top_n))
}

pub fn bad_words(work: &WorkDir) -> Result<NdjsonReader<BadWordsPage>> {
    NdjsonReader::open(&work.bad_words_report())
}

pub fn run_meta(work: &WorkDir) -> Result<RunMeta> {
    read_json(&work.run_meta())
}
