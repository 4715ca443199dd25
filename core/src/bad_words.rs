//! BadWordsReporter: per-page counts restricted to lexicon matches.

use crate::error::Result;
use crate::lexicon::BadWordLexicon;
use crate::model::{BadWordsPage, PageWordCounts};
use crate::persist::{stream_batches, NdjsonWriter, WorkDir};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

pub const STAGE: &str = "bad_words";
const BATCH: usize = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BadWordsSummary {
    pub pages_scanned: u64,
    pub pages_flagged: u64,
    pub occurrences: u64,
}

/// `None` when the page has no lexicon match, so empty entries never reach the report.
pub fn bad_words_for_page(page: &PageWordCounts, lexicon: &BadWordLexicon) -> Option<BadWordsPage> {
    let words: BTreeMap<String, u32> = page
        .words
        .iter()
        .filter(|(word, count)| **count > 0 && lexicon.contains(word))
        .map(|(word, count)| (word.clone(), *count))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(BadWordsPage { page_id: page.page_id, title: page.title.clone(), words })
}

pub fn report_bad_words(work: &WorkDir, lexicon: &BadWordLexicon) -> Result<BadWordsSummary> {
    info!(terms = lexicon.len(), "scanning pages for lexicon matches");
    let mut summary = BadWordsSummary::default();
    let mut writer = NdjsonWriter::create(&work.bad_words_report())?;
    stream_batches::<PageWordCounts, _>(&work.global_pages(), BATCH, |pages| {
        summary.pages_scanned += pages.len() as u64;
        let flagged: Vec<BadWordsPage> = pages
            .par_iter()
            .filter_map(|page| bad_words_for_page(page, lexicon))
            .collect();
        for entry in &flagged {
            summary.pages_flagged += 1;
            summary.occurrences += entry.words.values().map(|&c| u64::from(c)).sum::<u64>();
            writer.append(entry)?;
        }
        Ok(())
    })?;
    writer.commit()?;
    Ok(summary)
}
