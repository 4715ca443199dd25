//! PageMapAggregator: folds every `W<id>.json` record into `GlobalPages.jsonl` plus a
//! bincode offset index, then removes the per-page files.

use crate::error::{AnalyzerError, Result};
use crate::model::{PageId, PageWordCounts};
use crate::persist::{read_json, remove_file, save_page_index, NdjsonWriter, PageIndex, WorkDir, PAGE_INDEX_VERSION};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

pub const STAGE: &str = "page_map";
const BATCH: usize = 512;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageMapReport {
    pub pages: usize,
}

pub fn consolidate_pages(work: &WorkDir) -> Result<PageMapReport> {
    let files = work.page_word_files()?;
    info!(pages = files.len(), "consolidating page maps");

    let mut writer = NdjsonWriter::create(&work.global_pages())?;
    let mut index = PageIndex { version: PAGE_INDEX_VERSION, offsets: HashMap::with_capacity(files.len()) };
    let mut origin: HashMap<PageId, PathBuf> = HashMap::with_capacity(files.len());

    for chunk in files.chunks(BATCH) {
        let pages = chunk
            .par_iter()
            .map(|(_, path)| read_json::<PageWordCounts>(path))
            .collect::<Result<Vec<_>>>()?;
        for ((_, path), page) in chunk.iter().zip(pages) {
            if let Some(first) = origin.get(&page.page_id) {
                return Err(AnalyzerError::DuplicateKey {
                    page_id: page.page_id,
                    first: first.clone(),
                    second: path.clone(),
                });
            }
            let offset = writer.append(&page)?;
            index.offsets.insert(page.page_id, offset);
            origin.insert(page.page_id, path.clone());
        }
    }

    let pages = writer.commit()? as usize;
    save_page_index(&work.global_pages_index(), &index)?;
    for (_, path) in &files {
        remove_file(path)?;
    }
    Ok(PageMapReport { pages })
}
