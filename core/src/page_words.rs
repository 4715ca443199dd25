//! PageWordMapper: collapses each stemmed revision history into one word map per page.
//!
//! Every `WS<id>.json` input becomes a `W<id>.json` record named after the input file,
//! so parallel workers always write disjoint files. Only canonical ids are listed, which
//! keeps that naming one-to-one. Pages without words are dropped.

use crate::config::MalformedPolicy;
use crate::error::{AnalyzerError, Result};
use crate::model::{PageWordCounts, StemmedPage};
use crate::persist::{read_json, remove_file, write_json_atomic, WorkDir};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

pub const STAGE: &str = "page_words";
const PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageWordsReport {
    pub files: usize,
    pub written: usize,
    pub empty: usize,
    pub skipped: Vec<PathBuf>,
}

enum Outcome {
    Written,
    Empty,
}

pub fn map_pages(work: &WorkDir, on_malformed: MalformedPolicy, keep_inputs: bool) -> Result<PageWordsReport> {
    let files = work.stemmed_pages()?;
    let total = files.len();
    info!(files = total, "mapping stemmed pages");

    let done = AtomicUsize::new(0);
    let written = AtomicUsize::new(0);
    let empty = AtomicUsize::new(0);
    let skipped: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    files.par_iter().try_for_each(|(file_id, path)| -> Result<()> {
        match map_one(work, *file_id, path, keep_inputs) {
            Ok(Outcome::Written) => { written.fetch_add(1, Ordering::Relaxed); }
            Ok(Outcome::Empty) => { empty.fetch_add(1, Ordering::Relaxed); }
            Err(err @ AnalyzerError::Decode { .. }) if on_malformed == MalformedPolicy::Skip => {
                warn!(path = %path.display(), error = %err, "skipping malformed page");
                skipped.lock().push(path.clone());
            }
            Err(err) => return Err(err),
        }
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        if n % PROGRESS_EVERY == 0 || n == total {
            info!("processed {n}/{total}");
        }
        Ok(())
    })?;

    let mut skipped = skipped.into_inner();
    skipped.sort();
    Ok(PageWordsReport {
        files: total,
        written: written.into_inner(),
        empty: empty.into_inner(),
        skipped,
    })
}

fn map_one(work: &WorkDir, file_id: u32, path: &Path, keep_inputs: bool) -> Result<Outcome> {
    let page: StemmedPage = read_json(path)?;
    let counts = PageWordCounts::from_stemmed(&page);
    let outcome = if counts.is_empty() {
        debug!(page_id = page.page_id, "page has no words");
        Outcome::Empty
    } else {
        write_json_atomic(&work.page_words(file_id), &counts)?;
        Outcome::Written
    };
    if !keep_inputs {
        remove_file(path)?;
    }
    Ok(outcome)
}
