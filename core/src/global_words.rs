//! GlobalWordAggregator: one corpus-wide word count, memory bound by vocabulary size.

use crate::error::Result;
use crate::model::{GlobalWordCounts, PageWordCounts};
use crate::persist::{read_json, write_json_atomic, WorkDir};
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::info;

pub const STAGE: &str = "global_words";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GlobalWordsReport {
    pub pages: usize,
    pub vocabulary: usize,
    pub tokens: u64,
}

/// Add one page's counts into an accumulator.
pub fn accumulate(acc: &mut HashMap<String, u64>, page: &PageWordCounts) {
    for (word, count) in &page.words {
        *acc.entry(word.clone()).or_insert(0) += u64::from(*count);
    }
}

/// Commutative, associative merge; always drains the smaller map into the larger one.
pub fn merge_counts<K: Eq + Hash>(a: HashMap<K, u64>, b: HashMap<K, u64>) -> HashMap<K, u64> {
    let (mut big, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (k, v) in small {
        *big.entry(k).or_insert(0) += v;
    }
    big
}

pub fn aggregate_global_words(work: &WorkDir) -> Result<GlobalWordsReport> {
    let files = work.page_word_files()?;
    info!(pages = files.len(), "aggregating global word counts");

    let counts = files
        .par_iter()
        .try_fold(HashMap::new, |mut acc, (_, path)| -> Result<HashMap<String, u64>> {
            let page: PageWordCounts = read_json(path)?;
            accumulate(&mut acc, &page);
            Ok(acc)
        })
        .try_reduce(HashMap::new, |a, b| Ok(merge_counts(a, b)))?;

    let global: GlobalWordCounts = counts.into_iter().collect();
    let report = GlobalWordsReport {
        pages: files.len(),
        vocabulary: global.len(),
        tokens: global.values().sum(),
    };
    write_json_atomic(&work.global_words(), &global)?;
    Ok(report)
}

pub fn load_global_words(work: &WorkDir) -> Result<GlobalWordCounts> {
    read_json(&work.global_words())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn page(id: u32, words: &[(&str, u32)]) -> PageWordCounts {
        PageWordCounts {
            page_id: id,
            title: String::new(),
            words: words.iter().map(|(w, c)| (w.to_string(), *c)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = HashMap::new();
        accumulate(&mut a, &page(1, &[("x", 2), ("y", 1)]));
        let mut b = HashMap::new();
        accumulate(&mut b, &page(2, &[("y", 4)]));
        assert_eq!(merge_counts(a.clone(), b.clone()), merge_counts(b, a));
    }

    #[test]
    fn global_count_is_sum_over_pages() {
        let dir = tempdir().unwrap();
        let work = WorkDir::new(dir.path());
        write_json_atomic(&work.page_words(1), &page(1, &[("fight", 2), ("edit", 1)])).unwrap();
        write_json_atomic(&work.page_words(2), &page(2, &[("edit", 1)])).unwrap();

        let report = aggregate_global_words(&work).unwrap();
        assert_eq!(report, GlobalWordsReport { pages: 2, vocabulary: 2, tokens: 4 });
        let global = load_global_words(&work).unwrap();
        assert_eq!(global["fight"], 2);
        assert_eq!(global["edit"], 2);
    }
}
