//! TopicWordsExtractor.
//!
//! Grouping rule: the global top-N words are ranked by count (ties by word). The
//! highest-ranked unassigned word seeds a group and pulls in up to `group_size - 1`
//! unassigned words with the highest page co-occurrence Jaccard against the seed,
//! ties by rank. Words that never share a page with the seed stay out. Each word
//! lands in at most one group.

use crate::error::Result;
use crate::global_words::{load_global_words, merge_counts};
use crate::model::{GlobalWordCounts, PageWordCounts, TopicGroup};
use crate::persist::{stream_batches, write_json_atomic, NdjsonWriter, WorkDir};
use crate::stems::{destem, load_stem_dictionary};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub const STAGE: &str = "topics";
const BATCH: usize = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TopicsReport {
    pub words: usize,
    pub groups: usize,
}

/// Top `n` words by count descending, word ascending on ties.
pub fn top_global_words(global: &GlobalWordCounts, n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = global.iter().map(|(w, c)| (w.clone(), *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Page-level co-occurrence among a fixed set of ranked words.
#[derive(Debug, Default, Clone)]
pub struct CoOccurrence {
    pub df: HashMap<usize, u64>,
    pub pairs: HashMap<(usize, usize), u64>,
}

impl CoOccurrence {
    fn add(&mut self, present: &[usize]) {
        for (i, &a) in present.iter().enumerate() {
            *self.df.entry(a).or_insert(0) += 1;
            for &b in &present[i + 1..] {
                *self.pairs.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    fn merge(self, other: Self) -> Self {
        Self { df: merge_counts(self.df, other.df), pairs: merge_counts(self.pairs, other.pairs) }
    }

    pub fn together(&self, a: usize, b: usize) -> u64 {
        let key = if a < b { (a, b) } else { (b, a) };
        self.pairs.get(&key).copied().unwrap_or(0)
    }

    pub fn jaccard(&self, a: usize, b: usize) -> f64 {
        let both = self.together(a, b);
        if both == 0 {
            return 0.0;
        }
        let df_a = self.df.get(&a).copied().unwrap_or(0);
        let df_b = self.df.get(&b).copied().unwrap_or(0);
        both as f64 / (df_a + df_b - both) as f64
    }
}

/// Ranks of the tracked words present on one page, ascending.
fn present_ranks(page: &PageWordCounts, rank: &HashMap<&str, usize>) -> Vec<usize> {
    let mut present: Vec<usize> = page
        .words
        .iter()
        .filter(|(_, count)| **count > 0)
        .filter_map(|(w, _)| rank.get(w.as_str()).copied())
        .collect();
    present.sort_unstable();
    present
}

pub fn co_occurrence(work: &WorkDir, words: &[(String, u64)]) -> Result<CoOccurrence> {
    let rank: HashMap<&str, usize> = words.iter().enumerate().map(|(i, (w, _))| (w.as_str(), i)).collect();
    let mut total = CoOccurrence::default();
    stream_batches::<PageWordCounts, _>(&work.global_pages(), BATCH, |pages| {
        let part = pages
            .par_iter()
            .fold(CoOccurrence::default, |mut acc, page| {
                acc.add(&present_ranks(page, &rank));
                acc
            })
            .reduce(CoOccurrence::default, CoOccurrence::merge);
        total = std::mem::take(&mut total).merge(part);
        Ok(())
    })?;
    Ok(total)
}

/// Disjoint groups of word ranks, each at most `group_size` long, seeds in rank order.
pub fn group_words(word_count: usize, cooc: &CoOccurrence, group_size: usize) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; word_count];
    let mut groups = Vec::new();
    for seed in 0..word_count {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut candidates: Vec<(usize, f64)> = (0..word_count)
            .filter(|&j| !assigned[j])
            .map(|j| (j, cooc.jaccard(seed, j)))
            .filter(|&(_, score)| score > 0.0)
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let mut group = vec![seed];
        for (j, _) in candidates.into_iter().take(group_size.saturating_sub(1)) {
            assigned[j] = true;
            group.push(j);
        }
        groups.push(group);
    }
    groups
}

pub fn extract_topics(work: &WorkDir, top_n_global: usize, top_n_topic: usize) -> Result<TopicsReport> {
    let global = load_global_words(work)?;
    let top = top_global_words(&global, top_n_global);
    let top_map: BTreeMap<String, u64> = top.iter().cloned().collect();
    write_json_atomic(&work.global_words_top(top_n_global), &top_map)?;

    let cooc = co_occurrence(work, &top)?;
    let groups = group_words(top.len(), &cooc, top_n_topic);
    let stems = load_stem_dictionary(work)?;
    info!(words = top.len(), groups = groups.len(), "topic groups built");

    let out_path = work.topics(top_n_topic);
    let mut writer = NdjsonWriter::create(&out_path)?;
    for group in &groups {
        let seed = &top[group[0]].0;
        let record = TopicGroup {
            topic: seed.clone(),
            label: destem(&stems, seed).to_string(),
            words: group.iter().map(|&i| top[i].clone()).collect(),
        };
        writer.append(&record)?;
    }
    writer.commit()?;
    Ok(TopicsReport { words: top.len(), groups: groups.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_words_rank_by_count_then_word() {
        let global: GlobalWordCounts =
            [("b", 5u64), ("a", 5), ("c", 9), ("d", 1)].iter().map(|(w, c)| (w.to_string(), *c)).collect();
        let top = top_global_words(&global, 3);
        let words: Vec<&str> = top.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["c", "a", "b"]);
    }

    #[test]
    fn groups_are_disjoint_and_bounded() {
        let mut cooc = CoOccurrence::default();
        cooc.add(&[0, 1, 2]);
        cooc.add(&[0, 1]);
        cooc.add(&[3, 4]);
        cooc.add(&[2]);
        let groups = group_words(6, &cooc, 2);
        assert_eq!(groups, vec![vec![0, 1], vec![2], vec![3, 4], vec![5]]);

        let mut seen = vec![false; 6];
        for g in &groups {
            assert!(g.len() <= 2);
            for &i in g {
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
    }

    #[test]
    fn jaccard_is_symmetric() {
        let mut cooc = CoOccurrence::default();
        cooc.add(&[0, 1]);
        cooc.add(&[0]);
        assert_eq!(cooc.jaccard(0, 1), cooc.jaccard(1, 0));
        assert!((cooc.jaccard(0, 1) - 0.5).abs() < 1e-12);
        assert_eq!(cooc.jaccard(0, 2), 0.0);
    }
}
