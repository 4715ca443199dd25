//! StemAggregator: merges per-page stem -> surface-form partials into one reverse-stemming dictionary.
//!
//! Collisions are settled by the most frequent surface form across the corpus,
//! ties going to the lexicographically smallest form.

use crate::error::Result;
use crate::global_words::merge_counts;
use crate::model::StemDictionary;
use crate::persist::{read_json, remove_file, write_json_atomic, WorkDir};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub const STAGE: &str = "stems";

/// One stem's entry in a per-page partial dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurfaceForms {
    One(String),
    Many(Vec<String>),
    Counted(BTreeMap<String, u64>),
}

pub type PartialStems = BTreeMap<String, SurfaceForms>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StemReport {
    pub partials: usize,
    pub stems: usize,
    pub collisions: usize,
}

pub type FormCounts = HashMap<(String, String), u64>;

fn add_partial(acc: &mut FormCounts, partial: PartialStems) {
    for (stem, forms) in partial {
        match forms {
            SurfaceForms::One(form) => {
                *acc.entry((stem, form)).or_insert(0) += 1;
            }
            SurfaceForms::Many(list) => {
                for form in list {
                    *acc.entry((stem.clone(), form)).or_insert(0) += 1;
                }
            }
            SurfaceForms::Counted(map) => {
                for (form, n) in map {
                    *acc.entry((stem.clone(), form)).or_insert(0) += n;
                }
            }
        }
    }
}

/// Pick one surface form per stem. Returns the dictionary and how many stems had competing forms.
pub fn resolve(counts: FormCounts) -> (StemDictionary, usize) {
    let mut best: BTreeMap<String, (String, u64)> = BTreeMap::new();
    let mut competing: HashMap<String, usize> = HashMap::new();
    for ((stem, form), n) in counts {
        *competing.entry(stem.clone()).or_insert(0) += 1;
        match best.get_mut(&stem) {
            Some((cur, cur_n)) => {
                if n > *cur_n || (n == *cur_n && form < *cur) {
                    *cur = form;
                    *cur_n = n;
                }
            }
            None => {
                best.insert(stem, (form, n));
            }
        }
    }
    let collisions = competing.values().filter(|&&forms| forms > 1).count();
    (best.into_iter().map(|(stem, (form, _))| (stem, form)).collect(), collisions)
}

pub fn aggregate_stems(work: &WorkDir, keep_inputs: bool) -> Result<StemReport> {
    let partials = work.stem_partials()?;
    info!(partials = partials.len(), "merging stem dictionaries");

    let counts = partials
        .par_iter()
        .try_fold(FormCounts::new, |mut acc, (_, path)| -> Result<FormCounts> {
            let partial: PartialStems = read_json(path)?;
            add_partial(&mut acc, partial);
            Ok(acc)
        })
        .try_reduce(FormCounts::new, |a, b| Ok(merge_counts(a, b)))?;

    let (dict, collisions) = resolve(counts);
    write_json_atomic(&work.global_stem(), &dict)?;
    if !keep_inputs {
        for (_, path) in &partials {
            remove_file(path)?;
        }
    }
    Ok(StemReport { partials: partials.len(), stems: dict.len(), collisions })
}

/// Reads the dictionary if the stage produced one; a corpus without partials has none.
pub fn load_stem_dictionary(work: &WorkDir) -> Result<StemDictionary> {
    let path = work.global_stem();
    if !path.exists() {
        return Ok(StemDictionary::new());
    }
    read_json(&path)
}

pub fn destem<'a>(dict: &'a StemDictionary, word: &'a str) -> &'a str {
    dict.get(word).map(String::as_str).unwrap_or(word)
}
