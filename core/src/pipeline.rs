//! Runs the stages strictly in order; each one starts only after the previous
//! stage's artifact has been renamed into place.

use crate::bad_words::{self, BadWordsSummary};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::global_words::{self, GlobalWordsReport};
use crate::lexicon::BadWordLexicon;
use crate::model::RunMeta;
use crate::page_map::{self, PageMapReport};
use crate::page_words::{self, PageWordsReport};
use crate::persist::{write_json_atomic, WorkDir};
use crate::stems::{self, StemReport};
use crate::tfidf::{self, TfidfReport};
use crate::topics::{self, TopicsReport};
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use tracing::info;

pub const RUN_META_VERSION: u32 = 1;
pub const RUN_META_STAGE: &str = "run_meta";

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub page_words: PageWordsReport,
    pub global_words: GlobalWordsReport,
    pub stems: StemReport,
    pub page_map: PageMapReport,
    pub tfidf: TfidfReport,
    pub topics: TopicsReport,
    pub bad_words: BadWordsSummary,
}

fn stage<T, F>(name: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    info!(stage = name, "stage start");
    let start = Instant::now();
    let out = f().map_err(|e| e.in_stage(name))?;
    info!(stage = name, elapsed_s = start.elapsed().as_secs_f64(), "stage end");
    Ok(out)
}

pub fn run(config: &AnalyzerConfig) -> Result<PipelineReport> {
    config.validate()?;
    // lexicon problems are configuration errors and must surface before any stage touches the corpus
    let lexicon = BadWordLexicon::load(&config.lexicon_directory, config.language_name()?)?;
    let work = WorkDir::new(&config.working_directory);
    info!(language = %config.language, dir = %work.root.display(), "pipeline start");

    let page_words = stage(page_words::STAGE, || {
        page_words::map_pages(&work, config.on_malformed, config.keep_inputs)
    })?;
    let global_words = stage(global_words::STAGE, || global_words::aggregate_global_words(&work))?;
    let stems = stage(stems::STAGE, || stems::aggregate_stems(&work, config.keep_inputs))?;
    let page_map = stage(page_map::STAGE, || page_map::consolidate_pages(&work))?;
    let tfidf = stage(tfidf::STAGE, || {
        tfidf::compute_tfidf(&work, config.top_n_words_pages, config.smoothed_idf)
    })?;
    let topics = stage(topics::STAGE, || {
        topics::extract_topics(&work, config.top_n_global_words, config.top_n_topic_words)
    })?;
    let bad_words = stage(bad_words::STAGE, || bad_words::report_bad_words(&work, &lexicon))?;

    let meta = RunMeta {
        language: config.language.clone(),
        pages: page_map.pages as u64,
        vocabulary: global_words.vocabulary as u64,
        top_n_words_pages: config.top_n_words_pages,
        top_n_global_words: config.top_n_global_words,
        top_n_topic_words: config.top_n_topic_words,
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
        version: RUN_META_VERSION,
    };
    stage(RUN_META_STAGE, || write_json_atomic(&work.run_meta(), &meta))?;
    info!(pages = meta.pages, vocabulary = meta.vocabulary, "pipeline complete");

    Ok(PipelineReport { page_words, global_words, stems, page_map, tfidf, topics, bad_words })
}
