//! Streaming word-aggregation pipeline over stemmed Wikipedia revision histories:
//! per-page word maps, corpus counts, TF-IDF rankings, topic groups and bad-word reports.

pub mod bad_words;
pub mod config;
pub mod error;
pub mod export;
pub mod global_words;
pub mod lexicon;
pub mod model;
pub mod page_map;
pub mod page_words;
pub mod persist;
pub mod pipeline;
pub mod stems;
pub mod tfidf;
pub mod topics;

pub use config::{AnalyzerConfig, MalformedPolicy};
pub use error::{AnalyzerError, Result};
pub use model::*;
pub use persist::{PageStore, WorkDir};
pub use pipeline::{run, PipelineReport};
