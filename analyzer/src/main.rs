use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use wikiconflict_core::{export, AnalyzerConfig, MalformedPolicy, WorkDir};

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(about = "Aggregate stemmed Wikipedia revision histories into conflict word statistics", long_about = None)]
struct Cli {
    /// Log stage progress at info level when RUST_LOG is not set
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage over a working directory of WS<pageId>.json files
    Run {
        /// JSON configuration file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Working directory holding the stemmed pages
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Wiki language code (en, it, de, ...)
        #[arg(long)]
        lang: Option<String>,
        /// Directory holding <language>.txt bad-word lexicons
        #[arg(long)]
        lexicons: Option<PathBuf>,
        #[arg(long)]
        top_pages: Option<usize>,
        #[arg(long)]
        top_global: Option<usize>,
        #[arg(long)]
        top_topic: Option<usize>,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Keep consumed WS*.json inputs so the run can be repeated
        #[arg(long, default_value_t = false)]
        keep_inputs: bool,
        /// Skip malformed page files instead of aborting
        #[arg(long, default_value_t = false)]
        skip_malformed: bool,
    },
    /// Print a persisted artifact as JSON lines
    Export {
        #[arg(long)]
        dir: PathBuf,
        #[arg(value_enum)]
        artifact: Artifact,
        /// The N the artifact was produced with
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Artifact {
    Words,
    Tfidf,
    Topics,
    Badwords,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("info"),
        Err(_) => EnvFilter::new("warn"),
    };
    fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run { config, dir, lang, lexicons, top_pages, top_global, top_topic, smoothed_idf, keep_inputs, skip_malformed } => {
            let mut cfg = match config {
                Some(path) => AnalyzerConfig::from_json_file(&path)?,
                None => {
                    let dir = dir.clone().context("--dir is required without --config")?;
                    let lang = lang.clone().context("--lang is required without --config")?;
                    AnalyzerConfig::new(&lang, dir)
                }
            };
            if let Some(dir) = dir { cfg.working_directory = dir; }
            if let Some(lang) = lang { cfg.language = lang; }
            if let Some(lexicons) = lexicons { cfg.lexicon_directory = lexicons; }
            if let Some(n) = top_pages { cfg.top_n_words_pages = n; }
            if let Some(n) = top_global { cfg.top_n_global_words = n; }
            if let Some(n) = top_topic { cfg.top_n_topic_words = n; }
            cfg.smoothed_idf |= smoothed_idf;
            cfg.keep_inputs |= keep_inputs;
            if skip_malformed { cfg.on_malformed = MalformedPolicy::Skip; }

            let report = match wikiconflict_core::run(&cfg) {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "pipeline failed");
                    return Err(e.into());
                }
            };
            for path in &report.page_words.skipped {
                tracing::warn!(path = %path.display(), "skipped malformed page");
            }
            println!(
                "pages={} vocabulary={} topics={} flagged_pages={}",
                report.page_map.pages, report.global_words.vocabulary, report.topics.groups, report.bad_words.pages_flagged
            );
            Ok(())
        }
        Commands::Export { dir, artifact, top } => export_artifact(&WorkDir::new(dir), artifact, top),
    }
}

fn export_artifact(work: &WorkDir, artifact: Artifact, top: usize) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match artifact {
        Artifact::Words => {
            for (word, count) in export::global_words_top_n(work, top)? {
                writeln!(out, "{}", serde_json::json!({ "word": word, "count": count }))?;
            }
        }
        Artifact::Tfidf => {
            for page in export::pages_tfidf(work, top)? {
                writeln!(out, "{}", serde_json::to_string(&page?)?)?;
            }
        }
        Artifact::Topics => {
            for topic in export::topics(work, top)? {
                writeln!(out, "{}", serde_json::to_string(&topic?)?)?;
            }
        }
        Artifact::Badwords => {
            for page in export::bad_words(work)? {
                writeln!(out, "{}", serde_json::to_string(&page?)?)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
