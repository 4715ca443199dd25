use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use wikiconflict_core::export;
use wikiconflict_core::persist::NdjsonReader;
use wikiconflict_core::{run, AnalyzerConfig, AnalyzerError, PageStore, PageTfidf, WorkDir};

fn write_stemmed(dir: &Path, id: u32, title: &str, revisions: &[&[&str]]) {
    let revs: Vec<serde_json::Value> = revisions.iter().map(|t| serde_json::json!({ "text": t })).collect();
    let body = serde_json::json!({ "pageId": id, "title": title, "revisions": revs });
    fs::write(dir.join(format!("WS{id}.json")), body.to_string()).unwrap();
}

fn setup(lexicon: &str) -> (TempDir, AnalyzerConfig) {
    let root = tempdir().unwrap();
    let work = root.path().join("work");
    let lexicons = root.path().join("lexicons");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&lexicons).unwrap();
    fs::write(lexicons.join("english.txt"), lexicon).unwrap();

    let mut cfg = AnalyzerConfig::new("en", &work);
    cfg.lexicon_directory = lexicons;
    cfg.top_n_words_pages = 2;
    cfg.top_n_global_words = 10;
    cfg.top_n_topic_words = 3;
    (root, cfg)
}

#[test]
fn two_page_corpus_end_to_end() {
    let (_root, cfg) = setup("fight\n");
    let dir = cfg.working_directory.clone();
    write_stemmed(&dir, 1, "A", &[&["fight", "fight", "edit"]]);
    write_stemmed(&dir, 2, "B", &[&["edit"]]);
    write_stemmed(&dir, 3, "Empty", &[&[]]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.page_words.written, 2);
    assert_eq!(report.page_words.empty, 1);
    assert_eq!(report.page_map.pages, 2);

    let work = WorkDir::new(&dir);
    assert!(work.stemmed_pages().unwrap().is_empty());

    let store = PageStore::open(&work).unwrap();
    let a = store.get(1).unwrap().unwrap();
    assert_eq!(a.words["fight"], 2);
    assert_eq!(a.words["edit"], 1);
    assert!(store.get(3).unwrap().is_none());

    let top = export::global_words_top_n(&work, 10).unwrap();
    assert_eq!(top, vec![("edit".to_string(), 2), ("fight".to_string(), 2)]);

    let pages: Vec<PageTfidf> = export::pages_tfidf(&work, 2).unwrap().map(|p| p.unwrap()).collect();
    assert_eq!(pages.len(), 2);
    let words: Vec<&str> = pages[0].words.iter().map(|e| e.word.as_str()).collect();
    assert_eq!(words, vec!["fight", "edit"]);
    assert!(pages[0].words[0].score > pages[0].words[1].score);

    let flagged: Vec<_> = export::bad_words(&work).unwrap().map(|p| p.unwrap()).collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].page_id, 1);
    assert_eq!(flagged[0].words["fight"], 2);

    let topics: Vec<_> = export::topics(&work, 3).unwrap().map(|t| t.unwrap()).collect();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic, "edit");
    assert_eq!(topics[0].words.len(), 2);

    let meta = export::run_meta(&work).unwrap();
    assert_eq!(meta.pages, 2);
    assert_eq!(meta.vocabulary, 2);
}

#[test]
fn tfidf_output_is_byte_identical_across_runs() {
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let (_root, mut cfg) = setup("");
        cfg.top_n_words_pages = 3;
        let dir = cfg.working_directory.clone();
        for id in 0..40u32 {
            let a = format!("w{}", id % 7);
            let b = format!("w{}", id % 3);
            let c = format!("w{}", id % 11);
            write_stemmed(&dir, id, "p", &[&[a.as_str(), b.as_str()], &[c.as_str(), "common"]]);
        }
        run(&cfg).unwrap();
        let path = WorkDir::new(&dir).pages_tfidf(3);
        outputs.push(fs::read(path).unwrap());

        for page in NdjsonReader::<PageTfidf>::open(&WorkDir::new(&dir).pages_tfidf(3)).unwrap() {
            let page = page.unwrap();
            assert!(page.words.len() <= 3);
            for pair in page.words.windows(2) {
                assert!(
                    pair[0].score > pair[1].score
                        || (pair[0].score == pair[1].score && pair[0].word < pair[1].word)
                );
            }
            for entry in &page.words {
                assert!(entry.score.is_finite() && entry.score >= 0.0);
            }
        }
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn configuration_errors_stop_before_any_stage() {
    let (_root, mut cfg) = setup("x\n");
    let dir = cfg.working_directory.clone();
    write_stemmed(&dir, 1, "A", &[&["a"]]);

    cfg.top_n_global_words = 0;
    assert!(run(&cfg).unwrap_err().is_config());

    cfg.top_n_global_words = 5;
    cfg.language = "kk".into();
    let err = run(&cfg).unwrap_err();
    assert!(err.is_config(), "missing kazakh lexicon: {err}");

    assert!(dir.join("WS1.json").exists());
    assert!(!dir.join("W1.json").exists());
}

#[test]
fn malformed_input_aborts_with_stage_context() {
    let (_root, cfg) = setup("");
    let dir = cfg.working_directory.clone();
    fs::write(dir.join("WS9.json"), "[1, 2").unwrap();

    let err = run(&cfg).unwrap_err();
    assert!(err.is_decode());
    let msg = err.to_string();
    assert!(msg.contains("page_words"), "{msg}");
    assert!(!WorkDir::new(&dir).global_words().exists());
}

#[test]
fn run_meta_failure_names_its_stage() {
    let (_root, cfg) = setup("x\n");
    let dir = cfg.working_directory.clone();
    write_stemmed(&dir, 1, "A", &[&["a", "b"]]);
    let blocker = WorkDir::new(&dir).run_meta();
    fs::create_dir_all(blocker.join("occupied")).unwrap();

    let err = run(&cfg).unwrap_err();
    match &err {
        AnalyzerError::Stage { stage, .. } => assert_eq!(*stage, "run_meta"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(WorkDir::new(&dir).bad_words_report().exists());
}
