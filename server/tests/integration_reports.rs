use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;
use wikiconflict_core::{run, AnalyzerConfig};

fn build_tiny_run(root: &std::path::Path) -> String {
    let work = root.join("work");
    let lexicons = root.join("lexicons");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&lexicons).unwrap();
    fs::write(lexicons.join("english.txt"), "vandal\n").unwrap();
    fs::write(work.join("WS1.json"), r#"{"pageId":1,"title":"A","revisions":[{"text":["fight","fight","edit"]}]}"#).unwrap();
    fs::write(work.join("WS2.json"), r#"{"pageId":2,"title":"B","revisions":[{"text":["edit","vandal"]}]}"#).unwrap();

    let mut cfg = AnalyzerConfig::new("en", &work);
    cfg.lexicon_directory = lexicons;
    cfg.top_n_topic_words = 2;
    run(&cfg).unwrap();
    work.to_string_lossy().to_string()
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn top_words_are_ranked() {
    let dir = tempdir().unwrap();
    let app = server::build_app(build_tiny_run(dir.path())).unwrap();

    let (status, body) = call(app, "/words/top?n=2").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let arr = json.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["word"], "edit");
    assert_eq!(arr[0]["count"], 2);
    assert_eq!(arr[1]["word"], "fight");
}

#[tokio::test]
async fn page_lookup_and_missing_page() {
    let dir = tempdir().unwrap();
    let app = server::build_app(build_tiny_run(dir.path())).unwrap();

    let (status, body) = call(app.clone(), "/pages/2").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "B");
    assert_eq!(json["words"]["vandal"], 1);

    let (status, _) = call(app, "/pages/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn topics_are_served() {
    let dir = tempdir().unwrap();
    let app = server::build_app(build_tiny_run(dir.path())).unwrap();

    let (status, body) = call(app, "/topics").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let groups = json.as_array().unwrap();
    assert!(!groups.is_empty());
    assert_eq!(groups[0]["topic"], "edit");
    assert!(groups.iter().all(|g| g["words"].as_object().unwrap().len() <= 2));
}

#[tokio::test]
async fn meta_describes_the_loaded_run() {
    let dir = tempdir().unwrap();
    let app = server::build_app(build_tiny_run(dir.path())).unwrap();

    let (status, body) = call(app, "/meta").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["language"], "en");
    assert_eq!(json["pages"], 2);
    assert_eq!(json["topNTopicWords"], 2);
}

#[test]
fn directory_without_a_run_is_rejected() {
    let dir = tempdir().unwrap();
    let err = server::build_app(dir.path().to_string_lossy().to_string()).unwrap_err();
    assert!(format!("{err:#}").contains("does not hold a finished analyzer run"), "{err:#}");
}
