// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use chapterdash_app::{ChapterPath, ChapterStatus};
use chapterdash_client::Client;
use chapterdash_testkit::{MockResponse, MockService, sample_library};
use std::time::Duration;

#[test]
fn unreachable_service_error_is_actionable() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(200))
        .expect("client should initialize");

    let error = client
        .list_chapters()
        .expect_err("listing should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("http://127.0.0.1:1"));
    assert!(message.contains("[service].base_url"));
}

#[test]
fn new_rejects_empty_and_non_http_urls() {
    assert!(Client::new("  ", Duration::from_secs(1)).is_err());
    assert!(Client::new("file:///tmp/chapters.json", Duration::from_secs(1)).is_err());
}

#[test]
fn base_url_trailing_slashes_are_trimmed() -> Result<()> {
    let client = Client::new("http://localhost:5000///", Duration::from_secs(1))?;
    assert_eq!(client.base_url(), "http://localhost:5000");
    Ok(())
}

#[test]
fn list_chapters_decodes_collection() -> Result<()> {
    let library = sample_library();
    let service = MockService::start(vec![MockResponse::chapters(&library)?])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    let chapters = client.list_chapters()?;
    assert_eq!(chapters, library);

    let requests = service.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/chapters");
    Ok(())
}

#[test]
fn list_chapters_tolerates_loose_fields() -> Result<()> {
    let service = MockService::start(vec![MockResponse::json(
        200,
        r#"[{"path":"/a.cbz","status":"ok","parsed_volume":2,"alt_titles":null,"title":null},
            {"path":"/b.cbz","status":"reprocessing"}]"#,
    )])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    let chapters = client.list_chapters()?;
    assert_eq!(chapters.len(), 2);
    assert_eq!(
        chapters[1].status,
        ChapterStatus::Unknown("reprocessing".to_owned())
    );

    service.finish()?;
    Ok(())
}

#[test]
fn list_chapters_reports_server_errors() -> Result<()> {
    let service = MockService::start(vec![MockResponse::json(
        500,
        r#"{"status":"error","error":"Internal server error","code":500}"#,
    )])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    let error = client
        .list_chapters()
        .expect_err("500 should surface as an error");
    assert_eq!(
        error.to_string(),
        "server error (500): Internal server error"
    );

    service.finish()?;
    Ok(())
}

#[test]
fn list_chapters_reports_malformed_body() -> Result<()> {
    let service = MockService::start(vec![MockResponse::json(200, r#"{"not":"a list"}"#)])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    let error = client
        .list_chapters()
        .expect_err("non-array body should fail");
    assert!(error.to_string().contains("decode chapter list"));

    service.finish()?;
    Ok(())
}

#[test]
fn fix_chapter_posts_chapter_path() -> Result<()> {
    let service = MockService::start(vec![MockResponse::ok()])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    client.fix_chapter(&ChapterPath::from("/library/Frieren/c007.cbz"))?;

    let requests = service.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/fix");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body)?;
    assert_eq!(
        body,
        serde_json::json!({ "chapter_path": "/library/Frieren/c007.cbz" })
    );
    Ok(())
}

#[test]
fn fix_chapter_failure_names_the_chapter() -> Result<()> {
    let service = MockService::start(vec![MockResponse::json(
        404,
        r#"{"status":"error","error":"Endpoint not found","code":404}"#,
    )])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    let error = client
        .fix_chapter(&ChapterPath::from("b"))
        .expect_err("404 should fail");
    let message = format!("{error:#}");
    assert!(message.contains("fix b"));
    assert!(message.contains("Endpoint not found"));

    service.finish()?;
    Ok(())
}

#[test]
fn fix_all_posts_without_body() -> Result<()> {
    let service = MockService::start(vec![MockResponse::ok()])?;

    let client = Client::new(service.base_url(), Duration::from_secs(2))?;
    client.fix_all()?;

    let requests = service.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/fixall");
    assert!(requests[0].body.is_empty());
    Ok(())
}

#[test]
fn slow_service_times_out() -> Result<()> {
    let service = MockService::start(vec![
        MockResponse::ok().with_delay(Duration::from_millis(600)),
    ])?;

    let client = Client::new(service.base_url(), Duration::from_millis(100))?;
    let error = client.fix_all().expect_err("slow response should time out");
    assert!(error.to_string().contains("timed out"));

    service.finish()?;
    Ok(())
}
