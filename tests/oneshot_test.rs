//! One-shot fetch tests

mod common;

use serde_json::json;

use common::{load_fixture, post_url, FakeRenderer};
use gallwatch::crawler::fetch_once;

#[tokio::test]
async fn test_fetch_once_success() {
    let url = post_url(101);
    let renderer = FakeRenderer::new().with_page(&url, load_fixture("post_with_comments.html"));
    let probe = renderer.clone();

    let response = fetch_once(renderer, &url).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        json!({
            "url": url,
            "title": "레이드 공략 후기",
            "comments": ["공략 감사합니다", "ㅊㅊ", "공략 감사합니다"],
        })
    );
    assert_eq!(probe.close_count(), 1);
}

#[tokio::test]
async fn test_fetch_once_without_comments() {
    let url = post_url(100);
    let renderer = FakeRenderer::new().with_page(&url, load_fixture("post_no_comments.html"));

    let response = fetch_once(renderer, &url).await;

    assert!(response.is_success());
    assert_eq!(response.body["title"], "hello");
    assert_eq!(response.body["comments"], json!([]));
}

#[tokio::test]
async fn test_fetch_once_navigation_error() {
    let url = post_url(404);
    let renderer = FakeRenderer::new();
    let probe = renderer.clone();

    let response = fetch_once(renderer, &url).await;

    assert_eq!(response.status_code, 500);
    let message = response.body["error"].as_str().unwrap();
    assert!(message.contains("404"), "unexpected error message: {message}");
    assert_eq!(probe.close_count(), 1);
}

#[tokio::test]
async fn test_fetch_once_panic_becomes_error_payload() {
    let url = post_url(7);
    let renderer = FakeRenderer::new()
        .with_page(&url, load_fixture("post_no_comments.html"))
        .panicking_on(&url);
    let probe = renderer.clone();

    let response = fetch_once(renderer, &url).await;

    assert_eq!(response.status_code, 500);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("renderer crashed"));
    assert_eq!(probe.close_count(), 1);
}
