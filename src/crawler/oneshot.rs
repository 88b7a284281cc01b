//! Single-post fetch returning a structured status payload
//!
//! Loads one post, reads its title and comments, and reports the outcome as
//! a `{status_code, body}` pair. Errors and panics become a 500 payload;
//! nothing propagates to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::any::Any;

use crate::config::Config;
use crate::crawler::post::PostExtractor;
use crate::error::Result;
use crate::render::{catching, CancelToken, PageRenderer, RenderSession};

/// Outcome of a one-shot fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status_code: u16,
    pub body: Value,
}

impl FetchResponse {
    fn ok(url: &str, title: String, comments: Vec<String>) -> Self {
        Self {
            status_code: 200,
            body: json!({
                "url": url,
                "title": title,
                "comments": comments,
            }),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Fetch one post with the default selectors
pub async fn fetch_once<R: PageRenderer>(renderer: R, url: &str) -> FetchResponse {
    let config = Config::default();
    match PostExtractor::new(&config.selectors, config.navigation_timeout()) {
        Ok(extractor) => fetch_once_with(renderer, &extractor, url, &CancelToken::never()).await,
        Err(e) => FetchResponse::error(e.to_string()),
    }
}

/// Fetch one post, closing the renderer before returning
pub async fn fetch_once_with<R: PageRenderer>(
    renderer: R,
    extractor: &PostExtractor,
    url: &str,
    cancel: &CancelToken,
) -> FetchResponse {
    let mut session = RenderSession::open(renderer);
    let outcome = catching(fetch_post(session.renderer_mut(), extractor, url, cancel)).await;
    session.close().await;

    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::warn!(url = %url, error = %e, "One-shot fetch failed");
            FetchResponse::error(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(url = %url, panic = %message, "One-shot fetch panicked");
            FetchResponse::error(message)
        }
    }
}

async fn fetch_post<R: PageRenderer>(
    renderer: &mut R,
    extractor: &PostExtractor,
    url: &str,
    cancel: &CancelToken,
) -> Result<FetchResponse> {
    let detail = extractor.extract(renderer, cancel, url).await?;
    tracing::info!(url = %url, comments = detail.comments.len(), "Post fetched");
    Ok(FetchResponse::ok(url, detail.title, detail.comments))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("panic during fetch")
    }
}
