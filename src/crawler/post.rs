//! Post page extraction

use std::time::Duration;

use crate::config::SelectorConfig;
use crate::error::Result;
use crate::models::PostDetail;
use crate::render::{
    navigate_bounded, CancelToken, ExtractionSchema, Extracted, PageRenderer, ValueSource,
    WaitPolicy,
};
use crate::utils::error::ExtractionError;

/// Title placeholder for posts without a subject element
pub const NO_TITLE: &str = "제목 없음";

/// Body placeholder for posts with a missing or empty body
pub const NO_CONTENT: &str = "본문 없음";

const TITLE: &str = "title";
const CONTENT: &str = "content";
const COMMENTS: &str = "comments";

/// Extracts title, body and comments from a post page
#[derive(Debug, Clone)]
pub struct PostExtractor {
    schema: ExtractionSchema,
    timeout: Duration,
}

impl PostExtractor {
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidSelector` for a malformed selector
    pub fn new(
        selectors: &SelectorConfig,
        timeout: Duration,
    ) -> std::result::Result<Self, ExtractionError> {
        let schema = ExtractionSchema::new("post")
            .first(TITLE, &selectors.post_title, ValueSource::Text)?
            .first(CONTENT, &selectors.post_content, ValueSource::Text)?
            .all(COMMENTS, &selectors.comment, ValueSource::Text)?;

        Ok(Self { schema, timeout })
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Load `post_url` and read its detail
    pub async fn extract<R>(
        &self,
        renderer: &mut R,
        cancel: &CancelToken,
        post_url: &str,
    ) -> Result<PostDetail>
    where
        R: PageRenderer + ?Sized,
    {
        navigate_bounded(
            renderer,
            post_url,
            WaitPolicy::DomContentLoaded,
            self.timeout,
            cancel,
        )
        .await?;

        let extracted = renderer.evaluate(&self.schema).await?;
        let detail = detail_from(&extracted);

        tracing::debug!(
            url = %post_url,
            comments = detail.comments.len(),
            "Post extracted"
        );
        Ok(detail)
    }
}

/// Apply placeholders and trimming to an evaluated post schema
pub fn detail_from(extracted: &Extracted) -> PostDetail {
    let title = extracted
        .first(TITLE)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_TITLE)
        .to_string();

    let content = extracted
        .first(CONTENT)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(NO_CONTENT)
        .to_string();

    // Empty comment nodes stay as distinct entries
    let comments = extracted
        .all(COMMENTS)
        .iter()
        .map(|c| c.trim().to_string())
        .collect();

    PostDetail {
        title,
        content,
        comments,
    }
}
