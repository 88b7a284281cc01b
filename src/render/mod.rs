//! Page rendering capability
//!
//! The crawler talks to pages only through [`PageRenderer`]: navigate to a
//! URL, evaluate an [`ExtractionSchema`] against the loaded document, and
//! install a request filter. [`HttpRenderer`] implements it over plain HTTP;
//! a browser-driven renderer can be dropped in behind the same trait.

pub mod http;
pub mod navigation;
pub mod schema;
pub mod session;
pub mod text;

pub use http::HttpRenderer;
pub use navigation::{navigate_bounded, CancelHandle, CancelToken};
pub use schema::{ExtractionSchema, Extracted, ValueSource};
pub use session::{catching, RenderSession};

use async_trait::async_trait;
use std::collections::HashSet;
use url::Url;

use crate::utils::error::{ExtractionError, NavigationError};

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// The document has been parsed
    #[default]
    DomContentLoaded,
    /// The document and its subresources finished loading
    Load,
    /// No more than two network connections for a short period
    NetworkIdle,
}

/// Kind of resource a request fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Other,
}

impl ResourceType {
    /// Guess the resource type of a request from its URL path extension
    pub fn from_url(url: &Url) -> Self {
        let extension = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            None => Self::Document,
            Some("html" | "htm" | "php" | "asp" | "aspx" | "jsp") => Self::Document,
            Some("css") => Self::Stylesheet,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "bmp" | "avif") => {
                Self::Image
            }
            Some("mp4" | "webm" | "mp3" | "ogg" | "wav" | "m3u8") => Self::Media,
            Some("woff" | "woff2" | "ttf" | "otf" | "eot") => Self::Font,
            Some("js" | "mjs") => Self::Script,
            Some(_) => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
            Self::Media => "media",
            Self::Font => "font",
            Self::Script => "script",
            Self::Other => "other",
        }
    }
}

/// What happens to an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Continue,
    Abort,
}

/// Per-request resource filter installed on a rendering session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    blocked: HashSet<ResourceType>,
}

impl RequestFilter {
    /// Let every request through
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Abort image, stylesheet and font loads
    pub fn skip_heavy_assets() -> Self {
        Self::blocking([ResourceType::Image, ResourceType::Stylesheet, ResourceType::Font])
    }

    pub fn blocking(types: impl IntoIterator<Item = ResourceType>) -> Self {
        Self {
            blocked: types.into_iter().collect(),
        }
    }

    pub fn decide(&self, resource: ResourceType) -> RequestDecision {
        if self.blocked.contains(&resource) {
            RequestDecision::Abort
        } else {
            RequestDecision::Continue
        }
    }

    pub fn allows(&self, resource: ResourceType) -> bool {
        self.decide(resource) == RequestDecision::Continue
    }
}

/// Rendering capability used by the crawler
///
/// One value is one rendering session. Implementations keep the most
/// recently loaded document; `evaluate` always reads that document.
#[async_trait]
pub trait PageRenderer: Send {
    /// Load `url`, replacing the current document
    async fn navigate(&mut self, url: &str, wait: WaitPolicy) -> Result<(), NavigationError>;

    /// Evaluate `schema` against the current document
    async fn evaluate(&self, schema: &ExtractionSchema) -> Result<Extracted, ExtractionError>;

    /// Install the filter consulted for every request the session issues
    fn intercept_requests(&mut self, filter: RequestFilter);

    /// Release the session; later navigations fail with `SessionClosed`
    async fn close(&mut self) -> Result<(), NavigationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> ResourceType {
        ResourceType::from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_resource_type_from_url() {
        assert_eq!(
            kind("https://gall.dcinside.com/board/lists/?id=wow_new3"),
            ResourceType::Document
        );
        assert_eq!(kind("https://gall.dcinside.com/"), ResourceType::Document);
        assert_eq!(kind("https://nstatic.dcinside.com/dc/w/css/common.css"), ResourceType::Stylesheet);
        assert_eq!(kind("https://dcimg8.dcinside.co.kr/viewimage.PNG"), ResourceType::Image);
        assert_eq!(kind("https://nstatic.dcinside.com/font/NanumGothic.woff2"), ResourceType::Font);
        assert_eq!(kind("https://nstatic.dcinside.com/dc/w/js/common.js"), ResourceType::Script);
    }

    #[test]
    fn test_skip_heavy_assets() {
        let filter = RequestFilter::skip_heavy_assets();
        assert_eq!(filter.decide(ResourceType::Image), RequestDecision::Abort);
        assert_eq!(filter.decide(ResourceType::Stylesheet), RequestDecision::Abort);
        assert_eq!(filter.decide(ResourceType::Font), RequestDecision::Abort);
        assert!(filter.allows(ResourceType::Document));
        assert!(filter.allows(ResourceType::Script));
    }

    #[test]
    fn test_allow_all() {
        let filter = RequestFilter::allow_all();
        assert!(filter.allows(ResourceType::Image));
    }
}
