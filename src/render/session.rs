//! Scoped rendering session
//!
//! A [`RenderSession`] owns the renderer for the length of a run. The body of
//! the run is wrapped with [`catching`], and [`RenderSession::finish`] closes
//! the session exactly once before handing back the body's result (or
//! resuming its panic):
//!
//! ```ignore
//! let mut session = RenderSession::open(renderer);
//! let outcome = catching(crawl(session.renderer_mut())).await;
//! let result = session.finish(outcome).await;
//! ```

use futures::future::CatchUnwind;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::render::PageRenderer;

/// Outcome of a body future run under [`catching`]
pub type Outcome<T> = std::thread::Result<T>;

/// Catch a panic raised while polling `body`
pub fn catching<F: Future>(body: F) -> CatchUnwind<AssertUnwindSafe<F>> {
    AssertUnwindSafe(body).catch_unwind()
}

pub struct RenderSession<R: PageRenderer> {
    renderer: R,
    closed: bool,
}

impl<R: PageRenderer> RenderSession<R> {
    pub fn open(renderer: R) -> Self {
        tracing::debug!("Rendering session opened");
        Self {
            renderer,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Close the session and unwrap the body's outcome
    ///
    /// A caught panic is resumed after the session has been closed.
    pub async fn finish<T>(mut self, outcome: Outcome<T>) -> T {
        self.close().await;

        match outcome {
            Ok(value) => value,
            Err(panic) => {
                tracing::error!("Crawl body panicked; session closed before unwinding");
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Close the renderer; later calls are no-ops
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.renderer.close().await {
            Ok(()) => tracing::debug!("Rendering session closed"),
            Err(e) => tracing::warn!(error = %e, "Failed to close rendering session"),
        }
    }
}

impl<R: PageRenderer> Drop for RenderSession<R> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("Rendering session dropped without being closed");
        }
    }
}
