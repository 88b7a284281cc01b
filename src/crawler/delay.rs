//! Randomized pause between page loads

use rand::Rng;
use std::time::Duration;

use crate::config::CrawlerConfig;
use crate::render::CancelToken;
use crate::utils::error::NavigationError;

/// Uniformly random wait in `min..=max` milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PolitenessDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    /// No pause at all
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn is_disabled(&self) -> bool {
        self.max_ms == 0
    }

    /// Draw the next pause length
    pub fn next(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleep for a random pause, returning early with `Cancelled`
    pub async fn wait(&self, cancel: &CancelToken) -> Result<(), NavigationError> {
        if cancel.is_cancelled() {
            return Err(NavigationError::Cancelled);
        }
        if self.is_disabled() {
            return Ok(());
        }

        let pause = self.next();
        tracing::trace!(delay_ms = pause.as_millis() as u64, "Politeness delay");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NavigationError::Cancelled),
            _ = tokio::time::sleep(pause) => Ok(()),
        }
    }
}

impl Default for PolitenessDelay {
    fn default() -> Self {
        Self::new(500, 1500)
    }
}
