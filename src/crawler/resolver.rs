use std::time::Duration;

use tracing::debug;

use crate::app::Result;
use crate::crawler::config::EngineConfig;
use crate::crawler::Session;

/// Follows click-through links to where they finally land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkResolver {
    attempts: u32,
    interval: Duration,
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1))
    }
}

impl LinkResolver {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.resolve_attempts, config.resolve_interval())
    }

    /// Navigate to `link` and wait for the redirect chain to move off it.
    ///
    /// Returns `link` unchanged when the URL never changes within the poll
    /// budget; callers use it as a degraded fallback.
    pub async fn resolve(&self, session: &dyn Session, link: &str) -> Result<String> {
        session.navigate(link).await?;

        for attempt in 1..=self.attempts {
            let current = session.current_url().await?;
            if current != link {
                debug!("Resolved {} to {} after {} polls", link, current, attempt);
                return Ok(current);
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        debug!("{} did not redirect, keeping it", link);
        Ok(link.to_string())
    }
}
