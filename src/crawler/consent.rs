use std::time::Duration;

use tracing::debug;

use crate::crawler::{Session, SiteAdapter};

/// Dismiss the cookie overlay on the current page.
///
/// Waits `settle` for the overlay to render, then clicks the last consent
/// button inside its shadow root. A missing or unclickable button means
/// the overlay is absent or already dismissed and is not an error.
pub async fn dismiss_consent(
    session: &dyn Session,
    adapter: &dyn SiteAdapter,
    settle: Duration,
) -> bool {
    tokio::time::sleep(settle).await;

    match session
        .activate_last_shadow_control(adapter.consent_control_tag())
        .await
    {
        Ok(true) => {
            debug!("Consent overlay dismissed");
            true
        }
        Ok(false) => {
            debug!("No consent overlay control found");
            false
        }
        Err(e) => {
            debug!("Consent overlay could not be dismissed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::FakeSession;
    use crate::crawler::{EngineConfig, JustWatchMarkup};

    fn adapter() -> JustWatchMarkup {
        JustWatchMarkup::from_config(&EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_dismiss_clicks_control() {
        let session = FakeSession::new().with_shadow_controls(2);
        assert!(dismiss_consent(&session, &adapter(), Duration::ZERO).await);
        assert_eq!(session.clicks(), 1);
    }

    #[tokio::test]
    async fn test_missing_overlay_is_swallowed() {
        let session = FakeSession::new();
        assert!(!dismiss_consent(&session, &adapter(), Duration::ZERO).await);
        assert_eq!(session.clicks(), 0);
    }
}
