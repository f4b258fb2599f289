use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Chrome session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// CDP request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Wait time after navigation for dynamic content in milliseconds (default: 1000)
    pub wait_after_load_ms: u64,

    /// Wait time after a scroll gesture for lazy items to render in milliseconds (default: 1500)
    pub scroll_settle_ms: u64,

    /// Viewport size; rails only load what fits the viewport
    pub window_width: u32,
    pub window_height: u32,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            wait_after_load_ms: 1000,
            scroll_settle_ms: 1500,
            window_width: 1920,
            window_height: 1080,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl BrowserConfig {
    /// Get the CDP request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

/// Tuning for discovery, resolution and sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Site root used to absolutize relative title links
    pub base_url: String,

    /// Labels of the runtime row on detail pages, per site language
    pub runtime_labels: Vec<String>,

    /// Wait before looking for the consent overlay (default: 5000)
    pub consent_settle_ms: u64,

    /// Redirect polls per streaming link (default: 10)
    pub resolve_attempts: u32,

    /// Pause between redirect polls (default: 1000)
    pub resolve_interval_ms: u64,

    /// Wheel delta of one scroll gesture in pixels (default: 1920)
    pub scroll_step_px: f64,

    /// Qualifying titles per (country, provider) in top mode (default: 3)
    pub top_quota: usize,

    /// Minimum rating volume for a top title (default: 10000)
    pub min_num_ratings: u64,

    /// Grid size to load before sampling (default: 500)
    pub grid_target_items: usize,

    /// Scroll attempts while loading the grid (default: 50)
    pub grid_max_scrolls: usize,

    /// Sampling rounds before giving up on the quota (default: 50)
    pub max_sample_rounds: usize,

    /// Fixed seed for reproducible sampling
    pub sample_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.justwatch.com".to_string(),
            runtime_labels: vec!["Laufzeit".to_string(), "Runtime".to_string()],
            consent_settle_ms: 5000,
            resolve_attempts: 10,
            resolve_interval_ms: 1000,
            scroll_step_px: 1920.0,
            top_quota: 3,
            min_num_ratings: 10_000,
            grid_target_items: 500,
            grid_max_scrolls: 50,
            max_sample_rounds: 50,
            sample_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn consent_settle(&self) -> Duration {
        Duration::from_millis(self.consent_settle_ms)
    }

    pub fn resolve_interval(&self) -> Duration {
        Duration::from_millis(self.resolve_interval_ms)
    }

    /// Zero delays, for driving the engine against an in-memory session.
    #[cfg(test)]
    pub(crate) fn instant() -> Self {
        Self {
            consent_settle_ms: 0,
            resolve_interval_ms: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_browser_config_values() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.wait_after_load_ms, 1000);
        assert_eq!(config.window_width, 1920);
        assert!(config.user_agent.is_some());
    }

    #[test]
    fn test_browser_durations() {
        let config = BrowserConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.wait_after_load(), Duration::from_millis(1000));
        assert_eq!(config.scroll_settle(), Duration::from_millis(1500));
    }

    #[test]
    fn test_default_engine_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.resolve_attempts, 10);
        assert_eq!(config.resolve_interval(), Duration::from_secs(1));
        assert_eq!(config.consent_settle(), Duration::from_secs(5));
        assert_eq!(config.top_quota, 3);
        assert_eq!(config.min_num_ratings, 10_000);
        assert_eq!(config.grid_target_items, 500);
        assert_eq!(config.grid_max_scrolls, 50);
        assert!(config.sample_seed.is_none());
    }

    #[test]
    fn test_partial_engine_config_keeps_defaults() {
        let config: EngineConfig = toml::from_str("top_quota = 5").unwrap();
        assert_eq!(config.top_quota, 5);
        assert_eq!(config.resolve_attempts, 10);
    }
}
