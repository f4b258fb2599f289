use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{ReelError, Result};
use crate::crawler::config::BrowserConfig;
use crate::crawler::{Session, StructuralPath};

/// Collects every `tag` inside shadow roots (nested ones included) and
/// clicks the last one.
const SHADOW_CLICK_SCRIPT: &str = r#"
    (() => {
        const found = [];
        const walk = (root) => {
            root.querySelectorAll('*').forEach((el) => {
                if (el.shadowRoot) {
                    el.shadowRoot.querySelectorAll(__TAG__).forEach((c) => found.push(c));
                    walk(el.shadowRoot);
                }
            });
        };
        walk(document);
        const control = found[found.length - 1];
        if (!control) {
            return false;
        }
        try {
            control.click();
            return true;
        } catch (e) {
            return false;
        }
    })()
"#;

/// Single-tab Chrome session driven by chromiumoxide
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: BrowserConfig,
}

impl ChromeSession {
    /// Launch Chrome and open the tab the whole run will use
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ReelError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            ReelError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(ReelError::Browser(format!("Failed to create page: {}", e)));
            }
        };

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| ReelError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Self {
            browser,
            page,
            handler,
            config: config.clone(),
        })
    }

    /// Shut the browser down. Consumes the session so it cannot be reused.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed.map_err(|e| ReelError::Browser(format!("Failed to close browser: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ReelError::navigation(url, e))?;

        // Additional wait for dynamic content
        tokio::time::sleep(self.config.wait_after_load()).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ReelError::Browser(format!("Failed to read current URL: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn page_markup(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| ReelError::Browser(format!("Failed to read page content: {}", e)))
    }

    async fn scroll_by(&self, origin: &StructuralPath, dx: f64, dy: f64) -> Result<bool> {
        let xpath = origin.to_xpath();
        let element = match self.page.find_xpath(&xpath).await {
            Ok(element) => element,
            Err(e) => {
                debug!("Scroll origin {} not found: {}", xpath, e);
                return Ok(false);
            }
        };

        let point = match element.scroll_into_view().await {
            Ok(element) => element.clickable_point().await,
            Err(e) => Err(e),
        };
        let point = match point {
            Ok(point) => point,
            Err(e) => {
                debug!("Scroll origin {} has no position: {}", xpath, e);
                return Ok(false);
            }
        };

        let wheel = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(point.x)
            .y(point.y)
            .delta_x(dx)
            .delta_y(dy)
            .build()
            .map_err(|e| ReelError::Browser(format!("Invalid wheel event: {}", e)))?;

        self.page
            .execute(wheel)
            .await
            .map_err(|e| ReelError::Browser(format!("Scroll gesture failed: {}", e)))?;

        tokio::time::sleep(self.config.scroll_settle()).await;
        Ok(true)
    }

    async fn find_element(&self, path: &StructuralPath) -> Result<bool> {
        Ok(self.page.find_xpath(path.to_xpath()).await.is_ok())
    }

    async fn activate_last_shadow_control(&self, tag: &str) -> Result<bool> {
        let tag_literal = serde_json::to_string(tag)?;
        let script = SHADOW_CLICK_SCRIPT.replace("__TAG__", &tag_literal);

        let clicked = match self.page.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!("Shadow control script failed: {}", e);
                false
            }
        };
        Ok(clicked)
    }
}
