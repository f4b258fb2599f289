//! Browser-driven release discovery.
//!
//! Everything in here talks to the catalog site through two seams:
//!
//! - [`Session`]: what a browser can do (navigate, read markup, scroll,
//!   click). [`ChromeSession`] drives a real Chrome via chromiumoxide.
//! - [`SiteAdapter`]: where things live in the site's markup.
//!   [`JustWatchMarkup`] knows the JustWatch class names.
//!
//! # Pipeline
//!
//! ```text
//! catalog page → timelines / grid → detail pages → link resolution → records
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use reelscout::crawler::{discover_timelines, ChromeSession, JustWatchMarkup};
//!
//! let session = ChromeSession::launch(&config.browser).await?;
//! session.navigate(url).await?;
//! let timelines = discover_timelines(&session, &adapter, &dates, 1920.0).await?;
//! session.close().await?;
//! ```

mod chrome;
mod config;
mod consent;
mod detail;
mod justwatch;
mod locator;
mod resolver;
mod sampler;
mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use chrome::ChromeSession;
pub use config::{BrowserConfig, EngineConfig};
pub use consent::dismiss_consent;
pub use detail::{extract_all, extract_details};
pub use justwatch::JustWatchMarkup;
pub use locator::{locate, PathStep, StructuralPath};
pub use resolver::LinkResolver;
pub use sampler::TopReleaseSampler;
pub use timeline::discover_timelines;

use async_trait::async_trait;
use scraper::Html;

use crate::app::Result;
use crate::domain::{DetailFields, ReleaseDate, TitleLink};

/// Browser capability consumed by the engine.
///
/// One session is one tab; callers use it strictly sequentially.
#[async_trait]
pub trait Session: Send + Sync {
    /// Load `url` in the session's tab and wait for it to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL currently shown, after any redirects that already happened.
    async fn current_url(&self) -> Result<String>;

    /// Serialized DOM of the current page.
    async fn page_markup(&self) -> Result<String>;

    /// Scroll-wheel gesture anchored at `origin`.
    ///
    /// Returns `false` when `origin` no longer resolves in the live DOM.
    async fn scroll_by(&self, origin: &StructuralPath, dx: f64, dy: f64) -> Result<bool>;

    /// Whether `path` resolves in the live DOM.
    async fn find_element(&self, path: &StructuralPath) -> Result<bool>;

    /// Click the last `tag` element found inside shadow roots.
    ///
    /// Returns `false` when there is none or it could not be clicked.
    async fn activate_last_shadow_control(&self, tag: &str) -> Result<bool>;
}

/// An item of a timeline rail or a listing grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem {
    /// Absolute detail page link, `None` when the anchor is malformed
    pub link: Option<TitleLink>,
    pub path: StructuralPath,
}

/// A "recently added" rail for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSection {
    pub date: Option<ReleaseDate>,
    /// Item count printed in the rail header
    pub advertised: usize,
    /// Horizontal scroller holding the items
    pub scroller: Option<StructuralPath>,
    pub items: Vec<ListingItem>,
}

/// Site-specific markup knowledge.
pub trait SiteAdapter: Send + Sync {
    fn timeline_sections(&self, page: &Html) -> Vec<TimelineSection>;

    fn detail_fields(&self, page: &Html) -> DetailFields;

    fn grid_items(&self, page: &Html) -> Vec<ListingItem>;

    /// Tag of the consent overlay's buttons
    fn consent_control_tag(&self) -> &str;
}

/// Parse the current page and run `f` over it.
///
/// The parsed document never outlives this call, so callers can keep
/// awaiting afterwards.
pub(crate) async fn read_page<T>(
    session: &dyn Session,
    f: impl FnOnce(&Html) -> T,
) -> Result<T> {
    let markup = session.page_markup().await?;
    let document = Html::parse_document(&markup);
    Ok(f(&document))
}
