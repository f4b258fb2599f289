//! In-memory [`Session`] and page fixtures for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use scraper::Html;

use crate::app::{ReelError, Result};
use crate::crawler::{Session, StructuralPath};

/// A page served by [`FakeSession`]. Every successful scroll gesture on it
/// advances to the next frame, the last frame sticks.
#[derive(Debug, Clone)]
pub struct FakePage {
    frames: Vec<String>,
    shown: usize,
}

impl FakePage {
    pub fn new(markup: impl Into<String>) -> Self {
        Self::frames(vec![markup.into()])
    }

    pub fn frames(frames: Vec<String>) -> Self {
        Self { frames, shown: 0 }
    }

    fn markup(&self) -> &str {
        self.frames
            .get(self.shown)
            .or_else(|| self.frames.last())
            .map(String::as_str)
            .unwrap_or("<html><body></body></html>")
    }
}

#[derive(Debug, Default)]
struct FakeState {
    current: String,
    pages: HashMap<String, FakePage>,
    redirects: HashMap<String, String>,
    broken: HashSet<String>,
    shadow_controls: usize,
    visits: Vec<String>,
    scrolls: Vec<(String, f64, f64)>,
    clicks: usize,
}

/// Scripted browser: pages by URL, redirects, shadow-root buttons.
#[derive(Debug, Default)]
pub struct FakeSession {
    state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, page: FakePage) -> Self {
        self.lock().pages.insert(url.to_string(), page);
        self
    }

    pub fn with_redirect(self, from: &str, to: &str) -> Self {
        self.lock().redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Navigating to `url` fails like an unreachable host.
    pub fn with_broken(self, url: &str) -> Self {
        self.lock().broken.insert(url.to_string());
        self
    }

    pub fn with_shadow_controls(self, count: usize) -> Self {
        self.lock().shadow_controls = count;
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls.len()
    }

    pub fn clicks(&self) -> usize {
        self.lock().clicks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        if state.broken.contains(url) {
            return Err(ReelError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
        }
        state.visits.push(url.to_string());
        let landed = state.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        if let Some(page) = state.pages.get_mut(&landed) {
            page.shown = 0;
        }
        state.current = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().current.clone())
    }

    async fn page_markup(&self) -> Result<String> {
        let state = self.lock();
        Ok(state
            .pages
            .get(&state.current)
            .map(|page| page.markup().to_string())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn scroll_by(&self, origin: &StructuralPath, dx: f64, dy: f64) -> Result<bool> {
        let mut state = self.lock();
        let current = state.current.clone();
        let Some(page) = state.pages.get_mut(&current) else {
            return Ok(false);
        };
        let resolves = origin.resolve(&Html::parse_document(page.markup())).is_some();
        if !resolves {
            return Ok(false);
        }
        if page.shown + 1 < page.frames.len() {
            page.shown += 1;
        }
        state.scrolls.push((origin.to_xpath(), dx, dy));
        Ok(true)
    }

    async fn find_element(&self, path: &StructuralPath) -> Result<bool> {
        let markup = self.page_markup().await?;
        Ok(path.resolve(&Html::parse_document(&markup)).is_some())
    }

    async fn activate_last_shadow_control(&self, _tag: &str) -> Result<bool> {
        let mut state = self.lock();
        if state.shadow_controls == 0 {
            return Ok(false);
        }
        state.clicks += 1;
        Ok(true)
    }
}

/// Timeline page with one rail per date. `items` lists the slugs
/// rendered so far on each rail.
pub fn timeline_page(rails: &[(&str, usize, &[&str])]) -> String {
    let mut body = String::new();
    for (date, advertised, slugs) in rails {
        let items: String = slugs
            .iter()
            .map(|slug| {
                format!(
                    r#"<div class="horizontal-title-list__item"><a href="/de/Film/{slug}">{slug}</a></div>"#
                )
            })
            .collect();
        body.push_str(&format!(
            r#"<div class="timeline timeline__{date}">
                <div class="provider-timeline">
                    <div class="provider-timeline__header">{advertised} Titel</div>
                    <div class="hidden-horizontal-scrollbar__items">{items}</div>
                </div>
            </div>"#
        ));
    }
    format!("<html><head></head><body><div id=\"app\">{body}</div></body></html>")
}

pub fn detail_page(name: &str, year: &str, rating: &str, offers: &[(&str, &str)]) -> String {
    let offers: String = offers
        .iter()
        .map(|(kind, href)| {
            format!(
                r#"<div class="presentation-type price-comparison__grid__row__element__icon"><a href="{href}"><span>{kind}</span></a></div>"#
            )
        })
        .collect();
    format!(
        r#"<html><head></head><body>
            <div class="title-block"><h1> {name} </h1><span>({year})</span></div>
            <div v-uib-tooltip="IMDB"><a href="https://www.imdb.com/title/tt0000001/?ref_=justwatch">{rating}</a></div>
            <div class="detail-infos"><div>Laufzeit</div><div>2h 15min</div></div>
            <div class="price-comparison--block">{offers}</div>
        </body></html>"#
    )
}

pub fn grid_page(slugs: &[String]) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(r#"<div class="title-list-grid__item"><a href="/de/Film/{slug}">{slug}</a></div>"#)
        })
        .collect();
    format!(
        r#"<html><head></head><body><div class="title-list-grid">{items}</div></body></html>"#
    )
}
