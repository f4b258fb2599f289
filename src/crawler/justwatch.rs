use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{ReelError, Result};
use crate::crawler::config::EngineConfig;
use crate::crawler::{locate, ListingItem, SiteAdapter, TimelineSection};
use crate::domain::{DetailField, DetailFields, FieldResult, FieldUnavailable};

static DATE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("valid date regex"));
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("valid number regex"));

/// Offers on the price comparison block carrying this marker are included
/// in a subscription.
const FLATRATE_MARKER: &str = "Flat";

struct Selectors {
    timeline: Selector,
    scroller: Selector,
    timeline_item: Selector,
    title_block: Selector,
    heading: Selector,
    span: Selector,
    rating_badge: Selector,
    anchor: Selector,
    div: Selector,
    price_block: Selector,
    presentation_type: Selector,
    grid_item: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            timeline: parse("div.provider-timeline")?,
            scroller: parse("div.hidden-horizontal-scrollbar__items")?,
            timeline_item: parse("div.horizontal-title-list__item")?,
            title_block: parse("div.title-block")?,
            heading: parse("h1")?,
            span: parse("span")?,
            rating_badge: parse(r#"div[v-uib-tooltip="IMDB"]"#)?,
            anchor: parse("a[href]")?,
            div: parse("div")?,
            price_block: parse("div.price-comparison--block")?,
            presentation_type: parse(
                "div.presentation-type.price-comparison__grid__row__element__icon",
            )?,
            grid_item: parse("div.title-list-grid__item")?,
        })
    }
}

fn parse(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ReelError::Config(format!("Invalid selector {:?}: {}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Markup adapter for justwatch.com catalog, timeline and title pages
pub struct JustWatchMarkup {
    base_url: Url,
    runtime_labels: Vec<String>,
    selectors: Selectors,
}

impl JustWatchMarkup {
    pub fn new(base_url: &str, runtime_labels: Vec<String>) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            runtime_labels,
            selectors: Selectors::new()?,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(&config.base_url, config.runtime_labels.clone())
    }

    fn absolute(&self, href: &str) -> Option<String> {
        self.base_url.join(href).ok().map(String::from)
    }

    /// Date tag on the rail's wrapping div, e.g. `timeline__2024-03-01`
    fn section_date(timeline: ElementRef<'_>) -> Option<NaiveDate> {
        let wrapper = timeline
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div")?;

        let classes: Vec<&str> = wrapper.value().classes().collect();
        classes.iter().rev().find_map(|class| {
            let captures = DATE_CLASS.captures(class)?;
            NaiveDate::parse_from_str(&captures[1], "%Y-%m-%d").ok()
        })
    }

    fn item_link(&self, item: ElementRef<'_>) -> Option<String> {
        let anchor = item
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")?;
        self.absolute(anchor.value().attr("href")?)
    }

    fn title_block<'a>(&self, page: &'a Html) -> Option<ElementRef<'a>> {
        page.select(&self.selectors.title_block).next()
    }

    fn name(&self, page: &Html) -> FieldResult<String> {
        self.title_block(page)
            .and_then(|block| block.select(&self.selectors.heading).next())
            .map(text_of)
            .ok_or_else(|| FieldUnavailable::new(DetailField::Name, "no title heading"))
    }

    fn release_year(&self, page: &Html) -> FieldResult<String> {
        self.title_block(page)
            .and_then(|block| block.select(&self.selectors.span).next())
            .map(text_of)
            .ok_or_else(|| FieldUnavailable::new(DetailField::ReleaseYear, "no year span"))
    }

    fn rating_badge<'a>(&self, page: &'a Html) -> Option<ElementRef<'a>> {
        page.select(&self.selectors.rating_badge).next()
    }

    fn external_rating_link(&self, page: &Html) -> FieldResult<String> {
        self.rating_badge(page)
            .and_then(|badge| badge.select(&self.selectors.anchor).next())
            .and_then(|anchor| anchor.value().attr("href"))
            .map(String::from)
            .ok_or_else(|| {
                FieldUnavailable::new(DetailField::ExternalRatingLink, "no rating badge link")
            })
    }

    fn external_rating(&self, page: &Html) -> FieldResult<String> {
        self.rating_badge(page)
            .map(text_of)
            .ok_or_else(|| FieldUnavailable::new(DetailField::ExternalRating, "no rating badge"))
    }

    fn runtime(&self, page: &Html) -> FieldResult<String> {
        page.select(&self.selectors.div)
            .find(|el| {
                let label = text_of(*el);
                self.runtime_labels
                    .iter()
                    .any(|wanted| label.trim() == wanted.as_str())
            })
            .and_then(|label| {
                label
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .next()
            })
            .map(text_of)
            .ok_or_else(|| FieldUnavailable::new(DetailField::Runtime, "no runtime row"))
    }

    fn streaming_links(&self, page: &Html) -> FieldResult<Vec<String>> {
        let block = page
            .select(&self.selectors.price_block)
            .next()
            .ok_or_else(|| {
                FieldUnavailable::new(DetailField::StreamingLinks, "no price comparison block")
            })?;

        Ok(block
            .select(&self.selectors.presentation_type)
            .filter(|offer| text_of(*offer).contains(FLATRATE_MARKER))
            .filter_map(|offer| offer.select(&self.selectors.anchor).next())
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(String::from)
            .collect())
    }
}

impl SiteAdapter for JustWatchMarkup {
    fn timeline_sections(&self, page: &Html) -> Vec<TimelineSection> {
        page.select(&self.selectors.timeline)
            .map(|timeline| {
                let advertised = FIRST_NUMBER
                    .captures(&text_of(timeline))
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(0);

                let items = timeline
                    .select(&self.selectors.timeline_item)
                    .map(|item| ListingItem {
                        link: self.item_link(item),
                        path: locate(item),
                    })
                    .collect();

                TimelineSection {
                    date: Self::section_date(timeline),
                    advertised,
                    scroller: timeline.select(&self.selectors.scroller).next().map(locate),
                    items,
                }
            })
            .collect()
    }

    fn detail_fields(&self, page: &Html) -> DetailFields {
        DetailFields {
            name: self.name(page),
            release_year: self.release_year(page),
            external_rating_link: self.external_rating_link(page),
            external_rating: self.external_rating(page),
            runtime: self.runtime(page),
            streaming_links: self.streaming_links(page),
        }
    }

    fn grid_items(&self, page: &Html) -> Vec<ListingItem> {
        page.select(&self.selectors.grid_item)
            .map(|item| ListingItem {
                link: item
                    .select(&self.selectors.anchor)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| self.absolute(href)),
                path: locate(item),
            })
            .collect()
    }

    fn consent_control_tag(&self) -> &str {
        "button"
    }
}
