//! # reelscout
//!
//! Collects movies newly added to streaming providers, and a few popular
//! ones, from the JustWatch catalog by driving a real browser.
//!
//! ## Architecture
//!
//! ```text
//! Catalog → Crawler (timelines / grid → detail pages) → Normalizer → Store
//! ```
//!
//! - [`crawler`]: browser session, markup adapter and the discovery steps
//! - [`normalizer`]: cleans raw detail fields and resolves streaming links
//! - [`engine`]: runs a job over every (country, provider) pair
//! - [`store`]: SQLite persistence
//!
//! ## Quick Start
//!
//! ```bash
//! # Titles added today and yesterday
//! reelscout releases
//!
//! # Three popular titles per provider
//! reelscout top --provider Netflix
//!
//! # Best rated releases of the past week
//! reelscout highlights --days 7
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store
/// and engine.
pub mod app;

/// Command-line interface using clap.
///
/// - `releases` - Collect recently added titles
/// - `top` - Sample popular titles
/// - `highlights` - Rank stored releases
/// - `list [--top]` - Show stored releases or unsent top titles
/// - `config` - Print the effective configuration
pub mod cli;

/// Configuration loaded from `~/.config/reelscout/config.toml`.
pub mod config;

/// Browser-driven discovery and extraction.
///
/// - [`Session`](crawler::Session): what the engine needs from a browser
/// - [`SiteAdapter`](crawler::SiteAdapter): where things live in the markup
/// - [`ChromeSession`](crawler::ChromeSession): chromiumoxide implementation
pub mod crawler;

/// Core domain models.
///
/// - [`RawMovieRecord`](domain::RawMovieRecord): detail page fields as scraped
/// - [`NormalizedMovieRecord`](domain::NormalizedMovieRecord): cleaned record
/// - [`CountryProviderCatalog`](domain::CountryProviderCatalog): catalog URLs
pub mod domain;

pub mod engine;

pub mod highlights;

/// Field cleaning and streaming link reduction.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
