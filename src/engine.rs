use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

use crate::app::Result;
use crate::crawler::{
    discover_timelines, dismiss_consent, extract_all, BrowserConfig, ChromeSession, EngineConfig,
    JustWatchMarkup, LinkResolver, Session, SiteAdapter, TopReleaseSampler,
};
use crate::domain::{release_window, CountryProviderCatalog, NormalizedMovieRecord, ReleaseDate};
use crate::normalizer::Normalizer;

/// What one engine run should collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Titles added to provider timelines today and on the trailing days
    Releases {
        countries: Vec<String>,
        providers: Vec<String>,
        days_backwards: u32,
    },
    /// A small random sample of popular titles per provider
    Top {
        countries: Vec<String>,
        providers: Vec<String>,
    },
}

/// Runs discovery or sampling over every (country, provider) pair on a
/// single browser session.
pub struct Engine {
    catalog: CountryProviderCatalog,
    adapter: Box<dyn SiteAdapter>,
    normalizer: Normalizer,
    sampler: TopReleaseSampler,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: &EngineConfig, catalog: CountryProviderCatalog) -> Result<Self> {
        let adapter = JustWatchMarkup::from_config(config)?;
        Ok(Self::with_adapter(config, catalog, Box::new(adapter)))
    }

    pub fn with_adapter(
        config: &EngineConfig,
        catalog: CountryProviderCatalog,
        adapter: Box<dyn SiteAdapter>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(catalog.clone(), LinkResolver::from_config(config)),
            sampler: TopReleaseSampler::from_config(config),
            catalog,
            adapter,
            config: config.clone(),
        }
    }

    /// Collect titles added on `today` and the `days_backwards` days before.
    ///
    /// Pairs are visited country first, then provider, and the output keeps
    /// that order. A pair whose timelines show none of the dates adds
    /// nothing. Any session error aborts the run.
    pub async fn run(
        &self,
        session: &dyn Session,
        countries: &[String],
        providers: &[String],
        days_backwards: u32,
        today: ReleaseDate,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        let window = release_window(today, days_backwards);
        let mut consented = false;
        let mut records = Vec::new();

        for country in countries {
            for provider in providers {
                let entry = self.catalog.entry(country, provider)?;
                info!("Scanning new releases for {} / {}", country, provider);

                session.navigate(&entry.new_releases_url).await?;
                self.consent(session, &mut consented).await;

                let timelines = discover_timelines(
                    session,
                    self.adapter.as_ref(),
                    &window,
                    self.config.scroll_step_px,
                )
                .await?;
                if timelines.is_empty() {
                    info!("No recent timelines for {} / {}", country, provider);
                    continue;
                }

                let raw = extract_all(session, self.adapter.as_ref(), &timelines).await?;
                let normalized = self
                    .normalizer
                    .normalize(session, &raw, country, provider)
                    .await?;
                info!(
                    "Collected {} releases for {} / {}",
                    normalized.len(),
                    country,
                    provider
                );
                records.extend(normalized);
            }
        }

        Ok(records)
    }

    /// Sample up to the configured quota of popular titles per pair.
    ///
    /// Sampled titles are dated `today`.
    pub async fn run_top<R: Rng + Send>(
        &self,
        session: &dyn Session,
        countries: &[String],
        providers: &[String],
        today: ReleaseDate,
        rng: &mut R,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        let mut consented = false;
        let mut records = Vec::new();

        for country in countries {
            for provider in providers {
                let entry = self.catalog.entry(country, provider)?;
                info!("Sampling top titles for {} / {}", country, provider);

                session.navigate(&entry.top_rated_url).await?;
                self.consent(session, &mut consented).await;

                let sampled = self
                    .sampler
                    .sample(
                        session,
                        self.adapter.as_ref(),
                        &self.normalizer,
                        country,
                        provider,
                        today,
                        rng,
                    )
                    .await?;
                records.extend(sampled);
            }
        }

        Ok(records)
    }

    pub async fn run_job(
        &self,
        session: &dyn Session,
        job: &Job,
        today: ReleaseDate,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        match job {
            Job::Releases {
                countries,
                providers,
                days_backwards,
            } => {
                self.run(session, countries, providers, *days_backwards, today)
                    .await
            }
            Job::Top {
                countries,
                providers,
            } => {
                let mut rng = match self.config.sample_seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                self.run_top(session, countries, providers, today, &mut rng)
                    .await
            }
        }
    }

    /// Launch Chrome, run `job` dated today, and close the browser whether
    /// the run succeeded or not.
    pub async fn run_with_chrome(
        &self,
        browser: &BrowserConfig,
        job: &Job,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        let session = ChromeSession::launch(browser).await?;
        let today = Local::now().date_naive();

        let outcome = self.run_job(&session, job, today).await;

        if let Err(e) = session.close().await {
            error!("Failed to shut the browser down: {}", e);
        }
        outcome
    }

    /// The overlay only has to be dismissed once per session; until then
    /// every catalog page gets another attempt.
    async fn consent(&self, session: &dyn Session, consented: &mut bool) {
        if *consented {
            return;
        }
        *consented =
            dismiss_consent(session, self.adapter.as_ref(), self.config.consent_settle()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ReelError;
    use crate::crawler::testing::{detail_page, grid_page, timeline_page, FakePage, FakeSession};
    use chrono::NaiveDate;

    fn today() -> ReleaseDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    fn engine() -> Engine {
        Engine::new(&EngineConfig::instant(), CountryProviderCatalog::default()).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn new_releases(provider: &str) -> String {
        CountryProviderCatalog::default()
            .entry("Germany", provider)
            .unwrap()
            .new_releases_url
            .clone()
    }

    fn top_rated(provider: &str) -> String {
        CountryProviderCatalog::default()
            .entry("Germany", provider)
            .unwrap()
            .top_rated_url
            .clone()
    }

    fn title(slug: &str) -> String {
        format!("https://www.justwatch.com/de/Film/{}", slug)
    }

    fn click(slug: &str) -> String {
        format!("https://click.justwatch.com/a?r={}", slug)
    }

    /// Session where every slug has a detail page with one flat-rate offer
    /// redirecting to `target(slug)`.
    fn with_titles(
        mut session: FakeSession,
        titles: &[(&str, &str)],
        target: impl Fn(&str) -> String,
    ) -> FakeSession {
        for (slug, rating) in titles {
            let offer = click(slug);
            session = session
                .with_page(
                    &title(slug),
                    FakePage::new(detail_page(slug, "2021", rating, &[("Flatrate", offer.as_str())])),
                )
                .with_redirect(&offer, &target(slug));
        }
        session
    }

    #[tokio::test]
    async fn test_run_collects_recent_releases_in_order() {
        let session = FakeSession::new()
            .with_shadow_controls(1)
            .with_page(
                &new_releases("Netflix"),
                FakePage::new(timeline_page(&[
                    ("2024-03-02", 1, &["dune"]),
                    ("2024-03-01", 2, &["heat", "alien"]),
                    ("2024-02-20", 1, &["old"]),
                ])),
            );
        let session = with_titles(
            session,
            &[("dune", "8.0 (850k)"), ("heat", "8.3 (700k)"), ("alien", "8.5 (900k)")],
            |slug| format!("https://www.netflix.com/title/{}", slug),
        );

        let records = engine()
            .run(&session, &strings(&["Germany"]), &strings(&["Netflix"]), 1, today())
            .await
            .unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["heat", "alien", "dune"]);
        for record in &records {
            assert_eq!(record.provider, "Netflix");
            assert_eq!(record.country, "Germany");
            assert!(record.canonical_streaming_link.starts_with("https://www.netflix.com/title/"));
        }
        assert_eq!(records[2].date_added, today());
        assert!(!session.visits().contains(&title("old")));
    }

    #[tokio::test]
    async fn test_consent_dismissed_once_per_session() {
        let session = FakeSession::new()
            .with_shadow_controls(1)
            .with_page(
                &new_releases("Netflix"),
                FakePage::new(timeline_page(&[("2024-03-02", 1, &["dune"])])),
            )
            .with_page(
                &new_releases("Amazon Prime Video"),
                FakePage::new(timeline_page(&[("2024-03-02", 1, &["heat"])])),
            );
        let session = with_titles(
            session,
            &[("dune", "8.0 (850k)"), ("heat", "8.3 (700k)")],
            |slug| format!("https://www.netflix.com/title/{}", slug),
        );

        let records = engine()
            .run(
                &session,
                &strings(&["Germany"]),
                &strings(&["Netflix", "Amazon Prime Video"]),
                0,
                today(),
            )
            .await
            .unwrap();

        assert_eq!(session.clicks(), 1);
        assert_eq!(records.len(), 2);
        // heat only offers a netflix link, so amazon falls back to its landing page
        assert_eq!(records[1].provider, "Amazon Prime Video");
        assert_eq!(
            records[1].canonical_streaming_link,
            "https://www.amazon.de/gp/video/storefront/"
        );
    }

    #[tokio::test]
    async fn test_pair_without_matching_timeline_adds_nothing() {
        let session = FakeSession::new().with_page(
            &new_releases("Netflix"),
            FakePage::new(timeline_page(&[("2024-02-20", 1, &["old"])])),
        );

        let records = engine()
            .run(&session, &strings(&["Germany"]), &strings(&["Netflix"]), 1, today())
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(session.visits(), vec![new_releases("Netflix")]);
    }

    #[tokio::test]
    async fn test_missing_catalog_entry_fails_run() {
        let session = FakeSession::new();
        let err = engine()
            .run(&session, &strings(&["France"]), &strings(&["Netflix"]), 1, today())
            .await
            .unwrap_err();

        assert!(matches!(err, ReelError::Catalog(_)));
        assert!(session.visits().is_empty());
    }

    #[tokio::test]
    async fn test_session_error_aborts_run() {
        let session = FakeSession::new()
            .with_page(
                &new_releases("Netflix"),
                FakePage::new(timeline_page(&[("2024-03-02", 2, &["dune", "heat"])])),
            )
            .with_page(
                &title("dune"),
                FakePage::new(detail_page("dune", "2021", "8.0", &[])),
            )
            .with_broken(&title("heat"));

        let err = engine()
            .run(&session, &strings(&["Germany"]), &strings(&["Netflix"]), 0, today())
            .await
            .unwrap_err();

        assert!(matches!(err, ReelError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_run_top_samples_each_pair() {
        let slugs = strings(&["a", "b", "c", "d"]);
        let session = FakeSession::new().with_page(
            &top_rated("Netflix"),
            FakePage::new(grid_page(&slugs)),
        );
        let session = with_titles(
            session,
            &[("a", "8.1 (120k)"), ("b", "7.9 (50k)"), ("c", "8.4 (1.2m)"), ("d", "7.0 (15k)")],
            |slug| format!("https://www.netflix.com/title/{}", slug),
        );
        let mut rng = StdRng::seed_from_u64(11);

        let records = engine()
            .run_top(&session, &strings(&["Germany"]), &strings(&["Netflix"]), today(), &mut rng)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.date_added == today()));
        assert!(records.iter().all(|r| r.provider == "Netflix"));
    }

    #[tokio::test]
    async fn test_run_job_dispatches_releases() {
        let session = FakeSession::new().with_page(
            &new_releases("Netflix"),
            FakePage::new(timeline_page(&[])),
        );
        let job = Job::Releases {
            countries: strings(&["Germany"]),
            providers: strings(&["Netflix"]),
            days_backwards: 1,
        };

        let records = engine().run_job(&session, &job, today()).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(session.visits(), vec![new_releases("Netflix")]);
    }
}
