use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::crawler::config::EngineConfig;
use crate::crawler::{extract_details, read_page, ListingItem, Session, SiteAdapter};
use crate::domain::{NormalizedMovieRecord, RawMovieRecord, ReleaseDate, TitleLink};
use crate::normalizer::Normalizer;

/// Consecutive scrolls without new grid items before loading gives up
const STALLED_SCROLLS: usize = 3;

/// Picks a few well-rated, well-known titles from a sorted catalog grid.
#[derive(Debug, Clone)]
pub struct TopReleaseSampler {
    pub quota: usize,
    pub min_num_ratings: u64,
    pub target_items: usize,
    pub max_scrolls: usize,
    pub max_rounds: usize,
    pub scroll_step: f64,
    pub draws_per_round: usize,
}

impl Default for TopReleaseSampler {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl TopReleaseSampler {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            quota: config.top_quota,
            min_num_ratings: config.min_num_ratings,
            target_items: config.grid_target_items,
            max_scrolls: config.grid_max_scrolls,
            max_rounds: config.max_sample_rounds,
            scroll_step: config.scroll_step_px,
            draws_per_round: 3,
        }
    }

    /// Sample the grid on the current page.
    ///
    /// Draws are uniform with replacement; a title is only ever evaluated
    /// once. Accepted titles have at least `min_num_ratings` ratings and a
    /// flat-rate offer. When the round budget or the grid runs out first,
    /// whatever was accepted so far is returned.
    #[allow(clippy::too_many_arguments)]
    pub async fn sample<R: Rng + Send>(
        &self,
        session: &dyn Session,
        adapter: &dyn SiteAdapter,
        normalizer: &Normalizer,
        country: &str,
        provider: &str,
        today: ReleaseDate,
        rng: &mut R,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        let pool: Vec<TitleLink> = self
            .load_grid(session, adapter)
            .await?
            .into_iter()
            .filter_map(|item| item.link)
            .collect();

        if pool.is_empty() {
            warn!("Empty catalog grid for {} / {}", country, provider);
            return Ok(Vec::new());
        }
        debug!("Sampling from {} titles", pool.len());

        let available = distinct(&pool);
        let mut evaluated: HashSet<TitleLink> = HashSet::new();
        let mut accepted: Vec<RawMovieRecord> = Vec::new();
        let mut rounds = 0;

        while accepted.len() < self.quota {
            if rounds >= self.max_rounds {
                warn!(
                    "Sampling budget of {} rounds spent with {} of {} titles for {} / {}",
                    self.max_rounds,
                    accepted.len(),
                    self.quota,
                    country,
                    provider
                );
                break;
            }
            if evaluated.len() >= available {
                warn!(
                    "Grid for {} / {} exhausted with {} of {} titles",
                    country,
                    provider,
                    accepted.len(),
                    self.quota
                );
                break;
            }
            rounds += 1;

            for _ in 0..self.draws_per_round {
                let link = &pool[rng.random_range(0..pool.len())];
                if evaluated.contains(link) {
                    continue;
                }

                let candidate = extract_details(session, adapter, link, today).await?;
                let keep = self.qualifies(&candidate);
                debug!(
                    "Candidate {:?} with {} ratings {}",
                    candidate.name.trim(),
                    candidate.popularity(),
                    if keep { "accepted" } else { "rejected" }
                );
                evaluated.insert(link.clone());

                if keep {
                    accepted.push(candidate);
                    if accepted.len() >= self.quota {
                        break;
                    }
                }
            }
        }

        info!(
            "Sampled {} titles for {} / {} in {} rounds",
            accepted.len(),
            country,
            provider,
            rounds
        );
        normalizer
            .normalize(session, &accepted, country, provider)
            .await
    }

    fn qualifies(&self, candidate: &RawMovieRecord) -> bool {
        candidate.popularity() >= self.min_num_ratings && !candidate.raw_streaming_links.is_empty()
    }

    /// Scroll down from the grid's last item until enough titles are loaded.
    async fn load_grid(
        &self,
        session: &dyn Session,
        adapter: &dyn SiteAdapter,
    ) -> Result<Vec<ListingItem>> {
        let mut items = read_page(session, |page| adapter.grid_items(page)).await?;
        let mut stalled = 0;

        for _ in 0..self.max_scrolls {
            if items.len() >= self.target_items || stalled >= STALLED_SCROLLS {
                break;
            }
            let Some(last) = items.last() else {
                break;
            };

            let before = items.len();
            if !session.scroll_by(&last.path, 0.0, self.scroll_step).await? {
                debug!("Grid anchor {} went stale", last.path);
            }
            items = read_page(session, |page| adapter.grid_items(page)).await?;

            if items.len() > before {
                stalled = 0;
            } else {
                stalled += 1;
            }
        }

        debug!("Loaded {} grid items", items.len());
        Ok(items)
    }
}

fn distinct(pool: &[TitleLink]) -> usize {
    let mut links: Vec<&TitleLink> = pool.iter().collect();
    links.sort();
    links.dedup();
    links.len()
}
