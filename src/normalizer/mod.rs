use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::app::Result;
use crate::crawler::{LinkResolver, Session};
use crate::domain::{CountryProviderCatalog, NormalizedMovieRecord, RawMovieRecord};

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid year regex"));
static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*)\)").expect("valid parenthesis regex"));

/// Tracking suffix the catalog appends to external rating links
const REFERRAL_SUFFIX: &str = "/?ref_=justwatch";

pub fn clean_name(name: &str) -> String {
    name.trim().to_string()
}

/// First four-digit run, e.g. `"(2021)"` → `2021`.
pub fn parse_release_year(text: &str) -> Option<i32> {
    YEAR.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn strip_referral(link: &str) -> String {
    link.replace(REFERRAL_SUFFIX, "")
}

/// Split `"8.4 (250k)"` into the score and the parenthesised rating volume.
pub fn split_rating(text: &str) -> (Option<f64>, Option<String>) {
    let num_ratings = PARENTHESISED
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|count| !count.is_empty());

    let score = PARENTHESISED
        .replace_all(text, "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite());

    (score, num_ratings)
}

/// `"120k"` → 120000, `"1.2m"` → 1200000. Anything unreadable is 0.
pub fn parse_popularity(compact: &str) -> u64 {
    let compact = compact.trim().to_lowercase().replace(',', "");
    let (digits, multiplier) = if let Some(digits) = compact.strip_suffix('k') {
        (digits, 1_000.0)
    } else if let Some(digits) = compact.strip_suffix('m') {
        (digits, 1_000_000.0)
    } else {
        (compact.as_str(), 1.0)
    };

    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * multiplier).round() as u64,
        _ => 0,
    }
}

/// First link on the provider's own domain, else the provider's landing page.
pub fn reduce_links(links: &[String], slug: &str, default_link: Option<&str>) -> Option<String> {
    links
        .iter()
        .find(|link| link.contains(slug))
        .cloned()
        .or_else(|| default_link.map(String::from))
}

/// Cleans raw detail records and picks one streaming link per title.
#[derive(Clone)]
pub struct Normalizer {
    catalog: CountryProviderCatalog,
    resolver: LinkResolver,
}

impl Normalizer {
    pub fn new(catalog: CountryProviderCatalog, resolver: LinkResolver) -> Self {
        Self { catalog, resolver }
    }

    /// Normalize `raw` for one (country, provider) pair.
    ///
    /// Records without any flat-rate link are dropped. Order is kept and
    /// nothing is deduplicated.
    pub async fn normalize(
        &self,
        session: &dyn Session,
        raw: &[RawMovieRecord],
        country: &str,
        provider: &str,
    ) -> Result<Vec<NormalizedMovieRecord>> {
        let slug = self.catalog.slug(provider)?;
        let default_link = self.catalog.default_link(country, provider);
        let mut records = Vec::with_capacity(raw.len());

        for record in raw {
            if record.raw_streaming_links.is_empty() {
                debug!("Skipping {:?}: no flat-rate offer", record.name.trim());
                continue;
            }

            let mut resolved = Vec::with_capacity(record.raw_streaming_links.len());
            for link in &record.raw_streaming_links {
                resolved.push(self.resolver.resolve(session, link).await?);
            }

            let canonical = reduce_links(&resolved, slug, default_link).unwrap_or_else(|| {
                warn!(
                    "No {} link for {:?} and no default link for {}",
                    provider,
                    record.name.trim(),
                    country
                );
                String::new()
            });

            records.push(normalize_fields(record, canonical, country, provider));
        }

        Ok(records)
    }
}

fn normalize_fields(
    raw: &RawMovieRecord,
    canonical_streaming_link: String,
    country: &str,
    provider: &str,
) -> NormalizedMovieRecord {
    let (external_rating_score, num_ratings) = split_rating(&raw.external_rating_text);

    NormalizedMovieRecord {
        date_added: raw.date_added,
        name: clean_name(&raw.name),
        release_year: parse_release_year(&raw.release_year_text),
        external_rating_link: strip_referral(&raw.external_rating_link),
        external_rating_score,
        num_ratings,
        runtime: raw.runtime_text.trim().to_string(),
        canonical_streaming_link,
        provider: provider.to_string(),
        country: country.to_string(),
    }
}
