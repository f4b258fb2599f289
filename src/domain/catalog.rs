use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::{ReelError, Result};

/// URLs for one (country, provider) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// "Recently added" timeline page
    pub new_releases_url: String,
    /// Listing sorted by external rating
    pub top_rated_url: String,
    /// Landing page used when no streaming link matches the provider slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_link: Option<String>,
}

impl CatalogEntry {
    pub fn new(new_releases_url: &str, top_rated_url: &str, default_link: Option<&str>) -> Self {
        Self {
            new_releases_url: new_releases_url.to_string(),
            top_rated_url: top_rated_url.to_string(),
            default_link: default_link.map(String::from),
        }
    }
}

/// Static (country, provider) mapping. Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryProviderCatalog {
    /// provider → URL slug used to recognise its streaming links
    pub slugs: BTreeMap<String, String>,
    /// country → provider → entry
    pub countries: BTreeMap<String, BTreeMap<String, CatalogEntry>>,
}

impl CountryProviderCatalog {
    pub fn entry(&self, country: &str, provider: &str) -> Result<&CatalogEntry> {
        self.countries
            .get(country)
            .and_then(|providers| providers.get(provider))
            .ok_or_else(|| {
                ReelError::Catalog(format!("No catalog entry for {} / {}", country, provider))
            })
    }

    pub fn slug(&self, provider: &str) -> Result<&str> {
        self.slugs
            .get(provider)
            .map(String::as_str)
            .ok_or_else(|| ReelError::Catalog(format!("No URL slug for provider {}", provider)))
    }

    pub fn default_link(&self, country: &str, provider: &str) -> Option<&str> {
        self.countries
            .get(country)
            .and_then(|providers| providers.get(provider))
            .and_then(|entry| entry.default_link.as_deref())
    }

    pub fn insert(&mut self, country: &str, provider: &str, entry: CatalogEntry) {
        self.countries
            .entry(country.to_string())
            .or_default()
            .insert(provider.to_string(), entry);
    }
}

impl Default for CountryProviderCatalog {
    fn default() -> Self {
        let mut catalog = Self {
            slugs: BTreeMap::new(),
            countries: BTreeMap::new(),
        };

        for (provider, slug) in [
            ("Netflix", "netflix"),
            ("Amazon Prime Video", "amazon"),
            ("Disney Plus", "disneyplus"),
            ("Apple TV+", "apple"),
        ] {
            catalog.slugs.insert(provider.to_string(), slug.to_string());
        }

        // (country, path prefix, provider segment, "new/movies", "movies", defaults)
        let regions = [
            (
                "Germany",
                "de/Anbieter",
                "Neu/Filme",
                "Filme",
                [
                    "https://www.netflix.com/browse",
                    "https://www.amazon.de/gp/video/storefront/",
                    "https://www.disneyplus.com/de-de",
                    "https://www.apple.com/de/apple-tv-plus/",
                ],
            ),
            (
                "United States",
                "us/provider",
                "new/movies",
                "movies",
                [
                    "https://www.netflix.com/browse",
                    "https://www.amazon.com/gp/video/storefront/",
                    "https://www.disneyplus.com/en-us",
                    "https://www.apple.com/apple-tv-plus/",
                ],
            ),
            (
                "United Kingdom",
                "uk/provider",
                "new/movies",
                "movies",
                [
                    "https://www.netflix.com/browse",
                    "https://www.amazon.co.uk/gp/video/storefront/",
                    "https://www.disneyplus.com/en-gb",
                    "https://www.apple.com/uk/apple-tv-plus/",
                ],
            ),
        ];

        let providers = [
            ("Netflix", "netflix"),
            ("Amazon Prime Video", "amazon-prime-video"),
            ("Disney Plus", "disney-plus"),
            ("Apple TV+", "apple-tv-plus"),
        ];

        for (country, prefix, new_path, top_path, defaults) in regions {
            for ((provider, segment), default_link) in providers.iter().zip(defaults) {
                let base = format!("https://www.justwatch.com/{}/{}", prefix, segment);
                catalog.insert(
                    country,
                    provider,
                    CatalogEntry::new(
                        &format!("{}/{}", base, new_path),
                        &format!("{}/{}?sort_by=imdb_score", base, top_path),
                        Some(default_link),
                    ),
                );
            }
        }

        catalog
    }
}
