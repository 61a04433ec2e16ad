use anyhow::Result;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::EnrichmentConfig;
use crate::services::enrichment::{EnrichmentResult, MetadataProvider};

#[derive(Debug, Deserialize)]
struct TvSearchResponse {
    #[serde(default)]
    results: Vec<TvSearchHit>,
}

#[derive(Debug, Deserialize)]
struct TvSearchHit {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TvDetails {
    number_of_seasons: Option<i32>,
    number_of_episodes: Option<i32>,
}

/// TMDB client with a process-wide request budget. Lookups are advisory:
/// every failure mode (no key, exhausted budget, network error, bad status)
/// degrades to `Unavailable` instead of raising.
pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    #[must_use]
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_default();

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Self {
            client,
            api_key: config.resolved_api_key(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter,
        }
    }

    /// Two-step lookup: search for the series, then fetch its season and
    /// episode totals. One limiter token covers the pair.
    async fn lookup_series(&self, api_key: &str, query: &str) -> Result<EnrichmentResult> {
        let url = format!(
            "{}/search/tv?api_key={}&query={}",
            self.base_url,
            api_key,
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("TMDB API error: {}", response.status()));
        }

        let data: TvSearchResponse = response.json().await?;
        let Some(hit) = data.results.first() else {
            return Ok(EnrichmentResult::NotFound);
        };

        let url = format!("{}/tv/{}?api_key={}", self.base_url, hit.id, api_key);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("TMDB API error: {}", response.status()));
        }

        let details: TvDetails = response.json().await?;

        Ok(EnrichmentResult::Found {
            total_seasons: details.number_of_seasons,
            total_episodes: details.number_of_episodes,
        })
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn lookup(&self, query: &str) -> EnrichmentResult {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Skipping metadata lookup: no TMDB API key configured");
            return EnrichmentResult::Unavailable;
        };

        if self.limiter.check().is_err() {
            debug!(query = %query, "TMDB request budget exhausted, skipping lookup");
            return EnrichmentResult::Unavailable;
        }

        match self.lookup_series(api_key, query).await {
            Ok(result) => result,
            Err(e) => {
                debug!(query = %query, "TMDB lookup failed: {}", e);
                EnrichmentResult::Unavailable
            }
        }
    }
}
