//! Professor rating lookups.
//!
//! Ratings are advisory display data and never influence scheduling. Results are
//! cached per professor name, and a circuit breaker stops hammering the rating
//! service while it is failing.

use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

use super::breaker::CircuitBreaker;
use super::error::LookupError;
use super::generate_correlation_id;

/// Rating information for one professor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorRating {
    pub professor_name: String,
    pub found: bool,
    #[serde(default)]
    pub overall_rating: Option<f64>,
    #[serde(default)]
    pub num_ratings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl ProfessorRating {
    pub fn not_found(professor_name: &str) -> Self {
        Self {
            professor_name: professor_name.to_string(),
            found: false,
            overall_rating: None,
            num_ratings: 0,
            rating_class: None,
            department: None,
        }
    }
}

/// Cache key: case- and whitespace-insensitive professor name.
fn cache_key(professor_name: &str) -> String {
    professor_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Client for the professor rating service.
pub struct RatingClient {
    client: Client,
    base_url: Option<Url>,
    cache: DashMap<String, (ProfessorRating, Instant)>,
    cache_ttl: Duration,
    circuit_breaker: CircuitBreaker,
}

impl RatingClient {
    /// Creates a client. Without a `base_url` every lookup fails with
    /// [`LookupError::NotConfigured`].
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.map(Url::parse).transpose()?,
            cache: DashMap::new(),
            cache_ttl: Duration::from_secs(6 * 60 * 60),
            circuit_breaker: CircuitBreaker::default(),
        })
    }

    /// Looks up a professor's rating, using the cache if possible.
    pub async fn rating(&self, professor_name: &str) -> Result<ProfessorRating, LookupError> {
        let name = professor_name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("TBA") || name.eq_ignore_ascii_case("Staff") {
            return Err(LookupError::InvalidRequest {
                message: "Professor name is required".to_string(),
            });
        }

        let key = cache_key(name);
        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let base_url = self.base_url.as_ref().ok_or(LookupError::NotConfigured {
            service: "professor rating",
        })?;
        self.circuit_breaker.check()?;

        let correlation_id = generate_correlation_id();
        let result = self.fetch(base_url, name, &correlation_id).await;
        self.circuit_breaker.record(&result);

        match &result {
            Ok(rating) => {
                self.cache.insert(key, (rating.clone(), Instant::now()));
            }
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Professor rating lookup failed"
                );
            }
        }

        result
    }

    /// Replaces the six-hour cache lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn cached(&self, key: &str) -> Option<ProfessorRating> {
        let entry = self.cache.get(key)?;
        if entry.1.elapsed() < self.cache_ttl {
            return Some(entry.0.clone());
        }

        drop(entry);
        self.cache.remove(key);
        None
    }

    /// Builds the lookup URL for one professor.
    pub fn rating_url(base_url: &Url, professor_name: &str) -> Result<Url, LookupError> {
        let mut url = base_url.join("professor/rating")?;
        url.query_pairs_mut()
            .append_pair("professor_name", professor_name);
        Ok(url)
    }

    async fn fetch(
        &self,
        base_url: &Url,
        professor_name: &str,
        correlation_id: &str,
    ) -> Result<ProfessorRating, LookupError> {
        let url = Self::rating_url(base_url, professor_name)?;
        info!(
            correlation_id = %correlation_id,
            url = %url,
            "Fetching professor rating"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.as_u16() == 404 {
            return Ok(ProfessorRating::not_found(professor_name));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Drops cached ratings older than the cache TTL and returns how many went.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.cache.len();
        self.cache
            .retain(|_, (_, fetched_at)| fetched_at.elapsed() < self.cache_ttl);
        before.saturating_sub(self.cache.len())
    }
}
