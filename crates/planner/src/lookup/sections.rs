//! HTTP client for the open-sections service.
//!
//! The service lists sections with open seats, either for the whole term or for
//! one course (`?subject=CPSC&number=131`). Responses are either a bare JSON
//! array or wrapped as `{"data": [...]}`; malformed entries are skipped.

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::error::LookupError;
use super::generate_correlation_id;
use crate::schedule::ClassSection;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SectionsBody {
    Wrapped {
        #[serde(default)]
        data: Vec<Value>,
    },
    Bare(Vec<Value>),
}

/// Decodes a sections payload, dropping entries that are not section records.
pub fn decode_sections(body: &str) -> Result<Vec<ClassSection>, LookupError> {
    let entries = match serde_json::from_str::<SectionsBody>(body)? {
        SectionsBody::Wrapped { data } => data,
        SectionsBody::Bare(data) => data,
    };

    let total = entries.len();
    let sections: Vec<ClassSection> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<ClassSection>(entry).ok())
        .filter(|section| !section.course_id.trim().is_empty())
        .map(|mut section| {
            section.course_id = normalize_course_id(&section.course_id);
            section
        })
        .collect();

    if sections.len() < total {
        debug!(
            skipped = total - sections.len(),
            "Skipped malformed section entries"
        );
    }

    Ok(sections)
}

/// Collapses whitespace and uppercases a course id ("cpsc  131 " -> "CPSC 131").
pub fn normalize_course_id(course_id: &str) -> String {
    course_id
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

/// Splits a course id into its subject and course number.
pub fn split_course_id(course_id: &str) -> Option<(&str, &str)> {
    let mut parts = course_id.split_whitespace();
    let subject = parts.next()?;
    let number = parts.next()?;
    Some((subject, number))
}

/// Open sections found for one still-needed course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAlternatives {
    pub course_id: String,
    pub sections: Vec<ClassSection>,
    /// True when the lookup failed and `sections` is empty for that reason
    pub lookup_failed: bool,
}

/// Client for the open-sections service.
pub struct OpenSectionsClient {
    client: Client,
    base_url: Url,
}

impl OpenSectionsClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Builds the lookup URL for one course.
    pub fn course_url(&self, subject: &str, number: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("subject", subject)
            .append_pair("number", number);
        url
    }

    /// Fetches every open section.
    pub async fn fetch_all(&self) -> Result<Vec<ClassSection>, LookupError> {
        let correlation_id = generate_correlation_id();
        self.fetch(self.base_url.clone(), &correlation_id).await
    }

    /// Fetches the open sections of one course.
    ///
    /// Sections of other courses in the response are discarded.
    pub async fn fetch_course(
        &self,
        subject: &str,
        number: &str,
    ) -> Result<Vec<ClassSection>, LookupError> {
        let correlation_id = generate_correlation_id();
        let wanted = normalize_course_id(&format!("{} {}", subject, number));

        let sections = self
            .fetch(self.course_url(subject, number), &correlation_id)
            .await?;

        Ok(sections
            .into_iter()
            .filter(|section| section.course_id == wanted)
            .collect())
    }

    /// Looks up alternatives for each remaining course concurrently.
    ///
    /// A failed lookup yields an empty list for that course.
    pub async fn alternatives_for(&self, remaining: &[String]) -> Vec<CourseAlternatives> {
        let lookups = remaining.iter().map(|course_id| async move {
            let Some((subject, number)) = split_course_id(course_id) else {
                warn!(course_id = %course_id, "Cannot split course id into subject and number");
                return CourseAlternatives {
                    course_id: course_id.clone(),
                    sections: Vec::new(),
                    lookup_failed: true,
                };
            };

            match self.fetch_course(subject, number).await {
                Ok(sections) => CourseAlternatives {
                    course_id: course_id.clone(),
                    sections,
                    lookup_failed: false,
                },
                Err(e) => {
                    warn!(course_id = %course_id, error = %e, "Open sections lookup failed");
                    CourseAlternatives {
                        course_id: course_id.clone(),
                        sections: Vec::new(),
                        lookup_failed: true,
                    }
                }
            }
        });

        join_all(lookups).await
    }

    async fn fetch(&self, url: Url, correlation_id: &str) -> Result<Vec<ClassSection>, LookupError> {
        let start = Instant::now();
        info!(
            correlation_id = %correlation_id,
            url = %url,
            "Fetching open sections"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let sections = decode_sections(&body)?;

        info!(
            correlation_id = %correlation_id,
            sections = sections.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched open sections"
        );

        Ok(sections)
    }
}
