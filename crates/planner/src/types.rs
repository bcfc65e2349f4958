use crate::config::PlannerConfig;
use crate::lookup::{LookupError, OpenSectionsClient, RatingClient};
use crate::schedule::ScheduleBuilder;
use crate::session::SessionStore;

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: PlannerConfig,
    pub builder: ScheduleBuilder,
    pub sessions: SessionStore,
    pub sections_client: OpenSectionsClient,
    pub rating_client: RatingClient,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// Fails only if an HTTP client or service URL can't be constructed.
    pub fn new(config: PlannerConfig) -> Result<Self, LookupError> {
        let timeout = config.request_timeout();

        Ok(Self {
            builder: ScheduleBuilder::new(config.build_options()),
            sessions: SessionStore::new(config.session_ttl()),
            sections_client: OpenSectionsClient::new(&config.open_sections_url, timeout)?,
            rating_client: RatingClient::new(config.rating_url.as_deref(), timeout)?,
            config,
        })
    }
}
