//! Clients for the services the planner consults outside the scheduling core.

mod breaker;
mod error;
mod rating;
mod sections;

pub use breaker::CircuitBreaker;
pub use error::LookupError;
pub use rating::{ProfessorRating, RatingClient};
pub use sections::{
    decode_sections, normalize_course_id, split_course_id, CourseAlternatives, OpenSectionsClient,
};

use rand::Rng;

/// Generates a unique correlation ID for request tracing.
pub(crate) fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
