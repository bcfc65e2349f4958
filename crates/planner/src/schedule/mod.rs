//! Schedule construction.
//!
//! Everything in this module is synchronous and pure: callers hand in a fully
//! materialized pool of sections and a preferences snapshot and get back a new
//! [`ScheduleResult`], which they then own and may edit.

mod adjust;
mod builder;
pub mod conflict;
mod error;
pub mod filter;
pub mod sequence;
pub mod time;
mod types;

pub use adjust::AddOutcome;
pub use builder::{generate, BuildOptions, ScheduleBuilder, DEFAULT_PRIORITY_SUBJECTS};
pub use error::AdjustError;
pub use types::*;
