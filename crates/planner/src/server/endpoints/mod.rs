pub mod professor;
pub mod schedule;
pub mod status;
