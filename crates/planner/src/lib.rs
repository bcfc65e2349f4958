pub mod audit;
pub mod config;
pub mod lookup;
pub mod schedule;
pub mod server;
pub mod session;
pub mod types;
