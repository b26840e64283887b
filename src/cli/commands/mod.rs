//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod ingest;
mod serve;
mod status;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::{run_add_youtube, run_upload};
pub use serve::run_serve;
pub use status::run_status;
