//! Query pipeline: per-URL scrape orchestration and the batch runner.

pub mod runner;
pub mod scrape;

pub use runner::{run_batch, DEFAULT_WORKERS};
pub use scrape::run_query;
