//! The polling loop that turns unseen lead notifications into CRM deals.

pub mod report;
pub mod runner;

pub use report::{CycleReport, MessageOutcome};
pub use runner::{IngestionLoop, DEFAULT_POLL_INTERVAL};
