pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;
pub use crate::config::HarvestConfig;

pub use crate::core::archiver::{create_archive, OutputDir};
pub use crate::core::batch::{load_url_list, BatchOrchestrator};
pub use crate::core::extractor::PageImageExtractor;
pub use crate::core::fetcher::ImageFetcher;
pub use crate::core::retry::{RetryPolicy, RetryState};
pub use crate::domain::model::{BatchReport, PageReport, PageStatus};
pub use crate::domain::ports::{Sleeper, TokioSleeper};
pub use crate::utils::error::{HarvestError, Result};
pub use crate::utils::sanitize::sanitize_filename;
