#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::retry::RetryPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_timeout,
    Validate,
};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::FileConfig;

pub const DEFAULT_INPUT: &str = "web.txt";
pub const DEFAULT_FALLBACK_TITLE: &str = "untitled";

/// Everything a batch run needs, resolved before the first request is made.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    pub input_path: PathBuf,
    pub output_root: PathBuf,
    /// Timeout of the page fetch that feeds image extraction.
    pub page_timeout: Duration,
    /// Timeout of the separate page fetch used to read the title.
    pub title_timeout: Duration,
    /// Per attempt.
    pub image_timeout: Duration,
    pub fallback_title: String,
    pub retry: RetryPolicy,
    pub report_path: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_root: PathBuf::from("."),
            page_timeout: Duration::from_secs(10),
            title_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(30),
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            retry: RetryPolicy::default(),
            report_path: None,
        }
    }
}

impl HarvestConfig {
    /// Overlays the values present in a config file.
    pub fn with_file(mut self, file: FileConfig) -> Self {
        if let Some(input) = file.input {
            self.input_path = input;
        }
        if let Some(output_dir) = file.output_dir {
            self.output_root = output_dir;
        }
        if let Some(secs) = file.page_timeout_secs {
            self.page_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.title_timeout_secs {
            self.title_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.image_timeout_secs {
            self.image_timeout = Duration::from_secs(secs);
        }
        if file.report.is_some() {
            self.report_path = file.report;
        }
        self
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input_path.to_string_lossy())?;
        validate_path("output_dir", &self.output_root.to_string_lossy())?;
        validate_timeout("page_timeout", self.page_timeout)?;
        validate_timeout("title_timeout", self.title_timeout)?;
        validate_timeout("image_timeout", self.image_timeout)?;
        validate_positive_number("max_attempts", self.retry.max_attempts, 1)?;
        validate_non_empty_string("fallback_title", &self.fallback_title)?;
        if let Some(report) = &self.report_path {
            validate_path("report", &report.to_string_lossy())?;
        }
        Ok(())
    }
}
