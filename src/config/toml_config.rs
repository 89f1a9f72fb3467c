use crate::utils::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional settings file. Every key may be omitted.
///
/// ```toml
/// input = "lists/galleries.txt"
/// output_dir = "archives"
/// page_timeout_secs = 10
/// title_timeout_secs = 10
/// image_timeout_secs = 30
/// report = "archives/report.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub page_timeout_secs: Option<u64>,
    pub title_timeout_secs: Option<u64>,
    pub image_timeout_secs: Option<u64>,
    pub report: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| HarvestError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
