use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    /// Zero-based position in document order.
    pub ordinal: usize,
}

impl ImageRef {
    /// `NNN` stem used for the saved file: `ordinal + 1`, three digits.
    pub fn file_stem(&self) -> String {
        format!("{:03}", self.ordinal + 1)
    }
}

/// The unit of work for one input URL.
#[derive(Debug, Clone)]
pub struct PageJob {
    pub source_url: String,
    pub title: String,
    pub output_dir: PathBuf,
    pub archive_path: PathBuf,
}

impl PageJob {
    pub fn new(source_url: &str, title: String, output_root: &std::path::Path) -> Self {
        Self {
            source_url: source_url.to_string(),
            output_dir: output_root.join(format!("{}_images", title)),
            archive_path: output_root.join(format!("{}.zip", title)),
            title,
        }
    }
}

/// What the Page Image Extractor reports for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The page had image references. `saved` may be lower than `found`
    /// when individual downloads exhausted their retries.
    Images { found: usize, saved: usize },
    NoImages,
    PageFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    Archived {
        archive: PathBuf,
        images_found: usize,
        images_saved: usize,
    },
    NoImages,
    PageFailed {
        reason: String,
    },
    ArchiveFailed {
        reason: String,
    },
}

impl PageStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PageStatus::PageFailed { .. } | PageStatus::ArchiveFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub status: PageStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages: Vec<PageReport>,
}

impl BatchReport {
    pub fn archived(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Archived { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::NoImages)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.pages.iter().filter(|p| p.status.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}
