use crate::config::HarvestConfig;
use crate::core::archiver::{create_archive, OutputDir};
use crate::core::extractor::{fetch_markup, parse_title, PageImageExtractor};
use crate::core::fetcher::ImageFetcher;
use crate::domain::model::{BatchReport, ExtractOutcome, PageJob, PageReport, PageStatus};
use crate::domain::ports::{Sleeper, TokioSleeper};
use crate::utils::error::{HarvestError, Result};
use crate::utils::sanitize::sanitize_filename;
use chrono::Utc;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Reads the URL list: one URL per line, surrounding whitespace trimmed,
/// blank lines dropped.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HarvestError::InputNotFound {
            path: path.display().to_string(),
        },
        _ => HarvestError::IoError(e),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Runs one page job per input URL, strictly in list order. A failing page
/// is recorded in the report and the batch moves on.
pub struct BatchOrchestrator {
    config: HarvestConfig,
    client: Client,
    extractor: PageImageExtractor,
}

impl BatchOrchestrator {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: HarvestConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let client = Client::builder().build()?;
        let fetcher = ImageFetcher::new(
            client.clone(),
            config.retry,
            config.image_timeout,
            sleeper,
        );
        let extractor = PageImageExtractor::new(client.clone(), config.page_timeout, fetcher);
        Ok(Self {
            config,
            client,
            extractor,
        })
    }

    /// Errors only when the run cannot start: unreadable URL list or an
    /// output root that cannot be created.
    pub async fn run(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        // nothing is created when the list is missing
        let urls = load_url_list(&self.config.input_path)?;
        std::fs::create_dir_all(&self.config.output_root)?;
        tracing::info!(
            "Loaded {} URLs from {}",
            urls.len(),
            self.config.input_path.display()
        );

        let mut pages = Vec::with_capacity(urls.len());
        for url in &urls {
            pages.push(self.process_page(url).await);
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            pages,
        };
        tracing::info!(
            "Finished {} pages: {} archived, {} without images, {} failed",
            report.pages.len(),
            report.archived(),
            report.skipped(),
            report.failed()
        );

        // a report that cannot be written does not fail the run
        if let Some(path) = &self.config.report_path {
            match write_report(&report, path) {
                Ok(()) => tracing::info!("Report written to {}", path.display()),
                Err(e) => tracing::error!("Could not write report {}: {}", path.display(), e),
            }
        }

        Ok(report)
    }

    /// Full page job for one URL. Never fails; problems end up in the
    /// returned status.
    pub async fn process_page(&self, url: &str) -> PageReport {
        tracing::info!("Processing: {}", url);
        let title = self.derive_title(url).await;
        let job = PageJob::new(url, title, &self.config.output_root);

        let status = match self.run_job(&job).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    "  Could not archive {}: {} ({})",
                    url,
                    e,
                    e.recovery_suggestion()
                );
                PageStatus::ArchiveFailed {
                    reason: e.to_string(),
                }
            }
        };

        PageReport {
            url: job.source_url,
            title: job.title,
            status,
        }
    }

    /// Sanitized page title, or the fallback title when the page cannot be
    /// fetched, has no `<title>`, or the title sanitizes to nothing.
    pub async fn derive_title(&self, url: &str) -> String {
        let markup = match fetch_markup(&self.client, url, self.config.title_timeout).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("  Error getting title for {}: {}", url, e);
                return self.config.fallback_title.clone();
            }
        };

        parse_title(&markup)
            .map(|title| sanitize_filename(&title))
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.config.fallback_title.clone())
    }

    async fn run_job(&self, job: &PageJob) -> Result<PageStatus> {
        let dir = OutputDir::acquire(&job.output_dir)?;

        match self.extractor.extract_images(&job.source_url, dir.path()).await {
            ExtractOutcome::Images { found, saved } => {
                // zip first; the directory only goes once the archive is in place
                let files = create_archive(dir.path(), &job.archive_path)?;
                tracing::info!(
                    "  Created {} ({} files)",
                    job.archive_path.display(),
                    files
                );
                dir.release()?;
                Ok(PageStatus::Archived {
                    archive: job.archive_path.clone(),
                    images_found: found,
                    images_saved: saved,
                })
            }
            ExtractOutcome::NoImages => {
                let kept = dir.retain();
                tracing::info!(
                    "  Skipping ZIP creation for {} (left {})",
                    job.source_url,
                    kept.display()
                );
                Ok(PageStatus::NoImages)
            }
            ExtractOutcome::PageFailed { reason } => {
                let kept = dir.retain();
                tracing::info!(
                    "  Skipping ZIP creation for {} (left {})",
                    job.source_url,
                    kept.display()
                );
                Ok(PageStatus::PageFailed { reason })
            }
        }
    }
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}
