use crate::core::retry::{run_with_retry, RetryPolicy};
use crate::domain::model::ImageRef;
use crate::domain::ports::Sleeper;
use crate::utils::error::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Declared MIME type prefix to file extension. Checked in order.
pub const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
];

pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Extension of the last path segment of `image_url`, dot included.
pub fn url_extension(image_url: &str) -> Option<String> {
    let parsed = Url::parse(image_url).ok()?;
    let base_name = parsed.path_segments()?.next_back()?;
    Path::new(base_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
}

pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return DEFAULT_EXTENSION;
    };
    let content_type = content_type.trim().to_ascii_lowercase();
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| content_type.starts_with(mime))
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// The URL's own extension wins; the content type is only consulted when the
/// path has none.
pub fn resolve_extension(image_url: &str, content_type: Option<&str>) -> String {
    url_extension(image_url)
        .unwrap_or_else(|| extension_for_content_type(content_type).to_string())
}

/// Downloads single images into numbered files, retrying with backoff.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    policy: RetryPolicy,
    timeout: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl ImageFetcher {
    pub fn new(
        client: Client,
        policy: RetryPolicy,
        timeout: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            policy,
            timeout,
            sleeper,
        }
    }

    /// Saves `image` as `<NNN><ext>` inside `dest_dir`. Never errors: any
    /// failure that survives the retry policy is logged and reported as
    /// `false`.
    pub async fn fetch(&self, image: &ImageRef, dest_dir: &Path) -> bool {
        let result = run_with_retry(&self.policy, self.sleeper.as_ref(), &image.url, |_| {
            self.attempt(image, dest_dir)
        })
        .await;

        match result {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::info!("    Downloaded {}", name);
                true
            }
            Err(e) => {
                tracing::error!("    Giving up on {}: {}", image.url, e);
                false
            }
        }
    }

    async fn attempt(&self, image: &ImageRef, dest_dir: &Path) -> Result<PathBuf> {
        let mut response = self
            .client
            .get(&image.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        // extension from the URL, else from the content type
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let extension = resolve_extension(&image.url, content_type.as_deref());
        let file_name = format!("{}{}", image.file_stem(), extension);
        let final_path = dest_dir.join(&file_name);
        let part_path = dest_dir.join(format!("{}.part", file_name));

        tracing::debug!(
            "Writing {} (content-type {:?}) to {}",
            image.url,
            content_type,
            part_path.display()
        );

        // stream into .part, rename once the body is complete
        let written = match write_body(&mut response, &part_path).await {
            Ok(()) => tokio::fs::rename(&part_path, &final_path)
                .await
                .map_err(Into::into),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }

        Ok(final_path)
    }
}

async fn write_body(response: &mut Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
