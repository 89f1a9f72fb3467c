use crate::core::fetcher::ImageFetcher;
use crate::domain::model::{ExtractOutcome, ImageRef};
use crate::utils::error::Result;
use crate::utils::validation::validate_url;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));
static CHARSET_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)charset\s*=\s*["']?\s*([a-z0-9_.:-]+)"#).expect("charset pattern")
});
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:-]+)"#)
        .expect("meta charset pattern")
});

// Declarations after this many bytes are not looked for.
const META_SNIFF_LIMIT: usize = 1024;

/// GETs `url` once with `timeout`; any non-2xx status is an error.
pub async fn fetch_markup(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;
    Ok(decode_markup(&bytes, content_type.as_deref()))
}

/// Decodes a page body. A BOM wins, then the `Content-Type` charset, then a
/// `<meta>` declaration near the top, then UTF-8. Unknown labels are skipped.
pub fn decode_markup(bytes: &[u8], content_type: Option<&str>) -> String {
    let from_header = content_type.and_then(|ct| charset_label(&CHARSET_PARAM, ct.as_bytes()));
    let from_meta = || charset_label(&META_CHARSET, &bytes[..bytes.len().min(META_SNIFF_LIMIT)]);
    let encoding = from_header.or_else(from_meta).unwrap_or(UTF_8);

    // decode() sniffs the BOM itself and lets it override `encoding`
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Replaced malformed {} sequences in page body", used.name());
    }
    text.into_owned()
}

fn charset_label(pattern: &Regex, haystack: &[u8]) -> Option<&'static Encoding> {
    let label = pattern.captures(haystack)?.get(1)?.as_bytes();
    Encoding::for_label(label)
}

/// Non-empty `src` values of every `<img>`, in document order.
pub fn parse_image_sources(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let sources: Vec<String> = doc
        .select(&IMG_SELECTOR)
        .filter_map(|e| e.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(|s| s.to_string())
        .collect();

    tracing::debug!("HTML parser found {} image sources", sources.len());
    sources
}

/// Trimmed text of the first `<title>` element, if there is one.
pub fn parse_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
}

/// Resolves sources against the page URL. Ordinals follow the resolved list,
/// so a source that cannot be joined does not leave a gap.
pub fn resolve_image_refs(page_url: &Url, sources: &[String]) -> Vec<ImageRef> {
    sources
        .iter()
        .filter_map(|src| match page_url.join(src) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(e) => {
                tracing::warn!("  Skipping unresolvable image source {:?}: {}", src, e);
                None
            }
        })
        .enumerate()
        .map(|(ordinal, url)| ImageRef { url, ordinal })
        .collect()
}

pub struct PageImageExtractor {
    client: Client,
    page_timeout: Duration,
    fetcher: ImageFetcher,
}

impl PageImageExtractor {
    pub fn new(client: Client, page_timeout: Duration, fetcher: ImageFetcher) -> Self {
        Self {
            client,
            page_timeout,
            fetcher,
        }
    }

    /// Fetches the page once and downloads each image in order into
    /// `output_dir`. Only a failure to get the page itself is a page failure;
    /// individual images that fail are counted, not surfaced.
    pub async fn extract_images(&self, page_url: &str, output_dir: &Path) -> ExtractOutcome {
        let images = match self.collect_images(page_url).await {
            Ok(images) => images,
            Err(e) => {
                tracing::error!("  Error accessing {}: {}", page_url, e);
                return ExtractOutcome::PageFailed {
                    reason: e.to_string(),
                };
            }
        };

        if images.is_empty() {
            tracing::info!("  No images found on {}", page_url);
            return ExtractOutcome::NoImages;
        }

        tracing::info!("  Found {} images on {}", images.len(), page_url);

        // one at a time, in document order
        let mut saved = 0;
        for image in &images {
            if self.fetcher.fetch(image, output_dir).await {
                saved += 1;
            }
        }
        if saved < images.len() {
            tracing::warn!(
                "  {} of {} images could not be downloaded from {}",
                images.len() - saved,
                images.len(),
                page_url
            );
        }

        ExtractOutcome::Images {
            found: images.len(),
            saved,
        }
    }

    async fn collect_images(&self, page_url: &str) -> Result<Vec<ImageRef>> {
        let base = validate_url("page_url", page_url)?;
        let markup = fetch_markup(&self.client, page_url, self.page_timeout).await?;
        let sources = parse_image_sources(&markup);
        // relative sources resolve against the page URL
        Ok(resolve_image_refs(&base, &sources))
    }
}
