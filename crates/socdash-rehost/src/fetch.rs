//! Bounded download of a remote image.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::RehostError;

/// A downloaded image that passed status, content-type and size checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    /// Lowercased MIME essence, e.g. `image/png` (parameters stripped).
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse `input` as an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`RehostError::InvalidUrl`] for anything else.
pub fn parse_image_url(input: &str) -> Result<Url, RehostError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| RehostError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(RehostError::InvalidUrl {
            input: input.to_string(),
            reason: format!("unsupported scheme {scheme:?}"),
        }),
    }
}

/// Fetch `url`, failing if the whole exchange takes longer than `timeout`.
///
/// The body is read chunk by chunk and abandoned as soon as it crosses
/// `max_bytes`. There are no retries.
///
/// # Errors
///
/// [`RehostError::Timeout`], [`RehostError::UpstreamStatus`],
/// [`RehostError::NotAnImage`], [`RehostError::TooLarge`], or
/// [`RehostError::Fetch`] for transport failures.
pub async fn fetch_image(
    client: &Client,
    url: &Url,
    timeout: Duration,
    max_bytes: u64,
) -> Result<FetchedImage, RehostError> {
    match tokio::time::timeout(timeout, download(client, url, max_bytes)).await {
        Ok(result) => result,
        Err(_) => Err(RehostError::Timeout { after: timeout }),
    }
}

async fn download(client: &Client, url: &Url, max_bytes: u64) -> Result<FetchedImage, RehostError> {
    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(RehostError::Fetch)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RehostError::UpstreamStatus {
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(mime_essence);
    let content_type = match content_type {
        Some(ct) if ct.starts_with("image/") => ct,
        other => return Err(RehostError::NotAnImage { content_type: other }),
    };

    if let Some(declared) = response.content_length() {
        if declared > max_bytes {
            return Err(RehostError::TooLarge {
                limit_bytes: max_bytes,
                actual_bytes: Some(declared),
            });
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(RehostError::Fetch)? {
        let received = u64::try_from(bytes.len() + chunk.len()).unwrap_or(u64::MAX);
        if received > max_bytes {
            return Err(RehostError::TooLarge {
                limit_bytes: max_bytes,
                actual_bytes: None,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(FetchedImage {
        content_type,
        bytes,
    })
}

fn mime_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension for an image MIME type; `bin` when nothing sensible fits.
#[must_use]
pub fn extension_for(content_type: &str) -> &str {
    match content_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/svg+xml" => "svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        other => other
            .strip_prefix("image/")
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}
