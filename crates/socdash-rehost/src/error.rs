use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RehostError {
    #[error("Invalid URL provided")]
    InvalidUrl { input: String, reason: String },

    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Failed to fetch image: HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("URL does not point to an image")]
    NotAnImage { content_type: Option<String> },

    #[error("Image exceeds maximum size of {}", format_limit(*.limit_bytes))]
    TooLarge {
        limit_bytes: u64,
        actual_bytes: Option<u64>,
    },

    #[error("Failed to fetch image")]
    Fetch(#[source] reqwest::Error),

    #[error("Failed to store image")]
    Storage(#[from] StorageError),
}

impl RehostError {
    /// Extra context for the client-facing `details` field.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::InvalidUrl { input, reason } => Some(format!("{input:?}: {reason}")),
            Self::NotAnImage { content_type } => Some(format!(
                "content-type: {}",
                content_type.as_deref().unwrap_or("missing")
            )),
            Self::TooLarge {
                limit_bytes,
                actual_bytes: Some(actual),
            } => Some(format!("{actual} bytes exceeds the {limit_bytes} byte limit")),
            Self::TooLarge {
                limit_bytes,
                actual_bytes: None,
            } => Some(format!("body exceeded the {limit_bytes} byte limit")),
            Self::Fetch(e) => Some(e.to_string()),
            Self::Storage(e) => Some(e.to_string()),
            Self::Timeout { .. } | Self::UpstreamStatus { .. } => None,
        }
    }
}

/// Whole mebibyte limits read as `5MB`; anything else is spelled out in bytes.
fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes != 0 && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
