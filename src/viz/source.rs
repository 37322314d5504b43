//! Image byte acquisition.
//!
//! An image reaches the viewer either as a fetchable http(s) locator or as
//! an inline base64 payload (with or without a `data:` URL prefix). Both
//! resolve to raw bytes here. Failure is not an error to the caller:
//! an unreadable source just means orientation scanning is skipped and the
//! image displays unrotated.

use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque reference to image bytes. Owned by the caller; the scanning
/// pipeline only borrows it to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Fetchable http(s) locator.
    Url(String),
    /// Inline base64 payload, `data:` URL or bare.
    Inline(String),
}

impl ImageSource {
    /// Classify a source string: http(s) schemes fetch, everything else is
    /// treated as inline base64.
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.starts_with("http://") || s.starts_with("https://") {
            ImageSource::Url(s)
        } else {
            ImageSource::Inline(s)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageSource::Url(s) | ImageSource::Inline(s) => s,
        }
    }
}

impl Serialize for ImageSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("empty image source"));
        }
        Ok(ImageSource::from_string(s))
    }
}

/// Decode an inline base64 payload to raw bytes.
///
/// Accepts both `data:image/jpeg;base64,...` and bare base64 strings
/// (everything after the first comma is the payload when a prefix is
/// present).
pub fn decode_inline(data: &str) -> Option<Vec<u8>> {
    let payload = match data.find(',') {
        Some(idx) => &data[idx + 1..],
        None => data,
    };
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}

/// Resolve an [`ImageSource`] to raw bytes.
///
/// Inline payloads decode in memory with no network. Remote locators issue
/// a GET; any transport error or non-success status yields `None` rather
/// than surfacing an error, so the caller's rotation falls back to 0.
pub async fn load_bytes(http: &reqwest::Client, source: &ImageSource) -> Option<Vec<u8>> {
    match source {
        ImageSource::Inline(data) => decode_inline(data),
        ImageSource::Url(url) => {
            let response = match http.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(url, error = %e, "image source fetch failed");
                    return None;
                }
            };
            if !response.status().is_success() {
                tracing::debug!(url, status = %response.status(), "image source unavailable");
                return None;
            }
            response.bytes().await.ok().map(|b| b.to_vec())
        }
    }
}
