//! Image payload normalization
//!
//! Browser uploads and camera snapshots arrive as data URLs
//! (`data:image/jpeg;base64,...`). The model API expects the image as a
//! data URL too, but only for the formats it understands, so the prefix is
//! stripped, checked, and re-applied in a canonical form.

use crate::error::{RelayError, RelayResult};
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

/// Matches the data URL prefix of a supported image type
fn data_url_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|jpg|webp|gif);base64,")
            .expect("data URL prefix pattern is valid")
    })
}

/// Image formats accepted by the model API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    /// image/png
    Png,
    /// image/jpeg (also covers the non-standard image/jpg)
    Jpeg,
    /// image/webp
    Webp,
    /// image/gif
    Gif,
}

impl ImageMime {
    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// MIME type string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

/// A normalized image: its MIME type and bare base64 data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime: ImageMime,
    data: String,
}

impl ImagePayload {
    /// Parse an uploaded or captured image string
    ///
    /// A recognized `data:image/...;base64,` prefix is stripped exactly
    /// once. Strings with no `data:` prefix at all are taken as bare base64
    /// JPEG, which is what canvas snapshots without a header decode to.
    ///
    /// # Arguments
    ///
    /// * `input` - Data URL or bare base64 string
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidImage` for unsupported `data:` prefixes,
    /// empty data, or data that is not valid base64
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::image::{ImageMime, ImagePayload};
    ///
    /// let image = ImagePayload::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
    /// assert_eq!(image.mime(), ImageMime::Png);
    /// assert_eq!(image.data(), "aGVsbG8=");
    /// ```
    pub fn from_data_url(input: &str) -> RelayResult<Self> {
        let trimmed = input.trim();

        let (mime, rest) = match data_url_prefix().captures(trimmed) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let mime = caps
                    .get(1)
                    .and_then(|m| ImageMime::from_subtype(m.as_str()))
                    .unwrap_or(ImageMime::Jpeg);
                (mime, &trimmed[whole..])
            }
            None if trimmed.starts_with("data:") => {
                let header = trimmed.split(',').next().unwrap_or(trimmed);
                return Err(RelayError::InvalidImage(format!(
                    "Unsupported image type: {}",
                    header
                )));
            }
            None => (ImageMime::Jpeg, trimmed),
        };

        let data: String = rest.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if data.is_empty() {
            return Err(RelayError::InvalidImage("Image data is empty".to_string()));
        }

        base64::engine::general_purpose::STANDARD
            .decode(&data)
            .map_err(|e| RelayError::InvalidImage(format!("Image data is not valid base64: {}", e)))?;

        Ok(Self { mime, data })
    }

    /// MIME type of the image
    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    /// Bare base64 data with the prefix removed
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Re-wrap as the data URL the model API expects
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.data)
    }
}
