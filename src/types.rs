//! Core value types shared by every stage of the workflow.

use crate::error::{PaintError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A latitude/longitude pair identifying a point on Earth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `-90..=90`.
    pub lat: f64,
    /// Longitude in degrees, `-180..=180`.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PaintError::Validation(format!("latitude out of range: {lat}")));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(PaintError::Validation(format!("longitude out of range: {lng}")));
        }
        Ok(Self { lat, lng })
    }

    /// Formats as `lat,lng` the way map URLs expect it.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A location produced by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    /// Where the address points.
    pub coordinate: Coordinate,
    /// The provider's canonical address text, when it returns one.
    pub formatted_address: Option<String>,
}

impl ResolvedPlace {
    /// Creates a place without a formatted address.
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            formatted_address: None,
        }
    }

    /// Sets the formatted address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = Some(address.into());
        self
    }
}

/// An autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Provider identifier used to resolve the candidate.
    pub place_id: String,
    /// Human-readable description shown in the list.
    pub description: String,
}

/// Supported raster encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses a MIME type such as `image/png`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects the format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    pub(crate) fn to_image_crate(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

/// An encoded pixel-grid image held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Encoding of `data`.
    pub format: ImageFormat,
}

impl RasterImage {
    /// Wraps already-encoded bytes.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Wraps encoded bytes, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(&data)?;
        Some(Self::new(data, format))
    }

    /// Returns the size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Decodes the image and returns its pixel dimensions.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let img = image::load_from_memory_with_format(&self.data, self.format.to_image_crate())
            .ok()?;
        Some((img.width(), img.height()))
    }

    /// Saves the encoded bytes to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

/// Metadata about a painting generation round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintingMetadata {
    /// Model that produced the painting.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Text parts the model returned alongside the image.
    pub caption: Option<String>,
    /// Image parts returned beyond the first one (ignored).
    pub extra_images: usize,
}

/// A generated painting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated painting should be displayed or saved"]
pub struct Painting {
    /// The generated image.
    pub image: RasterImage,
    /// Generation metadata.
    pub metadata: PaintingMetadata,
}

impl Painting {
    /// Creates a painting from an image and its metadata.
    pub fn new(image: RasterImage, metadata: PaintingMetadata) -> Self {
        Self { image, metadata }
    }

    /// Saves the painting image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path)
    }
}
