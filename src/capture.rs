//! Point-in-time rasterization of the display region.

use crate::error::{PaintError, Result};
use crate::map::{FrameOrigin, MapRegion};
use crate::types::{ImageFormat, RasterImage};
use async_trait::async_trait;
use image::imageops::FilterType;
use std::io::Cursor;

/// Options for a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Allow pixels served by another host to be read back.
    pub allow_cross_origin: bool,
    /// Encoding of the produced image.
    pub format: ImageFormat,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            allow_cross_origin: true,
            format: ImageFormat::Png,
        }
    }
}

/// Trait for snapshot capabilities.
#[async_trait]
pub trait SnapshotCapturer: Send + Sync {
    /// Produces one still image of exactly what `region` shows right now.
    async fn capture(&self, region: &MapRegion, options: &CaptureOptions) -> Result<RasterImage>;
}

/// Rasterizes the region's current frame at the region's device-pixel size.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionRasterizer;

impl RegionRasterizer {
    /// Creates a rasterizer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotCapturer for RegionRasterizer {
    async fn capture(&self, region: &MapRegion, options: &CaptureOptions) -> Result<RasterImage> {
        if !region.is_mounted() {
            return Err(PaintError::Capture("display region is not mounted".into()));
        }
        let frame = region
            .frame()
            .ok_or_else(|| PaintError::Capture("nothing has been rendered yet".into()))?;

        if let FrameOrigin::CrossOrigin { ref host } = frame.origin {
            if !options.allow_cross_origin {
                return Err(PaintError::Capture(format!(
                    "content from {host} is cross-origin and cross-origin capture is disabled"
                )));
            }
        }

        let (width, height) = region.pixel_size();
        let format = options.format;
        let source = frame.image;

        let image = tokio::task::spawn_blocking(move || rasterize(&source, width, height, format))
            .await
            .map_err(|e| PaintError::Capture(format!("rasterizer task failed: {e}")))??;

        tracing::debug!(width, height, bytes = image.size(), "region captured");
        Ok(image)
    }
}

fn rasterize(
    source: &RasterImage,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<RasterImage> {
    let decoded = image::load_from_memory_with_format(&source.data, source.format.to_image_crate())
        .map_err(|e| PaintError::Capture(format!("frame could not be decoded: {e}")))?;

    let fitted = if decoded.width() == width && decoded.height() == height {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel.
    let fitted = match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(fitted.to_rgb8()),
        _ => fitted,
    };

    let mut buf = Cursor::new(Vec::new());
    fitted
        .write_to(&mut buf, format.to_image_crate())
        .map_err(|e| PaintError::Capture(format!("snapshot could not be encoded: {e}")))?;

    Ok(RasterImage::new(buf.into_inner(), format))
}
