//! Google Static Maps satellite renderer.

use crate::error::{sanitize_error_message, PaintError, Result};
use crate::map::{FrameOrigin, MapOptions, MapRegion, MapRenderer, RenderHandle, RenderedFrame};
use crate::types::{Coordinate, ImageFormat, RasterImage};
use async_trait::async_trait;
use std::time::{Instant, SystemTime};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Largest width/height the Static Maps API accepts per side.
const MAX_SIDE: u32 = 640;

/// Builder for StaticMapRenderer.
#[derive(Debug, Clone, Default)]
pub struct StaticMapRendererBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl StaticMapRendererBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_MAPS_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the service root (tests, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the renderer, resolving the API key.
    pub fn build(self) -> Result<StaticMapRenderer> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(crate::config::MAPS_KEY_VAR).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PaintError::Config(format!(
                    "{} not set and no API key provided",
                    crate::config::MAPS_KEY_VAR
                ))
            })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(StaticMapRenderer {
            client: reqwest::Client::new(),
            api_key,
            host: host_of(&base_url),
            base_url,
        })
    }
}

/// Renders satellite imagery through the Google Static Maps API.
///
/// The static API draws top-down imagery only; tilt and heading are kept on
/// the frame but not applied.
pub struct StaticMapRenderer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    host: String,
}

impl StaticMapRenderer {
    /// Creates a new `StaticMapRendererBuilder`.
    pub fn builder() -> StaticMapRendererBuilder {
        StaticMapRendererBuilder::new()
    }

    async fn fetch(
        &self,
        center: Coordinate,
        options: &MapOptions,
        (width, height): (u32, u32),
        scale: u32,
    ) -> Result<RasterImage> {
        let url = format!("{}/maps/api/staticmap", self.base_url);
        let (width, height) = request_size(width, height);
        let size = format!("{width}x{height}");

        tracing::debug!(center = %center, zoom = options.zoom, %size, scale, "requesting static map");
        if options.tilt != 0.0 || options.heading != 0.0 {
            tracing::debug!(
                tilt = options.tilt,
                heading = options.heading,
                "static imagery is top-down; tilt and heading not applied"
            );
        }

        let response = self
            .client
            .get(&url)
            .query(&[
                ("center", center.to_query_value()),
                ("zoom", options.zoom.to_string()),
                ("size", size),
                ("scale", scale.to_string()),
                ("maptype", options.style.as_str().to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| PaintError::Render(sanitize_error_message(&e.without_url().to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PaintError::Render(format!(
                "map service returned {}: {}",
                status.as_u16(),
                sanitize_error_message(&text)
            )));
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ImageFormat::from_mime_type);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaintError::Render(sanitize_error_message(&e.without_url().to_string())))?;

        let format = ImageFormat::from_magic_bytes(&bytes)
            .or(declared)
            .ok_or_else(|| PaintError::Render("map service returned no image data".into()))?;

        Ok(RasterImage::new(bytes.to_vec(), format))
    }
}

#[async_trait]
impl MapRenderer for StaticMapRenderer {
    async fn render(
        &self,
        region: &MapRegion,
        center: Coordinate,
        options: &MapOptions,
    ) -> Result<RenderHandle> {
        if !region.is_mounted() {
            return Err(PaintError::Render("display region is not mounted".into()));
        }

        let start = Instant::now();
        let image = self
            .fetch(center, options, region.size(), region.scale())
            .await?;

        let frame = RenderedFrame {
            image,
            center,
            options: options.clone(),
            origin: FrameOrigin::CrossOrigin {
                host: self.host.clone(),
            },
            rendered_at: SystemTime::now(),
        };

        let sequence = region
            .present(frame)
            .ok_or_else(|| PaintError::Render("display region was unmounted during render".into()))?;

        tracing::info!(
            center = %center,
            zoom = options.zoom,
            sequence,
            duration_ms = start.elapsed().as_millis() as u64,
            "map rendered"
        );

        Ok(RenderHandle {
            center,
            zoom: options.zoom,
            sequence,
        })
    }

    fn name(&self) -> &str {
        "Google Static Maps"
    }
}

/// Fits `width`x`height` inside the API limit, keeping the aspect ratio.
fn request_size(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_SIDE {
        return (width, height);
    }
    let (max, longest) = (u64::from(MAX_SIDE), u64::from(longest));
    // Rounded, never below one pixel.
    let fit = |side: u32| ((u64::from(side) * max + longest / 2) / longest).max(1) as u32;
    (fit(width), fit(height))
}

fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}
