//! Map rendering into a display region.

mod region;
#[cfg(feature = "google")]
mod static_maps;

pub use region::{FrameOrigin, MapRegion, RenderedFrame, MAX_REGION_SIDE};
#[cfg(feature = "google")]
pub use static_maps::{StaticMapRenderer, StaticMapRendererBuilder};

use crate::error::Result;
use crate::types::Coordinate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Base map imagery style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    /// Aerial imagery.
    #[default]
    Satellite,
    /// Aerial imagery with road and label overlays.
    Hybrid,
    /// Standard road map.
    Roadmap,
}

impl MapStyle {
    /// Returns the map type identifier used by map services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satellite => "satellite",
            Self::Hybrid => "hybrid",
            Self::Roadmap => "roadmap",
        }
    }
}

/// On-map controls shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapControls {
    /// Street view pegman.
    pub street_view: bool,
    /// Map type switcher.
    pub map_type: bool,
    /// Fullscreen toggle.
    pub fullscreen: bool,
    /// Zoom buttons.
    pub zoom: bool,
}

impl MapControls {
    /// Only the zoom control.
    pub const MINIMAL: Self = Self {
        street_view: false,
        map_type: false,
        fullscreen: false,
        zoom: true,
    };
}

impl Default for MapControls {
    fn default() -> Self {
        Self::MINIMAL
    }
}

/// How the map is framed around its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    /// Zoom level (0 = whole world, 21 = single building).
    pub zoom: u8,
    /// Camera tilt in degrees from straight down.
    pub tilt: f64,
    /// Camera heading in degrees clockwise from north.
    pub heading: f64,
    /// Imagery style.
    pub style: MapStyle,
    /// Visible controls.
    pub controls: MapControls,
    /// Vendor map style identifier, if any.
    pub map_id: Option<String>,
}

/// Highest zoom level satellite imagery is served at.
pub const MAX_ZOOM: u8 = 21;

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom: 20,
            tilt: 67.5,
            heading: 0.0,
            style: MapStyle::Satellite,
            controls: MapControls::MINIMAL,
            map_id: Some("DEMO_MAP_ID".to_string()),
        }
    }
}

impl MapOptions {
    /// Sets the zoom level, clamped to [`MAX_ZOOM`].
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom.min(MAX_ZOOM);
        self
    }

    /// Sets the imagery style.
    pub fn with_style(mut self, style: MapStyle) -> Self {
        self.style = style;
        self
    }
}

/// Receipt for a completed render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderHandle {
    /// Center of the rendered view.
    pub center: Coordinate,
    /// Zoom of the rendered view.
    pub zoom: u8,
    /// Sequence number of the frame now shown in the region.
    pub sequence: u64,
}

/// Trait for map rendering capabilities.
#[async_trait]
pub trait MapRenderer: Send + Sync {
    /// Renders a map centered on `center` into `region`, replacing whatever
    /// the region showed before.
    ///
    /// Fails with [`PaintError::Render`](crate::PaintError::Render) when the
    /// region is not mounted.
    async fn render(
        &self,
        region: &MapRegion,
        center: Coordinate,
        options: &MapOptions,
    ) -> Result<RenderHandle>;

    /// Returns the name of this renderer for display.
    fn name(&self) -> &str;
}
