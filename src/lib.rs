#![warn(missing_docs)]
//! Paint A Place - turn the satellite view of an address into a painting.
//!
//! The workflow is four capabilities sequenced by a [`ViewController`]:
//!
//! 1. an [`AddressResolver`] turns text into a [`Coordinate`],
//! 2. a [`MapRenderer`] draws satellite imagery into a [`MapRegion`],
//! 3. a [`SnapshotCapturer`] rasterizes that region,
//! 4. a [`PaintingGenerator`] turns the snapshot into a [`Painting`].
//!
//! Each capability is a trait, so any of them can be swapped or mocked.
//!
//! # Quick Start
//!
//! ```no_run
//! use paintaplace::{
//!     Capabilities, GeminiPainter, GoogleGeocoder, MapRegion, RegionRasterizer,
//!     StaticMapRenderer, ViewController,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> paintaplace::Result<()> {
//!     let caps = Capabilities {
//!         resolver: Arc::new(GoogleGeocoder::builder().build()?),
//!         renderer: Arc::new(StaticMapRenderer::builder().build()?),
//!         capturer: Arc::new(RegionRasterizer::new()),
//!         painter: Arc::new(GeminiPainter::builder().build()?),
//!     };
//!     let controller = ViewController::new(caps, MapRegion::new(640, 500));
//!
//!     controller.set_query("Seoul, South Korea");
//!     controller.search().await;
//!     controller.generate_painting().await;
//!
//!     if let Some(painting) = controller.painting() {
//!         painting.save("painting.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `google`: Google Geocoding/Places resolver and Static Maps renderer
//! - `gemini`: Gemini painting generator
//! - `cli`: the `paintaplace` command-line interface

mod error;

pub mod capture;
pub mod config;
pub mod controller;
pub mod map;
pub mod painting;
pub mod resolver;
pub mod session;
mod types;

// Re-export error types at crate root
pub use error::{sanitize_error_message, ErrorKind, PaintError, Result};

pub use capture::{CaptureOptions, RegionRasterizer, SnapshotCapturer};
pub use config::Config;
pub use controller::{ActionOutcome, Capabilities, UiState, ViewController, ViewModel};
pub use map::{MapOptions, MapRegion, MapRenderer, MapStyle, RenderHandle};
pub use painting::{PaintingGenerator, FOLK_PAINTING_INSTRUCTION};
pub use resolver::AddressResolver;
pub use types::{
    Coordinate, ImageFormat, Painting, PaintingMetadata, RasterImage, ResolvedPlace, Suggestion,
};

#[cfg(feature = "google")]
pub use map::{StaticMapRenderer, StaticMapRendererBuilder};
#[cfg(feature = "google")]
pub use resolver::{GoogleGeocoder, GoogleGeocoderBuilder};

#[cfg(feature = "gemini")]
pub use painting::{GeminiModel, GeminiPainter, GeminiPainterBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{PaintError, Result};
    pub use crate::{
        ActionOutcome, AddressResolver, Capabilities, MapRegion, MapRenderer, PaintingGenerator,
        SnapshotCapturer, ViewController,
    };

    #[cfg(feature = "google")]
    pub use crate::{GoogleGeocoder, StaticMapRenderer};

    #[cfg(feature = "gemini")]
    pub use crate::GeminiPainter;
}
