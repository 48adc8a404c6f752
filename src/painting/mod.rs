//! Painting generation from a captured map snapshot.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiModel, GeminiPainter, GeminiPainterBuilder};

use crate::error::Result;
use crate::types::{Painting, RasterImage};
use async_trait::async_trait;

/// Instruction sent along with every snapshot.
pub const FOLK_PAINTING_INSTRUCTION: &str = "Transform this building's image into a traditional \
Korean Minhwa painting. Use bold outlines and vibrant, flat colors. Add a tiny signature that \
says \"Gemini\"";

/// Trait for generative image capabilities.
///
/// One blocking round trip per call; failures are terminal for the attempt.
#[async_trait]
pub trait PaintingGenerator: Send + Sync {
    /// Generates a new image from `image` following `instruction`.
    async fn generate(&self, image: &RasterImage, instruction: &str) -> Result<Painting>;

    /// Returns the name of this generator for display.
    fn name(&self) -> &str;
}
