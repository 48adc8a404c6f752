//! Gemini (Google) painting generator.

use crate::error::{sanitize_error_message, PaintError, Result};
use crate::painting::PaintingGenerator;
use crate::types::{ImageFormat, Painting, PaintingMetadata, RasterImage};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini image model variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
            Self::Custom(id) => id,
        }
    }

    /// Maps a model identifier to a variant.
    pub fn from_id(id: &str) -> Self {
        match id {
            "gemini-2.5-flash-image" => Self::FlashImage,
            "gemini-3-pro-image-preview" => Self::ProImage,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for GeminiPainter.
#[derive(Debug, Clone, Default)]
pub struct GeminiPainterBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiPainterBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the service root (tests, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the generator, resolving the API key.
    pub fn build(self) -> Result<GeminiPainter> {
        let api_key = self
            .api_key
            .or_else(crate::config::gemini_key_from_env)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PaintError::Config(format!(
                    "{} not set and no API key provided",
                    crate::config::GEMINI_KEY_VAR
                ))
            })?;

        Ok(GeminiPainter {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Turns a snapshot into a painting with Gemini `generateContent`.
pub struct GeminiPainter {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiPainter {
    /// Creates a new `GeminiPainterBuilder`.
    pub fn builder() -> GeminiPainterBuilder {
        GeminiPainterBuilder::new()
    }

    async fn generate_impl(&self, image: &RasterImage, instruction: &str) -> Result<Painting> {
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::new(instruction, image);
        tracing::debug!(model = self.model.as_str(), bytes = image.size(), "submitting snapshot");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PaintError::Generation(sanitize_error_message(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| PaintError::Generation(format!("unreadable response: {e}")))?;

        let (image, caption, extra_images) = extract_image(gemini_response)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        if extra_images > 0 {
            tracing::debug!(extra_images, "ignoring additional image parts");
        }
        tracing::info!(
            model = self.model.as_str(),
            bytes = image.size(),
            duration_ms,
            "painting generated"
        );

        Ok(Painting::new(
            image,
            PaintingMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
                caption,
                extra_images,
            },
        ))
    }
}

#[async_trait]
impl PaintingGenerator for GeminiPainter {
    async fn generate(&self, image: &RasterImage, instruction: &str) -> Result<Painting> {
        self.generate_impl(image, instruction).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

fn parse_error(status: u16, text: &str) -> PaintError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => PaintError::Generation(format!("authentication failed ({status}): {text}")),
        404 => PaintError::Generation("model not found; verify the model name".into()),
        429 => PaintError::Generation("rate limited by the image service; try again later".into()),
        _ => {
            let lower = text.to_lowercase();
            if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
                PaintError::ContentBlocked(text)
            } else {
                PaintError::Generation(format!("HTTP {status}: {text}"))
            }
        }
    }
}

/// Picks the first inline image out of a response.
///
/// Returns the image, any text parts joined, and how many further image parts
/// were dropped.
fn extract_image(response: GeminiResponse) -> Result<(RasterImage, Option<String>, usize)> {
    // Prompt blocks come back as HTTP 200.
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(PaintError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(PaintError::NoImageReturned { text: None })?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(PaintError::ContentBlocked(format!(
                    "blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            _ => {} // STOP, MAX_TOKENS, NO_IMAGE etc. fall through to the part check
        }
    }

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let texts: Vec<String> = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    let caption = (!texts.is_empty()).then(|| texts.join("\n"));

    let mut inline = parts.into_iter().filter_map(|p| p.inline_data);
    let Some(first) = inline.next() else {
        return Err(PaintError::NoImageReturned { text: caption });
    };
    let extra_images = inline.count();

    let data = base64::engine::general_purpose::STANDARD
        .decode(first.data.trim())
        .map_err(|e| PaintError::Generation(format!("image payload is not valid base64: {e}")))?;

    let format = ImageFormat::from_magic_bytes(&data)
        .or_else(|| ImageFormat::from_mime_type(&first.mime_type))
        .unwrap_or_default();

    Ok((RasterImage::new(data, format), caption, extra_images))
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(instruction: &str, image: &RasterImage) -> Self {
        let parts = vec![
            GeminiRequestPart::Text {
                text: instruction.to_string(),
            },
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.format.mime_type().to_string(),
                    data: image.to_base64(),
                },
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}
