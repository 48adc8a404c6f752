//! Error types for the address-to-painting workflow.

/// Errors that can occur while resolving, rendering, capturing or painting.
///
/// Each external capability maps its transport failures into the variant
/// that names the call, so the view layer can surface one message per failure.
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    /// Input rejected before any external call was made.
    #[error("{0}")]
    Validation(String),

    /// The resolver found no location for the query.
    #[error("Could not find a location for \"{query}\".")]
    NotFound {
        /// The address text exactly as submitted.
        query: String,
    },

    /// Geocoding or places service failure.
    #[error("address lookup failed: {0}")]
    Service(String),

    /// The map could not be rendered into the display region.
    #[error("map rendering failed: {0}")]
    Render(String),

    /// The display region could not be rasterized.
    #[error("snapshot capture failed: {0}")]
    Capture(String),

    /// The generative image service failed.
    #[error("painting generation failed: {0}")]
    Generation(String),

    /// The generative service refused the request.
    #[error("painting blocked by the image service: {0}")]
    ContentBlocked(String),

    /// The generative service answered without an image payload.
    #[error("the image service returned no image{}", model_text_suffix(.text))]
    NoImageReturned {
        /// Any text the model returned instead of an image.
        text: Option<String>,
    },

    /// Missing or invalid configuration (e.g. an unset credential).
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (e.g., saving an image).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`PaintError`], convenient for matching in tests
/// and for structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`PaintError::Validation`].
    Validation,
    /// See [`PaintError::NotFound`].
    NotFound,
    /// See [`PaintError::Service`].
    Service,
    /// See [`PaintError::Render`].
    Render,
    /// See [`PaintError::Capture`].
    Capture,
    /// See [`PaintError::Generation`].
    Generation,
    /// See [`PaintError::ContentBlocked`].
    ContentBlocked,
    /// See [`PaintError::NoImageReturned`].
    NoImageReturned,
    /// See [`PaintError::Config`].
    Config,
    /// See [`PaintError::Io`].
    Io,
}

impl PaintError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Service(_) => ErrorKind::Service,
            Self::Render(_) => ErrorKind::Render,
            Self::Capture(_) => ErrorKind::Capture,
            Self::Generation(_) => ErrorKind::Generation,
            Self::ContentBlocked(_) => ErrorKind::ContentBlocked,
            Self::NoImageReturned { .. } => ErrorKind::NoImageReturned,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the single human-readable line shown in the status area.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

fn model_text_suffix(text: &Option<String>) -> String {
    match text {
        Some(t) => format!(" (it said: {t})"),
        None => String::new(),
    }
}

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, PaintError>;

/// Maximum length of an upstream error body kept in a message.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Cleans an upstream error body before it reaches logs or the UI.
///
/// Redacts `key=` query parameters (Google APIs take the API key in the URL),
/// collapses whitespace and truncates long bodies.
pub fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let redacted = redact_api_keys(&collapsed);

    if redacted.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = redacted.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}

fn redact_api_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("key=") {
        let boundary_ok = pos == 0
            || matches!(rest.as_bytes()[pos - 1], b'?' | b'&' | b' ' | b'"' | b'(');
        out.push_str(&rest[..pos + 4]);
        rest = &rest[pos + 4..];
        if boundary_ok {
            let end = rest
                .find(|c: char| c == '&' || c == ' ' || c == '"' || c == ')')
                .unwrap_or(rest.len());
            out.push_str("[REDACTED]");
            rest = &rest[end..];
        }
    }
    out.push_str(rest);
    out
}
