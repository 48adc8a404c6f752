//! Address resolution: free text or an autocomplete pick to a coordinate.

#[cfg(feature = "google")]
mod google;

#[cfg(feature = "google")]
pub use google::{GoogleGeocoder, GoogleGeocoderBuilder};

use crate::error::{PaintError, Result};
use crate::types::{ResolvedPlace, Suggestion};
use async_trait::async_trait;

/// Message shown when a search is submitted without an address.
pub const BLANK_ADDRESS_MESSAGE: &str = "Please enter an address.";

/// Trait for geocoding / places capabilities.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolves free-text address input.
    ///
    /// Fails with `NotFound` when nothing matches and `Service` on transport
    /// or API failure.
    async fn resolve(&self, address: &str) -> Result<ResolvedPlace>;

    /// Returns live candidates for partially typed input.
    async fn suggest(&self, input: &str) -> Result<Vec<Suggestion>>;

    /// Resolves a candidate previously returned by [`suggest`](Self::suggest).
    async fn select(&self, suggestion: &Suggestion) -> Result<ResolvedPlace>;

    /// Returns the name of this resolver for display.
    fn name(&self) -> &str;
}

/// Trims `input` and rejects it if nothing is left.
pub fn validate_address(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PaintError::Validation(BLANK_ADDRESS_MESSAGE.into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_inputs_are_rejected() {
        for input in ["", " ", "\t\n", "   \r\n  "] {
            let err = validate_address(input).unwrap_err();
            assert_eq!(err.to_string(), BLANK_ADDRESS_MESSAGE);
        }
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(
            validate_address("  Seoul, South Korea ").unwrap(),
            "Seoul, South Korea"
        );
    }
}
