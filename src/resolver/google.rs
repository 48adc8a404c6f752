//! Google Geocoding and Places resolver.

use crate::error::{sanitize_error_message, PaintError, Result};
use crate::resolver::{validate_address, AddressResolver};
use crate::types::{Coordinate, ResolvedPlace, Suggestion};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Builder for GoogleGeocoder.
#[derive(Debug, Clone, Default)]
pub struct GoogleGeocoderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    language: Option<String>,
}

impl GoogleGeocoderBuilder {
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

    /// Sets the language results are returned in (e.g. `ko`).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builds the resolver, resolving the API key.
    pub fn build(self) -> Result<GoogleGeocoder> {
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

        Ok(GoogleGeocoder {
            client: reqwest::Client::new(),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            language: self.language,
        })
    }
}

/// Resolves addresses with the Geocoding API and suggestions with Places
/// Autocomplete / Place Details.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    language: Option<String>,
}

impl GoogleGeocoder {
    /// Creates a new `GoogleGeocoderBuilder`.
    pub fn builder() -> GoogleGeocoderBuilder {
        GoogleGeocoderBuilder::new()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())]);
        if let Some(ref language) = self.language {
            request = request.query(&[("language", language.as_str())]);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PaintError::Service(format!(
                "HTTP {}: {}",
                status.as_u16(),
                sanitize_error_message(&text)
            )));
        }

        response.json::<T>().await.map_err(transport_error)
    }
}

#[async_trait]
impl AddressResolver for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<ResolvedPlace> {
        let query = validate_address(address)?;
        let start = Instant::now();
        tracing::debug!(query, "geocoding address");

        let response: GeocodeResponse = self
            .get_json("/maps/api/geocode/json", &[("address", query)])
            .await?;

        if response.status == "ZERO_RESULTS" {
            return Err(PaintError::NotFound {
                query: query.to_string(),
            });
        }
        api_status(&response.status, response.error_message.as_deref())?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PaintError::NotFound {
                query: query.to_string(),
            })?;

        let place = first.into_place()?;
        tracing::info!(
            query,
            coordinate = %place.coordinate,
            duration_ms = start.elapsed().as_millis() as u64,
            "address resolved"
        );
        Ok(place)
    }

    async fn suggest(&self, input: &str) -> Result<Vec<Suggestion>> {
        let input = validate_address(input)?;

        let response: AutocompleteResponse = self
            .get_json("/maps/api/place/autocomplete/json", &[("input", input)])
            .await?;

        if response.status == "ZERO_RESULTS" {
            return Ok(Vec::new());
        }
        api_status(&response.status, response.error_message.as_deref())?;

        let suggestions: Vec<Suggestion> = response
            .predictions
            .into_iter()
            .map(|p| Suggestion {
                place_id: p.place_id,
                description: p.description,
            })
            .collect();
        tracing::debug!(input, count = suggestions.len(), "suggestions received");
        Ok(suggestions)
    }

    async fn select(&self, suggestion: &Suggestion) -> Result<ResolvedPlace> {
        let response: DetailsResponse = self
            .get_json(
                "/maps/api/place/details/json",
                &[
                    ("place_id", suggestion.place_id.as_str()),
                    ("fields", "geometry,formatted_address"),
                ],
            )
            .await?;

        if matches!(response.status.as_str(), "ZERO_RESULTS" | "NOT_FOUND") {
            return Err(PaintError::NotFound {
                query: suggestion.description.clone(),
            });
        }
        api_status(&response.status, response.error_message.as_deref())?;

        let result = response.result.ok_or_else(|| PaintError::NotFound {
            query: suggestion.description.clone(),
        })?;
        let mut place = result.into_place()?;
        if place.formatted_address.is_none() {
            place.formatted_address = Some(suggestion.description.clone());
        }
        Ok(place)
    }

    fn name(&self) -> &str {
        "Google Geocoding"
    }
}

fn transport_error(e: reqwest::Error) -> PaintError {
    PaintError::Service(sanitize_error_message(&e.without_url().to_string()))
}

/// Maps a non-OK Google API status to a service error.
fn api_status(status: &str, message: Option<&str>) -> Result<()> {
    if status == "OK" {
        return Ok(());
    }
    let detail = message
        .map(sanitize_error_message)
        .unwrap_or_else(|| "no further detail".into());
    Err(PaintError::Service(format!("{status}: {detail}")))
}

// Response types
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: Geometry,
}

impl PlaceResult {
    fn into_place(self) -> Result<ResolvedPlace> {
        let LatLng { lat, lng } = self.geometry.location;
        let coordinate = Coordinate::new(lat, lng)
            .map_err(|e| PaintError::Service(format!("invalid coordinate in response: {e}")))?;
        Ok(ResolvedPlace {
            coordinate,
            formatted_address: self.formatted_address,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    description: String,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceResult>,
    #[serde(default)]
    error_message: Option<String>,
}
