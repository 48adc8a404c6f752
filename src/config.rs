//! Environment-supplied configuration.

use crate::error::{PaintError, Result};
use crate::map::MAX_REGION_SIDE;
use std::env;

/// Credential for the mapping capability.
pub const MAPS_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";
/// Credential for the generative image capability.
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
/// Accepted in place of [`GEMINI_KEY_VAR`].
pub const GEMINI_KEY_FALLBACK_VAR: &str = "GOOGLE_API_KEY";
/// Gemini model identifier override.
pub const GEMINI_MODEL_VAR: &str = "PAINTAPLACE_GEMINI_MODEL";
/// Display region size override, `WxH`.
pub const REGION_VAR: &str = "PAINTAPLACE_REGION";

/// Default display region size, in logical pixels.
pub const DEFAULT_REGION: (u32, u32) = (640, 500);

/// Runtime configuration.
#[derive(Clone, Default)]
pub struct Config {
    /// Mapping service key.
    pub maps_api_key: Option<String>,
    /// Generative image service key.
    pub gemini_api_key: Option<String>,
    /// Gemini model identifier, when overridden.
    pub gemini_model: Option<String>,
    /// Display region size.
    pub region: Option<(u32, u32)>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<set>").unwrap_or("<unset>");
        f.debug_struct("Config")
            .field("maps_api_key", &mask(&self.maps_api_key))
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("region", &self.region)
            .finish()
    }
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let region = match get(REGION_VAR) {
            Some(raw) => Some(parse_region(&raw).ok_or_else(|| {
                PaintError::Config(format!(
                    "{REGION_VAR} must look like 640x500 with sides up to {MAX_REGION_SIDE}, got {raw:?}"
                ))
            })?),
            None => None,
        };

        Ok(Self {
            maps_api_key: get(MAPS_KEY_VAR),
            gemini_api_key: get(GEMINI_KEY_VAR).or_else(|| get(GEMINI_KEY_FALLBACK_VAR)),
            gemini_model: get(GEMINI_MODEL_VAR),
            region,
        })
    }

    /// Sets the mapping service key.
    pub fn with_maps_api_key(mut self, key: impl Into<String>) -> Self {
        self.maps_api_key = Some(key.into());
        self
    }

    /// Sets the generative image service key.
    pub fn with_gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Returns the display region size, or the default.
    pub fn region_size(&self) -> (u32, u32) {
        self.region.unwrap_or(DEFAULT_REGION)
    }

    /// Names of the credentials that are not configured.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.maps_api_key.is_none() {
            missing.push(MAPS_KEY_VAR);
        }
        if self.gemini_api_key.is_none() {
            missing.push(GEMINI_KEY_VAR);
        }
        missing
    }

    /// Fails with one error naming every missing credential.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            return Ok(());
        }
        Err(PaintError::Config(format!(
            "missing credential{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        )))
    }
}

/// Reads the Gemini key the same way [`Config::from_env`] does.
#[cfg_attr(not(feature = "gemini"), allow(dead_code))]
pub(crate) fn gemini_key_from_env() -> Option<String> {
    env::var(GEMINI_KEY_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env::var(GEMINI_KEY_FALLBACK_VAR).ok())
}

/// Parses `WxH` (e.g. `640x500`). Each side must be in `1..=MAX_REGION_SIDE`.
pub fn parse_region(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    let side = 1..=MAX_REGION_SIDE;
    (side.contains(&w) && side.contains(&h)).then_some((w, h))
}
