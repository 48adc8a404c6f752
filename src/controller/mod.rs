//! The view controller: owns the UI state and sequences the capabilities.
//!
//! Two user actions drive everything. *Search* resolves the address and
//! renders the map; *generate* captures the map and asks for a painting.
//! Failures never escape as errors: they become the status message and the
//! page returns to an interactive state.

mod state;
mod view;

pub use state::{GenerationStatus, Rejection, SearchStatus, UiEvent, UiState};
pub use view::{
    ButtonView, MapView, PaintingView, ViewModel, MAP_PLACEHOLDER, PAINTING_HEADING, TAGLINE,
    TITLE,
};

use crate::capture::{CaptureOptions, SnapshotCapturer};
use crate::error::Result;
use crate::map::{MapOptions, MapRegion, MapRenderer};
use crate::painting::{PaintingGenerator, FOLK_PAINTING_INSTRUCTION};
use crate::resolver::AddressResolver;
use crate::types::{Painting, RasterImage, ResolvedPlace, Suggestion};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// The external capabilities the controller drives.
#[derive(Clone)]
pub struct Capabilities {
    /// Address lookup.
    pub resolver: Arc<dyn AddressResolver>,
    /// Map drawing.
    pub renderer: Arc<dyn MapRenderer>,
    /// Region rasterization.
    pub capturer: Arc<dyn SnapshotCapturer>,
    /// Painting generation.
    pub painter: Arc<dyn PaintingGenerator>,
}

/// Result of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran to completion.
    Completed,
    /// The action ran and failed; the message is also in the state.
    Failed(String),
    /// The action was not started.
    Rejected(Rejection),
}

impl ActionOutcome {
    /// True for [`ActionOutcome::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Owns the page state and runs the search and generate flows.
pub struct ViewController {
    caps: Capabilities,
    region: MapRegion,
    map_options: MapOptions,
    capture_options: CaptureOptions,
    instruction: String,
    state: Mutex<UiState>,
    last_snapshot: Mutex<Option<RasterImage>>,
}

impl ViewController {
    /// Creates a controller drawing into `region`.
    pub fn new(caps: Capabilities, region: MapRegion) -> Self {
        Self {
            caps,
            region,
            map_options: MapOptions::default(),
            capture_options: CaptureOptions::default(),
            instruction: FOLK_PAINTING_INSTRUCTION.to_string(),
            state: Mutex::new(UiState::new()),
            last_snapshot: Mutex::new(None),
        }
    }

    /// Overrides how the map is framed.
    pub fn with_map_options(mut self, options: MapOptions) -> Self {
        self.map_options = options;
        self
    }

    /// Overrides how snapshots are taken.
    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.capture_options = options;
        self
    }

    /// Overrides the painting instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, event: UiEvent) -> std::result::Result<(), Rejection> {
        self.lock().apply(event)
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> UiState {
        self.lock().clone()
    }

    /// Returns the page as it should be drawn now.
    pub fn view(&self) -> ViewModel {
        ViewModel::from(&*self.lock())
    }

    /// The region the map is drawn into.
    pub fn region(&self) -> &MapRegion {
        &self.region
    }

    /// The painting currently shown, if any.
    pub fn painting(&self) -> Option<Painting> {
        self.lock().painting.clone()
    }

    /// The snapshot most recently sent to the painter, if any.
    ///
    /// This is the exact buffer the last generation consumed, whether or not
    /// it produced a painting.
    pub fn last_snapshot(&self) -> Option<RasterImage> {
        self.last_snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Updates the address text.
    pub fn set_query(&self, text: impl Into<String>) {
        // QueryChanged is never rejected.
        let _ = self.apply(UiEvent::QueryChanged(text.into()));
    }

    /// Resolves the typed address and renders the map there.
    pub async fn search(&self) -> ActionOutcome {
        let query = {
            let mut state = self.lock();
            if let Err(rejection) = state.apply(UiEvent::SearchRequested) {
                tracing::warn!(%rejection, "search not started");
                return ActionOutcome::Rejected(rejection);
            }
            state.query.trim().to_string()
        };

        let start = Instant::now();
        let result = match self.caps.resolver.resolve(&query).await {
            Ok(place) => self.show(place).await,
            Err(e) => Err(e),
        };
        self.finish_search(result, start)
    }

    /// Fetches autocomplete candidates for the typed address.
    ///
    /// Blank input clears the list without a request.
    pub async fn refresh_suggestions(&self) -> ActionOutcome {
        let input = self.lock().query.trim().to_string();
        if input.is_empty() {
            let _ = self.apply(UiEvent::SuggestionsReceived(Vec::new()));
            return ActionOutcome::Completed;
        }

        match self.caps.resolver.suggest(&input).await {
            Ok(suggestions) => {
                let _ = self.apply(UiEvent::SuggestionsReceived(suggestions));
                ActionOutcome::Completed
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(error = %message, "suggestions failed");
                let _ = self.apply(UiEvent::SuggestionsFailed(message.clone()));
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Picks the `index`-th (zero-based) candidate and renders the map there.
    pub async fn select_suggestion(&self, index: usize) -> ActionOutcome {
        let suggestion: Suggestion = {
            let mut state = self.lock();
            let Some(suggestion) = state.suggestions.get(index).cloned() else {
                return ActionOutcome::Rejected(Rejection::UnknownSuggestion);
            };
            if let Err(rejection) = state.apply(UiEvent::SuggestionSelected(suggestion.clone())) {
                tracing::warn!(%rejection, "selection not started");
                return ActionOutcome::Rejected(rejection);
            }
            suggestion
        };

        let start = Instant::now();
        let result = match self.caps.resolver.select(&suggestion).await {
            Ok(place) => self.show(place).await,
            Err(e) => Err(e),
        };
        if let Some(address) = result.as_ref().ok().and_then(|p| p.formatted_address.clone()) {
            let _ = self.apply(UiEvent::QueryChanged(address));
        }
        self.finish_search(result, start)
    }

    async fn show(&self, place: ResolvedPlace) -> Result<ResolvedPlace> {
        self.caps
            .renderer
            .render(&self.region, place.coordinate, &self.map_options)
            .await?;
        Ok(place)
    }

    fn finish_search(&self, result: Result<ResolvedPlace>, start: Instant) -> ActionOutcome {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(place) => {
                tracing::info!(coordinate = %place.coordinate, elapsed_ms, "search complete");
                let _ = self.apply(UiEvent::SearchSucceeded(place));
                ActionOutcome::Completed
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(kind = ?e.kind(), error = %message, elapsed_ms, "search failed");
                let _ = self.apply(UiEvent::SearchFailed(message.clone()));
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Captures the map and replaces the painting with a new one.
    pub async fn generate_painting(&self) -> ActionOutcome {
        if let Err(rejection) = self.apply(UiEvent::GenerateRequested) {
            tracing::warn!(%rejection, "generation not started");
            return ActionOutcome::Rejected(rejection);
        }

        let start = Instant::now();
        let result = match self.snapshot().await {
            Ok(snapshot) => {
                *self.last_snapshot.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(snapshot.clone());
                self.caps
                    .painter
                    .generate(&snapshot, &self.instruction)
                    .await
            }
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(painting) => {
                tracing::info!(bytes = painting.image.size(), elapsed_ms, "painting ready");
                let _ = self.apply(UiEvent::GenerationSucceeded(painting));
                ActionOutcome::Completed
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(kind = ?e.kind(), error = %message, elapsed_ms, "generation failed");
                let _ = self.apply(UiEvent::GenerationFailed(message.clone()));
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Captures what the region shows right now.
    pub async fn snapshot(&self) -> Result<RasterImage> {
        self.caps
            .capturer
            .capture(&self.region, &self.capture_options)
            .await
    }
}
