//! UI state and its transitions.
//!
//! [`UiState::apply`] is the only way the state changes. It performs no I/O,
//! so every transition can be exercised without a display or a network.

use crate::resolver::BLANK_ADDRESS_MESSAGE;
use crate::types::{Painting, ResolvedPlace, Suggestion};

/// Progress of the search action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// Ready to accept a search.
    #[default]
    Idle,
    /// A search is in flight.
    Searching,
}

/// Availability of the generate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    /// No map has rendered yet.
    #[default]
    Unavailable,
    /// A map is shown and a painting may be requested.
    Ready,
    /// A painting is being generated.
    Generating,
}

/// Something that happened to the page.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The address text changed.
    QueryChanged(String),
    /// The search button was pressed.
    SearchRequested,
    /// Autocomplete candidates arrived.
    SuggestionsReceived(Vec<Suggestion>),
    /// Fetching autocomplete candidates failed.
    SuggestionsFailed(String),
    /// An autocomplete candidate was picked.
    SuggestionSelected(Suggestion),
    /// The location resolved and the map rendered.
    SearchSucceeded(ResolvedPlace),
    /// Resolving or rendering failed.
    SearchFailed(String),
    /// The generate button was pressed.
    GenerateRequested,
    /// A painting came back.
    GenerationSucceeded(Painting),
    /// Capturing or generating failed.
    GenerationFailed(String),
}

/// Why an event was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Search requested with a blank address.
    BlankQuery,
    /// A search is already in flight.
    SearchInFlight,
    /// Generation requested before any map rendered.
    MapNotReady,
    /// A generation is already in flight.
    GenerationInFlight,
    /// A completion arrived for an action that was not started.
    NotInFlight,
    /// The picked suggestion does not exist.
    UnknownSuggestion,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::BlankQuery => BLANK_ADDRESS_MESSAGE,
            Self::SearchInFlight => "a search is already running",
            Self::MapNotReady => "search for an address first",
            Self::GenerationInFlight => "a painting is already being created",
            Self::NotInFlight => "no matching action is running",
            Self::UnknownSuggestion => "no such suggestion",
        };
        f.write_str(text)
    }
}

/// Everything the page shows.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Address text as typed.
    pub query: String,
    /// Search progress.
    pub search: SearchStatus,
    /// Generate availability.
    pub generation: GenerationStatus,
    /// Status-area message.
    pub error: Option<String>,
    /// Last successfully rendered location.
    pub location: Option<ResolvedPlace>,
    /// Current autocomplete candidates.
    pub suggestions: Vec<Suggestion>,
    /// Last generated painting.
    pub painting: Option<Painting>,
}

impl UiState {
    /// Creates the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `event`, leaving the state unchanged when it is rejected.
    ///
    /// The one exception is [`Rejection::BlankQuery`], which sets the
    /// "Please enter an address." message.
    pub fn apply(&mut self, event: UiEvent) -> Result<(), Rejection> {
        match event {
            UiEvent::QueryChanged(text) => {
                self.query = text;
            }
            UiEvent::SearchRequested => {
                if self.search == SearchStatus::Searching {
                    return Err(Rejection::SearchInFlight);
                }
                if self.query.trim().is_empty() {
                    self.error = Some(BLANK_ADDRESS_MESSAGE.to_string());
                    return Err(Rejection::BlankQuery);
                }
                self.search = SearchStatus::Searching;
                self.error = None;
            }
            UiEvent::SuggestionsReceived(suggestions) => {
                self.suggestions = suggestions;
            }
            UiEvent::SuggestionsFailed(message) => {
                self.suggestions.clear();
                self.error = Some(message);
            }
            UiEvent::SuggestionSelected(suggestion) => {
                if self.search == SearchStatus::Searching {
                    return Err(Rejection::SearchInFlight);
                }
                self.query = suggestion.description;
                self.suggestions.clear();
                self.search = SearchStatus::Searching;
                self.error = None;
            }
            UiEvent::SearchSucceeded(place) => {
                if self.search != SearchStatus::Searching {
                    return Err(Rejection::NotInFlight);
                }
                self.search = SearchStatus::Idle;
                self.location = Some(place);
                if self.generation == GenerationStatus::Unavailable {
                    self.generation = GenerationStatus::Ready;
                }
            }
            UiEvent::SearchFailed(message) => {
                if self.search != SearchStatus::Searching {
                    return Err(Rejection::NotInFlight);
                }
                self.search = SearchStatus::Idle;
                self.error = Some(message);
            }
            UiEvent::GenerateRequested => match self.generation {
                GenerationStatus::Unavailable => return Err(Rejection::MapNotReady),
                GenerationStatus::Generating => return Err(Rejection::GenerationInFlight),
                GenerationStatus::Ready => {
                    self.generation = GenerationStatus::Generating;
                    self.error = None;
                }
            },
            UiEvent::GenerationSucceeded(painting) => {
                if self.generation != GenerationStatus::Generating {
                    return Err(Rejection::NotInFlight);
                }
                self.painting = Some(painting);
                self.generation = GenerationStatus::Ready;
            }
            UiEvent::GenerationFailed(message) => {
                if self.generation != GenerationStatus::Generating {
                    return Err(Rejection::NotInFlight);
                }
                self.error = Some(message);
                self.generation = GenerationStatus::Ready;
            }
        }
        Ok(())
    }

    /// True once a map has rendered.
    pub fn is_map_ready(&self) -> bool {
        self.generation != GenerationStatus::Unavailable
    }

    /// Whether the search control is enabled.
    pub fn can_search(&self) -> bool {
        self.search == SearchStatus::Idle
    }

    /// Whether the generate control is enabled.
    pub fn can_generate(&self) -> bool {
        self.generation == GenerationStatus::Ready
    }
}
