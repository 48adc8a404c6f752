//! Text projection of the UI state.

use crate::controller::state::{GenerationStatus, SearchStatus, UiState};
use crate::types::Coordinate;
use std::fmt;

/// Page title.
pub const TITLE: &str = "Paint A Place";
/// Line under the title.
pub const TAGLINE: &str = "Enter an address to turn its satellite view into a painting.";
/// Shown in the map area before the first render.
pub const MAP_PLACEHOLDER: &str = "Map will appear here";
/// Heading above the painting.
pub const PAINTING_HEADING: &str = "Your Painting:";

/// A button as drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    /// Caption.
    pub label: &'static str,
    /// Whether it reacts to clicks.
    pub enabled: bool,
}

/// What the map area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// Nothing rendered yet.
    Placeholder(&'static str),
    /// A rendered map.
    Showing {
        /// Map center.
        center: Coordinate,
        /// Resolved address, when known.
        address: Option<String>,
    },
}

/// What the painting area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintingView {
    /// Section heading.
    pub heading: &'static str,
    /// Image size in bytes.
    pub size_bytes: usize,
    /// MIME type of the image.
    pub mime_type: &'static str,
    /// Model that painted it.
    pub model: Option<String>,
}

/// The rendered page, derived from [`UiState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// Page title.
    pub title: &'static str,
    /// Line under the title.
    pub tagline: &'static str,
    /// Current address text.
    pub query: String,
    /// The search button.
    pub search_button: ButtonView,
    /// Autocomplete candidates.
    pub suggestions: Vec<String>,
    /// Status-area message.
    pub error: Option<String>,
    /// The map area.
    pub map: MapView,
    /// The generate button, present once a map is shown.
    pub generate_button: Option<ButtonView>,
    /// The painting area, present once a painting exists.
    pub painting: Option<PaintingView>,
}

impl From<&UiState> for ViewModel {
    fn from(state: &UiState) -> Self {
        let search_button = match state.search {
            SearchStatus::Idle => ButtonView {
                label: "Search",
                enabled: true,
            },
            SearchStatus::Searching => ButtonView {
                label: "Searching...",
                enabled: false,
            },
        };

        let generate_button = match state.generation {
            GenerationStatus::Unavailable => None,
            GenerationStatus::Ready => Some(ButtonView {
                label: "Create Painting",
                enabled: true,
            }),
            GenerationStatus::Generating => Some(ButtonView {
                label: "Creating Masterpiece...",
                enabled: false,
            }),
        };

        let map = match (&state.location, state.is_map_ready()) {
            (Some(place), true) => MapView::Showing {
                center: place.coordinate,
                address: place.formatted_address.clone(),
            },
            _ => MapView::Placeholder(MAP_PLACEHOLDER),
        };

        let painting = state.painting.as_ref().map(|p| PaintingView {
            heading: PAINTING_HEADING,
            size_bytes: p.image.size(),
            mime_type: p.image.format.mime_type(),
            model: p.metadata.model.clone(),
        });

        Self {
            title: TITLE,
            tagline: TAGLINE,
            query: state.query.clone(),
            search_button,
            suggestions: state
                .suggestions
                .iter()
                .map(|s| s.description.clone())
                .collect(),
            error: state.error.clone(),
            map,
            generate_button,
            painting,
        }
    }
}

impl fmt::Display for ButtonView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enabled {
            write!(f, "[ {} ]", self.label)
        } else {
            write!(f, "[ {} ] (disabled)", self.label)
        }
    }
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.tagline)?;
        writeln!(f)?;
        writeln!(f, "Address: {}  {}", self.query, self.search_button)?;
        for (i, s) in self.suggestions.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, s)?;
        }
        if let Some(ref error) = self.error {
            writeln!(f, "! {}", error)?;
        }
        match &self.map {
            MapView::Placeholder(text) => writeln!(f, "Map: {}", text)?,
            MapView::Showing { center, address } => match address {
                Some(address) => writeln!(f, "Map: {} ({})", address, center)?,
                None => writeln!(f, "Map: {}", center)?,
            },
        }
        if let Some(ref button) = self.generate_button {
            writeln!(f, "{}", button)?;
        }
        if let Some(ref painting) = self.painting {
            writeln!(f)?;
            writeln!(f, "{}", painting.heading)?;
            write!(f, "  {} bytes, {}", painting.size_bytes, painting.mime_type)?;
            if let Some(ref model) = painting.model {
                write!(f, " via {}", model)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::state::UiEvent;
    use crate::types::{ImageFormat, Painting, PaintingMetadata, RasterImage, ResolvedPlace};

    #[test]
    fn test_initial_view() {
        let view = ViewModel::from(&UiState::new());
        assert_eq!(view.search_button.label, "Search");
        assert!(view.search_button.enabled);
        assert_eq!(view.map, MapView::Placeholder(MAP_PLACEHOLDER));
        assert!(view.generate_button.is_none());
        assert!(view.painting.is_none());
        assert!(view.to_string().contains("Map will appear here"));
    }

    #[test]
    fn test_view_through_full_cycle() {
        let mut state = UiState::new();
        state.apply(UiEvent::QueryChanged("Seoul".into())).unwrap();
        state.apply(UiEvent::SearchRequested).unwrap();

        let view = ViewModel::from(&state);
        assert_eq!(view.search_button.label, "Searching...");
        assert!(!view.search_button.enabled);

        let place = ResolvedPlace::at(Coordinate::new(37.5, 127.0).unwrap());
        state.apply(UiEvent::SearchSucceeded(place)).unwrap();
        state.apply(UiEvent::GenerateRequested).unwrap();
        let view = ViewModel::from(&state);
        assert_eq!(
            view.generate_button,
            Some(ButtonView {
                label: "Creating Masterpiece...",
                enabled: false
            })
        );

        let painting = Painting::new(
            RasterImage::new(vec![0; 10], ImageFormat::Png),
            PaintingMetadata {
                model: Some("gemini-2.5-flash-image".into()),
                ..Default::default()
            },
        );
        state.apply(UiEvent::GenerationSucceeded(painting)).unwrap();
        let view = ViewModel::from(&state);
        let text = view.to_string();
        assert!(text.contains("Your Painting:"));
        assert!(text.contains("10 bytes, image/png via gemini-2.5-flash-image"));
        assert!(text.contains("[ Create Painting ]"));
    }

    #[test]
    fn test_error_line() {
        let mut state = UiState::new();
        let _ = state.apply(UiEvent::SearchRequested);
        let text = ViewModel::from(&state).to_string();
        assert!(text.contains("! Please enter an address."));
    }
}
