//! Query parameter state for the events list.
//!
//! Parameters are a value object: every change is a [`QueryPatch`] folded
//! into the previous [`QueryParameters`] by [`QueryParameters::apply`]. The
//! screen owns exactly one [`QueryState`]; nothing here talks to the network.

use serde::{Deserialize, Serialize};

use crate::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    pub search: String,
    pub coordinates: Option<Coordinates>,
    pub distance_radius: u32,
    pub page_size: u32,
    pub cursor: Option<String>,
}

impl QueryParameters {
    #[must_use]
    pub fn new(distance_radius: u32, page_size: u32) -> Self {
        Self {
            search: String::new(),
            coordinates: None,
            distance_radius,
            page_size,
            cursor: None,
        }
    }

    /// The reducer: `(State, Patch) -> State`. Fields absent from the patch
    /// are carried over unchanged.
    #[must_use]
    pub fn apply(&self, patch: &QueryPatch) -> Self {
        Self {
            search: patch.search.clone().unwrap_or_else(|| self.search.clone()),
            coordinates: patch.coordinates.or(self.coordinates),
            distance_radius: patch.distance_radius.unwrap_or(self.distance_radius),
            page_size: patch.page_size.unwrap_or(self.page_size),
            cursor: match &patch.cursor {
                Some(cursor) => cursor.clone(),
                None => self.cursor.clone(),
            },
        }
    }
}

/// A partial update to [`QueryParameters`]. The empty patch means "re-run
/// with the current parameters".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub search: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub distance_radius: Option<u32>,
    pub page_size: Option<u32>,
    pub cursor: Option<Option<String>>,
}

impl QueryPatch {
    #[must_use]
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn distance(radius: u32) -> Self {
        Self {
            distance_radius: Some(radius),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn coordinates(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_distance(mut self, radius: u32) -> Self {
        self.distance_radius = Some(radius);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Screen-local filter state plus the two overlays that edit it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    params: QueryParameters,
    default_distance: u32,
    initial_page_size: u32,
    search_visible: bool,
    distance_overlay_visible: bool,
}

impl QueryState {
    #[must_use]
    pub fn new(default_distance: u32, initial_page_size: u32) -> Self {
        Self {
            params: QueryParameters::new(default_distance, initial_page_size),
            default_distance,
            initial_page_size,
            search_visible: false,
            distance_overlay_visible: false,
        }
    }

    #[must_use]
    pub fn params(&self) -> &QueryParameters {
        &self.params
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.params.coordinates.is_some()
    }

    #[must_use]
    pub fn search_visible(&self) -> bool {
        self.search_visible
    }

    #[must_use]
    pub fn distance_overlay_visible(&self) -> bool {
        self.distance_overlay_visible
    }

    /// Folds `patch` into the current parameters.
    pub fn merge(&mut self, patch: &QueryPatch) {
        self.params = self.params.apply(patch);
    }

    /// Replaces the search text and returns the patch to refetch with.
    pub fn set_search(&mut self, text: impl Into<String>) -> QueryPatch {
        let patch = QueryPatch::search(text);
        self.merge(&patch);
        patch
    }

    /// Flips search visibility. Both directions clear the text; only hiding
    /// the search bar needs a refetch, since that is when a filtered list
    /// may be on screen.
    pub fn toggle_search(&mut self) -> Option<QueryPatch> {
        let was_visible = self.search_visible;
        self.search_visible = !was_visible;
        if was_visible {
            Some(self.set_search(""))
        } else {
            self.merge(&QueryPatch::search(""));
            None
        }
    }

    pub fn open_distance_overlay(&mut self) {
        self.distance_overlay_visible = true;
    }

    pub fn close_distance_overlay(&mut self) {
        self.distance_overlay_visible = false;
    }

    /// Replaces the radius and closes the distance overlay.
    pub fn set_distance(&mut self, radius: u32) -> QueryPatch {
        self.distance_overlay_visible = false;
        let patch = QueryPatch::distance(radius);
        self.merge(&patch);
        patch
    }

    /// Records the first location fix. The initial query always goes out with
    /// the default radius and page size.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) -> QueryPatch {
        let patch = QueryPatch::coordinates(coordinates)
            .with_distance(self.default_distance)
            .with_page_size(self.initial_page_size)
            .with_cursor(None);
        self.merge(&patch);
        patch
    }
}
