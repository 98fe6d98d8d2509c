//! Events list screen: filters, overlays, location fix and the list itself.
//!
//! Every intent that changes the query returns the request to send, if any.
//! Nothing is sent before the first location fix.

use tracing::{debug, info, warn};

use crate::capabilities::{GeolocationError, GraphResponse, GraphResult, RefetchRequest};
use crate::config::AppConfig;
use crate::query::{QueryPatch, QueryState};
use crate::refetch::{Completion, Page, RefetchController, Ticket};
use crate::{AppError, AppResult, Coordinates, ErrorKind};

pub type Dispatch = Option<(Ticket, RefetchRequest)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationStatus {
    #[default]
    Unknown,
    Locating,
    Located,
    Failed,
}

#[derive(Debug, Clone)]
pub struct EventsFeed {
    query: QueryState,
    fetch: RefetchController,
    location: LocationStatus,
    location_error: Option<AppError>,
}

impl EventsFeed {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            query: QueryState::new(config.default_distance, config.initial_page_size),
            fetch: RefetchController::new(config.page_increment),
            location: LocationStatus::Unknown,
            location_error: None,
        }
    }

    /// A fresh list that takes over from `previous`. Responses still
    /// addressed to `previous` are ignored.
    #[must_use]
    pub fn replacing(config: &AppConfig, previous: &Self) -> Self {
        let mut feed = Self::new(config);
        feed.fetch = feed.fetch.starting_at(previous.fetch.next_generation());
        feed
    }

    #[must_use]
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    #[must_use]
    pub fn fetch(&self) -> &RefetchController {
        &self.fetch
    }

    #[must_use]
    pub fn location(&self) -> LocationStatus {
        self.location
    }

    #[must_use]
    pub fn location_error(&self) -> Option<&AppError> {
        self.location_error.as_ref()
    }

    /// Marks the single location attempt as started. Returns `false` when a
    /// fix was already requested or obtained.
    pub fn begin_locating(&mut self) -> bool {
        match self.location {
            LocationStatus::Unknown => {
                self.location = LocationStatus::Locating;
                true
            }
            _ => false,
        }
    }

    pub fn on_position(&mut self, coordinates: Coordinates) -> Dispatch {
        info!(
            longitude = coordinates.longitude(),
            latitude = coordinates.latitude(),
            "location fix acquired"
        );
        self.location = LocationStatus::Located;
        self.location_error = None;
        let patch = self.query.set_coordinates(coordinates);
        self.refetch(&patch)
    }

    pub fn on_position_error(&mut self, error: &GeolocationError) {
        warn!(error = %error, "location fix failed, list stays empty");
        self.location = LocationStatus::Failed;
        self.location_error = Some(AppError::from(error));
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> Dispatch {
        let patch = self.query.set_search(text);
        self.refetch(&patch)
    }

    pub fn toggle_search(&mut self) -> Dispatch {
        let patch = self.query.toggle_search()?;
        self.refetch(&patch)
    }

    pub fn open_distance_overlay(&mut self) {
        self.query.open_distance_overlay();
    }

    pub fn close_distance_overlay(&mut self) {
        self.query.close_distance_overlay();
    }

    pub fn set_distance(&mut self, radius: u32) -> Dispatch {
        let patch = self.query.set_distance(radius);
        self.refetch(&patch)
    }

    /// Pull-to-refresh: re-runs the query with the current parameters.
    pub fn refresh(&mut self) -> Dispatch {
        self.refetch(&QueryPatch::default())
    }

    /// Folds `patch` into the parameters and starts a refresh. The local
    /// parameters change even when the request itself is dropped.
    pub fn refetch(&mut self, patch: &QueryPatch) -> Dispatch {
        self.query.merge(patch);
        if !self.query.has_coordinates() {
            debug!("refetch deferred until a location fix");
            return None;
        }
        self.fetch.begin_refresh(self.query.params())
    }

    pub fn load_more(&mut self) -> Dispatch {
        if !self.query.has_coordinates() {
            return None;
        }
        self.fetch.begin_load_more(self.query.params())
    }

    pub fn on_response(&mut self, ticket: Ticket, result: GraphResult) -> Completion {
        self.fetch.complete(ticket, into_page(result))
    }

    pub fn dismiss_error(&mut self) {
        self.fetch.dismiss_error();
    }
}

fn into_page(result: GraphResult) -> AppResult<Page> {
    match result {
        Ok(GraphResponse::Connection(page)) => Ok(page),
        Ok(other) => Err(AppError::new(ErrorKind::RemoteFetch, "Could not load events")
            .with_internal(format!("expected a connection, got {other:?}"))),
        Err(error) => Err(error.to_app_error(ErrorKind::RemoteFetch)),
    }
}
