use tracing::warn;

use crate::capabilities::{EventRecord, GraphResponse, GraphResult};
use crate::routes::{Route, RouteName, RouteParams};
use crate::{AppError, AppResult, ErrorKind, EventId};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailsStatus {
    Loading,
    Loaded(Box<EventRecord>),
    Failed(AppError),
}

/// Read-only view of a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    id: EventId,
    status: DetailsStatus,
}

impl EventDetails {
    #[must_use]
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            status: DetailsStatus::Loading,
        }
    }

    #[must_use]
    pub fn id(&self) -> &EventId {
        &self.id
    }

    #[must_use]
    pub fn status(&self) -> &DetailsStatus {
        &self.status
    }

    #[must_use]
    pub fn record(&self) -> Option<&EventRecord> {
        match &self.status {
            DetailsStatus::Loaded(record) => Some(record),
            _ => None,
        }
    }

    /// Only the owner may open the editor.
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.record().is_some_and(|record| record.is_owner)
    }

    pub fn on_response(&mut self, result: GraphResult) {
        self.status = match into_record(result) {
            Ok(record) => DetailsStatus::Loaded(Box::new(record)),
            Err(error) => {
                warn!(id = %self.id, code = error.code(), "event details unavailable");
                DetailsStatus::Failed(error)
            }
        };
    }

    #[must_use]
    pub fn edit_route(&self) -> Option<Route> {
        self.can_edit().then(|| Route {
            name: RouteName::EventAdd,
            params: RouteParams::with_id(self.id.clone()),
        })
    }
}

/// Unwraps a single-event response.
pub fn into_record(result: GraphResult) -> AppResult<EventRecord> {
    match result {
        Ok(GraphResponse::Event(Some(record))) => Ok(record),
        Ok(GraphResponse::Event(None)) => Err(AppError::new(ErrorKind::NotFound, "Event not found")),
        Ok(other) => Err(AppError::new(ErrorKind::RemoteFetch, "Could not load event")
            .with_internal(format!("expected an event, got {other:?}"))),
        Err(error) => Err(error.to_app_error(ErrorKind::RemoteFetch)),
    }
}
