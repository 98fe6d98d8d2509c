//! Graph API capability: the remote data layer and the write layer.
//!
//! The shell owns the transport and the normalized record cache. The core
//! describes what it needs: which window of the events connection to fetch,
//! which window to render, and whether the cache may answer (`force`).

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::ScheduleEntry;
use crate::query::QueryParameters;
use crate::refetch::Page;
use crate::{AppError, Coordinates, ErrorKind, EventId, UserId};

/// Bumped whenever the fields requested per screen change.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub search: String,
    pub coordinates: Option<Coordinates>,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub first: u32,
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub schema_version: u32,
    pub filters: Filters,
    pub pagination: Pagination,
}

impl QueryDescriptor {
    #[must_use]
    pub fn from_params(params: &QueryParameters) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            filters: Filters {
                search: params.search.clone(),
                coordinates: params.coordinates,
                distance: params.distance_radius,
            },
            pagination: Pagination {
                first: params.page_size,
                after: params.cursor.clone(),
            },
        }
    }
}

/// Overrides the window the data layer renders from its cache, independent
/// of the window it fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderVariables {
    pub first: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefetchRequest {
    pub variables: QueryDescriptor,
    pub render: Option<RenderVariables>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventLocation {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// An event node as returned by the graph API. List queries only select a
/// subset of fields; the rest arrive as their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_event_attended: bool,
    #[serde(default)]
    pub location: EventLocation,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub public_list: Vec<Attendee>,
    #[serde(default)]
    pub public_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationInput {
    pub coordinates: Option<Coordinates>,
    pub cep: String,
    pub street: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub client_mutation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub title: String,
    pub description: String,
    pub date: String,
    pub schedule: Vec<ScheduleEntry>,
    pub public_limit: u32,
    pub location: LocationInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationPayload {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum GraphOperation {
    Refetch(RefetchRequest),
    FetchEvent { id: EventId },
    CreateEvent(EventInput),
    UpdateEvent(EventInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GraphResponse {
    Connection(Page),
    Event(Option<EventRecord>),
    Mutation(MutationPayload),
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("server error: {message}")]
    Server { message: String },

    #[error("unexpected response: {reason}")]
    InvalidResponse { reason: String },
}

impl GraphError {
    /// Maps the failure onto the app error taxonomy. `fallback` is the kind
    /// used for server-side failures, which depends on whether the request
    /// was a read or a write.
    #[must_use]
    pub fn to_app_error(&self, fallback: ErrorKind) -> AppError {
        match self {
            Self::Network { message } => {
                AppError::new(ErrorKind::Network, "Network error").with_internal(message.clone())
            }
            Self::Timeout => AppError::new(ErrorKind::Timeout, "Request timed out"),
            Self::Unauthenticated => AppError::new(ErrorKind::Unauthenticated, "Not authenticated"),
            Self::Server { message } => AppError::new(fallback, message.clone()),
            Self::InvalidResponse { reason } => {
                AppError::new(ErrorKind::Serialization, "Unexpected response")
                    .with_internal(reason.clone())
            }
        }
    }
}

impl From<GraphError> for AppError {
    fn from(e: GraphError) -> Self {
        e.to_app_error(ErrorKind::Unknown)
    }
}

pub type GraphResult = Result<GraphResponse, GraphError>;

impl Operation for GraphOperation {
    type Output = GraphResult;
}

pub struct GraphQl<Ev> {
    context: CapabilityContext<GraphOperation, Ev>,
}

impl<Ev> Capability<Ev> for GraphQl<Ev> {
    type Operation = GraphOperation;
    type MappedSelf<MappedEv> = GraphQl<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        GraphQl::new(self.context.map_event(f))
    }
}

impl<Ev> GraphQl<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<GraphOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn refetch<F>(&self, request: RefetchRequest, make_event: F)
    where
        F: FnOnce(GraphResult) -> Ev + Send + 'static,
    {
        self.send(GraphOperation::Refetch(request), make_event);
    }

    pub fn fetch_event<F>(&self, id: EventId, make_event: F)
    where
        F: FnOnce(GraphResult) -> Ev + Send + 'static,
    {
        self.send(GraphOperation::FetchEvent { id }, make_event);
    }

    pub fn create_event<F>(&self, input: EventInput, make_event: F)
    where
        F: FnOnce(GraphResult) -> Ev + Send + 'static,
    {
        self.send(GraphOperation::CreateEvent(input), make_event);
    }

    pub fn update_event<F>(&self, input: EventInput, make_event: F)
    where
        F: FnOnce(GraphResult) -> Ev + Send + 'static,
    {
        self.send(GraphOperation::UpdateEvent(input), make_event);
    }

    fn send<F>(&self, operation: GraphOperation, make_event: F)
    where
        F: FnOnce(GraphResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
