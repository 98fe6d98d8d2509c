mod dialog;
mod geolocation;
mod graph;
mod navigation;
mod timer;

pub use self::dialog::{Dialog, DialogOperation};
pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationOptions, GeolocationResult,
    Position,
};
pub use self::graph::{
    Attendee, EventInput, EventLocation, EventRecord, Filters, GraphError, GraphOperation,
    GraphQl, GraphResponse, GraphResult, LocationInput, MutationPayload, Pagination,
    QueryDescriptor, RefetchRequest, RenderVariables, SCHEMA_VERSION,
};
pub use self::navigation::{Navigation, NavigationOperation};
pub use self::timer::{HoldTimer, RepeatHandle, RepeatHandles, TimerOperation, TimerOutput};

// Render and key-value come straight from Crux.
pub use crux_core::render::Render;
pub use crux_kv::{error::KeyValueError, KeyValue};

use crate::event::Event;
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub graph_ql: GraphQl<Event>,
    pub geolocation: Geolocation<Event>,
    pub hold_timer: HoldTimer<Event>,
    pub navigation: Navigation<Event>,
    pub dialog: Dialog<Event>,
    pub key_value: KeyValue<Event>,
}
