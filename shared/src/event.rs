use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationResult, GraphResult, KeyValueError, RepeatHandle, TimerOutput};
use crate::draft::{DraftField, PickedLocation, ScheduleEntry};
use crate::refetch::Ticket;
use crate::EventId;

pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

// Capability responses never cross the bridge, hence `serde(skip)`.
#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    // Lifecycle & session
    AppStarted {
        config_json: Option<String>,
    },
    #[serde(skip_serializing)]
    SignedIn {
        token: SecretString,
    },
    SignedOut,

    // Events list
    SearchToggled,
    SearchChanged {
        text: String,
    },
    DistanceOverlayOpened,
    DistanceOverlayClosed,
    DistanceSelected {
        radius: u32,
    },
    RefreshRequested,
    EndReached,
    RefreshErrorDismissed,

    // Details
    OpenEventDetails {
        id: EventId,
    },
    EditEvent,

    // Draft
    OpenEventEditor {
        id: Option<EventId>,
    },
    DraftFieldChanged {
        field: DraftField,
        value: String,
    },
    DatePickerToggled,
    DatePickerCancelled,
    DatePicked {
        date: String,
    },
    LocationPickerToggled,
    LocationPicked(PickedLocation),
    ScheduleOverlayToggled,
    ScheduleOverlayClosed,
    ScheduleEntryConfirmed(ScheduleEntry),
    AttendanceDecremented,
    AttendancePressIn,
    AttendancePressOut,
    SaveRequested,

    NavigateBack,

    // Capability responses (boxed to keep the enum small)
    #[serde(skip)]
    SessionRestored(Box<KvResult>),
    #[serde(skip)]
    SessionStored(Box<KvResult>),
    #[serde(skip)]
    SessionCleared(Box<KvResult>),
    #[serde(skip)]
    LocationReceived(Box<GeolocationResult>),
    #[serde(skip)]
    RefetchCompleted {
        ticket: Ticket,
        result: Box<GraphResult>,
    },
    #[serde(skip)]
    DetailsLoaded {
        id: EventId,
        result: Box<GraphResult>,
    },
    #[serde(skip)]
    DraftLoaded {
        id: EventId,
        result: Box<GraphResult>,
    },
    #[serde(skip)]
    HoldTick {
        handle: RepeatHandle,
        output: TimerOutput,
    },
    #[serde(skip)]
    SaveCompleted(Box<GraphResult>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::SignedIn { .. } => "signed_in",
            Self::SignedOut => "signed_out",
            Self::SearchToggled => "search_toggled",
            Self::SearchChanged { .. } => "search_changed",
            Self::DistanceOverlayOpened => "distance_overlay_opened",
            Self::DistanceOverlayClosed => "distance_overlay_closed",
            Self::DistanceSelected { .. } => "distance_selected",
            Self::RefreshRequested => "refresh_requested",
            Self::EndReached => "end_reached",
            Self::RefreshErrorDismissed => "refresh_error_dismissed",
            Self::OpenEventDetails { .. } => "open_event_details",
            Self::EditEvent => "edit_event",
            Self::OpenEventEditor { .. } => "open_event_editor",
            Self::DraftFieldChanged { .. } => "draft_field_changed",
            Self::DatePickerToggled => "date_picker_toggled",
            Self::DatePickerCancelled => "date_picker_cancelled",
            Self::DatePicked { .. } => "date_picked",
            Self::LocationPickerToggled => "location_picker_toggled",
            Self::LocationPicked(_) => "location_picked",
            Self::ScheduleOverlayToggled => "schedule_overlay_toggled",
            Self::ScheduleOverlayClosed => "schedule_overlay_closed",
            Self::ScheduleEntryConfirmed(_) => "schedule_entry_confirmed",
            Self::AttendanceDecremented => "attendance_decremented",
            Self::AttendancePressIn => "attendance_press_in",
            Self::AttendancePressOut => "attendance_press_out",
            Self::SaveRequested => "save_requested",
            Self::NavigateBack => "navigate_back",
            Self::SessionRestored(_) => "session_restored",
            Self::SessionStored(_) => "session_stored",
            Self::SessionCleared(_) => "session_cleared",
            Self::LocationReceived(_) => "location_received",
            Self::RefetchCompleted { .. } => "refetch_completed",
            Self::DetailsLoaded { .. } => "details_loaded",
            Self::DraftLoaded { .. } => "draft_loaded",
            Self::HoldTick { .. } => "hold_tick",
            Self::SaveCompleted(_) => "save_completed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::AppStarted { .. }
                | Self::SessionRestored(_)
                | Self::SessionStored(_)
                | Self::SessionCleared(_)
                | Self::LocationReceived(_)
                | Self::RefetchCompleted { .. }
                | Self::DetailsLoaded { .. }
                | Self::DraftLoaded { .. }
                | Self::HoldTick { .. }
                | Self::SaveCompleted(_)
        )
    }

    /// Events only the create/edit screen handles.
    #[must_use]
    pub const fn targets_draft(&self) -> bool {
        matches!(
            self,
            Self::DraftFieldChanged { .. }
                | Self::DatePickerToggled
                | Self::DatePickerCancelled
                | Self::DatePicked { .. }
                | Self::LocationPickerToggled
                | Self::LocationPicked(_)
                | Self::ScheduleOverlayToggled
                | Self::ScheduleOverlayClosed
                | Self::ScheduleEntryConfirmed(_)
                | Self::AttendanceDecremented
                | Self::AttendancePressIn
                | Self::AttendancePressOut
                | Self::SaveRequested
                | Self::DraftLoaded { .. }
                | Self::HoldTick { .. }
                | Self::SaveCompleted(_)
        )
    }
}
