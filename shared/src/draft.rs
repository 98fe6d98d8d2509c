//! Create/edit form for a single event.
//!
//! The draft is created empty for a new event or seeded from a fetched
//! record when editing, mutated field by field, and submitted as one write.
//!
//! # Press-and-hold
//!
//! Holding the increment control arms a [`RepeatHandle`] handed in by the
//! caller, never reused across drafts. Every elapsed
//! interval adds one and re-arms the same handle. Releasing (or tearing the
//! screen down) drops the handle, so any interval that still fires afterwards
//! no longer matches and is ignored. A release before the first interval
//! counts as a single tap.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capabilities::{
    EventInput, EventRecord, GraphResponse, GraphResult, LocationInput, RepeatHandle,
};
use crate::config::AppConfig;
use crate::{
    AppError, AppResult, CoordinateError, Coordinates, ErrorKind, EventId, GENERIC_WRITE_ERROR,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub title: String,
    #[serde(default)]
    pub talker: Option<String>,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftMode {
    Create,
    Edit { id: EventId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftField {
    Title,
    Description,
    Date,
    Address,
    ZipCode,
    HouseNumber,
}

/// What the location picker hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedLocation {
    pub zip_code: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Schedule(RepeatHandle),
    Cancel(RepeatHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create(EventInput),
    Update(EventInput),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("a save is already in flight")]
    SaveInFlight,

    #[error("event {0} has not been loaded yet")]
    NotLoaded(EventId),

    #[error("invalid location: {0}")]
    InvalidLocation(#[from] CoordinateError),
}

impl From<DraftError> for AppError {
    fn from(e: DraftError) -> Self {
        let kind = match e {
            DraftError::SaveInFlight | DraftError::NotLoaded(_) => ErrorKind::InvalidState,
            DraftError::InvalidLocation(_) => ErrorKind::Validation,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    handle: RepeatHandle,
    ticks: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    mode: DraftMode,
    loaded: bool,
    pub title: String,
    pub description: String,
    pub date: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub zip_code: String,
    pub house_number: String,
    attendance_limit: u32,
    schedule: Vec<ScheduleEntry>,
    date_picker_visible: bool,
    location_picker_visible: bool,
    schedule_overlay_visible: bool,
    hold: Option<Hold>,
    is_saving: bool,
    title_max_chars: usize,
    description_max_chars: usize,
}

impl EventDraft {
    /// An empty draft in create mode, or an unloaded one in edit mode.
    #[must_use]
    pub fn new(id: Option<EventId>, config: &AppConfig) -> Self {
        let (mode, loaded) = match id {
            Some(id) => (DraftMode::Edit { id }, false),
            None => (DraftMode::Create, true),
        };
        Self {
            mode,
            loaded,
            title: String::new(),
            description: String::new(),
            date: String::new(),
            address: String::new(),
            coordinates: None,
            zip_code: String::new(),
            house_number: String::new(),
            attendance_limit: config.default_attendance_limit,
            schedule: Vec::new(),
            date_picker_visible: false,
            location_picker_visible: false,
            schedule_overlay_visible: false,
            hold: None,
            is_saving: false,
            title_max_chars: config.title_max_chars,
            description_max_chars: config.description_max_chars,
        }
    }

    #[must_use]
    pub fn mode(&self) -> &DraftMode {
        &self.mode
    }

    #[must_use]
    pub fn event_id(&self) -> Option<&EventId> {
        match &self.mode {
            DraftMode::Edit { id } => Some(id),
            DraftMode::Create => None,
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn attendance_limit(&self) -> u32 {
        self.attendance_limit
    }

    #[must_use]
    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.hold.is_some()
    }

    #[must_use]
    pub fn date_picker_visible(&self) -> bool {
        self.date_picker_visible
    }

    #[must_use]
    pub fn location_picker_visible(&self) -> bool {
        self.location_picker_visible
    }

    #[must_use]
    pub fn schedule_overlay_visible(&self) -> bool {
        self.schedule_overlay_visible
    }

    /// Fills the form from the record being edited.
    pub fn seed(&mut self, record: &EventRecord, default_attendance_limit: u32) {
        self.title = record.title.clone();
        self.description = record.description.clone();
        self.date = record.date.clone();
        self.address = record.location.street.clone();
        self.coordinates = record.location.coordinates;
        self.zip_code = record.location.cep.clone().unwrap_or_default();
        self.house_number = record.location.number.clone().unwrap_or_default();
        self.attendance_limit = record.public_limit.unwrap_or(default_attendance_limit);
        self.schedule = record.schedule.clone();
        self.loaded = true;
        debug!(id = %record.id, "draft seeded");
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Title => self.title = truncate_chars(&value, self.title_max_chars),
            DraftField::Description => {
                self.description = truncate_chars(&value, self.description_max_chars);
            }
            DraftField::Date => self.date = value,
            DraftField::Address => self.address = value,
            DraftField::ZipCode => self.zip_code = value,
            DraftField::HouseNumber => self.house_number = value,
        }
    }

    pub fn toggle_date_picker(&mut self) {
        self.date_picker_visible = !self.date_picker_visible;
    }

    pub fn close_date_picker(&mut self) {
        self.date_picker_visible = false;
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
        self.date_picker_visible = false;
    }

    pub fn toggle_location_picker(&mut self) {
        self.location_picker_visible = !self.location_picker_visible;
    }

    pub fn apply_location(&mut self, picked: PickedLocation) -> Result<(), DraftError> {
        let coordinates = Coordinates::new(picked.longitude, picked.latitude)?;
        self.coordinates = Some(coordinates);
        self.address = picked.address;
        self.zip_code = picked.zip_code;
        self.house_number = picked.number;
        self.location_picker_visible = false;
        Ok(())
    }

    pub fn toggle_schedule_overlay(&mut self) {
        self.schedule_overlay_visible = !self.schedule_overlay_visible;
    }

    pub fn close_schedule_overlay(&mut self) {
        self.schedule_overlay_visible = false;
    }

    pub fn append_schedule_entry(&mut self, entry: ScheduleEntry) {
        self.schedule.push(entry);
        self.schedule_overlay_visible = false;
    }

    pub fn increment_attendance_limit(&mut self) {
        self.attendance_limit = self.attendance_limit.saturating_add(1);
    }

    pub fn decrement_attendance_limit(&mut self) {
        self.attendance_limit = self.attendance_limit.saturating_sub(1);
    }

    /// Arms a new repeat under `handle`, which must not have been used by
    /// any earlier hold. A hold that was somehow left armed is cancelled
    /// first.
    pub fn press_in(&mut self, handle: RepeatHandle) -> Vec<TimerCommand> {
        let mut commands = Vec::with_capacity(2);
        if let Some(previous) = self.hold.take() {
            commands.push(TimerCommand::Cancel(previous.handle));
        }
        self.hold = Some(Hold { handle, ticks: 0 });
        commands.push(TimerCommand::Schedule(handle));
        commands
    }

    /// One interval elapsed for `handle`. Returns the command re-arming it,
    /// or `None` when the hold is no longer active.
    pub fn tick(&mut self, handle: RepeatHandle) -> Option<TimerCommand> {
        let hold = self.hold.as_mut().filter(|hold| hold.handle == handle)?;
        hold.ticks += 1;
        self.attendance_limit = self.attendance_limit.saturating_add(1);
        Some(TimerCommand::Schedule(handle))
    }

    /// Releases the control. Safe to call any number of times.
    pub fn press_out(&mut self) -> Option<TimerCommand> {
        let hold = self.hold.take()?;
        if hold.ticks == 0 {
            self.increment_attendance_limit();
        }
        Some(TimerCommand::Cancel(hold.handle))
    }

    /// Cancels any armed repeat without counting it as a tap.
    pub fn teardown(&mut self) -> Option<TimerCommand> {
        self.hold.take().map(|hold| TimerCommand::Cancel(hold.handle))
    }

    /// Assembles the write. Create when no id was given, update otherwise.
    pub fn begin_save(&mut self) -> Result<SaveRequest, DraftError> {
        if self.is_saving {
            return Err(DraftError::SaveInFlight);
        }
        if !self.loaded {
            if let DraftMode::Edit { id } = &self.mode {
                return Err(DraftError::NotLoaded(id.clone()));
            }
        }

        let input = EventInput {
            client_mutation_id: Uuid::new_v4().to_string(),
            id: self.event_id().cloned(),
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            schedule: self.schedule.clone(),
            public_limit: self.attendance_limit,
            location: LocationInput {
                coordinates: self.coordinates,
                cep: self.zip_code.clone(),
                street: self.address.clone(),
                number: self.house_number.clone(),
            },
        };

        self.is_saving = true;
        let request = match self.mode {
            DraftMode::Create => SaveRequest::Create(input),
            DraftMode::Edit { .. } => SaveRequest::Update(input),
        };
        info!(mode = ?self.mode, "saving draft");
        Ok(request)
    }

    /// Applies the write outcome. The draft is left intact on failure.
    pub fn complete_save(&mut self, result: GraphResult) -> AppResult<()> {
        self.is_saving = false;
        match result {
            Ok(GraphResponse::Mutation(payload)) => match payload.error {
                Some(message) if !message.is_empty() => {
                    warn!(%message, "write rejected");
                    Err(AppError::new(ErrorKind::Write, message))
                }
                _ => Ok(()),
            },
            Ok(other) => {
                warn!("unexpected write response");
                Err(AppError::new(ErrorKind::Write, GENERIC_WRITE_ERROR)
                    .with_internal(format!("expected a mutation payload, got {other:?}")))
            }
            Err(error) => {
                warn!(error = %error, "write failed");
                Err(AppError::new(ErrorKind::Write, GENERIC_WRITE_ERROR)
                    .with_internal(error.to_string()))
            }
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
