//! Plain data handed to the shell for rendering.

use serde::{Deserialize, Serialize};

use crate::capabilities::EventRecord;
use crate::details::{DetailsStatus, EventDetails};
use crate::draft::{DraftMode, EventDraft, ScheduleEntry};
use crate::feed::{EventsFeed, LocationStatus};
use crate::format::{date_label, distance_label, initials, street_label};
use crate::model::Model;
use crate::routes::{RouteName, RouteParams};
use crate::EMPTY_EVENTS_TEXT;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub root: Option<RouteName>,
    pub route: Option<RouteName>,
    pub params: RouteParams,
    pub is_signed_in: bool,
    pub screen: ScreenView,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "screen", content = "view")]
pub enum ScreenView {
    Starting,
    SignedOut,
    Events(EventsView),
    Draft(DraftView),
    Details(DetailsView),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventListItem {
    pub id: String,
    pub title: String,
    pub street: String,
    pub date_label: Option<String>,
    pub attendees: Vec<String>,
    pub is_owner: bool,
    pub is_event_attended: bool,
}

impl From<&EventRecord> for EventListItem {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            street: street_label(&record.location.street).to_string(),
            date_label: date_label(&record.date),
            attendees: record.public_list.iter().map(|a| a.name.clone()).collect(),
            is_owner: record.is_owner,
            is_event_attended: record.is_event_attended,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventsView {
    pub items: Vec<EventListItem>,
    pub search_visible: bool,
    pub search: String,
    pub distance: u32,
    pub distance_label: String,
    pub distance_overlay_visible: bool,
    pub is_locating: bool,
    pub is_refreshing: bool,
    pub is_fetching_more: bool,
    pub has_position: bool,
    pub has_next_page: bool,
    /// Shown once a query has completed with no results.
    pub empty_text: Option<String>,
    pub location_error: Option<String>,
    /// Set when the last request failed; `items` are then stale.
    pub refresh_error: Option<String>,
}

impl From<&EventsFeed> for EventsView {
    fn from(feed: &EventsFeed) -> Self {
        let params = feed.query().params();
        let fetch = feed.fetch();
        let state = fetch.state();
        let items: Vec<EventListItem> = fetch
            .page()
            .edges
            .iter()
            .map(|edge| EventListItem::from(&edge.node))
            .collect();
        let empty_text = (state.has_position && items.is_empty() && fetch.last_error().is_none())
            .then(|| EMPTY_EVENTS_TEXT.to_string());

        Self {
            search_visible: feed.query().search_visible(),
            search: params.search.clone(),
            distance: params.distance_radius,
            distance_label: distance_label(params.distance_radius),
            distance_overlay_visible: feed.query().distance_overlay_visible(),
            is_locating: feed.location() == LocationStatus::Locating,
            is_refreshing: state.is_refreshing,
            is_fetching_more: state.is_fetching_more,
            has_position: state.has_position,
            has_next_page: fetch.has_next_page(),
            empty_text,
            location_error: feed.location_error().map(crate::AppError::user_facing_message),
            refresh_error: fetch.last_error().map(crate::AppError::user_facing_message),
            items,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleItemView {
    pub title: String,
    pub time: String,
    pub talker: Option<String>,
    pub initials: Option<String>,
}

impl From<&ScheduleEntry> for ScheduleItemView {
    fn from(entry: &ScheduleEntry) -> Self {
        let talker = entry.talker.clone().filter(|t| !t.trim().is_empty());
        Self {
            title: entry.title.clone(),
            time: entry.time.clone(),
            initials: talker.as_deref().map(initials),
            talker,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftView {
    pub action_label: String,
    pub is_loading: bool,
    pub title: String,
    pub description: String,
    pub date_label: String,
    pub has_date: bool,
    pub address_label: String,
    pub has_address: bool,
    pub attendance_limit: u32,
    pub schedule: Vec<ScheduleItemView>,
    pub date_picker_visible: bool,
    pub location_picker_visible: bool,
    pub schedule_overlay_visible: bool,
    pub is_saving: bool,
}

impl From<&EventDraft> for DraftView {
    fn from(draft: &EventDraft) -> Self {
        let action_label = match draft.mode() {
            DraftMode::Create => "CREATE",
            DraftMode::Edit { .. } => "EDIT",
        };
        let formatted_date = date_label(&draft.date);
        let street = street_label(&draft.address);

        Self {
            action_label: action_label.to_string(),
            is_loading: !draft.is_loaded(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            has_date: formatted_date.is_some(),
            date_label: formatted_date.unwrap_or_else(|| "Pick a date".to_string()),
            has_address: !street.is_empty(),
            address_label: if street.is_empty() {
                "Set a location".to_string()
            } else {
                street.to_string()
            },
            attendance_limit: draft.attendance_limit(),
            schedule: draft.schedule().iter().map(ScheduleItemView::from).collect(),
            date_picker_visible: draft.date_picker_visible(),
            location_picker_visible: draft.location_picker_visible(),
            schedule_overlay_visible: draft.schedule_overlay_visible(),
            is_saving: draft.is_saving(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailsView {
    pub id: String,
    pub is_loading: bool,
    pub title: String,
    pub description: String,
    pub date_label: Option<String>,
    pub address: String,
    pub schedule: Vec<ScheduleItemView>,
    pub attendees: Vec<String>,
    pub is_event_attended: bool,
    pub can_edit: bool,
    pub error: Option<String>,
}

impl From<&EventDetails> for DetailsView {
    fn from(details: &EventDetails) -> Self {
        let mut view = Self {
            id: details.id().to_string(),
            is_loading: false,
            title: String::new(),
            description: String::new(),
            date_label: None,
            address: String::new(),
            schedule: Vec::new(),
            attendees: Vec::new(),
            is_event_attended: false,
            can_edit: details.can_edit(),
            error: None,
        };
        match details.status() {
            DetailsStatus::Loading => view.is_loading = true,
            DetailsStatus::Failed(error) => view.error = Some(error.user_facing_message()),
            DetailsStatus::Loaded(record) => {
                view.title = record.title.clone();
                view.description = record.description.clone();
                view.date_label = date_label(&record.date);
                view.address = street_label(&record.location.street).to_string();
                view.schedule = record.schedule.iter().map(ScheduleItemView::from).collect();
                view.attendees = record.public_list.iter().map(|a| a.name.clone()).collect();
                view.is_event_attended = record.is_event_attended;
            }
        }
        view
    }
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let route = model.route.as_ref();
        let screen = match (model.root, route.map(|r| r.name)) {
            (None, _) => ScreenView::Starting,
            (Some(RouteName::NonLoggedApp), _) => ScreenView::SignedOut,
            (_, Some(RouteName::EventAdd)) => model
                .draft
                .as_ref()
                .map_or(ScreenView::Starting, |d| ScreenView::Draft(d.into())),
            (_, Some(RouteName::EventDetails)) => model
                .details
                .as_ref()
                .map_or(ScreenView::Starting, |d| ScreenView::Details(d.into())),
            _ => ScreenView::Events((&model.feed).into()),
        };

        Self {
            root: model.root,
            route: route.map(|r| r.name),
            params: route.map(|r| r.params.clone()).unwrap_or_default(),
            is_signed_in: model.is_signed_in(),
            screen,
        }
    }
}
