use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{Capabilities, GeolocationError, TimerOutput};
use crate::config::AppConfig;
use crate::details::{into_record, EventDetails};
use crate::draft::{DraftError, EventDraft, SaveRequest, TimerCommand};
use crate::event::{Event, KvResult};
use crate::feed::Dispatch;
use crate::model::Model;
use crate::routes::{Route, RouteName, RouteParams, RouteTable};
use crate::view::ViewModel;
use crate::{AppError, Coordinates, EventId};

#[derive(Default)]
pub struct App;

impl App {
    fn send_refetch(dispatch: Dispatch, caps: &Capabilities) {
        if let Some((ticket, request)) = dispatch {
            debug!(
                generation = ticket.generation,
                class = ?ticket.class,
                force = request.force,
                "dispatching refetch"
            );
            caps.graph_ql.refetch(request, move |result| Event::RefetchCompleted {
                ticket,
                result: Box::new(result),
            });
        }
    }

    fn run_timer(command: TimerCommand, interval_ms: u64, caps: &Capabilities) {
        match command {
            TimerCommand::Schedule(handle) => {
                caps.hold_timer
                    .schedule(handle, interval_ms, move |output| Event::HoldTick { handle, output });
            }
            TimerCommand::Cancel(handle) => caps.hold_timer.cancel(handle),
        }
    }

    /// Drops the open draft, cancelling any armed repeat first.
    fn discard_draft(model: &mut Model, caps: &Capabilities) {
        if let Some(mut draft) = model.draft.take() {
            if let Some(command) = draft.teardown() {
                Self::run_timer(command, model.config.hold_repeat_interval_ms, caps);
            }
        }
    }

    fn start_locating(model: &mut Model, caps: &Capabilities) {
        if model.feed.begin_locating() {
            caps.geolocation
                .current_position(model.config.geolocation.clone(), |result| {
                    Event::LocationReceived(Box::new(result))
                });
        }
    }

    fn enter_root(model: &mut Model, root: RouteName, caps: &Capabilities) {
        Self::discard_draft(model, caps);
        model.reset_root(root);
        caps.navigation.reset_root(root);
        info!(root = %root, "root navigator mounted");
        if root == RouteName::LoggedApp {
            Self::start_locating(model, caps);
        }
    }

    fn push_route(model: &mut Model, route: Route, caps: &Capabilities) -> bool {
        let Some(root) = model.root else {
            warn!(route = %route.name, "navigation before startup");
            return false;
        };
        if let Err(e) = model
            .routes
            .check(root, route.name)
            .and_then(|()| route.validate())
        {
            warn!(error = %e, "navigation rejected");
            return false;
        }
        caps.navigation.navigate(route.name, route.params.clone());
        model.push_route(route);
        true
    }

    fn restore_session(model: &mut Model, result: KvResult, caps: &Capabilities) {
        let token = match result {
            Ok(Some(bytes)) if !bytes.is_empty() => match String::from_utf8(bytes) {
                Ok(token) => Some(SecretString::new(token)),
                Err(_) => {
                    warn!("stored session is not valid UTF-8, ignoring");
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not read stored session");
                None
            }
        };
        let root = RouteTable::root_navigator(token.is_some());
        model.session = token;
        Self::enter_root(model, root, caps);
    }

    fn open_details(model: &mut Model, id: EventId, caps: &Capabilities) {
        let route = Route {
            name: RouteName::EventDetails,
            params: RouteParams::with_id(id.clone()),
        };
        if !Self::push_route(model, route, caps) {
            return;
        }
        Self::discard_draft(model, caps);
        model.details = Some(EventDetails::new(id.clone()));
        caps.graph_ql.fetch_event(id.clone(), move |result| Event::DetailsLoaded {
            id,
            result: Box::new(result),
        });
    }

    fn open_editor(model: &mut Model, id: Option<EventId>, caps: &Capabilities) {
        let route = Route {
            name: RouteName::EventAdd,
            params: RouteParams { id: id.clone() },
        };
        if !Self::push_route(model, route, caps) {
            return;
        }
        Self::discard_draft(model, caps);
        model.draft = Some(EventDraft::new(id.clone(), &model.config));
        if let Some(id) = id {
            caps.graph_ql.fetch_event(id.clone(), move |result| Event::DraftLoaded {
                id,
                result: Box::new(result),
            });
        }
    }

    fn navigate_back(model: &mut Model, caps: &Capabilities) {
        match model.current_route() {
            Some(RouteName::EventAdd) => Self::discard_draft(model, caps),
            Some(RouteName::EventDetails) => model.details = None,
            _ => {}
        }
        if model.pop_route().is_some() {
            caps.navigation.go_back();
        } else {
            debug!("back pressed on root screen");
        }
    }

    fn show_error(error: &AppError, caps: &Capabilities) {
        caps.dialog.open(error.user_facing_message());
    }

    #[instrument(skip_all, fields(event = event.name()))]
    fn update_draft(event: Event, model: &mut Model, caps: &Capabilities) {
        let interval_ms = model.config.hold_repeat_interval_ms;
        let default_limit = model.config.default_attendance_limit;
        let Some(draft) = model.draft.as_mut() else {
            debug!("no draft open, ignoring");
            return;
        };

        match event {
            Event::DraftFieldChanged { field, value } => draft.set_field(field, value),
            Event::DatePickerToggled => draft.toggle_date_picker(),
            Event::DatePickerCancelled => draft.close_date_picker(),
            Event::DatePicked { date } => draft.set_date(date),
            Event::LocationPickerToggled => draft.toggle_location_picker(),
            Event::LocationPicked(picked) => {
                if let Err(e) = draft.apply_location(picked) {
                    warn!(error = %e, "picked location rejected");
                    Self::show_error(&AppError::from(e), caps);
                }
            }
            Event::ScheduleOverlayToggled => draft.toggle_schedule_overlay(),
            Event::ScheduleOverlayClosed => draft.close_schedule_overlay(),
            Event::ScheduleEntryConfirmed(entry) => draft.append_schedule_entry(entry),
            Event::AttendanceDecremented => draft.decrement_attendance_limit(),
            Event::AttendancePressIn => {
                for command in draft.press_in(model.hold_handles.allocate()) {
                    Self::run_timer(command, interval_ms, caps);
                }
            }
            Event::AttendancePressOut => {
                if let Some(command) = draft.press_out() {
                    Self::run_timer(command, interval_ms, caps);
                }
            }
            Event::HoldTick { handle, output } => {
                if output == TimerOutput::Elapsed {
                    if let Some(command) = draft.tick(handle) {
                        Self::run_timer(command, interval_ms, caps);
                    }
                }
            }
            Event::DraftLoaded { id, result } => {
                if draft.event_id() != Some(&id) {
                    debug!(id = %id, "ignoring record for a closed draft");
                    return;
                }
                match into_record(*result) {
                    Ok(record) => draft.seed(&record, default_limit),
                    Err(e) => {
                        warn!(id = %id, code = e.code(), "could not load event for editing");
                        Self::show_error(&e, caps);
                    }
                }
            }
            Event::SaveRequested => match draft.begin_save() {
                Ok(SaveRequest::Create(input)) => {
                    caps.graph_ql
                        .create_event(input, |result| Event::SaveCompleted(Box::new(result)));
                }
                Ok(SaveRequest::Update(input)) => {
                    caps.graph_ql
                        .update_event(input, |result| Event::SaveCompleted(Box::new(result)));
                }
                Err(DraftError::SaveInFlight) => debug!("save already in flight"),
                Err(e) => warn!(error = %e, "save rejected"),
            },
            Event::SaveCompleted(result) => match draft.complete_save(*result) {
                Ok(()) => {
                    info!("event saved");
                    Self::discard_draft(model, caps);
                    model.reset_root(RouteName::LoggedApp);
                    caps.navigation.reset_root(RouteName::LoggedApp);
                    let dispatch = model.feed.refresh();
                    Self::send_refetch(dispatch, caps);
                }
                Err(e) => Self::show_error(&e, caps),
            },
            other => debug!(event = other.name(), "not a draft event"),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            debug!(event = event_name, "user action");
        }

        if event.targets_draft() {
            Self::update_draft(event, model, caps);
            caps.render.render();
            return;
        }

        match event {
            Event::AppStarted { config_json } => {
                let config = AppConfig::from_json_or_default(config_json.as_deref());
                let session_key = config.session_key.clone();
                Self::discard_draft(model, caps);
                model.restart(config);
                caps.key_value.get(session_key, |result| {
                    Event::SessionRestored(Box::new(result))
                });
                info!("app started");
            }

            Event::SessionRestored(result) => Self::restore_session(model, *result, caps),

            Event::SignedIn { token } => {
                let bytes = token.expose_secret().as_bytes().to_vec();
                caps.key_value.set(model.config.session_key.clone(), bytes, |result| {
                    Event::SessionStored(Box::new(result))
                });
                model.session = Some(token);
                model.reset_feed();
                Self::enter_root(model, RouteName::LoggedApp, caps);
                info!("signed in");
            }

            Event::SignedOut => {
                caps.key_value.delete(model.config.session_key.clone(), |result| {
                    Event::SessionCleared(Box::new(result))
                });
                model.session = None;
                model.reset_feed();
                Self::enter_root(model, RouteName::NonLoggedApp, caps);
                info!("signed out");
            }

            Event::SessionStored(result) | Event::SessionCleared(result) => {
                if let Err(e) = *result {
                    warn!(error = %e, "session storage failed");
                }
            }

            Event::LocationReceived(result) => match *result {
                Ok(position) => match Coordinates::try_from(position) {
                    Ok(coordinates) => {
                        let dispatch = model.feed.on_position(coordinates);
                        Self::send_refetch(dispatch, caps);
                    }
                    Err(e) => model.feed.on_position_error(&GeolocationError::Unavailable {
                        message: e.to_string(),
                    }),
                },
                Err(e) => model.feed.on_position_error(&e),
            },

            Event::SearchToggled => {
                let dispatch = model.feed.toggle_search();
                Self::send_refetch(dispatch, caps);
            }

            Event::SearchChanged { text } => {
                let dispatch = model.feed.set_search(text);
                Self::send_refetch(dispatch, caps);
            }

            Event::DistanceOverlayOpened => model.feed.open_distance_overlay(),
            Event::DistanceOverlayClosed => model.feed.close_distance_overlay(),

            Event::DistanceSelected { radius } => {
                let dispatch = model.feed.set_distance(radius);
                Self::send_refetch(dispatch, caps);
            }

            Event::RefreshRequested => {
                let dispatch = model.feed.refresh();
                Self::send_refetch(dispatch, caps);
            }

            Event::EndReached => {
                let dispatch = model.feed.load_more();
                Self::send_refetch(dispatch, caps);
            }

            Event::RefreshErrorDismissed => model.feed.dismiss_error(),

            Event::RefetchCompleted { ticket, result } => {
                let outcome = model.feed.on_response(ticket, *result);
                debug!(generation = ticket.generation, ?outcome, "refetch completed");
            }

            Event::OpenEventDetails { id } => Self::open_details(model, id, caps),

            Event::DetailsLoaded { id, result } => match model.details.as_mut() {
                Some(details) if details.id() == &id => details.on_response(*result),
                _ => debug!(id = %id, "ignoring details for a closed screen"),
            },

            Event::EditEvent => {
                match model.details.as_ref().and_then(EventDetails::edit_route) {
                    Some(route) => Self::open_editor(model, route.params.id, caps),
                    None => warn!("edit requested for an event the viewer does not own"),
                }
            }

            Event::OpenEventEditor { id } => Self::open_editor(model, id, caps),

            Event::NavigateBack => Self::navigate_back(model, caps),

            other => debug!(event = other.name(), "event not handled here"),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
