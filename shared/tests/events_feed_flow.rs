use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::App as _;
use events_shared::capabilities::{
    EventLocation, EventRecord, GeolocationError, GraphError, GraphOperation, GraphResponse,
    NavigationOperation, Position,
};
use events_shared::refetch::{Edge, Page, PageInfo};
use events_shared::routes::RouteName;
use events_shared::view::ScreenView;
use events_shared::{App, Effect, Event, EventId, Model, EMPTY_EVENTS_TEXT};
use secrecy::SecretString;

type Tester = AppTester<App, Effect>;

fn graph_ops(effects: Vec<Effect>) -> Vec<GraphOperation> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::GraphQl(request) => Some(request.operation),
            _ => None,
        })
        .collect()
}

fn record(id: &str) -> EventRecord {
    EventRecord {
        id: EventId::new(id),
        title: format!("Event {id}"),
        description: String::new(),
        date: "2026-10-17T19:00:00Z".into(),
        is_owner: id == "mine",
        is_event_attended: false,
        location: EventLocation {
            street: "Rua Augusta - Consolação".into(),
            ..EventLocation::default()
        },
        schedule: vec![],
        public_list: vec![],
        public_limit: None,
    }
}

fn page(ids: std::ops::Range<u32>, has_next_page: bool) -> Page {
    let end = ids.end;
    Page {
        edges: ids
            .map(|i| Edge {
                node: record(&format!("e{i}")),
                cursor: Some(format!("c{i}")),
            })
            .collect(),
        page_info: PageInfo {
            has_next_page,
            end_cursor: Some(format!("c{}", end.saturating_sub(1))),
        },
    }
}

fn start(token: Option<&str>) -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();
    let update = app.update(Event::AppStarted { config_json: None }, &mut model);
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::KeyValue(_))));

    let stored = token.map(|t| t.as_bytes().to_vec());
    app.update(Event::SessionRestored(Box::new(Ok(stored))), &mut model);
    (app, model)
}

/// Signed in, located, first page loaded.
fn loaded(first_page: Page) -> (Tester, Model) {
    let (app, mut model) = start(Some("token"));
    let update = app.update(
        Event::LocationReceived(Box::new(Ok(Position {
            longitude: -46.6333,
            latitude: -23.5505,
        }))),
        &mut model,
    );
    assert_eq!(graph_ops(update.effects).len(), 1);
    complete(&app, &mut model, Ok(GraphResponse::Connection(first_page)));
    (app, model)
}

fn complete(
    app: &Tester,
    model: &mut Model,
    result: Result<GraphResponse, GraphError>,
) -> Vec<Effect> {
    let ticket = model.feed.fetch().in_flight().expect("a request in flight");
    app.update(
        Event::RefetchCompleted {
            ticket,
            result: Box::new(result),
        },
        model,
    )
    .effects
}

fn events_view(model: &Model) -> events_shared::view::EventsView {
    match App.view(model).screen {
        ScreenView::Events(view) => view,
        other => panic!("expected the events screen, got {other:?}"),
    }
}

#[test]
fn test_startup_without_session_mounts_auth_stack() {
    let (app, mut model) = start(None);
    assert_eq!(model.root, Some(RouteName::NonLoggedApp));
    assert_eq!(model.current_route(), Some(RouteName::Auth));
    assert_eq!(app.view(&model).screen, ScreenView::SignedOut);

    let update = app.update(Event::RefreshRequested, &mut model);
    assert!(graph_ops(update.effects).is_empty());
}

#[test]
fn test_startup_with_session_requests_location_once() {
    let app = Tester::default();
    let mut model = Model::default();
    app.update(Event::AppStarted { config_json: None }, &mut model);
    let update = app.update(
        Event::SessionRestored(Box::new(Ok(Some(b"token".to_vec())))),
        &mut model,
    );

    assert_eq!(model.root, Some(RouteName::LoggedApp));
    assert_eq!(model.current_route(), Some(RouteName::Events));
    assert!(model.is_signed_in());
    let geolocation = update
        .effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Geolocation(_)))
        .count();
    assert_eq!(geolocation, 1);
    assert!(update.effects.iter().any(|effect| matches!(
        effect,
        Effect::Navigation(request)
            if request.operation == NavigationOperation::ResetRoot { route: RouteName::LoggedApp }
    )));

    assert!(events_view(&model).is_locating);
    assert_eq!(events_view(&model).empty_text, None);
}

#[test]
fn test_location_fix_issues_forced_initial_query() {
    let (app, mut model) = start(Some("token"));
    let update = app.update(
        Event::LocationReceived(Box::new(Ok(Position {
            longitude: -46.6333,
            latitude: -23.5505,
        }))),
        &mut model,
    );

    let ops = graph_ops(update.effects);
    assert_matches!(ops.as_slice(), [GraphOperation::Refetch(request)] => {
        assert!(request.force);
        assert_eq!(request.variables.filters.distance, 80);
        assert_eq!(request.variables.pagination.first, 10);
        let coordinates = request.variables.filters.coordinates.expect("coordinates");
        assert!((coordinates.longitude() - -46.6333).abs() < f64::EPSILON);
    });
    assert!(events_view(&model).is_refreshing);
}

#[test]
fn test_refresh_is_single_flight() {
    let (app, mut model) = loaded(page(0..10, true));

    let first = app.update(Event::RefreshRequested, &mut model);
    assert_eq!(graph_ops(first.effects).len(), 1);

    for _ in 0..5 {
        let again = app.update(Event::RefreshRequested, &mut model);
        assert!(graph_ops(again.effects).is_empty());
    }

    complete(&app, &mut model, Ok(GraphResponse::Connection(page(0..3, false))));
    let view = events_view(&model);
    assert!(!view.is_refreshing);
    assert_eq!(view.items.len(), 3);

    let after = app.update(Event::RefreshRequested, &mut model);
    assert_matches!(graph_ops(after.effects).as_slice(), [GraphOperation::Refetch(r)] if r.force);
}

#[test]
fn test_load_more_grows_list_by_increment() {
    let (app, mut model) = loaded(page(0..10, true));
    assert_eq!(events_view(&model).items.len(), 10);

    let update = app.update(Event::EndReached, &mut model);
    assert_matches!(graph_ops(update.effects).as_slice(), [GraphOperation::Refetch(request)] => {
        assert!(!request.force);
        assert_eq!(request.variables.pagination.first, 10);
        assert_eq!(request.variables.pagination.after.as_deref(), Some("c9"));
        assert_eq!(request.render.map(|r| r.first), Some(20));
    });
    assert!(events_view(&model).is_fetching_more);

    let duplicate = app.update(Event::EndReached, &mut model);
    assert!(graph_ops(duplicate.effects).is_empty());

    complete(&app, &mut model, Ok(GraphResponse::Connection(page(0..20, false))));
    let view = events_view(&model);
    assert_eq!(view.items.len(), 20);
    assert!(!view.is_fetching_more);
    assert!(!view.has_next_page);

    let exhausted = app.update(Event::EndReached, &mut model);
    assert!(graph_ops(exhausted.effects).is_empty());
}

#[test]
fn test_failed_refresh_keeps_stale_items() {
    let (app, mut model) = loaded(page(0..4, false));
    app.update(Event::RefreshRequested, &mut model);
    complete(
        &app,
        &mut model,
        Err(GraphError::Network {
            message: "offline".into(),
        }),
    );

    let view = events_view(&model);
    assert_eq!(view.items.len(), 4);
    assert!(!view.is_refreshing);
    assert!(view.refresh_error.is_some());

    app.update(Event::RefreshErrorDismissed, &mut model);
    assert_eq!(events_view(&model).refresh_error, None);
}

#[test]
fn test_search_then_toggle_off_refetches_twice() {
    let (app, mut model) = loaded(page(0..2, false));

    let show = app.update(Event::SearchToggled, &mut model);
    assert!(graph_ops(show.effects).is_empty());
    assert!(events_view(&model).search_visible);

    let typed = app.update(
        Event::SearchChanged {
            text: "jazz".into(),
        },
        &mut model,
    );
    assert_matches!(graph_ops(typed.effects).as_slice(), [GraphOperation::Refetch(r)] => {
        assert_eq!(r.variables.filters.search, "jazz");
    });
    complete(&app, &mut model, Ok(GraphResponse::Connection(page(0..1, false))));

    let hide = app.update(Event::SearchToggled, &mut model);
    assert_matches!(graph_ops(hide.effects).as_slice(), [GraphOperation::Refetch(r)] => {
        assert_eq!(r.variables.filters.search, "");
    });
    assert!(!events_view(&model).search_visible);
}

#[test]
fn test_distance_selection_closes_overlay() {
    let (app, mut model) = loaded(page(0..2, false));
    app.update(Event::DistanceOverlayOpened, &mut model);
    assert!(events_view(&model).distance_overlay_visible);

    let update = app.update(Event::DistanceSelected { radius: 20 }, &mut model);
    assert_matches!(graph_ops(update.effects).as_slice(), [GraphOperation::Refetch(r)] => {
        assert_eq!(r.variables.filters.distance, 20);
    });
    let view = events_view(&model);
    assert!(!view.distance_overlay_visible);
    assert_eq!(view.distance_label, "20 km");
}

#[test]
fn test_geolocation_failure_leaves_list_empty() {
    let (app, mut model) = start(Some("token"));
    let update = app.update(
        Event::LocationReceived(Box::new(Err(GeolocationError::Timeout))),
        &mut model,
    );
    assert!(graph_ops(update.effects).is_empty());

    let view = events_view(&model);
    assert!(view.items.is_empty());
    assert!(view.location_error.is_some());
    assert!(!view.is_locating);
    assert_eq!(view.empty_text, None);
}

#[test]
fn test_empty_result_shows_empty_text() {
    let (_app, model) = loaded(Page::default());
    assert_eq!(
        events_view(&model).empty_text.as_deref(),
        Some(EMPTY_EVENTS_TEXT)
    );
}

#[test]
fn test_item_tap_opens_details_and_owner_can_edit() {
    let mut first = page(0..1, false);
    first.edges[0].node = record("mine");
    let (app, mut model) = loaded(first);

    let update = app.update(
        Event::OpenEventDetails {
            id: EventId::new("mine"),
        },
        &mut model,
    );
    assert_eq!(model.current_route(), Some(RouteName::EventDetails));
    let mut navigated = false;
    let mut fetched = false;
    for effect in update.effects {
        match effect {
            Effect::Navigation(request) => {
                assert_matches!(request.operation, NavigationOperation::Navigate { route: RouteName::EventDetails, params } => {
                    assert_eq!(params.id, Some(EventId::new("mine")));
                });
                navigated = true;
            }
            Effect::GraphQl(request) => {
                assert_eq!(
                    request.operation,
                    GraphOperation::FetchEvent {
                        id: EventId::new("mine")
                    }
                );
                fetched = true;
            }
            _ => {}
        }
    }
    assert!(navigated && fetched);

    app.update(
        Event::DetailsLoaded {
            id: EventId::new("mine"),
            result: Box::new(Ok(GraphResponse::Event(Some(record("mine"))))),
        },
        &mut model,
    );
    match app.view(&model).screen {
        ScreenView::Details(details) => {
            assert!(details.can_edit);
            assert_eq!(details.address, "Rua Augusta");
            assert_eq!(details.date_label.as_deref(), Some("Oct 17th 2026"));
        }
        other => panic!("expected details, got {other:?}"),
    }

    let edit = app.update(Event::EditEvent, &mut model);
    assert_eq!(model.current_route(), Some(RouteName::EventAdd));
    assert!(model.draft.is_some());
    assert!(graph_ops(edit.effects)
        .iter()
        .any(|op| matches!(op, GraphOperation::FetchEvent { id } if id.as_str() == "mine")));

    app.update(Event::NavigateBack, &mut model);
    assert_eq!(model.current_route(), Some(RouteName::EventDetails));
    assert!(model.draft.is_none());
    app.update(Event::NavigateBack, &mut model);
    assert_eq!(model.current_route(), Some(RouteName::Events));
}

#[test]
fn test_stale_details_response_is_ignored() {
    let (app, mut model) = loaded(page(0..2, false));
    app.update(
        Event::OpenEventDetails {
            id: EventId::new("e0"),
        },
        &mut model,
    );
    app.update(
        Event::DetailsLoaded {
            id: EventId::new("e1"),
            result: Box::new(Ok(GraphResponse::Event(Some(record("e1"))))),
        },
        &mut model,
    );
    match app.view(&model).screen {
        ScreenView::Details(details) => assert!(details.is_loading),
        other => panic!("expected details, got {other:?}"),
    }
}

#[test]
fn test_sign_in_and_out_switch_root() {
    let (app, mut model) = start(None);

    let update = app.update(
        Event::SignedIn {
            token: SecretString::new("fresh".into()),
        },
        &mut model,
    );
    assert_eq!(model.root, Some(RouteName::LoggedApp));
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::KeyValue(_))));
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Geolocation(_))));

    let update = app.update(Event::SignedOut, &mut model);
    assert_eq!(model.root, Some(RouteName::NonLoggedApp));
    assert!(!model.is_signed_in());
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::KeyValue(_))));
}

#[test]
fn test_late_response_from_previous_session_is_ignored() {
    let here = || {
        Event::LocationReceived(Box::new(Ok(Position {
            longitude: -46.6333,
            latitude: -23.5505,
        })))
    };
    let (app, mut model) = start(Some("alice"));
    app.update(here(), &mut model);
    let old_ticket = model.feed.fetch().in_flight().expect("first query in flight");

    app.update(Event::SignedOut, &mut model);
    app.update(
        Event::SignedIn {
            token: SecretString::new("bob".into()),
        },
        &mut model,
    );
    app.update(here(), &mut model);
    let new_ticket = model.feed.fetch().in_flight().expect("second query in flight");
    assert_ne!(new_ticket, old_ticket);

    app.update(
        Event::RefetchCompleted {
            ticket: old_ticket,
            result: Box::new(Ok(GraphResponse::Connection(page(0..3, false)))),
        },
        &mut model,
    );
    assert!(model.feed.fetch().page().is_empty());
    assert_eq!(model.feed.fetch().in_flight(), Some(new_ticket));

    complete(&app, &mut model, Ok(GraphResponse::Connection(page(10..12, false))));
    let ids: Vec<String> = events_view(&model).items.into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["e10".to_string(), "e11".to_string()]);
}
