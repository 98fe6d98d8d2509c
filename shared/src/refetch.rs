//! Single-flight refetch controller and the incremental list accumulator.
//!
//! Two request classes share one in-flight slot:
//!
//! - **Refresh** re-runs the query from the top with `force = true`. It is
//!   dropped while another refresh is in flight and supersedes a load-more.
//! - **Load more** asks the data layer for the next `page_increment` items
//!   after the last cursor while rendering the whole accumulated window, with
//!   `force = false` so known pages may come from the cache.
//!
//! The slot is claimed before the request is handed out, and every request
//! carries a [`Ticket`]. Completions whose ticket no longer owns the slot are
//! ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::{EventRecord, QueryDescriptor, RefetchRequest, RenderVariables};
use crate::query::{QueryParameters, QueryPatch};
use crate::{AppError, AppResult, EventId};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub node: EventRecord,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Page {
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Folds a newer page into this one. Known ids are updated in place,
    /// unknown ids are appended in the order received. Existing edges are
    /// never reordered or duplicated.
    pub fn merge(&mut self, newer: Page) {
        let mut index: HashMap<EventId, usize> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, edge)| (edge.node.id.clone(), i))
            .collect();

        for edge in newer.edges {
            match index.get(&edge.node.id) {
                Some(&i) => self.edges[i] = edge,
                None => {
                    index.insert(edge.node.id.clone(), self.edges.len());
                    self.edges.push(edge);
                }
            }
        }
        self.page_info = newer.page_info;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchState {
    pub is_refreshing: bool,
    pub is_fetching_more: bool,
    pub has_position: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestClass {
    Refresh,
    LoadMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub generation: u64,
    pub class: RequestClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone)]
pub struct RefetchController {
    state: FetchState,
    in_flight: Option<Ticket>,
    next_generation: u64,
    page: Page,
    page_increment: u32,
    last_error: Option<AppError>,
}

impl RefetchController {
    #[must_use]
    pub fn new(page_increment: u32) -> Self {
        Self {
            state: FetchState::default(),
            in_flight: None,
            next_generation: 1,
            page: Page::default(),
            page_increment,
            last_error: None,
        }
    }

    /// Continues ticket numbering at `generation`, so completions addressed
    /// to a controller this one replaces can never match its tickets.
    #[must_use]
    pub fn starting_at(mut self, generation: u64) -> Self {
        self.next_generation = generation.max(1);
        self
    }

    #[must_use]
    pub fn next_generation(&self) -> u64 {
        self.next_generation
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.page.len()
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.page.page_info.has_next_page
    }

    /// The last refresh or load-more failure. Cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Starts a refresh with `params`, restarting from the top of the list.
    /// Returns `None` when a refresh is already in flight.
    pub fn begin_refresh(&mut self, params: &QueryParameters) -> Option<(Ticket, RefetchRequest)> {
        if self.state.is_refreshing {
            debug!("refetch dropped, refresh already in flight");
            return None;
        }

        if self.state.is_fetching_more {
            debug!("refresh supersedes in-flight load more");
            self.state.is_fetching_more = false;
        }

        self.state.is_refreshing = true;
        let ticket = self.claim(RequestClass::Refresh);

        let variables = params.apply(&QueryPatch::default().with_cursor(None));
        let request = RefetchRequest {
            variables: QueryDescriptor::from_params(&variables),
            render: None,
            force: true,
        };
        Some((ticket, request))
    }

    /// Starts a load-more. Returns `None` when the last page reported no
    /// next page, or while any request is in flight.
    pub fn begin_load_more(
        &mut self,
        params: &QueryParameters,
    ) -> Option<(Ticket, RefetchRequest)> {
        if !self.has_next_page() {
            debug!("load more skipped, no next page");
            return None;
        }
        if self.state.is_fetching_more || self.state.is_refreshing {
            debug!("load more dropped, request already in flight");
            return None;
        }

        self.state.is_fetching_more = true;
        let ticket = self.claim(RequestClass::LoadMore);

        let requested_total = u32::try_from(self.rendered_count())
            .unwrap_or(u32::MAX)
            .saturating_add(self.page_increment);

        let variables = params.apply(
            &QueryPatch::default()
                .with_page_size(self.page_increment)
                .with_cursor(self.page.page_info.end_cursor.clone()),
        );
        let request = RefetchRequest {
            variables: QueryDescriptor::from_params(&variables),
            render: Some(RenderVariables {
                first: requested_total,
            }),
            force: false,
        };
        Some((ticket, request))
    }

    /// Applies the outcome of the request identified by `ticket`.
    pub fn complete(&mut self, ticket: Ticket, result: AppResult<Page>) -> Completion {
        if self.in_flight != Some(ticket) {
            debug!(generation = ticket.generation, "ignoring stale completion");
            return Completion::Stale;
        }

        self.in_flight = None;
        self.state.is_refreshing = false;
        self.state.is_fetching_more = false;
        if ticket.class == RequestClass::Refresh {
            self.state.has_position = true;
        }

        match result {
            Ok(page) => {
                match ticket.class {
                    RequestClass::Refresh => self.page = page,
                    RequestClass::LoadMore => self.page.merge(page),
                }
                self.last_error = None;
                Completion::Applied
            }
            Err(error) => {
                warn!(
                    class = ?ticket.class,
                    code = error.code(),
                    "refetch failed, keeping stale data"
                );
                self.last_error = Some(error);
                Completion::Failed
            }
        }
    }

    fn claim(&mut self, class: RequestClass) -> Ticket {
        let ticket = Ticket {
            generation: self.next_generation,
            class,
        };
        self.next_generation += 1;
        self.in_flight = Some(ticket);
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::EventRecord;
    use crate::{Coordinates, ErrorKind};

    fn record(id: &str) -> EventRecord {
        EventRecord {
            id: EventId::new(id),
            title: format!("Event {id}"),
            description: String::new(),
            date: String::new(),
            is_owner: false,
            is_event_attended: false,
            location: crate::capabilities::EventLocation::default(),
            schedule: vec![],
            public_list: vec![],
            public_limit: None,
        }
    }

    fn page(ids: &[&str], has_next_page: bool, end_cursor: &str) -> Page {
        Page {
            edges: ids
                .iter()
                .map(|id| Edge {
                    node: record(id),
                    cursor: Some(format!("cursor-{id}")),
                })
                .collect(),
            page_info: PageInfo {
                has_next_page,
                end_cursor: Some(end_cursor.to_string()),
            },
        }
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.edges.iter().map(|e| e.node.id.as_str()).collect()
    }

    fn params() -> QueryParameters {
        let mut p = QueryParameters::new(80, 10);
        p.coordinates = Some(Coordinates::new(-46.6, -23.5).unwrap());
        p
    }

    mod refresh_tests {
        use super::*;

        #[test]
        fn test_refresh_is_forced_and_starts_at_top() {
            let mut ctl = RefetchController::new(10);
            let mut p = params();
            p.cursor = Some("stale".into());
            let (ticket, request) = ctl.begin_refresh(&p).unwrap();
            assert_eq!(ticket.class, RequestClass::Refresh);
            assert!(request.force);
            assert!(request.render.is_none());
            assert_eq!(request.variables.pagination.after, None);
            assert_eq!(request.variables.pagination.first, 10);
            assert!(ctl.state().is_refreshing);
        }

        #[test]
        fn test_second_refresh_dropped_while_in_flight() {
            let mut ctl = RefetchController::new(10);
            assert!(ctl.begin_refresh(&params()).is_some());
            assert!(ctl.begin_refresh(&params()).is_none());
            assert!(ctl.begin_refresh(&params()).is_none());
        }

        #[test]
        fn test_completion_clears_flags_and_sets_position() {
            let mut ctl = RefetchController::new(10);
            let (ticket, _) = ctl.begin_refresh(&params()).unwrap();
            let outcome = ctl.complete(ticket, Ok(page(&["a", "b"], true, "b")));
            assert_eq!(outcome, Completion::Applied);
            let state = ctl.state();
            assert!(!state.is_refreshing);
            assert!(!state.is_fetching_more);
            assert!(state.has_position);
            assert_eq!(ids(ctl.page()), vec!["a", "b"]);
        }

        #[test]
        fn test_failure_keeps_stale_page_and_surfaces_error() {
            let mut ctl = RefetchController::new(10);
            let (t1, _) = ctl.begin_refresh(&params()).unwrap();
            ctl.complete(t1, Ok(page(&["a"], false, "a")));

            let (t2, _) = ctl.begin_refresh(&params()).unwrap();
            let outcome = ctl.complete(t2, Err(AppError::new(ErrorKind::RemoteFetch, "boom")));
            assert_eq!(outcome, Completion::Failed);
            assert!(!ctl.state().is_refreshing);
            assert_eq!(ids(ctl.page()), vec!["a"]);
            assert_eq!(ctl.last_error().map(|e| e.kind), Some(ErrorKind::RemoteFetch));

            let (t3, _) = ctl.begin_refresh(&params()).unwrap();
            ctl.complete(t3, Ok(page(&["b"], false, "b")));
            assert!(ctl.last_error().is_none());
        }

        #[test]
        fn test_refresh_replaces_list() {
            let mut ctl = RefetchController::new(10);
            let (t1, _) = ctl.begin_refresh(&params()).unwrap();
            ctl.complete(t1, Ok(page(&["a", "b"], true, "b")));
            let (t2, _) = ctl.begin_refresh(&params()).unwrap();
            ctl.complete(t2, Ok(page(&["c"], false, "c")));
            assert_eq!(ids(ctl.page()), vec!["c"]);
        }

        #[test]
        fn test_successor_never_reuses_tickets() {
            let mut old = RefetchController::new(10);
            let (old_ticket, _) = old.begin_refresh(&params()).unwrap();

            let mut new = RefetchController::new(10).starting_at(old.next_generation());
            let (new_ticket, _) = new.begin_refresh(&params()).unwrap();
            assert_ne!(old_ticket, new_ticket);

            assert_eq!(
                new.complete(old_ticket, Ok(page(&["old"], false, "old"))),
                Completion::Stale
            );
            assert!(new.page().is_empty());
            assert_eq!(new.in_flight(), Some(new_ticket));
        }
    }

    mod load_more_tests {
        use super::*;

        fn loaded(ids: &[&str], has_next: bool) -> RefetchController {
            let mut ctl = RefetchController::new(10);
            let (t, _) = ctl.begin_refresh(&params()).unwrap();
            ctl.complete(t, Ok(page(ids, has_next, ids.last().copied().unwrap_or(""))));
            ctl
        }

        #[test]
        fn test_no_op_without_next_page() {
            let mut ctl = loaded(&["a"], false);
            assert!(ctl.begin_load_more(&params()).is_none());
            assert!(!ctl.state().is_fetching_more);
        }

        #[test]
        fn test_no_op_before_first_page() {
            let mut ctl = RefetchController::new(10);
            assert!(ctl.begin_load_more(&params()).is_none());
        }

        #[test]
        fn test_request_shape() {
            let all: Vec<String> = (0..10).map(|i| format!("e{i}")).collect();
            let refs: Vec<&str> = all.iter().map(String::as_str).collect();
            let mut ctl = loaded(&refs, true);

            let (ticket, request) = ctl.begin_load_more(&params()).unwrap();
            assert_eq!(ticket.class, RequestClass::LoadMore);
            assert!(!request.force);
            assert_eq!(request.variables.pagination.first, 10);
            assert_eq!(request.variables.pagination.after.as_deref(), Some("e9"));
            assert_eq!(request.render, Some(RenderVariables { first: 20 }));
            assert!(ctl.state().is_fetching_more);
        }

        #[test]
        fn test_single_in_flight_load_more() {
            let mut ctl = loaded(&["a"], true);
            assert!(ctl.begin_load_more(&params()).is_some());
            assert!(ctl.begin_load_more(&params()).is_none());
        }

        #[test]
        fn test_blocked_while_refreshing() {
            let mut ctl = loaded(&["a"], true);
            ctl.begin_refresh(&params()).unwrap();
            assert!(ctl.begin_load_more(&params()).is_none());
            let state = ctl.state();
            assert!(!(state.is_refreshing && state.is_fetching_more));
        }

        #[test]
        fn test_completion_grows_by_increment() {
            let first: Vec<String> = (0..10).map(|i| format!("e{i}")).collect();
            let refs: Vec<&str> = first.iter().map(String::as_str).collect();
            let mut ctl = loaded(&refs, true);
            let (ticket, _) = ctl.begin_load_more(&params()).unwrap();

            // The data layer renders the full window it was asked for.
            let window: Vec<String> = (0..20).map(|i| format!("e{i}")).collect();
            let window_refs: Vec<&str> = window.iter().map(String::as_str).collect();
            ctl.complete(ticket, Ok(page(&window_refs, true, "e19")));

            assert_eq!(ctl.rendered_count(), 20);
            assert_eq!(ids(ctl.page()), window_refs);
            assert!(!ctl.state().is_fetching_more);
            assert!(!ctl.state().is_refreshing);
        }

        #[test]
        fn test_suffix_only_response_appends() {
            let mut ctl = loaded(&["a", "b"], true);
            let (ticket, _) = ctl.begin_load_more(&params()).unwrap();
            ctl.complete(ticket, Ok(page(&["c", "d"], false, "d")));
            assert_eq!(ids(ctl.page()), vec!["a", "b", "c", "d"]);
            assert!(!ctl.has_next_page());
        }

        #[test]
        fn test_refresh_supersedes_load_more() {
            let mut ctl = loaded(&["a"], true);
            let (load_more, _) = ctl.begin_load_more(&params()).unwrap();
            let (refresh, _) = ctl.begin_refresh(&params()).unwrap();
            assert!(!ctl.state().is_fetching_more);

            assert_eq!(
                ctl.complete(load_more, Ok(page(&["x"], true, "x"))),
                Completion::Stale
            );
            assert!(ctl.state().is_refreshing);

            assert_eq!(
                ctl.complete(refresh, Ok(page(&["b"], false, "b"))),
                Completion::Applied
            );
            assert_eq!(ids(ctl.page()), vec!["b"]);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_merge_updates_known_ids_in_place() {
            let mut current = page(&["a", "b"], true, "b");
            let mut newer = page(&["b", "c"], false, "c");
            newer.edges[0].node.title = "Renamed".into();
            current.merge(newer);
            assert_eq!(ids(&current), vec!["a", "b", "c"]);
            assert_eq!(current.edges[1].node.title, "Renamed");
            assert!(!current.page_info.has_next_page);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Refresh,
            LoadMore,
            Complete,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Refresh), Just(Op::LoadMore), Just(Op::Complete)]
        }

        proptest! {
            #[test]
            fn at_most_one_request_in_flight(ops in proptest::collection::vec(op(), 1..60)) {
                let mut ctl = RefetchController::new(10);
                let mut outstanding: Vec<Ticket> = Vec::new();
                let mut next_id = 0u32;

                for op in ops {
                    match op {
                        Op::Refresh => {
                            let was_refreshing = ctl.state().is_refreshing;
                            let issued = ctl.begin_refresh(&params());
                            prop_assert_eq!(issued.is_some(), !was_refreshing);
                            if let Some((t, _)) = issued {
                                outstanding.push(t);
                            }
                        }
                        Op::LoadMore => {
                            if let Some((t, _)) = ctl.begin_load_more(&params()) {
                                outstanding.push(t);
                            }
                        }
                        Op::Complete => {
                            if let Some(t) = outstanding.pop() {
                                next_id += 1;
                                let id = format!("n{next_id}");
                                ctl.complete(t, Ok(page(&[id.as_str()], true, &id)));
                            }
                        }
                    }
                    let state = ctl.state();
                    prop_assert!(!(state.is_refreshing && state.is_fetching_more));
                    let live = outstanding
                        .iter()
                        .filter(|t| ctl.in_flight() == Some(**t))
                        .count();
                    prop_assert!(live <= 1);
                }
            }

            #[test]
            fn merge_never_reorders_or_duplicates(
                existing in proptest::collection::btree_set(0u8..40, 0..15),
                incoming in proptest::collection::vec(0u8..40, 0..15),
            ) {
                let existing: Vec<String> = existing.iter().map(|i| format!("e{i}")).collect();
                let incoming: Vec<String> = incoming.iter().map(|i| format!("e{i}")).collect();
                let existing_refs: Vec<&str> = existing.iter().map(String::as_str).collect();
                let incoming_refs: Vec<&str> = incoming.iter().map(String::as_str).collect();

                let mut current = page(&existing_refs, true, "x");
                current.merge(page(&incoming_refs, true, "y"));
                let merged = ids(&current);

                prop_assert_eq!(&merged[..existing_refs.len()], &existing_refs[..]);
                let mut seen = std::collections::HashSet::new();
                for id in &merged {
                    prop_assert!(seen.insert(*id));
                }
            }
        }
    }
}
