use secrecy::SecretString;

use crate::capabilities::RepeatHandles;
use crate::config::AppConfig;
use crate::details::EventDetails;
use crate::draft::EventDraft;
use crate::feed::EventsFeed;
use crate::routes::{Route, RouteName, RouteTable};

/// Runtime-only: the session token never leaves the core except through
/// key-value storage.
#[derive(Debug)]
pub struct Model {
    pub config: AppConfig,
    pub session: Option<SecretString>,
    pub routes: RouteTable,
    /// `None` until the stored session has been checked.
    pub root: Option<RouteName>,
    pub route: Option<Route>,
    pub back_stack: Vec<Route>,

    // Screens. Each owns its controller state exclusively.
    pub feed: EventsFeed,
    pub draft: Option<EventDraft>,
    pub details: Option<EventDetails>,
    /// Outlives drafts, so a late tick from a closed draft never matches.
    pub hold_handles: RepeatHandles,
}

impl Model {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            feed: EventsFeed::new(&config),
            config,
            session: None,
            routes: RouteTable::default(),
            root: None,
            route: None,
            back_stack: Vec::new(),
            draft: None,
            details: None,
            hold_handles: RepeatHandles::default(),
        }
    }

    /// Starts over with `config`. Ticket and handle numbering carry on, so
    /// responses to requests from before the restart are still recognised
    /// as stale.
    pub fn restart(&mut self, config: AppConfig) {
        let previous = std::mem::replace(self, Self::new(config));
        self.feed = EventsFeed::replacing(&self.config, &previous.feed);
        self.hold_handles = previous.hold_handles;
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn current_route(&self) -> Option<RouteName> {
        self.route.as_ref().map(|route| route.name)
    }

    /// Mounts `root` and its initial screen, dropping every screen above it.
    pub fn reset_root(&mut self, root: RouteName) {
        let initial = self
            .routes
            .initial_route(root)
            .unwrap_or(RouteName::Auth);
        self.root = Some(root);
        self.route = Some(Route::new(initial));
        self.back_stack.clear();
        self.details = None;
    }

    pub fn push_route(&mut self, route: Route) {
        if let Some(current) = self.route.replace(route) {
            self.back_stack.push(current);
        }
    }

    pub fn pop_route(&mut self) -> Option<&Route> {
        let previous = self.back_stack.pop()?;
        self.route = Some(previous);
        self.route.as_ref()
    }

    /// A fresh list screen, e.g. after switching accounts.
    pub fn reset_feed(&mut self) {
        self.feed = EventsFeed::replacing(&self.config, &self.feed);
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteParams;
    use crate::EventId;

    #[test]
    fn test_reset_root_mounts_initial_screen() {
        let mut model = Model::default();
        model.reset_root(RouteName::LoggedApp);
        assert_eq!(model.current_route(), Some(RouteName::Events));
        model.reset_root(RouteName::NonLoggedApp);
        assert_eq!(model.current_route(), Some(RouteName::Auth));
    }

    #[test]
    fn test_push_and_pop() {
        let mut model = Model::default();
        model.reset_root(RouteName::LoggedApp);
        model.push_route(Route {
            name: RouteName::EventDetails,
            params: RouteParams::with_id(EventId::new("42")),
        });
        assert_eq!(model.back_stack.len(), 1);
        assert_eq!(model.pop_route().map(|r| r.name), Some(RouteName::Events));
        assert!(model.pop_route().is_none());
        assert_eq!(model.current_route(), Some(RouteName::Events));
    }

    #[test]
    fn test_reset_feed_keeps_ticket_numbering() {
        let mut model = Model::default();
        let before = model.feed.fetch().next_generation();
        model.feed.begin_locating();
        let coordinates = crate::Coordinates::new(-46.6, -23.5).unwrap();
        let (ticket, _) = model.feed.on_position(coordinates).unwrap();
        assert_eq!(ticket.generation, before);

        model.reset_feed();
        assert!(model.feed.fetch().next_generation() > ticket.generation);
    }

    #[test]
    fn test_restart_keeps_counters() {
        let mut model = Model::default();
        let first = model.hold_handles.allocate();
        model.feed.begin_locating();
        let coordinates = crate::Coordinates::new(-46.6, -23.5).unwrap();
        let (ticket, _) = model.feed.on_position(coordinates).unwrap();

        model.restart(AppConfig::default());
        assert!(model.root.is_none());
        assert_ne!(model.hold_handles.allocate(), first);
        assert!(model.feed.fetch().next_generation() > ticket.generation);
    }
}
