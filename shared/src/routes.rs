use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteName {
    LoggedApp,
    NonLoggedApp,
    Auth,
    Login,
    Register,
    InnerAppDrawer,
    Events,
    EventAdd,
    EventDetails,
}

impl RouteName {
    pub const ALL: [RouteName; 9] = [
        RouteName::LoggedApp,
        RouteName::NonLoggedApp,
        RouteName::Auth,
        RouteName::Login,
        RouteName::Register,
        RouteName::InnerAppDrawer,
        RouteName::Events,
        RouteName::EventAdd,
        RouteName::EventDetails,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RouteName::LoggedApp => "LoggedApp",
            RouteName::NonLoggedApp => "NonLoggedApp",
            RouteName::Auth => "Auth",
            RouteName::Login => "Login",
            RouteName::Register => "Register",
            RouteName::InnerAppDrawer => "InnerAppDrawer",
            RouteName::Events => "Events",
            RouteName::EventAdd => "EventAdd",
            RouteName::EventDetails => "EventDetails",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RouteError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),

    #[error("route {route} is not reachable from {navigator}")]
    Unreachable {
        route: RouteName,
        navigator: RouteName,
    },

    #[error("route {0} requires an event id")]
    MissingId(RouteName),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
}

impl RouteParams {
    #[must_use]
    pub fn with_id(id: EventId) -> Self {
        Self { id: Some(id) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: RouteName,
    pub params: RouteParams,
}

impl Route {
    #[must_use]
    pub fn new(name: RouteName) -> Self {
        Self {
            name,
            params: RouteParams::default(),
        }
    }

    /// Checks the params a screen needs before it is shown.
    pub fn validate(&self) -> Result<(), RouteError> {
        match self.name {
            RouteName::EventDetails if self.params.id.is_none() => {
                Err(RouteError::MissingId(self.name))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigatorKind {
    Stack,
    Drawer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEntry {
    Screen(RouteName),
    Navigator(Navigator),
}

impl RouteEntry {
    fn name(&self) -> RouteName {
        match self {
            RouteEntry::Screen(name) => *name,
            RouteEntry::Navigator(navigator) => navigator.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    pub name: RouteName,
    pub kind: NavigatorKind,
    pub initial: RouteName,
    pub entries: Vec<RouteEntry>,
}

impl Navigator {
    #[must_use]
    pub fn contains(&self, route: RouteName) -> bool {
        self.name == route
            || self.entries.iter().any(|entry| match entry {
                RouteEntry::Screen(name) => *name == route,
                RouteEntry::Navigator(nested) => nested.contains(route),
            })
    }

    fn find(&self, route: RouteName) -> Option<&Navigator> {
        if self.name == route {
            return Some(self);
        }
        self.entries.iter().find_map(|entry| match entry {
            RouteEntry::Navigator(nested) => nested.find(route),
            RouteEntry::Screen(_) => None,
        })
    }

    /// Follows initial routes down to the first screen shown.
    #[must_use]
    pub fn initial_screen(&self) -> RouteName {
        match self.entries.iter().find(|entry| entry.name() == self.initial) {
            Some(RouteEntry::Navigator(nested)) => nested.initial_screen(),
            _ => self.initial,
        }
    }
}

/// The root switch. Exactly one of its navigators is mounted at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    navigators: Vec<Navigator>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let non_logged = Navigator {
            name: RouteName::NonLoggedApp,
            kind: NavigatorKind::Stack,
            initial: RouteName::Auth,
            entries: vec![
                RouteEntry::Screen(RouteName::Auth),
                RouteEntry::Screen(RouteName::Login),
                RouteEntry::Screen(RouteName::Register),
            ],
        };
        let drawer = Navigator {
            name: RouteName::InnerAppDrawer,
            kind: NavigatorKind::Drawer,
            initial: RouteName::Events,
            entries: vec![
                RouteEntry::Screen(RouteName::Events),
                RouteEntry::Screen(RouteName::EventAdd),
            ],
        };
        let logged = Navigator {
            name: RouteName::LoggedApp,
            kind: NavigatorKind::Stack,
            initial: RouteName::Events,
            entries: vec![
                RouteEntry::Navigator(drawer),
                RouteEntry::Screen(RouteName::Events),
                RouteEntry::Screen(RouteName::EventAdd),
                RouteEntry::Screen(RouteName::EventDetails),
            ],
        };
        Self {
            navigators: vec![logged, non_logged],
        }
    }
}

impl RouteTable {
    /// The root switch picks the logged-in stack when a token is present.
    #[must_use]
    pub fn root_navigator(has_token: bool) -> RouteName {
        if has_token {
            RouteName::LoggedApp
        } else {
            RouteName::NonLoggedApp
        }
    }

    #[must_use]
    pub fn contains(&self, route: RouteName) -> bool {
        self.navigators.iter().any(|n| n.contains(route))
    }

    /// First screen shown by `navigator`, if it names one.
    #[must_use]
    pub fn initial_route(&self, navigator: RouteName) -> Option<RouteName> {
        self.navigators
            .iter()
            .find_map(|n| n.find(navigator))
            .map(Navigator::initial_screen)
    }

    /// Ensures `route` can be pushed while `navigator` is the active root.
    pub fn check(&self, navigator: RouteName, route: RouteName) -> Result<(), RouteError> {
        let reachable = self
            .navigators
            .iter()
            .any(|n| n.name == navigator && n.contains(route));
        if reachable {
            Ok(())
        } else {
            Err(RouteError::Unreachable { route, navigator })
        }
    }
}
