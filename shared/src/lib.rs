// lib.rs - Shared core for the nearby events app

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod details;
pub mod draft;
pub mod event;
pub mod feed;
pub mod format;
pub mod model;
pub mod query;
pub mod refetch;
pub mod routes;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;
pub use crux_core::{render::Render, App as CruxApp};

pub const INITIAL_PAGE_SIZE: u32 = 10;
pub const PAGE_INCREMENT: u32 = 10;
pub const DEFAULT_DISTANCE: u32 = 80;
pub const HOLD_REPEAT_INTERVAL_MS: u64 = 80;
pub const GEOLOCATION_TIMEOUT_MS: u64 = 20_000;
pub const GEOLOCATION_MAX_AGE_MS: u64 = 20_000;
pub const DEFAULT_ATTENDANCE_LIMIT: u32 = 10;
pub const TITLE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 100;
pub const SESSION_KEY: &str = "session_token";
pub const EMPTY_EVENTS_TEXT: &str = "Você não possui eventos próximos";
pub const GENERIC_WRITE_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    RemoteFetch,
    Write,
    Validation,
    NotFound,
    Unauthenticated,
    Geolocation,
    GeolocationPermissionDenied,
    Serialization,
    Storage,
    InvalidState,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::RemoteFetch => "REMOTE_FETCH_ERROR",
            Self::Write => "WRITE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthenticated => "AUTH_ERROR",
            Self::Geolocation => "LOCATION_ERROR",
            Self::GeolocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::RemoteFetch
            | Self::Storage
            | Self::Geolocation => ErrorSeverity::Transient,

            Self::Serialization | Self::InvalidState => ErrorSeverity::Fatal,

            Self::Write
            | Self::Validation
            | Self::NotFound
            | Self::Unauthenticated
            | Self::GeolocationPermissionDenied
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    /// Whether the user can usefully re-trigger the operation by hand.
    /// Nothing in the core retries automatically.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RemoteFetch | Self::Storage | Self::Geolocation
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and pull to refresh."
                    .into()
            }
            ErrorKind::Timeout => "The request timed out. Pull to refresh to try again.".into(),
            ErrorKind::RemoteFetch => {
                "Couldn't refresh events. Showing the last results you loaded.".into()
            }
            ErrorKind::Write | ErrorKind::Validation => {
                if self.message.is_empty() {
                    GENERIC_WRITE_ERROR.into()
                } else {
                    self.message.clone()
                }
            }
            ErrorKind::NotFound => "The requested event could not be found.".into(),
            ErrorKind::Unauthenticated => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Geolocation => {
                "Unable to determine your location. Nearby events need a location fix.".into()
            }
            ErrorKind::GeolocationPermissionDenied => {
                "Location access is required. Please enable location permissions in Settings."
                    .into()
            }
            ErrorKind::Serialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::Storage => "Unable to access local storage.".into(),
            ErrorKind::InvalidState => {
                "The app is in an invalid state. Please restart the app.".into()
            }
            ErrorKind::Unknown => GENERIC_WRITE_ERROR.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(EventId);
typed_id!(UserId);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

/// A WGS84 position. Serialized as `[longitude, latitude]`, the order the
/// graph API expects for its `coordinates` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct Coordinates {
    longitude: f64,
    latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoordinateError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.longitude, c.latitude]
    }
}

impl TryFrom<[f64; 2]> for Coordinates {
    type Error = CoordinateError;

    fn try_from([longitude, latitude]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(longitude, latitude)
    }
}
