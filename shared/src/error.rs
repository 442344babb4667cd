use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capabilities::{DialError, HttpError};
use crate::config::ConfigError;
use crate::model::CoordinateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSelection,
    SelectionFull,
    Validation,
    NetworkFailure,
    SearchFailure,
    EmergencyDialFailure,
    InvalidConfig,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidSelection => "INVALID_SELECTION",
            Self::SelectionFull => "SELECTION_FULL",
            Self::Validation => "VALIDATION_ERROR",
            Self::NetworkFailure => "NETWORK_FAILURE",
            Self::SearchFailure => "SEARCH_FAILURE",
            Self::EmergencyDialFailure => "EMERGENCY_DIAL_FAILURE",
            Self::InvalidConfig => "INVALID_CONFIG",
        }
    }

    /// Whether the failure came from a remote collaborator rather than the user.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(
            self,
            Self::NetworkFailure | Self::SearchFailure | Self::EmergencyDialFailure
        )
    }
}

/// Failure value used inside the core. It never crosses into the view: at the
/// orchestration boundary it is reduced to a [`Notice`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
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
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn invalid_selection() -> Self {
        Self::new(ErrorKind::InvalidSelection, "Please select start and end points")
    }

    #[must_use]
    pub fn selection_full() -> Self {
        Self::new(
            ErrorKind::SelectionFull,
            "Both points selected. Click Clear to reset.",
        )
    }

    /// Wraps a transport error; `message` is what the user sees.
    #[must_use]
    pub fn network(message: impl Into<String>, source: &HttpError) -> Self {
        let mut error =
            Self::new(ErrorKind::NetworkFailure, message).with_internal(source.to_string());
        if let Some(status) = source.status() {
            error = error.with_context("status", status.to_string());
        }
        error
    }

    #[must_use]
    pub fn search(source: &HttpError) -> Self {
        Self::new(ErrorKind::SearchFailure, "Error searching location")
            .with_internal(source.to_string())
    }

    #[must_use]
    pub fn dial(number: &str, source: &DialError) -> Self {
        Self::new(
            ErrorKind::EmergencyDialFailure,
            format!("Unable to place the call. Please dial {number} manually."),
        )
        .with_internal(source.to_string())
        .with_context("number", number)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::SelectionFull => "Both points selected. Click Clear to reset.".into(),
            ErrorKind::SearchFailure if self.message.is_empty() => {
                "Error searching location".into()
            }
            _ => self.message.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::InvalidConfig, e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// The single user-visible message the shell shows (alert/toast).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub code: Option<String>,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            code: None,
        }
    }
}

impl From<&AppError> for Notice {
    fn from(e: &AppError) -> Self {
        let level = match e.kind {
            ErrorKind::SelectionFull | ErrorKind::InvalidSelection => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self {
            level,
            message: e.user_facing_message(),
            code: Some(e.code().to_string()),
        }
    }
}

impl From<AppError> for Notice {
    fn from(e: AppError) -> Self {
        Self::from(&e)
    }
}
