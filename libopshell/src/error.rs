//! Error types for opshell

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ShellError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::Config(_) => 2,
            ShellError::InvalidInput(_) => 3,
            ShellError::Route(_) => 1,
            ShellError::Page(_) => 1,
            ShellError::Dialog(_) => 1,
            ShellError::Navigation(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Route pattern already registered: '{0}'")]
    DuplicatePattern(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Failed to load '{route}': {message}")]
    Load { route: String, message: String },

    #[error("Cleanup of '{route}' failed: {message}")]
    Cleanup { route: String, message: String },

    #[error("Loading '{route}' did not finish within {after:?}")]
    Timeout { route: String, after: Duration },
}

impl PageError {
    /// Shorthand for a load failure, used by page implementations
    pub fn load(route: impl Into<String>, message: impl Into<String>) -> Self {
        PageError::Load {
            route: route.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a cleanup failure
    pub fn cleanup(route: impl Into<String>, message: impl Into<String>) -> Self {
        PageError::Cleanup {
            route: route.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("Dialog '{dialog}' failed to initialize: {message}")]
    Init { dialog: String, message: String },

    #[error("Dialog '{dialog}' failed to show: {message}")]
    Show { dialog: String, message: String },

    #[error("Dialog '{dialog}' failed to tear down: {message}")]
    Destroy { dialog: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Default route failed while recovering from '{requested}': {source_message}")]
    DefaultRouteFailed {
        requested: String,
        source_message: String,
    },

    #[error("Navigation driver is no longer running")]
    DriverClosed,
}
