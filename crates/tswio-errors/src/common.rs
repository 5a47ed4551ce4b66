//! Top-level error type, classification, and context helpers.

use core::fmt;

use crate::{
    CalibrationError, ControllerError, KeystrokeError, MappingError, ProtocolError,
    RepositoryError, SimulatorError, TransportError, ValidationError,
};

/// Top-level error type that can wrap every component error.
#[derive(Debug, thiserror::Error)]
pub enum TswIoError {
    /// Wire codec errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Calibration and analyzer errors
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// Lever mapping errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Button controller errors
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    /// Simulator client errors
    #[error("Simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    /// Device transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persistence boundary errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Keystroke injection errors
    #[error("Keystroke error: {0}")]
    Keystroke(#[from] KeystrokeError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl TswIoError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TswIoError::Protocol(_) => ErrorCategory::Protocol,
            TswIoError::Calibration(_) => ErrorCategory::Calibration,
            TswIoError::Mapping(_) => ErrorCategory::Mapping,
            TswIoError::Controller(_) => ErrorCategory::Controller,
            TswIoError::Simulator(_) => ErrorCategory::Simulator,
            TswIoError::Transport(_) => ErrorCategory::Transport,
            TswIoError::Repository(_) => ErrorCategory::Repository,
            TswIoError::Validation(_) => ErrorCategory::Validation,
            TswIoError::Keystroke(_) => ErrorCategory::Keystroke,
            TswIoError::Io(_) => ErrorCategory::IO,
            TswIoError::Config(_) => ErrorCategory::Config,
            TswIoError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TswIoError::Protocol(e) => e.severity(),
            TswIoError::Calibration(e) => e.severity(),
            TswIoError::Mapping(e) => e.severity(),
            TswIoError::Controller(e) => e.severity(),
            TswIoError::Simulator(e) => e.severity(),
            TswIoError::Transport(e) => e.severity(),
            TswIoError::Repository(e) => e.severity(),
            TswIoError::Validation(e) => e.severity(),
            TswIoError::Keystroke(e) => e.severity(),
            TswIoError::Io(_) => ErrorSeverity::Error,
            TswIoError::Config(_) => ErrorSeverity::Critical,
            TswIoError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Nothing in the signal path is allowed to take the process down; only
    /// configuration errors at startup are critical.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        TswIoError::Config(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        TswIoError::Other(msg.into())
    }
}

impl From<std::io::Error> for TswIoError {
    fn from(e: std::io::Error) -> Self {
        TswIoError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Wire codec errors
    Protocol = 0,
    /// Calibration and analyzer errors
    Calibration = 1,
    /// Lever mapping errors
    Mapping = 2,
    /// Button controller errors
    Controller = 3,
    /// Simulator client errors
    Simulator = 4,
    /// Device transport errors
    Transport = 5,
    /// Persistence errors
    Repository = 6,
    /// Validation errors
    Validation = 7,
    /// Configuration errors
    Config = 8,
    /// I/O errors
    IO = 9,
    /// Keystroke injection errors
    Keystroke = 10,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Protocol => write!(f, "Protocol"),
            ErrorCategory::Calibration => write!(f, "Calibration"),
            ErrorCategory::Mapping => write!(f, "Mapping"),
            ErrorCategory::Controller => write!(f, "Controller"),
            ErrorCategory::Simulator => write!(f, "Simulator"),
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::Repository => write!(f, "Repository"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Keystroke => write!(f, "Keystroke"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the operation was skipped
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the bridge cannot run
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
