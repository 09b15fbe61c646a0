use std::io;
use thiserror::Error;

/// Custom error type for the telemetry engine
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Process {0} is gone")]
    ProcessGone(u32),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query failed: {0}")]
    TransientQuery(String),

    #[error("Metric not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Sampling scheduler is already running")]
    AlreadyRunning,
}

/// Result type alias for the telemetry engine
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        MonitorError::PermissionDenied(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        MonitorError::NotFound(msg.into())
    }

    /// Create an error for a single OS query that failed this cycle
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        MonitorError::TransientQuery(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        MonitorError::Unsupported(msg.into())
    }

    /// Whether the platform can never provide this value.
    ///
    /// Everything else is treated as a failure of the current cycle only.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MonitorError::Unsupported(_))
    }

    /// Expected churn while walking the process list (exit or access denied mid-query).
    pub fn is_process_churn(&self) -> bool {
        matches!(
            self,
            MonitorError::ProcessGone(_)
                | MonitorError::PermissionDenied(_)
                | MonitorError::NotFound(_)
        )
    }
}
