use thiserror::Error;

/// Why the printer configuration could not be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Why a single printer could not be installed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("invalid queue name \"{name}\": {reason}")]
    InvalidQueueName { name: String, reason: String },

    #[error("no ppd_url configured for model '{model}' (add it to printer_models on the server)")]
    ConfigurationGap { model: String },

    #[error("invalid driver URL for model '{model}': {reason}")]
    InvalidDriverUrl { model: String, reason: String },

    #[error("no connection URI or IP address configured")]
    MissingAddress,

    #[error("driver download failed ({url}): {reason}")]
    Network { url: String, reason: String },

    #[error("driver download failed ({url}): HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("could not save driver from {url}: {reason}")]
    LocalIo { url: String, reason: String },

    #[error("{0}")]
    Command(String),

    #[error("cancelled before installation started")]
    Cancelled,

    #[error("duplicate of an earlier selection, skipped")]
    Duplicate,

    #[error("installation aborted: {0}")]
    Aborted(String),
}
