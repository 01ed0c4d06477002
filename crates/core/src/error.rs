/// Result alias that carries the custom [`VisualiserError`] type.
pub type Result<T> = std::result::Result<T, VisualiserError>;

/// Common error type for the core crate.
///
/// Nothing in the engine is fatal: these values are surfaced to the host or
/// logged at the scheduler boundary, and the next tick proceeds regardless.
#[derive(Debug, thiserror::Error)]
pub enum VisualiserError {
    /// The drawing surface or the analysis source was unusable when a
    /// visualizer was initialised.
    #[error("initialization failed: {0}")]
    Initialization(String),
    /// The requested style identifier is not part of the style table.
    #[error("unknown style `{0}`")]
    StyleNotFound(String),
    /// A lifecycle operation was invoked in a state that does not allow it.
    #[error("invalid lifecycle transition: {0}")]
    InvalidState(&'static str),
    /// A setting carried a value of the wrong kind for its key.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around configuration parse errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VisualiserError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn init<T: Into<String>>(msg: T) -> Self {
        Self::Initialization(msg.into())
    }
}

impl From<&str> for VisualiserError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VisualiserError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
