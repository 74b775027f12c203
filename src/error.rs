use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The raw response was not valid JSON. Returned unchanged to the caller.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// A transform stage failed unexpectedly. The hook never lets this reach the host.
    #[error("rewrite failed in {stage}: {message}")]
    Rewrite { stage: &'static str, message: String },
}

impl Error {
    pub(crate) fn rewrite(stage: &'static str, message: impl Into<String>) -> Self {
        Error::Rewrite { stage, message: message.into() }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
