use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid value for {attribute}: {reason}")]
    InvalidValue { attribute: String, reason: String },

    #[error("Adaptation failed: {0}")]
    Adaptation(String),

    #[error("Place lookup failed: {0}")]
    LookupFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn invalid_value(attribute: &str, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors the caller can recover from by falling back to the
    /// unadapted best match.
    pub fn is_adaptation(&self) -> bool {
        matches!(self, Error::Adaptation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
