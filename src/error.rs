use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

/// Failure reported by a rendering-engine implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("invalid chart spec: {0}")]
    InvalidSpec(String),

    #[error("failed to create chart view: {0}")]
    ViewCreation(#[source] EngineError),

    #[error("chart has not been drawn yet")]
    DataNotYetReady,

    #[error("view operation `{operation}` failed: {source}")]
    Engine {
        operation: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
