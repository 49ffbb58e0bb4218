use thiserror::Error;

/// Errors surfaced to callers of the classification pipeline
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The mapping response was empty, unparseable, or the service call failed
    #[error("invalid JSON response: {0}")]
    InvalidJsonResponse(String),

    /// The mapping omits labels that occur in the transcript
    #[error("missing speaker mapping: {0}")]
    MissingSpeakerMapping(String),

    /// The mapping names labels that do not occur in the transcript
    #[error("speaker not found: {0}")]
    SpeakerNotFound(String),

    /// Invalid roles or a missing service credential
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
