/// Convenience result type used across capsync.
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Export jobs do not surface these directly: a failing job records an
/// [`crate::ExportErrorKind`] plus the rendered message of the originating error.
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    /// Invalid user-provided data (transcripts, configs, themes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Utterance index does not address an entry of the store.
    #[error("utterance index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Store length at the time of the request.
        len: usize,
    },

    /// Errors while preparing or painting a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors raised by media sources and encoders.
    #[error("media error: {0}")]
    Media(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptionError {
    /// Build a [`CaptionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptionError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CaptionError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`CaptionError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
