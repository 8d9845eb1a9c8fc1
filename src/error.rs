use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// The transcription carried no timed words while the script has tokens.
    #[error("transcription is empty but the script has {token_count} tokens")]
    EmptyTranscription { token_count: usize },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
