//! Error types for veriscan

/// Result type alias using veriscan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for veriscan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input-shape failures, surfaced to the caller and never retried
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// The account has no quota tokens left
    #[error("quota exhausted")]
    QuotaExhausted,

    /// The account does not exist
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// Required model artifacts could not be located or fetched
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Classifier or inference errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new backend-unavailable error
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for client branching
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(input) => input.code(),
            Self::QuotaExhausted => "TOKEN_FINISHED",
            Self::AccountNotFound(_) => "USER_NOT_FOUND",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::Classifier(_) => "CLASSIFIER_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error was caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

/// Input-shape failures. Messages are stable and user-presentable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Text is empty")]
    EmptyInput,

    #[error("Text too large. Maximum allowed characters: {max}")]
    TextTooLarge { max: usize, actual: usize },

    /// Segmentation or aggregation produced no sentences
    #[error("No sentences found")]
    NoSentencesFound,

    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("File too large. Maximum allowed size: {max} bytes")]
    UploadTooLarge { max: usize, actual: usize },

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("No readable text found in file")]
    NoReadableText,
}

impl InputError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_TEXT",
            Self::TextTooLarge { .. } => "TEXT_TOO_LARGE",
            Self::NoSentencesFound => "NO_SENTENCES",
            Self::EmptyUpload => "EMPTY_UPLOAD",
            Self::UploadTooLarge { .. } => "UPLOAD_TOO_LARGE",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::NoReadableText => "NO_READABLE_TEXT",
        }
    }
}
