use thiserror::Error;

/// Custom error types for the library.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is not configured")]
    MissingAiProvider,
    #[error("Storage provider is not configured")]
    MissingStorageProvider,
    #[error("Failed to connect to storage: {0}")]
    StorageConnection(String),
    #[error("Storage query execution failed: {0}")]
    StorageQueryFailed(String),
    #[error("The model did not produce a query")]
    EmptyQuery,
    #[error("Failed to serialize result: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Chain panicked: {0}")]
    ChainPanicked(String),
}

/// The broad class a [`PromptError`] belongs to.
///
/// Callers never see these distinctions; they exist so that swallowed failures
/// can still be told apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid settings, usually surfacing on first use.
    Configuration,
    /// Failures talking to the language model.
    Model,
    /// Query generation or execution failures.
    Query,
    /// Anything else raised inside the chain.
    Other,
}

impl PromptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromptError::ReqwestClientBuild(_)
            | PromptError::MissingAiProvider
            | PromptError::MissingStorageProvider
            | PromptError::StorageConnection(_) => ErrorKind::Configuration,
            PromptError::AiRequest(_)
            | PromptError::AiDeserialization(_)
            | PromptError::AiApi(_) => ErrorKind::Model,
            PromptError::StorageQueryFailed(_) | PromptError::EmptyQuery => ErrorKind::Query,
            PromptError::JsonSerialization(_)
            | PromptError::Regex(_)
            | PromptError::ChainPanicked(_) => ErrorKind::Other,
        }
    }
}
