//! # Shared Constants
//!
//! Fixed values shared by the library and the server. Keeping them here avoids
//! "magic strings" drifting apart between the two crates.

/// The message returned to the user whenever answering a question fails.
pub const FALLBACK_ANSWER: &str = "Could not perform request. Try another one";

/// The model identifier used for the language-model backend.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";

/// The OpenAI chat completions endpoint.
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling temperature for every model call. Zero keeps answers deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// The number of result rows the chain asks the model to query for.
pub const DEFAULT_TOP_K: usize = 3;

/// The number of sample rows included per table in the schema description.
pub const SAMPLE_ROWS_IN_TABLE_INFO: usize = 3;

/// The question pre-populated in the UI.
pub const EXAMPLE_QUESTION: &str = "What were the total emissions for 2022 for each category?";
