use serde::{Deserialize, Serialize};

/// The envelope every JSON endpoint responds with.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The free-text question. A missing field is treated as an empty question.
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}
