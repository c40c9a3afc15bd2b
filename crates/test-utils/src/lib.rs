use askdb::errors::PromptError;
use askdb::providers::{ai::AiProvider, db::storage::Storage};
use askdb::Chain;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for a specific prompt.
    /// The key should be a unique substring of the user prompt.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key.to_string(), response.to_string());
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        // The longest matching key wins when several appear in the prompt.
        let best = responses
            .iter()
            .filter(|(key, _)| user_prompt.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len());
        if let Some((_, response)) = best {
            return Ok(response.clone());
        }

        Err(PromptError::AiApi(format!(
            "MockAiProvider: No response programmed for user prompt. Got: '{user_prompt}'"
        )))
    }
}

// --- Mock Storage ---

/// A storage provider with canned table info and query results keyed by SQL.
#[derive(Clone, Debug, Default)]
pub struct MockStorage {
    table_info: String,
    results: Arc<Mutex<HashMap<String, String>>>,
}

impl MockStorage {
    pub fn new(table_info: &str) -> Self {
        Self {
            table_info: table_info.to_string(),
            results: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pre-programs the JSON result for an exact SQL statement.
    pub fn add_result(&self, sql: &str, json_rows: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(sql.to_string(), json_rows.to_string());
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    async fn table_info(&self) -> Result<String, PromptError> {
        Ok(self.table_info.clone())
    }

    async fn execute_sql(&self, sql: &str) -> Result<String, PromptError> {
        self.results
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .ok_or_else(|| PromptError::StorageQueryFailed(format!("unexpected query: {sql}")))
    }
}

// --- Fixed Chains ---

/// A chain that answers every prompt with the same text.
#[derive(Clone, Debug)]
pub struct StaticChain {
    answer: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StaticChain {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Chain for StaticChain {
    async fn run(&self, input: &str) -> Result<String, PromptError> {
        self.prompts.lock().unwrap().push(input.to_string());
        Ok(self.answer.clone())
    }
}

/// A chain that fails every call with an error built by `make_error`.
#[derive(Clone, Debug)]
pub struct FailingChain {
    make_error: fn() -> PromptError,
}

impl FailingChain {
    pub fn new(make_error: fn() -> PromptError) -> Self {
        Self { make_error }
    }
}

#[async_trait]
impl Chain for FailingChain {
    async fn run(&self, _input: &str) -> Result<String, PromptError> {
        Err((self.make_error)())
    }
}
