#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared mocks for the library tests: a scripted AI provider, an in-memory
//! storage provider, and chains with fixed behaviour.

use askdb::{providers::ai::AiProvider, providers::db::storage::Storage, Chain, PromptError};
use async_trait::async_trait;
use dotenvy::dotenv;
use std::fmt::Debug;
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// --- Mock AI Provider for Logic Testing ---

/// Replies with the queued responses in order and records every call.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    pub responses: Arc<RwLock<Vec<Result<String, String>>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Queues replies where `Err(message)` becomes a `PromptError::AiApi`.
    pub fn with_results(responses: Vec<Result<String, String>>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(responses.into_iter().rev().collect())),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.call_history.read().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        match self.responses.write().unwrap().pop() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(PromptError::AiApi(message)),
            None => Err(PromptError::AiApi("no response queued".to_string())),
        }
    }
}

// --- Mock Storage Provider ---

/// Returns a fixed table description and a fixed result for every query.
#[derive(Clone, Debug)]
pub struct MockStorage {
    pub table_info: String,
    pub result: Result<String, String>,
    pub executed: Arc<RwLock<Vec<String>>>,
}

impl MockStorage {
    pub fn new(table_info: &str, result: Result<&str, &str>) -> Self {
        Self {
            table_info: table_info.to_string(),
            result: result.map(String::from).map_err(String::from),
            executed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.read().unwrap().clone()
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
        self.executed.write().unwrap().push(sql.to_string());
        self.result
            .clone()
            .map_err(PromptError::StorageQueryFailed)
    }
}

// --- Scripted Chains ---

/// How a [`ScriptedChain`] responds to every input.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Fail(fn() -> PromptError),
    FailOnEmptyQuestion(String),
    Panic,
}

/// A chain with fixed behaviour that records the prompts it receives.
#[derive(Debug, Clone)]
pub struct ScriptedChain {
    pub script: Script,
    pub inputs: Arc<RwLock<Vec<String>>>,
}

impl ScriptedChain {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            inputs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.read().unwrap().clone()
    }
}

#[async_trait]
impl Chain for ScriptedChain {
    async fn run(&self, input: &str) -> Result<String, PromptError> {
        self.inputs.write().unwrap().push(input.to_string());
        match &self.script {
            Script::Reply(answer) => Ok(answer.clone()),
            Script::Fail(make_error) => Err(make_error()),
            Script::FailOnEmptyQuestion(answer) => {
                if input.trim_end().ends_with("The question:") {
                    Err(PromptError::EmptyQuery)
                } else {
                    Ok(answer.clone())
                }
            }
            Script::Panic => panic!("chain exploded"),
        }
    }
}
