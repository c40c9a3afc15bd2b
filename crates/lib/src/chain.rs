//! # Answering Chain
//!
//! The `Chain` trait is the single capability the `QueryHandler` depends on:
//! turn prompt text into answer text, possibly failing. `SqlDatabaseChain` is
//! the implementation used in production. It asks the model for a query, runs
//! the query, then asks the model to read the result and answer.

use crate::{
    constants::DEFAULT_TOP_K,
    errors::PromptError,
    prompts::{render, SQL_CHAIN_ANSWER_PROMPT, SQL_CHAIN_SYSTEM_PROMPT, SQL_CHAIN_USER_PROMPT},
    providers::{ai::AiProvider, db::storage::Storage},
};
use async_trait::async_trait;
use regex::Regex;
use std::fmt::Debug;
use tracing::{debug, info};

/// Turns a natural-language prompt into a natural-language answer.
#[async_trait]
pub trait Chain: Send + Sync + Debug {
    async fn run(&self, input: &str) -> Result<String, PromptError>;
}

/// The intermediate steps of a single chain run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainResult {
    pub answer: String,
    pub sql: String,
    pub sql_result: String,
}

/// A chain that answers questions by generating and executing SQL.
#[derive(Debug, Clone)]
pub struct SqlDatabaseChain {
    ai_provider: Box<dyn AiProvider>,
    storage_provider: Box<dyn Storage>,
    top_k: usize,
    verbose: bool,
}

/// A builder for creating `SqlDatabaseChain` instances.
pub struct SqlDatabaseChainBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    storage_provider: Option<Box<dyn Storage>>,
    top_k: usize,
    verbose: bool,
}

impl Default for SqlDatabaseChainBuilder {
    fn default() -> Self {
        Self {
            ai_provider: None,
            storage_provider: None,
            top_k: DEFAULT_TOP_K,
            verbose: false,
        }
    }
}

impl SqlDatabaseChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the AI provider used for both the query and the answer step.
    pub fn ai_provider(mut self, ai_provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    /// Sets the storage provider the generated query runs against.
    pub fn storage_provider(mut self, storage_provider: Box<dyn Storage>) -> Self {
        self.storage_provider = Some(storage_provider);
        self
    }

    /// Sets the number of rows the model is told to limit its query to.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Logs every intermediate step at `info` level instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Result<SqlDatabaseChain, PromptError> {
        Ok(SqlDatabaseChain {
            ai_provider: self.ai_provider.ok_or(PromptError::MissingAiProvider)?,
            storage_provider: self
                .storage_provider
                .ok_or(PromptError::MissingStorageProvider)?,
            top_k: self.top_k,
            verbose: self.verbose,
        })
    }
}

impl SqlDatabaseChain {
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    fn trace_step(&self, step: &str, text: &str) {
        if self.verbose {
            info!(step, "{text}");
        } else {
            debug!(step, "{text}");
        }
    }

    /// Runs the chain and returns every intermediate step alongside the answer.
    pub async fn run_with_steps(&self, input: &str) -> Result<ChainResult, PromptError> {
        self.trace_step("input", input);

        let table_info = self.storage_provider.table_info().await?;
        let top_k = self.top_k.to_string();
        let system_prompt = render(
            SQL_CHAIN_SYSTEM_PROMPT,
            &[
                ("dialect", self.storage_provider.dialect()),
                ("top_k", &top_k),
                ("table_info", &table_info),
            ],
        );

        let user_prompt = render(SQL_CHAIN_USER_PROMPT, &[("input", input)]);
        let raw_query = self
            .ai_provider
            .generate(&system_prompt, &user_prompt)
            .await?;
        let sql = extract_sql_query(&raw_query)?;
        if sql.is_empty() {
            return Err(PromptError::EmptyQuery);
        }
        self.trace_step("sql", &sql);

        let sql_result = self.storage_provider.execute_sql(&sql).await?;
        self.trace_step("sql_result", &sql_result);

        let answer_prompt = render(
            SQL_CHAIN_ANSWER_PROMPT,
            &[("input", input), ("sql", &sql), ("sql_result", &sql_result)],
        );
        let raw_answer = self
            .ai_provider
            .generate(&system_prompt, &answer_prompt)
            .await?;
        let answer = extract_answer(&raw_answer);
        self.trace_step("answer", &answer);

        Ok(ChainResult {
            answer,
            sql,
            sql_result,
        })
    }
}

#[async_trait]
impl Chain for SqlDatabaseChain {
    async fn run(&self, input: &str) -> Result<String, PromptError> {
        Ok(self.run_with_steps(input).await?.answer)
    }
}

/// Reduces a model reply to the bare SQL statement.
///
/// Markdown fences are removed along with any language tag on the opening
/// line, anything from `SQLResult:` or `Answer:` onwards
/// is dropped, and a leading `SQLQuery:` marker is stripped.
fn extract_sql_query(raw_response: &str) -> Result<String, PromptError> {
    let re = Regex::new(r"```(?:[A-Za-z0-9_+-]*[ \t]*\n)?([\s\S]*?)```")?;
    let unfenced = re
        .captures(raw_response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw_response);

    let end = ["SQLResult:", "Answer:"]
        .iter()
        .filter_map(|marker| unfenced.find(marker))
        .min()
        .unwrap_or(unfenced.len());
    let query = unfenced[..end].trim();
    let query = query.strip_prefix("SQLQuery:").unwrap_or(query);

    Ok(query.trim().to_string())
}

fn extract_answer(raw_response: &str) -> String {
    let answer = raw_response.trim();
    answer
        .strip_prefix("Answer:")
        .unwrap_or(answer)
        .trim()
        .to_string()
}
