use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a storage backend.
///
/// This trait defines the read path the answering chain needs: a description of
/// the available tables for the model, and raw query execution.
#[async_trait]
pub trait Storage: Send + Sync + DynClone + Debug {
    /// Returns the SQL dialect the model should write (e.g., "PostgreSQL").
    fn dialect(&self) -> &str;

    /// Describes the tables the model may query, including a few sample rows.
    async fn table_info(&self) -> Result<String, PromptError>;

    /// Executes a SQL statement against the storage provider.
    ///
    /// The result is a JSON array of row objects.
    async fn execute_sql(&self, sql: &str) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(Storage);
