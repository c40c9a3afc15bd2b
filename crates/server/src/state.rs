//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. Everything in it is read-only after startup.

use crate::config::AppConfig;
use askdb::{
    constants::{DEFAULT_TEMPERATURE, DEFAULT_TOP_K},
    providers::{
        ai::openai::OpenAiProvider,
        db::{postgres::PostgresProvider, storage::Storage},
    },
    Chain, QueryHandler, SqlDatabaseChain, SqlDatabaseChainBuilder,
};
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded once at startup.
    pub config: Arc<AppConfig>,
    /// The handler that turns questions into answers.
    pub query_handler: Arc<QueryHandler>,
}

impl AppState {
    /// Creates a state around an already constructed chain.
    pub fn with_chain(config: AppConfig, chain: Arc<dyn Chain>) -> Self {
        Self {
            config: Arc::new(config),
            query_handler: Arc::new(QueryHandler::new(chain)),
        }
    }
}

/// Builds the production answering chain over `storage_provider`.
///
/// The chain talks to the configured OpenAI endpoint at temperature 0, asks for
/// at most 3 rows, and logs every intermediate step.
pub fn build_chain(
    config: &AppConfig,
    storage_provider: Box<dyn Storage>,
) -> anyhow::Result<SqlDatabaseChain> {
    let ai_provider = OpenAiProvider::new(
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.gpt_model.clone(),
        DEFAULT_TEMPERATURE,
    )?;

    let chain = SqlDatabaseChainBuilder::new()
        .ai_provider(Box::new(ai_provider))
        .storage_provider(storage_provider)
        .top_k(DEFAULT_TOP_K)
        .verbose(true)
        .build()?;
    Ok(chain)
}

/// Builds the shared application state from the configuration.
///
/// The chain runs against PostgreSQL. No connection is opened here, so a wrong
/// database configuration only shows up on the first question.
pub fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let storage_provider = PostgresProvider::new(config.database_url());
    let chain = build_chain(&config, Box::new(storage_provider))?;
    info!(model = %config.gpt_model, db_host = %config.db_host, "Initialized answering chain.");

    Ok(AppState::with_chain(config, Arc::new(chain)))
}
