//! # Query Handler
//!
//! Mediates between a UI text field and a [`Chain`]. Every call produces exactly
//! one string: the chain's answer, or [`FALLBACK_ANSWER`] if anything failed.

use crate::{
    chain::Chain, constants::FALLBACK_ANSWER, errors::PromptError, prompts::format_question,
};
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tracing::{info, warn};

/// Answers free-text questions through a shared, read-only chain.
#[derive(Debug, Clone)]
pub struct QueryHandler {
    chain: Arc<dyn Chain>,
}

impl QueryHandler {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        Self { chain }
    }

    /// Answers `question`, never failing.
    ///
    /// Any error from the chain, including a panic, is logged with its kind and
    /// replaced by [`FALLBACK_ANSWER`].
    pub async fn answer(&self, question: &str) -> String {
        match self.try_answer(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Could not answer question.");
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    /// Answers `question`, keeping the failure visible to the caller.
    pub async fn try_answer(&self, question: &str) -> Result<String, PromptError> {
        info!(question = %question, "Received question.");
        let prompt = format_question(question);

        AssertUnwindSafe(self.chain.run(&prompt))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PromptError::ChainPanicked(panic_message(&*payload))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
