pub mod openai;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with an AI provider.
///
/// This trait defines a common interface for sending a system and user prompt to
/// a Large Language Model and receiving its text reply.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
