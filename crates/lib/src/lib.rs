//! # Natural Language Questions over PostgreSQL
//!
//! This crate answers free-text questions about a relational database. A
//! [`QueryHandler`] wraps the question in a fixed instruction, hands it to a
//! [`Chain`] that generates and runs SQL with a language model, and always
//! returns a string: the answer, or [`constants::FALLBACK_ANSWER`].

pub mod chain;
pub mod constants;
pub mod errors;
pub mod handler;
pub mod prompts;
pub mod providers;

pub use chain::{Chain, ChainResult, SqlDatabaseChain, SqlDatabaseChainBuilder};
pub use errors::{ErrorKind, PromptError};
pub use handler::QueryHandler;
