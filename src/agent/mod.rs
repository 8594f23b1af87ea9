//! Agent seam between the session and the language model.
//!
//! The session only knows two things about an agent: a factory that binds
//! one to a table and a system prompt, and an invoker that turns a question
//! into an answer. The concrete backend here speaks the OpenAI
//! chat-completions protocol.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::table::Table;

/// `chat` module: OpenAI-compatible factory, agent handle and invoker.
pub mod chat;
/// `models` module: request/response bodies for the chat-completions API.
pub mod models;
/// `prompt` module: renders a table into the context block sent with each question.
pub mod prompt;

pub use chat::{ChatAgentFactory, ChatInvoker, TableAgent};

/// Builds an agent bound to exactly one table and one system prompt.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    type Agent: Send + Sync;

    async fn construct(&self, table: Arc<Table>, system_prompt: &str) -> Result<Self::Agent>;
}

/// Sends a question to an agent and waits for the answer text.
#[async_trait]
pub trait Invoker<A: Send + Sync>: Send + Sync {
    async fn invoke(&self, agent: &A, question: &str) -> Result<String>;
}
