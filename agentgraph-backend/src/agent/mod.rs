//! LLM-backed agents and prompt placeholder resolution.
//!
//! An [`Agent`] wraps a completion client, a credential set and a handler
//! registry. Running an agent resolves `^id^` placeholders in the edge's
//! prompt template against the memory snapshot, generates, fires the edge's
//! side-effect handlers best-effort, and appends the output to memory.

mod node;

pub use node::GraphNode;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::ai::CompletionClient;
use crate::error::EngineError;
use crate::handlers::{CredentialSet, HandlerContext, HandlerRegistry};
use crate::memory::{Memory, Message};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^(.*?)\^").unwrap());

/// Resolve every `^id^` span against the given memory snapshot.
///
/// A known id is replaced by the stored message content; an unknown id
/// degrades to its own literal text. The first prompt of a chain relies on
/// this: before any memory exists, the placeholder doubles as a display
/// label.
pub fn resolve_placeholders(template: &str, snapshot: &HashMap<String, Message>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let id = &caps[1];
            snapshot
                .get(id)
                .map(|m| m.content.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .into_owned()
}

/// A named, completion-backed graph agent.
///
/// Immutable after construction; one instance may sit behind several node
/// ids with independent result keys.
pub struct Agent {
    name: String,
    system_prompt: String,
    public_desc: String,
    llm: Arc<dyn CompletionClient>,
    credentials: CredentialSet,
    handlers: Arc<HandlerRegistry>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        Agent {
            name: name.into(),
            system_prompt: system_prompt.into(),
            public_desc: String::new(),
            llm,
            credentials: CredentialSet::new(),
            handlers: Arc::new(HandlerRegistry::new()),
        }
    }

    pub fn with_public_desc(mut self, desc: impl Into<String>) -> Self {
        self.public_desc = desc.into();
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialSet) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_handlers(mut self, handlers: Arc<HandlerRegistry>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn public_desc(&self) -> &str {
        &self.public_desc
    }

    /// Run one prompt through this agent.
    ///
    /// Provider failures abort the call as [`EngineError::Execution`] and are
    /// not retried here. Handler failures never abort the call. The output
    /// is stored under `result_key`, or under `{name}-{millis}` when the
    /// edge carries no key; a key collision aborts with
    /// [`EngineError::DuplicateKey`].
    pub async fn run(
        &self,
        memory: &dyn Memory,
        prompt: &str,
        result_key: Option<&str>,
        handlers: Option<&[String]>,
    ) -> Result<String, EngineError> {
        let snapshot = memory.load_map();
        let resolved = resolve_placeholders(prompt, &snapshot);
        log::debug!(
            "[AGENT] '{}' running ({} chars resolved prompt)",
            self.name,
            resolved.len()
        );

        let output = self
            .llm
            .generate(&self.system_prompt, &resolved)
            .await
            .map_err(EngineError::Execution)?;

        if let Some(names) = handlers {
            let ctx = HandlerContext {
                agent_name: &self.name,
                credentials: &self.credentials,
                output: &output,
            };
            self.handlers.dispatch_all(names, &ctx).await;
        }

        let id = match result_key {
            Some(key) => key.to_string(),
            None => format!("{}-{}", self.name, chrono::Utc::now().timestamp_millis()),
        };
        memory.add(Message::new(id, self.name.clone(), output.clone()))?;

        Ok(output)
    }
}
