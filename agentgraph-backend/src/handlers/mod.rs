//! Named side-effect handlers fired on agent output.
//!
//! Edges carry an optional list of handler names; after an agent produces
//! its output, each named handler runs with the raw output and the agent's
//! credential set. Handlers are best-effort: failures (and unknown names)
//! are logged and never fail the run. A handler whose credential is missing
//! must no-op safely rather than error.

pub mod extract;
mod payback;
mod trade;
mod trust_game;
mod vote;

pub use extract::{extract_array, extract_string};
pub use payback::SignPaybackHandler;
pub use trade::TradeHandler;
pub use trust_game::CreateTrustGameHandler;
pub use vote::VoteHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credential kinds an agent can be provisioned with.
///
/// Serde names match the agent config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "AIN")]
    Ain,
    #[serde(rename = "CDPNAME")]
    CdpName,
    #[serde(rename = "CDPKEY")]
    CdpKey,
}

/// An agent's credential set. Handlers look capabilities up here and no-op
/// when the one they need is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialSet {
    #[serde(flatten)]
    keys: HashMap<CredentialKind, String>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: CredentialKind, value: impl Into<String>) {
        self.keys.insert(kind, value.into());
    }

    pub fn with(mut self, kind: CredentialKind, value: impl Into<String>) -> Self {
        self.insert(kind, value);
        self
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn has(&self, kind: CredentialKind) -> bool {
        self.keys.contains_key(&kind)
    }
}

/// Everything a handler gets to see for one invocation.
pub struct HandlerContext<'a> {
    pub agent_name: &'a str,
    pub credentials: &'a CredentialSet,
    /// Raw agent output, unparsed.
    pub output: &'a str,
}

/// A named side-effect handler.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &HandlerContext<'_>) -> Result<(), String>;
}

/// Lookup table of handlers keyed by name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn FunctionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn FunctionHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionHandler>> {
        self.handlers.get(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run one named handler, swallowing every failure mode.
    pub async fn dispatch(&self, name: &str, ctx: &HandlerContext<'_>) {
        match self.handlers.get(name) {
            Some(handler) => {
                if let Err(e) = handler.handle(ctx).await {
                    log::error!(
                        "[HANDLER] '{}' failed for agent '{}': {}",
                        name,
                        ctx.agent_name,
                        e
                    );
                }
            }
            None => {
                log::warn!(
                    "[HANDLER] agent '{}' requested unknown handler '{}'",
                    ctx.agent_name,
                    name
                );
            }
        }
    }

    /// Run a list of named handlers in order.
    pub async fn dispatch_all(&self, names: &[String], ctx: &HandlerContext<'_>) {
        for name in names {
            self.dispatch(name, ctx).await;
        }
    }
}

/// Registry with all built-in handlers registered.
pub fn create_default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(VoteHandler));
    registry.register(Arc::new(TradeHandler));
    registry.register(Arc::new(CreateTrustGameHandler));
    registry.register(Arc::new(SignPaybackHandler));
    registry
}
