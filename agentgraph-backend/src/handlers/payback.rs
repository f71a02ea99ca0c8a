//! Payback signing handler.
//!
//! Signs a contributor's payback declaration for a proposal with the agent's
//! ETH key.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};

use super::extract::extract_string;
use super::{CredentialKind, FunctionHandler, HandlerContext};

pub struct SignPaybackHandler;

#[async_trait]
impl FunctionHandler for SignPaybackHandler {
    fn name(&self) -> &'static str {
        "sign-payback"
    }

    async fn handle(&self, ctx: &HandlerContext<'_>) -> Result<(), String> {
        let Some(key) = ctx.credentials.get(CredentialKind::Eth) else {
            log::debug!(
                "[PAYBACK] agent '{}' has no ETH credential, skipping",
                ctx.agent_name
            );
            return Ok(());
        };

        let proposal_id = extract_string(ctx.output, "proposalId")?;
        let amount = extract_string(ctx.output, "payback")?;

        let wallet: LocalWallet = key
            .parse()
            .map_err(|e| format!("invalid ETH key: {}", e))?;
        let signature = wallet
            .sign_message(format!("payback:{}:{}", proposal_id, amount))
            .await
            .map_err(|e| format!("failed to sign payback: {}", e))?;

        log::info!(
            "[PAYBACK] agent '{}' signed payback {} for proposal {} (sig {})",
            ctx.agent_name,
            amount,
            proposal_id,
            signature
        );
        Ok(())
    }
}
