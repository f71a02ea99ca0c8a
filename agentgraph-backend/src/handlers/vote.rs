//! Governance vote handler.
//!
//! Fires when an agent's output ends with the agreement phrase; signs a vote
//! commitment for the referenced proposal with the agent's ETH key.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};

use super::extract::extract_string;
use super::{CredentialKind, FunctionHandler, HandlerContext};

const AGREEMENT_SUFFIX: &str = "I Agree.";

pub struct VoteHandler;

#[async_trait]
impl FunctionHandler for VoteHandler {
    fn name(&self) -> &'static str {
        "vote"
    }

    async fn handle(&self, ctx: &HandlerContext<'_>) -> Result<(), String> {
        let proposal_id = extract_string(ctx.output, "proposalId")?;

        if !ctx.output.trim_end().ends_with(AGREEMENT_SUFFIX) {
            log::info!(
                "[VOTE] agent '{}' disagreed on proposal {}",
                ctx.agent_name,
                proposal_id
            );
            return Ok(());
        }

        let Some(key) = ctx.credentials.get(CredentialKind::Eth) else {
            log::debug!(
                "[VOTE] agent '{}' has no ETH credential, skipping vote on proposal {}",
                ctx.agent_name,
                proposal_id
            );
            return Ok(());
        };

        let wallet: LocalWallet = key
            .parse()
            .map_err(|e| format!("invalid ETH key: {}", e))?;
        let signature = wallet
            .sign_message(format!("vote:{}", proposal_id))
            .await
            .map_err(|e| format!("failed to sign vote: {}", e))?;

        log::info!(
            "[VOTE] agent '{}' voted on proposal {} from {:?} (sig {})",
            ctx.agent_name,
            proposal_id,
            wallet.address(),
            signature
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::CredentialSet;

    // Throwaway key, never funded
    const TEST_KEY: &str =
        "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[tokio::test]
    async fn test_vote_without_credential_is_noop() {
        let credentials = CredentialSet::new();
        let ctx = HandlerContext {
            agent_name: "voter",
            credentials: &credentials,
            output: "proposalId: 7\nI Agree.",
        };
        assert!(VoteHandler.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_vote_signs_on_agreement() {
        let credentials = CredentialSet::new().with(CredentialKind::Eth, TEST_KEY);
        let ctx = HandlerContext {
            agent_name: "voter",
            credentials: &credentials,
            output: "proposalId: 7\nI Agree.",
        };
        assert!(VoteHandler.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_vote_disagreement_skips_signing() {
        let credentials = CredentialSet::new().with(CredentialKind::Eth, "not-a-key");
        let ctx = HandlerContext {
            agent_name: "voter",
            credentials: &credentials,
            output: "proposalId: 7\nI cannot support this.",
        };
        // Bad key never parsed because the disagreement branch returns first
        assert!(VoteHandler.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_vote_requires_proposal_id() {
        let credentials = CredentialSet::new();
        let ctx = HandlerContext {
            agent_name: "voter",
            credentials: &credentials,
            output: "I Agree.",
        };
        assert!(VoteHandler.handle(&ctx).await.is_err());
    }
}
