//! Trust-game creation handler.
//!
//! Extracts the proposal, contributor list and allocations from the agent's
//! output and signs the resulting commitment with the agent's ETH key.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;

use super::extract::{extract_array, extract_string};
use super::{CredentialKind, FunctionHandler, HandlerContext};

pub struct CreateTrustGameHandler;

#[async_trait]
impl FunctionHandler for CreateTrustGameHandler {
    fn name(&self) -> &'static str {
        "create-trust-game"
    }

    async fn handle(&self, ctx: &HandlerContext<'_>) -> Result<(), String> {
        let Some(key) = ctx.credentials.get(CredentialKind::Eth) else {
            log::debug!(
                "[TRUST_GAME] agent '{}' has no ETH credential, skipping",
                ctx.agent_name
            );
            return Ok(());
        };

        let proposal_id = extract_string(ctx.output, "proposalId")?;
        let contributors = extract_array(ctx.output, "contributors")?;
        let allocated = extract_array(ctx.output, "allocatedAmounts")?;

        if contributors.len() != allocated.len() {
            return Err(format!(
                "contributor/allocation mismatch: {} vs {}",
                contributors.len(),
                allocated.len()
            ));
        }

        let commitment = format!(
            "trust-game:{}:{}:{}",
            proposal_id,
            contributors.join(","),
            allocated.join(",")
        );
        let digest = keccak256(commitment.as_bytes());

        let wallet: LocalWallet = key
            .parse()
            .map_err(|e| format!("invalid ETH key: {}", e))?;
        let signature = wallet
            .sign_message(digest)
            .await
            .map_err(|e| format!("failed to sign commitment: {}", e))?;

        log::info!(
            "[TRUST_GAME] agent '{}' committed trust game for proposal {} ({} contributors, digest {}, sig {})",
            ctx.agent_name,
            proposal_id,
            contributors.len(),
            hex::encode(digest),
            signature
        );
        Ok(())
    }
}
