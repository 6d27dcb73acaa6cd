use crate::chain::WagerContract;
use crate::Result;
use arcadia_types::{Currency, WalletAddress};
use tracing::{debug, info};

/// Ensure the wager contract may pull at least `required` of the wager
/// currency from `owner`.
///
/// Native-currency wagers carry the fee as transaction value, so there is
/// nothing to approve. For token wagers the current allowance is read
/// fresh; if it already covers `required` no transaction is issued,
/// otherwise a single maximum-amount approval is submitted and awaited to
/// confirmation before returning.
///
/// Failure needs no rollback: allowance writes are idempotent and the
/// allowance is re-read on the next attempt.
pub async fn ensure_allowance(
    contract: &dyn WagerContract,
    owner: &WalletAddress,
    currency: &Currency,
    required: u128,
) -> Result<()> {
    let token = match currency {
        Currency::Native => return Ok(()),
        Currency::Token(token) => token,
    };

    let granted = contract.allowance(token, owner).await?;
    if granted >= required {
        debug!(%owner, %token, granted, required, "allowance sufficient");
        return Ok(());
    }

    info!(%owner, %token, granted, required, "allowance insufficient, approving token spend");
    contract.approve_max(token, owner).await
}
