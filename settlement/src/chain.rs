use crate::Result;
use arcadia_types::{Currency, GameId, OnchainGame, WalletAddress};
use async_trait::async_trait;

/// Approval amount requested when an allowance is insufficient.
///
/// Approving the maximum representable amount (rather than the entry fee)
/// avoids a fresh approval transaction on every subsequent wager.
pub const MAX_APPROVAL: u128 = u128::MAX;

/// Handle to a submitted wager transaction awaiting confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingWager {
    /// Chain-assigned transaction identifier.
    pub tx_id: String,
}

/// On-chain surface of the wager contract and its wager currency token.
///
/// Writes are signed by `owner`; how the signature happens (embedded signer
/// delegation, external wallet prompt) is the gateway's concern, not this
/// trait's.
#[async_trait]
pub trait WagerContract: Send + Sync {
    /// Read the wager configuration for a game. `None` when the game is
    /// unknown to the contract.
    async fn game_terms(&self, game: &GameId) -> Result<Option<OnchainGame>>;

    /// Read the currency wagers are denominated in. The zero address maps
    /// to [`Currency::Native`].
    async fn wager_currency(&self) -> Result<Currency>;

    /// Read the ERC-20 allowance granted by `owner` to the wager contract.
    async fn allowance(&self, token: &WalletAddress, owner: &WalletAddress) -> Result<u128>;

    /// Submit an ERC-20 approval of [`MAX_APPROVAL`] to the wager contract
    /// and wait for it to confirm.
    async fn approve_max(&self, token: &WalletAddress, owner: &WalletAddress) -> Result<()>;

    /// Submit the wager transaction. `value` is the native-coin amount
    /// carried with the call: the entry fee for native wagers, zero for
    /// token wagers (the contract pulls those via allowance).
    async fn submit_wager(
        &self,
        owner: &WalletAddress,
        game: &GameId,
        value: u128,
    ) -> Result<PendingWager>;

    /// Wait for a submitted wager to be mined.
    async fn confirm_wager(&self, pending: PendingWager) -> Result<()>;
}

/// Wallet/auth-provider surface: chain switching and session-signer
/// delegation for embedded wallets.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Switch the wallet's active chain. Fails if the wallet rejects the
    /// switch or cannot reach the chain.
    async fn switch_chain(&self, wallet: &WalletAddress, chain_id: u64) -> Result<()>;

    /// Grant the platform-default session signer for an embedded wallet.
    async fn grant_session_signers(&self, wallet: &WalletAddress) -> Result<()>;

    /// Revoke all session signers previously granted for a wallet.
    async fn revoke_session_signers(&self, wallet: &WalletAddress) -> Result<()>;
}
