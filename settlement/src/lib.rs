//! Wager settlement orchestration for the arcadia game portal.
//!
//! The flow: the embedded game engine issues a `SendWager` command over the
//! [`bridge::RuntimeBridge`]; the [`orchestrator::Orchestrator`] resolves a
//! wallet from the [`registry::WalletRegistry`], prepares the chain and any
//! session-signer delegation through the [`session::ChainSessionManager`],
//! re-reads the wager terms on-chain, negotiates an ERC-20 allowance when
//! the wager currency is not native, submits the wager transaction, awaits
//! confirmation, and reports the outcome back through the bridge.
//!
//! Everything chain- or wallet-provider-specific sits behind the
//! [`chain::WagerContract`] and [`chain::WalletGateway`] traits.

pub mod allowance;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod host;
pub mod orchestrator;
pub mod registry;
pub mod reporter;
pub mod session;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use bridge::{EngineSink, RuntimeBridge, Subscription};
pub use chain::{WagerContract, WalletGateway};
pub use config::{ChainConfig, Environment};
pub use host::{GameHost, GAME_PLAYER_CHANNEL};
pub use orchestrator::{Notifier, Orchestrator, Outcome, WalletPicker};
pub use registry::WalletRegistry;
pub use reporter::PlayCountReporter;
pub use session::{ActiveSession, ChainSessionManager};

use arcadia_types::WalletAddress;
use thiserror::Error;

/// Error type for settlement operations.
///
/// Every variant is terminal for the current attempt; nothing is retried
/// automatically. The orchestrator converts each into a user-visible
/// notification before returning it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("user not authenticated")]
    NotAuthenticated,
    #[error("could not find a connected wallet")]
    NoWallet,
    #[error("wallet {0} is not connected")]
    UnknownWallet(WalletAddress),
    #[error("tournament is not active for this game")]
    TournamentInactive,
    #[error("wallet could not switch to chain {chain_id}: {reason}")]
    ChainSwitch { chain_id: u64, reason: String },
    #[error("session signer grant rejected: {0}")]
    Delegation(String),
    #[error("this game is not currently active for wagers")]
    TermsUnavailable,
    #[error("failed to approve token spend: {0}")]
    Approval(String),
    #[error("failed to send wager: {0}")]
    Submission(String),
    #[error("wager transaction was not confirmed: {0}")]
    Confirmation(String),
    #[error("a wager attempt is already in flight")]
    AttemptInFlight,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for settlement operations.
pub type Result<T> = std::result::Result<T, Error>;
