use crate::allowance::ensure_allowance;
use crate::bridge::RuntimeBridge;
use crate::chain::WagerContract;
use crate::registry::WalletRegistry;
use crate::session::{ActiveSession, ChainSessionManager};
use crate::{Error, Result};
use arcadia_types::{ConnectedWallet, EngineMessage, Game, GameId, WagerTerms, WalletAddress};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Presents the multi-wallet chooser to the user.
///
/// This is the one user-interaction suspension point in the settlement
/// flow; it has no timeout. Returning `None` means the user dismissed the
/// dialog or navigated away, abandoning the attempt.
#[async_trait]
pub trait WalletPicker: Send + Sync {
    async fn pick(&self, wallets: &[ConnectedWallet]) -> Option<WalletAddress>;
}

/// Transient user-visible notifications (the toast surface).
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Lifecycle phase of a settlement attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    WalletResolution,
    ChainPreparation,
    TermsLookup,
    AllowanceCheck,
    TransactionSubmission,
    Confirmation,
    Closed,
}

impl Phase {
    fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::WalletResolution => "wallet_resolution",
            Phase::ChainPreparation => "chain_preparation",
            Phase::TermsLookup => "terms_lookup",
            Phase::AllowanceCheck => "allowance_check",
            Phase::TransactionSubmission => "transaction_submission",
            Phase::Confirmation => "confirmation",
            Phase::Closed => "closed",
        }
    }
}

/// Ephemeral state for one user-initiated wager action. Never persisted.
struct SettlementAttempt {
    game: GameId,
    phase: Phase,
}

impl SettlementAttempt {
    fn new(game: GameId) -> Self {
        Self {
            game,
            phase: Phase::Idle,
        }
    }

    fn advance(&mut self, phase: Phase) {
        debug!(game = %self.game, from = self.phase.as_str(), to = phase.as_str(), "settlement phase");
        self.phase = phase;
    }
}

/// How a settlement attempt ended when no error occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The wager transaction confirmed on-chain and the engine was told.
    Confirmed,
    /// The user abandoned the wallet picker; nothing was acquired and
    /// nothing reached the chain.
    Abandoned,
}

/// Coordinates one `place_wager` operation end to end.
///
/// Phases run strictly in order and every failure is terminal for the
/// attempt: the error is surfaced as a notification and the orchestrator
/// returns to idle for a manual retry. A session-signer delegation granted
/// during chain preparation is revoked on every exit path past that point.
pub struct Orchestrator {
    registry: Arc<WalletRegistry>,
    sessions: ChainSessionManager,
    contract: Arc<dyn WagerContract>,
    picker: Arc<dyn WalletPicker>,
    notifier: Arc<dyn Notifier>,
    bridge: Arc<RuntimeBridge>,
    in_flight: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<WalletRegistry>,
        sessions: ChainSessionManager,
        contract: Arc<dyn WagerContract>,
        picker: Arc<dyn WalletPicker>,
        notifier: Arc<dyn Notifier>,
        bridge: Arc<RuntimeBridge>,
    ) -> Self {
        Self {
            registry,
            sessions,
            contract,
            picker,
            notifier,
            bridge,
            in_flight: Mutex::new(()),
        }
    }

    /// Place an on-chain wager for `game`.
    ///
    /// Errors are also surfaced to the user as a notification before being
    /// returned; callers only need to log them.
    pub async fn place_wager(&self, game: &Game) -> Result<Outcome> {
        match self.attempt(game).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(game = %game.title, error = %err, "wager attempt failed");
                self.notifier.error(&err.to_string());
                Err(err)
            }
        }
    }

    async fn attempt(&self, game: &Game) -> Result<Outcome> {
        // One attempt per user at a time; a second SendWager while this one
        // is in flight is rejected rather than raced.
        let Ok(_flight) = self.in_flight.try_lock() else {
            return Err(Error::AttemptInFlight);
        };

        if !self.registry.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        let wallets = self.registry.wallets();
        if wallets.is_empty() {
            return Err(Error::NoWallet);
        }
        if !game.tournament {
            return Err(Error::TournamentInactive);
        }

        let mut attempt = SettlementAttempt::new(game.id());
        attempt.advance(Phase::WalletResolution);
        let wallet = if wallets.len() == 1 {
            wallets[0].clone()
        } else {
            let Some(address) = self.picker.pick(&wallets).await else {
                debug!(game = %attempt.game, "wallet selection abandoned");
                return Ok(Outcome::Abandoned);
            };
            self.registry
                .find(&address)
                .ok_or(Error::UnknownWallet(address))?
        };

        self.notifier.info("Initiating on-chain wager");

        attempt.advance(Phase::ChainPreparation);
        let session = self.sessions.prepare(&wallet).await?;

        let result = self.settle_prepared(&mut attempt, &session).await;

        attempt.advance(Phase::Closed);
        self.sessions.release(session).await;

        result?;
        self.notifier.success("Wager sent!");
        Ok(Outcome::Confirmed)
    }

    /// Phases that run under an active session. Kept separate so the
    /// caller can release the session on both the success and every
    /// failure path.
    async fn settle_prepared(
        &self,
        attempt: &mut SettlementAttempt,
        session: &ActiveSession,
    ) -> Result<()> {
        let owner = &session.wallet().address;

        attempt.advance(Phase::TermsLookup);
        // Live re-check: the catalog may say the game is wager-enabled, but
        // on-chain state is authoritative and can change between page load
        // and this action.
        let onchain = self
            .contract
            .game_terms(&attempt.game)
            .await?
            .filter(|terms| terms.active)
            .ok_or(Error::TermsUnavailable)?;
        let currency = self.contract.wager_currency().await?;
        let terms = WagerTerms {
            fee: onchain.fee,
            currency,
            active: onchain.active,
        };

        if !terms.currency.is_native() {
            attempt.advance(Phase::AllowanceCheck);
            ensure_allowance(self.contract.as_ref(), owner, &terms.currency, terms.fee).await?;
        }

        attempt.advance(Phase::TransactionSubmission);
        let value = if terms.currency.is_native() {
            terms.fee
        } else {
            0
        };
        let pending = self
            .contract
            .submit_wager(owner, &attempt.game, value)
            .await?;

        attempt.advance(Phase::Confirmation);
        self.contract.confirm_wager(pending).await?;

        // The engine must be told to persist before it is told the wager
        // succeeded: a crash between the two leaves recoverable state.
        self.bridge.send(EngineMessage::set_save_data());
        self.bridge.send(EngineMessage::wager_response());
        info!(game = %attempt.game, wallet = %owner, fee = terms.fee, "wager confirmed");
        Ok(())
    }
}
