//! Recording in-memory implementations of the seam traits.
//!
//! Each mock records its own calls; mocks built `with_log` additionally
//! append to a shared operation log so tests can assert ordering across
//! traits (grant before approve before wager before revoke).

use crate::chain::{PendingWager, WagerContract, WalletGateway, MAX_APPROVAL};
use crate::bridge::EngineSink;
use crate::orchestrator::{Notifier, WalletPicker};
use crate::{Error, Result};
use arcadia_types::{ConnectedWallet, Currency, EngineMessage, GameId, OnchainGame, WalletAddress};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Shared cross-mock operation log.
pub type OpLog = Arc<Mutex<Vec<&'static str>>>;

pub fn op_log() -> OpLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Option<OpLog>, op: &'static str) {
    if let Some(log) = log {
        log.lock().expect("op log poisoned").push(op);
    }
}

// ---------------------------------------------------------------------------
// Wallet gateway
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayOp {
    SwitchChain(u64),
    Grant,
    Revoke,
}

#[derive(Default)]
pub struct MockGateway {
    ops: Mutex<Vec<GatewayOp>>,
    log: Option<OpLog>,
    fail_switch: AtomicBool,
    fail_grant: AtomicBool,
    fail_revoke: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: OpLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn ops(&self) -> Vec<GatewayOp> {
        self.ops.lock().expect("mock lock poisoned").clone()
    }

    pub fn revoke_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, GatewayOp::Revoke))
            .count()
    }

    pub fn grant_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, GatewayOp::Grant))
            .count()
    }

    pub fn fail_switch_chain(&self) {
        self.fail_switch.store(true, Ordering::SeqCst);
    }

    pub fn fail_grant(&self) {
        self.fail_grant.store(true, Ordering::SeqCst);
    }

    pub fn fail_revoke(&self) {
        self.fail_revoke.store(true, Ordering::SeqCst);
    }

    fn push(&self, op: GatewayOp) {
        self.ops.lock().expect("mock lock poisoned").push(op);
    }
}

#[async_trait]
impl WalletGateway for MockGateway {
    async fn switch_chain(&self, _wallet: &WalletAddress, chain_id: u64) -> Result<()> {
        self.push(GatewayOp::SwitchChain(chain_id));
        record(&self.log, "switch_chain");
        if self.fail_switch.load(Ordering::SeqCst) {
            return Err(Error::ChainSwitch {
                chain_id,
                reason: "rejected by wallet".to_string(),
            });
        }
        Ok(())
    }

    async fn grant_session_signers(&self, _wallet: &WalletAddress) -> Result<()> {
        self.push(GatewayOp::Grant);
        record(&self.log, "grant");
        if self.fail_grant.load(Ordering::SeqCst) {
            return Err(Error::Delegation("grant rejected".to_string()));
        }
        Ok(())
    }

    async fn revoke_session_signers(&self, _wallet: &WalletAddress) -> Result<()> {
        self.push(GatewayOp::Revoke);
        record(&self.log, "revoke");
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(Error::Delegation("revoke failed".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wager contract
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainOp {
    GameTerms,
    WagerCurrency,
    Allowance,
    ApproveMax,
    SubmitWager,
    ConfirmWager,
}

/// A wager transaction the mock contract accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedWager {
    pub owner: WalletAddress,
    pub game: GameId,
    pub value: u128,
}

pub struct MockContract {
    games: Mutex<HashMap<GameId, OnchainGame>>,
    currency: Currency,
    allowances: Mutex<HashMap<WalletAddress, u128>>,
    wagers: Mutex<Vec<SubmittedWager>>,
    ops: Mutex<Vec<ChainOp>>,
    log: Option<OpLog>,
    fail_approve: AtomicBool,
    fail_submit: AtomicBool,
    fail_confirm: AtomicBool,
}

impl MockContract {
    pub fn new(currency: Currency) -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            currency,
            allowances: Mutex::new(HashMap::new()),
            wagers: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
            log: None,
            fail_approve: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            fail_confirm: AtomicBool::new(false),
        }
    }

    pub fn with_log(currency: Currency, log: OpLog) -> Self {
        let mut contract = Self::new(currency);
        contract.log = Some(log);
        contract
    }

    pub fn set_game(&self, game: GameId, terms: OnchainGame) {
        self.games.lock().expect("mock lock poisoned").insert(game, terms);
    }

    pub fn set_allowance(&self, owner: &WalletAddress, amount: u128) {
        self.allowances
            .lock()
            .expect("mock lock poisoned")
            .insert(owner.clone(), amount);
    }

    pub fn allowance_of(&self, owner: &WalletAddress) -> u128 {
        self.allowances
            .lock()
            .expect("mock lock poisoned")
            .get(owner)
            .copied()
            .unwrap_or(0)
    }

    pub fn wagers(&self) -> Vec<SubmittedWager> {
        self.wagers.lock().expect("mock lock poisoned").clone()
    }

    pub fn ops(&self) -> Vec<ChainOp> {
        self.ops.lock().expect("mock lock poisoned").clone()
    }

    pub fn approval_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, ChainOp::ApproveMax))
            .count()
    }

    pub fn fail_approve(&self) {
        self.fail_approve.store(true, Ordering::SeqCst);
    }

    pub fn fail_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    pub fn fail_confirm(&self) {
        self.fail_confirm.store(true, Ordering::SeqCst);
    }

    fn push(&self, op: ChainOp) {
        self.ops.lock().expect("mock lock poisoned").push(op);
    }
}

#[async_trait]
impl WagerContract for MockContract {
    async fn game_terms(&self, game: &GameId) -> Result<Option<OnchainGame>> {
        self.push(ChainOp::GameTerms);
        record(&self.log, "game_terms");
        Ok(self.games.lock().expect("mock lock poisoned").get(game).copied())
    }

    async fn wager_currency(&self) -> Result<Currency> {
        self.push(ChainOp::WagerCurrency);
        record(&self.log, "wager_currency");
        Ok(self.currency.clone())
    }

    async fn allowance(&self, _token: &WalletAddress, owner: &WalletAddress) -> Result<u128> {
        self.push(ChainOp::Allowance);
        record(&self.log, "allowance");
        Ok(self.allowance_of(owner))
    }

    async fn approve_max(&self, _token: &WalletAddress, owner: &WalletAddress) -> Result<()> {
        self.push(ChainOp::ApproveMax);
        record(&self.log, "approve_max");
        if self.fail_approve.load(Ordering::SeqCst) {
            return Err(Error::Approval("rejected by wallet".to_string()));
        }
        self.set_allowance(owner, MAX_APPROVAL);
        Ok(())
    }

    async fn submit_wager(
        &self,
        owner: &WalletAddress,
        game: &GameId,
        value: u128,
    ) -> Result<PendingWager> {
        self.push(ChainOp::SubmitWager);
        record(&self.log, "submit_wager");
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Error::Submission("node unavailable".to_string()));
        }
        let mut wagers = self.wagers.lock().expect("mock lock poisoned");
        wagers.push(SubmittedWager {
            owner: owner.clone(),
            game: game.clone(),
            value,
        });
        Ok(PendingWager {
            tx_id: format!("0xwager{:02}", wagers.len()),
        })
    }

    async fn confirm_wager(&self, _pending: PendingWager) -> Result<()> {
        self.push(ChainOp::ConfirmWager);
        record(&self.log, "confirm_wager");
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(Error::Confirmation("transaction reverted".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wallet picker
// ---------------------------------------------------------------------------

/// Scripted wallet picker. `choice: None` models the user dismissing the
/// dialog; an optional gate holds the pick open until the test releases it.
#[derive(Default)]
pub struct MockPicker {
    choice: Mutex<Option<WalletAddress>>,
    gate: Mutex<Option<Arc<Notify>>>,
    offered: Mutex<Vec<Vec<ConnectedWallet>>>,
}

impl MockPicker {
    pub fn dismissing() -> Self {
        Self::default()
    }

    pub fn choosing(address: WalletAddress) -> Self {
        Self {
            choice: Mutex::new(Some(address)),
            ..Self::default()
        }
    }

    /// Hold `pick` open until the returned handle is notified.
    pub fn gated(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().expect("mock lock poisoned") = Some(Arc::clone(&gate));
        gate
    }

    /// Wallet sets the picker was asked to present.
    pub fn offered(&self) -> Vec<Vec<ConnectedWallet>> {
        self.offered.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl WalletPicker for MockPicker {
    async fn pick(&self, wallets: &[ConnectedWallet]) -> Option<WalletAddress> {
        self.offered
            .lock()
            .expect("mock lock poisoned")
            .push(wallets.to_vec());
        let gate = self.gate.lock().expect("mock lock poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.choice.lock().expect("mock lock poisoned").clone()
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Default)]
pub struct MockNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().expect("mock lock poisoned").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Success)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .expect("mock lock poisoned")
            .push((level, message.to_string()));
    }
}

impl Notifier for MockNotifier {
    fn info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}

// ---------------------------------------------------------------------------
// Engine sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSink {
    delivered: Mutex<Vec<EngineMessage>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<EngineMessage> {
        self.delivered.lock().expect("mock lock poisoned").clone()
    }
}

impl EngineSink for MockSink {
    fn deliver(&self, message: &EngineMessage) {
        self.delivered
            .lock()
            .expect("mock lock poisoned")
            .push(message.clone());
    }
}
