use arcadia_types::{ConnectedWallet, Custody, LinkedAccount, WalletAddress};
use std::sync::RwLock;
use tracing::debug;

/// The set of connected wallets for the authenticated session.
///
/// Recomputed via [`refresh`](WalletRegistry::refresh) whenever the auth
/// provider's linked-account list changes. Only chain-format addresses are
/// kept; duplicates collapse to their first occurrence, so the default
/// wallet is stable across refreshes that only append.
///
/// An empty registry is a valid state: the user has not connected a wallet
/// yet.
#[derive(Debug, Default)]
pub struct WalletRegistry {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    authenticated: bool,
    wallets: Vec<ConnectedWallet>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents from the auth provider's current
    /// linked-account list.
    pub fn refresh(&self, authenticated: bool, accounts: &[LinkedAccount]) {
        let mut wallets: Vec<ConnectedWallet> = Vec::new();
        for account in accounts {
            let Some(address) = WalletAddress::parse(&account.identifier) else {
                debug!(identifier = %account.identifier, "skipping non-chain linked account");
                continue;
            };
            if wallets.iter().any(|w| w.address == address) {
                continue;
            }
            wallets.push(ConnectedWallet {
                address,
                custody: account.custody,
            });
        }

        let mut state = self.state.write().expect("registry lock poisoned");
        state.authenticated = authenticated;
        state.wallets = wallets;
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().expect("registry lock poisoned").authenticated
    }

    /// All connected wallets, in first-linked order.
    pub fn wallets(&self) -> Vec<ConnectedWallet> {
        self.state.read().expect("registry lock poisoned").wallets.clone()
    }

    /// The wallet used when no explicit choice is required: the first
    /// linked chain wallet, if any.
    pub fn default_wallet(&self) -> Option<ConnectedWallet> {
        self.state
            .read()
            .expect("registry lock poisoned")
            .wallets
            .first()
            .cloned()
    }

    pub fn find(&self, address: &WalletAddress) -> Option<ConnectedWallet> {
        self.state
            .read()
            .expect("registry lock poisoned")
            .wallets
            .iter()
            .find(|w| &w.address == address)
            .cloned()
    }

    /// Custody kind lookup used when classifying a picked wallet.
    pub fn custody_of(&self, address: &WalletAddress) -> Option<Custody> {
        self.find(address).map(|w| w.custody)
    }
}
