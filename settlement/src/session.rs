use crate::chain::WalletGateway;
use crate::config::ChainConfig;
use crate::Result;
use arcadia_types::{ConnectedWallet, Custody};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prepares a wallet for contract interaction and tears the preparation
/// down again.
///
/// Preparation switches the wallet to the configured chain and, for
/// embedded-custody wallets, grants a temporary session-signer delegation
/// so the platform can co-sign the attempt's transactions. The delegation
/// is scoped to one settlement attempt: [`release`](Self::release) must run
/// on every exit path that reached a successful
/// [`prepare`](Self::prepare), including failures.
pub struct ChainSessionManager {
    gateway: Arc<dyn WalletGateway>,
    config: ChainConfig,
}

/// Proof that a wallet has been prepared. Carries whether a delegation was
/// granted and therefore must be revoked.
#[derive(Debug)]
pub struct ActiveSession {
    wallet: ConnectedWallet,
    delegated: bool,
}

impl ActiveSession {
    pub fn wallet(&self) -> &ConnectedWallet {
        &self.wallet
    }

    pub fn is_delegated(&self) -> bool {
        self.delegated
    }
}

impl ChainSessionManager {
    pub fn new(gateway: Arc<dyn WalletGateway>, config: ChainConfig) -> Self {
        Self { gateway, config }
    }

    /// Switch `wallet` to the configured chain and grant a session-signer
    /// delegation when its custody requires one.
    pub async fn prepare(&self, wallet: &ConnectedWallet) -> Result<ActiveSession> {
        self.gateway
            .switch_chain(&wallet.address, self.config.chain_id)
            .await?;

        let delegated = match wallet.custody {
            Custody::Embedded => {
                self.gateway.grant_session_signers(&wallet.address).await?;
                debug!(wallet = %wallet.address, "session signers granted");
                true
            }
            Custody::External => false,
        };

        Ok(ActiveSession {
            wallet: wallet.clone(),
            delegated,
        })
    }

    /// Revoke the session's delegation, if one was granted.
    ///
    /// Revocation failures are logged and swallowed: the attempt is already
    /// closing and there is nothing further to unwind, but a dangling grant
    /// must not block the close.
    pub async fn release(&self, session: ActiveSession) {
        if !session.delegated {
            return;
        }
        if let Err(err) = self
            .gateway
            .revoke_session_signers(&session.wallet.address)
            .await
        {
            warn!(wallet = %session.wallet.address, error = %err, "failed to revoke session signers");
        } else {
            debug!(wallet = %session.wallet.address, "session signers revoked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{GatewayOp, MockGateway};
    use arcadia_types::WalletAddress;

    const CHAIN_ID: u64 = 10143;

    fn config() -> ChainConfig {
        ChainConfig {
            chain_id: CHAIN_ID,
            contract: WalletAddress::parse("0x00000000000000000000000000000000000000dd").unwrap(),
        }
    }

    fn wallet(custody: Custody) -> ConnectedWallet {
        ConnectedWallet {
            address: WalletAddress::parse("0x00000000000000000000000000000000000000aa").unwrap(),
            custody,
        }
    }

    #[tokio::test]
    async fn external_wallets_skip_delegation() {
        let gateway = Arc::new(MockGateway::new());
        let manager = ChainSessionManager::new(gateway.clone(), config());

        let session = manager.prepare(&wallet(Custody::External)).await.unwrap();
        assert!(!session.is_delegated());

        manager.release(session).await;
        assert_eq!(gateway.ops(), vec![GatewayOp::SwitchChain(CHAIN_ID)]);
    }

    #[tokio::test]
    async fn embedded_wallets_are_delegated_and_revoked() {
        let gateway = Arc::new(MockGateway::new());
        let manager = ChainSessionManager::new(gateway.clone(), config());

        let session = manager.prepare(&wallet(Custody::Embedded)).await.unwrap();
        assert!(session.is_delegated());

        manager.release(session).await;
        assert_eq!(
            gateway.ops(),
            vec![
                GatewayOp::SwitchChain(CHAIN_ID),
                GatewayOp::Grant,
                GatewayOp::Revoke,
            ]
        );
    }

    #[tokio::test]
    async fn chain_switch_failure_grants_nothing() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_switch_chain();
        let manager = ChainSessionManager::new(gateway.clone(), config());

        let err = manager.prepare(&wallet(Custody::Embedded)).await.unwrap_err();
        assert!(matches!(err, crate::Error::ChainSwitch { .. }));
        assert_eq!(gateway.ops(), vec![GatewayOp::SwitchChain(CHAIN_ID)]);
    }

    #[tokio::test]
    async fn revocation_failure_is_swallowed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_revoke();
        let manager = ChainSessionManager::new(gateway.clone(), config());

        let session = manager.prepare(&wallet(Custody::Embedded)).await.unwrap();
        // Must not panic or propagate.
        manager.release(session).await;
        assert_eq!(
            gateway.ops(),
            vec![
                GatewayOp::SwitchChain(CHAIN_ID),
                GatewayOp::Grant,
                GatewayOp::Revoke,
            ]
        );
    }
}
