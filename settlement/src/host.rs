use crate::bridge::RuntimeBridge;
use crate::config::Environment;
use crate::orchestrator::Orchestrator;
use crate::reporter::PlayCountReporter;
use arcadia_types::{EngineCommand, EngineMessage, Game, RuntimeIdentity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// Channel identifier the game-player view subscribes under.
pub const GAME_PLAYER_CHANNEL: &str = "game-player";

/// Glue between the hosted game view and the settlement machinery.
///
/// Owns the inbound side of the runtime bridge for one game session:
/// dispatches engine commands, pushes the runtime identity whenever it
/// changes or the engine asks for it, and fires the one-shot play-count
/// report when the engine finishes loading.
pub struct GameHost {
    orchestrator: Arc<Orchestrator>,
    bridge: Arc<RuntimeBridge>,
    reporter: PlayCountReporter,
    environment: Environment,
    game: Game,
    identity: Mutex<RuntimeIdentity>,
    reported: AtomicBool,
}

impl GameHost {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        bridge: Arc<RuntimeBridge>,
        reporter: PlayCountReporter,
        environment: Environment,
        game: Game,
    ) -> Self {
        let identity = RuntimeIdentity::guest(environment.mobile);
        Self {
            orchestrator,
            bridge,
            reporter,
            environment,
            game,
            identity: Mutex::new(identity),
            reported: AtomicBool::new(false),
        }
    }

    /// Drive the inbound command loop until the subscription closes.
    pub async fn run(self: Arc<Self>, mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }
        debug!(game = %self.game.title, "engine command channel closed");
    }

    pub async fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::ConnectWallet => self.push_identity(),
            EngineCommand::SendWager => {
                // The orchestrator has already notified the user of any
                // failure; nothing further to surface here.
                if let Err(err) = self.orchestrator.place_wager(&self.game).await {
                    debug!(game = %self.game.title, error = %err, "wager command failed");
                }
            }
            EngineCommand::GameEnd => {
                debug!(game = %self.game.title, "game ended");
            }
        }
    }

    /// Replace the runtime identity, re-pushing it to the engine when any
    /// constituent value actually changed.
    pub fn set_identity(&self, identity: RuntimeIdentity) {
        {
            let mut current = self.identity.lock().expect("identity lock poisoned");
            if *current == identity {
                return;
            }
            *current = identity;
        }
        self.push_identity();
    }

    /// Send the full identity block to the engine.
    pub fn push_identity(&self) {
        let messages = self
            .identity
            .lock()
            .expect("identity lock poisoned")
            .messages();
        for message in messages {
            self.bridge.send(message);
        }
    }

    /// Invoked when the engine's load progress reaches completion: tell the
    /// splash page about the device class and report the play, once.
    pub fn engine_loaded(&self) {
        self.bridge
            .send(EngineMessage::set_mobile_device_check(self.environment.mobile));

        if self.reported.swap(true, Ordering::SeqCst) {
            return;
        }
        let reporter = self.reporter.clone();
        let title = self.game.title.clone();
        tokio::spawn(async move {
            reporter.report(&title).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::WalletGateway;
    use crate::config::ChainConfig;
    use crate::mocks::{MockContract, MockGateway, MockNotifier, MockPicker, MockSink};
    use crate::orchestrator::WalletPicker;
    use crate::registry::WalletRegistry;
    use crate::session::ChainSessionManager;
    use arcadia_types::{Currency, Custody, LinkedAccount, OnchainGame, WalletAddress};
    use axum::extract::State as AxumState;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use tokio::time::{sleep, Duration};
    use url::Url;

    const WALLET_A: &str = "0x00000000000000000000000000000000000000aa";

    struct Fixture {
        host: Arc<GameHost>,
        bridge: Arc<RuntimeBridge>,
        sink: Arc<MockSink>,
        notifier: Arc<MockNotifier>,
        contract: Arc<MockContract>,
        registry: Arc<WalletRegistry>,
        titles: Arc<Mutex<Vec<String>>>,
        server: tokio::task::JoinHandle<()>,
    }

    impl Fixture {
        async fn new() -> Self {
            let titles: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
            let router = Router::new()
                .route(
                    "/api/games",
                    post(
                        |AxumState(titles): AxumState<Arc<Mutex<Vec<String>>>>,
                         Json(body): Json<serde_json::Value>| async move {
                            let title = body["title"].as_str().unwrap_or_default().to_string();
                            titles.lock().unwrap().push(title);
                            StatusCode::OK
                        },
                    ),
                )
                .with_state(titles.clone());

            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let base_url: Url = format!("http://{}", listener.local_addr().unwrap())
                .parse()
                .unwrap();
            let server = tokio::spawn(async move {
                axum::serve(listener, router.into_make_service())
                    .await
                    .unwrap();
            });

            let registry = Arc::new(WalletRegistry::new());
            let gateway: Arc<dyn WalletGateway> = Arc::new(MockGateway::new());
            let contract = Arc::new(MockContract::new(Currency::Native));
            let picker: Arc<dyn WalletPicker> = Arc::new(MockPicker::dismissing());
            let notifier = Arc::new(MockNotifier::new());
            let bridge = Arc::new(RuntimeBridge::new());
            let sink = Arc::new(MockSink::new());
            bridge.engine_ready(sink.clone());

            let orchestrator = Arc::new(Orchestrator::new(
                Arc::clone(&registry),
                ChainSessionManager::new(
                    gateway,
                    ChainConfig {
                        chain_id: 10143,
                        contract: WalletAddress::parse(
                            "0x00000000000000000000000000000000000000dd",
                        )
                        .unwrap(),
                    },
                ),
                contract.clone(),
                picker,
                notifier.clone(),
                Arc::clone(&bridge),
            ));

            let host = Arc::new(GameHost::new(
                orchestrator,
                Arc::clone(&bridge),
                PlayCountReporter::new(base_url),
                Environment { mobile: true },
                Game {
                    title: "Viral Defense".to_string(),
                    tournament: true,
                },
            ));

            Self {
                host,
                bridge,
                sink,
                notifier,
                contract,
                registry,
                titles,
                server,
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            self.server.abort();
        }
    }

    #[tokio::test]
    async fn connect_wallet_pushes_the_identity_block() {
        let fixture = Fixture::new().await;
        let wallet = WalletAddress::parse(WALLET_A).unwrap();
        fixture.host.set_identity(RuntimeIdentity {
            user_name: "player1".to_string(),
            wallet_address: Some(wallet.clone()),
            auth_token: "tok".to_string(),
            mobile: true,
        });

        // set_identity already pushed once; ConnectWallet pushes again.
        fixture.host.handle(EngineCommand::ConnectWallet).await;

        let delivered = fixture.sink.delivered();
        assert_eq!(delivered.len(), 8);
        assert_eq!(
            &delivered[4..],
            &[
                EngineMessage::set_user_name("player1"),
                EngineMessage::set_wallet_address(Some(&wallet)),
                EngineMessage::set_token("tok"),
                EngineMessage::set_mobile_device_state(true),
            ]
        );
    }

    #[tokio::test]
    async fn unchanged_identity_is_not_repushed() {
        let fixture = Fixture::new().await;
        let identity = RuntimeIdentity {
            user_name: "player1".to_string(),
            wallet_address: None,
            auth_token: "tok".to_string(),
            mobile: true,
        };
        fixture.host.set_identity(identity.clone());
        let pushed_once = fixture.sink.delivered().len();

        fixture.host.set_identity(identity);
        assert_eq!(fixture.sink.delivered().len(), pushed_once);
    }

    #[tokio::test]
    async fn send_wager_runs_the_settlement_flow() {
        let fixture = Fixture::new().await;
        fixture
            .registry
            .refresh(true, &[LinkedAccount::new(WALLET_A, Custody::External)]);
        fixture.contract.set_game(
            arcadia_types::GameId::from_title("Viral Defense"),
            OnchainGame {
                fee: 1_000,
                recurring: false,
                active: true,
            },
        );

        fixture.host.handle(EngineCommand::SendWager).await;

        assert_eq!(fixture.contract.wagers().len(), 1);
        assert_eq!(fixture.notifier.successes(), vec!["Wager sent!".to_string()]);
    }

    #[tokio::test]
    async fn send_wager_failure_is_notified_not_propagated() {
        let fixture = Fixture::new().await;
        // Not authenticated: the orchestrator fails, the host shrugs.
        fixture.host.handle(EngineCommand::SendWager).await;
        assert_eq!(fixture.notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn engine_loaded_reports_the_play_once() {
        let fixture = Fixture::new().await;
        fixture.host.engine_loaded();
        fixture.host.engine_loaded();

        // Give the spawned report a moment to land.
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            *fixture.titles.lock().unwrap(),
            vec!["Viral Defense".to_string()]
        );
        // Both loads pushed the device check.
        let checks: Vec<_> = fixture
            .sink
            .delivered()
            .into_iter()
            .filter(|m| *m == EngineMessage::set_mobile_device_check(true))
            .collect();
        assert_eq!(checks.len(), 2);
    }

    #[tokio::test]
    async fn run_drains_the_bridge_subscription() {
        let fixture = Fixture::new().await;
        let (guard, commands) = fixture.bridge.subscribe(GAME_PLAYER_CHANNEL);
        let runner = tokio::spawn(Arc::clone(&fixture.host).run(commands));

        assert!(fixture.bridge.dispatch(GAME_PLAYER_CHANNEL, "ConnectWallet"));
        assert!(fixture.bridge.dispatch(GAME_PLAYER_CHANNEL, "GameEnd"));

        // Tearing down the subscription ends the loop.
        drop(guard);
        // The sender is held inside the bridge registry; dropping the guard
        // removed it, closing the channel once in-flight sends drain.
        runner.await.unwrap();

        // ConnectWallet produced one identity block.
        assert_eq!(fixture.sink.delivered().len(), 4);
    }
}
