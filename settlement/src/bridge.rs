use arcadia_types::{EngineCommand, EngineMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Most outbound messages held while the engine is still loading. The full
/// settlement flow produces a handful of messages; hitting this limit means
/// the engine is wedged, not that the host is bursty.
const OUTBOUND_QUEUE_LIMIT: usize = 64;

/// Fire-and-forget delivery into the embedded engine. No acknowledgment,
/// no delivery guarantee beyond "the engine was loaded when this was sent".
pub trait EngineSink: Send + Sync {
    fn deliver(&self, message: &EngineMessage);
}

/// Bidirectional message channel between the hosting page and the embedded
/// game engine.
///
/// Inbound commands are routed through an explicit subscription registry
/// keyed by channel identifier; the hosting view owns its subscription and
/// tears it down deterministically by dropping the [`Subscription`] guard.
/// Outbound messages are buffered in a bounded queue until the engine
/// signals readiness, then flushed in order.
pub struct RuntimeBridge {
    state: Mutex<BridgeState>,
}

#[derive(Default)]
struct BridgeState {
    subscribers: HashMap<String, ChannelEntry>,
    next_token: u64,
    sink: Option<Arc<dyn EngineSink>>,
    queue: VecDeque<EngineMessage>,
}

struct ChannelEntry {
    token: u64,
    sender: mpsc::UnboundedSender<EngineCommand>,
}

/// Guard for an inbound subscription. Dropping it unsubscribes the channel,
/// unless a newer subscriber has already replaced it.
pub struct Subscription {
    bridge: Arc<RuntimeBridge>,
    channel: String,
    token: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.bridge.state.lock().expect("bridge lock poisoned");
        if state
            .subscribers
            .get(&self.channel)
            .is_some_and(|entry| entry.token == self.token)
        {
            state.subscribers.remove(&self.channel);
        }
    }
}

impl Default for RuntimeBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBridge {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState::default()),
        }
    }

    /// Subscribe to inbound commands on `channel`. A second subscription to
    /// the same channel replaces the first.
    pub fn subscribe(
        self: &Arc<Self>,
        channel: &str,
    ) -> (Subscription, mpsc::UnboundedReceiver<EngineCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().expect("bridge lock poisoned");
        let token = state.next_token;
        state.next_token += 1;
        if state
            .subscribers
            .insert(channel.to_string(), ChannelEntry { token, sender })
            .is_some()
        {
            debug!(channel, "replaced existing bridge subscriber");
        }
        (
            Subscription {
                bridge: Arc::clone(self),
                channel: channel.to_string(),
                token,
            },
            receiver,
        )
    }

    /// Route a raw command tag from the engine to the channel's subscriber.
    ///
    /// Returns whether the command was delivered. Unknown tags and
    /// unsubscribed channels are logged and dropped.
    pub fn dispatch(&self, channel: &str, raw: &str) -> bool {
        let command: EngineCommand = match raw.parse() {
            Ok(command) => command,
            Err(err) => {
                warn!(channel, %err, "dropping inbound engine message");
                return false;
            }
        };

        let mut state = self.state.lock().expect("bridge lock poisoned");
        match state.subscribers.get(channel) {
            Some(entry) => {
                if entry.sender.send(command).is_err() {
                    // Receiver dropped without the guard; treat as gone.
                    state.subscribers.remove(channel);
                    warn!(channel, command = command.as_str(), "subscriber receiver closed");
                    return false;
                }
                true
            }
            None => {
                warn!(channel, command = command.as_str(), "no subscriber for inbound command");
                false
            }
        }
    }

    /// Send a message to the engine, or queue it if the engine has not
    /// signalled readiness yet.
    pub fn send(&self, message: EngineMessage) {
        let mut state = self.state.lock().expect("bridge lock poisoned");
        if let Some(sink) = state.sink.clone() {
            drop(state);
            sink.deliver(&message);
            return;
        }
        if state.queue.len() >= OUTBOUND_QUEUE_LIMIT {
            warn!(%message, "outbound queue full, dropping message");
            return;
        }
        state.queue.push_back(message);
    }

    /// Attach the engine's delivery sink and flush everything queued while
    /// it was loading, in send order.
    pub fn engine_ready(&self, sink: Arc<dyn EngineSink>) {
        let queued = {
            let mut state = self.state.lock().expect("bridge lock poisoned");
            state.sink = Some(Arc::clone(&sink));
            std::mem::take(&mut state.queue)
        };
        for message in queued {
            sink.deliver(&message);
        }
    }

    /// Detach the delivery sink when the hosting view unmounts. Later sends
    /// queue again (up to the bound) for a subsequent load.
    pub fn engine_unloaded(&self) {
        let mut state = self.state.lock().expect("bridge lock poisoned");
        state.sink = None;
    }
}
