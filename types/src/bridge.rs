use crate::wallet::WalletAddress;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder wallet string pushed to the engine when no wallet is
/// connected yet.
const NO_WALLET: &str = "No Wallet";

/// Commands the embedded engine sends to the hosting page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// The engine wants the current user identity pushed to it.
    ConnectWallet,
    /// The user triggered an on-chain wager from inside the game.
    SendWager,
    /// The game session ended. Hook for future use; currently a no-op.
    GameEnd,
}

impl EngineCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectWallet => "ConnectWallet",
            Self::SendWager => "SendWager",
            Self::GameEnd => "GameEnd",
        }
    }
}

/// A command tag the bridge does not recognize.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown engine command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for EngineCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ConnectWallet" => Ok(Self::ConnectWallet),
            "SendWager" => Ok(Self::SendWager),
            "GameEnd" => Ok(Self::GameEnd),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// An outbound message to the embedded engine: a target object, a method on
/// it, and a single string payload. Delivery is fire-and-forget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineMessage {
    pub target: &'static str,
    pub method: &'static str,
    pub payload: String,
}

impl EngineMessage {
    fn new(target: &'static str, method: &'static str, payload: impl Into<String>) -> Self {
        Self {
            target,
            method,
            payload: payload.into(),
        }
    }

    pub fn set_user_name(name: &str) -> Self {
        Self::new("NetworkManager", "SetUserName", name)
    }

    pub fn set_wallet_address(address: Option<&WalletAddress>) -> Self {
        let payload = address.map_or(NO_WALLET.to_string(), |a| a.as_str().to_string());
        Self::new("NetworkManager", "SetWalletAddress", payload)
    }

    pub fn set_token(token: &str) -> Self {
        Self::new("NetworkManager", "SetToken", token)
    }

    pub fn set_mobile_device_state(mobile: bool) -> Self {
        Self::new("NetworkManager", "SetMobileDeviceState", bool_payload(mobile))
    }

    /// Tell the engine to persist its state. Always sent before
    /// `wager_response` so a crash between the two leaves recoverable
    /// state.
    pub fn set_save_data() -> Self {
        Self::new("NetworkManager", "SetSaveData", "true")
    }

    /// Report a confirmed wager back into the game.
    pub fn wager_response() -> Self {
        Self::new("WagerManager", "wagerResponse", "true")
    }

    pub fn set_mobile_device_check(mobile: bool) -> Self {
        Self::new("SplashPage", "SetMobileDeviceCheck", bool_payload(mobile))
    }
}

impl fmt::Display for EngineMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.target, self.method, self.payload)
    }
}

fn bool_payload(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Everything the engine needs to know about the current user. Pushed
/// whenever any constituent value changes or the engine requests it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeIdentity {
    pub user_name: String,
    pub wallet_address: Option<WalletAddress>,
    pub auth_token: String,
    pub mobile: bool,
}

impl RuntimeIdentity {
    pub fn guest(mobile: bool) -> Self {
        Self {
            user_name: "Guest".to_string(),
            wallet_address: None,
            auth_token: String::new(),
            mobile,
        }
    }

    /// The identity push, in the order the engine expects it: user name,
    /// wallet address, auth token, device class.
    pub fn messages(&self) -> Vec<EngineMessage> {
        vec![
            EngineMessage::set_user_name(&self.user_name),
            EngineMessage::set_wallet_address(self.wallet_address.as_ref()),
            EngineMessage::set_token(&self.auth_token),
            EngineMessage::set_mobile_device_state(self.mobile),
        ]
    }
}
