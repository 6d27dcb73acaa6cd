pub mod bridge;
pub mod game;
pub mod wallet;

pub use bridge::{EngineCommand, EngineMessage, RuntimeIdentity, UnknownCommand};
pub use game::{Game, GameId, OnchainGame, WagerTerms};
pub use wallet::{ConnectedWallet, Currency, Custody, LinkedAccount, WalletAddress};
