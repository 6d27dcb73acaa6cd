use crate::wallet::Currency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-chain game identifier: the catalog title lower-cased with all
/// whitespace stripped (`"Viral Defense"` -> `"viraldefense"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn from_title(title: &str) -> Self {
        Self(
            title
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry, as cached from the backend game list.
///
/// `tournament` reflects the catalog's view of wager eligibility; the
/// settlement flow re-checks the authoritative on-chain state before
/// submitting anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub title: String,
    #[serde(default)]
    pub tournament: bool,
}

impl Game {
    pub fn id(&self) -> GameId {
        GameId::from_title(&self.title)
    }
}

/// On-chain wager configuration for one game, read fresh per attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnchainGame {
    /// Entry fee in the smallest unit of the wager currency.
    pub fee: u128,
    pub recurring: bool,
    pub active: bool,
}

/// Snapshot of wager terms bound to one settlement attempt.
///
/// Never cached across attempts: fee, currency, and the active flag can all
/// change between game sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WagerTerms {
    pub fee: u128,
    pub currency: Currency,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_id_strips_whitespace_and_lowercases() {
        assert_eq!(GameId::from_title("Viral Defense").as_str(), "viraldefense");
        assert_eq!(GameId::from_title("  Night\tRacer ").as_str(), "nightracer");
        assert_eq!(GameId::from_title("viraldefense").as_str(), "viraldefense");
    }

    #[test]
    fn catalog_entry_deserializes_without_tournament_flag() {
        let game: Game = serde_json::from_str(r#"{"title":"Viral Defense"}"#).unwrap();
        assert!(!game.tournament);
        assert_eq!(game.id().as_str(), "viraldefense");
    }
}
