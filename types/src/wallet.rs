use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a chain address string: `0x` plus 40 hex digits.
const ADDRESS_LENGTH: usize = 42;

/// The reserved zero address. As a wager currency it denotes the chain's
/// native coin rather than an ERC-20 token.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A chain-specific account identifier.
///
/// Always `0x`-prefixed, 40 hex digits, normalized to lowercase so that two
/// spellings of the same account compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a raw identifier into a chain address.
    ///
    /// Returns `None` for anything that is not a chain-format address
    /// (other identifier kinds the auth provider may link, e.g. social
    /// handles or non-EVM addresses).
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != ADDRESS_LENGTH || !raw.starts_with("0x") {
            return None;
        }
        if !raw[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(raw.to_ascii_lowercase()))
    }

    /// The zero address.
    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who holds the keys for a connected wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Custody {
    /// Platform-custodied. Transactions can be co-signed through a
    /// temporary session-signer delegation.
    Embedded,
    /// User-custodied. The user approves every transaction; no delegation.
    External,
}

/// A wallet linked to the authenticated session, post-filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectedWallet {
    pub address: WalletAddress,
    pub custody: Custody,
}

/// A raw linked account as reported by the auth provider, before the
/// registry filters it down to chain-format addresses.
#[derive(Clone, Debug)]
pub struct LinkedAccount {
    pub identifier: String,
    pub custody: Custody,
}

impl LinkedAccount {
    pub fn new(identifier: impl Into<String>, custody: Custody) -> Self {
        Self {
            identifier: identifier.into(),
            custody,
        }
    }
}

/// The currency a wager is denominated in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Currency {
    /// The chain's native coin; carried as transaction value.
    Native,
    /// An ERC-20 token; pulled by the contract via allowance.
    Token(WalletAddress),
}

impl Currency {
    /// Interpret an on-chain currency address, mapping the zero-address
    /// sentinel to the native coin.
    pub fn from_chain(address: WalletAddress) -> Self {
        if address.is_zero() {
            Self::Native
        } else {
            Self::Token(address)
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}
