use arcadia_types::WalletAddress;

/// Build-time chain parameters for the wager flow.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Chain the active wallet must be switched to before any contract
    /// interaction.
    pub chain_id: u64,
    /// Address of the wager contract; also the ERC-20 allowance spender.
    pub contract: WalletAddress,
}

/// Host environment descriptor, computed once at startup and passed to the
/// components that need it rather than re-derived from platform globals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Environment {
    /// Whether the hosting device is a mobile device. Forwarded to the
    /// embedded engine, which adjusts its input handling and splash page.
    pub mobile: bool,
}
