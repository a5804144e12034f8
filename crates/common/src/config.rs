//! Node configuration.

use serde::{Deserialize, Serialize};

/// Configuration consumed by the ledger core.
///
/// The fee and reserve fields are the system defaults used when a ledger
/// carries no fee-settings entry (or an entry with missing fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cost of the reference transaction, in drops.
    #[serde(default = "default_fee")]
    pub fee_default: u64,

    /// Cost of the reference transaction, in fee units.
    #[serde(default = "default_fee_units")]
    pub transaction_fee_base: u32,

    /// Minimum balance an account must hold, in drops.
    #[serde(default = "default_account_reserve")]
    pub fee_account_reserve: u32,

    /// Additional reserve per owned item, in drops.
    #[serde(default = "default_owner_reserve")]
    pub fee_owner_reserve: u32,

    /// Run without a network (single node closes its own ledgers).
    #[serde(default)]
    pub run_standalone: bool,

    /// Enforce trust-line freeze flags.
    #[serde(default = "default_true")]
    pub enforce_freeze: bool,
}

fn default_fee() -> u64 {
    10
}

fn default_fee_units() -> u32 {
    10
}

fn default_account_reserve() -> u32 {
    20_000_000
}

fn default_owner_reserve() -> u32 {
    5_000_000
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fee_default: default_fee(),
            transaction_fee_base: default_fee_units(),
            fee_account_reserve: default_account_reserve(),
            fee_owner_reserve: default_owner_reserve(),
            run_standalone: false,
            enforce_freeze: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.fee_default, 10);
        assert!(config.enforce_freeze);
        assert!(!config.run_standalone);
    }
}
