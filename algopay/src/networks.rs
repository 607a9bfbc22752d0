//! Network identification for the two public Algorand networks.
//!
//! Checkout targets one account-based chain with two deployments. Each
//! network carries the wallet-protocol chain id used when initiating a
//! wallet session and the well-known USDC asset id for that deployment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// USDC fractional decimals on both networks.
pub const USDC_DECIMALS: u32 = 6;

/// One of the two public Algorand networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The production network.
    #[serde(rename = "mainnet")]
    MainNet,
    /// The public test network.
    #[serde(rename = "testnet")]
    TestNet,
}

impl Network {
    /// Human-readable network name as used by the merchant form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet",
            Self::TestNet => "testnet",
        }
    }

    /// Chain id used by the wallet-connection protocol.
    #[must_use]
    pub const fn wallet_chain_id(self) -> u32 {
        match self {
            Self::MainNet => 416_001,
            Self::TestNet => 416_002,
        }
    }

    /// Genesis id embedded in transactions for this network.
    #[must_use]
    pub const fn genesis_id(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet-v1.0",
            Self::TestNet => "testnet-v1.0",
        }
    }

    /// The Circle USDC asset id on this network.
    #[must_use]
    pub const fn usdc_asset_id(self) -> u64 {
        match self {
            Self::MainNet => 31_566_704,
            Self::TestNet => 10_458_941,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::MainNet),
            "testnet" => Ok(Self::TestNet),
            other => Err(format!("unknown network '{other}'")),
        }
    }
}
