use log::warn;
use std::fmt;

/* =======================
KNOWN CHAINS
======================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chain {
    Ethereum,
    Base,
    Optimism,
    ZkSync,
    Polygon,
    Arbitrum,
    Bsc,
    Avalanche,
    Fantom,
}

impl Chain {
    /// Table order. Also the default enabled-chain order.
    pub const ALL: [Chain; 9] = [
        Chain::Ethereum,
        Chain::Base,
        Chain::Optimism,
        Chain::ZkSync,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Bsc,
        Chain::Avalanche,
        Chain::Fantom,
    ];

    /// Chain id as accepted by the indexing service (EVM chain id).
    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Base => 8453,
            Chain::Optimism => 10,
            Chain::ZkSync => 324,
            Chain::Polygon => 137,
            Chain::Arbitrum => 42161,
            Chain::Bsc => 56,
            Chain::Avalanche => 43114,
            Chain::Fantom => 250,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Base => "Base",
            Chain::Optimism => "Optimism",
            Chain::ZkSync => "zkSync",
            Chain::Polygon => "Polygon",
            Chain::Arbitrum => "Arbitrum",
            Chain::Bsc => "BSC",
            Chain::Avalanche => "Avalanche",
            Chain::Fantom => "Fantom",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Polygon => "POL",
            Chain::Bsc => "BNB",
            Chain::Avalanche => "AVAX",
            Chain::Fantom => "FTM",
            _ => "ETH",
        }
    }

    /// Environment key holding this chain's JSON-RPC endpoint.
    pub fn rpc_env_key(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETHEREUM_RPC",
            Chain::Base => "BASE_RPC",
            Chain::Optimism => "OPTIMISM_RPC",
            Chain::ZkSync => "ZKSYNC_RPC",
            Chain::Polygon => "POLYGON_RPC",
            Chain::Arbitrum => "ARBITRUM_RPC",
            Chain::Bsc => "BSC_RPC",
            Chain::Avalanche => "AVALANCHE_RPC",
            Chain::Fantom => "FANTOM_RPC",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Chain::Ethereum => &["ethereum", "eth", "mainnet"],
            Chain::Base => &["base"],
            Chain::Optimism => &["optimism", "op"],
            Chain::ZkSync => &["zksync", "zksync-era", "zksync_era", "era"],
            Chain::Polygon => &["polygon", "matic", "pol"],
            Chain::Arbitrum => &["arbitrum", "arb", "arbitrum-one"],
            Chain::Bsc => &["bsc", "bnb", "binance"],
            Chain::Avalanche => &["avalanche", "avax"],
            Chain::Fantom => &["fantom", "ftm"],
        }
    }

    /// Case-insensitive lookup by name or alias.
    pub fn from_name(name: &str) -> Option<Chain> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        Chain::ALL
            .iter()
            .copied()
            .find(|c| c.aliases().contains(&needle.as_str()))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/* =======================
ENABLED-CHAIN LIST
======================= */

/// Parses a comma-separated chain list. Unknown names are dropped with a
/// warning, duplicates keep their first position. An empty list means every
/// known chain.
pub fn parse_enabled_chains(raw: Option<&str>) -> Vec<Chain> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Chain::ALL.to_vec(),
    };

    let mut chains = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match Chain::from_name(name) {
            Some(chain) if !chains.contains(&chain) => chains.push(chain),
            Some(_) => {}
            None => warn!("⚠️ Unknown chain '{}' dropped from enabled chains", name),
        }
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_aliases_case_insensitively() {
        assert_eq!(Chain::from_name("Ethereum"), Some(Chain::Ethereum));
        assert_eq!(Chain::from_name(" BASE "), Some(Chain::Base));
        assert_eq!(Chain::from_name("zksync-era"), Some(Chain::ZkSync));
        assert_eq!(Chain::from_name("matic"), Some(Chain::Polygon));
        assert_eq!(Chain::from_name("solana"), None);
        assert_eq!(Chain::from_name(""), None);
    }

    #[test]
    fn chain_ids_match_the_indexer_table() {
        let ids: Vec<u64> = Chain::ALL.iter().map(Chain::id).collect();
        assert_eq!(ids, vec![1, 8453, 10, 324, 137, 42161, 56, 43114, 250]);
    }

    #[test]
    fn missing_or_blank_list_enables_everything() {
        assert_eq!(parse_enabled_chains(None), Chain::ALL.to_vec());
        assert_eq!(parse_enabled_chains(Some("  ")), Chain::ALL.to_vec());
    }

    #[test]
    fn unknown_and_duplicate_names_are_dropped_in_order() {
        let chains = parse_enabled_chains(Some("base, solana,ETH,,eth,zksync"));
        assert_eq!(chains, vec![Chain::Base, Chain::Ethereum, Chain::ZkSync]);
    }

    #[test]
    fn all_unknown_names_yield_no_chains() {
        assert!(parse_enabled_chains(Some("solana,tron")).is_empty());
    }
}
