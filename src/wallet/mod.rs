use crate::config::{Chain, Config, RPC_TIMEOUT};
use crate::domain::NativeBalance;
use anyhow::Result;
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use log::warn;
use url::Url;

pub mod balance;

pub use balance::native_balance;

/// JSON-RPC provider whose every request is bounded by [`RPC_TIMEOUT`].
pub fn rpc_provider(rpc_url: &str) -> Result<Provider<Http>> {
    let client = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
    let url = Url::parse(rpc_url)?;
    Ok(Provider::new(Http::new_with_client(url, client)))
}

/// Provider for `chain`, if its RPC endpoint is configured and parses.
pub fn chain_provider(config: &Config, chain: Chain) -> Option<Provider<Http>> {
    let url = config.rpc_url(chain)?;

    match rpc_provider(url) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!("⚠️ [{}] Invalid RPC endpoint: {}", chain, e);
            None
        }
    }
}

/// Native balance of every enabled chain, queried one after another.
/// Chains without an RPC endpoint or with a failing one are left out.
pub async fn native_balances(config: &Config, wallet: Address) -> Vec<NativeBalance> {
    let mut balances = Vec::new();

    for &chain in &config.enabled_chains {
        let provider = chain_provider(config, chain);

        if let Some(amount) = native_balance(provider.as_ref(), chain, wallet).await {
            balances.push(NativeBalance { chain, amount });
        }
    }

    balances
}
