use crate::config::Chain;
use crate::domain::TokenAmount;
use ethers::providers::Middleware;
use ethers::types::Address;
use log::warn;

// ================================
// NATIVE BALANCE (RPC)
// ================================

/// Native balance in whole units (18-decimal scaling). `None` when the chain
/// has no client or the query fails; failures are logged, never returned.
pub async fn native_balance<M: Middleware>(
    client: Option<&M>,
    chain: Chain,
    wallet: Address,
) -> Option<TokenAmount> {
    let Some(client) = client else {
        println!("[{}] RPC not configured.", chain);
        return None;
    };

    match client.get_balance(wallet, None).await {
        Ok(wei) => {
            let amount = TokenAmount::new(wei, 18);
            println!(
                "[{}] Native balance: {} {} (wei: {})",
                chain,
                amount,
                chain.native_symbol(),
                wei
            );
            Some(amount)
        }
        Err(e) => {
            warn!("❌ [{}] Error getting balance: {}", chain, e);
            None
        }
    }
}
