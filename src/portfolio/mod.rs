use crate::client::{BalanceItem, CovalentClient, FetchError, FetchOutcome};
use crate::config::Chain;
use crate::domain::amount::parse_price;
use crate::domain::TokenHolding;
use async_trait::async_trait;
use ethers::types::U256;
use log::info;
use serde_json::Value;

/// Decimals assumed when the indexer omits them.
pub const DEFAULT_DECIMALS: i64 = 18;
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

// ==================================================
// ITEM → HOLDING
// ==================================================

fn is_nft(item: &BalanceItem) -> bool {
    item.item_type
        .as_deref()
        .map(|t| t.eq_ignore_ascii_case("nft"))
        .unwrap_or(false)
}

fn read_decimals(raw: Option<&Value>) -> i64 {
    match raw {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(DEFAULT_DECIMALS),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_DECIMALS),
        _ => DEFAULT_DECIMALS,
    }
}

fn read_raw_balance(raw: Option<&Value>) -> U256 {
    let text = match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return U256::zero(),
    };
    U256::from_dec_str(&text).unwrap_or_default()
}

/// Builds a holding from one indexer item. `None` for NFTs. Unreadable
/// balances become zero rather than failing the batch.
pub fn holding_from_item(item: &BalanceItem) -> Option<TokenHolding> {
    if is_nft(item) {
        return None;
    }

    let decimals = read_decimals(item.contract_decimals.as_ref()).clamp(0, 255) as u32;
    let unit_price = item.quote_rate.as_ref().and_then(parse_price);

    let symbol = item
        .contract_ticker_symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SYMBOL);

    Some(TokenHolding::new(
        symbol,
        item.contract_name.clone(),
        item.contract_address.clone(),
        read_raw_balance(item.balance.as_ref()),
        decimals,
        unit_price,
    ))
}

// ==================================================
// RANKING
// ==================================================

/// NFTs and zero amounts are dropped, the rest stable-sorted by fiat
/// value (highest first) and cut to `top_n`.
pub fn rank_holdings(items: &[BalanceItem], top_n: usize) -> Vec<TokenHolding> {
    let mut holdings: Vec<TokenHolding> = items
        .iter()
        .filter_map(holding_from_item)
        .filter(|h| !h.normalized_amount.is_zero())
        .collect();

    holdings.sort_by(|a, b| b.fiat_value.cmp(&a.fiat_value));
    holdings.truncate(top_n);
    holdings
}

// ==================================================
// SOURCE SEAM
// ==================================================

#[async_trait]
pub trait HoldingsSource: Send + Sync {
    /// At most `top_n` holdings for `wallet` on `chain`, highest value first.
    async fn fetch_top_tokens(
        &self,
        chain: Chain,
        wallet: &str,
        top_n: usize,
    ) -> FetchOutcome<TokenHolding>;
}

#[async_trait]
impl HoldingsSource for CovalentClient {
    async fn fetch_top_tokens(
        &self,
        chain: Chain,
        wallet: &str,
        top_n: usize,
    ) -> FetchOutcome<TokenHolding> {
        let outcome: FetchOutcome<BalanceItem> =
            self.fetch_balance_items(chain, wallet).await.into();

        outcome.map_items(|items| {
            let ranked = rank_holdings(&items, top_n);
            info!(
                "✅ {}: {} item(s) → {} ranked holding(s)",
                chain,
                items.len(),
                ranked.len()
            );
            ranked
        })
    }
}

/// Name-based entry point: unknown chain names fail without a request.
pub async fn fetch_top_tokens_by_name<S: HoldingsSource + ?Sized>(
    source: &S,
    chain_name: &str,
    wallet: &str,
    top_n: usize,
) -> FetchOutcome<TokenHolding> {
    match Chain::from_name(chain_name) {
        Some(chain) => source.fetch_top_tokens(chain, wallet, top_n).await,
        None => FetchOutcome::Failed(FetchError::UnknownChain(chain_name.to_string())),
    }
}
