use crate::config::Chain;
use ethers::types::U256;
use rust_decimal::Decimal;

pub mod amount;

pub use amount::TokenAmount;

// ==================================================
// TOKEN HOLDINGS
// ==================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    pub symbol: String,
    pub contract_name: Option<String>,
    pub contract_address: Option<String>,
    pub raw_balance: U256,
    pub decimals: u32,
    pub normalized_amount: TokenAmount,
    pub unit_price: Option<Decimal>,
    /// Zero when the unit price is unknown.
    pub fiat_value: Decimal,
}

impl TokenHolding {
    pub fn new(
        symbol: &str,
        contract_name: Option<String>,
        contract_address: Option<String>,
        raw_balance: U256,
        decimals: u32,
        unit_price: Option<Decimal>,
    ) -> Self {
        let normalized_amount = TokenAmount::new(raw_balance, decimals);
        Self {
            symbol: symbol.to_uppercase(),
            contract_name,
            contract_address,
            raw_balance,
            decimals,
            normalized_amount,
            unit_price,
            fiat_value: amount::fiat_value(&normalized_amount, unit_price),
        }
    }
}

// ==================================================
// REPORT SECTIONS
// ==================================================

/// Holdings of one chain, ordered by fiat value, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSection {
    pub chain: Chain,
    pub holdings: Vec<TokenHolding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeBalance {
    pub chain: Chain,
    pub amount: TokenAmount,
}

// ==================================================
// TRANSACTIONS
// ==================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub tx_hash: String,
    pub block_signed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub successful: Option<bool>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Native units, 18-decimal scaled.
    pub value: TokenAmount,
}
