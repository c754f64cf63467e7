use crate::config::{Chain, CovalentConfig, INDEXER_TIMEOUT};
use crate::domain::amount::normalize_value;
use crate::domain::TransactionSummary;
use anyhow::Result;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub mod errors;

pub use errors::FetchError;

// ==================================================
// FETCH OUTCOME
// ==================================================

/// Result of a best-effort fetch. `Items(vec![])` means the call worked and
/// nothing qualified; `Failed` means the call itself degraded.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Items(Vec<T>),
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            FetchOutcome::Items(items) => items,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn map_items<U, F>(self, f: F) -> FetchOutcome<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        match self {
            FetchOutcome::Items(items) => FetchOutcome::Items(f(items)),
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
        }
    }
}

impl<T> From<Result<Vec<T>, FetchError>> for FetchOutcome<T> {
    fn from(result: Result<Vec<T>, FetchError>) -> Self {
        match result {
            Ok(items) => FetchOutcome::Items(items),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

// ==================================================
// WIRE TYPES (Covalent)
// ==================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<ItemsPage>,
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(default)]
    items: Option<Vec<Value>>,
}

/// One entry of `balances_v2`. Numeric fields stay loosely typed; the
/// portfolio layer decides how to read them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BalanceItem {
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub contract_ticker_symbol: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub contract_decimals: Option<Value>,
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub quote_rate: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionItem {
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub block_signed_at: Option<String>,
    #[serde(default)]
    pub successful: Option<bool>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl TransactionItem {
    pub fn into_summary(self) -> TransactionSummary {
        TransactionSummary {
            tx_hash: self.tx_hash.unwrap_or_default(),
            block_signed_at: self
                .block_signed_at
                .as_deref()
                .and_then(|ts| ts.parse::<chrono::DateTime<chrono::Utc>>().ok()),
            successful: self.successful,
            from: self.from_address,
            to: self.to_address,
            value: self
                .value
                .as_ref()
                .map(|v| normalize_value(v, 18))
                .unwrap_or_default(),
        }
    }
}

/// Extracts `data.items` from a Covalent envelope. Items that do not match
/// `T` are skipped; a missing `data` block or an API-level error is an error.
pub fn parse_items<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>, FetchError> {
    let envelope: Envelope = serde_json::from_value(body.clone())
        .map_err(|e| FetchError::Malformed(e.to_string()))?;

    if envelope.error {
        return Err(FetchError::Malformed(
            envelope
                .error_message
                .unwrap_or_else(|| "API reported an error".to_string()),
        ));
    }

    let items = envelope
        .data
        .ok_or_else(|| FetchError::Malformed("missing data".to_string()))?
        .items
        .unwrap_or_default();

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("⚠️ Skipping unreadable item: {}", e);
                None
            }
        })
        .collect())
}

// ==================================================
// CLIENT
// ==================================================

#[derive(Clone)]
pub struct CovalentClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CovalentClient {
    pub fn new(config: &CovalentConfig) -> Result<Self> {
        let http = Client::builder().timeout(INDEXER_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn address_url(&self, chain: Chain, wallet: &str, endpoint: &str) -> String {
        format!(
            "{}/v1/{}/address/{}/{}/",
            self.base_url,
            chain.id(),
            wallet,
            endpoint
        )
    }

    fn check_credentials(&self, wallet: &str) -> Result<(), FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::NotConfigured("COVALENT_API_KEY"));
        }
        if wallet.trim().is_empty() {
            return Err(FetchError::NotConfigured("WALLET_ADDRESS"));
        }
        Ok(())
    }

    async fn get_items<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        debug!("📡 GET {}", url);

        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.without_url().to_string()))?;

        parse_items(&body)
    }

    // ==================================================
    // BALANCES
    // ==================================================

    /// Raw `balances_v2` items for one chain, NFTs excluded server-side.
    pub async fn fetch_balance_items(
        &self,
        chain: Chain,
        wallet: &str,
    ) -> Result<Vec<BalanceItem>, FetchError> {
        self.check_credentials(wallet)?;

        let url = self.address_url(chain, wallet, "balances_v2");
        let query = [("key", self.api_key.clone()), ("nft", "false".to_string())];

        self.get_items(&url, &query).await
    }

    // ==================================================
    // TRANSACTIONS
    // ==================================================

    pub async fn fetch_transactions(
        &self,
        chain: Chain,
        wallet: &str,
        page_size: usize,
    ) -> FetchOutcome<TransactionSummary> {
        let result = match self.check_credentials(wallet) {
            Ok(()) => {
                let url = self.address_url(chain, wallet, "transactions_v2");
                let query = [
                    ("key", self.api_key.clone()),
                    ("page-size", page_size.to_string()),
                ];
                self.get_items::<TransactionItem>(&url, &query).await
            }
            Err(e) => Err(e),
        };

        FetchOutcome::from(result).map_items(|items| {
            items
                .into_iter()
                .take(page_size)
                .map(TransactionItem::into_summary)
                .collect()
        })
    }
}
