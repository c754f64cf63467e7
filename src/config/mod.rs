use clap::Parser;
use ethers::types::Address;
use ethers::utils::to_checksum;
use log::warn;
use std::collections::BTreeMap;
use std::time::Duration;

pub mod chains;

pub use chains::{parse_enabled_chains, Chain};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_COVALENT_API_URL: &str = "https://api.covalenthq.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_PARSE_MODE: &str = "Markdown";

pub const INDEXER_TIMEOUT: Duration = Duration::from_secs(20);
pub const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const RPC_TIMEOUT: Duration = Duration::from_secs(15);

/* =======================
CLI ARGS
======================= */

#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Tokens kept per chain (overrides TOP_N)
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// Comma-separated chain list (overrides ENABLED_CHAINS)
    #[arg(short, long)]
    pub chains: Option<String>,

    /// Print the report without posting it to Telegram
    #[arg(long)]
    pub no_notify: bool,

    /// Recent transactions to list after the report (0 disables)
    #[arg(long, default_value_t = 10)]
    pub tx_history: usize,

    /// Chain used for the transaction listing
    #[arg(long, default_value = "ethereum")]
    pub tx_chain: String,
}

/* =======================
SECTION CONFIGS
======================= */

#[derive(Debug, Clone)]
pub struct CovalentConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// `None` sends plain text.
    pub parse_mode: Option<String>,
    /// Cleared by `--no-notify`; credentials are kept.
    pub enabled: bool,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

/* =======================
MAIN CONFIG
======================= */

/// Read once at start-up and passed by reference from then on.
#[derive(Debug, Clone)]
pub struct Config {
    pub wallet: Option<Address>,
    pub covalent: CovalentConfig,
    pub telegram: TelegramConfig,
    pub rpc_urls: BTreeMap<Chain, String>,
    pub enabled_chains: Vec<Chain>,
    pub top_n: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let wallet = get("WALLET_ADDRESS").and_then(|raw| match raw.parse::<Address>() {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!("⚠️ WALLET_ADDRESS '{}' is not a valid address: {}", raw, e);
                None
            }
        });

        let parse_mode = match get("TELEGRAM_PARSE_MODE") {
            Some(mode) if mode.eq_ignore_ascii_case("none") => None,
            Some(mode) => Some(mode),
            None => Some(DEFAULT_PARSE_MODE.to_string()),
        };

        let rpc_urls = Chain::ALL
            .iter()
            .filter_map(|chain| get(chain.rpc_env_key()).map(|url| (*chain, url)))
            .collect();

        let top_n = match get("TOP_N") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("⚠️ TOP_N '{}' is not a number, using {}", raw, DEFAULT_TOP_N);
                DEFAULT_TOP_N
            }),
            None => DEFAULT_TOP_N,
        };

        Self {
            wallet,
            covalent: CovalentConfig {
                api_url: get("COVALENT_API_URL")
                    .unwrap_or_else(|| DEFAULT_COVALENT_API_URL.to_string()),
                api_key: get("COVALENT_API_KEY"),
            },
            telegram: TelegramConfig {
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                bot_token: get("TELEGRAM_BOT_TOKEN"),
                chat_id: get("TELEGRAM_CHAT_ID"),
                parse_mode,
                enabled: true,
            },
            rpc_urls,
            enabled_chains: parse_enabled_chains(get("ENABLED_CHAINS").as_deref()),
            top_n,
        }
    }

    /// Applies CLI overrides on top of the environment.
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(n) = args.top_n {
            self.top_n = n;
        }
        if let Some(chains) = args.chains.as_deref() {
            self.enabled_chains = parse_enabled_chains(Some(chains));
        }
        if args.no_notify {
            self.telegram.enabled = false;
        }
        self
    }

    /// Checksummed (EIP-55) wallet, or `None` when unconfigured.
    pub fn wallet_checksum(&self) -> Option<String> {
        self.wallet.as_ref().map(|w| to_checksum(w, None))
    }

    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        self.rpc_urls.get(&chain).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]);

        assert!(cfg.wallet.is_none());
        assert!(cfg.covalent.api_key.is_none());
        assert_eq!(cfg.covalent.api_url, DEFAULT_COVALENT_API_URL);
        assert!(!cfg.telegram.is_configured());
        assert!(cfg.telegram.enabled);
        assert_eq!(cfg.telegram.parse_mode.as_deref(), Some("Markdown"));
        assert_eq!(cfg.enabled_chains, Chain::ALL.to_vec());
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
        assert!(cfg.rpc_urls.is_empty());
    }

    #[test]
    fn wallet_is_rendered_checksummed() {
        let cfg = config_from(&[(
            "WALLET_ADDRESS",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        )]);

        assert_eq!(
            cfg.wallet_checksum().as_deref(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        );
    }

    #[test]
    fn invalid_wallet_disables_wallet_features() {
        let cfg = config_from(&[("WALLET_ADDRESS", "not-an-address")]);
        assert!(cfg.wallet_checksum().is_none());
    }

    #[test]
    fn blank_values_count_as_absent() {
        let cfg = config_from(&[
            ("COVALENT_API_KEY", "   "),
            ("TELEGRAM_BOT_TOKEN", ""),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);

        assert!(cfg.covalent.api_key.is_none());
        assert!(!cfg.telegram.is_configured());
    }

    #[test]
    fn reads_rpc_urls_chains_and_top_n() {
        let cfg = config_from(&[
            ("BASE_RPC", "https://base.example"),
            ("ZKSYNC_RPC", "https://era.example"),
            ("ENABLED_CHAINS", "base,zksync,tron"),
            ("TOP_N", "3"),
            ("TELEGRAM_PARSE_MODE", "none"),
        ]);

        assert_eq!(cfg.rpc_url(Chain::Base), Some("https://base.example"));
        assert_eq!(cfg.rpc_url(Chain::ZkSync), Some("https://era.example"));
        assert_eq!(cfg.rpc_url(Chain::Ethereum), None);
        assert_eq!(cfg.enabled_chains, vec![Chain::Base, Chain::ZkSync]);
        assert_eq!(cfg.top_n, 3);
        assert!(cfg.telegram.parse_mode.is_none());
    }

    #[test]
    fn bad_top_n_falls_back_to_default() {
        let cfg = config_from(&[("TOP_N", "lots")]);
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn cli_args_override_environment() {
        let cfg = config_from(&[
            ("ENABLED_CHAINS", "ethereum"),
            ("TOP_N", "5"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        assert!(cfg.telegram.is_configured());

        let args = Args {
            top_n: Some(2),
            chains: Some("polygon,bsc".to_string()),
            no_notify: true,
            ..Args::default()
        };
        let cfg = cfg.with_args(&args);

        assert_eq!(cfg.top_n, 2);
        assert_eq!(cfg.enabled_chains, vec![Chain::Polygon, Chain::Bsc]);
        assert!(!cfg.telegram.enabled);
        assert!(cfg.telegram.is_configured());
    }
}
