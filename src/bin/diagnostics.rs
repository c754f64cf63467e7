use anyhow::Result;
use colored::Colorize;
use ethers::providers::Middleware;
use reqwest::Client;
use serde_json::Value;
use wallet_tracker::client::CovalentClient;
use wallet_tracker::config::{Chain, Config, TELEGRAM_TIMEOUT};
use wallet_tracker::logging::init_logger;
use wallet_tracker::wallet::chain_provider;

// ==================================================
// DIAGNOSTICS STRUCTURE
// ==================================================
struct Diagnostic {
    name: String,
    status: DiagStatus,
    message: String,
}

enum DiagStatus {
    Pass,
    Warn,
    Fail,
}

impl DiagStatus {
    fn icon(&self) -> &str {
        match self {
            DiagStatus::Pass => "✅",
            DiagStatus::Warn => "⚠️ ",
            DiagStatus::Fail => "❌",
        }
    }
}

impl Diagnostic {
    fn new(name: impl Into<String>, status: DiagStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }
}

// ==================================================
// MAIN DIAGNOSTICS RUNNER
// ==================================================
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_logger("warn");

    print_header();

    let config = Config::from_env();
    let mut results = Vec::new();
    let total_tests = 4;

    print_test(1, total_tests, "Checking environment configuration");
    results.push(check_env(&config));

    print_test(2, total_tests, "Checking RPC endpoints");
    for &chain in &config.enabled_chains {
        results.push(check_rpc(&config, chain).await);
    }

    print_test(3, total_tests, "Testing Covalent API");
    results.push(check_covalent(&config).await?);

    print_test(4, total_tests, "Testing Telegram bot");
    results.push(check_telegram(&config).await);

    print_results(&results);

    Ok(())
}

// ==================================================
// INDIVIDUAL TEST FUNCTIONS
// ==================================================

fn check_env(config: &Config) -> Diagnostic {
    let mut missing = Vec::new();
    if config.wallet.is_none() {
        missing.push("WALLET_ADDRESS");
    }
    if config.covalent.api_key.is_none() {
        missing.push("COVALENT_API_KEY");
    }
    if !config.telegram.is_configured() {
        missing.push("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID");
    }

    let chains = config
        .enabled_chains
        .iter()
        .map(Chain::display_name)
        .collect::<Vec<_>>()
        .join(", ");

    if config.wallet.is_none() {
        Diagnostic::new(
            "Environment Variables",
            DiagStatus::Fail,
            "WALLET_ADDRESS missing or not a valid address",
        )
    } else if missing.is_empty() {
        Diagnostic::new(
            "Environment Variables",
            DiagStatus::Pass,
            format!(
                "Wallet: {}\nChains: {}\nTop N: {}",
                config.wallet_checksum().unwrap_or_default(),
                chains,
                config.top_n
            ),
        )
    } else {
        Diagnostic::new(
            "Environment Variables",
            DiagStatus::Warn,
            format!("Missing: {}\nChains: {}", missing.join(", "), chains),
        )
    }
}

async fn check_rpc(config: &Config, chain: Chain) -> Diagnostic {
    let name = format!("RPC {}", chain.display_name());

    let Some(provider) = chain_provider(config, chain) else {
        return Diagnostic::new(
            name,
            DiagStatus::Warn,
            format!("{} not set, native balance skipped", chain.rpc_env_key()),
        );
    };

    match provider.get_chainid().await {
        Ok(id) if id.as_u64() == chain.id() => match provider.get_block_number().await {
            Ok(block) => Diagnostic::new(
                name,
                DiagStatus::Pass,
                format!("Connected (chain ID: {}, block: {})", id, block),
            ),
            Err(e) => Diagnostic::new(name, DiagStatus::Warn, format!("Block query failed: {}", e)),
        },
        Ok(id) => Diagnostic::new(
            name,
            DiagStatus::Fail,
            format!("Wrong chain! Expected {}, got {}", chain.id(), id),
        ),
        Err(e) => Diagnostic::new(name, DiagStatus::Fail, format!("Failed: {}", e)),
    }
}

async fn check_covalent(config: &Config) -> Result<Diagnostic> {
    let client = CovalentClient::new(&config.covalent)?;
    let wallet = config.wallet_checksum().unwrap_or_default();

    let Some(&chain) = config.enabled_chains.first() else {
        return Ok(Diagnostic::new(
            "Covalent API",
            DiagStatus::Warn,
            "No chains enabled",
        ));
    };

    let diag = match client.fetch_balance_items(chain, &wallet).await {
        Ok(items) => Diagnostic::new(
            "Covalent API",
            DiagStatus::Pass,
            format!("{} balance item(s) on {}", items.len(), chain.display_name()),
        ),
        Err(e) => Diagnostic::new("Covalent API", DiagStatus::Fail, e.to_string()),
    };

    Ok(diag)
}

async fn check_telegram(config: &Config) -> Diagnostic {
    let Some(token) = config.telegram.bot_token.as_deref() else {
        return Diagnostic::new(
            "Telegram Bot",
            DiagStatus::Warn,
            "TELEGRAM_BOT_TOKEN not set, notifications disabled",
        );
    };

    let client = match Client::builder().timeout(TELEGRAM_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => return Diagnostic::new("Telegram Bot", DiagStatus::Fail, e.to_string()),
    };

    let url = format!(
        "{}/bot{}/getMe",
        config.telegram.api_url.trim_end_matches('/'),
        token
    );

    let body: Value = match client.get(&url).send().await {
        Ok(resp) => resp.json().await.unwrap_or(Value::Null),
        Err(e) => {
            return Diagnostic::new(
                "Telegram Bot",
                DiagStatus::Fail,
                format!("Request failed: {}", e.without_url()),
            )
        }
    };

    if body.get("ok") != Some(&Value::Bool(true)) {
        let description = body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description");
        return Diagnostic::new(
            "Telegram Bot",
            DiagStatus::Fail,
            format!("getMe rejected: {}", description),
        );
    }

    let username = body["result"]["username"].as_str().unwrap_or("?");
    match config.telegram.chat_id.as_deref() {
        Some(chat) => Diagnostic::new(
            "Telegram Bot",
            DiagStatus::Pass,
            format!("Bot @{} ready\nChat ID: {}", username, chat),
        ),
        None => Diagnostic::new(
            "Telegram Bot",
            DiagStatus::Warn,
            format!("Bot @{} ready but TELEGRAM_CHAT_ID not set", username),
        ),
    }
}

// ==================================================
// OUTPUT
// ==================================================

fn print_header() {
    println!("\n╔════════════════════════════════════════════════╗");
    println!("║   WALLET TRACKER - DIAGNOSTICS                 ║");
    println!("╚════════════════════════════════════════════════╝\n");
}

fn print_test(num: usize, total: usize, description: &str) {
    println!("[{}/{}] {}...", num, total, description);
}

fn print_results(results: &[Diagnostic]) {
    println!();

    let mut passed = 0;
    let mut warned = 0;
    let mut failed = 0;

    for diag in results {
        match diag.status {
            DiagStatus::Pass => passed += 1,
            DiagStatus::Warn => warned += 1,
            DiagStatus::Fail => failed += 1,
        }

        println!("{} {}", diag.status.icon(), diag.name.bold());
        for line in diag.message.lines() {
            println!("   {}", line);
        }
    }

    println!("\n╔════════════════════════════════════════════════╗");
    println!("║           DIAGNOSTICS SUMMARY                  ║");
    println!("╚════════════════════════════════════════════════╝");
    println!("\n✅ Passed:   {}", passed.to_string().green());
    println!("⚠️  Warnings: {}", warned.to_string().yellow());
    println!("❌ Failed:   {}", failed.to_string().red());

    if failed == 0 {
        println!("\n{}", "✅ Tracker is ready to run.".green().bold());
    } else {
        println!(
            "\n{}",
            "❌ Fix the failures above before running the tracker.".red().bold()
        );
    }
    println!();
}
