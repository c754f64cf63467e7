use wallet_tracker::*;

use anyhow::Result;
use clap::Parser;
use client::{CovalentClient, FetchOutcome};
use config::{Args, Chain, Config};
use domain::amount::format_amount;
use log::{info, warn};
use logging::{init_logger, log_fetch_empty, log_skip};
use notify::{deliver, TelegramNotifier};
use report::{collect_sections, render_console_table, render_native_balances, render_report};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_logger("info");

    let args = Args::parse();
    let config = Config::from_env().with_args(&args);

    info!("🚀 Starting wallet tracker");
    info!(
        "🔗 Enabled chains: {}",
        config
            .enabled_chains
            .iter()
            .map(Chain::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let wallet_addr = config.wallet_checksum().unwrap_or_default();

    println!("=== Wallet Tracker Summary ===");
    println!(
        "Wallet: {}",
        if wallet_addr.is_empty() {
            "(not configured)"
        } else {
            wallet_addr.as_str()
        }
    );

    // ===============================
    // NATIVE BALANCES (RPC)
    // ===============================
    let natives = match config.wallet {
        Some(address) => wallet::native_balances(&config, address).await,
        None => {
            log_skip("native balances", "WALLET_ADDRESS not set");
            Vec::new()
        }
    };

    // ===============================
    // TOKEN REPORT (INDEXER)
    // ===============================
    let covalent = CovalentClient::new(&config.covalent)?;
    if !covalent.is_configured() {
        log_skip("token balances", "COVALENT_API_KEY not set");
    }

    let sections =
        collect_sections(&covalent, &wallet_addr, &config.enabled_chains, config.top_n).await;
    let report = render_report(&wallet_addr, &sections);

    println!("\n{}", render_console_table(&sections));
    println!("{}", report);

    // ===============================
    // NOTIFICATION
    // ===============================
    let mut message = report;
    if let Some(native_block) = render_native_balances(&natives) {
        message.push_str("\n\n");
        message.push_str(&native_block);
    }

    if config.telegram.enabled {
        let notifier = TelegramNotifier::from_config(&config.telegram)?;
        deliver(&message, notifier.as_ref()).await;
    } else {
        log_skip("notification", "--no-notify");
    }

    // ===============================
    // RECENT TRANSACTIONS
    // ===============================
    if args.tx_history > 0 {
        print_recent_transactions(&covalent, &args, &wallet_addr).await;
    }

    println!("\nDone.");
    Ok(())
}

async fn print_recent_transactions(covalent: &CovalentClient, args: &Args, wallet: &str) {
    let Some(chain) = Chain::from_name(&args.tx_chain) else {
        warn!("⚠️ Unknown --tx-chain '{}', skipping transactions", args.tx_chain);
        return;
    };

    println!("\n--- Recent transactions ({}) ---", chain);

    match covalent.fetch_transactions(chain, wallet, args.tx_history).await {
        FetchOutcome::Items(txs) if txs.is_empty() => println!("(none)"),
        FetchOutcome::Items(txs) => {
            for tx in txs {
                let when = tx
                    .block_signed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "?".to_string());
                let status = match tx.successful {
                    Some(false) => "  FAILED",
                    _ => "",
                };

                println!(
                    "{}  Tx hash: {}  value: {} {}{}",
                    when,
                    tx.tx_hash,
                    format_amount(&tx.value),
                    chain.native_symbol(),
                    status
                );
            }
        }
        FetchOutcome::Failed(e) => log_fetch_empty("Transaction history", &e),
    }
}
