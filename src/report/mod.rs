use crate::client::{FetchError, FetchOutcome};
use crate::config::Chain;
use crate::domain::amount::{format_amount, format_fiat};
use crate::domain::{ChainSection, NativeBalance, TokenHolding};
use crate::logging::log_fetch_empty;
use crate::portfolio::HoldingsSource;
use log::debug;
use rust_decimal::Decimal;

pub const NO_HOLDINGS_MESSAGE: &str = "No token holdings detected on the enabled chains.";

// ==================================================
// RENDERING
// ==================================================

pub fn banner(wallet: &str) -> String {
    format!("📊 *Wallet token report*\n`{}`", wallet)
}

/// Backslash-escapes the characters legacy Telegram Markdown treats as
/// markup. Indexer symbols are arbitrary text.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `• *USDC*: 1500 ($1500.00)`; the fiat part only when the value is known.
pub fn holding_line(holding: &TokenHolding) -> String {
    let mut line = format!(
        "• *{}*: {}",
        escape_markdown(&holding.symbol),
        format_amount(&holding.normalized_amount)
    );

    if holding.fiat_value > Decimal::ZERO {
        line.push_str(&format!(" (${})", format_fiat(holding.fiat_value)));
    }

    line
}

pub fn render_section(section: &ChainSection) -> String {
    let mut lines = vec![format!("*{}*", section.chain.display_name())];
    lines.extend(section.holdings.iter().map(holding_line));
    lines.join("\n")
}

/// Banner plus one block per section, blank-line separated. With no sections
/// the result is exactly [`NO_HOLDINGS_MESSAGE`].
pub fn render_report(wallet: &str, sections: &[ChainSection]) -> String {
    if sections.is_empty() {
        return NO_HOLDINGS_MESSAGE.to_string();
    }

    let mut blocks = vec![banner(wallet)];
    blocks.extend(sections.iter().map(render_section));
    blocks.join("\n\n")
}

pub fn render_native_balances(balances: &[NativeBalance]) -> Option<String> {
    if balances.is_empty() {
        return None;
    }

    let mut lines = vec!["*Native balances*".to_string()];
    lines.extend(balances.iter().map(|b| {
        format!(
            "• {}: {} {}",
            b.chain.display_name(),
            format_amount(&b.amount),
            b.chain.native_symbol()
        )
    }));
    Some(lines.join("\n"))
}

/// Console listing with contract names and addresses, one block per chain.
pub fn render_console_table(sections: &[ChainSection]) -> String {
    let mut out = String::new();

    for section in sections {
        out.push_str(&format!("--- {} ---\n", section.chain.display_name()));
        for h in &section.holdings {
            out.push_str(&format!(
                "{:10} {:>20} {:>14}  {}  contract: {}\n",
                h.symbol,
                format_amount(&h.normalized_amount),
                format!("${}", format_fiat(h.fiat_value)),
                h.contract_name.as_deref().unwrap_or("-"),
                h.contract_address.as_deref().unwrap_or("-")
            ));
        }
    }

    out
}

// ==================================================
// BUILDING
// ==================================================

/// Fetches every chain in order, one at a time. Chains without holdings,
/// including failed fetches, produce no section.
pub async fn collect_sections<S: HoldingsSource + ?Sized>(
    source: &S,
    wallet: &str,
    chains: &[Chain],
    top_n: usize,
) -> Vec<ChainSection> {
    let mut sections = Vec::new();

    for &chain in chains {
        match source.fetch_top_tokens(chain, wallet, top_n).await {
            FetchOutcome::Items(holdings) if !holdings.is_empty() => {
                sections.push(ChainSection { chain, holdings });
            }
            FetchOutcome::Items(_) => debug!("{}: no qualifying holdings", chain),
            FetchOutcome::Failed(e @ FetchError::NotConfigured(_)) => {
                debug!("{}: skipped, {}", chain, e)
            }
            FetchOutcome::Failed(e) => log_fetch_empty(chain.display_name(), &e),
        }
    }

    sections
}

pub async fn build_report<S: HoldingsSource + ?Sized>(
    source: &S,
    wallet: &str,
    chains: &[Chain],
    top_n: usize,
) -> String {
    let sections = collect_sections(source, wallet, chains, top_n).await;
    render_report(wallet, &sections)
}
