use env_logger::Env;
use log::{debug, info, warn};
use std::fmt::Display;

/// Installs `env_logger`; `RUST_LOG` wins over `default_filter`. Returns
/// false when a logger was already installed.
pub fn init_logger(default_filter: &str) -> bool {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .try_init()
        .is_ok()
}

pub fn log_skip(feature: &str, reason: &str) {
    info!("⏭️ Skipping {}: {}", feature, reason);
}

pub fn log_fetch_empty(label: &str, reason: &dyn Display) {
    warn!("⚠️ {} returned nothing: {}", label, reason);
}

pub fn log_send_failed(index: usize, total: usize, reason: &dyn Display) {
    warn!("❌ Chunk {}/{} not delivered: {}", index, total, reason);
}

pub fn log_delivered(chunks: usize) {
    if chunks == 0 {
        debug!("📨 Nothing delivered");
    } else {
        info!("📨 Delivered {} message chunk(s)", chunks);
    }
}
