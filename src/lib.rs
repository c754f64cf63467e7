pub mod client;
pub mod config;
pub mod domain;
pub mod logging;
pub mod notify;
pub mod portfolio;
pub mod report;
pub mod wallet;

#[cfg(test)]
mod testutil;
