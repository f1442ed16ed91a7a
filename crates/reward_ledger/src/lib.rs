//! Off-chain reward ledger
//!
//! Accrues rewards for devices that submit signed telemetry and turns the
//! accrued balance into oracle-signed claim vouchers that the
//! `reward_distributor` program redeems for tokens.

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod oracle;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod voucher;

pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::RewardLedger;
pub use oracle::OracleSigner;
pub use store::{DeviceRecord, DeviceUpdate, LedgerEntry, LedgerStore, MemoryStore, SqliteStore};
pub use voucher::ClaimVoucher;
