//! Zakat donation ledger: entry, storage, periodic reports, exports and receipts.

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod operations;
