//! ledger-core: an in-memory transaction store and fraud analyzer.
//!
//! Customers live in a chained hash directory. Each customer owns a
//! B-tree of transactions ordered by time key. The analyzer runs
//! velocity and high-value checks over one customer's history.

pub mod clock;
pub mod config;
pub mod customer;
pub mod customer_directory;
pub mod error;
pub mod fraud_analyzer;
pub mod ledger;
pub mod rng;
pub mod transaction;
pub mod transaction_index;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
