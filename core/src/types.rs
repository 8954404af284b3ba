//! Shared primitive types and fixed constants used across the ledger.

/// Numeric customer identifier. Unique across the directory.
pub type CustomerId = i64;

/// Numeric transaction identifier. Unique within one customer's index.
pub type TransactionId = i64;

/// Wall-clock seconds since the Unix epoch.
pub type Timestamp = i64;

/// Primary ordering key of the transaction index.
/// `date_time * TIME_KEY_SCALE + tiebreak`.
pub type TimeKey = i64;

/// Sub-second resolution of a time key. Tiebreaks live in `[0, TIME_KEY_SCALE)`.
pub const TIME_KEY_SCALE: i64 = 1_000_000;

/// Usable characters in a channel label.
pub const CHANNEL_CAPACITY: usize = 9;

/// Usable characters in a customer name.
pub const CUSTOMER_NAME_CAPACITY: usize = 49;

/// Keep at most `capacity` characters of `s`, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, capacity: usize) -> String {
    s.chars().take(capacity).collect()
}
