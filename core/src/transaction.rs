//! Transactions and the fields a caller supplies to create one.

use crate::{
    error::{LedgerError, LedgerResult},
    types::{truncate_chars, Timestamp, TimeKey, TransactionId, CHANNEL_CAPACITY, TIME_KEY_SCALE},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Direction of funds relative to the customer's account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Debit,  // funds leave the account
    Credit, // funds arrive
}

impl TransactionKind {
    pub fn code(&self) -> char {
        match self {
            Self::Debit  => 'D',
            Self::Credit => 'C',
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "debit"  => Ok(Self::Debit),
            "c" | "credit" => Ok(Self::Credit),
            other => Err(LedgerError::InvalidInput(format!(
                "transaction type must be D or C, got '{other}'"
            ))),
        }
    }
}

/// Caller-supplied transaction fields. The ledger adds the timestamp
/// and time key when the draft is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDraft {
    pub id:              TransactionId,
    pub kind:            TransactionKind,
    pub amount:          f64,
    pub counterparty_id: i64,
    pub channel:         String,
    pub terminal_id:     i64,
}

impl TransactionDraft {
    pub fn debit(id: TransactionId, amount: f64) -> Self {
        Self::new(id, TransactionKind::Debit, amount)
    }

    pub fn credit(id: TransactionId, amount: f64) -> Self {
        Self::new(id, TransactionKind::Credit, amount)
    }

    pub fn new(id: TransactionId, kind: TransactionKind, amount: f64) -> Self {
        Self {
            id,
            kind,
            amount,
            counterparty_id: 0,
            channel: String::from("WEB"),
            terminal_id: 0,
        }
    }

    pub fn with_counterparty(mut self, counterparty_id: i64) -> Self {
        self.counterparty_id = counterparty_id;
        self
    }

    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channel = channel.to_string();
        self
    }

    pub fn with_terminal(mut self, terminal_id: i64) -> Self {
        self.terminal_id = terminal_id;
        self
    }

    /// Fix the draft in time. `tiebreak` is reduced into `[0, TIME_KEY_SCALE)`.
    ///
    /// Fails with `TimestampOutOfRange` when `date_time * TIME_KEY_SCALE`
    /// does not fit an i64, i.e. |date_time| beyond roughly 9.2e12 seconds.
    pub fn stamp(self, date_time: Timestamp, tiebreak: i64) -> LedgerResult<Transaction> {
        let time_key = date_time
            .checked_mul(TIME_KEY_SCALE)
            .and_then(|k| k.checked_add(tiebreak.rem_euclid(TIME_KEY_SCALE)))
            .ok_or(LedgerError::TimestampOutOfRange { date_time })?;
        Ok(Transaction {
            id:              self.id,
            time_key,
            date_time,
            kind:            self.kind,
            amount:          self.amount,
            counterparty_id: self.counterparty_id,
            channel:         truncate_chars(&self.channel, CHANNEL_CAPACITY),
            terminal_id:     self.terminal_id,
        })
    }
}

/// A recorded transaction. Immutable: the only constructor is
/// `TransactionDraft::stamp`, which keeps `time_key` consistent with `date_time`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Transaction {
    id:              TransactionId,
    time_key:        TimeKey,
    date_time:       Timestamp,
    kind:            TransactionKind,
    amount:          f64,
    counterparty_id: i64,
    channel:         String,
    terminal_id:     i64,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn time_key(&self) -> TimeKey {
        self.time_key
    }

    pub fn date_time(&self) -> Timestamp {
        self.date_time
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn counterparty_id(&self) -> i64 {
        self.counterparty_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn terminal_id(&self) -> i64 {
        self.terminal_id
    }

    pub fn is_debit(&self) -> bool {
        self.kind == TransactionKind::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.kind == TransactionKind::Credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_key_orders_like_date_time() {
        let early = TransactionDraft::debit(1, 10.0).stamp(100, TIME_KEY_SCALE - 1).unwrap();
        let late = TransactionDraft::debit(2, 10.0).stamp(101, 0).unwrap();
        assert!(early.time_key() < late.time_key());
        assert_eq!(early.time_key(), 100 * TIME_KEY_SCALE + TIME_KEY_SCALE - 1);
    }

    #[test]
    fn out_of_range_tiebreak_is_reduced() {
        let txn = TransactionDraft::credit(1, 1.0).stamp(5, TIME_KEY_SCALE + 3).unwrap();
        assert_eq!(txn.time_key(), 5 * TIME_KEY_SCALE + 3);
        let txn = TransactionDraft::credit(1, 1.0).stamp(5, -1).unwrap();
        assert_eq!(txn.time_key(), 5 * TIME_KEY_SCALE + TIME_KEY_SCALE - 1);
    }

    #[test]
    fn channel_keeps_nine_characters() {
        let txn = TransactionDraft::debit(1, 1.0)
            .with_channel("MOBILEBANKING")
            .stamp(0, 0)
            .unwrap();
        assert_eq!(txn.channel(), "MOBILEBAN");
    }

    #[test]
    fn kind_parses_codes_and_words() {
        assert_eq!("D".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
        assert_eq!(" c ".parse::<TransactionKind>().unwrap(), TransactionKind::Credit);
        assert_eq!("Credit".parse::<TransactionKind>().unwrap(), TransactionKind::Credit);
        assert!(matches!(
            "X".parse::<TransactionKind>(),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn stamp_rejects_timestamps_past_key_range() {
        let max_secs = i64::MAX / TIME_KEY_SCALE;
        let edge = TransactionDraft::debit(1, 1.0).stamp(max_secs, 0).unwrap();
        assert_eq!(edge.time_key(), max_secs * TIME_KEY_SCALE);

        let err = TransactionDraft::debit(2, 1.0)
            .stamp(10_000_000_000_000, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TimestampOutOfRange { date_time: 10_000_000_000_000 }
        ));
        assert!(TransactionDraft::debit(3, 1.0).stamp(i64::MIN, 0).is_err());
    }
}
