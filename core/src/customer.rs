use crate::{
    error::{LedgerError, LedgerResult},
    transaction::{Transaction, TransactionDraft},
    transaction_index::{Iter, TransactionIndex},
    types::{truncate_chars, CustomerId, Timestamp, CUSTOMER_NAME_CAPACITY},
};

/// A bank customer and the index of everything they have transacted.
#[derive(Debug, Clone)]
pub struct Customer {
    id:               CustomerId,
    name:             String,
    debit_threshold:  f64,
    credit_threshold: f64,
    index:            TransactionIndex,
}

impl Customer {
    /// Names longer than CUSTOMER_NAME_CAPACITY characters are cut.
    pub fn new(id: CustomerId, name: &str, debit_threshold: f64, credit_threshold: f64) -> Self {
        Self {
            id,
            name: truncate_chars(name, CUSTOMER_NAME_CAPACITY),
            debit_threshold,
            credit_threshold,
            index: TransactionIndex::new(),
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debit_threshold(&self) -> f64 {
        self.debit_threshold
    }

    pub fn credit_threshold(&self) -> f64 {
        self.credit_threshold
    }

    pub fn transactions(&self) -> &TransactionIndex {
        &self.index
    }

    pub fn transaction_count(&self) -> usize {
        self.index.len()
    }

    /// Stamp `draft` and insert it, unless its id is already recorded.
    /// On rejection the index is untouched.
    pub fn add_transaction(
        &mut self,
        draft: TransactionDraft,
        date_time: Timestamp,
        tiebreak: i64,
    ) -> LedgerResult<Transaction> {
        if self.index.contains_id(draft.id) {
            log::warn!(
                "customer={} rejected duplicate transaction id {}",
                self.id,
                draft.id
            );
            return Err(LedgerError::DuplicateTransactionId {
                customer_id:    self.id,
                transaction_id: draft.id,
            });
        }

        let txn = draft.stamp(date_time, tiebreak)?;
        log::debug!(
            "customer={} txn={} {} {:.2} key={}",
            self.id,
            txn.id(),
            txn.kind(),
            txn.amount(),
            txn.time_key()
        );
        self.index.insert(txn.clone());
        Ok(txn)
    }

    /// Transactions in ascending time-key order. Lazy; call again to restart.
    pub fn history(&self) -> Iter<'_> {
        self.index.iter()
    }
}
