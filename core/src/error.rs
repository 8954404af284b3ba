use crate::types::{CustomerId, Timestamp, TransactionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Customer {id} already exists")]
    DuplicateCustomer { id: CustomerId },

    #[error("Transaction {transaction_id} already recorded for customer {customer_id}")]
    DuplicateTransactionId {
        customer_id:    CustomerId,
        transaction_id: TransactionId,
    },

    #[error("Customer {id} not found")]
    CustomerNotFound { id: CustomerId },

    #[error("Timestamp {date_time} is outside the supported range")]
    TimestampOutOfRange { date_time: Timestamp },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
