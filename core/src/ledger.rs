//! The ledger: the single root handle of the store.
//!
//! Owns the customer directory, the clock, the tiebreaker source and the
//! analyzer settings. Every public operation goes through here:
//!   - add_customer / get_customer
//!   - add_transaction / history
//!   - analyze / analyze_at
//!
//! RULES:
//!   - Customer ids are unique. Duplicates are rejected before the
//!     directory sees them.
//!   - Transaction ids are unique per customer. Duplicates are rejected
//!     before the index sees them.
//!   - Timestamps come from the clock, tiebreaks from the tiebreaker.

use crate::{
    clock::{Clock, SystemClock},
    config::LedgerConfig,
    customer::Customer,
    customer_directory::CustomerDirectory,
    error::{LedgerError, LedgerResult},
    fraud_analyzer::{FraudAnalyzer, FraudReport},
    rng::{SeededTiebreaker, Tiebreaker},
    transaction::{Transaction, TransactionDraft},
    transaction_index::Iter,
    types::{CustomerId, Timestamp},
};

pub struct Ledger {
    directory:      CustomerDirectory,
    clock:          Box<dyn Clock>,
    tiebreaker:     Box<dyn Tiebreaker>,
    analyzer:       FraudAnalyzer,
    incident_count: u64,
}

impl Ledger {
    pub fn new(config: LedgerConfig, clock: Box<dyn Clock>, tiebreaker: Box<dyn Tiebreaker>) -> Self {
        Self {
            directory: CustomerDirectory::new(config.bucket_count),
            clock,
            tiebreaker,
            analyzer: FraudAnalyzer::new(config.analyzer),
            incident_count: 0,
        }
    }

    /// Default config, the real UTC clock and tiebreaks seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            LedgerConfig::default(),
            Box::new(SystemClock),
            Box::new(SeededTiebreaker::new(seed)),
        )
    }

    pub fn directory(&self) -> &CustomerDirectory {
        &self.directory
    }

    pub fn analyzer(&self) -> &FraudAnalyzer {
        &self.analyzer
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Critical velocity findings seen so far.
    pub fn incident_count(&self) -> u64 {
        self.incident_count
    }

    pub fn customer_count(&self) -> usize {
        self.directory.len()
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> + '_ {
        self.directory.iter()
    }

    // ── Customers ─────────────────────────────────────────────────

    pub fn add_customer(
        &mut self,
        id: CustomerId,
        name: &str,
        debit_threshold: f64,
        credit_threshold: f64,
    ) -> LedgerResult<&Customer> {
        if let Some(existing) = self.directory.find(id) {
            log::warn!(
                "add_customer: id {id} already taken by '{}'",
                existing.name()
            );
            return Err(LedgerError::DuplicateCustomer { id });
        }

        let customer: &Customer = self
            .directory
            .insert(Customer::new(id, name, debit_threshold, credit_threshold));
        log::info!(
            "customer={id} '{}' added (debit>{:.2}, credit>{:.2})",
            customer.name(),
            debit_threshold,
            credit_threshold
        );
        Ok(customer)
    }

    pub fn get_customer(&self, id: CustomerId) -> Option<&Customer> {
        self.directory.find(id)
    }

    fn require_customer(&self, id: CustomerId) -> LedgerResult<&Customer> {
        self.directory
            .find(id)
            .ok_or(LedgerError::CustomerNotFound { id })
    }

    // ── Transactions ──────────────────────────────────────────────

    /// Record `draft` for a customer at the clock's current time.
    pub fn add_transaction(
        &mut self,
        customer_id: CustomerId,
        draft: TransactionDraft,
    ) -> LedgerResult<Transaction> {
        let now = self.clock.now();
        let customer = self
            .directory
            .find_mut(customer_id)
            .ok_or(LedgerError::CustomerNotFound { id: customer_id })?;
        let tiebreak = self.tiebreaker.next_tiebreak();
        customer.add_transaction(draft, now, tiebreak)
    }

    /// A customer's transactions in ascending time-key order.
    pub fn history(&self, customer_id: CustomerId) -> LedgerResult<Iter<'_>> {
        Ok(self.require_customer(customer_id)?.history())
    }

    // ── Analysis ──────────────────────────────────────────────────

    /// Analyze a customer as of the clock's current time.
    pub fn analyze(&mut self, customer_id: CustomerId) -> LedgerResult<FraudReport> {
        let now = self.clock.now();
        self.analyze_at(customer_id, now)
    }

    pub fn analyze_at(&mut self, customer_id: CustomerId, now: Timestamp) -> LedgerResult<FraudReport> {
        let report = self
            .analyzer
            .analyze(self.require_customer(customer_id)?, now);
        if report.is_incident() {
            self.incident_count += 1;
        }
        Ok(report)
    }

    /// Analyze every customer, bucket by bucket.
    pub fn analyze_all(&mut self) -> Vec<FraudReport> {
        let now = self.clock.now();
        let reports: Vec<FraudReport> = self
            .directory
            .iter()
            .map(|c| self.analyzer.analyze(c, now))
            .collect();
        self.incident_count += reports.iter().filter(|r| r.is_incident()).count() as u64;
        reports
    }

    /// Release every customer. Returns how many were released.
    pub fn teardown(self) -> usize {
        self.directory.teardown()
    }
}
