//! Fraud analyzer: stateless checks over one customer's history.
//!
//! Each analysis runs three checks:
//!   1. Velocity: transactions inside the lookback window before `now`
//!   2. High-value debits above the customer's debit threshold
//!   3. High-value credits above the customer's credit threshold
//!
//! RULE: one `count_since` and one in-order pass per analysis.
//! Checks 2 and 3 share the pass. The customer is never mutated.

use crate::{
    config::AnalyzerConfig,
    customer::Customer,
    transaction::{Transaction, TransactionKind},
    types::{CustomerId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VelocityLevel {
    Normal,
    Warning,  // elevated velocity
    Critical, // hard limit exceeded
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VelocityFinding {
    pub count: usize,
    pub level: VelocityLevel,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FraudReport {
    pub customer_id:   CustomerId,
    pub analyzed_at:   Timestamp,
    pub velocity:      VelocityFinding,
    pub debit_alerts:  Vec<Transaction>,
    pub credit_alerts: Vec<Transaction>,
}

impl FraudReport {
    /// A critical velocity finding counts as an incident.
    pub fn is_incident(&self) -> bool {
        self.velocity.level == VelocityLevel::Critical
    }

    pub fn alert_count(&self) -> usize {
        self.debit_alerts.len() + self.credit_alerts.len()
    }

    /// Nothing to report: normal velocity and no high-value alerts.
    pub fn is_clean(&self) -> bool {
        self.velocity.level == VelocityLevel::Normal && self.alert_count() == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FraudAnalyzer {
    config: AnalyzerConfig,
}

impl FraudAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn classify_velocity(&self, count: usize) -> VelocityLevel {
        if count >= self.config.velocity_critical {
            VelocityLevel::Critical
        } else if count >= self.config.velocity_warning {
            VelocityLevel::Warning
        } else {
            VelocityLevel::Normal
        }
    }

    pub fn analyze(&self, customer: &Customer, now: Timestamp) -> FraudReport {
        let mut report = FraudReport {
            customer_id:   customer.id(),
            analyzed_at:   now,
            velocity:      VelocityFinding { count: 0, level: VelocityLevel::Normal },
            debit_alerts:  Vec::new(),
            credit_alerts: Vec::new(),
        };

        let index = customer.transactions();
        if index.is_empty() {
            return report;
        }

        let cutoff = now.saturating_sub(self.config.velocity_window_secs);
        let count = index.count_since(cutoff);
        report.velocity = VelocityFinding {
            count,
            level: self.classify_velocity(count),
        };

        let debit_threshold = customer.debit_threshold();
        let credit_threshold = customer.credit_threshold();
        index.in_order(|txn| match txn.kind() {
            TransactionKind::Debit if txn.amount() > debit_threshold => {
                report.debit_alerts.push(txn.clone());
            }
            TransactionKind::Credit if txn.amount() > credit_threshold => {
                report.credit_alerts.push(txn.clone());
            }
            _ => {}
        });

        log::info!(
            "customer={} analysis: velocity={} ({:?}), debit_alerts={}, credit_alerts={}",
            customer.id(),
            count,
            report.velocity.level,
            report.debit_alerts.len(),
            report.credit_alerts.len()
        );
        if report.is_incident() {
            log::warn!(
                "customer={} velocity critical: {} transactions in {}s",
                customer.id(),
                count,
                self.config.velocity_window_secs
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_boundaries() {
        let fa = FraudAnalyzer::default();
        assert_eq!(fa.classify_velocity(0), VelocityLevel::Normal);
        assert_eq!(fa.classify_velocity(14), VelocityLevel::Normal);
        assert_eq!(fa.classify_velocity(15), VelocityLevel::Warning);
        assert_eq!(fa.classify_velocity(24), VelocityLevel::Warning);
        assert_eq!(fa.classify_velocity(25), VelocityLevel::Critical);
        assert_eq!(fa.classify_velocity(1_000), VelocityLevel::Critical);
    }

    #[test]
    fn custom_thresholds_apply() {
        let fa = FraudAnalyzer::new(AnalyzerConfig {
            velocity_window_secs: 60,
            velocity_warning:     2,
            velocity_critical:    3,
        });
        assert_eq!(fa.config().velocity_window_secs, 60);
        assert_eq!(fa.classify_velocity(2), VelocityLevel::Warning);
        assert_eq!(fa.classify_velocity(3), VelocityLevel::Critical);
    }

    #[test]
    fn window_start_saturates_near_min_timestamp() {
        let mut c = Customer::new(9, "Early", 10.0, 10.0);
        c.add_transaction(crate::transaction::TransactionDraft::debit(1, 1.0), 0, 0)
            .unwrap();
        let report = FraudAnalyzer::default().analyze(&c, i64::MIN + 5);
        assert_eq!(report.velocity.count, 1);
        assert_eq!(report.analyzed_at, i64::MIN + 5);
    }

    #[test]
    fn empty_customer_reports_clean() {
        let c = Customer::new(9, "Empty", 10.0, 10.0);
        let report = FraudAnalyzer::default().analyze(&c, 1_000_000);
        assert_eq!(report.velocity, VelocityFinding { count: 0, level: VelocityLevel::Normal });
        assert!(report.debit_alerts.is_empty());
        assert!(report.credit_alerts.is_empty());
        assert!(report.is_clean());
        assert!(!report.is_incident());
    }

    #[test]
    fn report_serializes_levels_in_snake_case() {
        let c = Customer::new(9, "Empty", 10.0, 10.0);
        let report = FraudAnalyzer::default().analyze(&c, 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["velocity"]["level"], "normal");
        assert_eq!(json["customer_id"], 9);
    }
}
