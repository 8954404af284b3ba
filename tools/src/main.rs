//! ledger-runner: headless driver for the transaction ledger.
//!
//! Usage:
//!   ledger-runner --seed 12345
//!   ledger-runner --seed 12345 --config ledger.json --ipc-mode

use anyhow::Result;
use ledger_core::{
    clock::SystemClock,
    config::LedgerConfig,
    fraud_analyzer::{FraudReport, VelocityLevel},
    rng::SeededTiebreaker,
    transaction::{Transaction, TransactionDraft, TransactionKind},
    types::{CustomerId, Timestamp, TransactionId},
    Ledger, LedgerError,
};
use serde_json::json;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    AddCustomer {
        id: CustomerId,
        name: String,
        debit_threshold: f64,
        #[serde(default)]
        credit_threshold: Option<f64>,
    },
    AddTransaction {
        customer_id: CustomerId,
        id: TransactionId,
        kind: String,
        amount: f64,
        #[serde(default)]
        counterparty_id: i64,
        #[serde(default = "default_channel")]
        channel: String,
        #[serde(default)]
        terminal_id: i64,
    },
    History {
        customer_id: CustomerId,
    },
    Analyze {
        customer_id: CustomerId,
    },
    Summary,
    Quit,
}

fn default_channel() -> String {
    "WEB".to_string()
}

#[derive(serde::Serialize)]
struct HistoryEntry<'a> {
    #[serde(flatten)]
    txn: &'a Transaction,
    when: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let mut ledger = match args.windows(2).find(|w| w[0] == "--config") {
        Some(w) => Ledger::new(
            LedgerConfig::load(&w[1])?,
            Box::new(SystemClock),
            Box::new(SeededTiebreaker::new(seed)),
        ),
        None => Ledger::with_seed(seed),
    };

    if ipc_mode {
        let stdin = io::stdin();
        run_ipc_loop(&mut ledger, stdin.lock(), io::stdout())?;
    } else {
        print_header(&ledger, seed);
        load_demo_book(&mut ledger)?;
        run_demo(&mut ledger)?;
    }

    let released = ledger.teardown();
    log::info!("released {released} customers");
    Ok(())
}

fn print_header(ledger: &Ledger, seed: u64) {
    let analyzer = ledger.analyzer().config();
    println!("ledger-runner");
    println!("  seed:      {seed}");
    println!("  started:   {}", format_timestamp(ledger.now()));
    println!("  buckets:   {}", ledger.directory().bucket_count());
    println!(
        "  velocity:  warn>={} crit>={} in {}s",
        analyzer.velocity_warning, analyzer.velocity_critical, analyzer.velocity_window_secs
    );
    println!();
}

/// One JSON command per input line, one JSON reply per output line.
/// Bad lines get an `{"error": ...}` reply and the loop carries on.
fn run_ipc_loop<R: BufRead, W: Write>(ledger: &mut Ledger, mut input: R, mut output: W) -> Result<()> {
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = input.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(output, "{}", json!({ "error": e.to_string() }))?;
                output.flush()?;
                continue;
            }
        };

        if let IpcCommand::Quit = cmd {
            break;
        }

        let response = match handle_command(ledger, cmd) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("command rejected: {e}");
                json!({ "error": e.to_string() })
            }
        };
        writeln!(output, "{response}")?;
        output.flush()?;
    }
    Ok(())
}

fn handle_command(ledger: &mut Ledger, cmd: IpcCommand) -> Result<serde_json::Value, LedgerError> {
    match cmd {
        IpcCommand::AddCustomer { id, name, debit_threshold, credit_threshold } => {
            let credit_threshold = credit_threshold.unwrap_or(debit_threshold);
            if debit_threshold < 0.0 || credit_threshold < 0.0 {
                return Err(LedgerError::InvalidInput(
                    "thresholds must be non-negative".to_string(),
                ));
            }
            let stored_name = ledger
                .add_customer(id, &name, debit_threshold, credit_threshold)?
                .name()
                .to_string();
            Ok(json!({
                "customer_id": id,
                "name": stored_name,
                "bucket": ledger.directory().bucket_of(id),
            }))
        }
        IpcCommand::AddTransaction {
            customer_id,
            id,
            kind,
            amount,
            counterparty_id,
            channel,
            terminal_id,
        } => {
            let kind: TransactionKind = kind.parse()?;
            if amount.is_nan() || amount < 0.0 {
                return Err(LedgerError::InvalidInput(format!(
                    "amount must be non-negative, got {amount}"
                )));
            }
            let draft = TransactionDraft::new(id, kind, amount)
                .with_counterparty(counterparty_id)
                .with_channel(&channel)
                .with_terminal(terminal_id);
            let txn = ledger.add_transaction(customer_id, draft)?;
            Ok(serde_json::to_value(&txn)?)
        }
        IpcCommand::History { customer_id } => {
            let entries: Vec<HistoryEntry> = ledger
                .history(customer_id)?
                .map(|txn| HistoryEntry { txn, when: format_timestamp(txn.date_time()) })
                .collect();
            Ok(json!({ "customer_id": customer_id, "transactions": entries }))
        }
        IpcCommand::Analyze { customer_id } => {
            let report = ledger.analyze(customer_id)?;
            Ok(serde_json::to_value(&report)?)
        }
        IpcCommand::Summary => Ok(json!({
            "customers": ledger.customer_count(),
            "incidents": ledger.incident_count(),
        })),
        IpcCommand::Quit => Ok(serde_json::Value::Null),
    }
}

/// Three customers: one ordinary, one idle, one with a suspicious ATM run.
fn load_demo_book(ledger: &mut Ledger) -> Result<()> {
    ledger.add_customer(1001, "Alice Johnson", 5_000.0, 10_000.0)?;
    ledger.add_customer(2002, "Bob Smith", 5_000.0, 10_000.0)?;
    ledger.add_customer(3003, "Charlie Brown", 5_000.0, 10_000.0)?;

    let alice = [
        TransactionDraft::debit(1, 150.00).with_counterparty(9001).with_channel("WEB").with_terminal(101),
        TransactionDraft::credit(2, 500.00).with_counterparty(4004).with_channel("APP").with_terminal(101),
        TransactionDraft::debit(3, 75.00).with_counterparty(9002).with_channel("WEB").with_terminal(102),
    ];
    for draft in alice {
        ledger.add_transaction(1001, draft)?;
    }

    let charlie = [
        TransactionDraft::debit(10, 25.00).with_counterparty(9003).with_channel("APP").with_terminal(205),
        TransactionDraft::credit(11, 120.00).with_counterparty(4005).with_channel("WEB").with_terminal(205),
        TransactionDraft::debit(12, 4_500.00).with_counterparty(9004).with_channel("ATM").with_terminal(310),
        TransactionDraft::debit(13, 8_999.99).with_counterparty(9005).with_channel("ATM").with_terminal(310),
        TransactionDraft::credit(14, 50.00).with_counterparty(4006).with_channel("APP").with_terminal(205),
    ];
    for draft in charlie {
        ledger.add_transaction(3003, draft)?;
    }
    Ok(())
}

fn run_demo(ledger: &mut Ledger) -> Result<()> {
    for id in [3003, 1001, 2002] {
        let report = ledger.analyze(id)?;
        print_report(ledger, &report)?;
    }
    print_summary(ledger);
    Ok(())
}

fn print_report(ledger: &Ledger, report: &FraudReport) -> Result<()> {
    let Some(customer) = ledger.get_customer(report.customer_id) else {
        return Err(LedgerError::CustomerNotFound { id: report.customer_id }.into());
    };

    println!("=== ANALYSIS: {} (ID {}) ===", customer.name(), customer.id());
    if customer.transaction_count() == 0 {
        println!("  (No transactions to analyze)");
        println!();
        return Ok(());
    }

    let level = match report.velocity.level {
        VelocityLevel::Normal => "normal",
        VelocityLevel::Warning => "WARNING",
        VelocityLevel::Critical => "CRITICAL",
    };
    println!("  velocity:       {} in window ({level})", report.velocity.count);

    println!("  debit alerts (> ${:.2}):", customer.debit_threshold());
    for txn in &report.debit_alerts {
        println!("    {}", describe(txn));
    }
    println!("  credit alerts (> ${:.2}):", customer.credit_threshold());
    for txn in &report.credit_alerts {
        println!("    {}", describe(txn));
    }
    if report.alert_count() == 0 {
        println!("    (none)");
    }

    println!("  history:");
    for txn in customer.history() {
        println!("    {}", describe(txn));
    }
    println!();
    Ok(())
}

fn print_summary(ledger: &Ledger) {
    let transactions: usize = ledger.customers().map(|c| c.transaction_count()).sum();
    println!("=== RUN SUMMARY ===");
    println!("  customers:      {}", ledger.customer_count());
    println!("  transactions:   {transactions}");
    println!("  incidents:      {}", ledger.incident_count());
}

fn describe(txn: &Transaction) -> String {
    format!(
        "#{} {} ${:.2} {} | counterparty {} via {} @ terminal {}",
        txn.id(),
        txn.kind(),
        txn.amount(),
        format_timestamp(txn.date_time()),
        txn.counterparty_id(),
        txn.channel(),
        txn.terminal_id()
    )
}

fn format_timestamp(secs: Timestamp) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
