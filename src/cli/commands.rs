//! CLI commands for the fee engine
//!
//! Implements all command handlers for the CLI interface.

use crate::calc::{
    ExchangeRate, FeeMultiplierSource, FixedMultiplier, RateStore, ThrottleMultiplierSource,
};
use crate::charging::{
    ChargingPolicy, HandleContext, InMemoryLedger, TxnChargingPolicyAgent, TxnIdRecentHistory,
};
use crate::fees::{ConfigError, FeesConfig, UsageBasedFeeCalculator};
use crate::schedule::decimal::format_decimal;
use crate::schedule::{
    CalibrationData, CalibrationSource, FeeSchedule, FeeScheduleCalibrator, ScheduleStore,
};
use crate::txn::{AccountId, Operation, SubType, TxnAccessor};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Digits shown when re-pricing in USD
const USD_DISPLAY_SCALE: usize = 12;

/// How the congestion multiplier is chosen for a command
#[derive(Debug, Clone, Copy)]
pub enum MultiplierChoice {
    Fixed(u64),
    Utilization(u32),
}

/// One consensus-ordered transaction of a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub submitting_node: AccountId,
    pub consensus_time: DateTime<Utc>,
    pub txn: TxnAccessor,
}

/// Load the fee configuration, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> CliResult<FeesConfig> {
    match path {
        Some(path) => Ok(FeesConfig::load(path)?),
        None => Ok(FeesConfig::default()),
    }
}

fn multiplier_source(
    choice: MultiplierChoice,
    config: &FeesConfig,
) -> CliResult<Arc<dyn FeeMultiplierSource>> {
    match choice {
        MultiplierChoice::Fixed(multiplier) => Ok(Arc::new(FixedMultiplier::new(multiplier)?)),
        MultiplierChoice::Utilization(percent) => {
            let source =
                ThrottleMultiplierSource::new(config.percent_congestion_multipliers.clone());
            source.update_utilization(percent);
            Ok(Arc::new(source))
        }
    }
}

fn build_calculator(
    schedule: FeeSchedule,
    rate: ExchangeRate,
    choice: MultiplierChoice,
    config: &FeesConfig,
) -> CliResult<UsageBasedFeeCalculator> {
    let store = ScheduleStore::default();
    store.publish(schedule)?;
    Ok(UsageBasedFeeCalculator::from_config(
        config,
        Arc::new(store),
        Arc::new(RateStore::new(rate)),
        multiplier_source(choice, config)?,
    ))
}

/// Calibrate the full fee schedule
pub fn cmd_calibrate(calibration: &Path, output: &Path, config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    let data = CalibrationData::load(calibration)?;
    let schedule = FeeScheduleCalibrator::new(&data)
        .with_bounds(config.default_min_fee, config.default_max_fee)
        .build_schedule()?;

    schedule.save(output)?;

    println!("✅ Fee schedule calibrated!");
    println!("   📄 Entries: {}", schedule.len());
    println!("   📁 Written to: {}", output.display());
    println!("   🔒 Digest: {}", schedule.digest()?);

    Ok(())
}

/// Show one calibrated entry and its USD re-pricing
pub fn cmd_entry(calibration: &Path, function: Operation, subtype: SubType) -> CliResult<()> {
    let data = CalibrationData::load(calibration)?;
    let prices = FeeScheduleCalibrator::new(&data).canonical_prices_for(function, subtype)?;

    let mut schedule = FeeSchedule::new();
    schedule.insert(function, subtype, prices);

    if let Some(repr) = schedule.entry_repr(function) {
        println!("{}", serde_json::to_string_pretty(&repr)?);
    }

    let usage = data.canonical_usage(function, subtype)?;
    let canonical = data.canonical_price(function, subtype)?;
    if let Some(repriced) = schedule.repriced_usd(function, subtype, &usage) {
        println!("\n💵 Canonical price: ${}", canonical);
        println!(
            "   Re-priced usage: ${}",
            format_decimal(&repriced, USD_DISPLAY_SCALE)
        );
    }

    Ok(())
}

/// Estimate the fee of a single transaction
pub fn cmd_price(
    schedule: &Path,
    txn: &Path,
    rate: ExchangeRate,
    choice: MultiplierChoice,
    config: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config)?;
    let accessor: TxnAccessor = read_json(txn)?;
    let calculator = build_calculator(FeeSchedule::load(schedule)?, rate, choice, &config)?;

    let fees = calculator.estimate_fee(&accessor)?;

    println!("💰 Fee for {} ({})", accessor.txn_id, accessor.function);
    println!("   ├─ Node: {} tinybars", fees.node_fee);
    println!("   ├─ Network: {} tinybars", fees.network_fee);
    println!("   ├─ Service: {} tinybars", fees.service_fee);
    println!("   └─ Total: {} tinybars", fees.total()?);

    Ok(())
}

/// Run a consensus-ordered batch through the charging agent
pub fn cmd_handle(
    schedule: &Path,
    txns: &Path,
    ledger_path: &Path,
    rate: ExchangeRate,
    config: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config)?;
    let batch: Vec<BatchEntry> = read_json(txns)?;
    let mut ledger = InMemoryLedger::load(ledger_path)?;
    if ledger.funding_account() != config.funding_account {
        return Err(format!(
            "Ledger funds {} but the configured funding account is {}",
            ledger.funding_account(),
            config.funding_account
        )
        .into());
    }
    let calculator = build_calculator(
        FeeSchedule::load(schedule)?,
        rate,
        MultiplierChoice::Fixed(1),
        &config,
    )?;

    let mut agent = TxnChargingPolicyAgent::new(Arc::new(calculator))
        .with_exempt_payers(config.exempt_payers.clone());
    let mut history = TxnIdRecentHistory::new(config.duplicate_window_secs)
        .ok_or(ConfigError::InvalidDuplicateWindow(config.duplicate_window_secs))?;

    println!("📦 Handling {} transaction(s)", batch.len());
    for entry in &batch {
        history.expire_before(entry.consensus_time);

        let ctx = HandleContext::new(entry.submitting_node, entry.consensus_time);
        let outcome = agent.compute_and_apply_fee(&entry.txn, &ctx, &history, &mut ledger);

        if let Some(policy) = outcome.policy {
            history.observe(
                entry.txn.txn_id,
                entry.submitting_node,
                entry.consensus_time,
                policy != ChargingPolicy::IgnoredDueDiligence,
            );
        }

        let charged = match (outcome.policy, outcome.fees) {
            (Some(policy), Some(fees)) => format!("{} policy, {}", policy, fees),
            _ => "nothing charged".to_string(),
        };
        println!(
            "   {} {} via {}: {} ({})",
            if outcome.proceed { "✅" } else { "⛔" },
            entry.txn.txn_id,
            entry.submitting_node,
            outcome.status,
            charged
        );
    }

    ledger.save(ledger_path)?;

    println!("\n📒 Balances:");
    for (account, balance) in ledger.balances() {
        println!("   {} = {} tinybars", account, balance);
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CALIBRATION: &str = r#"{
        "provider_weights": { "node": "0.1", "network": "0.2", "service": "0.7" },
        "capacities": {
            "bpt": 1000000, "vpt": 1000, "rbh": 1000000, "sbh": 1000000,
            "gas": 1000000, "bpr": 1000000, "sbpr": 1000000
        },
        "constant_weights": { "ConsensusSubmitMessage": "0.2" },
        "canonical_prices": { "ConsensusSubmitMessage": { "DEFAULT": "0.0001" } },
        "canonical_usages": {
            "ConsensusSubmitMessage": {
                "DEFAULT": {
                    "node": { "constant": 1, "bpt": 300, "vpt": 1, "bpr": 4 },
                    "network": { "constant": 1, "bpt": 300, "vpt": 1, "rbh": 4 },
                    "service": { "constant": 1, "rbh": 7 }
                }
            }
        }
    }"#;

    const BATCH: &str = r#"[
        {
            "submitting_node": "0.0.3",
            "consensus_time": "2024-01-01T00:00:05Z",
            "txn": {
                "txn_id": { "payer": "0.0.1001", "valid_start": "2024-01-01T00:00:00Z" },
                "node_account": "0.0.3",
                "function": "ConsensusSubmitMessage",
                "offered_fee": 100000000,
                "payer_key": { "ed25519": "00112233" },
                "op_meta": { "type": "submit_message", "num_msg_bytes": 100 }
            }
        },
        {
            "submitting_node": "0.0.4",
            "consensus_time": "2024-01-01T00:00:06Z",
            "txn": {
                "txn_id": { "payer": "0.0.1001", "valid_start": "2024-01-01T00:00:00Z" },
                "node_account": "0.0.4",
                "function": "ConsensusSubmitMessage",
                "offered_fee": 100000000,
                "payer_key": { "ed25519": "00112233" },
                "op_meta": { "type": "submit_message", "num_msg_bytes": 100 }
            }
        }
    ]"#;

    #[test]
    fn test_calibrate_then_handle_batch() {
        let dir = tempdir().unwrap();
        let calibration = dir.path().join("calibration.json");
        let schedule = dir.path().join("schedule.json");
        let txns = dir.path().join("txns.json");
        let ledger_path = dir.path().join("ledger.json");
        fs::write(&calibration, CALIBRATION).unwrap();
        fs::write(&txns, BATCH).unwrap();

        let mut ledger = InMemoryLedger::new(AccountId::num(98));
        ledger.set_balance(AccountId::num(3), 0);
        ledger.set_balance(AccountId::num(4), 0);
        ledger.set_balance(AccountId::num(1001), 1_000_000_000);
        ledger.save(&ledger_path).unwrap();

        cmd_calibrate(&calibration, &schedule, None).unwrap();
        assert_eq!(FeeSchedule::load(&schedule).unwrap().len(), 1);

        let rate = ExchangeRate::new(1, 12).unwrap();
        cmd_handle(&schedule, &txns, &ledger_path, rate, None).unwrap();

        let after = InMemoryLedger::load(&ledger_path).unwrap();
        let payer = after.balances()[&AccountId::num(1001)];
        let node = after.balances()[&AccountId::num(3)];
        let other_node = after.balances()[&AccountId::num(4)];
        let funding = after.balances()[&AccountId::num(98)];
        assert!(payer < 1_000_000_000);
        // The duplicate from another node still pays that node its fee
        assert_eq!(node, other_node);
        assert!(node > 0);
        assert_eq!(payer + node + other_node + funding, 1_000_000_000);
    }

    #[test]
    fn test_entry_and_price() {
        let dir = tempdir().unwrap();
        let calibration = dir.path().join("calibration.json");
        let schedule = dir.path().join("schedule.json");
        let txn = dir.path().join("txn.json");
        fs::write(&calibration, CALIBRATION).unwrap();

        let batch: serde_json::Value = serde_json::from_str(BATCH).unwrap();
        fs::write(&txn, batch[0]["txn"].to_string()).unwrap();

        cmd_entry(&calibration, Operation::ConsensusSubmitMessage, SubType::Default).unwrap();
        assert!(cmd_entry(&calibration, Operation::TokenMint, SubType::Default).is_err());

        cmd_calibrate(&calibration, &schedule, None).unwrap();
        let rate = ExchangeRate::new(1, 12).unwrap();
        cmd_price(&schedule, &txn, rate, MultiplierChoice::Fixed(1), None).unwrap();
        cmd_price(&schedule, &txn, rate, MultiplierChoice::Utilization(99), None).unwrap();
        assert!(cmd_price(&schedule, &txn, rate, MultiplierChoice::Fixed(0), None).is_err());
    }

    #[test]
    fn test_handle_rejects_mismatched_funding_account() {
        let dir = tempdir().unwrap();
        let calibration = dir.path().join("calibration.json");
        let schedule = dir.path().join("schedule.json");
        let txns = dir.path().join("txns.json");
        let ledger_path = dir.path().join("ledger.json");
        fs::write(&calibration, CALIBRATION).unwrap();
        fs::write(&txns, BATCH).unwrap();
        InMemoryLedger::new(AccountId::num(800)).save(&ledger_path).unwrap();
        cmd_calibrate(&calibration, &schedule, None).unwrap();

        let rate = ExchangeRate::new(1, 12).unwrap();
        assert!(cmd_handle(&schedule, &txns, &ledger_path, rate, None).is_err());
    }
}
