use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;

use lbo_engine_core::lbo::{self, entry, AssumptionSet, CompanySnapshot, LboRunInput};
use lbo_engine_core::types::with_metadata;

use crate::input;

/// Flags shared by every command that runs the model
#[derive(Args, Clone, Default)]
pub struct OverrideArgs {
    /// Entry EV/EBITDA multiple (overrides the input file)
    #[arg(long)]
    pub entry_multiple: Option<Decimal>,

    /// Exit EV/EBITDA multiple (overrides the input file)
    #[arg(long)]
    pub exit_multiple: Option<Decimal>,

    /// Holding period in years (overrides the input file)
    #[arg(long)]
    pub holding_period: Option<u32>,
}

impl OverrideArgs {
    fn apply(&self, assumptions: &mut AssumptionSet) {
        if let Some(m) = self.entry_multiple {
            assumptions.entry_multiple = m;
        }
        if let Some(m) = self.exit_multiple {
            assumptions.exit_multiple = m;
        }
        if let Some(n) = self.holding_period {
            assumptions.holding_period = n;
        }
    }
}

/// Arguments for a full LBO run
#[derive(Args)]
pub struct RunArgs {
    /// Path to JSON/YAML input with `snapshot` and optional `assumptions`
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for entry valuation only
#[derive(Args)]
pub struct EntryArgs {
    /// Path to JSON/YAML input with `snapshot` and optional `assumptions`
    #[arg(long)]
    pub input: Option<String>,

    /// Entry EV/EBITDA multiple (overrides the input file)
    #[arg(long)]
    pub entry_multiple: Option<Decimal>,
}

/// Arguments for the entry/exit multiple sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML input with `snapshot` and optional `assumptions`
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for seeding default assumptions from a snapshot
#[derive(Args)]
pub struct DefaultsArgs {
    /// Path to JSON/YAML company snapshot
    #[arg(long)]
    pub input: Option<String>,
}

fn load<T: DeserializeOwned>(
    path: &Option<String>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file> or stdin required for {what}").into())
    }
}

pub fn run_lbo(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut run_input: LboRunInput = load(&args.input, "LBO run")?;
    args.overrides.apply(&mut run_input.assumptions);

    let result = lbo::run_lbo_input(&run_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_entry(args: EntryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut run_input: LboRunInput = load(&args.input, "entry valuation")?;
    if let Some(m) = args.entry_multiple {
        run_input.assumptions.entry_multiple = m;
    }

    let valuation =
        entry::calculate_entry_valuation(&run_input.snapshot, &run_input.assumptions);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        "Entry Valuation & Sources and Uses",
        &serde_json::json!({
            "entry_multiple": run_input.assumptions.entry_multiple.to_string(),
            "base_ebitda": run_input.snapshot.base_ebitda.to_string(),
        }),
        Vec::new(),
        elapsed,
        valuation,
    ))?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut run_input: LboRunInput = load(&args.input, "sensitivity grid")?;
    args.overrides.apply(&mut run_input.assumptions);

    let output = lbo::run_lbo_input(&run_input)?;
    let grid = output.result.sensitivity_grid;
    let rows: Vec<Value> = grid
        .cells
        .iter()
        .flatten()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    Ok(serde_json::json!({
        "entry_multiples": grid.entry_multiples,
        "exit_multiples": grid.exit_multiples,
        "base_case_position": grid.base_case_position,
        "results": rows,
        "warnings": output.warnings,
    }))
}

pub fn run_defaults(args: DefaultsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot: CompanySnapshot = load(&args.input, "default assumptions")?;
    let assumptions = AssumptionSet::seeded_from(&snapshot);
    Ok(serde_json::json!({ "result": assumptions }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overrides_apply_only_given_flags() {
        let overrides = OverrideArgs {
            entry_multiple: Some(dec!(10.5)),
            exit_multiple: None,
            holding_period: Some(7),
        };
        let mut a = AssumptionSet::default();
        overrides.apply(&mut a);
        assert_eq!(a.entry_multiple, dec!(10.5));
        assert_eq!(a.exit_multiple, dec!(12.0));
        assert_eq!(a.holding_period, 7);
    }

    #[test]
    fn test_empty_overrides_leave_assumptions() {
        let mut a = AssumptionSet::default();
        OverrideArgs::default().apply(&mut a);
        assert_eq!(a, AssumptionSet::default());
    }
}
