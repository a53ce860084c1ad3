use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LboError;
use crate::lbo::assumptions::{self, AssumptionSet, CompanySnapshot};
use crate::lbo::cash_flows::{self, CashFlowSchedule};
use crate::lbo::entry::{self, EntryValuation};
use crate::lbo::exit::{self, ExitAnalysis};
use crate::lbo::projection::{self, YearProjection};
use crate::lbo::sensitivity::{self, SensitivityGrid};
use crate::types::*;
use crate::LboResult;

/// A complete engine request: the target's financials plus the assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LboRunInput {
    pub snapshot: CompanySnapshot,
    #[serde(default)]
    pub assumptions: AssumptionSet,
}

/// Everything the engine produces for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboRunOutput {
    pub entry_valuation: EntryValuation,
    /// Year-by-year projections, year 1..=N
    pub projections: Vec<YearProjection>,
    pub exit_analysis: ExitAnalysis,
    pub cash_flow_schedule: CashFlowSchedule,
    pub sensitivity_grid: SensitivityGrid,
}

/// Records a warning both in the output envelope and on the log.
fn flag(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

fn collect_projection_warnings(projections: &[YearProjection], warnings: &mut Vec<String>) {
    for p in projections {
        if p.leverage.is_none() {
            flag(
                warnings,
                format!("Year {}: EBITDA is zero; leverage not meaningful", p.year),
            );
        }
        if p.interest_coverage.is_none() {
            flag(
                warnings,
                format!(
                    "Year {}: no interest expense; interest coverage not meaningful",
                    p.year
                ),
            );
        }
    }
}

/// Run the full model: entry valuation, N-year projection, exit, sponsor cash
/// flows and the entry/exit multiple sensitivity grid.
///
/// Fails only on structurally invalid assumptions; every arithmetic
/// degeneracy is reported as a `None` metric plus a warning.
pub fn run_lbo(
    snapshot: &CompanySnapshot,
    assumptions: &AssumptionSet,
) -> LboResult<ComputationOutput<LboRunOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // ─── Validation ──────────────────────────────────────────────────
    assumptions::validate(assumptions)?;
    // Reject a bad sweep axis before projecting
    sensitivity::generate_sweep_values(&assumptions.sensitivity.entry_multiple)?;
    sensitivity::generate_sweep_values(&assumptions.sensitivity.exit_multiple)?;
    if assumptions.tranche_leverage() != assumptions.total_leverage {
        flag(
            &mut warnings,
            format!(
                "Total leverage {}x differs from senior + subordinated {}x; tranche multiples used",
                assumptions.total_leverage,
                assumptions.tranche_leverage()
            ),
        );
    }

    // ─── Entry ───────────────────────────────────────────────────────
    let entry_valuation = entry::calculate_entry_valuation(snapshot, assumptions);
    let sponsor_equity = entry_valuation.sources_uses.sponsor_equity;
    if entry_valuation.implied_share_price.is_none() {
        flag(
            &mut warnings,
            "Shares outstanding not positive; implied share price not meaningful".into(),
        );
    }
    if entry_valuation.implied_premium.is_none() {
        flag(
            &mut warnings,
            "Implied premium not meaningful (no share price or implied price)".into(),
        );
    }
    if sponsor_equity <= Decimal::ZERO {
        flag(
            &mut warnings,
            format!("Sponsor equity is {sponsor_equity}; debt capacity covers all uses, returns not meaningful"),
        );
    }

    // ─── Projection ──────────────────────────────────────────────────
    let projections = projection::project_years(snapshot, assumptions, &entry_valuation);
    collect_projection_warnings(&projections, &mut warnings);
    let final_year = projections.last().ok_or_else(|| {
        LboError::invalid("holding_period", "Projection produced no years")
    })?;

    // ─── Exit & returns ──────────────────────────────────────────────
    let exit_analysis = exit::analyze_exit(
        final_year,
        assumptions.exit_multiple,
        sponsor_equity,
        assumptions.holding_period,
    );
    if exit_analysis.moic.is_some() && exit_analysis.irr.is_none() {
        flag(
            &mut warnings,
            "Exit equity is negative; IRR not meaningful".into(),
        );
    }

    let cash_flow_schedule = cash_flows::build_cash_flow_schedule(
        &projections,
        &exit_analysis,
        sponsor_equity,
        snapshot.fiscal_year_end,
    );
    if cash_flow_schedule.schedule_irr.is_none() {
        flag(
            &mut warnings,
            "Cash-flow-implied IRR not meaningful".into(),
        );
    }

    // ─── Sensitivity ─────────────────────────────────────────────────
    let sensitivity_grid =
        sensitivity::generate_sensitivity_grid(snapshot, assumptions, final_year)?;
    let degenerate = sensitivity_grid.degenerate_cells().count();
    if degenerate > 0 {
        flag(
            &mut warnings,
            format!("{degenerate} sensitivity cell(s) have returns that are not meaningful"),
        );
    }

    let output = LboRunOutput {
        entry_valuation,
        projections,
        exit_analysis,
        cash_flow_schedule,
        sensitivity_grid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Leveraged Buyout Projection & Sensitivity",
        &serde_json::json!({
            "entry_multiple": assumptions.entry_multiple.to_string(),
            "exit_multiple": assumptions.exit_multiple.to_string(),
            "holding_period": assumptions.holding_period,
            "base_ebitda": snapshot.base_ebitda.to_string(),
            "dividend_payout_ratio": assumptions.dividend_payout_ratio.to_string(),
            "da_pct_revenue": assumptions.da_pct_revenue.to_string(),
            "opening_cash": assumptions.opening_cash,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Convenience wrapper over [`run_lbo`] for a combined request.
pub fn run_lbo_input(input: &LboRunInput) -> LboResult<ComputationOutput<LboRunOutput>> {
    run_lbo(&input.snapshot, &input.assumptions)
}
