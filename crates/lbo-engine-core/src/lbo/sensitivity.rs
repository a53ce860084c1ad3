use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LboError;
use crate::lbo::assumptions::{AssumptionSet, CompanySnapshot};
use crate::lbo::entry::price_deal;
use crate::lbo::exit::{exit_equity_value, sponsor_returns};
use crate::lbo::projection::YearProjection;
use crate::types::*;
use crate::LboResult;

/// Multiples within this distance of the live assumptions mark the base case.
const BASE_CASE_TOLERANCE: Decimal = dec!(0.000001);

/// Upper bound on points per axis.
const MAX_SWEEP_POINTS: usize = 101;

/// Returns for one (entry, exit) multiple pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub entry_multiple: Multiple,
    pub exit_multiple: Multiple,
    /// Closed-form IRR clamped to [-100%, +100%]
    pub irr: Metric,
    pub moic: Metric,
    pub sponsor_equity: Money,
    pub exit_equity_value: Money,
    pub is_base_case: bool,
}

/// IRR heat-map over entry multiples (rows) and exit multiples (columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub entry_multiples: Vec<Multiple>,
    pub exit_multiples: Vec<Multiple>,
    /// cells[i][j] = returns at entry_multiples[i], exit_multiples[j]
    pub cells: Vec<Vec<SensitivityCell>>,
    /// Position of the live assumptions in the grid (row, col), if present
    pub base_case_position: Option<(usize, usize)>,
}

impl SensitivityGrid {
    /// Cells whose metrics are not meaningful.
    pub fn degenerate_cells(&self) -> impl Iterator<Item = &SensitivityCell> {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.irr.is_none() || c.moic.is_none())
    }
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
pub fn generate_sweep_values(var: &SensitivityVariable) -> LboResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(LboError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(LboError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }
    // A span or quotient outside the Decimal range is too many points as well
    let points = var
        .max
        .checked_sub(var.min)
        .and_then(|span| span.checked_div(var.step));
    let too_many = match points {
        Some(points) => points >= Decimal::from(MAX_SWEEP_POINTS),
        None => true,
    };
    if too_many {
        return Err(LboError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: format!("Range produces more than {MAX_SWEEP_POINTS} points"),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

fn clamp_irr(irr: Rate) -> Rate {
    irr.max(dec!(-1)).min(Decimal::ONE)
}

fn is_live(candidate: Multiple, live: Multiple) -> bool {
    (candidate - live).abs() <= BASE_CASE_TOLERANCE
}

/// Re-price the deal at each candidate multiple pair.
///
/// Every cell reuses the base case's final projected year (EBITDA, debt and
/// cash); only the entry pricing and exit multiple vary. Degenerate cells carry
/// `None` metrics and do not stop the sweep.
pub fn generate_sensitivity_grid(
    snapshot: &CompanySnapshot,
    assumptions: &AssumptionSet,
    base_final_year: &YearProjection,
) -> LboResult<SensitivityGrid> {
    let entry_multiples = generate_sweep_values(&assumptions.sensitivity.entry_multiple)?;
    let exit_multiples = generate_sweep_values(&assumptions.sensitivity.exit_multiple)?;

    let mut base_case_position = None;
    let mut cells = Vec::with_capacity(entry_multiples.len());

    for (i, &entry_multiple) in entry_multiples.iter().enumerate() {
        let deal = price_deal(snapshot, assumptions, entry_multiple);
        let mut row = Vec::with_capacity(exit_multiples.len());

        for (j, &exit_multiple) in exit_multiples.iter().enumerate() {
            let exit_equity = exit_equity_value(
                base_final_year.ebitda,
                exit_multiple,
                base_final_year.total_debt,
                base_final_year.ending_cash,
            );
            let (moic, irr) =
                sponsor_returns(exit_equity, deal.sponsor_equity, assumptions.holding_period);

            let is_base_case = base_case_position.is_none()
                && is_live(entry_multiple, assumptions.entry_multiple)
                && is_live(exit_multiple, assumptions.exit_multiple);
            if is_base_case {
                base_case_position = Some((i, j));
            }

            row.push(SensitivityCell {
                entry_multiple,
                exit_multiple,
                irr: irr.map(clamp_irr),
                moic,
                sponsor_equity: deal.sponsor_equity,
                exit_equity_value: exit_equity,
                is_base_case,
            });
        }
        cells.push(row);
    }

    debug!(
        "sensitivity grid {}x{} computed, base case at {:?}",
        entry_multiples.len(),
        exit_multiples.len(),
        base_case_position
    );

    Ok(SensitivityGrid {
        entry_multiples,
        exit_multiples,
        cells,
        base_case_position,
    })
}
