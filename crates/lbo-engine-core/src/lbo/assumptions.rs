use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LboError;
use crate::types::*;
use crate::LboResult;

/// Most recent annual financials of the target, assembled upstream from its
/// income statement, cash-flow statement, balance sheet and profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    /// Revenue in the base year (year 0)
    pub base_revenue: Money,
    /// EBITDA in the base year; drives entry valuation and debt sizing
    pub base_ebitda: Money,
    /// Current quoted share price
    pub current_share_price: Money,
    /// Shares outstanding (may be derived from market cap upstream)
    pub shares_outstanding: Decimal,
    /// Existing debt refinanced at close
    pub current_debt: Money,
    /// Existing cash on the target's balance sheet
    pub current_cash: Money,
    /// Base-year capital expenditure, used only to seed default assumptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_capex: Option<Money>,
    /// Period end of the base year; projection years are dated from here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year_end: Option<NaiveDate>,
}

/// Where year 1's beginning cash comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningCashPolicy {
    /// The target's cash at entry (`current_cash`)
    #[default]
    EntryCash,
    /// Start the projection with no cash on hand
    Zero,
}

/// The entry/exit multiple axes swept by the sensitivity grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRange {
    pub entry_multiple: SensitivityVariable,
    pub exit_multiple: SensitivityVariable,
}

impl Default for SensitivityRange {
    fn default() -> Self {
        SensitivityRange {
            entry_multiple: SensitivityVariable {
                name: "Entry Multiple".into(),
                min: dec!(9.0),
                max: dec!(15.0),
                step: dec!(1.0),
            },
            exit_multiple: SensitivityVariable {
                name: "Exit Multiple".into(),
                min: dec!(9.0),
                max: dec!(15.0),
                step: dec!(1.0),
            },
        }
    }
}

/// Transaction, operating and financing assumptions for one run.
///
/// Every field falls back to [`AssumptionSet::default`] when missing from a
/// deserialized input, so callers may supply only the values they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    // Transaction
    /// Entry EV/EBITDA multiple
    pub entry_multiple: Multiple,
    /// Exit EV/EBITDA multiple
    pub exit_multiple: Multiple,
    /// Holding period in years (N)
    pub holding_period: u32,
    /// Transaction fees as a fraction of equity value
    pub transaction_fee_rate: Rate,

    // Operating
    /// Revenue growth per year; the last value repeats past the end
    pub revenue_growth: Vec<Rate>,
    /// Target EBITDA margin
    pub ebitda_margin: Rate,
    pub tax_rate: Rate,
    pub capex_pct_revenue: Rate,
    /// Change in net working capital as a fraction of revenue
    pub nwc_pct_revenue: Rate,
    pub da_pct_revenue: Rate,
    pub dividend_payout_ratio: Rate,

    // Financing structure (multiples of base EBITDA)
    pub total_leverage: Multiple,
    pub senior_leverage: Multiple,
    pub subordinated_leverage: Multiple,
    pub senior_rate: Rate,
    pub subordinated_rate: Rate,
    pub revolver_rate: Rate,
    /// Revolver facility size; drawn in full at close
    pub revolver_size: Money,
    pub senior_amortization_rate: Rate,
    pub subordinated_amortization_rate: Rate,
    /// Share of post-mandatory cash swept to senior debt
    pub cash_sweep_rate: Rate,

    pub opening_cash: OpeningCashPolicy,
    pub sensitivity: SensitivityRange,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        AssumptionSet {
            entry_multiple: dec!(12.0),
            exit_multiple: dec!(12.0),
            holding_period: 5,
            transaction_fee_rate: dec!(0.025),
            revenue_growth: vec![dec!(0.05)],
            ebitda_margin: dec!(0.20),
            tax_rate: dec!(0.25),
            capex_pct_revenue: dec!(0.03),
            nwc_pct_revenue: dec!(0.01),
            da_pct_revenue: dec!(0.025),
            dividend_payout_ratio: dec!(0.50),
            total_leverage: dec!(5.5),
            senior_leverage: dec!(4.0),
            subordinated_leverage: dec!(1.5),
            senior_rate: dec!(0.065),
            subordinated_rate: dec!(0.09),
            revolver_rate: dec!(0.055),
            revolver_size: dec!(50_000_000),
            senior_amortization_rate: dec!(0.05),
            subordinated_amortization_rate: Decimal::ZERO,
            cash_sweep_rate: dec!(0.75),
            opening_cash: OpeningCashPolicy::default(),
            sensitivity: SensitivityRange::default(),
        }
    }
}

impl AssumptionSet {
    /// Defaults with the operating margin and capex intensity taken from the
    /// snapshot's historical ratios, where those are defined.
    pub fn seeded_from(snapshot: &CompanySnapshot) -> Self {
        let mut seeded = AssumptionSet::default();
        if snapshot.base_revenue > Decimal::ZERO {
            if let Some(margin) = ratio(snapshot.base_ebitda, snapshot.base_revenue) {
                seeded.ebitda_margin = margin;
            }
            // Statements report capex as an outflow; either sign is accepted.
            if let Some(capex) = snapshot
                .base_capex
                .and_then(|c| ratio(c.abs(), snapshot.base_revenue))
            {
                seeded.capex_pct_revenue = capex;
            }
        }
        seeded
    }

    /// Growth rate applied in `year` (1-based), repeating the last entry.
    pub fn growth_for_year(&self, year: u32) -> Rate {
        let idx = year.saturating_sub(1) as usize;
        match self.revenue_growth.get(idx) {
            Some(g) => *g,
            None => self.revenue_growth.last().copied().unwrap_or(Decimal::ZERO),
        }
    }

    /// Senior plus subordinated multiple; the tranche multiples are what size
    /// the debt.
    pub fn tranche_leverage(&self) -> Multiple {
        self.senior_leverage + self.subordinated_leverage
    }
}

fn check_unit_interval(field: &str, value: Rate) -> LboResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(LboError::invalid(field, "Must be between 0 and 1"));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: Decimal) -> LboResult<()> {
    if value < Decimal::ZERO {
        return Err(LboError::invalid(field, "Cannot be negative"));
    }
    Ok(())
}

/// Structural validation run before the projection loop begins.
///
/// Snapshot values are deliberately not checked here: degenerate share counts
/// or prices surface as "not meaningful" metrics rather than errors.
pub fn validate(assumptions: &AssumptionSet) -> LboResult<()> {
    if assumptions.holding_period < 1 {
        return Err(LboError::invalid(
            "holding_period",
            "Holding period must be at least 1 year",
        ));
    }
    if assumptions.revenue_growth.is_empty() {
        return Err(LboError::invalid(
            "revenue_growth",
            "At least one revenue growth rate is required",
        ));
    }

    check_non_negative("revolver_size", assumptions.revolver_size)?;
    check_non_negative("senior_leverage", assumptions.senior_leverage)?;
    check_non_negative("subordinated_leverage", assumptions.subordinated_leverage)?;
    check_non_negative("total_leverage", assumptions.total_leverage)?;
    check_non_negative("transaction_fee_rate", assumptions.transaction_fee_rate)?;

    check_unit_interval("tax_rate", assumptions.tax_rate)?;
    check_unit_interval("dividend_payout_ratio", assumptions.dividend_payout_ratio)?;
    check_unit_interval("cash_sweep_rate", assumptions.cash_sweep_rate)?;
    check_unit_interval(
        "senior_amortization_rate",
        assumptions.senior_amortization_rate,
    )?;
    check_unit_interval(
        "subordinated_amortization_rate",
        assumptions.subordinated_amortization_rate,
    )?;

    Ok(())
}
