use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::lbo::exit::ExitAnalysis;
use crate::lbo::projection::{period_end_for, YearProjection};
use crate::time_value;
use crate::types::*;

/// One row of the sponsor's cash-flow schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    pub description: String,
    pub cash_flow: Money,
    pub cumulative_cash_flow: Money,
}

/// Equity investor cash flows from entry (year 0) through exit (year N).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub entries: Vec<CashFlowEntry>,
    pub total_dividends: Money,
    /// Final cumulative figure: exit proceeds + dividends - sponsor equity
    pub cumulative_cash_flow: Money,
    /// IRR solved over the full schedule, dividends included. Reported
    /// alongside, never in place of, `ExitAnalysis::irr`.
    pub schedule_irr: Metric,
}

/// Lay out the sponsor's cash flows: the equity cheque at year 0, each year's
/// dividend, and exit proceeds added to the final year.
pub fn build_cash_flow_schedule(
    projections: &[YearProjection],
    exit: &ExitAnalysis,
    sponsor_equity: Money,
    fiscal_year_end: Option<NaiveDate>,
) -> CashFlowSchedule {
    let mut entries: Vec<CashFlowEntry> = Vec::with_capacity(projections.len() + 1);
    let mut cumulative = -sponsor_equity;
    entries.push(CashFlowEntry {
        year: 0,
        period_end: period_end_for(fiscal_year_end, 0),
        description: "Initial Equity Investment".into(),
        cash_flow: -sponsor_equity,
        cumulative_cash_flow: cumulative,
    });

    let last_year = projections.last().map(|p| p.year);
    for p in projections {
        let (description, cash_flow) = if Some(p.year) == last_year {
            ("Dividend + Exit Proceeds", p.dividend + exit.exit_equity_value)
        } else {
            ("Dividend", p.dividend)
        };
        cumulative += cash_flow;
        entries.push(CashFlowEntry {
            year: p.year,
            period_end: p.period_end,
            description: description.into(),
            cash_flow,
            cumulative_cash_flow: cumulative,
        });
    }

    let total_dividends: Money = projections.iter().map(|p| p.dividend).sum();

    let flows: Vec<Money> = entries.iter().map(|e| e.cash_flow).collect();
    let schedule_irr = match time_value::irr(&flows, dec!(0.10)) {
        Ok(r) => Some(r),
        Err(e) => {
            debug!("schedule IRR solver gave up: {e}");
            None
        }
    };

    CashFlowSchedule {
        entries,
        total_dividends,
        cumulative_cash_flow: cumulative,
        schedule_irr,
    }
}

/// Sum of the schedule's cash flows, used to cross-check the cumulative
/// column.
pub fn net_cash_flow(schedule: &CashFlowSchedule) -> Money {
    schedule
        .entries
        .iter()
        .map(|e| e.cash_flow)
        .fold(Decimal::ZERO, |acc, cf| acc + cf)
}
