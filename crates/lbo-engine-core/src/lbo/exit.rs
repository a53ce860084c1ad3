use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lbo::projection::YearProjection;
use crate::time_value::annualised_return;
use crate::types::*;

/// Exit valuation and sponsor returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAnalysis {
    pub exit_multiple: Multiple,
    pub exit_ebitda: Money,
    pub exit_enterprise_value: Money,
    pub exit_debt: Money,
    pub exit_cash: Money,
    pub exit_equity_value: Money,
    /// Exit equity less sponsor equity (ignores interim dividends)
    pub total_return: Money,
    pub moic: Metric,
    /// Closed-form `moic^(1/N) - 1`. Interim dividends are not included; see
    /// `CashFlowSchedule::schedule_irr` for the cash-flow-implied figure.
    pub irr: Metric,
}

/// Exit equity: enterprise value at the multiple, less debt, plus cash.
pub(crate) fn exit_equity_value(
    exit_ebitda: Money,
    exit_multiple: Multiple,
    exit_debt: Money,
    exit_cash: Money,
) -> Money {
    exit_ebitda * exit_multiple - exit_debt + exit_cash
}

/// MOIC and closed-form IRR. Both are `None` when sponsor equity is not
/// positive; IRR is also `None` when the multiple has no real root.
pub(crate) fn sponsor_returns(
    exit_equity: Money,
    sponsor_equity: Money,
    holding_period: u32,
) -> (Metric, Metric) {
    if sponsor_equity <= Decimal::ZERO {
        return (None, None);
    }
    let moic = ratio(exit_equity, sponsor_equity);
    let irr = moic.and_then(|m| annualised_return(m, holding_period));
    (moic, irr)
}

/// Value the exit off the final projected year.
pub fn analyze_exit(
    final_year: &YearProjection,
    exit_multiple: Multiple,
    sponsor_equity: Money,
    holding_period: u32,
) -> ExitAnalysis {
    let exit_equity = exit_equity_value(
        final_year.ebitda,
        exit_multiple,
        final_year.total_debt,
        final_year.ending_cash,
    );
    let (moic, irr) = sponsor_returns(exit_equity, sponsor_equity, holding_period);

    ExitAnalysis {
        exit_multiple,
        exit_ebitda: final_year.ebitda,
        exit_enterprise_value: final_year.ebitda * exit_multiple,
        exit_debt: final_year.total_debt,
        exit_cash: final_year.ending_cash,
        exit_equity_value: exit_equity,
        total_return: exit_equity - sponsor_equity,
        moic,
        irr,
    }
}
