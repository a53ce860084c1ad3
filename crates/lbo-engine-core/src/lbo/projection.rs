use chrono::{Months, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lbo::assumptions::{AssumptionSet, CompanySnapshot, OpeningCashPolicy};
use crate::lbo::entry::EntryValuation;
use crate::types::*;

/// A single year of the operating and debt model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,

    // Operating build
    pub revenue: Money,
    pub growth: Rate,
    pub ebitda: Money,
    pub ebitda_margin: Metric,
    pub da: Money,
    pub ebit: Money,

    // Interest on beginning-of-year balances
    pub senior_interest: Money,
    pub subordinated_interest: Money,
    pub revolver_interest: Money,
    pub total_interest: Money,

    pub ebt: Money,
    pub taxes: Money,
    pub net_income: Money,
    pub capex: Money,
    pub nwc_change: Money,
    pub free_cash_flow: Money,

    // Debt service waterfall
    pub beginning_cash: Money,
    pub cash_available: Money,
    pub mandatory_amortization: Money,
    pub cash_sweep: Money,
    pub subordinated_amortization: Money,
    pub total_debt_service: Money,
    pub cash_flow_to_equity: Money,
    pub dividend: Money,
    pub ending_cash: Money,

    // Balances
    pub beginning_senior_debt: Money,
    pub senior_debt: Money,
    pub beginning_subordinated_debt: Money,
    pub subordinated_debt: Money,
    pub total_debt: Money,
    pub net_debt: Money,

    // Credit metrics
    /// Ending total debt / EBITDA
    pub leverage: Metric,
    /// EBITDA / total interest
    pub interest_coverage: Metric,
}

/// Balances carried from one year to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionState {
    pub revenue: Money,
    pub senior_balance: Money,
    pub subordinated_balance: Money,
    pub cash: Money,
}

impl ProjectionState {
    /// Year-zero state: base revenue, the debt raised at entry and the opening
    /// cash chosen by the assumption set.
    pub fn opening(
        snapshot: &CompanySnapshot,
        assumptions: &AssumptionSet,
        entry: &EntryValuation,
    ) -> Self {
        let cash = match assumptions.opening_cash {
            OpeningCashPolicy::EntryCash => snapshot.current_cash.max(Decimal::ZERO),
            OpeningCashPolicy::Zero => Decimal::ZERO,
        };
        ProjectionState {
            revenue: snapshot.base_revenue,
            senior_balance: entry.sources_uses.senior_debt,
            subordinated_balance: entry.sources_uses.subordinated_debt,
            cash,
        }
    }
}

/// Advance the model by one fiscal year.
///
/// Pure transition: the returned state seeds the next year and `state` is left
/// untouched.
pub fn project_year(
    state: &ProjectionState,
    year: u32,
    assumptions: &AssumptionSet,
    period_end: Option<NaiveDate>,
) -> (YearProjection, ProjectionState) {
    let zero = Decimal::ZERO;
    let senior_begin = state.senior_balance;
    let sub_begin = state.subordinated_balance;
    let beginning_cash = state.cash;

    // Operating build
    let growth = assumptions.growth_for_year(year);
    let revenue = state.revenue * (Decimal::ONE + growth);
    let ebitda = revenue * assumptions.ebitda_margin;
    let da = revenue * assumptions.da_pct_revenue;
    let ebit = ebitda - da;

    // Revolver interest accrues on the whole facility every year
    let senior_interest = senior_begin * assumptions.senior_rate;
    let subordinated_interest = sub_begin * assumptions.subordinated_rate;
    let revolver_interest = assumptions.revolver_size * assumptions.revolver_rate;
    let total_interest = senior_interest + subordinated_interest + revolver_interest;

    let ebt = ebit - total_interest;
    let taxes = (ebt * assumptions.tax_rate).max(zero);
    let net_income = ebt - taxes;

    let capex = revenue * assumptions.capex_pct_revenue;
    let nwc_change = revenue * assumptions.nwc_pct_revenue;
    let free_cash_flow = net_income + da - capex - nwc_change;
    let cash_available = free_cash_flow + beginning_cash;

    // Waterfall: mandatory senior, sweep to senior, then subordinated
    let mandatory_amortization = cash_available
        .min(senior_begin * assumptions.senior_amortization_rate)
        .max(zero);
    let cash_after_mandatory = (cash_available - total_interest - mandatory_amortization).max(zero);
    let cash_sweep = (cash_after_mandatory * assumptions.cash_sweep_rate)
        .min(senior_begin - mandatory_amortization)
        .max(zero);
    let subordinated_amortization = (cash_after_mandatory - cash_sweep)
        .max(zero)
        .min(sub_begin * assumptions.subordinated_amortization_rate)
        .max(zero);
    let total_debt_service =
        total_interest + mandatory_amortization + cash_sweep + subordinated_amortization;

    let senior_debt = (senior_begin - mandatory_amortization - cash_sweep).max(zero);
    let subordinated_debt = (sub_begin - subordinated_amortization).max(zero);
    let total_debt = senior_debt + subordinated_debt;

    let cash_flow_to_equity = cash_available - total_debt_service;
    let dividend = (cash_flow_to_equity * assumptions.dividend_payout_ratio).max(zero);
    let ending_cash = (cash_flow_to_equity - dividend).max(zero);

    let projection = YearProjection {
        year,
        period_end,
        revenue,
        growth,
        ebitda,
        ebitda_margin: ratio(ebitda, revenue),
        da,
        ebit,
        senior_interest,
        subordinated_interest,
        revolver_interest,
        total_interest,
        ebt,
        taxes,
        net_income,
        capex,
        nwc_change,
        free_cash_flow,
        beginning_cash,
        cash_available,
        mandatory_amortization,
        cash_sweep,
        subordinated_amortization,
        total_debt_service,
        cash_flow_to_equity,
        dividend,
        ending_cash,
        beginning_senior_debt: senior_begin,
        senior_debt,
        beginning_subordinated_debt: sub_begin,
        subordinated_debt,
        total_debt,
        net_debt: total_debt - ending_cash,
        leverage: ratio(total_debt, ebitda),
        interest_coverage: ratio(ebitda, total_interest),
    };

    let next = ProjectionState {
        revenue,
        senior_balance: senior_debt,
        subordinated_balance: subordinated_debt,
        cash: ending_cash,
    };

    (projection, next)
}

/// Period end of projection year `year`, `year` fiscal years after the base.
pub fn period_end_for(fiscal_year_end: Option<NaiveDate>, year: u32) -> Option<NaiveDate> {
    fiscal_year_end.and_then(|d| d.checked_add_months(Months::new(12 * year)))
}

/// Fold [`project_year`] over years 1..=N, starting from the entry balances.
pub fn project_years(
    snapshot: &CompanySnapshot,
    assumptions: &AssumptionSet,
    entry: &EntryValuation,
) -> Vec<YearProjection> {
    let opening = ProjectionState::opening(snapshot, assumptions, entry);

    (1..=assumptions.holding_period)
        .scan(opening, |state, year| {
            let period_end = period_end_for(snapshot.fiscal_year_end, year);
            let (projection, next) = project_year(state, year, assumptions, period_end);
            debug!(
                "year {year}: revenue={} ebitda={} senior={} sub={} cash={}",
                projection.revenue,
                projection.ebitda,
                projection.senior_debt,
                projection.subordinated_debt,
                projection.ending_cash
            );
            *state = next;
            Some(projection)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbo::entry::calculate_entry_valuation;
    use rust_decimal_macros::dec;

    fn snapshot() -> CompanySnapshot {
        CompanySnapshot {
            base_revenue: dec!(1000),
            base_ebitda: dec!(200),
            current_share_price: dec!(20),
            shares_outstanding: dec!(100),
            current_debt: dec!(300),
            current_cash: dec!(40),
            base_capex: None,
            fiscal_year_end: None,
        }
    }

    fn assumptions() -> AssumptionSet {
        AssumptionSet {
            holding_period: 5,
            revenue_growth: vec![dec!(0.10)],
            ebitda_margin: dec!(0.25),
            tax_rate: dec!(0.25),
            capex_pct_revenue: dec!(0.03),
            nwc_pct_revenue: dec!(0.01),
            senior_leverage: dec!(3.0),
            subordinated_leverage: dec!(1.0),
            total_leverage: dec!(4.0),
            senior_rate: dec!(0.06),
            subordinated_rate: dec!(0.10),
            revolver_size: dec!(20),
            revolver_rate: dec!(0.05),
            senior_amortization_rate: dec!(0.05),
            subordinated_amortization_rate: dec!(0.02),
            cash_sweep_rate: dec!(0.75),
            ..AssumptionSet::default()
        }
    }

    fn run() -> Vec<YearProjection> {
        let s = snapshot();
        let a = assumptions();
        let entry = calculate_entry_valuation(&s, &a);
        project_years(&s, &a, &entry)
    }

    #[test]
    fn test_single_year_operating_build() {
        let state = ProjectionState {
            revenue: dec!(1000),
            senior_balance: Decimal::ZERO,
            subordinated_balance: Decimal::ZERO,
            cash: Decimal::ZERO,
        };
        let a = assumptions();
        let (p, _) = project_year(&state, 1, &a, None);
        assert_eq!(p.revenue, dec!(1100));
        assert_eq!(p.ebitda, dec!(275));
        assert_eq!(p.da, dec!(27.5));
        assert_eq!(p.ebit, dec!(247.5));
    }

    #[test]
    fn test_interest_on_beginning_balances() {
        let state = ProjectionState {
            revenue: dec!(1000),
            senior_balance: dec!(600),
            subordinated_balance: dec!(200),
            cash: Decimal::ZERO,
        };
        let a = assumptions();
        let (p, next) = project_year(&state, 1, &a, None);
        assert_eq!(p.senior_interest, dec!(36));
        assert_eq!(p.subordinated_interest, dec!(20));
        assert_eq!(p.revolver_interest, dec!(1));
        assert_eq!(p.total_interest, dec!(57));
        // Paydown happened, but interest was not recomputed on it
        assert!(next.senior_balance < state.senior_balance);
    }

    #[test]
    fn test_waterfall_hand_calculation() {
        let state = ProjectionState {
            revenue: dec!(1000),
            senior_balance: dec!(600),
            subordinated_balance: dec!(200),
            cash: dec!(40),
        };
        let a = assumptions();
        let (p, next) = project_year(&state, 1, &a, None);

        // EBT = 247.5 - 57 = 190.5; tax = 47.625; NI = 142.875
        assert_eq!(p.ebt, dec!(190.5));
        assert_eq!(p.taxes, dec!(47.625));
        assert_eq!(p.net_income, dec!(142.875));
        // FCF = 142.875 + 27.5 - 33 - 11 = 126.375
        assert_eq!(p.free_cash_flow, dec!(126.375));
        assert_eq!(p.cash_available, dec!(166.375));

        assert_eq!(p.mandatory_amortization, dec!(30));
        // After mandatory = 166.375 - 57 - 30 = 79.375; sweep = 59.53125
        assert_eq!(p.cash_sweep, dec!(59.53125));
        // Remaining 19.84375 capped at 200 * 2% = 4
        assert_eq!(p.subordinated_amortization, dec!(4));
        assert_eq!(p.total_debt_service, dec!(150.53125));

        assert_eq!(p.senior_debt, dec!(510.46875));
        assert_eq!(p.subordinated_debt, dec!(196));
        // CFE = 166.375 - 150.53125 = 15.84375
        assert_eq!(p.cash_flow_to_equity, dec!(15.84375));
        assert_eq!(p.dividend, dec!(7.921875));
        assert_eq!(p.ending_cash, dec!(7.921875));

        assert_eq!(next.cash, p.ending_cash);
        assert_eq!(next.senior_balance, p.senior_debt);
        assert_eq!(next.subordinated_balance, p.subordinated_debt);
        assert_eq!(next.revenue, p.revenue);
    }

    #[test]
    fn test_years_chain_balances() {
        let projs = run();
        assert_eq!(projs.len(), 5);
        for pair in projs.windows(2) {
            assert_eq!(pair[1].beginning_cash, pair[0].ending_cash);
            assert_eq!(pair[1].beginning_senior_debt, pair[0].senior_debt);
            assert_eq!(pair[1].beginning_subordinated_debt, pair[0].subordinated_debt);
            assert_eq!(pair[1].year, pair[0].year + 1);
        }
    }

    #[test]
    fn test_year_one_inherits_entry() {
        let s = snapshot();
        let a = assumptions();
        let entry = calculate_entry_valuation(&s, &a);
        let projs = project_years(&s, &a, &entry);
        assert_eq!(projs[0].beginning_senior_debt, entry.sources_uses.senior_debt);
        assert_eq!(
            projs[0].beginning_subordinated_debt,
            entry.sources_uses.subordinated_debt
        );
        assert_eq!(projs[0].beginning_cash, s.current_cash);
    }

    #[test]
    fn test_zero_opening_cash_policy() {
        let s = snapshot();
        let a = AssumptionSet {
            opening_cash: OpeningCashPolicy::Zero,
            ..assumptions()
        };
        let entry = calculate_entry_valuation(&s, &a);
        let projs = project_years(&s, &a, &entry);
        assert_eq!(projs[0].beginning_cash, Decimal::ZERO);
    }

    #[test]
    fn test_balances_never_negative() {
        for p in run() {
            assert!(p.senior_debt >= Decimal::ZERO);
            assert!(p.subordinated_debt >= Decimal::ZERO);
            assert!(p.ending_cash >= Decimal::ZERO);
            assert!(p.cash_sweep <= p.beginning_senior_debt - p.mandatory_amortization);
        }
    }

    #[test]
    fn test_leverage_identity() {
        for p in run() {
            assert_eq!(
                p.leverage,
                Some((p.senior_debt + p.subordinated_debt) / p.ebitda)
            );
        }
    }

    #[test]
    fn test_zero_ebitda_metrics_not_meaningful() {
        let state = ProjectionState {
            revenue: dec!(1000),
            senior_balance: dec!(100),
            subordinated_balance: Decimal::ZERO,
            cash: Decimal::ZERO,
        };
        let a = AssumptionSet {
            ebitda_margin: Decimal::ZERO,
            ..assumptions()
        };
        let (p, next) = project_year(&state, 1, &a, None);
        assert_eq!(p.ebitda, Decimal::ZERO);
        assert_eq!(p.leverage, None);
        assert_eq!(p.interest_coverage, Some(Decimal::ZERO));
        // Loss-making year: nothing repaid, nothing negative
        assert!(p.mandatory_amortization >= Decimal::ZERO);
        assert_eq!(p.cash_sweep, Decimal::ZERO);
        assert_eq!(p.dividend, Decimal::ZERO);
        assert_eq!(next.cash, Decimal::ZERO);
        assert!(next.senior_balance <= state.senior_balance);
    }

    #[test]
    fn test_zero_interest_coverage_not_meaningful() {
        let state = ProjectionState {
            revenue: dec!(1000),
            senior_balance: Decimal::ZERO,
            subordinated_balance: Decimal::ZERO,
            cash: Decimal::ZERO,
        };
        let a = AssumptionSet {
            revolver_size: Decimal::ZERO,
            ..assumptions()
        };
        let (p, _) = project_year(&state, 1, &a, None);
        assert_eq!(p.total_interest, Decimal::ZERO);
        assert_eq!(p.interest_coverage, None);
        assert_eq!(p.leverage, Some(Decimal::ZERO));
    }

    #[test]
    fn test_period_end_dates() {
        let fye = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            period_end_for(Some(fye), 2),
            NaiveDate::from_ymd_opt(2026, 12, 31)
        );
        assert_eq!(period_end_for(None, 2), None);
    }
}
