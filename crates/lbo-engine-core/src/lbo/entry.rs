use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lbo::assumptions::{AssumptionSet, CompanySnapshot};
use crate::types::*;

/// Sources & uses of funds at close. Sponsor equity is the plug, so the two
/// totals agree by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesAndUses {
    pub senior_debt: Money,
    pub subordinated_debt: Money,
    /// Revolver drawn at close (the full facility)
    pub revolver: Money,
    /// Balancing figure; zero or negative when debt capacity exceeds uses
    pub sponsor_equity: Money,
    /// All sources of funds
    pub sources: Vec<(String, Money)>,
    /// All uses of funds
    pub uses: Vec<(String, Money)>,
    pub total_sources: Money,
    pub total_uses: Money,
    /// Whether sources equal uses
    pub balanced: bool,
}

/// Entry valuation of the target at the assumed purchase multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryValuation {
    pub entry_multiple: Multiple,
    pub enterprise_value: Money,
    pub equity_value: Money,
    /// Equity value per share; null when shares outstanding is not positive
    pub implied_share_price: Metric,
    /// Implied price over current price, minus one
    pub implied_premium: Metric,
    pub transaction_fees: Money,
    pub total_equity_required: Money,
    pub sources_uses: SourcesAndUses,
}

/// Headline deal figures at a given entry multiple. Shared with the
/// sensitivity grid, which re-prices the deal at candidate multiples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DealPricing {
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub transaction_fees: Money,
    pub senior_debt: Money,
    pub subordinated_debt: Money,
    pub revolver: Money,
    pub total_uses: Money,
    pub sponsor_equity: Money,
}

pub(crate) fn price_deal(
    snapshot: &CompanySnapshot,
    assumptions: &AssumptionSet,
    entry_multiple: Multiple,
) -> DealPricing {
    let enterprise_value = snapshot.base_ebitda * entry_multiple;
    let equity_value = enterprise_value - snapshot.current_debt + snapshot.current_cash;
    let transaction_fees = equity_value * assumptions.transaction_fee_rate;

    let senior_debt = snapshot.base_ebitda * assumptions.senior_leverage;
    let subordinated_debt = snapshot.base_ebitda * assumptions.subordinated_leverage;
    let revolver = assumptions.revolver_size;

    // Purchase price plus fees, refinancing existing debt net of acquired cash
    let total_uses =
        enterprise_value + transaction_fees + snapshot.current_debt - snapshot.current_cash;
    let sponsor_equity = total_uses - (senior_debt + subordinated_debt + revolver);

    DealPricing {
        enterprise_value,
        equity_value,
        transaction_fees,
        senior_debt,
        subordinated_debt,
        revolver,
        total_uses,
        sponsor_equity,
    }
}

/// Value the target at the entry multiple and size the financing.
///
/// Never fails: a non-positive share count or share price leaves the
/// per-share figures as `None`, and a non-positive sponsor equity is passed
/// through for downstream metrics to flag.
pub fn calculate_entry_valuation(
    snapshot: &CompanySnapshot,
    assumptions: &AssumptionSet,
) -> EntryValuation {
    let deal = price_deal(snapshot, assumptions, assumptions.entry_multiple);

    let implied_share_price = if snapshot.shares_outstanding > Decimal::ZERO {
        ratio(deal.equity_value, snapshot.shares_outstanding)
    } else {
        None
    };
    let implied_premium = match implied_share_price {
        Some(price) if snapshot.current_share_price > Decimal::ZERO => {
            ratio(price, snapshot.current_share_price).map(|r| r - Decimal::ONE)
        }
        _ => None,
    };

    let sources = vec![
        ("Senior Debt".to_string(), deal.senior_debt),
        ("Subordinated Debt".to_string(), deal.subordinated_debt),
        ("Revolver Draw".to_string(), deal.revolver),
        ("Sponsor Equity".to_string(), deal.sponsor_equity),
    ];
    let uses = vec![
        ("Purchase Enterprise Value".to_string(), deal.enterprise_value),
        ("Transaction Fees".to_string(), deal.transaction_fees),
        ("Refinance Existing Debt".to_string(), snapshot.current_debt),
        ("Less: Target Cash".to_string(), -snapshot.current_cash),
    ];

    let total_sources: Money = sources.iter().map(|(_, v)| *v).sum();
    let total_uses: Money = uses.iter().map(|(_, v)| *v).sum();
    let balanced = total_sources == total_uses;

    EntryValuation {
        entry_multiple: assumptions.entry_multiple,
        enterprise_value: deal.enterprise_value,
        equity_value: deal.equity_value,
        implied_share_price,
        implied_premium,
        transaction_fees: deal.transaction_fees,
        total_equity_required: deal.sponsor_equity,
        sources_uses: SourcesAndUses {
            senior_debt: deal.senior_debt,
            subordinated_debt: deal.subordinated_debt,
            revolver: deal.revolver,
            sponsor_equity: deal.sponsor_equity,
            sources,
            uses,
            total_sources,
            total_uses,
            balanced,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> CompanySnapshot {
        CompanySnapshot {
            base_revenue: dec!(400),
            base_ebitda: dec!(100),
            current_share_price: dec!(10),
            shares_outstanding: dec!(100),
            current_debt: dec!(200),
            current_cash: dec!(50),
            base_capex: None,
            fiscal_year_end: None,
        }
    }

    fn assumptions() -> AssumptionSet {
        AssumptionSet {
            entry_multiple: dec!(12.0),
            transaction_fee_rate: dec!(0.02),
            senior_leverage: dec!(4.0),
            subordinated_leverage: dec!(1.5),
            revolver_size: dec!(50),
            ..AssumptionSet::default()
        }
    }

    #[test]
    fn test_enterprise_and_equity_value() {
        let ev = calculate_entry_valuation(&snapshot(), &assumptions());
        assert_eq!(ev.enterprise_value, dec!(1200));
        assert_eq!(ev.equity_value, dec!(1050));
    }

    #[test]
    fn test_implied_share_price_and_premium() {
        let ev = calculate_entry_valuation(&snapshot(), &assumptions());
        assert_eq!(ev.implied_share_price, Some(dec!(10.5)));
        assert_eq!(ev.implied_premium, Some(dec!(0.05)));
    }

    #[test]
    fn test_debt_sizing_and_plug() {
        let ev = calculate_entry_valuation(&snapshot(), &assumptions());
        let su = &ev.sources_uses;
        assert_eq!(ev.transaction_fees, dec!(21));
        assert_eq!(su.senior_debt, dec!(400));
        assert_eq!(su.subordinated_debt, dec!(150));
        assert_eq!(su.revolver, dec!(50));
        // Uses: 1200 + 21 + 200 - 50 = 1371; equity = 1371 - 600
        assert_eq!(su.total_uses, dec!(1371));
        assert_eq!(su.sponsor_equity, dec!(771));
        assert_eq!(ev.total_equity_required, su.sponsor_equity);
    }

    #[test]
    fn test_sources_equal_uses() {
        let ev = calculate_entry_valuation(&snapshot(), &assumptions());
        assert_eq!(ev.sources_uses.total_sources, ev.sources_uses.total_uses);
        assert!(ev.sources_uses.balanced);
    }

    #[test]
    fn test_zero_shares_is_not_meaningful() {
        let mut s = snapshot();
        s.shares_outstanding = Decimal::ZERO;
        let ev = calculate_entry_valuation(&s, &assumptions());
        assert_eq!(ev.implied_share_price, None);
        assert_eq!(ev.implied_premium, None);
    }

    #[test]
    fn test_zero_share_price_has_no_premium() {
        let mut s = snapshot();
        s.current_share_price = Decimal::ZERO;
        let ev = calculate_entry_valuation(&s, &assumptions());
        assert!(ev.implied_share_price.is_some());
        assert_eq!(ev.implied_premium, None);
    }

    #[test]
    fn test_negative_sponsor_equity_still_balances() {
        let a = AssumptionSet {
            senior_leverage: dec!(20),
            ..assumptions()
        };
        let ev = calculate_entry_valuation(&snapshot(), &a);
        assert!(ev.sources_uses.sponsor_equity < Decimal::ZERO);
        assert!(ev.sources_uses.balanced);
    }

    #[test]
    fn test_sources_labels() {
        let ev = calculate_entry_valuation(&snapshot(), &assumptions());
        let names: Vec<&str> = ev
            .sources_uses
            .sources
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Senior Debt", "Subordinated Debt", "Revolver Draw", "Sponsor Equity"]
        );
    }
}
