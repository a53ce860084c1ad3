use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LboError;
use crate::types::{Money, Rate};
use crate::LboResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of annual cash flows (index 0 undiscounted)
pub fn npv(rate: Rate, cash_flows: &[Money]) -> LboResult<Money> {
    if rate <= dec!(-1) {
        return Err(LboError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                LboError::FinancialImpossibility(format!(
                    "NPV discount factor overflowed at period {t}"
                ))
            })?;
        }
        if discount.is_zero() {
            return Err(LboError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| {
                LboError::FinancialImpossibility(format!("NPV overflowed at period {t}"))
            })?;
    }

    Ok(result)
}

/// NPV and its first derivative at `rate`, or `None` if any term leaves the
/// Decimal range.
fn npv_with_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        let t_dec = Decimal::from(t as i64);
        let discount = one_plus_r.checked_powd(t_dec)?;
        if discount.is_zero() {
            continue;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next = discount.checked_mul(one_plus_r)?;
            if next.is_zero() {
                continue;
            }
            let term = t_dec.checked_mul(*cf)?.checked_div(next)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv_val, dnpv))
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Overflow anywhere in an iteration (long horizons near the -99% or +10000%
/// clamps) is reported as a convergence failure, never a panic.
pub fn irr(cash_flows: &[Money], guess: Rate) -> LboResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(LboError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    // Without a sign change there is no rate at which NPV crosses zero.
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_inflow || !has_outflow {
        return Err(LboError::InsufficientData(
            "IRR requires at least one inflow and one outflow".into(),
        ));
    }

    let overflowed = |iterations: u32| LboError::ConvergenceFailure {
        function: "IRR".into(),
        iterations,
        last_delta: Decimal::MAX,
    };

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) =
            npv_with_derivative(cash_flows, rate).ok_or_else(|| overflowed(i))?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(LboError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        rate = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| overflowed(i))?;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(LboError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// Closed-form annualised return implied by a multiple over `years`:
/// `multiple^(1/years) - 1`.
///
/// Returns `None` when no real root exists (negative multiple) or `years` is
/// zero; a zero multiple is a total loss, i.e. -100%.
pub fn annualised_return(multiple: Decimal, years: u32) -> Option<Rate> {
    if years == 0 || multiple < Decimal::ZERO {
        return None;
    }
    if multiple.is_zero() {
        return Some(dec!(-1));
    }
    if years == 1 {
        return Some(multiple - Decimal::ONE);
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    multiple
        .checked_powd(exponent)
        .map(|root| root - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_no_sign_change() {
        let cfs = vec![dec!(100), dec!(50), dec!(50)];
        assert!(irr(&cfs, dec!(0.10)).is_err());
    }

    #[test]
    fn test_irr_long_horizon_near_total_loss_does_not_panic() {
        // Solver is driven to the -99% clamp where 1/0.01^t leaves the Decimal range
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(Decimal::ZERO).take(18));
        cfs.push(dec!(0.001));
        match irr(&cfs, dec!(0.10)) {
            Ok(r) => assert!(r >= dec!(-0.99) && r <= dec!(100)),
            Err(e) => assert!(matches!(e, LboError::ConvergenceFailure { .. })),
        }
    }

    #[test]
    fn test_irr_very_long_schedule_does_not_panic() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(5)).take(799));
        cfs.push(dec!(50));
        let result = irr(&cfs, dec!(0.10));
        if let Ok(r) = result {
            assert!(r >= dec!(-0.99) && r <= dec!(100));
        }
    }

    #[test]
    fn test_npv_overflow_is_error() {
        let mut cfs = vec![Decimal::MAX];
        cfs.extend(std::iter::repeat(Decimal::MAX).take(20));
        assert!(npv(dec!(-0.99), &cfs).is_err());
    }

    #[test]
    fn test_annualised_return_doubling() {
        // 2x over 5 years ≈ 14.87%
        let r = annualised_return(dec!(2), 5).unwrap();
        assert!((r - dec!(0.1487)).abs() < dec!(0.0001), "got {r}");
    }

    #[test]
    fn test_annualised_return_single_year_is_exact() {
        assert_eq!(annualised_return(dec!(1.25), 1), Some(dec!(0.25)));
    }

    #[test]
    fn test_annualised_return_edges() {
        assert_eq!(annualised_return(Decimal::ZERO, 5), Some(dec!(-1)));
        assert_eq!(annualised_return(dec!(-0.5), 5), None);
        assert_eq!(annualised_return(dec!(2), 0), None);
    }
}
