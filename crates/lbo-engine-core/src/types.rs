use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 12.0x EV/EBITDA)
pub type Multiple = Decimal;

/// A derived figure that may be "not meaningful" (division by zero, no real
/// root, non-positive denominator). `None` serializes as JSON `null`.
pub type Metric = Option<Decimal>;

/// Sensitivity variable specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Checked division: `None` when the denominator is zero or the quotient
/// overflows.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Metric {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_basic() {
        assert_eq!(ratio(dec!(275), dec!(100)), Some(dec!(2.75)));
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(dec!(1), Decimal::ZERO), None);
    }

    #[test]
    fn test_ratio_overflow_is_not_meaningful() {
        assert_eq!(ratio(Decimal::MAX, dec!(0.0000001)), None);
    }
}
