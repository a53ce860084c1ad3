//! Leveraged buyout model: entry valuation, a year-by-year debt and cash
//! waterfall, exit returns, the sponsor cash-flow schedule and an entry/exit
//! multiple sensitivity grid.

pub mod assumptions;
pub mod cash_flows;
pub mod engine;
pub mod entry;
pub mod exit;
pub mod projection;
pub mod sensitivity;

pub use assumptions::{AssumptionSet, CompanySnapshot, OpeningCashPolicy, SensitivityRange};
pub use engine::{run_lbo, run_lbo_input, LboRunInput, LboRunOutput};
