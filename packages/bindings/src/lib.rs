use napi::Result as NapiResult;
use napi_derive::napi;

use lbo_engine_core::lbo::{self, entry, AssumptionSet, CompanySnapshot, LboRunInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_run_input(input_json: &str) -> NapiResult<LboRunInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Leveraged buyout
// ---------------------------------------------------------------------------

/// Full model run. Input: `{ "snapshot": {...}, "assumptions": {...} }`.
#[napi]
pub fn run_lbo(input_json: String) -> NapiResult<String> {
    let input = parse_run_input(&input_json)?;
    let output = lbo::run_lbo_input(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn entry_valuation(input_json: String) -> NapiResult<String> {
    let input = parse_run_input(&input_json)?;
    lbo::assumptions::validate(&input.assumptions).map_err(to_napi_error)?;
    let valuation = entry::calculate_entry_valuation(&input.snapshot, &input.assumptions);
    serde_json::to_string(&valuation).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    let input = parse_run_input(&input_json)?;
    let output = lbo::run_lbo_input(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output.result.sensitivity_grid).map_err(to_napi_error)
}

/// Assumptions seeded from a company snapshot's observed margins.
#[napi]
pub fn default_assumptions(snapshot_json: String) -> NapiResult<String> {
    let snapshot: CompanySnapshot = serde_json::from_str(&snapshot_json).map_err(to_napi_error)?;
    let assumptions = AssumptionSet::seeded_from(&snapshot);
    serde_json::to_string(&assumptions).map_err(to_napi_error)
}
