//! Runs a test input against a connector.

use tracing::info;
use zscaler_core::{ActionResult, Connector, GatewayError, Parameters};

use crate::input::TestInput;

/// Runs the input's action once per parameter set.
pub fn run_actions(connector: &Connector, input: &TestInput) -> Vec<ActionResult> {
    let results: Vec<ActionResult> = input
        .parameter_sets()
        .iter()
        .map(|params| connector.run_identifier(&input.identifier, params))
        .collect();

    info!(
        action = %input.identifier,
        runs = results.len(),
        failed = results.iter().filter(|r| !r.is_success()).count(),
        "Actions complete"
    );
    results
}

/// Result reported when the connector could not start.
pub fn startup_failure(input: &TestInput, error: &GatewayError) -> ActionResult {
    ActionResult::failure(&input.identifier, Parameters::new(), error)
}

/// True if every result succeeded.
pub fn all_succeeded(results: &[ActionResult]) -> bool {
    !results.is_empty() && results.iter().all(ActionResult::is_success)
}
