//! Harness tests: input file in, action results and state file out.

use std::fs;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use zscaler_app::harness::{all_succeeded, run_actions, startup_failure};
use zscaler_app::{resolve_config, Overrides, StateStore, TestInput};
use zscaler_core::{
    ActionStatus, ApiRequest, Connector, GatewayError, RawResponse, Result, Sleeper, Transport,
};

/// Answers login and logout, and serves a fixed allow list.
struct FakeGateway {
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Transport for FakeGateway {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(request.describe());
        let response = match (request.method.as_str(), request.path.as_str()) {
            ("POST", "/api/v1/authenticatedSession") => {
                RawResponse::json(200, &json!({"authType": "ADMIN_LOGIN"}))
                    .with_header("set-cookie", "JSESSIONID=T1; Path=/")
            }
            ("DELETE", "/api/v1/authenticatedSession") => RawResponse::new(204, ""),
            ("GET", "/api/v1/security") => {
                RawResponse::json(200, &json!({"whitelistUrls": ["10.0.0.1"]}))
            }
            _ => RawResponse::json(404, &json!({"message": "Not found"})),
        };
        Ok(response)
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn write_input(dir: &TempDir, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("input.json");
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn input_value(identifier: &str, parameters: serde_json::Value) -> serde_json::Value {
    json!({
        "identifier": identifier,
        "config": {
            "base_url": "https://admin.zscalerbeta.net",
            "username": "admin@example.com",
            "password": "secret",
            "api_key": "abcdefghijklmnop"
        },
        "parameters": parameters
    })
}

fn connect(input: &TestInput) -> Connector {
    let config = resolve_config(None, input.config.as_ref(), &Overrides::default()).unwrap();
    Connector::initialize(&config, Box::new(FakeGateway::new()), Box::new(NoSleep)).unwrap()
}

#[test]
fn test_runs_each_parameter_set() {
    let dir = TempDir::new().unwrap();
    let path = write_input(
        &dir,
        input_value("allow_ip", json!([{"ip": "10.0.0.1"}, {"ip": "http://10.0.0.1, 10.0.0.1"}])),
    );
    let input = TestInput::load(&path).unwrap();

    let connector = connect(&input);
    let results = run_actions(&connector, &input);
    connector.finalize();

    assert_eq!(results.len(), 2);
    assert!(all_succeeded(&results));
    for result in &results {
        assert_eq!(result.message, "Allowlist contains all of these endpoints");
        assert_eq!(result.summary["ignored"], json!(["10.0.0.1"]));
    }
}

#[test]
fn test_unknown_action_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_input(&dir, input_value("format_disk", json!([{}])));
    let input = TestInput::load(&path).unwrap();

    let connector = connect(&input);
    let results = run_actions(&connector, &input);
    connector.finalize();

    assert_eq!(results[0].status, ActionStatus::Failed);
    assert!(!all_succeeded(&results));
}

#[test]
fn test_startup_failure_result() {
    let input: TestInput =
        serde_json::from_value(json!({"identifier": "test_connectivity"})).unwrap();
    let error = GatewayError::Auth("Error starting Zscaler session: Invalid credentials".into());

    let result = startup_failure(&input, &error);

    assert_eq!(result.action, "test_connectivity");
    assert_eq!(result.status, ActionStatus::Failed);
    assert!(!all_succeeded(&[result]));
    assert!(!all_succeeded(&[]));
}

#[test]
fn test_state_records_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let mut state = StateStore::load(&path);
    state.record_run("test_connectivity", true);
    state.save().unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["last_action"], "test_connectivity");
    assert!(saved["last_run_at"].is_string());
}
