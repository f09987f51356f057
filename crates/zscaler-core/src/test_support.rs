//! Scripted transport and recording sleeper for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{GatewayError, Result};
use crate::retry::Sleeper;
use crate::transport::{ApiRequest, RawResponse, Transport};

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<RawResponse>>,
    requests: Vec<ApiRequest>,
}

/// Answers requests from a queue and records what was sent.
///
/// Clones share the same script, so a test can keep one handle while the
/// executor owns another.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push(&self, response: RawResponse) {
        self.script.lock().unwrap().responses.push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .responses
            .push_back(Err(GatewayError::Connectivity(message.to_string())));
    }

    /// Requests sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().responses.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script.responses.pop_front().unwrap_or_else(|| {
            Err(GatewayError::Connectivity(format!(
                "no scripted response for {}",
                request.describe()
            )))
        })
    }
}

/// Records requested sleeps instead of blocking.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
