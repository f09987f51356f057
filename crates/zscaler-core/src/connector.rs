//! One connector run: login, actions, logout.

use tracing::info;

use crate::actions::{ActionId, ActionResult, Parameters};
use crate::client::GatewayClient;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::retry::{Sleeper, ThreadSleeper};
use crate::session::Session;
use crate::transport::{HttpTransport, Transport};

/// A logged-in connector. Actions run sequentially against one session.
pub struct Connector {
    client: GatewayClient,
}

impl Connector {
    /// Validates `config` and logs in. A failed login aborts the run.
    pub fn initialize(
        config: &GatewayConfig,
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
    ) -> Result<Self> {
        config.validate()?;

        let mut client = GatewayClient::with_parts(transport, sleeper, config.retry_policy());
        client.login(config)?;

        Ok(Self { client })
    }

    /// Connects over HTTP with real sleeps between retries.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::initialize(config, Box::new(transport), Box::new(ThreadSleeper))
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn session(&self) -> Option<&Session> {
        self.client.session()
    }

    /// Runs one action.
    pub fn run(&self, action: ActionId, params: &Parameters) -> ActionResult {
        action.handle(&self.client, params)
    }

    /// Runs an action by host identifier; unknown identifiers fail the action.
    pub fn run_identifier(&self, identifier: &str, params: &Parameters) -> ActionResult {
        match identifier.parse::<ActionId>() {
            Ok(action) => self.run(action, params),
            Err(e) => ActionResult::failure(identifier, params.clone(), &e),
        }
    }

    /// Logs out. Never fails.
    pub fn finalize(mut self) {
        self.client.logout();
        info!("Connector run finished");
    }
}
