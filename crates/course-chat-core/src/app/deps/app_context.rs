// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use anyhow::Result;
use parking_lot::RwLock;

use crate::domain::connection::models::{
    BackoffPolicy, ConnectionStatus, Credentials, TransportError,
};
use crate::domain::messaging::models::Sender;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The number of messages to request per history page.
    pub page_size: u32,
    /// How long a sent message may stay pending without an ack, error or echo.
    pub send_timeout: Duration,
    /// How long to wait for the echo of a message that was acked without its payload.
    pub echo_timeout: Duration,
    /// Sends that are older than this when the connection comes back are considered stale.
    pub reconnect_grace_window: Duration,
    /// How often a stale send is put on the wire again before it is surfaced as failed.
    pub max_resends: u32,
    pub backoff: BackoffPolicy,
    pub heartbeat_interval: Duration,
    pub timeout_check_interval: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            send_timeout: Duration::from_secs(15),
            echo_timeout: Duration::from_secs(10),
            reconnect_grace_window: Duration::from_secs(5),
            max_resends: 1,
            backoff: BackoffPolicy::default(),
            heartbeat_interval: Duration::from_secs(30),
            timeout_check_interval: Duration::from_secs(1),
        }
    }
}

pub struct AppContext {
    pub config: ChatConfig,
    credentials: RwLock<Option<Credentials>>,
    connection_status: RwLock<ConnectionStatus>,
    ws_error: RwLock<Option<TransportError>>,
}

impl AppContext {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            credentials: Default::default(),
            connection_status: Default::default(),
            ws_error: Default::default(),
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl AppContext {
    pub fn set_credentials(&self, credentials: Credentials) {
        self.credentials.write().replace(credentials);
    }

    pub fn reset_credentials(&self) {
        self.credentials.write().take();
    }

    pub fn current_user(&self) -> Result<Sender> {
        self.credentials
            .read()
            .as_ref()
            .map(|credentials| credentials.user.clone())
            .ok_or(anyhow::anyhow!(
                "Failed to read the current user since no course thread was opened."
            ))
    }

    pub fn credentials<T>(&self, f: impl FnOnce(&Credentials) -> T) -> Result<T> {
        self.credentials
            .read()
            .as_ref()
            .map(f)
            .ok_or(anyhow::anyhow!("No credentials were provided."))
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    /// Records a status change. A successful connect clears the last error, giving up after
    /// retries stores it until then.
    pub fn set_connection_status(&self, status: ConnectionStatus, error: Option<TransportError>) {
        *self.connection_status.write() = status;

        match status {
            ConnectionStatus::Connected => {
                self.ws_error.write().take();
            }
            ConnectionStatus::Disconnected => {
                if let Some(error) = error {
                    self.ws_error.write().replace(error);
                }
            }
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => (),
        }
    }

    pub fn ws_error(&self) -> Option<TransportError> {
        self.ws_error.read().clone()
    }
}
