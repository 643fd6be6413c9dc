// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;

use crate::domain::connection::models::{ConnectParams, TransportError};
use crate::domain::messaging::models::{OutboundMessage, ThreadEvent};

pub type ConnectionEventHandler = Box<dyn Fn(ConnectionEvent) + Send + Sync>;

/// Opens one authenticated push-channel connection for a course thread.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        params: &ConnectParams,
        event_handler: ConnectionEventHandler,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Disconnected { error: Option<TransportError> },
    Event(ThreadEvent),
    /// The server answered a heartbeat.
    Pong,
    PingTimer,
}

/// Frames the client writes to an established connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Message(OutboundMessage),
    Heartbeat,
}

pub trait Connection: Send + Sync {
    fn send(&self, frame: ClientFrame) -> Result<(), TransportError>;
    fn disconnect(&self);
}
