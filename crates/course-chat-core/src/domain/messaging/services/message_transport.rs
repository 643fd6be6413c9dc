// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;

use crate::domain::connection::models::{ConnectParams, ConnectionStatus, TransportError};
use crate::domain::messaging::models::OutboundMessage;

/// The push channel of the active thread.
///
/// Inbound events and status changes are not returned from these methods. They are delivered
/// asynchronously to the event handlers of the client.
#[async_trait]
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait MessageTransport: Send + Sync {
    /// Tears down any existing connection and connects to the thread given in `params`.
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError>;
    /// Connects again with the parameters of the last `connect` call.
    async fn reconnect(&self) -> Result<(), TransportError>;
    fn disconnect(&self);

    /// Fire-and-forget. The outcome arrives as a delivery ack or error correlated by temp id.
    fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;
    fn status(&self) -> ConnectionStatus;
}
