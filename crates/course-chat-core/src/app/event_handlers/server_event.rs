// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::connection::models::{ConnectionStatus, TransportError};
use crate::domain::messaging::models::ThreadEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Events pushed by the server for the active thread.
    Thread(ThreadEvent),
    /// Events about the push channel itself.
    Session(SessionEvent),
    /// Emitted periodically to demote sends that waited too long.
    TimeoutCheck,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged {
        status: ConnectionStatus,
        error: Option<TransportError>,
    },
    /// The connection was re-established after it dropped or after an explicit `reconnect`.
    Reconnected,
}
