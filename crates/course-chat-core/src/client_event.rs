// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::connection::models::{ConnectionStatus, TransportError};
use crate::domain::messaging::models::{CourseId, MessageKey};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The status of the push channel has changed. `error` is set when the connection dropped
    /// or when reconnecting was given up.
    ConnectionStatusChanged {
        status: ConnectionStatus,
        error: Option<TransportError>,
    },

    /// The feed of the active course thread changed.
    FeedChanged {
        course_id: CourseId,
        r#type: FeedEventType,
    },

    /// A presence update was received. The payload is forwarded as is.
    PresenceChanged {
        course_id: CourseId,
        payload: serde_json::Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEventType {
    /// One or many messages were either received, loaded or sent.
    MessagesAppended { keys: Vec<MessageKey> },

    /// Messages changed in place (confirmation, edit, delivery failure).
    MessagesUpdated { keys: Vec<MessageKey> },

    /// Messages were removed, or replaced by an entry with a different key.
    MessagesDeleted { keys: Vec<MessageKey> },

    /// The feed was reset or caught up after a reconnect and should be rendered from scratch.
    MessagesNeedReload,
}
