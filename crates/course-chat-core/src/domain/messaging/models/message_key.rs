// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Display, Formatter};

use super::{MessageId, TempId};

/// Identity of an entry in the feed. A message is keyed by its server id as soon as it is known,
/// and by its temp id before that.
///
/// The derived ordering places confirmed keys before local ones, which is the tie-breaker used
/// when two messages share a `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    Server(MessageId),
    Local(TempId),
}

impl MessageKey {
    pub fn server_id(&self) -> Option<&MessageId> {
        match self {
            MessageKey::Server(id) => Some(id),
            MessageKey::Local(_) => None,
        }
    }

    pub fn temp_id(&self) -> Option<&TempId> {
        match self {
            MessageKey::Server(_) => None,
            MessageKey::Local(temp_id) => Some(temp_id),
        }
    }
}

impl From<MessageId> for MessageKey {
    fn from(value: MessageId) -> Self {
        MessageKey::Server(value)
    }
}

impl From<TempId> for MessageKey {
    fn from(value: TempId) -> Self {
        MessageKey::Local(value)
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKey::Server(id) => write!(f, "id:{id}"),
            MessageKey::Local(temp_id) => write!(f, "temp:{temp_id}"),
        }
    }
}
