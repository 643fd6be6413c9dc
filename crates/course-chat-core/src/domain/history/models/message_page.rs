// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};

use crate::domain::messaging::models::{Message, MessageId};

/// Position of the oldest loaded message. Pages are requested strictly before it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub message_id: MessageId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}
