// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};

use super::{CourseId, Message, MessageEdit, MessageId, TempId};

/// A decoded event pushed by the server for one course thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEvent {
    pub course_id: CourseId,
    pub timestamp: DateTime<Utc>,
    pub payload: ThreadEventPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadEventPayload {
    NewMessage(Message),
    MessageEdited(MessageEdit),
    MessageDeleted { id: MessageId },
    DeliveryAck(DeliveryAck),
    DeliveryError { temp_id: TempId, reason: String },
    Presence(serde_json::Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryAck {
    pub temp_id: TempId,
    pub status: AckStatus,
    /// The final confirmed representation, if the server included it.
    pub message: Option<Message>,
    pub message_id: Option<MessageId>,
    pub reason: Option<String>,
}
