// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::sending::models::SendError;

use super::{Attachment, CourseId, MessageKind, TempId};

/// What the user typed or picked, before it becomes a message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub kind: MessageKind,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
}

impl MessageDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Text,
            content: Some(content.into()),
            attachment: None,
        }
    }

    pub fn file(attachment: Attachment) -> Self {
        Self {
            kind: MessageKind::File,
            content: None,
            attachment: Some(attachment),
        }
    }

    /// Local preconditions that must hold before anything is sent.
    pub fn validate(&self) -> Result<(), SendError> {
        match self.kind {
            MessageKind::Text => {
                let is_blank = self
                    .content
                    .as_deref()
                    .map(|content| content.trim().is_empty())
                    .unwrap_or(true);
                if is_blank {
                    return Err(SendError::EmptyContent);
                }
            }
            MessageKind::File => {
                if self.attachment.is_none() {
                    return Err(SendError::MissingAttachment);
                }
            }
        }
        Ok(())
    }
}

/// The payload handed to the transport for a submitted draft.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub temp_id: TempId,
    pub course_id: CourseId,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
}

impl OutboundMessage {
    pub fn new(temp_id: TempId, course_id: CourseId, draft: &MessageDraft) -> Self {
        Self {
            temp_id,
            course_id,
            kind: draft.kind,
            content: draft.content.clone(),
            attachment: draft.attachment.clone(),
        }
    }
}
