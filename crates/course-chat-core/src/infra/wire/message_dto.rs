// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::history::models::MessagePage;
use crate::domain::messaging::models::{
    Attachment, CourseId, DeliveryStatus, Message, MessageId, MessageKind, Sender, SenderRole,
    TempId, UserId,
};
use crate::util::mime_serde_shim;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderDto {
    pub id: UserId,
    pub role: SenderRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    pub url: Url,
    pub name: String,
    pub size: u64,
    #[serde(with = "mime_serde_shim")]
    pub mime_type: Mime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<TempId>,
    pub course_id: CourseId,
    pub sender: SenderDto,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDto>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// Response of the history endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageDto {
    pub items: Vec<MessageDto>,
    #[serde(default)]
    pub has_more: bool,
}

impl From<SenderDto> for Sender {
    fn from(value: SenderDto) -> Self {
        Sender {
            id: value.id,
            role: value.role,
            name: value.name,
            avatar: value.avatar,
        }
    }
}

impl From<AttachmentDto> for Attachment {
    fn from(value: AttachmentDto) -> Self {
        Attachment {
            url: value.url,
            name: value.name,
            size_bytes: value.size,
            mime_type: value.mime_type,
            thumbnail_url: value.thumbnail_url,
        }
    }
}

impl From<Attachment> for AttachmentDto {
    fn from(value: Attachment) -> Self {
        AttachmentDto {
            url: value.url,
            name: value.name,
            size: value.size_bytes,
            mime_type: value.mime_type,
            thumbnail_url: value.thumbnail_url,
        }
    }
}

/// Everything the server sends us is confirmed by definition.
impl From<MessageDto> for Message {
    fn from(value: MessageDto) -> Self {
        Message {
            id: Some(value.id),
            temp_id: value.temp_id,
            course_id: value.course_id,
            sender: value.sender.into(),
            kind: value.kind,
            content: value.content,
            attachment: value.attachment.map(Into::into),
            created_at: value.created_at,
            edited_at: value.edited_at,
            delivery_status: DeliveryStatus::Confirmed,
            update_status: None,
            delete_status: None,
            send_error: None,
        }
    }
}

impl From<MessagePageDto> for MessagePage {
    fn from(value: MessagePageDto) -> Self {
        MessagePage {
            messages: value.items.into_iter().map(Into::into).collect(),
            has_more: value.has_more,
        }
    }
}
