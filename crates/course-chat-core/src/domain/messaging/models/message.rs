// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use url::Url;

use crate::domain::sending::models::SendError;

use super::{Attachment, CourseId, MessageId, MessageKey, TempId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderRole {
    Student,
    Instructor,
    Assistant,
    Admin,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: UserId,
    pub role: SenderRole,
    pub name: Option<String>,
    pub avatar: Option<Url>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Confirmed,
    Error,
}

/// Transient UI-facing flag set while an edit or delete request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationStatus {
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Option<MessageId>,
    pub temp_id: Option<TempId>,
    pub course_id: CourseId,
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    /// Server-assigned once confirmed, client-assigned and provisional before.
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub delivery_status: DeliveryStatus,
    pub update_status: Option<MutationStatus>,
    pub delete_status: Option<MutationStatus>,
    /// Reason of the last failed delivery, set iff `delivery_status` is `Error`.
    pub send_error: Option<SendError>,
}

/// The editable part of a confirmed message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRevision {
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// An edit pushed by the server for a message identified by its server id.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEdit {
    pub id: MessageId,
    pub revision: MessageRevision,
}

impl Message {
    pub fn key(&self) -> Option<MessageKey> {
        match (&self.id, &self.temp_id) {
            (Some(id), _) => Some(MessageKey::Server(id.clone())),
            (None, Some(temp_id)) => Some(MessageKey::Local(temp_id.clone())),
            (None, None) => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.delivery_status == DeliveryStatus::Confirmed
    }

    pub fn is_mutation_in_flight(&self) -> bool {
        self.update_status.is_some() || self.delete_status.is_some()
    }

    pub fn revision(&self) -> MessageRevision {
        MessageRevision {
            content: self.content.clone(),
            attachment: self.attachment.clone(),
            edited_at: self.edited_at,
        }
    }

    pub fn apply_revision(&mut self, revision: MessageRevision) {
        self.content = revision.content;
        self.attachment = revision.attachment;
        self.edited_at = revision.edited_at;
    }

    /// Folds another confirmed representation of the same message into `self`, keeping the
    /// richer of the two. Identity, sender, kind and `created_at` of `self` are never touched.
    ///
    /// Returns `true` if anything changed.
    pub(crate) fn merge_confirmed(&mut self, other: Message) -> bool {
        let before = self.clone();
        let other_thumbnail = other
            .attachment
            .as_ref()
            .and_then(|a| a.thumbnail_url.clone().map(|thumbnail| (a.url.clone(), thumbnail)));

        if other.edited_at > self.edited_at {
            self.content = other.content;
            self.attachment = other.attachment;
            self.edited_at = other.edited_at;
        } else if self.attachment.is_none() && other.attachment.is_some() {
            self.attachment = other.attachment;
        }

        if self.temp_id.is_none() {
            self.temp_id = other.temp_id;
        }
        if self.sender.name.is_none() {
            self.sender.name = other.sender.name;
        }
        if self.sender.avatar.is_none() {
            self.sender.avatar = other.sender.avatar;
        }
        if let (Some(attachment), Some((url, thumbnail))) =
            (self.attachment.as_mut(), other_thumbnail)
        {
            if attachment.thumbnail_url.is_none() && attachment.url == url {
                attachment.thumbnail_url = Some(thumbnail);
            }
        }

        *self != before
    }
}
