// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use secrecy::ExposeSecret;
use serde::Serialize;

use crate::domain::connection::models::ConnectParams;
use crate::domain::connection::services::ClientFrame;
use crate::domain::messaging::models::{CourseId, MessageKind, OutboundMessage, TempId};

use super::{AttachmentDto, WireError};

/// A text frame sent to the server.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientFrameDto<'a> {
    #[serde(rename_all = "camelCase")]
    Auth {
        course_id: &'a CourseId,
        access_token: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        temp_id: TempId,
        course_id: CourseId,
        kind: MessageKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        attachment_ref: Option<AttachmentDto>,
    },
    Ping,
}

impl<'a> ClientFrameDto<'a> {
    pub fn auth(params: &'a ConnectParams) -> Self {
        ClientFrameDto::Auth {
            course_id: &params.course_id,
            access_token: params.access_token.expose_secret(),
        }
    }
}

impl From<OutboundMessage> for ClientFrameDto<'_> {
    fn from(value: OutboundMessage) -> Self {
        ClientFrameDto::SendMessage {
            temp_id: value.temp_id,
            course_id: value.course_id,
            kind: value.kind,
            content: value.content,
            attachment_ref: value.attachment.map(Into::into),
        }
    }
}

impl From<ClientFrame> for ClientFrameDto<'_> {
    fn from(value: ClientFrame) -> Self {
        match value {
            ClientFrame::Message(message) => message.into(),
            ClientFrame::Heartbeat => ClientFrameDto::Ping,
        }
    }
}

pub fn encode_client_frame(frame: &ClientFrameDto) -> Result<String, WireError> {
    Ok(serde_json::to_string(frame)?)
}
