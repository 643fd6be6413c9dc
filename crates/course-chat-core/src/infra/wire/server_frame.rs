// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::messaging::models::{
    AckStatus, CourseId, DeliveryAck, MessageEdit, MessageId, MessageRevision, TempId,
    ThreadEvent, ThreadEventPayload,
};

use super::{AttachmentDto, MessageDto, WireError};

/// A decoded text frame received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Event(ThreadEvent),
    AuthOk,
    AuthError { reason: String },
    Pong,
    /// A frame type this client does not know. Skipped by the caller.
    Unknown { frame_type: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    r#type: String,
    course_id: Option<CourseId>,
    #[serde(default)]
    payload: Value,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageEditedDto {
    id: MessageId,
    content: Option<String>,
    attachment: Option<AttachmentDto>,
    edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MessageDeletedDto {
    id: MessageId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum AckStatusDto {
    #[default]
    Accepted,
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryAckDto {
    temp_id: TempId,
    #[serde(default)]
    status: AckStatusDto,
    message: Option<MessageDto>,
    message_id: Option<MessageId>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryErrorDto {
    temp_id: TempId,
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorDto {
    reason: Option<String>,
}

pub fn decode_server_frame(text: &str) -> Result<ServerFrame, WireError> {
    let envelope = serde_json::from_str::<Envelope>(text)?;

    let payload = match envelope.r#type.as_str() {
        "AUTH_OK" => return Ok(ServerFrame::AuthOk),
        "AUTH_ERROR" => {
            let dto = serde_json::from_value::<AuthErrorDto>(envelope.payload).unwrap_or_default();
            return Ok(ServerFrame::AuthError {
                reason: dto
                    .reason
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            });
        }
        "PONG" => return Ok(ServerFrame::Pong),
        "NEW_MESSAGE" => ThreadEventPayload::NewMessage(
            serde_json::from_value::<MessageDto>(envelope.payload)?.into(),
        ),
        "MESSAGE_EDITED" => {
            let dto = serde_json::from_value::<MessageEditedDto>(envelope.payload)?;
            ThreadEventPayload::MessageEdited(MessageEdit {
                id: dto.id,
                revision: MessageRevision {
                    content: dto.content,
                    attachment: dto.attachment.map(Into::into),
                    edited_at: dto.edited_at,
                },
            })
        }
        "MESSAGE_DELETED" => ThreadEventPayload::MessageDeleted {
            id: serde_json::from_value::<MessageDeletedDto>(envelope.payload)?.id,
        },
        "DELIVERY_ACK" => {
            let dto = serde_json::from_value::<DeliveryAckDto>(envelope.payload)?;
            ThreadEventPayload::DeliveryAck(DeliveryAck {
                temp_id: dto.temp_id,
                status: match dto.status {
                    AckStatusDto::Accepted => AckStatus::Accepted,
                    AckStatusDto::Rejected => AckStatus::Rejected,
                },
                message: dto.message.map(Into::into),
                message_id: dto.message_id,
                reason: dto.reason,
            })
        }
        "DELIVERY_ERROR" => {
            let dto = serde_json::from_value::<DeliveryErrorDto>(envelope.payload)?;
            ThreadEventPayload::DeliveryError {
                temp_id: dto.temp_id,
                reason: dto.reason.unwrap_or_else(|| "Unknown error".to_string()),
            }
        }
        "PRESENCE" => ThreadEventPayload::Presence(envelope.payload),
        _ => {
            return Ok(ServerFrame::Unknown {
                frame_type: envelope.r#type,
            })
        }
    };

    let Some(course_id) = envelope.course_id else {
        return Err(WireError::MissingField {
            frame_type: envelope.r#type,
            field: "courseId",
        });
    };
    let Some(timestamp) = envelope.timestamp else {
        return Err(WireError::MissingField {
            frame_type: envelope.r#type,
            field: "timestamp",
        });
    };

    Ok(ServerFrame::Event(ThreadEvent {
        course_id,
        timestamp,
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::domain::messaging::models::DeliveryStatus;

    use super::*;

    fn decode(value: Value) -> ServerFrame {
        decode_server_frame(&value.to_string()).unwrap()
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 19, 9, 0, 30).unwrap()
    }

    #[test]
    fn test_decodes_new_message_with_temp_id() {
        let frame = decode(json!({
            "type": "NEW_MESSAGE",
            "courseId": "course-1",
            "timestamp": "2024-02-19T09:00:30Z",
            "payload": {
                "id": "m1",
                "tempId": "t1",
                "courseId": "course-1",
                "sender": { "id": "u1", "role": "STUDENT" },
                "kind": "TEXT",
                "content": "Hello",
                "createdAt": "2024-02-19T09:00:29Z"
            }
        }));

        let ServerFrame::Event(ThreadEvent {
            course_id,
            timestamp: ts,
            payload: ThreadEventPayload::NewMessage(message),
        }) = frame
        else {
            panic!("Unexpected frame {:?}", frame);
        };

        assert_eq!(course_id, CourseId::from("course-1"));
        assert_eq!(ts, timestamp());
        assert_eq!(message.temp_id, Some("t1".into()));
        assert_eq!(message.content.as_deref(), Some("Hello"));
        assert_eq!(message.delivery_status, DeliveryStatus::Confirmed);
    }

    #[test]
    fn test_decodes_ack_variants() {
        let frame = decode(json!({
            "type": "DELIVERY_ACK",
            "courseId": "course-1",
            "timestamp": "2024-02-19T09:00:30Z",
            "payload": { "tempId": "t1", "status": "ACCEPTED", "messageId": "m1" }
        }));
        assert_eq!(
            frame,
            ServerFrame::Event(ThreadEvent {
                course_id: "course-1".into(),
                timestamp: timestamp(),
                payload: ThreadEventPayload::DeliveryAck(DeliveryAck {
                    temp_id: "t1".into(),
                    status: AckStatus::Accepted,
                    message: None,
                    message_id: Some("m1".into()),
                    reason: None,
                }),
            })
        );

        let frame = decode(json!({
            "type": "DELIVERY_ACK",
            "courseId": "course-1",
            "timestamp": "2024-02-19T09:00:30Z",
            "payload": { "tempId": "t2", "status": "REJECTED", "reason": "Muted" }
        }));
        let ServerFrame::Event(ThreadEvent {
            payload: ThreadEventPayload::DeliveryAck(ack),
            ..
        }) = frame
        else {
            panic!("Unexpected frame {:?}", frame);
        };
        assert_eq!(ack.status, AckStatus::Rejected);
        assert_eq!(ack.reason.as_deref(), Some("Muted"));
    }

    #[test]
    fn test_decodes_control_frames() {
        assert_eq!(decode(json!({ "type": "AUTH_OK" })), ServerFrame::AuthOk);
        assert_eq!(
            decode(json!({ "type": "AUTH_ERROR", "payload": { "reason": "Token expired" } })),
            ServerFrame::AuthError {
                reason: "Token expired".to_string()
            }
        );
        assert_eq!(
            decode(json!({ "type": "TYPING", "courseId": "course-1" })),
            ServerFrame::Unknown {
                frame_type: "TYPING".to_string()
            }
        );
    }

    #[test]
    fn test_presence_payload_is_passed_through() {
        let payload = json!({ "online": ["u1", "u2"] });
        let frame = decode(json!({
            "type": "PRESENCE",
            "courseId": "course-1",
            "timestamp": "2024-02-19T09:00:30Z",
            "payload": payload.clone()
        }));

        assert_eq!(
            frame,
            ServerFrame::Event(ThreadEvent {
                course_id: "course-1".into(),
                timestamp: timestamp(),
                payload: ThreadEventPayload::Presence(payload),
            })
        );
    }

    #[test]
    fn test_event_without_course_is_rejected() {
        let result = decode_server_frame(
            &json!({
                "type": "MESSAGE_DELETED",
                "timestamp": "2024-02-19T09:00:30Z",
                "payload": { "id": "m1" }
            })
            .to_string(),
        );

        assert!(matches!(
            result,
            Err(WireError::MissingField {
                field: "courseId",
                ..
            })
        ));
    }
}
