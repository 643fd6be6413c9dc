// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

//! JSON shapes exchanged with the chat backend over the websocket and REST interfaces.

pub use client_frame::{encode_client_frame, ClientFrameDto};
pub use message_dto::{AttachmentDto, MessageDto, MessagePageDto, SenderDto};
pub use server_frame::{decode_server_frame, ServerFrame};

mod client_frame;
mod message_dto;
mod server_frame;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Frame of type {frame_type} is missing '{field}'")]
    MissingField {
        frame_type: String,
        field: &'static str,
    },
}
