// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

/// Why a specific message failed to deliver. The message stays visible in ERROR state.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SendError {
    #[error("Delivery rejected: {reason}")]
    DeliveryRejected { reason: String },
    #[error("No acknowledgement received in time")]
    TimedOut,
    #[error("Acknowledged but the message never arrived on the live stream")]
    EchoTimedOut,
    #[error("A file message requires an attachment")]
    MissingAttachment,
    #[error("A text message requires content")]
    EmptyContent,
    #[error("Not connected")]
    NotConnected,
}
