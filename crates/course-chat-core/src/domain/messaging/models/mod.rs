// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use attachment::{Attachment, AttachmentCategory};
pub use draft::{MessageDraft, OutboundMessage};
pub use ids::{CourseId, MessageId, TempId, UserId};
pub use message::{
    DeliveryStatus, Message, MessageEdit, MessageKind, MessageRevision, MutationStatus, Sender,
    SenderRole,
};
pub use message_key::MessageKey;
pub use thread_event::{AckStatus, DeliveryAck, ThreadEvent, ThreadEventPayload};

mod attachment;
mod draft;
mod ids;
mod message;
mod message_key;
mod thread_event;
