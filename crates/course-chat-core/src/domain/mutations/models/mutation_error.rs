// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

/// An edit or delete was refused, locally or by the server. The optimistic change has been
/// reverted by the time this is surfaced.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum MutationError {
    #[error("Not allowed to modify this message")]
    Forbidden,
    #[error("Message not found")]
    NotFound,
    #[error("Message was modified concurrently")]
    Conflict,
    #[error("Message cannot be modified: {reason}")]
    NotEditable { reason: String },
    #[error("Only the author can modify a message")]
    NotOwner,
    #[error("Network error: {msg}")]
    Network { msg: String },
    #[error("Server responded with {status}: {msg}")]
    Server { status: u16, msg: String },
}

impl MutationError {
    pub(crate) fn not_editable(reason: impl Into<String>) -> Self {
        MutationError::NotEditable {
            reason: reason.into(),
        }
    }
}
