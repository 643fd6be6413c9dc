// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("Timed out")]
    TimedOut,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not connected")]
    NotConnected,
    #[error("{msg}")]
    Generic { msg: String },
}

impl TransportError {
    pub(crate) fn generic(msg: impl ToString) -> Self {
        TransportError::Generic {
            msg: msg.to_string(),
        }
    }
}
