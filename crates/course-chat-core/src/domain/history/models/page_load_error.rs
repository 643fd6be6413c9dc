// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

/// A history page could not be fetched. History is never silently truncated, the caller keeps a
/// retry affordance.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PageLoadError {
    #[error("Network error: {msg}")]
    Network { msg: String },
    #[error("Server responded with {status}: {msg}")]
    Server { status: u16, msg: String },
    #[error("Could not decode page: {msg}")]
    Decode { msg: String },
}
