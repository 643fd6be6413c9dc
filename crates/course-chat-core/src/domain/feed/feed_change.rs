// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::messaging::models::MessageKey;

/// Describes the effect a single fold had on a `UnifiedFeed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedChange {
    Inserted(MessageKey),
    Updated(MessageKey),
    /// A local entry was superseded by its confirmed counterpart.
    Replaced {
        previous: MessageKey,
        current: MessageKey,
    },
    Removed(MessageKey),
}

impl FeedChange {
    pub fn key(&self) -> &MessageKey {
        match self {
            FeedChange::Inserted(key) | FeedChange::Updated(key) | FeedChange::Removed(key) => key,
            FeedChange::Replaced { current, .. } => current,
        }
    }
}
