// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::domain::messaging::models::MessageKey;

/// Result of a `load_older` intent.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLoadOutcome {
    Loaded {
        /// The oldest entry visible before the page was folded in. Keeping it in view preserves
        /// the reader's scroll position.
        anchor: Option<MessageKey>,
        inserted: usize,
        has_more: bool,
    },
    /// Another load for the same cursor is still running. Its result will be folded in.
    AlreadyLoading,
    /// The server reported that there are no older messages.
    Exhausted,
    /// The thread was reset while the page was loading.
    Discarded,
}
