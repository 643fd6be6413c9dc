// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use feed_change::FeedChange;
pub use unified_feed::UnifiedFeed;

mod feed_change;
mod unified_feed;
