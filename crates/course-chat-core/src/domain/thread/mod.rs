// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use feed_snapshot::FeedSnapshot;
pub use thread_state::ThreadState;

mod feed_snapshot;
mod thread_state;
