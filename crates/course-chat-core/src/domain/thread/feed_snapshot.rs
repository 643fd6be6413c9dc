// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use crate::domain::messaging::models::{CourseId, Message, MessageId};

/// What the display layer renders. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    pub course_id: Option<CourseId>,
    pub revision: u64,
    pub messages: Arc<[Message]>,
    /// Messages removed by a delete that is still in flight.
    pub deleting: Vec<MessageId>,
}
