// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;

use crate::domain::history::models::{MessagePage, PageCursor, PageLoadError};
use crate::domain::messaging::models::CourseId;

#[async_trait]
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait HistoryService: Send + Sync {
    /// Loads up to `limit` messages strictly older than `before`, or the newest page if `before`
    /// is `None`.
    async fn load_page(
        &self,
        course_id: &CourseId,
        before: Option<PageCursor>,
        limit: u32,
    ) -> Result<MessagePage, PageLoadError>;
}
