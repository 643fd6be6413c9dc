// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::history::models::{MessagePage, PageCursor, PageLoadError};
use crate::domain::messaging::models::CourseId;
use crate::domain::messaging::services::HistoryService;
use crate::infra::wire::MessagePageDto;

use super::rest_client::RestError;
use super::RestClient;

/// Loads history pages from `GET {base}/messages?courseId=…&before=…&limit=…`.
pub struct RestHistoryService {
    client: RestClient,
}

impl RestHistoryService {
    pub(crate) fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HistoryService for RestHistoryService {
    #[instrument(skip_all, fields(course_id = %course_id, limit = limit))]
    async fn load_page(
        &self,
        course_id: &CourseId,
        before: Option<PageCursor>,
        limit: u32,
    ) -> Result<MessagePage, PageLoadError> {
        let mut query = vec![
            ("courseId", course_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = before {
            query.push(("before", cursor.message_id.to_string()));
        }

        let request = self
            .client
            .http()
            .get(self.client.url(&["messages"]))
            .query(&query);

        let page = self
            .client
            .json::<MessagePageDto>(request)
            .await
            .map_err(PageLoadError::from)?;

        debug!("Loaded {} message(s).", page.items.len());
        Ok(page.into())
    }
}

impl From<RestError> for PageLoadError {
    fn from(value: RestError) -> Self {
        match value {
            RestError::Network(msg) => PageLoadError::Network { msg },
            RestError::Status { status, body } => PageLoadError::Server { status, msg: body },
            RestError::Decode(msg) => PageLoadError::Decode { msg },
        }
    }
}
