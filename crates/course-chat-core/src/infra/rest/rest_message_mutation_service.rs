// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::messaging::models::{Message, MessageId};
use crate::domain::messaging::services::MessageMutationService;
use crate::domain::mutations::models::MutationError;
use crate::infra::wire::MessageDto;

use super::rest_client::RestError;
use super::RestClient;

/// Edits and deletes messages through `PATCH` and `DELETE {base}/messages/{id}`.
pub struct RestMessageMutationService {
    client: RestClient,
}

impl RestMessageMutationService {
    pub(crate) fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct UpdateMessageRequest<'a> {
    content: &'a str,
}

#[async_trait]
impl MessageMutationService for RestMessageMutationService {
    async fn update_message(
        &self,
        id: &MessageId,
        content: &str,
    ) -> Result<Message, MutationError> {
        let request = self
            .client
            .http()
            .patch(self.client.url(&["messages", id.as_str()]))
            .json(&UpdateMessageRequest { content });

        let message = self.client.json::<MessageDto>(request).await?;
        Ok(message.into())
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), MutationError> {
        let request = self
            .client
            .http()
            .delete(self.client.url(&["messages", id.as_str()]));

        self.client.send(request).await?;
        Ok(())
    }
}

impl From<RestError> for MutationError {
    fn from(value: RestError) -> Self {
        match value {
            RestError::Network(msg) => MutationError::Network { msg },
            RestError::Status { status: 403, .. } => MutationError::Forbidden,
            RestError::Status { status: 404, .. } => MutationError::NotFound,
            RestError::Status { status: 409, .. } => MutationError::Conflict,
            RestError::Status { status, body } => MutationError::Server { status, msg: body },
            RestError::Decode(msg) => MutationError::Server {
                status: 200,
                msg: format!("Invalid response: {msg}"),
            },
        }
    }
}
