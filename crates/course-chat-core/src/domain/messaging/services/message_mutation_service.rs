// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;

use crate::domain::messaging::models::{Message, MessageId};
use crate::domain::mutations::models::MutationError;

#[async_trait]
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait MessageMutationService: Send + Sync {
    /// Returns the authoritative representation after the edit.
    async fn update_message(&self, id: &MessageId, content: &str)
        -> Result<Message, MutationError>;

    async fn delete_message(&self, id: &MessageId) -> Result<(), MutationError>;
}
