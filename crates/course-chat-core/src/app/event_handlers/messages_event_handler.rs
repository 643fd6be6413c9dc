// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;

use course_chat_proc_macros::InjectDependencies;

use crate::app::deps::{DynActiveThread, DynTimeProvider};
use crate::app::event_handlers::{ServerEvent, ServerEventHandler};
use crate::domain::messaging::models::{ThreadEvent, ThreadEventPayload};

/// Folds new, edited and deleted messages pushed by the server into the feed.
#[derive(InjectDependencies)]
pub struct MessagesEventHandler {
    #[inject]
    active_thread: DynActiveThread,
    #[inject]
    time_provider: DynTimeProvider,
}

#[async_trait]
impl ServerEventHandler for MessagesEventHandler {
    fn name(&self) -> &'static str {
        "messages"
    }

    async fn handle_event(&self, event: ServerEvent) -> Result<Option<ServerEvent>> {
        match event {
            ServerEvent::Thread(
                event @ ThreadEvent {
                    payload:
                        ThreadEventPayload::NewMessage(_)
                        | ThreadEventPayload::MessageEdited(_)
                        | ThreadEventPayload::MessageDeleted { .. },
                    ..
                },
            ) => self.handle_thread_event(event),
            _ => return Ok(Some(event)),
        }
        Ok(None)
    }
}

impl MessagesEventHandler {
    fn handle_thread_event(&self, event: ThreadEvent) {
        let now = self.time_provider.now();
        self.active_thread
            .update(|thread| (thread.apply_event(event, now), ()));
    }
}
