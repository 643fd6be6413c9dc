// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use course_chat_proc_macros::InjectDependencies;

use crate::app::deps::{DynActiveThread, DynClientEventDispatcher};
use crate::app::event_handlers::{ServerEvent, ServerEventHandler};
use crate::domain::messaging::models::{ThreadEvent, ThreadEventPayload};
use crate::ClientEvent;

#[derive(InjectDependencies)]
pub struct PresenceEventHandler {
    #[inject]
    active_thread: DynActiveThread,
    #[inject]
    client_event_dispatcher: DynClientEventDispatcher,
}

#[async_trait]
impl ServerEventHandler for PresenceEventHandler {
    fn name(&self) -> &'static str {
        "presence"
    }

    async fn handle_event(&self, event: ServerEvent) -> Result<Option<ServerEvent>> {
        match event {
            ServerEvent::Thread(ThreadEvent {
                course_id,
                payload: ThreadEventPayload::Presence(payload),
                ..
            }) => {
                if self.active_thread.course_id().as_ref() != Some(&course_id) {
                    debug!("Ignoring presence for inactive course {course_id}.");
                    return Ok(None);
                }
                self.client_event_dispatcher
                    .dispatch_event(ClientEvent::PresenceChanged { course_id, payload });
            }
            _ => return Ok(Some(event)),
        }
        Ok(None)
    }
}
