// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;

use course_chat_proc_macros::InjectDependencies;

use crate::app::deps::{DynActiveThread, DynAppContext, DynTimeProvider};
use crate::app::event_handlers::{ServerEvent, ServerEventHandler};
use crate::domain::messaging::models::{ThreadEvent, ThreadEventPayload};

/// Resolves pending sends through acks, delivery errors and timeouts.
#[derive(InjectDependencies)]
pub struct DeliveryEventHandler {
    #[inject]
    active_thread: DynActiveThread,
    #[inject]
    ctx: DynAppContext,
    #[inject]
    time_provider: DynTimeProvider,
}

#[async_trait]
impl ServerEventHandler for DeliveryEventHandler {
    fn name(&self) -> &'static str {
        "delivery"
    }

    async fn handle_event(&self, event: ServerEvent) -> Result<Option<ServerEvent>> {
        match event {
            ServerEvent::Thread(
                event @ ThreadEvent {
                    payload:
                        ThreadEventPayload::DeliveryAck(_) | ThreadEventPayload::DeliveryError { .. },
                    ..
                },
            ) => {
                let now = self.time_provider.now();
                self.active_thread
                    .update(|thread| (thread.apply_event(event, now), ()));
            }
            ServerEvent::TimeoutCheck => self.expire_sends(),
            _ => return Ok(Some(event)),
        }
        Ok(None)
    }
}

impl DeliveryEventHandler {
    fn expire_sends(&self) {
        let now = self.time_provider.now();
        let config = &self.ctx.config;
        self.active_thread.update(|thread| {
            (
                thread.expire_sends(now, config.send_timeout, config.echo_timeout),
                (),
            )
        });
    }
}
