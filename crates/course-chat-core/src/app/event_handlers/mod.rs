// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;

pub use delivery_event_handler::DeliveryEventHandler;
pub use event_handler_queue::ServerEventHandlerQueue;
pub use messages_event_handler::MessagesEventHandler;
pub use presence_event_handler::PresenceEventHandler;
pub use server_event::*;
pub use session_event_handler::SessionEventHandler;

use crate::ClientEvent;

mod delivery_event_handler;
mod event_handler_queue;
mod messages_event_handler;
mod presence_event_handler;
mod server_event;
mod session_event_handler;

#[async_trait]
pub trait ServerEventHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle_event(&self, event: ServerEvent) -> Result<Option<ServerEvent>>;
}

#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait ClientEventDispatcherTrait: Send + Sync {
    fn dispatch_event(&self, event: ClientEvent);
}
