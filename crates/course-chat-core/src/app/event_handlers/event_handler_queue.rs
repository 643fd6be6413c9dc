// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::OnceLock;

use tracing::error;

use crate::app::event_handlers::{ServerEvent, ServerEventHandler};

/// Passes each event down the chain of handlers until one of them consumes it.
pub struct ServerEventHandlerQueue {
    handlers: OnceLock<Vec<Box<dyn ServerEventHandler>>>,
}

impl ServerEventHandlerQueue {
    pub fn new() -> Self {
        Self {
            handlers: Default::default(),
        }
    }

    pub fn set_handlers(&self, handlers: Vec<Box<dyn ServerEventHandler>>) {
        if self.handlers.set(handlers).is_err() {
            error!("Tried to set handlers on ServerEventHandlerQueue more than once.");
        }
    }

    pub async fn handle_event(&self, event: ServerEvent) {
        let Some(handlers) = self.handlers.get() else {
            error!("Dropping event since no handlers were set on ServerEventHandlerQueue.");
            return;
        };

        let mut event = event;

        for handler in handlers.iter() {
            match handler.handle_event(event).await {
                Ok(None) => return,
                Ok(Some(e)) => event = e,
                Err(err) => {
                    error!(
                        "Event handler '{}' aborted with error: {}",
                        handler.name(),
                        err.to_string()
                    );
                    return;
                }
            }
        }

        error!("Unhandled event {:?}", event);
    }
}
