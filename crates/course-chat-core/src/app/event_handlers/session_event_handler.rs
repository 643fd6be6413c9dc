// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use course_chat_proc_macros::InjectDependencies;

use crate::app::deps::{
    DynActiveThread, DynAppContext, DynClientEventDispatcher, DynHistoryService,
    DynMessageTransport, DynTimeProvider,
};
use crate::app::event_handlers::{ServerEvent, ServerEventHandler, SessionEvent};
use crate::domain::connection::models::{ConnectionStatus, TransportError};
use crate::ClientEvent;

/// Mirrors the state of the push channel and resynchronizes the thread after a reconnect.
///
/// The catch-up page is fetched on its own task so that live events keep flowing meanwhile.
#[derive(InjectDependencies)]
pub struct SessionEventHandler {
    #[inject]
    active_thread: DynActiveThread,
    #[inject]
    client_event_dispatcher: DynClientEventDispatcher,
    #[inject]
    ctx: DynAppContext,
    #[inject]
    history_service: DynHistoryService,
    #[inject]
    time_provider: DynTimeProvider,
    #[inject]
    transport: DynMessageTransport,
    catch_up_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionEventHandler {
    fn drop(&mut self) {
        if let Some(task) = self.catch_up_task.get_mut().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl ServerEventHandler for SessionEventHandler {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn handle_event(&self, event: ServerEvent) -> Result<Option<ServerEvent>> {
        match event {
            ServerEvent::Session(SessionEvent::StatusChanged { status, error }) => {
                self.handle_status_changed(status, error)
            }
            ServerEvent::Session(SessionEvent::Reconnected) => self.handle_reconnected(),
            _ => return Ok(Some(event)),
        }
        Ok(None)
    }
}

impl SessionEventHandler {
    fn handle_status_changed(&self, status: ConnectionStatus, error: Option<TransportError>) {
        info!("Connection status changed to {status}.");
        self.ctx.set_connection_status(status, error.clone());
        self.client_event_dispatcher
            .dispatch_event(ClientEvent::ConnectionStatusChanged { status, error });
    }

    fn handle_reconnected(&self) {
        let now = self.time_provider.now();
        let config = &self.ctx.config;

        self.active_thread.update(|thread| {
            (
                thread.settle_stale_sends(now, config.reconnect_grace_window, config.max_resends),
                (),
            )
        });

        let sent = self
            .active_thread
            .flush_unsent(self.transport.as_ref(), now);
        if sent > 0 {
            info!("Resent {sent} queued message(s) after reconnect.");
        }

        let Some((course_id, request)) = self
            .active_thread
            .read(|thread| (thread.course_id().clone(), thread.catch_up_request()))
        else {
            return;
        };

        let history_service = self.history_service.clone();
        let active_thread = self.active_thread.clone();
        let page_size = config.page_size;

        let task = tokio::spawn(async move {
            let result = history_service
                .load_page(&course_id, None, page_size)
                .await;
            active_thread.reload(|thread| (thread.complete_catch_up(&request, result), ()));
        });

        if let Some(previous) = self.catch_up_task.lock().replace(task) {
            previous.abort();
        }
    }
}
