// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::ops::Deref;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::app::deps::DynAppContext;
use crate::app::services::ThreadService;
use crate::client_builder::{ClientBuilder, UndefinedBackend};
use crate::domain::connection::models::{ConnectionStatus, Credentials, TransportError};
use crate::domain::messaging::models::CourseId;
use crate::ClientEvent;

#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ClientInner>,
}

pub trait ClientDelegate: Send + Sync {
    fn handle_event(&self, client: ChatClient, event: ClientEvent);
}

impl ChatClient {
    pub fn builder() -> ClientBuilder<UndefinedBackend> {
        ClientBuilder::new()
    }
}

pub struct ClientInner {
    pub thread: ThreadService,
    pub(crate) ctx: DynAppContext,
    pub(crate) tasks: Vec<JoinHandle<()>>,
}

impl From<Arc<ClientInner>> for ChatClient {
    fn from(inner: Arc<ClientInner>) -> Self {
        ChatClient { inner }
    }
}

impl Deref for ChatClient {
    type Target = ClientInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ChatClient {
    pub async fn open_course(
        &self,
        course_id: CourseId,
        credentials: Credentials,
    ) -> Result<(), TransportError> {
        self.thread.open_course(course_id, credentials).await
    }

    pub fn close(&self) {
        self.thread.close()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.ctx.connection_status()
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.thread.close();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
