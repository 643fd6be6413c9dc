// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::{anyhow, bail, Result};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use course_chat_proc_macros::InjectDependencies;

use crate::app::deps::{
    DynActiveThread, DynAppContext, DynHistoryService, DynMessageMutationService,
    DynMessageTransport, DynTempIdProvider, DynTimeProvider,
};
use crate::domain::connection::models::{
    ConnectParams, ConnectionStatus, Credentials, TransportError,
};
use crate::domain::history::models::{PageLoadError, PageLoadOutcome};
use crate::domain::history::PageFetch;
use crate::domain::messaging::models::{CourseId, MessageDraft, MessageId, TempId, UserId};
use crate::domain::mutations::models::MutationError;
use crate::domain::sending::models::SendError;
use crate::domain::feed::FeedChange;
use crate::domain::thread::{FeedSnapshot, ThreadState};

/// The intents the UI can issue against the active course thread.
#[derive(InjectDependencies)]
pub struct ThreadService {
    #[inject]
    active_thread: DynActiveThread,
    #[inject]
    ctx: DynAppContext,
    #[inject]
    history_service: DynHistoryService,
    #[inject]
    mutation_service: DynMessageMutationService,
    #[inject]
    temp_id_provider: DynTempIdProvider,
    #[inject]
    time_provider: DynTimeProvider,
    #[inject]
    transport: DynMessageTransport,
}

impl ThreadService {
    /// Opens the thread of `course_id`, connects the push channel and loads the newest page.
    ///
    /// A failing connect is returned but leaves the thread open. History is loaded either way
    /// and the connection can be retried with `reconnect`.
    #[instrument(skip_all, fields(course_id = %course_id))]
    pub async fn open_course(
        &self,
        course_id: CourseId,
        credentials: Credentials,
    ) -> Result<(), TransportError> {
        let params = credentials.connect_params(course_id.clone());
        self.ctx.set_credentials(credentials);
        self.connect_thread(course_id, params).await
    }

    /// Switches to another course using the credentials of the last `open_course` call.
    #[instrument(skip_all, fields(course_id = %course_id))]
    pub async fn switch_course(&self, course_id: CourseId) -> Result<(), TransportError> {
        let Ok(params) = self
            .ctx
            .credentials(|credentials| credentials.connect_params(course_id.clone()))
        else {
            warn!("Cannot switch course before one was opened.");
            return Err(TransportError::NotConnected);
        };
        self.connect_thread(course_id, params).await
    }

    pub fn close(&self) {
        self.transport.disconnect();
        self.active_thread.close();
        self.ctx.reset_credentials();
    }

    pub async fn reconnect(&self) -> Result<(), TransportError> {
        info!("Reconnecting on request.");
        self.transport.reconnect().await
    }

    async fn connect_thread(
        &self,
        course_id: CourseId,
        params: ConnectParams,
    ) -> Result<(), TransportError> {
        self.transport.disconnect();
        self.active_thread.open(course_id.clone());

        let connected = self.transport.connect(params).await;
        if let Err(err) = &connected {
            warn!("Could not connect to the thread of {course_id}. {err}");
        }

        if let Err(err) = self.load_older().await {
            warn!("Could not load the newest messages of {course_id}. {err}");
        }

        connected
    }
}

impl ThreadService {
    /// Shows `draft` immediately as a pending message and sends it. Returns the temp id that
    /// correlates the pending entry with its confirmation.
    ///
    /// While the connection is being (re)established the message is queued and sent once it is
    /// up. A draft that fails validation, or one submitted without any session, is kept as a
    /// failed message that can be retried.
    pub fn submit(&self, draft: MessageDraft) -> Result<TempId> {
        let status = self.transport.status();
        let sender = self.ctx.current_user()?;
        let temp_id = self.temp_id_provider.new_temp_id();
        let now = self.time_provider.now();

        self.active_thread
            .update(|thread| {
                let mut changes = thread.submit(temp_id.clone(), sender, draft, now);
                changes.extend(Self::fail_without_session(thread, &temp_id, status));
                (changes, ())
            })
            .ok_or(anyhow!("Cannot send a message without an open course thread."))?;

        self.flush_if_connected(status);
        Ok(temp_id)
    }

    /// Replaces the failed message `temp_id` by a new pending one with the same draft.
    /// Returns the new temp id.
    pub fn retry(&self, temp_id: &TempId) -> Result<TempId> {
        let status = self.transport.status();
        let sender = self.ctx.current_user()?;
        let new_temp_id = self.temp_id_provider.new_temp_id();
        let now = self.time_provider.now();

        let retried = self
            .active_thread
            .update(
                |thread| match thread.retry(temp_id, new_temp_id.clone(), sender, now) {
                    Some(mut changes) => {
                        changes.extend(Self::fail_without_session(thread, &new_temp_id, status));
                        (changes, true)
                    }
                    None => (vec![], false),
                },
            )
            .unwrap_or(false);

        if !retried {
            bail!("Message {temp_id} has not failed and cannot be retried.")
        }

        info!("Retrying message {temp_id} as {new_temp_id}.");
        self.flush_if_connected(status);
        Ok(new_temp_id)
    }

    /// Removes the failed message `temp_id` from the feed.
    pub fn discard_failed(&self, temp_id: &TempId) -> Result<()> {
        let discarded = self
            .active_thread
            .update(|thread| {
                let change = thread.discard_failed(temp_id);
                let discarded = change.is_some();
                (change.into_iter().collect(), discarded)
            })
            .unwrap_or(false);

        if !discarded {
            bail!("Message {temp_id} has not failed and cannot be discarded.")
        }
        Ok(())
    }

    fn fail_without_session(
        thread: &mut ThreadState,
        temp_id: &TempId,
        status: ConnectionStatus,
    ) -> Option<FeedChange> {
        if status != ConnectionStatus::Disconnected {
            return None;
        }
        warn!("Not connected. Keeping message {temp_id} as failed.");
        thread.fail_send(temp_id, SendError::NotConnected)
    }

    fn flush_if_connected(&self, status: ConnectionStatus) {
        match status {
            ConnectionStatus::Connected => {
                self.active_thread
                    .flush_unsent(self.transport.as_ref(), self.time_provider.now());
            }
            ConnectionStatus::Disconnected => (),
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => {
                info!("Connection is {status}. Queuing message until it is up.");
            }
        }
    }
}

impl ThreadService {
    /// Replaces the text of the confirmed message `id`. The new text is shown right away and
    /// reverted if the server refuses the edit.
    pub async fn edit(&self, id: &MessageId, content: &str) -> Result<(), MutationError> {
        let user_id = self.current_user_id()?;

        self.active_thread
            .update(
                |thread| match thread.begin_edit(id, content, &user_id) {
                    Ok(changes) => (changes, Ok(())),
                    Err(err) => (vec![], Err(err)),
                },
            )
            .unwrap_or(Err(MutationError::NotFound))?;

        let result = self.mutation_service.update_message(id, content).await;

        self.active_thread
            .update(|thread| thread.complete_edit(id, result))
            .unwrap_or(Ok(()))
    }

    /// Deletes the confirmed message `id`. It disappears right away and is put back if the
    /// server refuses the delete.
    pub async fn delete(&self, id: &MessageId) -> Result<(), MutationError> {
        let user_id = self.current_user_id()?;

        self.active_thread
            .update(|thread| match thread.begin_delete(id, &user_id) {
                Ok(changes) => (changes, Ok(())),
                Err(err) => (vec![], Err(err)),
            })
            .unwrap_or(Err(MutationError::NotFound))?;

        let result = self.mutation_service.delete_message(id).await;

        self.active_thread
            .update(|thread| thread.complete_delete(id, result))
            .unwrap_or(Ok(()))
    }

    fn current_user_id(&self) -> Result<UserId, MutationError> {
        self.ctx
            .current_user()
            .map(|user| user.id)
            .map_err(|_| MutationError::NotFound)
    }
}

impl ThreadService {
    /// Loads the page preceding the oldest loaded message.
    ///
    /// Concurrent calls collapse into the one in flight. A page that arrives after the course was
    /// switched or closed is dropped and reported as `Discarded`.
    pub async fn load_older(&self) -> Result<PageLoadOutcome, PageLoadError> {
        let Some((course_id, fetch)) = self
            .active_thread
            .update(|thread| (vec![], (thread.course_id().clone(), thread.begin_page_load())))
        else {
            return Ok(PageLoadOutcome::Discarded);
        };

        let request = match fetch {
            PageFetch::Fetch(request) => request,
            PageFetch::AlreadyLoading => return Ok(PageLoadOutcome::AlreadyLoading),
            PageFetch::Exhausted => return Ok(PageLoadOutcome::Exhausted),
        };

        let result = self
            .history_service
            .load_page(&course_id, request.before.clone(), self.ctx.config.page_size)
            .await;

        self.active_thread
            .update(|thread| thread.complete_page_load(&request, result))
            .unwrap_or(Ok(PageLoadOutcome::Discarded))
    }
}

impl ThreadService {
    pub fn feed(&self) -> FeedSnapshot {
        self.active_thread.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.active_thread.subscribe()
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.active_thread.course_id()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.ctx.connection_status()
    }

    /// The error that made the connection give up. Cleared by the next successful connect.
    pub fn ws_error(&self) -> Option<TransportError> {
        self.ctx.ws_error()
    }

    pub fn has_more_history(&self) -> bool {
        self.active_thread
            .read(|thread| thread.pager().has_more())
            .unwrap_or(false)
    }

    pub fn is_loading_history(&self) -> bool {
        self.active_thread
            .read(|thread| thread.pager().is_loading())
            .unwrap_or(false)
    }

    /// The error of the last failed page load, if the next one has not succeeded yet.
    pub fn page_load_error(&self) -> Option<PageLoadError> {
        self.active_thread
            .read(|thread| thread.pager().last_error().cloned())
            .flatten()
    }
}
