// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::app::event_handlers::{ServerEvent, SessionEvent};
use crate::domain::connection::models::{
    BackoffPolicy, ConnectParams, ConnectionStatus, TransportError,
};
use crate::domain::connection::services::{
    ClientFrame, Connection, ConnectionEvent, ConnectionEventHandler, Connector,
};
use crate::domain::messaging::models::OutboundMessage;
use crate::domain::messaging::services::MessageTransport;

pub type DynConnector = Arc<dyn Connector>;
pub type ServerEventSink = UnboundedSender<ServerEvent>;

/// Heartbeats that may go unanswered before the connection is considered dead.
const MAX_UNANSWERED_PINGS: u32 = 2;

/// The push channel of the active course thread.
///
/// Owns at most one connection at a time. An unexpected drop starts a reconnect loop with capped
/// exponential backoff. When the loop gives up the session settles in `Disconnected` and reports
/// the last error instead of failing any caller.
///
/// A connection on which neither an event nor a pong arrived for `MAX_UNANSWERED_PINGS`
/// heartbeats is treated like a drop with `TransportError::TimedOut`.
pub struct TransportSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    connector: DynConnector,
    backoff: BackoffPolicy,
    sink: ServerEventSink,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    params: Option<Arc<ConnectParams>>,
    connection: Option<Box<dyn Connection>>,
    status: ConnectionStatus,
    /// Incremented with every connection attempt. Events carrying an older number belong to a
    /// connection that was replaced and are dropped.
    attempt: u64,
    /// Set if the current attempt's connection closed before it was handed over to us.
    early_drop: Option<Option<TransportError>>,
    /// Heartbeats sent since the server last showed a sign of life.
    unanswered_pings: u32,
    reconnect_task: Option<JoinHandle<()>>,
}

impl TransportSession {
    pub fn new(connector: DynConnector, backoff: BackoffPolicy, sink: ServerEventSink) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                connector,
                backoff,
                sink,
                state: Default::default(),
            }),
        }
    }
}

#[async_trait]
impl MessageTransport for TransportSession {
    #[instrument(skip(self, params), fields(course_id = %params.course_id))]
    async fn connect(&self, params: ConnectParams) -> Result<(), TransportError> {
        let params = Arc::new(params);
        let attempt = self.inner.begin_attempt(Some(params.clone()));
        self.inner.establish(attempt, &params, false).await
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        let Some(params) = self.inner.state.lock().params.clone() else {
            return Err(TransportError::NotConnected);
        };
        let attempt = self.inner.begin_attempt(None);
        self.inner.establish(attempt, &params, true).await
    }

    fn disconnect(&self) {
        self.inner.shutdown()
    }

    fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let state = self.inner.state.lock();
        match (&state.connection, state.status) {
            (Some(connection), ConnectionStatus::Connected) => {
                connection.send(ClientFrame::Message(message))
            }
            _ => Err(TransportError::NotConnected),
        }
    }

    fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().status
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.inner.shutdown()
    }
}

impl SessionInner {
    fn emit(&self, event: SessionEvent) {
        if self.sink.send(ServerEvent::Session(event)).is_err() {
            debug!("Dropping session event since the client is gone.");
        }
    }

    fn set_status(
        &self,
        state: &mut SessionState,
        status: ConnectionStatus,
        error: Option<TransportError>,
    ) {
        if state.status == status && error.is_none() {
            return;
        }
        state.status = status;
        self.emit(SessionEvent::StatusChanged { status, error });
    }

    /// Tears down whatever is running and returns the number of the new attempt.
    fn begin_attempt(&self, params: Option<Arc<ConnectParams>>) -> u64 {
        let mut state = self.state.lock();

        if let Some(task) = state.reconnect_task.take() {
            task.abort();
        }
        if let Some(connection) = state.connection.take() {
            connection.disconnect();
        }
        if let Some(params) = params {
            state.params = Some(params);
        }

        state.attempt += 1;
        state.early_drop = None;
        self.set_status(&mut state, ConnectionStatus::Connecting, None);
        state.attempt
    }

    async fn establish(
        self: &Arc<Self>,
        attempt: u64,
        params: &ConnectParams,
        is_reconnect: bool,
    ) -> Result<(), TransportError> {
        info!("Connecting to course {}…", params.course_id);

        let result = match self
            .connector
            .connect(params, self.event_handler(attempt))
            .await
        {
            Ok(connection) => self.finish_connect(attempt, connection),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                if is_reconnect {
                    self.emit(SessionEvent::Reconnected);
                }
                Ok(())
            }
            Err(err) => {
                error!("Failed to connect. {err}");
                let mut state = self.state.lock();
                if state.attempt == attempt {
                    state.connection.take();
                    self.set_status(&mut state, ConnectionStatus::Disconnected, Some(err.clone()));
                }
                Err(err)
            }
        }
    }

    fn finish_connect(
        &self,
        attempt: u64,
        connection: Box<dyn Connection>,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();

        if state.attempt != attempt {
            connection.disconnect();
            return Err(TransportError::generic(
                "Connection attempt was superseded by another one.",
            ));
        }

        if let Some(error) = state.early_drop.take() {
            connection.disconnect();
            return Err(error.unwrap_or_else(|| {
                TransportError::generic("Connection closed right after it was established.")
            }));
        }

        state.connection = Some(connection);
        state.unanswered_pings = 0;
        self.set_status(&mut state, ConnectionStatus::Connected, None);
        info!("Connected.");
        Ok(())
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();

        if let Some(task) = state.reconnect_task.take() {
            task.abort();
        }
        if let Some(connection) = state.connection.take() {
            connection.disconnect();
        }

        state.params = None;
        state.attempt += 1;
        state.early_drop = None;
        self.set_status(&mut state, ConnectionStatus::Disconnected, None);
    }

    fn event_handler(self: &Arc<Self>, attempt: u64) -> ConnectionEventHandler {
        let inner: Weak<SessionInner> = Arc::downgrade(self);
        Box::new(move |event| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.handle_connection_event(attempt, event);
        })
    }

    fn handle_connection_event(self: &Arc<Self>, attempt: u64, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Event(event) => {
                if !self.mark_alive(attempt) {
                    debug!("Dropping event of a replaced connection.");
                    return;
                }
                if self.sink.send(ServerEvent::Thread(event)).is_err() {
                    debug!("Dropping thread event since the client is gone.");
                }
            }
            ConnectionEvent::Pong => {
                self.mark_alive(attempt);
            }
            ConnectionEvent::PingTimer => self.send_heartbeat(attempt),
            ConnectionEvent::Disconnected { error } => self.connection_dropped(attempt, error),
        }
    }

    /// Returns `false` if `attempt` belongs to a replaced connection.
    fn mark_alive(&self, attempt: u64) -> bool {
        let mut state = self.state.lock();
        if state.attempt != attempt {
            return false;
        }
        state.unanswered_pings = 0;
        true
    }

    fn send_heartbeat(self: &Arc<Self>, attempt: u64) {
        let mut state = self.state.lock();
        if state.attempt != attempt {
            return;
        }
        let Some(connection) = state.connection.as_ref() else {
            return;
        };

        if state.unanswered_pings >= MAX_UNANSWERED_PINGS {
            warn!(
                "No answer to the last {} heartbeats. Closing the connection.",
                state.unanswered_pings
            );
            connection.disconnect();
            drop(state);
            self.connection_dropped(attempt, Some(TransportError::TimedOut));
            return;
        }

        if let Err(err) = connection.send(ClientFrame::Heartbeat) {
            warn!("Failed to send heartbeat. {err}");
        }
        state.unanswered_pings += 1;
    }

    fn connection_dropped(self: &Arc<Self>, attempt: u64, error: Option<TransportError>) {
        let mut state = self.state.lock();

        if state.attempt != attempt {
            return;
        }

        if state.connection.is_none() {
            if state.status.is_transitioning() {
                state.early_drop = Some(error);
            }
            return;
        }

        warn!(
            "Connection dropped{}. Reconnecting…",
            error
                .as_ref()
                .map(|err| format!(" ({err})"))
                .unwrap_or_default()
        );

        state.connection.take();
        self.set_status(&mut state, ConnectionStatus::Reconnecting, error);

        let task = tokio::spawn(self.clone().reconnect_loop());
        if let Some(previous) = state.reconnect_task.replace(task) {
            previous.abort();
        }
    }

    async fn reconnect_loop(self: Arc<Self>) {
        let Some(params) = self.state.lock().params.clone() else {
            return;
        };

        let max_attempts = self.backoff.max_attempts;
        let mut last_error = None;

        for (idx, delay) in self.backoff.delays().enumerate() {
            tokio::time::sleep(delay).await;

            let attempt = {
                let mut state = self.state.lock();
                state.attempt += 1;
                state.early_drop = None;
                state.unanswered_pings = 0;
                state.attempt
            };

            info!("Reconnect attempt {}/{max_attempts}…", idx + 1);

            let result = match self
                .connector
                .connect(&params, self.event_handler(attempt))
                .await
            {
                Ok(connection) => self.finish_connect(attempt, connection),
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {
                    self.emit(SessionEvent::Reconnected);
                    return;
                }
                Err(TransportError::InvalidCredentials) => {
                    error!("Giving up reconnecting since the credentials were rejected.");
                    last_error = Some(TransportError::InvalidCredentials);
                    break;
                }
                Err(err) => {
                    warn!("Reconnect attempt {} failed. {err}", idx + 1);
                    last_error = Some(err);
                }
            }
        }

        error!("Could not reconnect after {max_attempts} attempts.");

        let mut state = self.state.lock();
        state.reconnect_task.take();
        self.set_status(
            &mut state,
            ConnectionStatus::Disconnected,
            Some(last_error.unwrap_or(TransportError::TimedOut)),
        );
    }
}
