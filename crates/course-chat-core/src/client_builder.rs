// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::app::deps::{
    AppContext, AppDependencies, ChatConfig, DynAppContext, DynHistoryService,
    DynMessageMutationService, DynTempIdProvider, DynTimeProvider,
};
use crate::app::event_handlers::{
    DeliveryEventHandler, MessagesEventHandler, PresenceEventHandler, ServerEvent,
    ServerEventHandlerQueue, SessionEventHandler,
};
use crate::app::services::{
    ActiveThread, DynConnector, ServerEventSink, ThreadService, TransportSession,
};
use crate::client::ClientInner;
use crate::domain::connection::services::Connector;
use crate::domain::general::services::TimeProvider;
use crate::domain::messaging::services::{HistoryService, MessageMutationService, TempIdProvider};
use crate::infra::events::ImmediateClientEventDispatcher;
use crate::infra::general::{ServerEndpoints, SystemTimeProvider, UuidTempIdProvider};
use crate::infra::rest::{RestClient, RestHistoryService, RestMessageMutationService};
use crate::infra::transport::WebsocketConnector;
use crate::{ChatClient, ClientDelegate};

const MIN_TIMEOUT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

pub struct UndefinedBackend;

/// The services the client talks to.
pub struct Backend {
    kind: BackendKind,
}

enum BackendKind {
    Remote(ServerEndpoints),
    Custom {
        connector: DynConnector,
        history_service: DynHistoryService,
        mutation_service: DynMessageMutationService,
    },
}

pub struct ClientBuilder<B> {
    backend: B,
    config: ChatConfig,
    delegate: Option<Box<dyn ClientDelegate>>,
    temp_id_provider: DynTempIdProvider,
    time_provider: DynTimeProvider,
}

impl ClientBuilder<UndefinedBackend> {
    pub(crate) fn new() -> Self {
        ClientBuilder {
            backend: UndefinedBackend,
            config: Default::default(),
            delegate: None,
            temp_id_provider: Arc::new(UuidTempIdProvider::default()),
            time_provider: Arc::new(SystemTimeProvider::default()),
        }
    }

    /// Talks to a live backend over WebSocket and REST.
    pub fn set_endpoints(self, endpoints: ServerEndpoints) -> ClientBuilder<Backend> {
        self.set_backend_kind(BackendKind::Remote(endpoints))
    }

    /// Uses the given implementations instead of the network. Mostly useful for tests.
    pub fn set_backend(
        self,
        connector: Arc<dyn Connector>,
        history_service: Arc<dyn HistoryService>,
        mutation_service: Arc<dyn MessageMutationService>,
    ) -> ClientBuilder<Backend> {
        self.set_backend_kind(BackendKind::Custom {
            connector,
            history_service,
            mutation_service,
        })
    }

    fn set_backend_kind(self, kind: BackendKind) -> ClientBuilder<Backend> {
        ClientBuilder {
            backend: Backend { kind },
            config: self.config,
            delegate: self.delegate,
            temp_id_provider: self.temp_id_provider,
            time_provider: self.time_provider,
        }
    }
}

impl<B> ClientBuilder<B> {
    pub fn set_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_delegate(mut self, delegate: Option<Box<dyn ClientDelegate>>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn set_time_provider<T: TimeProvider + 'static>(mut self, time_provider: T) -> Self {
        self.time_provider = Arc::new(time_provider);
        self
    }

    pub fn set_temp_id_provider<P: TempIdProvider + 'static>(mut self, provider: P) -> Self {
        self.temp_id_provider = Arc::new(provider);
        self
    }
}

impl ClientBuilder<Backend> {
    /// Assembles the client. Must be called from within a Tokio runtime since it spawns the
    /// tasks that feed server events and timeout checks into the event handlers.
    pub fn build(self) -> ChatClient {
        let ctx: DynAppContext = Arc::new(AppContext::new(self.config));
        let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();

        let (connector, history_service, mutation_service) = match self.backend.kind {
            BackendKind::Remote(endpoints) => {
                let rest = RestClient::new(
                    reqwest::Client::new(),
                    endpoints.api_base_url,
                    ctx.clone(),
                );
                let connector: DynConnector = Arc::new(WebsocketConnector::new(
                    endpoints.websocket_url,
                    ctx.config.heartbeat_interval,
                ));
                let history_service: DynHistoryService =
                    Arc::new(RestHistoryService::new(rest.clone()));
                let mutation_service: DynMessageMutationService =
                    Arc::new(RestMessageMutationService::new(rest));
                (connector, history_service, mutation_service)
            }
            BackendKind::Custom {
                connector,
                history_service,
                mutation_service,
            } => (connector, history_service, mutation_service),
        };

        let transport = Arc::new(TransportSession::new(
            connector,
            ctx.config.backoff.clone(),
            tx.clone(),
        ));

        let event_dispatcher = Arc::new(ImmediateClientEventDispatcher::new(self.delegate));

        let dependencies = AppDependencies {
            active_thread: Arc::new(ActiveThread::new(event_dispatcher.clone())),
            client_event_dispatcher: event_dispatcher.clone(),
            ctx: ctx.clone(),
            history_service,
            mutation_service,
            temp_id_provider: self.temp_id_provider,
            time_provider: self.time_provider,
            transport,
        };

        let server_event_handler_queue = Arc::new(ServerEventHandlerQueue::new());
        server_event_handler_queue.set_handlers(vec![
            Box::new(SessionEventHandler::from(&dependencies)),
            Box::new(MessagesEventHandler::from(&dependencies)),
            Box::new(DeliveryEventHandler::from(&dependencies)),
            Box::new(PresenceEventHandler::from(&dependencies)),
        ]);

        let tasks = vec![
            spawn_event_pump(server_event_handler_queue, rx),
            spawn_timeout_checks(tx, ctx.config.timeout_check_interval),
        ];

        let client_inner = Arc::new(ClientInner {
            thread: ThreadService::from(&dependencies),
            ctx,
            tasks,
        });

        event_dispatcher.set_client_inner(Arc::downgrade(&client_inner));

        ChatClient::from(client_inner)
    }
}

/// Feeds server events into the handler queue one at a time, in arrival order.
fn spawn_event_pump(
    queue: Arc<ServerEventHandlerQueue>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            queue.handle_event(event).await;
        }
        debug!("Server event pump finished.");
    })
}

fn spawn_timeout_checks(sink: ServerEventSink, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_TIMEOUT_CHECK_INTERVAL);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if sink.send(ServerEvent::TimeoutCheck).is_err() {
                break;
            }
        }
    })
}
