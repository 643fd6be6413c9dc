// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use course_chat_core::domain::connection::models::{
    ConnectParams, Credentials, TransportError,
};
use course_chat_core::domain::connection::services::{
    ClientFrame, Connection, ConnectionEvent, ConnectionEventHandler, Connector,
};
use course_chat_core::domain::general::services::TimeProvider;
use course_chat_core::domain::history::models::{MessagePage, PageCursor, PageLoadError};
use course_chat_core::domain::messaging::models::{
    CourseId, DeliveryStatus, Message, MessageId, MessageKind, OutboundMessage, Sender,
    SenderRole, TempId, ThreadEvent, ThreadEventPayload,
};
use course_chat_core::domain::messaging::services::{
    HistoryService, MessageMutationService, TempIdProvider,
};
use course_chat_core::domain::mutations::models::MutationError;
use course_chat_core::domain::thread::FeedSnapshot;
use course_chat_core::{ChatClient, ChatConfig};

pub const COURSE: &str = "course-1";

pub fn reference_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 19, 9, 0, 0).unwrap()
}

/// `reference_date` plus `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    reference_date() + chrono::Duration::seconds(secs)
}

pub fn me() -> Sender {
    Sender {
        id: "jane.doe".into(),
        role: SenderRole::Student,
        name: Some("Jane Doe".to_string()),
        avatar: None,
    }
}

pub fn instructor() -> Sender {
    Sender {
        id: "prof.smith".into(),
        role: SenderRole::Instructor,
        name: Some("Prof. Smith".to_string()),
        avatar: None,
    }
}

pub fn confirmed(id: &str, secs: i64) -> Message {
    confirmed_in(COURSE, id, secs)
}

pub fn confirmed_in(course_id: &str, id: &str, secs: i64) -> Message {
    Message {
        id: Some(id.into()),
        temp_id: None,
        course_id: course_id.into(),
        sender: me(),
        kind: MessageKind::Text,
        content: Some(format!("Message {id}")),
        attachment: None,
        created_at: at(secs),
        edited_at: None,
        delivery_status: DeliveryStatus::Confirmed,
        update_status: None,
        delete_status: None,
        send_error: None,
    }
}

pub fn event(payload: ThreadEventPayload) -> ThreadEvent {
    ThreadEvent {
        course_id: COURSE.into(),
        timestamp: reference_date(),
        payload,
    }
}

/// Server id of every entry, or its temp id while it is not confirmed.
pub fn ids(feed: &FeedSnapshot) -> Vec<String> {
    feed.messages
        .iter()
        .map(|message| match (&message.id, &message.temp_id) {
            (Some(id), _) => id.to_string(),
            (None, Some(temp_id)) => temp_id.to_string(),
            (None, None) => String::new(),
        })
        .collect()
}

/// Polls the feed until `predicate` holds. Events travel through a background task, so tests
/// have to give it a chance to run.
pub async fn wait_for_feed(client: &ChatClient, predicate: impl Fn(&FeedSnapshot) -> bool) {
    for _ in 0..200 {
        if predicate(&client.thread.feed()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("Feed never reached the expected state: {:?}", client.thread.feed());
}

pub async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("Condition was never met.");
}

pub struct TestClient {
    pub client: ChatClient,
    pub server: FakeServer,
    pub history: Arc<FakeHistory>,
    pub mutations: Arc<FakeMutations>,
    pub clock: StepClock,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(ChatConfig {
            timeout_check_interval: Duration::from_millis(100),
            ..Default::default()
        })
    }

    pub fn with_config(config: ChatConfig) -> Self {
        let server = FakeServer::default();
        let history = Arc::new(FakeHistory::default());
        let mutations = Arc::new(FakeMutations::default());
        let clock = StepClock::new(reference_date());

        let client = ChatClient::builder()
            .set_backend(
                Arc::new(server.clone()),
                history.clone(),
                mutations.clone(),
            )
            .set_config(config)
            .set_time_provider(clock.clone())
            .set_temp_id_provider(SequentialTempIds::default())
            .build();

        Self {
            client,
            server,
            history,
            mutations,
            clock,
        }
    }

    pub async fn open(&self) {
        self.client
            .open_course(COURSE.into(), Credentials::new(me(), "token"))
            .await
            .expect("Failed to open course");
    }
}

#[derive(Default, Clone)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

#[derive(Default)]
struct ServerState {
    last_id: u64,
    handler: Option<(u64, Arc<dyn Fn(ConnectionEvent) + Send + Sync>)>,
    sent: Vec<OutboundMessage>,
}

impl FakeServer {
    pub fn push(&self, event: ThreadEvent) {
        let handler = self.state.lock().handler.as_ref().map(|(_, h)| h.clone());
        if let Some(handler) = handler {
            handler(ConnectionEvent::Event(event))
        }
    }

    pub fn drop_connection(&self) {
        let handler = self.state.lock().handler.take();
        if let Some((_, handler)) = handler {
            handler(ConnectionEvent::Disconnected {
                error: Some(TransportError::TimedOut),
            })
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(
        &self,
        _params: &ConnectParams,
        event_handler: ConnectionEventHandler,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let mut state = self.state.lock();
        state.last_id += 1;
        let id = state.last_id;
        state.handler = Some((id, Arc::from(event_handler)));
        Ok(Box::new(FakeServerConnection {
            id,
            state: self.state.clone(),
        }))
    }
}

struct FakeServerConnection {
    id: u64,
    state: Arc<Mutex<ServerState>>,
}

impl Connection for FakeServerConnection {
    fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !matches!(&state.handler, Some((id, _)) if *id == self.id) {
            return Err(TransportError::NotConnected);
        }
        if let ClientFrame::Message(message) = frame {
            state.sent.push(message);
        }
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        if matches!(&state.handler, Some((id, _)) if *id == self.id) {
            state.handler.take();
        }
    }
}

/// Serves queued pages per course. An empty queue answers with an empty, final page.
#[derive(Default)]
pub struct FakeHistory {
    pages: Mutex<HashMap<CourseId, VecDeque<MessagePage>>>,
    requests: Mutex<Vec<(CourseId, Option<MessageId>)>>,
    held: Mutex<Option<Arc<Notify>>>,
}

impl FakeHistory {
    pub fn enqueue(&self, course_id: &str, messages: Vec<Message>, has_more: bool) {
        self.pages
            .lock()
            .entry(course_id.into())
            .or_default()
            .push_back(MessagePage { messages, has_more });
    }

    /// Holds the next request until the returned `Notify` is triggered.
    pub fn hold_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().replace(gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<(CourseId, Option<MessageId>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HistoryService for FakeHistory {
    async fn load_page(
        &self,
        course_id: &CourseId,
        before: Option<PageCursor>,
        _limit: u32,
    ) -> Result<MessagePage, PageLoadError> {
        self.requests
            .lock()
            .push((course_id.clone(), before.map(|cursor| cursor.message_id)));

        let gate = self.held.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(self
            .pages
            .lock()
            .get_mut(course_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(MessagePage {
                messages: vec![],
                has_more: false,
            }))
    }
}

#[derive(Default)]
pub struct FakeMutations {
    update_result: Mutex<Option<Result<Message, MutationError>>>,
    held_delete: Mutex<Option<Arc<Notify>>>,
    calls: AtomicUsize,
}

impl FakeMutations {
    pub fn respond_to_update(&self, result: Result<Message, MutationError>) {
        self.update_result.lock().replace(result);
    }

    /// Holds the next delete until the returned `Notify` is triggered.
    pub fn hold_next_delete(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held_delete.lock().replace(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageMutationService for FakeMutations {
    async fn update_message(
        &self,
        _id: &MessageId,
        _content: &str,
    ) -> Result<Message, MutationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.update_result
            .lock()
            .take()
            .unwrap_or(Err(MutationError::Network {
                msg: "No response configured".to_string(),
            }))
    }

    async fn delete_message(&self, _id: &MessageId) -> Result<(), MutationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.held_delete.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct StepClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl StepClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        *now = *now + chrono::Duration::from_std(duration).unwrap();
    }
}

impl TimeProvider for StepClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Hands out `t1`, `t2`, …
#[derive(Default)]
pub struct SequentialTempIds {
    last: AtomicUsize,
}

impl TempIdProvider for SequentialTempIds {
    fn new_temp_id(&self) -> TempId {
        format!("t{}", self.last.fetch_add(1, Ordering::SeqCst) + 1).into()
    }
}
