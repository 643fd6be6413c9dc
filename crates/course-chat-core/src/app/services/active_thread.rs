// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::deps::DynClientEventDispatcher;
use crate::client_event::FeedEventType;
use crate::domain::feed::FeedChange;
use crate::domain::messaging::models::CourseId;
use crate::domain::messaging::services::MessageTransport;
use crate::domain::thread::{FeedSnapshot, ThreadState};
use crate::ClientEvent;

#[derive(Default)]
struct Slot {
    thread: Option<ThreadState>,
    /// Generation of the last thread that was closed.
    generation: u64,
}

/// Owns the state of the course thread that is currently open.
///
/// All reads and writes go through a single lock which is never held across an `.await`.
/// After every effective change the new snapshot is published and the changes are dispatched to
/// the delegate, both outside the lock.
pub struct ActiveThread {
    slot: Mutex<Slot>,
    snapshot: watch::Sender<FeedSnapshot>,
    client_event_dispatcher: DynClientEventDispatcher,
}

impl ActiveThread {
    pub fn new(client_event_dispatcher: DynClientEventDispatcher) -> Self {
        let (snapshot, _) = watch::channel(FeedSnapshot::default());
        Self {
            slot: Default::default(),
            snapshot,
            client_event_dispatcher,
        }
    }

    pub fn open(&self, course_id: CourseId) {
        let snapshot = {
            let mut slot = self.slot.lock();
            let generation = slot.generation + 1;
            if let Some(thread) = slot.thread.as_mut() {
                info!("Switching from course {} to {course_id}.", thread.course_id());
                thread.switch_course(course_id.clone());
            } else {
                info!("Opening course {course_id}.");
                slot.thread = Some(ThreadState::new(course_id.clone(), generation));
            }
            slot.thread
                .as_ref()
                .map(ThreadState::snapshot)
                .unwrap_or_default()
        };

        self.snapshot.send_replace(snapshot);
        self.client_event_dispatcher
            .dispatch_event(ClientEvent::FeedChanged {
                course_id,
                r#type: FeedEventType::MessagesNeedReload,
            });
    }

    pub fn close(&self) {
        {
            let mut slot = self.slot.lock();
            let Some(thread) = slot.thread.take() else {
                return;
            };
            info!("Closing course {}.", thread.course_id());
            slot.generation = thread.pager().generation();
        }
        self.snapshot.send_replace(FeedSnapshot::default());
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.read(|thread| thread.course_id().clone())
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot.subscribe()
    }

    /// Runs `f` against the open thread. Returns `None` if no thread is open.
    pub fn read<T>(&self, f: impl FnOnce(&ThreadState) -> T) -> Option<T> {
        self.slot.lock().thread.as_ref().map(f)
    }

    /// Runs `f` against the open thread and publishes its effect.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut ThreadState) -> (Vec<FeedChange>, T),
    ) -> Option<T> {
        self.apply(f, false)
    }

    /// Like `update` but tells the delegate to render the feed from scratch if anything changed.
    pub fn reload<T>(
        &self,
        f: impl FnOnce(&mut ThreadState) -> (Vec<FeedChange>, T),
    ) -> Option<T> {
        self.apply(f, true)
    }

    /// Hands all queued messages to `transport`, oldest first. Stops at the first refusal and
    /// leaves the rest queued. Returns the number of messages sent.
    pub fn flush_unsent(&self, transport: &dyn MessageTransport, now: DateTime<Utc>) -> usize {
        self.update(|thread| {
            let mut sent = 0;
            for temp_id in thread.unsent() {
                let Some(message) = thread.mark_sending(&temp_id, now) else {
                    continue;
                };
                if let Err(err) = transport.send(message) {
                    warn!("Could not hand message {temp_id} to the transport. {err}");
                    thread.mark_unsent(&temp_id);
                    break;
                }
                sent += 1;
            }
            (vec![], sent)
        })
        .unwrap_or(0)
    }
}

impl ActiveThread {
    fn apply<T>(
        &self,
        f: impl FnOnce(&mut ThreadState) -> (Vec<FeedChange>, T),
        reload: bool,
    ) -> Option<T> {
        let (course_id, changes, snapshot, value) = {
            let mut slot = self.slot.lock();
            let thread = slot.thread.as_mut()?;

            let revision = thread.feed().revision();
            let (changes, value) = f(thread);
            let snapshot = (thread.feed().revision() != revision).then(|| thread.snapshot());

            (thread.course_id().clone(), changes, snapshot, value)
        };

        if let Some(snapshot) = snapshot {
            self.snapshot.send_replace(snapshot);
        }
        self.dispatch_changes(course_id, changes, reload);

        Some(value)
    }

    fn dispatch_changes(&self, course_id: CourseId, changes: Vec<FeedChange>, reload: bool) {
        if changes.is_empty() {
            return;
        }

        if reload {
            self.client_event_dispatcher
                .dispatch_event(ClientEvent::FeedChanged {
                    course_id,
                    r#type: FeedEventType::MessagesNeedReload,
                });
            return;
        }

        let mut appended = vec![];
        let mut updated = vec![];
        let mut deleted = vec![];

        for change in changes {
            match change {
                FeedChange::Inserted(key) => appended.push(key),
                FeedChange::Updated(key) => updated.push(key),
                FeedChange::Removed(key) => deleted.push(key),
                FeedChange::Replaced { previous, current } => {
                    deleted.push(previous);
                    appended.push(current);
                }
            }
        }

        let events = [
            FeedEventType::MessagesDeleted { keys: deleted },
            FeedEventType::MessagesAppended { keys: appended },
            FeedEventType::MessagesUpdated { keys: updated },
        ];

        for r#type in events {
            let is_empty = match &r#type {
                FeedEventType::MessagesAppended { keys }
                | FeedEventType::MessagesUpdated { keys }
                | FeedEventType::MessagesDeleted { keys } => keys.is_empty(),
                FeedEventType::MessagesNeedReload => false,
            };
            if is_empty {
                continue;
            }
            self.client_event_dispatcher
                .dispatch_event(ClientEvent::FeedChanged {
                    course_id: course_id.clone(),
                    r#type,
                });
        }
    }
}
