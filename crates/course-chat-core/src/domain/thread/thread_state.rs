// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::feed::{FeedChange, UnifiedFeed};
use crate::domain::history::models::{MessagePage, PageLoadError, PageLoadOutcome};
use crate::domain::history::{HistoryPager, PageCompletion, PageFetch, PageRequest};
use crate::domain::messaging::models::{
    AckStatus, CourseId, DeliveryAck, Message, MessageDraft, MessageId, MessageKey,
    OutboundMessage, Sender, TempId, ThreadEvent, ThreadEventPayload, UserId,
};
use crate::domain::mutations::models::MutationError;
use crate::domain::mutations::MutationCoordinator;
use crate::domain::sending::models::SendError;
use crate::domain::sending::PendingSendLedger;

use super::FeedSnapshot;

/// All state of the active course thread.
///
/// Every input (pages, live events, local intents, request outcomes) is folded through one of
/// the methods below while the owner holds exclusive access, so each of them is applied
/// completely or not at all.
#[derive(Debug)]
pub struct ThreadState {
    course_id: CourseId,
    feed: UnifiedFeed,
    pager: HistoryPager,
    ledger: PendingSendLedger,
    mutations: MutationCoordinator,
}

impl ThreadState {
    /// `generation` must be greater than the one of any state this one replaces.
    pub fn new(course_id: CourseId, generation: u64) -> Self {
        Self {
            course_id,
            feed: UnifiedFeed::new(),
            pager: HistoryPager::with_generation(generation),
            ledger: PendingSendLedger::new(),
            mutations: MutationCoordinator::new(),
        }
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub fn feed(&self) -> &UnifiedFeed {
        &self.feed
    }

    pub fn pager(&self) -> &HistoryPager {
        &self.pager
    }

    pub fn ledger(&self) -> &PendingSendLedger {
        &self.ledger
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    /// Drops everything belonging to the current course and invalidates requests in flight.
    pub fn switch_course(&mut self, course_id: CourseId) {
        self.course_id = course_id;
        self.pager.reset();
        self.feed.clear();
        self.ledger.clear();
        self.mutations.clear();
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let mut deleting = self
            .mutations
            .deleting()
            .filter_map(|message| message.id.clone())
            .collect::<Vec<_>>();
        deleting.sort();

        FeedSnapshot {
            course_id: Some(self.course_id.clone()),
            revision: self.feed.revision(),
            messages: self.feed.messages(),
            deleting,
        }
    }
}

impl ThreadState {
    pub fn apply_event(&mut self, event: ThreadEvent, now: DateTime<Utc>) -> Vec<FeedChange> {
        if event.course_id != self.course_id {
            warn!(
                "Discarding event for course '{}' while '{}' is active.",
                event.course_id, self.course_id
            );
            return vec![];
        }

        match event.payload {
            ThreadEventPayload::NewMessage(message) => self.apply_confirmed(message),
            ThreadEventPayload::MessageEdited(edit) => {
                self.mutations.observe_remote_edit(&edit.id, &edit.revision);
                self.feed.apply_edit(edit).into_iter().collect()
            }
            ThreadEventPayload::MessageDeleted { id } => {
                self.mutations.observe_remote_delete(&id);
                self.feed.remove_confirmed(&id).into_iter().collect()
            }
            ThreadEventPayload::DeliveryAck(ack) => self.apply_ack(ack, event.timestamp, now),
            ThreadEventPayload::DeliveryError { temp_id, reason } => self
                .fail_send(&temp_id, SendError::DeliveryRejected { reason })
                .into_iter()
                .collect(),
            ThreadEventPayload::Presence(_) => vec![],
        }
    }

    pub fn fold_page(&mut self, page: MessagePage) -> Vec<FeedChange> {
        page.messages
            .into_iter()
            .flat_map(|message| self.apply_confirmed(message))
            .collect()
    }

    fn apply_confirmed(&mut self, message: Message) -> Vec<FeedChange> {
        let Some(id) = message.id.clone() else {
            warn!("Ignoring confirmed message without id.");
            return vec![];
        };
        if let Some(temp_id) = &message.temp_id {
            self.ledger.confirm(temp_id);
        }
        // The feed keeps the optimistic text unless this copy is newer. Either way a rollback
        // must restore the newest server state.
        if self.mutations.is_editing(&id) {
            self.mutations.observe_remote_edit(&id, &message.revision());
        }
        self.feed.upsert_confirmed(message).into_iter().collect()
    }

    fn apply_ack(
        &mut self,
        ack: DeliveryAck,
        server_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<FeedChange> {
        let temp_id = ack.temp_id;

        if ack.status == AckStatus::Rejected {
            let reason = ack
                .reason
                .unwrap_or_else(|| "Rejected by server".to_string());
            return self
                .fail_send(&temp_id, SendError::DeliveryRejected { reason })
                .into_iter()
                .collect();
        }

        match (ack.message, ack.message_id) {
            (Some(mut message), _) => {
                message.temp_id.get_or_insert_with(|| temp_id.clone());
                self.apply_confirmed(message)
            }
            (None, Some(id)) => {
                self.ledger.confirm(&temp_id);
                self.feed
                    .promote_local(&temp_id, id, server_time)
                    .into_iter()
                    .collect()
            }
            (None, None) => {
                if !self.ledger.await_echo(&temp_id, now) {
                    debug!("Ignoring ack for unknown or settled send '{temp_id}'.");
                }
                vec![]
            }
        }
    }
}

impl ThreadState {
    pub fn submit(
        &mut self,
        temp_id: TempId,
        sender: Sender,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Vec<FeedChange> {
        let placeholder =
            self.ledger
                .submit(temp_id, self.course_id.clone(), sender, draft, now);
        self.feed.insert_local(placeholder).into_iter().collect()
    }

    pub fn unsent(&self) -> Vec<TempId> {
        self.ledger.unsent()
    }

    pub fn mark_sending(&mut self, temp_id: &TempId, now: DateTime<Utc>) -> Option<OutboundMessage> {
        self.ledger.mark_sending(temp_id, now)
    }

    pub fn mark_unsent(&mut self, temp_id: &TempId) {
        self.ledger.mark_unsent(temp_id)
    }

    pub fn fail_send(&mut self, temp_id: &TempId, error: SendError) -> Option<FeedChange> {
        if !self.ledger.fail(temp_id, error.clone()) {
            debug!("Ignoring failure of unknown or settled send '{temp_id}'.");
            return None;
        }
        self.feed.mark_failed(temp_id, error)
    }

    pub fn retry(
        &mut self,
        temp_id: &TempId,
        new_temp_id: TempId,
        sender: Sender,
        now: DateTime<Utc>,
    ) -> Option<Vec<FeedChange>> {
        let placeholder = self.ledger.retry(temp_id, new_temp_id, sender, now)?;
        let previous = MessageKey::Local(temp_id.clone());
        self.feed.take(&previous);

        let mut changes = vec![FeedChange::Removed(previous)];
        changes.extend(self.feed.insert_local(placeholder));
        Some(changes)
    }

    pub fn discard_failed(&mut self, temp_id: &TempId) -> Option<FeedChange> {
        if !self.ledger.discard(temp_id) {
            return None;
        }
        let key = MessageKey::Local(temp_id.clone());
        self.feed.take(&key).map(|_| FeedChange::Removed(key))
    }

    pub fn expire_sends(
        &mut self,
        now: DateTime<Utc>,
        send_timeout: Duration,
        echo_timeout: Duration,
    ) -> Vec<FeedChange> {
        self.ledger
            .expire(now, send_timeout, echo_timeout)
            .into_iter()
            .filter_map(|(temp_id, error)| self.feed.mark_failed(&temp_id, error))
            .collect()
    }

    /// Re-queues or fails sends that were in flight when the connection dropped.
    pub fn settle_stale_sends(
        &mut self,
        now: DateTime<Utc>,
        grace_window: Duration,
        max_resends: u32,
    ) -> Vec<FeedChange> {
        let stale = self.ledger.take_stale(now, grace_window, max_resends);
        stale
            .failed
            .into_iter()
            .filter_map(|(temp_id, error)| self.feed.mark_failed(&temp_id, error))
            .collect()
    }
}

impl ThreadState {
    pub fn begin_page_load(&mut self) -> PageFetch {
        self.pager.begin(self.feed.oldest_cursor())
    }

    pub fn complete_page_load(
        &mut self,
        request: &PageRequest,
        result: Result<MessagePage, PageLoadError>,
    ) -> (Vec<FeedChange>, Result<PageLoadOutcome, PageLoadError>) {
        match self.pager.complete(request, result) {
            PageCompletion::Accepted(page) => {
                let anchor = self.feed.first_key();
                let has_more = page.has_more;
                let changes = self.fold_page(page);
                let inserted = changes
                    .iter()
                    .filter(|change| {
                        matches!(
                            change,
                            FeedChange::Inserted(_) | FeedChange::Replaced { .. }
                        )
                    })
                    .count();
                (
                    changes,
                    Ok(PageLoadOutcome::Loaded {
                        anchor,
                        inserted,
                        has_more,
                    }),
                )
            }
            PageCompletion::Failed(err) => (vec![], Err(err)),
            PageCompletion::Discarded => (vec![], Ok(PageLoadOutcome::Discarded)),
        }
    }

    /// A request for the newest page which leaves the pagination cursor alone.
    pub fn catch_up_request(&self) -> PageRequest {
        PageRequest {
            generation: self.pager.generation(),
            before: None,
        }
    }

    pub fn complete_catch_up(
        &mut self,
        request: &PageRequest,
        result: Result<MessagePage, PageLoadError>,
    ) -> Vec<FeedChange> {
        if !self.pager.is_current(request.generation) {
            debug!("Discarding catch-up page of a previous generation.");
            return vec![];
        }
        match result {
            Ok(page) => self.fold_page(page),
            Err(err) => {
                warn!("Failed to catch up after reconnect. {err}");
                vec![]
            }
        }
    }
}

impl ThreadState {
    pub fn begin_edit(
        &mut self,
        id: &MessageId,
        content: &str,
        user_id: &UserId,
    ) -> Result<Vec<FeedChange>, MutationError> {
        self.mutations
            .begin_edit(&mut self.feed, id, content, user_id)
    }

    pub fn complete_edit(
        &mut self,
        id: &MessageId,
        result: Result<Message, MutationError>,
    ) -> (Vec<FeedChange>, Result<(), MutationError>) {
        self.mutations.complete_edit(&mut self.feed, id, result)
    }

    pub fn begin_delete(
        &mut self,
        id: &MessageId,
        user_id: &UserId,
    ) -> Result<Vec<FeedChange>, MutationError> {
        self.mutations.begin_delete(&mut self.feed, id, user_id)
    }

    pub fn complete_delete(
        &mut self,
        id: &MessageId,
        result: Result<(), MutationError>,
    ) -> (Vec<FeedChange>, Result<(), MutationError>) {
        self.mutations.complete_delete(&mut self.feed, id, result)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::domain::messaging::models::{DeliveryStatus, MutationStatus};
    use crate::test::{mock_sender, MessageBuilder};

    use super::*;

    fn ts(idx: u32) -> DateTime<Utc> {
        MessageBuilder::timestamp_for_index(idx)
    }

    fn event(payload: ThreadEventPayload) -> ThreadEvent {
        ThreadEvent {
            course_id: MessageBuilder::course_id(),
            timestamp: ts(50),
            payload,
        }
    }

    fn keys(state: &ThreadState) -> Vec<String> {
        state
            .feed()
            .messages()
            .iter()
            .map(|message| message.key().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_ack_with_id_promotes_placeholder() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.submit("t1".into(), mock_sender(), MessageDraft::text("Hi"), ts(1));
        state.mark_sending(&"t1".into(), ts(1));

        state.apply_event(
            event(ThreadEventPayload::DeliveryAck(DeliveryAck {
                temp_id: "t1".into(),
                status: AckStatus::Accepted,
                message: None,
                message_id: Some("m1".into()),
                reason: None,
            })),
            ts(2),
        );

        assert_eq!(keys(&state), vec!["id:m1"]);
        let message = state.feed().get_by_id(&"m1".into()).unwrap();
        assert_eq!(message.created_at, ts(50));
        assert_eq!(message.delivery_status, DeliveryStatus::Confirmed);
        assert!(state.ledger().is_empty());

        // The echo arriving afterwards must not add a second entry.
        state.apply_event(
            event(ThreadEventPayload::NewMessage(
                MessageBuilder::new_with_id("m1")
                    .set_temp_id("t1")
                    .set_content("Hi")
                    .set_created_at(ts(50))
                    .build_message(),
            )),
            ts(3),
        );
        assert_eq!(keys(&state), vec!["id:m1"]);
    }

    #[test]
    fn test_rejected_ack_fails_placeholder() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.submit("t1".into(), mock_sender(), MessageDraft::text("Hi"), ts(1));
        state.mark_sending(&"t1".into(), ts(1));

        state.apply_event(
            event(ThreadEventPayload::DeliveryAck(DeliveryAck {
                temp_id: "t1".into(),
                status: AckStatus::Rejected,
                message: None,
                message_id: None,
                reason: Some("Muted".to_string()),
            })),
            ts(2),
        );

        let message = state.feed().get_by_temp_id(&"t1".into()).unwrap();
        assert_eq!(message.delivery_status, DeliveryStatus::Error);
        assert_eq!(
            message.send_error,
            Some(SendError::DeliveryRejected {
                reason: "Muted".to_string()
            })
        );
    }

    #[test]
    fn test_late_echo_replaces_failed_entry() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.submit("t1".into(), mock_sender(), MessageDraft::text("Hi"), ts(1));
        state.mark_sending(&"t1".into(), ts(1));
        state.expire_sends(ts(30), Duration::from_secs(15), Duration::from_secs(10));

        assert_eq!(
            state.feed().get_by_temp_id(&"t1".into()).unwrap().delivery_status,
            DeliveryStatus::Error
        );

        state.apply_event(
            event(ThreadEventPayload::NewMessage(
                MessageBuilder::new_with_id("m1")
                    .set_temp_id("t1")
                    .build_message(),
            )),
            ts(31),
        );

        assert_eq!(keys(&state), vec!["id:m1"]);
        assert!(state.ledger().is_empty());
    }

    #[test]
    fn test_discards_events_of_other_courses() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);

        let changes = state.apply_event(
            ThreadEvent {
                course_id: "other-course".into(),
                timestamp: ts(1),
                payload: ThreadEventPayload::NewMessage(
                    MessageBuilder::new_with_index(1).build_message(),
                ),
            },
            ts(1),
        );

        assert!(changes.is_empty());
        assert!(state.feed().is_empty());
    }

    #[test]
    fn test_page_load_reports_anchor() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.fold_page(MessagePage {
            messages: vec![MessageBuilder::new_with_index(10).build_message()],
            has_more: true,
        });

        let PageFetch::Fetch(request) = state.begin_page_load() else {
            panic!("Expected a fetch");
        };
        assert_eq!(
            request.before.as_ref().map(|cursor| cursor.message_id.clone()),
            Some("msg-10".into())
        );

        let (_, outcome) = state.complete_page_load(
            &request,
            Ok(MessagePage {
                messages: vec![
                    MessageBuilder::new_with_index(8).build_message(),
                    MessageBuilder::new_with_index(9).build_message(),
                ],
                has_more: false,
            }),
        );

        assert_eq!(
            outcome,
            Ok(PageLoadOutcome::Loaded {
                anchor: Some(MessageKey::Server("msg-10".into())),
                inserted: 2,
                has_more: false,
            })
        );
        assert_eq!(keys(&state), vec!["id:msg-8", "id:msg-9", "id:msg-10"]);
        assert_eq!(state.begin_page_load(), PageFetch::Exhausted);
    }

    #[test]
    fn test_replaced_state_discards_stale_page() {
        let mut previous = ThreadState::new(MessageBuilder::course_id(), 1);

        let PageFetch::Fetch(request) = previous.begin_page_load() else {
            panic!("Expected a fetch");
        };
        let catch_up = previous.catch_up_request();
        let mut state = ThreadState::new("course-2".into(), 2);

        let page = MessagePage {
            messages: vec![MessageBuilder::new_with_index(1).build_message()],
            has_more: true,
        };

        let (changes, outcome) = state.complete_page_load(&request, Ok(page.clone()));
        assert!(changes.is_empty());
        assert_eq!(outcome, Ok(PageLoadOutcome::Discarded));
        assert!(state.complete_catch_up(&catch_up, Ok(page)).is_empty());
        assert!(state.feed().is_empty());
    }

    #[test]
    fn test_switch_course_discards_stale_page() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.submit("t1".into(), mock_sender(), MessageDraft::text("Hi"), ts(1));

        let PageFetch::Fetch(request) = state.begin_page_load() else {
            panic!("Expected a fetch");
        };
        state.switch_course("course-2".into());

        let (changes, outcome) = state.complete_page_load(
            &request,
            Ok(MessagePage {
                messages: vec![MessageBuilder::new_with_index(1).build_message()],
                has_more: true,
            }),
        );

        assert!(changes.is_empty());
        assert_eq!(outcome, Ok(PageLoadOutcome::Discarded));
        assert!(state.feed().is_empty());
        assert!(state.ledger().is_empty());
        assert_eq!(state.course_id(), &CourseId::from("course-2"));
    }

    fn own_message(state: &mut ThreadState, idx: u32) {
        state.fold_page(MessagePage {
            messages: vec![MessageBuilder::new_with_index(idx).build_message()],
            has_more: false,
        });
    }

    #[test]
    fn test_redelivery_during_delete_does_not_resurrect_message() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        own_message(&mut state, 1);

        state
            .begin_delete(&"msg-1".into(), &mock_sender().id)
            .unwrap();

        // The message shows up again on every source while the request is running.
        let request = state.catch_up_request();
        let page = MessagePage {
            messages: vec![MessageBuilder::new_with_index(1).build_message()],
            has_more: true,
        };
        assert!(state.complete_catch_up(&request, Ok(page.clone())).is_empty());
        assert!(state.fold_page(page).is_empty());
        assert!(state
            .apply_event(
                event(ThreadEventPayload::NewMessage(
                    MessageBuilder::new_with_index(1).build_message()
                )),
                ts(2),
            )
            .is_empty());

        assert!(state.feed().is_empty());
        assert_eq!(state.snapshot().deleting, vec![MessageId::from("msg-1")]);

        let (_, result) = state.complete_delete(&"msg-1".into(), Ok(()));

        assert_eq!(result, Ok(()));
        assert!(state.feed().is_empty());
        assert!(state.snapshot().deleting.is_empty());
    }

    #[test]
    fn test_rejected_delete_after_redelivery_shows_message_once() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        own_message(&mut state, 1);

        state
            .begin_delete(&"msg-1".into(), &mock_sender().id)
            .unwrap();
        own_message(&mut state, 1);

        let (changes, result) =
            state.complete_delete(&"msg-1".into(), Err(MutationError::Forbidden));

        assert_eq!(result, Err(MutationError::Forbidden));
        assert_eq!(
            changes,
            vec![FeedChange::Inserted(MessageKey::Server("msg-1".into()))]
        );
        assert_eq!(keys(&state), vec!["id:msg-1"]);
        assert_eq!(state.feed().get_by_id(&"msg-1".into()).unwrap().delete_status, None);
    }

    #[test]
    fn test_redelivery_during_edit_keeps_optimistic_content() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        own_message(&mut state, 1);

        state
            .begin_edit(&"msg-1".into(), "Edited", &mock_sender().id)
            .unwrap();

        own_message(&mut state, 1);
        state.apply_event(
            event(ThreadEventPayload::NewMessage(
                MessageBuilder::new_with_index(1).build_message(),
            )),
            ts(2),
        );

        let message = state.feed().get_by_id(&"msg-1".into()).unwrap();
        assert_eq!(message.content.as_deref(), Some("Edited"));
        assert_eq!(message.update_status, Some(MutationStatus::InFlight));

        let (_, result) = state.complete_edit(&"msg-1".into(), Err(MutationError::Forbidden));
        assert_eq!(result, Err(MutationError::Forbidden));

        let message = state.feed().get_by_id(&"msg-1".into()).unwrap();
        assert_eq!(message.content.as_deref(), Some("Message 1"));
        assert_eq!(message.update_status, None);
    }

    #[test]
    fn test_rollback_after_newer_redelivery_restores_server_state() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        own_message(&mut state, 1);

        state
            .begin_edit(&"msg-1".into(), "Edited", &mock_sender().id)
            .unwrap();

        state.fold_page(MessagePage {
            messages: vec![MessageBuilder::new_with_index(1)
                .set_content("Edited elsewhere")
                .set_edited_at(ts(20))
                .build_message()],
            has_more: false,
        });

        let message = state.feed().get_by_id(&"msg-1".into()).unwrap();
        assert_eq!(message.update_status, Some(MutationStatus::InFlight));

        state.complete_edit(&"msg-1".into(), Err(MutationError::Forbidden));

        let message = state.feed().get_by_id(&"msg-1".into()).unwrap();
        assert_eq!(message.content.as_deref(), Some("Edited elsewhere"));
        assert_eq!(message.edited_at, Some(ts(20)));
    }

    #[test]
    fn test_retry_replaces_failed_entry() {
        let mut state = ThreadState::new(MessageBuilder::course_id(), 1);
        state.submit("t1".into(), mock_sender(), MessageDraft::text("Hi"), ts(1));
        state.fail_send(&"t1".into(), SendError::TimedOut);

        let changes = state
            .retry(&"t1".into(), "t2".into(), mock_sender(), ts(5))
            .unwrap();

        assert_eq!(
            changes,
            vec![
                FeedChange::Removed(MessageKey::Local("t1".into())),
                FeedChange::Inserted(MessageKey::Local("t2".into())),
            ]
        );
        assert_eq!(keys(&state), vec!["temp:t2"]);
    }
}
