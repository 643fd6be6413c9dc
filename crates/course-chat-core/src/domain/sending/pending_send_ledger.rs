// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::messaging::models::{
    CourseId, DeliveryStatus, Message, MessageDraft, OutboundMessage, Sender, TempId,
};
use crate::util::time_delta;

use super::models::SendError;

#[derive(Debug, Clone, PartialEq)]
pub enum SendState {
    /// Waiting for a connection to go out on.
    Unsent,
    /// Handed to the transport, waiting for an ack, an error or the echo.
    Sending { since: DateTime<Utc> },
    /// The server accepted the message but did not include it in the ack.
    AwaitingEcho { acked_at: DateTime<Utc> },
    Failed(SendError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub temp_id: TempId,
    pub course_id: CourseId,
    pub draft: MessageDraft,
    pub submitted_at: DateTime<Utc>,
    pub state: SendState,
    pub resend_count: u32,
}

impl PendingSend {
    pub fn outbound(&self) -> OutboundMessage {
        OutboundMessage::new(self.temp_id.clone(), self.course_id.clone(), &self.draft)
    }
}

/// What to do with entries that were in flight when the connection dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StaleSends {
    pub resend: Vec<TempId>,
    pub failed: Vec<(TempId, SendError)>,
}

/// Bookkeeping for messages submitted locally and not yet confirmed.
///
/// The ledger never writes the feed. It hands out placeholders and tells its owner which
/// entries changed state, the owner folds those into the `UnifiedFeed`.
#[derive(Debug, Default)]
pub struct PendingSendLedger {
    entries: HashMap<TempId, PendingSend>,
}

impl PendingSendLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, temp_id: &TempId) -> Option<&PendingSend> {
        self.entries.get(temp_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a draft and returns the placeholder to show. Drafts failing local validation
    /// are registered as failed right away so that they remain visible with a retry affordance.
    pub fn submit(
        &mut self,
        temp_id: TempId,
        course_id: CourseId,
        sender: Sender,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Message {
        let (state, delivery_status, send_error) = match draft.validate() {
            Ok(()) => (SendState::Unsent, DeliveryStatus::Pending, None),
            Err(err) => (
                SendState::Failed(err.clone()),
                DeliveryStatus::Error,
                Some(err),
            ),
        };

        let placeholder = Message {
            id: None,
            temp_id: Some(temp_id.clone()),
            course_id: course_id.clone(),
            sender,
            kind: draft.kind,
            content: draft.content.clone(),
            attachment: draft.attachment.clone(),
            created_at: now,
            edited_at: None,
            delivery_status,
            update_status: None,
            delete_status: None,
            send_error,
        };

        self.entries.insert(
            temp_id.clone(),
            PendingSend {
                temp_id,
                course_id,
                draft,
                submitted_at: now,
                state,
                resend_count: 0,
            },
        );

        placeholder
    }

    /// Temp ids waiting for a connection, oldest first.
    pub fn unsent(&self) -> Vec<TempId> {
        let mut unsent = self
            .entries
            .values()
            .filter(|entry| entry.state == SendState::Unsent)
            .map(|entry| (entry.submitted_at, entry.temp_id.clone()))
            .collect::<Vec<_>>();
        unsent.sort();
        unsent.into_iter().map(|(_, temp_id)| temp_id).collect()
    }

    /// Moves an unsent entry to `Sending` and returns the frame to put on the wire.
    pub fn mark_sending(&mut self, temp_id: &TempId, now: DateTime<Utc>) -> Option<OutboundMessage> {
        let entry = self.entries.get_mut(temp_id)?;
        if entry.state != SendState::Unsent {
            return None;
        }
        entry.state = SendState::Sending { since: now };
        Some(entry.outbound())
    }

    /// Puts an entry back into the queue after the transport refused to take it.
    pub fn mark_unsent(&mut self, temp_id: &TempId) {
        if let Some(entry) = self.entries.get_mut(temp_id) {
            if matches!(entry.state, SendState::Sending { .. }) {
                entry.state = SendState::Unsent;
            }
        }
    }

    /// The server accepted the message without including it. Returns `false` for unknown
    /// or already resolved entries.
    pub fn await_echo(&mut self, temp_id: &TempId, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.entries.get_mut(temp_id) else {
            return false;
        };
        match entry.state {
            SendState::Unsent | SendState::Sending { .. } => {
                entry.state = SendState::AwaitingEcho { acked_at: now };
                true
            }
            SendState::AwaitingEcho { .. } | SendState::Failed(_) => false,
        }
    }

    /// Removes an entry whose confirmed counterpart arrived. Returns `true` if it was known.
    pub fn confirm(&mut self, temp_id: &TempId) -> bool {
        self.entries.remove(temp_id).is_some()
    }

    /// Marks an in-flight entry as failed. Returns `false` if there was nothing to fail.
    pub fn fail(&mut self, temp_id: &TempId, error: SendError) -> bool {
        let Some(entry) = self.entries.get_mut(temp_id) else {
            return false;
        };
        if matches!(entry.state, SendState::Failed(_)) {
            return false;
        }
        entry.state = SendState::Failed(error);
        true
    }

    /// Fails every entry that has been waiting longer than its window.
    ///
    /// Unsent and sending entries are measured against `send_timeout` (from submission and from
    /// the last send attempt respectively), entries awaiting their echo against `echo_timeout`.
    pub fn expire(
        &mut self,
        now: DateTime<Utc>,
        send_timeout: Duration,
        echo_timeout: Duration,
    ) -> Vec<(TempId, SendError)> {
        let send_timeout = time_delta(send_timeout);
        let echo_timeout = time_delta(echo_timeout);
        let mut expired = vec![];

        for entry in self.entries.values_mut() {
            let error = match entry.state {
                SendState::Unsent if now - entry.submitted_at >= send_timeout => {
                    SendError::TimedOut
                }
                SendState::Sending { since } if now - since >= send_timeout => SendError::TimedOut,
                SendState::AwaitingEcho { acked_at } if now - acked_at >= echo_timeout => {
                    SendError::EchoTimedOut
                }
                _ => continue,
            };

            debug!("Send of {} expired. {error}", entry.temp_id);
            entry.state = SendState::Failed(error.clone());
            expired.push((entry.temp_id.clone(), error));
        }

        expired.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        expired
    }

    /// Sorts out entries that were in flight for longer than `grace_window` when the connection
    /// came back. They are queued for resending until `max_resends` is reached and failed after.
    pub fn take_stale(
        &mut self,
        now: DateTime<Utc>,
        grace_window: Duration,
        max_resends: u32,
    ) -> StaleSends {
        let grace_window = time_delta(grace_window);
        let mut stale = StaleSends::default();

        for entry in self.entries.values_mut() {
            let SendState::Sending { since } = entry.state else {
                continue;
            };
            if now - since < grace_window {
                continue;
            }

            if entry.resend_count < max_resends {
                entry.resend_count += 1;
                entry.state = SendState::Unsent;
                stale.resend.push(entry.temp_id.clone());
            } else {
                entry.state = SendState::Failed(SendError::TimedOut);
                stale.failed.push((entry.temp_id.clone(), SendError::TimedOut));
            }
        }

        stale.resend.sort();
        stale.failed.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));

        if !stale.resend.is_empty() || !stale.failed.is_empty() {
            info!(
                "Found {} stale sends to resend and {} to fail.",
                stale.resend.len(),
                stale.failed.len()
            );
        }

        stale
    }

    /// Replaces a failed entry with a fresh submission of the same draft under `new_temp_id`.
    /// Returns the new placeholder, or `None` if `temp_id` doesn't name a failed entry.
    pub fn retry(
        &mut self,
        temp_id: &TempId,
        new_temp_id: TempId,
        sender: Sender,
        now: DateTime<Utc>,
    ) -> Option<Message> {
        let entry = self.entries.get(temp_id)?;
        if !matches!(entry.state, SendState::Failed(_)) {
            return None;
        }
        let entry = self.entries.remove(temp_id)?;
        Some(self.submit(new_temp_id, entry.course_id, sender, entry.draft, now))
    }

    /// Drops a failed entry. Returns `false` if `temp_id` doesn't name a failed entry.
    pub fn discard(&mut self, temp_id: &TempId) -> bool {
        let is_failed = self
            .entries
            .get(temp_id)
            .map(|entry| matches!(entry.state, SendState::Failed(_)))
            .unwrap_or(false);
        if is_failed {
            self.entries.remove(temp_id);
        }
        is_failed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
