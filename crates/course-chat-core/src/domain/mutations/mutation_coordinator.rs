// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::feed::{FeedChange, UnifiedFeed};
use crate::domain::messaging::models::{
    Message, MessageId, MessageKey, MessageKind, MessageRevision, MutationStatus, UserId,
};

use super::models::MutationError;

#[derive(Debug, Clone, PartialEq)]
struct PendingEdit {
    previous: MessageRevision,
}

/// Applies edits and deletes optimistically and settles them once the server responded.
///
/// Every method that touches the feed takes it explicitly. The coordinator itself only remembers
/// what is needed to roll an optimistic change back.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    edits: HashMap<MessageId, PendingEdit>,
    deleting: HashMap<MessageId, Message>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self, id: &MessageId) -> bool {
        self.edits.contains_key(id)
    }

    pub fn is_deleting(&self, id: &MessageId) -> bool {
        self.deleting.contains_key(id)
    }

    /// Messages currently hidden by an outstanding delete.
    pub fn deleting(&self) -> impl Iterator<Item = &Message> {
        self.deleting.values()
    }

    pub fn begin_edit(
        &mut self,
        feed: &mut UnifiedFeed,
        id: &MessageId,
        content: &str,
        user_id: &UserId,
    ) -> Result<Vec<FeedChange>, MutationError> {
        let message = self.check_mutable(feed, id, user_id)?;

        if message.kind != MessageKind::Text {
            return Err(MutationError::not_editable("only text messages can be edited"));
        }
        if content.trim().is_empty() {
            return Err(MutationError::not_editable("content must not be empty"));
        }

        let previous = message.revision();
        let optimistic = MessageRevision {
            content: Some(content.to_string()),
            ..previous.clone()
        };

        self.edits.insert(id.clone(), PendingEdit { previous });
        Ok(feed
            .set_revision(id, optimistic, Some(MutationStatus::InFlight))
            .into_iter()
            .collect())
    }

    /// Settles an edit with the server's answer. The returned changes must be published
    /// regardless of the result, the error is the one to surface.
    pub fn complete_edit(
        &mut self,
        feed: &mut UnifiedFeed,
        id: &MessageId,
        result: Result<Message, MutationError>,
    ) -> (Vec<FeedChange>, Result<(), MutationError>) {
        let Some(pending) = self.edits.remove(id) else {
            debug!("Ignoring result of edit for '{id}' which is no longer tracked.");
            return (vec![], result.map(|_| ()));
        };

        match result {
            Ok(confirmed) => {
                let current = feed.get_by_id(id).map(|message| message.revision());
                let revision = match current {
                    // A remote edit that is newer than ours arrived while the request was running.
                    Some(current) if current.edited_at > confirmed.edited_at => current,
                    _ => confirmed.revision(),
                };
                (
                    feed.set_revision(id, revision, None).into_iter().collect(),
                    Ok(()),
                )
            }
            Err(MutationError::NotFound) => {
                warn!("Message '{id}' vanished on the server while editing it.");
                (
                    feed.remove_confirmed(id).into_iter().collect(),
                    Err(MutationError::NotFound),
                )
            }
            Err(err) => {
                warn!("Edit of message '{id}' was rejected. {err}");
                (
                    feed.set_revision(id, pending.previous, None)
                        .into_iter()
                        .collect(),
                    Err(err),
                )
            }
        }
    }

    pub fn begin_delete(
        &mut self,
        feed: &mut UnifiedFeed,
        id: &MessageId,
        user_id: &UserId,
    ) -> Result<Vec<FeedChange>, MutationError> {
        self.check_mutable(feed, id, user_id)?;

        let Some(mut message) = feed.withhold(id) else {
            return Err(MutationError::NotFound);
        };
        message.delete_status = Some(MutationStatus::InFlight);
        self.deleting.insert(id.clone(), message);

        Ok(vec![FeedChange::Removed(MessageKey::Server(id.clone()))])
    }

    pub fn complete_delete(
        &mut self,
        feed: &mut UnifiedFeed,
        id: &MessageId,
        result: Result<(), MutationError>,
    ) -> (Vec<FeedChange>, Result<(), MutationError>) {
        let Some(mut message) = self.deleting.remove(id) else {
            debug!("Ignoring result of delete for '{id}' which is no longer tracked.");
            return (vec![], result);
        };

        match result {
            // Already gone on the server, which is what we wanted.
            Ok(()) | Err(MutationError::NotFound) => {
                (feed.forget(id).into_iter().collect(), Ok(()))
            }
            Err(err) => {
                warn!("Delete of message '{id}' was rejected. {err}");
                message.delete_status = None;
                (feed.release(message).into_iter().collect(), Err(err))
            }
        }
    }

    /// Keeps the rollback state of an outstanding edit in line with a remote edit.
    pub fn observe_remote_edit(&mut self, id: &MessageId, revision: &MessageRevision) {
        if let Some(pending) = self.edits.get_mut(id) {
            if revision.edited_at >= pending.previous.edited_at {
                pending.previous = revision.clone();
            }
        }
    }

    /// A remote delete settles any local mutation of the same message.
    pub fn observe_remote_delete(&mut self, id: &MessageId) {
        self.edits.remove(id);
        self.deleting.remove(id);
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.deleting.clear();
    }

    fn check_mutable<'a>(
        &self,
        feed: &'a UnifiedFeed,
        id: &MessageId,
        user_id: &UserId,
    ) -> Result<&'a Message, MutationError> {
        let Some(message) = feed.get_by_id(id) else {
            return Err(MutationError::NotFound);
        };

        if &message.sender.id != user_id {
            return Err(MutationError::NotOwner);
        }
        if !message.is_confirmed() {
            return Err(MutationError::not_editable("message is not confirmed yet"));
        }
        if message.is_mutation_in_flight() || self.is_editing(id) || self.is_deleting(id) {
            return Err(MutationError::not_editable(
                "another change to this message is in flight",
            ));
        }

        Ok(message)
    }
}
