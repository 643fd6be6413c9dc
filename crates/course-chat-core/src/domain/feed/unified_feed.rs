// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::domain::history::models::PageCursor;
use crate::domain::messaging::models::{
    DeliveryStatus, Message, MessageEdit, MessageId, MessageKey, MessageRevision, MutationStatus,
    TempId,
};
use crate::domain::sending::models::SendError;

use super::FeedChange;

/// How many deleted ids are remembered to keep in-flight page loads from resurrecting them.
const MAX_TOMBSTONES: usize = 1024;

/// The canonical, deduplicated and ordered message store of one course thread.
///
/// Entries are keyed by identity (`MessageKey`), never by position. Every source (history pages,
/// live events, local sends and mutations) goes through the methods below, which is what keeps
/// at most one entry per identity visible at any time.
///
/// The ordered view returned by `messages` is computed lazily and cached until the next mutation.
#[derive(Debug)]
pub struct UnifiedFeed {
    entries: HashMap<MessageKey, Message>,
    /// Confirmed messages that were created locally, indexed by their temp id.
    temp_ids: HashMap<TempId, MessageId>,
    /// Ids the server reported as deleted. Late page loads must not resurrect them.
    tombstones: HashSet<MessageId>,
    /// Insertion order of `tombstones`, oldest first.
    tombstone_order: VecDeque<MessageId>,
    /// Ids taken out by a delete that is still in flight. No source may bring them back until
    /// the delete settled.
    withheld: HashSet<MessageId>,
    revision: u64,
    sorted: OnceCell<Arc<[Message]>>,
}

impl Default for UnifiedFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl UnifiedFeed {
    pub fn new() -> Self {
        Self {
            entries: Default::default(),
            temp_ids: Default::default(),
            tombstones: Default::default(),
            tombstone_order: Default::default(),
            withheld: Default::default(),
            revision: 0,
            sorted: OnceCell::new(),
        }
    }

    /// Incremented on every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &MessageKey) -> Option<&Message> {
        self.entries.get(key)
    }

    pub fn get_by_id(&self, id: &MessageId) -> Option<&Message> {
        self.entries.get(&MessageKey::Server(id.clone()))
    }

    /// Resolves a temp id to the entry it currently belongs to, pending or confirmed.
    pub fn get_by_temp_id(&self, temp_id: &TempId) -> Option<&Message> {
        if let Some(message) = self.entries.get(&MessageKey::Local(temp_id.clone())) {
            return Some(message);
        }
        self.temp_ids
            .get(temp_id)
            .and_then(|id| self.get_by_id(id))
    }

    /// All entries ordered by `created_at` ascending, ties broken by key.
    pub fn messages(&self) -> Arc<[Message]> {
        self.sorted
            .get_or_init(|| {
                self.entries
                    .iter()
                    .sorted_by(|(lhs_key, lhs), (rhs_key, rhs)| {
                        lhs.created_at
                            .cmp(&rhs.created_at)
                            .then_with(|| lhs_key.cmp(rhs_key))
                    })
                    .map(|(_, message)| message.clone())
                    .collect()
            })
            .clone()
    }

    /// The oldest confirmed message, which is the cursor for the next backward page.
    pub fn oldest_cursor(&self) -> Option<PageCursor> {
        self.entries
            .iter()
            .filter_map(|(key, message)| key.server_id().map(|id| (id, message)))
            .min_by(|(lhs_id, lhs), (rhs_id, rhs)| {
                lhs.created_at
                    .cmp(&rhs.created_at)
                    .then_with(|| lhs_id.cmp(rhs_id))
            })
            .map(|(id, message)| PageCursor {
                message_id: id.clone(),
                created_at: message.created_at,
            })
    }

    /// The first entry in display order.
    pub fn first_key(&self) -> Option<MessageKey> {
        self.messages().first().and_then(|message| message.key())
    }

    pub fn is_tombstoned(&self, id: &MessageId) -> bool {
        self.tombstones.contains(id)
    }

    pub fn is_withheld(&self, id: &MessageId) -> bool {
        self.withheld.contains(id)
    }
}

impl UnifiedFeed {
    /// Inserts a locally created placeholder keyed by its temp id.
    pub fn insert_local(&mut self, message: Message) -> Option<FeedChange> {
        let Some(temp_id) = message.temp_id.clone() else {
            warn!("Ignoring local message without temp id.");
            return None;
        };

        if message.id.is_some() || message.is_confirmed() {
            warn!("Ignoring local message '{temp_id}' that already looks confirmed.");
            return None;
        }

        if self.temp_ids.contains_key(&temp_id) {
            warn!("Temp id '{temp_id}' already belongs to a confirmed message.");
            return None;
        }

        let key = MessageKey::Local(temp_id);
        let is_update = self.entries.insert(key.clone(), message).is_some();
        self.touch();

        Some(if is_update {
            FeedChange::Updated(key)
        } else {
            FeedChange::Inserted(key)
        })
    }

    /// Inserts or merges a confirmed message from any source (history page, live echo, send ack).
    ///
    /// A pending or failed local entry carrying the same temp id is replaced by the confirmed
    /// version. If the server id is already present both representations are merged, keeping the
    /// richer one.
    pub fn upsert_confirmed(&mut self, mut message: Message) -> Option<FeedChange> {
        let Some(id) = message.id.clone() else {
            warn!("Ignoring confirmed message without server id.");
            return None;
        };

        if self.tombstones.contains(&id) {
            debug!("Ignoring message '{id}' which was deleted.");
            return None;
        }
        if self.withheld.contains(&id) {
            debug!("Holding back message '{id}' while it is being deleted.");
            return None;
        }

        message.delivery_status = DeliveryStatus::Confirmed;
        message.send_error = None;
        message.update_status = None;
        message.delete_status = None;

        let key = MessageKey::Server(id.clone());

        let replaced = message.temp_id.clone().and_then(|temp_id| {
            self.temp_ids.insert(temp_id.clone(), id.clone());
            let local_key = MessageKey::Local(temp_id);
            self.entries.remove(&local_key).map(|_| local_key)
        });

        let change = match self.entries.get_mut(&key) {
            Some(existing) => {
                let did_change = existing.merge_confirmed(message);
                match (did_change, replaced) {
                    (_, Some(previous)) => Some(FeedChange::Replaced {
                        previous,
                        current: key,
                    }),
                    (true, None) => Some(FeedChange::Updated(key)),
                    (false, None) => None,
                }
            }
            None => {
                self.entries.insert(key.clone(), message);
                Some(match replaced {
                    Some(previous) => FeedChange::Replaced {
                        previous,
                        current: key,
                    },
                    None => FeedChange::Inserted(key),
                })
            }
        };

        if change.is_some() {
            self.touch();
        }
        change
    }

    /// Confirms a pending entry when the server acknowledged it with an id but no payload.
    pub fn promote_local(
        &mut self,
        temp_id: &TempId,
        id: MessageId,
        created_at: DateTime<Utc>,
    ) -> Option<FeedChange> {
        let Some(mut message) = self.entries.get(&MessageKey::Local(temp_id.clone())).cloned()
        else {
            debug!("Nothing to promote for temp id '{temp_id}'.");
            return None;
        };

        message.id = Some(id);
        message.created_at = created_at;
        self.upsert_confirmed(message)
    }

    /// Applies a server-side edit. Unknown ids are ignored since a later page load will fetch the
    /// current state. Stale edits (older than what is shown) are ignored as well.
    pub fn apply_edit(&mut self, edit: MessageEdit) -> Option<FeedChange> {
        let key = MessageKey::Server(edit.id);

        let Some(message) = self.entries.get_mut(&key) else {
            debug!("Ignoring edit for unknown message '{key}'.");
            return None;
        };

        if edit.revision.edited_at < message.edited_at {
            debug!("Ignoring stale edit for message '{key}'.");
            return None;
        }

        if message.revision() == edit.revision {
            return None;
        }

        message.apply_revision(edit.revision);
        self.touch();
        Some(FeedChange::Updated(key))
    }

    /// Removes a message the server reported as deleted. Unknown ids are a no-op.
    pub fn remove_confirmed(&mut self, id: &MessageId) -> Option<FeedChange> {
        self.bury(id);
        self.withheld.remove(id);

        let key = MessageKey::Server(id.clone());
        let message = self.entries.remove(&key)?;
        if let Some(temp_id) = message.temp_id {
            self.temp_ids.remove(&temp_id);
        }
        self.touch();
        Some(FeedChange::Removed(key))
    }

    /// Records a completed delete of a message that was withheld optimistically. Removes the
    /// entry as well in case it made it back into the feed.
    pub fn forget(&mut self, id: &MessageId) -> Option<FeedChange> {
        self.withheld.remove(id);
        self.temp_ids.retain(|_, message_id| message_id != id);

        let change = self.remove_confirmed(id);
        if change.is_none() {
            self.touch();
        }
        change
    }

    /// Takes a confirmed message out of the feed until its delete settled. While withheld, the
    /// message is ignored by every source.
    pub fn withhold(&mut self, id: &MessageId) -> Option<Message> {
        let message = self.entries.remove(&MessageKey::Server(id.clone()))?;
        self.withheld.insert(id.clone());
        self.touch();
        Some(message)
    }

    /// Puts back a withheld message after its delete was refused.
    pub fn release(&mut self, message: Message) -> Option<FeedChange> {
        if let Some(id) = &message.id {
            self.withheld.remove(id);
        }
        self.reinstate(message)
    }

    /// Takes an entry out of the feed without tombstoning it, so that it can be reinstated.
    pub fn take(&mut self, key: &MessageKey) -> Option<Message> {
        let message = self.entries.remove(key)?;
        self.touch();
        Some(message)
    }

    /// Puts back an entry previously taken out.
    pub fn reinstate(&mut self, message: Message) -> Option<FeedChange> {
        let key = message.key()?;
        if let Some(id) = key.server_id() {
            if self.tombstones.contains(id) {
                debug!("Not reinstating message '{key}' which was deleted meanwhile.");
                return None;
            }
        }
        if self.entries.contains_key(&key) {
            return None;
        }
        self.entries.insert(key.clone(), message);
        self.touch();
        Some(FeedChange::Inserted(key))
    }

    /// Marks a pending entry as failed. Confirmed entries are never demoted.
    pub fn mark_failed(&mut self, temp_id: &TempId, error: SendError) -> Option<FeedChange> {
        let key = MessageKey::Local(temp_id.clone());
        let message = self.entries.get_mut(&key)?;

        if message.delivery_status != DeliveryStatus::Pending {
            return None;
        }

        message.delivery_status = DeliveryStatus::Error;
        message.send_error = Some(error);
        self.touch();
        Some(FeedChange::Updated(key))
    }

    /// Replaces the editable part of a confirmed message (optimistic edit, rollback, or the
    /// authoritative result of an edit request).
    pub fn set_revision(
        &mut self,
        id: &MessageId,
        revision: MessageRevision,
        update_status: Option<MutationStatus>,
    ) -> Option<FeedChange> {
        let key = MessageKey::Server(id.clone());
        let message = self.entries.get_mut(&key)?;

        if message.revision() == revision && message.update_status == update_status {
            return None;
        }

        message.apply_revision(revision);
        message.update_status = update_status;
        self.touch();
        Some(FeedChange::Updated(key))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.temp_ids.clear();
        self.tombstones.clear();
        self.tombstone_order.clear();
        self.withheld.clear();
        self.touch();
    }

    fn bury(&mut self, id: &MessageId) {
        if !self.tombstones.insert(id.clone()) {
            return;
        }
        self.tombstone_order.push_back(id.clone());
        while self.tombstone_order.len() > MAX_TOMBSTONES {
            if let Some(oldest) = self.tombstone_order.pop_front() {
                self.tombstones.remove(&oldest);
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.sorted.take();
    }
}
