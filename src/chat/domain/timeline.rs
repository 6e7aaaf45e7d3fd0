//! Ordered per-conversation record set.
//!
//! Records are keyed by `id` and ordered by `timestamp` with a stable
//! insertion-order tie-break, so delayed/archived messages slot into
//! their chronological position while same-instant messages keep their
//! arrival order. The timeline is mutated only by its owning session.

use super::address::Address;
use super::ids::MessageId;
use super::record::MessageRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when appending to a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// A record with this id already exists in the conversation.
    #[error("duplicate record id: {0}")]
    DuplicateId(MessageId),
}

#[derive(Debug, Clone)]
struct Entry {
    arrival: u64,
    record: MessageRecord,
}

/// Chronologically ordered set of [`MessageRecord`]s for one
/// conversation.
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::Timeline;
///
/// let timeline = Timeline::new();
/// assert!(timeline.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
    next_arrival: u64,
}

impl Timeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the timeline holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a record at its chronological position.
    ///
    /// Records with equal timestamps keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::DuplicateId`] if a record with the same
    /// id is already present.
    pub fn insert(&mut self, record: MessageRecord) -> Result<(), TimelineError> {
        if self.contains(record.id()) {
            return Err(TimelineError::DuplicateId(record.id().clone()));
        }
        let position = self
            .entries
            .partition_point(|entry| entry.record.timestamp() <= record.timestamp());
        self.entries.insert(
            position,
            Entry {
                arrival: self.next_arrival,
                record,
            },
        );
        self.next_arrival = self.next_arrival.saturating_add(1);
        Ok(())
    }

    /// Returns `true` if a record with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.iter().any(|entry| entry.record.id() == id)
    }

    /// Returns the record with the given id.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&MessageRecord> {
        self.entries
            .iter()
            .map(|entry| &entry.record)
            .find(|record| record.id() == id)
    }

    /// Returns the first record matching the predicate.
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Option<&MessageRecord>
    where
        P: FnMut(&&MessageRecord) -> bool,
    {
        self.records().find(predicate)
    }

    /// Returns the non-ephemeral record that `reference` names via its
    /// stable id, delivery id or origin id, scoped to `sender` when one
    /// is given.
    ///
    /// Ephemeral records are excluded: they are never corrected or
    /// acknowledged.
    #[must_use]
    pub fn find_by_reference(
        &self,
        reference: &MessageId,
        sender: Option<&Address>,
    ) -> Option<&MessageRecord> {
        self.records().find(|record| {
            !record.is_ephemeral()
                && record.matches_reference(reference)
                && sender.is_none_or(|scope| record.sender() == &scope.bare())
        })
    }

    /// Applies `mutate` to the record with the given id, re-sorting if
    /// the mutation moved its timestamp.
    ///
    /// Returns `true` if the record existed.
    pub fn update<F>(&mut self, id: &MessageId, mutate: F) -> bool
    where
        F: FnOnce(&mut MessageRecord),
    {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.record.id() == id)
        else {
            return false;
        };
        let before = entry.record.timestamp();
        mutate(&mut entry.record);
        if entry.record.timestamp() != before {
            self.entries
                .sort_by_key(|entry| (entry.record.timestamp(), entry.arrival));
        }
        true
    }

    /// Applies `mutate` to the non-ephemeral record that `reference`
    /// names (stable id, delivery id or origin id), scoped to `sender`
    /// when one is given.
    ///
    /// Returns the mutated record's id, or `None` if nothing matched.
    pub fn update_by_reference<F>(
        &mut self,
        reference: &MessageId,
        sender: Option<&Address>,
        mutate: F,
    ) -> Option<MessageId>
    where
        F: FnOnce(&mut MessageRecord),
    {
        let id = self
            .find_by_reference(reference, sender)
            .map(|record| record.id().clone())?;
        self.update(&id, mutate);
        Some(id)
    }

    /// Removes and returns the record with the given id.
    pub fn remove(&mut self, id: &MessageId) -> Option<MessageRecord> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.record.id() == id)?;
        Some(self.entries.remove(position).record)
    }

    /// Removes every ephemeral record whose purge deadline has passed,
    /// returning the removed ids in timeline order.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<MessageId> {
        let expired: Vec<MessageId> = self
            .records()
            .filter(|record| record.expires_at().is_some_and(|deadline| deadline <= now))
            .map(|record| record.id().clone())
            .collect();
        self.entries.retain(|entry| {
            !entry
                .record
                .expires_at()
                .is_some_and(|deadline| deadline <= now)
        });
        expired
    }

    /// Iterates over the records in timeline order.
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = &MessageRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// Clones the records into a vector, used for persistence snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        self.records().cloned().collect()
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
