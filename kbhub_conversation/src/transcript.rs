//! Transcript of question/answer exchanges.
//!
//! A `Transcript` is a value: every operation returns a new transcript and
//! leaves the original untouched, so a snapshot handed to a renderer never
//! changes under it.

use chrono::{DateTime, Utc};
use kbhub_core::Source;
use std::fmt;
use uuid::Uuid;

/// Stable identifier of one submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Question sent, answer not yet known.
    Pending,
    Answered,
    /// The service failed; the answer holds the apology text.
    Failed,
}

/// One question and, once settled, its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub question: String,
    pub answer: String,
    pub sources: Vec<Source>,
    pub status: EntryStatus,
    pub asked_at: DateTime<Utc>,
}

impl TranscriptEntry {
    /// Placeholder shown while the answer is on its way.
    #[must_use]
    pub fn pending(id: EntryId, question: String) -> Self {
        Self {
            id,
            question,
            answer: String::new(),
            sources: Vec::new(),
            status: EntryStatus::Pending,
            asked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }
}

/// Ordered log of entries. Insertion order is render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A new transcript with `entry` at the end.
    #[must_use]
    pub fn append(&self, entry: TranscriptEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    /// A new transcript where the pending entry `id` carries its outcome.
    ///
    /// Unknown ids and already settled entries leave the transcript as is.
    #[must_use]
    pub fn settle(
        &self,
        id: EntryId,
        status: EntryStatus,
        answer: String,
        sources: Vec<Source>,
    ) -> Self {
        let mut settled = self.clone();
        if let Some(entry) = settled
            .entries
            .iter_mut()
            .find(|e| e.id == id && e.is_pending())
        {
            entry.status = status;
            entry.answer = answer;
            entry.sources = sources;
        }
        settled
    }

    #[must_use]
    pub const fn clear(&self) -> Self {
        Self::new()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(question: &str) -> TranscriptEntry {
        TranscriptEntry::pending(EntryId::new(), question.to_string())
    }

    #[test]
    fn test_append_leaves_original_untouched() {
        let empty = Transcript::new();
        let one = empty.append(pending("What is X?"));
        let two = one.append(pending("And Y?"));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(two.entries()[0].question, "What is X?");
        assert_eq!(two.last().map(|e| e.question.as_str()), Some("And Y?"));
    }

    #[test]
    fn test_settle_by_id() {
        let first = pending("What is X?");
        let second = pending("And Y?");
        let (first_id, second_id) = (first.id, second.id);
        let transcript = Transcript::new().append(first).append(second);
        assert_eq!(transcript.pending_count(), 2);

        let settled = transcript.settle(
            first_id,
            EntryStatus::Answered,
            "X is Y".to_string(),
            vec![Source::titled("Doc1")],
        );

        assert_eq!(settled.len(), 2);
        let entry = settled.get(first_id).unwrap();
        assert_eq!(entry.answer, "X is Y");
        assert_eq!(entry.status, EntryStatus::Answered);
        assert!(settled.get(second_id).unwrap().is_pending());
        // The snapshot taken before settlement still shows the placeholder.
        assert!(transcript.get(first_id).unwrap().is_pending());
    }

    #[test]
    fn test_settle_is_one_shot() {
        let entry = pending("What is X?");
        let id = entry.id;
        let transcript = Transcript::new()
            .append(entry)
            .settle(id, EntryStatus::Failed, "sorry".to_string(), Vec::new());

        let again = transcript.settle(id, EntryStatus::Answered, "late".to_string(), Vec::new());
        assert_eq!(again.get(id).unwrap().answer, "sorry");

        let unknown = transcript.settle(
            EntryId::new(),
            EntryStatus::Answered,
            "x".to_string(),
            Vec::new(),
        );
        assert_eq!(unknown, transcript);
    }

    #[test]
    fn test_empty_answer_is_not_pending_once_settled() {
        let entry = pending("Anything?");
        let id = entry.id;
        let transcript = Transcript::new().append(entry).settle(
            id,
            EntryStatus::Answered,
            String::new(),
            Vec::new(),
        );

        assert_eq!(transcript.pending_count(), 0);
    }

    #[test]
    fn test_clear() {
        let transcript = Transcript::new().append(pending("What is X?"));
        assert!(transcript.clear().is_empty());
        assert_eq!(transcript.len(), 1);
    }
}
