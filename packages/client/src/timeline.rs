//! Timeline assembly.
//!
//! The view shows one ordered sequence of entries: a single REST-fetched
//! history page (trusted to arrive oldest to newest) followed by live
//! frames appended at the tail as they arrive. No re-sorting happens after
//! the initial fetch, and no dedup is attempted between a message the user
//! sent and the server's echo of it.

use simplechat_shared::time::{Clock, millis_to_rfc3339};

use crate::directory::MessageRecord;

/// Sender name used for system notices.
pub const SYSTEM_SENDER: &str = "system";

/// Sentinel id for entries that never existed server-side.
pub const NOTICE_MESSAGE_ID: i64 = -1;

/// One row of the visible message timeline.
///
/// History entries keep the server-assigned id and timestamp; live chat
/// entries get a client-assigned wall-clock id and a client-stamped time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub message_id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from one history page, preserving server order.
    pub fn from_history(records: Vec<MessageRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| TimelineEntry {
                message_id: record.message_id,
                sender: record.sender,
                content: record.content,
                timestamp: record.timestamp,
            })
            .collect();
        Self { entries }
    }

    /// Append a live chat message at the tail.
    pub fn append_chat(&mut self, sender: &str, content: &str, clock: &dyn Clock) {
        let now = clock.now_millis();
        self.entries.push(TimelineEntry {
            message_id: now,
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: millis_to_rfc3339(now),
        });
    }

    /// Append a system notice at the tail.
    pub fn append_notice(&mut self, content: &str, clock: &dyn Clock) {
        self.entries.push(TimelineEntry {
            message_id: NOTICE_MESSAGE_ID,
            sender: SYSTEM_SENDER.to_string(),
            content: content.to_string(),
            timestamp: millis_to_rfc3339(clock.now_millis()),
        });
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
