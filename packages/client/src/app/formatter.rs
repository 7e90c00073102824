//! Terminal rendering of timelines and channel lists.

use crate::directory::ChannelSummary;
use crate::timeline::{NOTICE_MESSAGE_ID, Timeline, TimelineEntry};

pub struct MessageFormatter;

impl MessageFormatter {
    /// Render one timeline entry as a single line.
    ///
    /// Notices render as `* content`; chat renders as `[ts] sender: content`.
    pub fn format_entry(entry: &TimelineEntry) -> String {
        if entry.message_id == NOTICE_MESSAGE_ID {
            format!("* {}", entry.content)
        } else {
            format!("[{}] {}: {}", entry.timestamp, entry.sender, entry.content)
        }
    }

    /// Render a channel's history block, shown once on entry.
    pub fn format_history(channel_name: &str, timeline: &Timeline) -> String {
        let mut lines = vec![format!("--- #{channel_name} ---")];
        if timeline.is_empty() {
            lines.push("(no messages yet)".to_string());
        } else {
            lines.extend(timeline.entries().iter().map(Self::format_entry));
        }
        lines.join("\n")
    }

    pub fn format_channel_list(channels: &[ChannelSummary]) -> String {
        if channels.is_empty() {
            return "you are not in any channels".to_string();
        }
        channels
            .iter()
            .map(|channel| format!("  #{}", channel.channel_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
