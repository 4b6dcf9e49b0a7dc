//! Recent chat history, replayed to new joiners.

use std::collections::VecDeque;

use scrawl_protocol::ChatEntry;

/// Bounded ring buffer of the most recent chat lines in a room.
///
/// Survives round and scoring transitions. When full, the oldest entry is
/// evicted silently.
#[derive(Debug, Clone)]
pub struct ChatBacklog {
    entries: VecDeque<ChatEntry>,
}

impl ChatBacklog {
    /// Number of entries kept.
    pub const CAPACITY: usize = 10;

    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    pub fn push(&mut self, entry: ChatEntry) {
        if self.entries.len() == Self::CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChatBacklog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_protocol::ChatKind;

    #[test]
    fn test_backlog_keeps_last_ten_oldest_first() {
        let mut backlog = ChatBacklog::new();
        for i in 0..15 {
            backlog.push(ChatEntry::authored(ChatKind::Chat, format!("msg {i}"), "ann"));
        }

        let msgs: Vec<&str> = backlog.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(backlog.len(), ChatBacklog::CAPACITY);
        assert_eq!(msgs.first(), Some(&"msg 5"));
        assert_eq!(msgs.last(), Some(&"msg 14"));
    }

    #[test]
    fn test_backlog_below_capacity_keeps_everything() {
        let mut backlog = ChatBacklog::default();
        backlog.push(ChatEntry::system(ChatKind::Info, "hi"));
        assert_eq!(backlog.len(), 1);
        assert!(!backlog.is_empty());
    }
}
