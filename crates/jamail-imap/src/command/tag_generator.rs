//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses. The session uses
//! plain numbers so that a tagged reply can be checked with one integer
//! comparison.

/// Tag generator for IMAP commands.
///
/// Generates sequential numeric tags starting at 1.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    next: u32,
}

impl TagGenerator {
    /// Creates a generator whose first tag is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next tag and advances the counter.
    ///
    /// The counter saturates at `u32::MAX`.
    pub const fn next_tag(&mut self) -> u32 {
        let tag = self.next;
        self.next = self.next.saturating_add(1);
        tag
    }

    /// Returns the tag the next command will get.
    #[must_use]
    pub const fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_start_at_one() {
        let mut tags = TagGenerator::new();
        assert_eq!(tags.peek(), 1);
        assert_eq!(tags.next_tag(), 1);
        assert_eq!(tags.next_tag(), 2);
        assert_eq!(tags.peek(), 3);
    }

    #[test]
    fn test_clone_continues_sequence() {
        let mut tags = TagGenerator::default();
        tags.next_tag();
        let mut copy = tags.clone();
        assert_eq!(copy.next_tag(), 2);
        assert_eq!(tags.next_tag(), 2);
    }
}
