//! Starboard: repost messages that collect enough of the configured reaction

use dashmap::DashMap;
use serenity::all::{Colour, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Message};

pub struct Starboard {
    emoji: String,
    threshold: u64,
    /// Messages already reposted, so each is posted once per process
    posted: DashMap<u64, ()>,
}

impl std::fmt::Debug for Starboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Starboard")
            .field("emoji", &self.emoji)
            .field("threshold", &self.threshold)
            .field("posted", &self.posted.len())
            .finish()
    }
}

impl Starboard {
    #[must_use]
    pub fn new(emoji: &str, threshold: u64) -> Self {
        Self {
            emoji: emoji.to_string(),
            threshold: threshold.max(1),
            posted: DashMap::new(),
        }
    }

    #[must_use]
    pub fn emoji(&self) -> &str {
        &self.emoji
    }

    /// Whether a reaction of `emoji` is the one counted
    #[must_use]
    pub fn counts(&self, emoji: &str) -> bool {
        emoji == self.emoji
    }

    /// Claim a message for posting if it qualifies
    ///
    /// Returns true exactly once per message, for the first caller that sees
    /// the count at or above the threshold.
    pub fn claim(&self, emoji: &str, count: u64, message_id: u64) -> bool {
        self.counts(emoji) && count >= self.threshold && self.posted.insert(message_id, ()).is_none()
    }

    /// Give back a claim after the repost failed
    pub fn release(&self, message_id: u64) {
        self.posted.remove(&message_id);
    }

    /// Embed reposting `message` with its reaction count
    #[must_use]
    pub fn embed(&self, message: &Message, count: u64) -> CreateEmbed {
        CreateEmbed::new()
            .description(message.content.clone())
            .colour(Colour::GOLD)
            .timestamp(message.timestamp)
            .author(
                CreateEmbedAuthor::new(message.author.name.clone()).icon_url(message.author.face()),
            )
            .field(
                "Jump to message",
                format!("[Click Here]({})", message.link()),
                false,
            )
            .footer(CreateEmbedFooter::new(format!("{count} {}", self.emoji)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_requires_emoji_and_threshold() {
        let board = Starboard::new("⭐", 3);
        assert!(!board.claim("👍", 10, 1));
        assert!(!board.claim("⭐", 2, 1));
        assert!(board.claim("⭐", 3, 1));
    }

    #[test]
    fn test_claim_once_until_released() {
        let board = Starboard::new("⭐", 1);
        assert!(board.claim("⭐", 1, 5));
        assert!(!board.claim("⭐", 4, 5));
        board.release(5);
        assert!(board.claim("⭐", 4, 5));
    }

    #[test]
    fn test_zero_threshold_is_one() {
        let board = Starboard::new("⭐", 0);
        assert!(!board.claim("⭐", 0, 1));
        assert!(board.claim("⭐", 1, 1));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let board = Arc::new(Starboard::new("⭐", 3));
        let winners = (0..16)
            .map(|_| {
                let board = Arc::clone(&board);
                std::thread::spawn(move || board.claim("⭐", 3, 77))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
