//! Prompt-cache point placement
//!
//! Bedrock honors up to a handful of cache points per request and looks
//! back at most 20 content blocks from each one when matching a cached
//! prefix. Tagging only the last user turn would leave long conversations
//! mostly uncovered, so up to three messages are tagged: the last user
//! turn, the previous user turn, and an anchor roughly one third into the
//! conversation that stays stable across consecutive requests.

use std::collections::BTreeSet;

use crate::types::{Message, Role};

/// Maximum cache points placed per request
pub const MAX_CACHE_POINTS: usize = 3;

/// Message indices that should carry a cache point
///
/// Only user turns are tagged. Returned indices are sorted and unique,
/// and never more than [`MAX_CACHE_POINTS`].
pub fn cache_point_indices(messages: &[Message]) -> Vec<usize> {
    let user_indices: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == Role::User)
        .map(|(i, _)| i)
        .collect();

    let mut points = BTreeSet::new();

    if let Some(&last) = user_indices.last() {
        points.insert(last);
    }
    if user_indices.len() >= 2 {
        points.insert(user_indices[user_indices.len() - 2]);
    }

    // Anchor: the user turn closest to one third of the conversation
    let anchor_target = messages.len() / 3;
    if let Some(&anchor) = user_indices.iter().min_by_key(|&&i| i.abs_diff(anchor_target)) {
        points.insert(anchor);
    }

    points.into_iter().take(MAX_CACHE_POINTS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Alternating user/assistant conversation starting with user
    fn conversation(turns: usize) -> Vec<Message> {
        (0..turns)
            .map(|i| {
                if i % 2 == 0 {
                    Message::text(Role::User, format!("question {i}"))
                } else {
                    Message::text(Role::Assistant, format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn single_user_turn_gets_one_point() {
        let messages = conversation(1);
        assert_eq!(cache_point_indices(&messages), vec![0]);
    }

    #[test]
    fn short_conversation_tags_last_two_user_turns() {
        let messages = conversation(4); // u a u a
        let points = cache_point_indices(&messages);
        assert!(points.contains(&0));
        assert!(points.contains(&2));
    }

    #[test]
    fn long_conversation_adds_a_third_anchor() {
        let messages = conversation(21);
        let points = cache_point_indices(&messages);
        assert_eq!(points.len(), MAX_CACHE_POINTS);
        // Last and previous user turns
        assert!(points.contains(&20));
        assert!(points.contains(&18));
        // Anchor near one third of the conversation
        let anchor = points.iter().find(|&&p| p < 18).copied().unwrap();
        assert!(anchor.abs_diff(messages.len() / 3) <= 1, "anchor at {anchor}");
    }

    #[test]
    fn never_more_than_the_cap() {
        let messages = conversation(101);
        assert!(cache_point_indices(&messages).len() <= MAX_CACHE_POINTS);
    }

    #[test]
    fn assistant_only_conversation_gets_none() {
        let messages = vec![Message::text(Role::Assistant, "hello")];
        assert!(cache_point_indices(&messages).is_empty());
    }
}
