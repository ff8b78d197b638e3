//! Mentioned users and email/mention disambiguation.
//!
//! A user's display name may itself look like an email address. When such a
//! name is mentioned (`@alice@example.com`), the occurrence right after the `@`
//! is a mention, while other occurrences of the same string stay emails.

/// A user referenced by a message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MentionedUser {
    /// Stable user identifier.
    pub id: String,
    /// Display name, if the user has one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl MentionedUser {
    /// Create a user with an id and a display name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Create a user known only by id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Text a mention of this user is written with: the name, or the id when unnamed.
    #[must_use]
    pub fn handle(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// Check whether `value` exactly equals the name of any mentioned user.
///
/// A `true` result only makes `value` a *potential* mention; each occurrence
/// still has to be checked with [`is_mention_occurrence`].
#[must_use]
pub fn names_mentioned_user(value: &str, users: &[MentionedUser]) -> bool {
    users.iter().any(|user| user.name.as_deref() == Some(value))
}

/// Check whether the occurrence starting at byte offset `start` is preceded by `@`.
///
/// # Examples
///
/// ```
/// use rw_linkify::is_mention_occurrence;
///
/// let text = "hi @bob@x.io and bob@x.io";
/// assert!(is_mention_occurrence(text, 4));
/// assert!(!is_mention_occurrence(text, 17));
/// ```
#[must_use]
pub fn is_mention_occurrence(text: &str, start: usize) -> bool {
    text.get(..start).is_some_and(|before| before.ends_with('@'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_mentioned_user_exact() {
        let users = vec![MentionedUser::new("u1", "alice@example.com")];
        assert!(names_mentioned_user("alice@example.com", &users));
        assert!(!names_mentioned_user("ALICE@example.com", &users));
        assert!(!names_mentioned_user("alice", &users));
    }

    #[test]
    fn test_names_mentioned_user_ignores_ids() {
        let users = vec![MentionedUser::with_id("bob@example.com")];
        assert!(!names_mentioned_user("bob@example.com", &users));
    }

    #[test]
    fn test_names_mentioned_user_empty() {
        assert!(!names_mentioned_user("a@b.io", &[]));
    }

    #[test]
    fn test_is_mention_occurrence_at_start() {
        assert!(!is_mention_occurrence("bob@x.io", 0));
    }

    #[test]
    fn test_is_mention_occurrence_out_of_bounds() {
        assert!(!is_mention_occurrence("@", 5));
    }

    #[test]
    fn test_handle_falls_back_to_id() {
        assert_eq!(MentionedUser::new("u1", "Alice").handle(), "Alice");
        assert_eq!(MentionedUser::with_id("u2").handle(), "u2");
        let unnamed = MentionedUser {
            id: "u3".to_owned(),
            name: Some(String::new()),
        };
        assert_eq!(unnamed.handle(), "u3");
    }
}
