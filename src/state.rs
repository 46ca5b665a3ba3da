use serde::{Deserialize, Serialize};

/// How many conversation entries are re-injected into continuation prompts.
/// Older history stays in the caller's record but is not sent back.
pub const HISTORY_WINDOW: usize = 4;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Narrator,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn narrator(content: impl Into<String>) -> Self {
        Self { role: Role::Narrator, content: content.into() }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Book,
    Learning,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Book => "book",
            ContentType::Learning => "learning",
        }
    }
}

/// The opaque continuation record round-tripped through the caller. The
/// engine holds nothing between requests; a turn either starts a story
/// (populating this) or extends one (updating chapter and summary only).
///
/// `narrators` order is load-bearing: the position of a name IS its speaker
/// channel index, and index 0 is the primary voice. Once a story exists the
/// list stays unchanged until the caller discards the state.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoryState {
    pub content_type: ContentType,
    pub book_title: String,
    pub plot_summary: String,
    pub current_chapter: String,
    pub narrators: Vec<String>,
}

/// A turn is a "first turn" iff no story has been established yet: the
/// caller sent no state, or state whose title was never populated.
pub fn is_first_turn(story_state: Option<&StoryState>) -> bool {
    match story_state {
        None => true,
        Some(state) => state.book_title.trim().is_empty(),
    }
}

/// Renders the bounded tail of the conversation for prompt injection.
pub fn recent_history(history: &[ConversationTurn]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|turn| match turn.role {
            Role::User => format!("User: {}", turn.content),
            Role::Narrator => format!("Narrator: {}", turn.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str) -> StoryState {
        StoryState {
            content_type: ContentType::Book,
            book_title: title.to_string(),
            plot_summary: "summary".to_string(),
            current_chapter: "Chapter 1".to_string(),
            narrators: vec!["Cher".to_string()],
        }
    }

    #[test]
    fn test_absent_state_is_first_turn() {
        assert!(is_first_turn(None));
    }

    #[test]
    fn test_blank_title_is_first_turn() {
        assert!(is_first_turn(Some(&story(""))));
        assert!(is_first_turn(Some(&story("   "))));
    }

    #[test]
    fn test_populated_title_is_continuation() {
        assert!(!is_first_turn(Some(&story("The Great Gatsby"))));
    }

    #[test]
    fn test_recent_history_keeps_last_window() {
        let history: Vec<ConversationTurn> = (0..6)
            .map(|i| ConversationTurn::user(format!("turn {}", i)))
            .collect();
        let rendered = recent_history(&history);
        assert!(!rendered.contains("turn 1"));
        assert!(rendered.contains("turn 2"));
        assert!(rendered.contains("turn 5"));
        assert_eq!(rendered.lines().count(), HISTORY_WINDOW);
    }

    #[test]
    fn test_recent_history_labels_roles() {
        let history = vec![
            ConversationTurn::user("tell me about whales"),
            ConversationTurn::narrator("The ocean's giants..."),
        ];
        let rendered = recent_history(&history);
        assert_eq!(rendered, "User: tell me about whales\nNarrator: The ocean's giants...");
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let state = story("Moby Dick");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"content_type\":\"book\""));
        let back: StoryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.book_title, "Moby Dick");
        assert_eq!(back.narrators, vec!["Cher".to_string()]);
    }
}
