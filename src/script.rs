use crate::narrators::NarratorRegistry;
use crate::state::{recent_history, ContentType, ConversationTurn, StoryState};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_IMAGE_DURATION: f64 = 8.0;

/// Maximum narrators a single turn may introduce. Position in
/// `narrator_names` is the speaker channel index.
pub const MAX_NARRATORS: usize = 3;

#[derive(Debug, Deserialize, Clone)]
pub struct SceneImageSpec {
    pub description: String,
    pub duration: Option<f64>,
}

impl SceneImageSpec {
    pub fn display_duration(&self) -> f64 {
        self.duration.unwrap_or(DEFAULT_IMAGE_DURATION)
    }
}

/// First-turn output: establishes the story and its voice cast.
#[derive(Debug, Deserialize, Clone)]
pub struct FirstTurnScript {
    pub content_type: ContentType,
    pub narrator_names: Vec<String>,
    pub book_title: String,
    pub plot_summary: String,
    pub current_chapter: String,
    pub scene_text: String,
    pub choices: Vec<String>,
    pub scene_image: SceneImageSpec,
}

/// Continuation output: extends an established story; title, summary and
/// cast are reused from the caller-held state.
#[derive(Debug, Deserialize, Clone)]
pub struct ContinuationScript {
    pub current_chapter: String,
    pub scene_text: String,
    pub choices: Vec<String>,
    pub scene_image: SceneImageSpec,
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}

pub fn parse_first_turn(response: &str) -> Result<FirstTurnScript> {
    let clean = strip_code_blocks(response);
    let script: FirstTurnScript = serde_json::from_str(&clean)
        .with_context(|| format!("Failed to parse first-turn script: {}", clean))?;
    if script.narrator_names.is_empty() || script.narrator_names.len() > MAX_NARRATORS {
        anyhow::bail!(
            "Expected 1-{} narrator names, got {}",
            MAX_NARRATORS,
            script.narrator_names.len()
        );
    }
    Ok(script)
}

pub fn parse_continuation(response: &str) -> Result<ContinuationScript> {
    let clean = strip_code_blocks(response);
    serde_json::from_str(&clean)
        .with_context(|| format!("Failed to parse continuation script: {}", clean))
}

// --- Declared output shapes ---

fn scene_image_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "description": { "type": "string" },
            "duration": { "type": "number" }
        },
        "additionalProperties": false,
        "required": ["description", "duration"]
    })
}

pub fn first_turn_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "content_type": { "type": "string", "enum": ["book", "learning"] },
            "narrator_names": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1,
                "maxItems": MAX_NARRATORS
            },
            "book_title": { "type": "string" },
            "plot_summary": { "type": "string" },
            "current_chapter": { "type": "string" },
            "scene_text": { "type": "string" },
            "choices": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 2,
                "maxItems": 3
            },
            "scene_image": scene_image_schema()
        },
        "additionalProperties": false,
        "required": [
            "content_type", "narrator_names", "book_title", "plot_summary",
            "current_chapter", "scene_text", "choices", "scene_image"
        ]
    })
}

pub fn continuation_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "current_chapter": { "type": "string" },
            "scene_text": { "type": "string" },
            "choices": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 2,
                "maxItems": 3
            },
            "scene_image": scene_image_schema()
        },
        "additionalProperties": false,
        "required": ["current_chapter", "scene_text", "choices", "scene_image"]
    })
}

// --- Prompt templates ---

const SPEAKER_TAG_RULES: &str = "\
scene_text format:\n\
- Write short lines, one per spoken beat.\n\
- Every line MUST start with a speaker tag [SPEAKERn], where n is the \
zero-based position of the speaking narrator in the narrator list.\n\
- Only use indices that exist in the narrator list; indices are contiguous \
from 0.\n\
- Example with two narrators: \"[SPEAKER0] Let's begin.\\n[SPEAKER1] Oh, I \
love this part.\"";

pub fn build_first_turn_prompt(user_input: &str, registry: &NarratorRegistry) -> String {
    let narrator_menu = registry
        .profiles()
        .iter()
        .map(|n| {
            format!(
                "- \"{}\": {} (Expertise: {})",
                n.name,
                n.description,
                n.expertise.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI that creates interactive experiences - either bringing \
books to life OR teaching topics through engaging narration.\n\n\
User said: \"{user_input}\"\n\n\
Available Narrators (USE EXACT NAMES):\n{narrator_menu}\n\n\
TASK: Determine if this is a BOOK REQUEST or a LEARNING TOPIC REQUEST.\n\n\
IF BOOK (e.g., \"Harry Potter\", \"The Great Gatsby\"):\n\
- Extract the book title\n\
- Choose narrators that fit the book's genre\n\
- Start at the CANONICAL BEGINNING of the story\n\
- Create an opening scene with 2-3 choices aligned with plot points\n\n\
IF LEARNING TOPIC (e.g., \"quantum physics\", \"how black holes work\"):\n\
- Identify the topic\n\
- Choose the expert narrators most qualified for this subject\n\
- Create an engaging introduction to the topic\n\
- Provide 2-3 choices for learning directions (deeper dive, related topic, \
practical example)\n\n\
Pick 1 to 3 narrators in narrator_names. Their order matters: position 0 is \
the primary voice and positions are the speaker indices used in scene_text. \
Use a single narrator unless the content genuinely benefits from a dialogue.\n\n\
CRITICAL: every entry of narrator_names MUST be copied EXACTLY from the list \
above. For example:\n\
- \"Stephen Hawking\" (correct)\n\
- \"stephen hawking\" (WRONG - incorrect capitalization)\n\
- \"Einstein\" (WRONG - incomplete name)\n\n\
{SPEAKER_TAG_RULES}\n\n\
For books use the convention book_title = the actual title; for learning \
topics use book_title = \"Learning: [Topic Name]\".\n\n\
IMPORTANT:\n\
- For books: stay true to source material\n\
- For learning: make it engaging, use analogies, relate to real life\n\
- Match narrator personality to content\n\
- Keep explanations clear and fun\n\n\
Image requirements:\n\
- Books: cinematic illustration of the scene\n\
- Learning: visual representation of the concept (diagrams, illustrations, \
metaphors)\n\
- Keep the description under 150 characters"
    )
}

pub fn build_continuation_prompt(
    user_input: &str,
    story: &StoryState,
    history: &[ConversationTurn],
) -> String {
    let recent = recent_history(history);
    let narrator_list = story.narrators.join(", ");

    match story.content_type {
        ContentType::Learning => format!(
            "You are continuing an interactive LEARNING experience about \
\"{title}\".\n\n\
Key Concepts: {summary}\n\
Current Section: {chapter}\n\
Experts (speaker order): {narrator_list}\n\n\
Recent Conversation:\n{recent}\n\n\
User's Choice: \"{user_input}\"\n\n\
Continue the learning experience:\n\
1. Acknowledge their choice\n\
2. Explain the concept clearly using analogies and examples\n\
3. Build on previous knowledge\n\
4. Provide 2-3 new choices (deeper dive, new angle, related topic)\n\
5. Keep it engaging and interactive\n\n\
{tag_rules}\n\n\
Image: educational illustration showing the concept clearly",
            title = story.book_title,
            summary = story.plot_summary,
            chapter = story.current_chapter,
            narrator_list = narrator_list,
            recent = recent,
            user_input = user_input,
            tag_rules = SPEAKER_TAG_RULES,
        ),
        ContentType::Book => format!(
            "You are continuing an interactive STORY from \"{title}\".\n\n\
Plot Summary: {summary}\n\
Current Chapter: {chapter}\n\
Narrators (speaker order): {narrator_list}\n\n\
Recent Story:\n{recent}\n\n\
User's Choice: \"{user_input}\"\n\n\
Continue the story while maintaining plot fidelity:\n\
1. Acknowledge their choice and show the consequence\n\
2. Progress toward the next major plot point from the actual book\n\
3. Keep characters and events consistent with the source material\n\
4. Present 2-3 new choices that lead to canonical story moments\n\
5. Update the chapter/progress tracker\n\n\
{tag_rules}\n\n\
Image: wide cinematic shot of this scene",
            title = story.book_title,
            summary = story.plot_summary,
            chapter = story.current_chapter,
            narrator_list = narrator_list,
            recent = recent,
            user_input = user_input,
            tag_rules = SPEAKER_TAG_RULES,
        ),
    }
}
