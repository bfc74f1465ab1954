//! Prompt synthesis for the story capabilities.
//!
//! The wording of these prompts is part of the external contract with the
//! generation provider and is kept stable. Parameters pass through verbatim;
//! no filtering or escaping is applied.

use crate::models::story::StoryDraft;

/// Suggested story origins offered by the form frontend.
pub const STORY_ORIGINS: &[&str] = &["Personal Anecdote", "Adapt a Well-Known Tale"];

/// Suggested use cases.
pub const USE_CASES: &[&str] = &["Profile Story", "Social Media Content", "Marketing Story"];

/// Suggested time frames.
pub const TIME_FRAMES: &[&str] = &["Childhood", "Mid-Career", "Recent Experiences"];

/// Suggested leadership qualities for the story focus tags.
pub const STORY_FOCUS_QUALITIES: &[&str] =
    &["Generosity", "Integrity", "Loyalty", "Determination"];

/// Suggested story types.
pub const STORY_TYPES: &[&str] = &["Founding Story", "Vision Story", "Strategy Story"];

/// Storytelling techniques offered for enhancement.
pub const ENHANCEMENT_TECHNIQUES: &[&str] = &[
    "The Story Hanger",
    "The Story Spine",
    "Hero's Journey",
    "Nested Loops",
    "Cliffhanger",
];

/// Creative options offered for polishing.
pub const POLISH_OPTIONS: &[&str] = &[
    "Impactful Quotes",
    "Poems",
    "Similes",
    "Comparisons",
    "AI-generated descriptions",
];

/// Prompt for the generate capability. The full parameter structure is
/// embedded as JSON.
pub fn story_prompt(draft: &StoryDraft) -> String {
    let details = serde_json::to_string(draft).unwrap_or_default();
    format!("Create a compelling story based on the following details: {details}")
}

/// Prompt for the enhance capability.
pub fn enhance_prompt(story_text: &str, enhancement_type: &str) -> String {
    format!("Refine the following story using the {enhancement_type} technique: {story_text}")
}

/// Prompt for the polish capability. Options are listed comma-separated.
pub fn polish_prompt(story_text: &str, polish_options: &[String]) -> String {
    let options = polish_options.join(", ");
    format!("Improve the following story by adding {options}: {story_text}")
}
