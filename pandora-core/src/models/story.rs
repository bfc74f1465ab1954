use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-supplied story parameters. Values pass through to the prompt and
/// the store unfiltered; `details` is an open string-keyed mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDraft {
    pub story_origin: String,
    pub use_case: String,
    pub time_frame: String,
    pub story_focus: Vec<String>,
    pub story_type: String,
    pub details: serde_json::Value,
}

/// A persisted story row. `id` and `created_at` are store-assigned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoryRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub story_origin: String,
    pub use_case: String,
    pub time_frame: String,
    pub story_focus: Vec<String>,
    pub story_type: String,
    pub details: serde_json::Value,
    pub story_text: String,
}
