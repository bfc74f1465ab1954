//! pandora-cli — form-style frontend for the Pandora story generation API
//!
//! Collects the same structured inputs as the original story form and calls
//! the HTTP capabilities, rendering the returned text to stdout.
//!
//! # Subcommands
//! - `generate` — generate a story from structured parameters and persist it
//! - `stories`  — list every stored story
//! - `update <id> <text>` — overwrite the text of a stored story
//! - `enhance <text> --technique <name>` — refine text with a technique
//! - `polish <text> --option <name>...`  — apply polish options to text
//! - `status`   — show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";

const SUGGESTIONS: &str = "\
Suggested inputs (any value is accepted):
  origins:     Personal Anecdote, Adapt a Well-Known Tale
  use cases:   Profile Story, Social Media Content, Marketing Story
  time frames: Childhood, Mid-Career, Recent Experiences
  focus tags:  Generosity, Integrity, Loyalty, Determination
  story types: Founding Story, Vision Story, Strategy Story
  techniques:  The Story Hanger, The Story Spine, Hero's Journey, Nested Loops, Cliffhanger
  polish:      Impactful Quotes, Poems, Similes, Comparisons, AI-generated descriptions";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "pandora-cli",
    version,
    about = "Pandora story generation — form-style CLI frontend",
    after_help = SUGGESTIONS
)]
struct Cli {
    /// Pandora HTTP server URL (overrides PANDORA_API_URL env var)
    #[arg(long, env = "PANDORA_API_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a story from structured parameters and store it
    Generate {
        /// Story origin category
        #[arg(long)]
        origin: String,

        /// Use case category
        #[arg(long)]
        use_case: String,

        /// Time frame category
        #[arg(long)]
        time_frame: String,

        /// Focus tag (repeatable)
        #[arg(long = "focus")]
        focus: Vec<String>,

        /// Story type category
        #[arg(long)]
        story_type: String,

        /// Key story details as free text
        #[arg(long, default_value = "")]
        details: String,
    },

    /// List every stored story
    Stories {
        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Overwrite the text of a stored story
    Update {
        /// Story id
        story_id: i64,

        /// Replacement story text
        story_text: String,
    },

    /// Refine story text with a named storytelling technique
    Enhance {
        /// The story text to refine
        story_text: String,

        /// Storytelling technique to apply
        #[arg(long)]
        technique: String,
    },

    /// Apply polish options to story text
    Polish {
        /// The story text to polish
        story_text: String,

        /// Polish option (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
    },

    /// Show Pandora server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// A single story row from GET /get_stories
#[derive(Debug, Deserialize)]
pub struct StoryRow {
    pub id: i64,
    pub story_origin: String,
    pub use_case: String,
    pub time_frame: String,
    pub story_focus: Vec<String>,
    pub story_type: String,
    pub story_text: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoriesResponse {
    pub stories: Vec<StoryRow>,
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// Wrap free-text details the way the original form did.
pub fn details_payload(details: &str) -> serde_json::Value {
    serde_json::json!({ "content": details })
}

/// First `max` characters of the story text, on one logical block.
pub fn story_preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// One-line header for a stored story.
pub fn story_heading(row: &StoryRow) -> String {
    format!(
        "[{}] {} — {} / {} / {} ({})",
        row.id,
        row.story_type,
        row.story_origin,
        row.use_case,
        row.time_frame,
        row.story_focus.join(", ")
    )
}

/// Pull the detail message out of a service-error body, if present.
pub fn error_detail_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["detail"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

/// Send a request; on any failure print the detail and exit non-zero.
fn send_json(
    req: reqwest::blocking::RequestBuilder,
    url: &str,
) -> serde_json::Value {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("pandora-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!(
            "pandora-cli: server returned {}: {}",
            status,
            error_detail_from_body(&body)
        );
        std::process::exit(1);
    }

    match resp.json() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("pandora-cli: failed to parse response: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn do_generate(
    server: &str,
    origin: String,
    use_case: String,
    time_frame: String,
    focus: Vec<String>,
    story_type: String,
    details: String,
) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/generate_story", server);
    let body = serde_json::json!({
        "story_origin": origin,
        "use_case": use_case,
        "time_frame": time_frame,
        "story_focus": focus,
        "story_type": story_type,
        "details": details_payload(&details),
    });

    let resp = send_json(client.post(&url).json(&body), &url);
    println!("{}", resp["story"].as_str().unwrap_or(""));
    Ok(())
}

fn do_stories(server: &str, json_output: bool) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/get_stories", server);

    let resp = send_json(client.get(&url), &url);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    let parsed: StoriesResponse = serde_json::from_value(resp)?;
    if parsed.stories.is_empty() {
        eprintln!("No stories stored yet.");
        return Ok(());
    }
    for row in &parsed.stories {
        println!("{}", story_heading(row));
        println!("{}\n", story_preview(&row.story_text, 200));
    }
    Ok(())
}

fn do_update(server: &str, story_id: i64, story_text: String) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/update_story", server);
    let body = serde_json::json!({ "story_id": story_id, "story_text": story_text });

    let resp = send_json(client.put(&url).json(&body), &url);
    println!("{}", resp["message"].as_str().unwrap_or("updated"));
    Ok(())
}

fn do_enhance(server: &str, story_text: String, technique: String) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/enhance_story", server);
    let body = serde_json::json!({ "story_text": story_text, "enhancement_type": technique });

    let resp = send_json(client.post(&url).json(&body), &url);
    println!("{}", resp["enhanced_story"].as_str().unwrap_or(""));
    Ok(())
}

fn do_polish(server: &str, story_text: String, options: Vec<String>) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/polish_story", server);
    let body = serde_json::json!({ "story_text": story_text, "polish_options": options });

    let resp = send_json(client.post(&url).json(&body), &url);
    println!("{}", resp["polished_story"].as_str().unwrap_or(""));
    Ok(())
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Pandora server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:     {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Stories:        {}", body["stories"]);
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("pandora-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("pandora-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Generate {
            origin,
            use_case,
            time_frame,
            focus,
            story_type,
            details,
        } => do_generate(&server, origin, use_case, time_frame, focus, story_type, details),
        Commands::Stories { json } => do_stories(&server, json),
        Commands::Update {
            story_id,
            story_text,
        } => do_update(&server, story_id, story_text),
        Commands::Enhance {
            story_text,
            technique,
        } => do_enhance(&server, story_text, technique),
        Commands::Polish {
            story_text,
            options,
        } => do_polish(&server, story_text, options),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("pandora-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_row() -> StoryRow {
        StoryRow {
            id: 12,
            story_origin: "Personal Anecdote".to_string(),
            use_case: "Profile Story".to_string(),
            time_frame: "Childhood".to_string(),
            story_focus: vec!["Integrity".to_string(), "Loyalty".to_string()],
            story_type: "Founding Story".to_string(),
            story_text: "Growing up on a farm taught me a lot.".to_string(),
            created_at: Some("2026-08-08T10:00:00Z".to_string()),
        }
    }

    // ========================================================================
    // TEST 1: details free text wraps into the form's content mapping
    // ========================================================================
    #[test]
    fn test_details_payload_wraps_content() {
        let payload = details_payload("grew up on a farm");
        assert_eq!(payload, serde_json::json!({ "content": "grew up on a farm" }));
    }

    // ========================================================================
    // TEST 2: empty details still produce a content key
    // ========================================================================
    #[test]
    fn test_details_payload_empty() {
        let payload = details_payload("");
        assert_eq!(payload["content"], "");
    }

    // ========================================================================
    // TEST 3: story heading includes id, type, and joined focus tags
    // ========================================================================
    #[test]
    fn test_story_heading_format() {
        let heading = story_heading(&mock_row());
        assert_eq!(
            heading,
            "[12] Founding Story — Personal Anecdote / Profile Story / Childhood (Integrity, Loyalty)"
        );
    }

    // ========================================================================
    // TEST 4: story preview truncates to the requested length
    // ========================================================================
    #[test]
    fn test_story_preview_truncates() {
        let text = "A".repeat(500);
        assert_eq!(story_preview(&text, 200).len(), 200);
    }

    // ========================================================================
    // TEST 5: short text passes through the preview untouched
    // ========================================================================
    #[test]
    fn test_story_preview_short_text() {
        assert_eq!(story_preview("short", 200), "short");
    }

    // ========================================================================
    // TEST 6: service-error bodies expose their detail message
    // ========================================================================
    #[test]
    fn test_error_detail_extracted() {
        let body = r#"{"detail": "API error (500): model overloaded"}"#;
        assert_eq!(error_detail_from_body(body), "API error (500): model overloaded");
    }

    // ========================================================================
    // TEST 7: non-JSON error bodies fall back to the raw text
    // ========================================================================
    #[test]
    fn test_error_detail_fallback_raw() {
        assert_eq!(error_detail_from_body("bad gateway"), "bad gateway");
    }

    // ========================================================================
    // TEST 8: stories response parses from the wire shape
    // ========================================================================
    #[test]
    fn test_stories_response_parses() {
        let json = r#"{
            "stories": [{
                "id": 1,
                "created_at": "2026-08-08T10:00:00Z",
                "story_origin": "Personal Anecdote",
                "use_case": "Profile Story",
                "time_frame": "Childhood",
                "story_focus": ["Integrity"],
                "story_type": "Founding Story",
                "details": {"content": "grew up on a farm"},
                "story_text": "A story."
            }]
        }"#;
        let parsed: StoriesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.stories.len(), 1);
        assert_eq!(parsed.stories[0].id, 1);
        assert_eq!(parsed.stories[0].story_text, "A story.");
    }
}
