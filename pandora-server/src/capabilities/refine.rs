use pandora_core::generation::GenerationBackend;
use pandora_core::prompts;

/// Refine existing story text with a named storytelling technique.
/// Stateless — nothing is persisted.
pub async fn enhance_story(
    generator: &dyn GenerationBackend,
    story_text: &str,
    enhancement_type: &str,
) -> anyhow::Result<String> {
    let prompt = prompts::enhance_prompt(story_text, enhancement_type);
    let enhanced = generator.generate(&prompt).await?;
    tracing::info!(technique = enhancement_type, backend = generator.name(), "story enhanced");
    Ok(enhanced)
}

/// Apply the requested polish options to existing story text.
/// Stateless — nothing is persisted.
pub async fn polish_story(
    generator: &dyn GenerationBackend,
    story_text: &str,
    polish_options: &[String],
) -> anyhow::Result<String> {
    let prompt = prompts::polish_prompt(story_text, polish_options);
    let polished = generator.generate(&prompt).await?;
    tracing::info!(options = polish_options.len(), backend = generator.name(), "story polished");
    Ok(polished)
}
