pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod models;
pub mod prompts;

pub use config::PandoraConfig;
pub use error::PandoraError;
pub use generation::{
    GenerationBackend, GenerationConfig, GenerationError, OpenAiGenerationClient, create_backend,
};
pub use models::story::{StoryDraft, StoryRecord};
