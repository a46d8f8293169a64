//! npc-forge: generate fantasy NPC concepts with Gemini and save them as
//! Obsidian notes.

pub mod concept;
pub mod config;
pub mod gemini;
pub mod orchestrator;
pub mod storage;

pub use concept::{ConceptError, NpcConcept};
pub use config::{Config, ConfigError, GeminiSettings, VaultSettings};
pub use gemini::{GeminiClient, GenerationError, ResponseFormat, TextGenerator};
pub use orchestrator::{run, RunOptions, RunSummary};
pub use storage::{FoundNote, NoteStorage, StorageError, VaultStorage, WriteOutcome};
