//! Note storage for the Obsidian vault.

mod file;
mod traits;

pub use file::VaultStorage;
pub use traits::{FoundNote, NoteStorage, StorageError, WriteOutcome};
