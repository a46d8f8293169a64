//! Storage trait definition and error types.

use std::path::PathBuf;

/// Errors that can occur during note storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing of the title survives filename sanitization
    #[error("title '{title}' has no characters usable in a filename")]
    InvalidTitle { title: String },

    /// The frontmatter could not be serialized
    #[error("failed to render frontmatter for '{title}': {source}")]
    Frontmatter {
        title: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O error while creating, writing or reading a note
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result of a create operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new note was written
    Created { path: PathBuf },
    /// A note with the same filename already existed and was left untouched
    Skipped { path: PathBuf },
}

impl WriteOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            WriteOutcome::Created { path } | WriteOutcome::Skipped { path } => path,
        }
    }
}

/// A note located by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundNote {
    /// Absolute path of the note file
    pub path: PathBuf,
    /// Full file content, frontmatter included
    pub content: String,
}

/// Abstract storage backend for generated notes.
///
/// Notes are identified by title; implementations derive the filename with
/// [`obsidian_fs::sanitize_title`]. Notes are create-once: an existing note is
/// never overwritten.
#[async_trait::async_trait]
pub trait NoteStorage: Send + Sync {
    /// Create a note unless one with the same derived filename already exists.
    ///
    /// # Arguments
    /// * `title` - Note title, stored as the frontmatter `title` value
    /// * `body` - Markdown body, written verbatim after the frontmatter
    /// * `tags` - Frontmatter tags; omitted from the note when empty
    async fn create_note(
        &self,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> Result<WriteOutcome, StorageError>;

    /// Find a note by title anywhere in the vault.
    ///
    /// Returns `Ok(None)` when no file matches.
    async fn find_note(&self, title: &str) -> Result<Option<FoundNote>, StorageError>;
}
