//! Filesystem storage implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat};
use obsidian_fs::{build_note, note_file_name, NoteFrontmatter};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::traits::{FoundNote, NoteStorage, StorageError, WriteOutcome};
use crate::config::VaultSettings;

/// Filesystem storage backend.
///
/// Writes notes into `<vault>/<output_folder>` and searches the whole vault
/// when reading.
pub struct VaultStorage {
    settings: VaultSettings,
}

impl VaultStorage {
    /// Create a new VaultStorage for the given vault settings.
    pub fn new(settings: VaultSettings) -> Self {
        Self { settings }
    }

    fn file_name_for(title: &str) -> Result<String, StorageError> {
        note_file_name(title).ok_or_else(|| StorageError::InvalidTitle {
            title: title.to_string(),
        })
    }

    /// Write `content` to a file that must not exist yet.
    ///
    /// Returns Ok(false) if the file already exists. A partially written file
    /// is removed before the error is returned.
    async fn write_new_file(path: &Path, content: &str) -> Result<bool, StorageError> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let written = match file.write_all(content.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(path).await;
            return Err(StorageError::io(path, e));
        }

        Ok(true)
    }

    /// Recursively collect files named `file_name`, skipping hidden entries.
    async fn find_matching_files(
        dir: &Path,
        file_name: &str,
        matches: &mut Vec<PathBuf>,
    ) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::io(dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(dir, e))?
        {
            let path = entry.path();
            let entry_name = entry.file_name();
            let entry_name = entry_name.to_string_lossy();

            // Skip hidden directories (.obsidian, .git, .trash, etc.)
            if entry_name.starts_with('.') {
                continue;
            }

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            if file_type.is_dir() {
                Box::pin(Self::find_matching_files(&path, file_name, matches)).await?;
            } else if file_type.is_file() && entry_name == file_name {
                matches.push(path);
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl NoteStorage for VaultStorage {
    async fn create_note(
        &self,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> Result<WriteOutcome, StorageError> {
        let file_name = Self::file_name_for(title)?;

        let output_dir = self.settings.output_dir();
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| StorageError::io(&output_dir, e))?;

        let path = output_dir.join(file_name);

        let frontmatter = NoteFrontmatter {
            title: title.to_string(),
            date: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            tags: tags.to_vec(),
        };
        let content =
            build_note(&frontmatter, body).map_err(|source| StorageError::Frontmatter {
                title: title.to_string(),
                source,
            })?;

        if Self::write_new_file(&path, &content).await? {
            tracing::info!("Created note: {}", path.display());
            Ok(WriteOutcome::Created { path })
        } else {
            tracing::info!("Note {} already exists, skipping creation", path.display());
            Ok(WriteOutcome::Skipped { path })
        }
    }

    async fn find_note(&self, title: &str) -> Result<Option<FoundNote>, StorageError> {
        let file_name = Self::file_name_for(title)?;
        let vault_path = &self.settings.vault_path;

        if !vault_path.is_dir() {
            tracing::warn!("Vault directory {} does not exist", vault_path.display());
            return Ok(None);
        }

        let mut matches = Vec::new();
        Self::find_matching_files(vault_path, &file_name, &mut matches).await?;

        let Some(path) = matches.first().cloned() else {
            tracing::info!("Note '{}' not found in vault {}", title, vault_path.display());
            return Ok(None);
        };

        if matches.len() > 1 {
            let listing: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
            tracing::warn!(
                "Found {} notes named '{}', returning the first: {}",
                matches.len(),
                file_name,
                listing.join(", ")
            );
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!("Read note: {}", path.display());

        Ok(Some(FoundNote { path, content }))
    }
}
