//! Filename and frontmatter utilities for Obsidian notes
//!
//! Handles title sanitization, note filename derivation, relative path
//! validation, and YAML frontmatter rendering/parsing. These are pure
//! functions with no I/O - reading and writing files is left to callers.

mod frontmatter;

pub use frontmatter::{build_note, parse_note, render_frontmatter, split_frontmatter, NoteFrontmatter, ParsedNote};

use std::path::{Component, Path, PathBuf};

/// File extension used for every note.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Reduce a note title to a filesystem-safe name.
///
/// Keeps alphanumeric characters (Unicode-aware), spaces, underscores and
/// hyphens, then strips trailing whitespace. Leading whitespace is kept.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    kept.trim_end().to_string()
}

/// Derive the note filename (`<sanitized title>.md`) for a title.
///
/// Returns None when nothing of the title survives sanitization.
pub fn note_file_name(title: &str) -> Option<String> {
    let safe = sanitize_title(title);
    if safe.is_empty() {
        None
    } else {
        Some(ensure_markdown_extension(&safe))
    }
}

/// Ensure .md extension on note paths
pub fn ensure_markdown_extension(note_path: &str) -> String {
    if note_path.ends_with(MARKDOWN_EXTENSION) {
        note_path.to_string()
    } else {
        format!("{}{}", note_path, MARKDOWN_EXTENSION)
    }
}

/// Validate that a folder path stays inside the vault.
///
/// Rejects absolute paths and `..` components; drops `.` components.
/// An empty or `.` path normalizes to the vault root (empty PathBuf).
pub fn validate_relative_path(path: &Path) -> Result<PathBuf, PathValidationError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(PathValidationError::DirectoryTraversal),
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathValidationError::AbsolutePath);
            }
        }
    }
    Ok(clean)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathValidationError {
    DirectoryTraversal,
    AbsolutePath,
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathValidationError::DirectoryTraversal => {
                write!(f, "Path contains directory traversal")
            }
            PathValidationError::AbsolutePath => write!(f, "Path is absolute"),
        }
    }
}

impl std::error::Error for PathValidationError {}
