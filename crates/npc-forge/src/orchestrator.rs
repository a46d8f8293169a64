//! The generate-and-persist loop.

use crate::concept::{ConceptError, NpcConcept, NPC_PROMPT};
use crate::gemini::{GenerationError, ResponseFormat, TextGenerator};
use crate::storage::{NoteStorage, WriteOutcome};

/// What to generate in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of generation attempts; failed attempts are not retried or backfilled
    pub count: u32,
    /// Frontmatter tags added to every note
    pub tags: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            count: 1,
            tags: Vec::new(),
        }
    }
}

/// Tally of iteration outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub requested: u32,
    pub created: u32,
    pub skipped: u32,
    pub generation_failures: u32,
    pub write_failures: u32,
}

/// Why an iteration produced no concept.
#[derive(Debug, thiserror::Error)]
pub enum ConceptFailure {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Invalid(#[from] ConceptError),
}

/// Ask the generator for one NPC concept in JSON mode and parse it.
pub async fn generate_concept<G>(generator: &G) -> Result<NpcConcept, ConceptFailure>
where
    G: TextGenerator + ?Sized,
{
    let text = generator.generate(NPC_PROMPT, ResponseFormat::Json).await?;

    NpcConcept::from_json(&text).map_err(|e| {
        tracing::debug!("Received: {}", text);
        ConceptFailure::from(e)
    })
}

/// Generate `options.count` NPCs one after another, writing a note for each.
///
/// Every failure is confined to its own iteration: it is logged, counted and
/// the loop moves on.
pub async fn run<G, S>(generator: &G, storage: &S, options: &RunOptions) -> RunSummary
where
    G: TextGenerator + ?Sized,
    S: NoteStorage + ?Sized,
{
    let mut summary = RunSummary {
        requested: options.count,
        ..RunSummary::default()
    };

    tracing::info!("Starting generation of {} NPC(s)", options.count);

    for i in 1..=options.count {
        tracing::info!("Generating NPC {} of {}", i, options.count);

        let concept = match generate_concept(generator).await {
            Ok(concept) => concept,
            Err(e) => {
                tracing::warn!("Skipping NPC {}: {}", i, e);
                summary.generation_failures += 1;
                continue;
            }
        };

        tracing::debug!("Concept: {} - {}", concept.name, concept.description);

        match storage
            .create_note(&concept.name, &concept.description, &options.tags)
            .await
        {
            Ok(WriteOutcome::Created { .. }) => summary.created += 1,
            Ok(WriteOutcome::Skipped { path }) => {
                tracing::warn!("NPC '{}' already has a note at {}", concept.name, path.display());
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::error!("Failed to write note for '{}': {}", concept.name, e);
                summary.write_failures += 1;
            }
        }
    }

    tracing::info!(
        "Finished: {} created, {} skipped, {} generation failures, {} write failures",
        summary.created,
        summary.skipped,
        summary.generation_failures,
        summary.write_failures
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FoundNote, StorageError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it was sent.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        formats: Mutex<Vec<ResponseFormat>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                formats: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, format: ResponseFormat) -> Result<String, GenerationError> {
            self.formats.lock().unwrap().push(format);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("generator called more times than scripted")
        }
    }

    /// Records create calls; fails for titles listed in `fail_titles`.
    #[derive(Default)]
    struct RecordingStorage {
        created: Mutex<Vec<(String, String, Vec<String>)>>,
        fail_titles: Vec<String>,
    }

    #[async_trait]
    impl NoteStorage for RecordingStorage {
        async fn create_note(
            &self,
            title: &str,
            body: &str,
            tags: &[String],
        ) -> Result<WriteOutcome, StorageError> {
            let path = PathBuf::from(format!("{}.md", title));
            if self.fail_titles.iter().any(|t| t == title) {
                return Err(StorageError::io(
                    &path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            let mut created = self.created.lock().unwrap();
            if created.iter().any(|(t, _, _)| t == title) {
                return Ok(WriteOutcome::Skipped { path });
            }
            created.push((title.to_string(), body.to_string(), tags.to_vec()));
            Ok(WriteOutcome::Created { path })
        }

        async fn find_note(&self, _title: &str) -> Result<Option<FoundNote>, StorageError> {
            Ok(None)
        }
    }

    fn reply(name: &str, description: &str) -> Result<String, GenerationError> {
        Ok(serde_json::json!({ "name": name, "description": description }).to_string())
    }

    #[tokio::test]
    async fn test_generate_concept_uses_json_mode() {
        let generator = ScriptedGenerator::new(vec![reply("Kaelen", "A silent wanderer.")]);

        let concept = generate_concept(&generator).await.unwrap();
        assert_eq!(concept.name, "Kaelen");
        assert_eq!(*generator.formats.lock().unwrap(), vec![ResponseFormat::Json]);
    }

    #[tokio::test]
    async fn test_run_writes_one_note_per_concept() {
        let generator = ScriptedGenerator::new(vec![
            reply("Kaelen", "A silent wanderer."),
            reply("Mistress Vex", "Sells forged maps."),
        ]);
        let storage = RecordingStorage::default();
        let options = RunOptions {
            count: 2,
            tags: vec!["npc".to_string()],
        };

        let summary = run(&generator, &storage, &options).await;

        assert_eq!(
            summary,
            RunSummary {
                requested: 2,
                created: 2,
                ..RunSummary::default()
            }
        );
        let created = storage.created.lock().unwrap();
        assert_eq!(
            created[0],
            ("Kaelen".to_string(), "A silent wanderer.".to_string(), vec!["npc".to_string()])
        );
        assert_eq!(created[1].0, "Mistress Vex");
    }

    #[tokio::test]
    async fn test_failures_skip_iteration_without_backfill() {
        let generator = ScriptedGenerator::new(vec![
            Ok("not json".to_string()),
            Err(GenerationError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            }),
            reply("Old Tom", "Keeps the ferry."),
        ]);
        let storage = RecordingStorage::default();

        let summary = run(&generator, &storage, &RunOptions { count: 3, tags: vec![] }).await;

        assert_eq!(summary.generation_failures, 2);
        assert_eq!(summary.created, 1);
        // Exactly three attempts: the script is fully consumed, nothing more was requested
        assert_eq!(generator.formats.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_skips_and_write_failures_do_not_stop_the_loop() {
        let generator = ScriptedGenerator::new(vec![
            reply("Kaelen", "First."),
            reply("Kaelen", "Duplicate."),
            reply("Broken", "Cannot be written."),
            reply("Last", "Still generated."),
        ]);
        let storage = RecordingStorage {
            fail_titles: vec!["Broken".to_string()],
            ..RecordingStorage::default()
        };

        let summary = run(&generator, &storage, &RunOptions { count: 4, tags: vec![] }).await;

        assert_eq!(
            summary,
            RunSummary {
                requested: 4,
                created: 2,
                skipped: 1,
                generation_failures: 0,
                write_failures: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_zero_count_does_nothing() {
        let generator = ScriptedGenerator::new(vec![]);
        let storage = RecordingStorage::default();

        let summary = run(&generator, &storage, &RunOptions { count: 0, tags: vec![] }).await;

        assert_eq!(summary, RunSummary::default());
        assert!(generator.formats.lock().unwrap().is_empty());
    }
}
