//! NPC concepts parsed from model output.

use serde::Deserialize;

/// Prompt sent for every NPC. The reply must be a bare JSON object.
pub const NPC_PROMPT: &str = r#"You are a fantasy world-building assistant skilled at creating memorable characters.
Your task is to invent a concept for a unique Non-Player Character (NPC).

Provide your response as a JSON object with two keys:
1. "name": A creative and fitting name for the NPC (e.g., "Kaelen the Silent" or "Mistress Vex").
2. "description": A one-sentence description of the NPC's core concept (e.g., "A disgraced royal cartographer selling forged maps to survive.").

Respond ONLY with the JSON object. Do not include any explanatory text or markdown formatting.
"#;

/// A generated NPC: a name and a one-sentence description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpcConcept {
    pub name: String,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConceptError {
    /// Not JSON, not an object, missing/extra keys, or non-string values
    #[error("response is not a {{\"name\", \"description\"}} JSON object: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("concept has an empty name")]
    EmptyName,
}

impl NpcConcept {
    /// Parse a model reply into a concept.
    ///
    /// The reply must decode as a JSON object with exactly the string fields
    /// `name` and `description`. Surrounding whitespace on the name is trimmed.
    pub fn from_json(text: &str) -> Result<Self, ConceptError> {
        // Decode as a map first: a derived struct would also accept a JSON array
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|source| ConceptError::InvalidJson { source })?;
        let concept: NpcConcept = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|source| ConceptError::InvalidJson { source })?;

        let name = concept.name.trim();
        if name.is_empty() {
            return Err(ConceptError::EmptyName);
        }

        Ok(NpcConcept {
            name: name.to_string(),
            description: concept.description,
        })
    }
}
