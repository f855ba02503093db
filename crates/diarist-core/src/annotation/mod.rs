//! Diary annotation
//!
//! Turns a diary entry plus the author's profile into one
//! [`AnnotationRecord`] per person mentioned, each carrying the person's
//! relationship to the profile's main user.

mod orchestrator;

pub use orchestrator::{AnnotationStage, Annotator, extract_writer_name, writer_is_child};

use serde::{Deserialize, Serialize};

/// Relationship annotation for one mentioned person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Surface form as it appeared in the text
    pub entity: String,
    /// Resolved relationship, or "Unknown"
    pub relationship: String,
    /// Text the entity was found in (the whole resolved entry)
    pub context: String,
}

impl AnnotationRecord {
    pub fn new(
        entity: impl Into<String>,
        relationship: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            relationship: relationship.into(),
            context: context.into(),
        }
    }
}

/// All annotations produced for one diary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// The diary entry as submitted, before pronoun resolution
    pub original_text: String,
    pub annotations: Vec<AnnotationRecord>,
}
