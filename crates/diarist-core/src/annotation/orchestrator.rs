//! Annotation pipeline
//!
//! Runs the deterministic half of diary processing:
//!
//! ```text
//! Idle → CoreferenceResolved → WriterIdentified → EntitiesExtracted → GraphResolved → Done
//! ```
//!
//! Nothing here fails: people the graph cannot place are annotated as
//! "Unknown".

use tracing::{debug, info};

use crate::kinship;
use crate::nlp::EntityExtractor;
use crate::profile::PersonalProfile;
use crate::relationship::{build_graph, resolve};

use super::{AnnotationRecord, AnnotationResult};

/// Progress of a single annotation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationStage {
    Idle,
    CoreferenceResolved,
    WriterIdentified,
    EntitiesExtracted,
    GraphResolved,
    Done,
}

impl AnnotationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CoreferenceResolved => "coreference_resolved",
            Self::WriterIdentified => "writer_identified",
            Self::EntitiesExtracted => "entities_extracted",
            Self::GraphResolved => "graph_resolved",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for AnnotationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The writer's signature: the last non-blank line, trimmed
pub fn extract_writer_name(diary_entry: &str) -> String {
    diary_entry
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Whether the writer looks like one of the profile's family members.
///
/// Fuzzy on purpose: either name containing the other (ignoring case)
/// counts as a match.
pub fn writer_is_child(writer: &str, profile: &PersonalProfile) -> bool {
    let writer = writer.to_lowercase();
    profile.family().any(|(_, member)| {
        let member_name = member.name.to_lowercase();
        member_name.contains(&writer) || writer.contains(&member_name)
    })
}

/// Writer-relative label for a parent term, when the writer is a child
fn parent_label(canonical: &str) -> Option<&'static str> {
    match canonical {
        "dad" => Some("father"),
        "mom" => Some("mother"),
        _ => None,
    }
}

/// Produces relationship annotations for diary entries
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    extractor: EntityExtractor,
}

impl Annotator {
    pub fn new(extractor: EntityExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// Annotate every person mentioned in `diary_entry`
    pub fn annotate(&self, diary_entry: &str, profile: &PersonalProfile) -> AnnotationResult {
        let mut stage = AnnotationStage::Idle;
        debug!(%stage, chars = diary_entry.len(), "Starting diary annotation");

        let resolved_text = self.extractor.resolve_coreferences(diary_entry);
        stage = advance(stage, AnnotationStage::CoreferenceResolved);

        let writer = extract_writer_name(&resolved_text);
        stage = advance(stage, AnnotationStage::WriterIdentified);
        debug!(writer = %writer, "Extracted writer name");

        let graph = build_graph(profile);
        let persons = self.extractor.extract_entities(&resolved_text).persons;
        stage = advance(stage, AnnotationStage::EntitiesExtracted);

        let from_child = writer_is_child(&writer, profile);
        let annotations: Vec<AnnotationRecord> = persons
            .into_iter()
            .map(|name| {
                let canonical = kinship::canonicalize(&name);
                let relationship = match parent_label(&canonical).filter(|_| from_child) {
                    Some(label) => label.to_string(),
                    None => resolve(&graph, &profile.full_name, &canonical),
                };
                debug!(entity = %name, relationship = %relationship, "Annotation added");
                AnnotationRecord::new(name, relationship, resolved_text.as_str())
            })
            .collect();
        stage = advance(stage, AnnotationStage::GraphResolved);

        let result = AnnotationResult {
            original_text: diary_entry.to_string(),
            annotations,
        };
        stage = advance(stage, AnnotationStage::Done);

        info!(
            %stage,
            writer_is_child = from_child,
            annotations = result.annotations.len(),
            "Diary annotation completed"
        );
        result
    }
}

fn advance(from: AnnotationStage, to: AnnotationStage) -> AnnotationStage {
    debug!(from = %from, to = %to, "Annotation stage");
    to
}
