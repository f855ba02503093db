//! End-to-end diary processing
//!
//! ```text
//! request → fetch profile → annotate → reconcile → store → response
//! ```
//!
//! Every stage depends on the previous one, so they run in sequence. Any
//! failure aborts the run before the store step; nothing is written for a
//! failed run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::annotation::Annotator;
use crate::error::{Error, Result};
use crate::profile::ProfileSource;
use crate::reconcile::Reconciler;
use crate::storage::{NewStory, StoryRepository};

/// A diary entry to annotate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    #[serde(default)]
    pub diary_entry: Option<String>,
    #[serde(default)]
    pub personal_id: Option<i64>,
}

impl AnnotateRequest {
    pub fn new(diary_entry: impl Into<String>, personal_id: i64) -> Self {
        Self {
            diary_entry: Some(diary_entry.into()),
            personal_id: Some(personal_id),
        }
    }

    /// The entry and id, or `MissingInput` when either is absent.
    ///
    /// A blank entry and an id of zero count as absent.
    pub fn validate(&self) -> Result<(&str, i64)> {
        // Whitespace-only entries are rejected too, stricter than an
        // emptiness check.
        let diary_entry = self
            .diary_entry
            .as_deref()
            .filter(|entry| !entry.trim().is_empty());
        let personal_id = self.personal_id.filter(|id| *id != 0);

        match (diary_entry, personal_id) {
            (Some(entry), Some(id)) => Ok((entry, id)),
            (None, Some(_)) => Err(Error::MissingInput("diary_entry".to_string())),
            (Some(_), None) => Err(Error::MissingInput("personal_id".to_string())),
            (None, None) => Err(Error::MissingInput("diary_entry, personal_id".to_string())),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateResponse {
    pub story_id: i64,
    pub original_diary_text: String,
    pub annotated_story: String,
    pub annotations: Vec<Value>,
    pub ai_enhanced_annotations: Value,
}

/// Runs diary entries through annotation, reconciliation and storage
#[derive(Clone)]
pub struct DiaryPipeline {
    profiles: Arc<dyn ProfileSource>,
    annotator: Annotator,
    reconciler: Reconciler,
    stories: Arc<dyn StoryRepository>,
}

impl std::fmt::Debug for DiaryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiaryPipeline")
            .field("annotator", &self.annotator)
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl DiaryPipeline {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        annotator: Annotator,
        reconciler: Reconciler,
        stories: Arc<dyn StoryRepository>,
    ) -> Self {
        Self {
            profiles,
            annotator,
            reconciler,
            stories,
        }
    }

    /// Annotate a diary entry and store the resulting story
    pub async fn annotate(&self, request: &AnnotateRequest) -> Result<AnnotateResponse> {
        let (diary_entry, personal_id) = request.validate()?;

        info!(personal_id, chars = diary_entry.len(), "Processing diary entry");

        let profile = self.profiles.fetch(personal_id).await?;
        info!(personal_id, full_name = %profile.full_name, "Personal profile loaded");

        let nlp_result = self.annotator.annotate(diary_entry, &profile);
        let reconciled = self.reconciler.reconcile(diary_entry, &nlp_result).await?;

        let story = NewStory {
            diary_text: diary_entry.to_string(),
            annotated_story: reconciled.refined_text,
            personal_data: profile.snapshot().clone(),
            annotations: reconciled.annotations,
            ai_enhanced_annotations: reconciled.raw_response,
        };
        let story_id = self.stories.insert(&story).await?;
        info!(personal_id, story_id, "Diary entry processed");

        Ok(AnnotateResponse {
            story_id,
            original_diary_text: story.diary_text,
            annotated_story: story.annotated_story,
            annotations: story.annotations,
            ai_enhanced_annotations: story.ai_enhanced_annotations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_complete_request() {
        let request = AnnotateRequest::new("Alex went out.\nSam", 7);
        assert_eq!(request.validate().unwrap(), ("Alex went out.\nSam", 7));
    }

    #[test]
    fn test_validate_missing_fields() {
        let missing_entry = AnnotateRequest {
            diary_entry: None,
            personal_id: Some(7),
        };
        assert!(matches!(
            missing_entry.validate(),
            Err(Error::MissingInput(field)) if field == "diary_entry"
        ));

        for blank in ["", "   ", "  \n\t "] {
            assert!(matches!(
                AnnotateRequest::new(blank, 7).validate(),
                Err(Error::MissingInput(field)) if field == "diary_entry"
            ));
        }

        let zero_id = AnnotateRequest::new("text", 0);
        assert!(matches!(
            zero_id.validate(),
            Err(Error::MissingInput(field)) if field == "personal_id"
        ));

        let err = AnnotateRequest::default().validate().unwrap_err();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_request_deserializes_with_absent_fields() {
        let request: AnnotateRequest = serde_json::from_str(r#"{"personal_id": 3}"#).unwrap();
        assert_eq!(request.personal_id, Some(3));
        assert!(request.diary_entry.is_none());
    }
}
