//! AI reconciliation
//!
//! Sends the diary entry and its graph-derived annotations to a completion
//! service and decodes the structured reply. Models tend to wrap JSON in
//! Markdown fences with prose around it, so the reply is scanned for the
//! first fenced segment that is a complete object before decoding.
//!
//! A reply that cannot be decoded fails the run. A decoded reply without
//! `refined_text` falls back to the diary entry; one without `annotations`
//! falls back to an empty list, not to the NLP annotations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::annotation::AnnotationResult;
use crate::error::{Error, Result};
use crate::llm::{Message, TextCompletion};

const FENCE: &str = "```";

const SYSTEM_PROMPT: &str = "You are an AI specialized in diary analysis. \
Extract relevant entities and relationships from the diary entry and return a JSON object with two keys: \
'refined_text' (a refined version of the diary entry) and \
'annotations' (a list of annotation objects). \
Each annotation object should contain 'entity', 'relationship', and 'context' keys.";

/// Reconciled story returned by the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledOutput {
    /// Refined diary text, or the original entry when the model gave none
    pub refined_text: String,
    /// Annotations as the model returned them
    pub annotations: Vec<Value>,
    /// Full completion service response body
    pub raw_response: Value,
}

/// Fields decoded from the model's structured reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuredOutput {
    #[serde(default)]
    pub refined_text: Option<String>,
    #[serde(default)]
    pub annotations: Option<Vec<Value>>,
}

/// Select the JSON payload from a model reply.
///
/// Without fences the whole reply is returned. With fences, the first
/// trimmed segment that starts with `{` and ends with `}` wins; a segment
/// opening with a language tag line (```` ```json ````) is tried with that
/// line removed. If no segment qualifies the whole reply is returned.
pub fn extract_fenced_object(content: &str) -> &str {
    if !content.contains(FENCE) {
        return content;
    }

    content
        .split(FENCE)
        .filter_map(|segment| {
            let trimmed = segment.trim();
            if is_object_like(trimmed) {
                return Some(trimmed);
            }
            let (_tag, body) = segment.split_once('\n')?;
            let body = body.trim();
            is_object_like(body).then_some(body)
        })
        .next()
        .unwrap_or(content)
}

fn is_object_like(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}

/// Decode the structured object from a model reply
pub fn parse_structured_output(content: &str) -> Result<StructuredOutput> {
    let payload = extract_fenced_object(content);

    let value: Value = serde_json::from_str(payload).map_err(|e| {
        Error::MalformedModelOutput(format!("Failed to parse model output as JSON: {}", e))
    })?;
    if !value.is_object() {
        return Err(Error::MalformedModelOutput(
            "Model output is not a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        Error::MalformedModelOutput(format!("Unexpected model output shape: {}", e))
    })
}

/// Reconciles graph-derived annotations with a generative model
#[derive(Clone)]
pub struct Reconciler {
    completion: Arc<dyn TextCompletion>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Chat messages asking the model to reconcile `nlp_result`
    pub fn build_messages(diary_entry: &str, nlp_result: &AnnotationResult) -> Result<Vec<Message>> {
        let annotations = serde_json::to_string_pretty(nlp_result)
            .map_err(|e| Error::Internal(format!("Failed to serialize annotations: {}", e)))?;

        Ok(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Diary Entry:\n{}\n\nNLP Annotations:\n{}\n\nPlease produce the JSON output as described.",
                diary_entry, annotations
            )),
        ])
    }

    /// Ask the model to refine the diary entry and its annotations
    pub async fn reconcile(
        &self,
        diary_entry: &str,
        nlp_result: &AnnotationResult,
    ) -> Result<ReconciledOutput> {
        let messages = Self::build_messages(diary_entry, nlp_result)?;
        debug!(
            nlp_annotations = nlp_result.annotations.len(),
            "Requesting reconciliation"
        );

        let response = self.completion.complete(messages).await?;
        let structured = parse_structured_output(&response.content).inspect_err(|e| {
            warn!(error = %e, "Model reply could not be decoded");
        })?;

        let refined_text = structured
            .refined_text
            .unwrap_or_else(|| diary_entry.to_string());
        let annotations = structured.annotations.unwrap_or_default();

        info!(annotations = annotations.len(), "Reconciliation completed");
        Ok(ReconciledOutput {
            refined_text,
            annotations,
            raw_response: response.raw,
        })
    }
}
