//! Diarist Core Integration Tests

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use diarist_core::{
    Error, Result,
    annotation::Annotator,
    llm::{LlmResponse, Message, TextCompletion},
    pipeline::{AnnotateRequest, DiaryPipeline},
    profile::{FamilyMember, PersonalProfile, ProfileSource},
    reconcile::Reconciler,
    storage::{Database, SqliteStoryRepository, StoryRepository},
};

struct FixedProfiles {
    profile: Option<PersonalProfile>,
}

#[async_trait]
impl ProfileSource for FixedProfiles {
    async fn fetch(&self, _personal_id: i64) -> Result<PersonalProfile> {
        self.profile.clone().ok_or(Error::UpstreamUnavailable {
            service: "profile service",
            status: Some(404),
            message: "Failed to fetch personal data".to_string(),
        })
    }
}

struct CannedModel {
    reply: Result<String>,
}

#[async_trait]
impl TextCompletion for CannedModel {
    async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse> {
        let content = match &self.reply {
            Ok(content) => content.clone(),
            Err(_) => {
                return Err(Error::UpstreamTimeout {
                    service: "completion service",
                    timeout_secs: 120,
                });
            }
        };
        let raw = json!({
            "id": "chatcmpl-test",
            "model": "amethyst-13b-mistral",
            "prompt_messages": messages.len(),
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        });
        Ok(LlmResponse::from_raw(raw).unwrap())
    }
}

fn sam_profile() -> PersonalProfile {
    PersonalProfile::from_value(json!({
        "full_name": "Sam",
        "social_interactions": {
            "family": {"son": {"name": "Alex", "age": 9}},
            "friends": {"close_friends": [{"name": "Jordan"}]}
        },
        "location": "Pune"
    }))
    .unwrap()
}

struct Harness {
    pipeline: DiaryPipeline,
    stories: Arc<SqliteStoryRepository>,
}

async fn harness(profile: Option<PersonalProfile>, reply: Result<String>) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let stories = Arc::new(SqliteStoryRepository::new(db.pool().clone()));
    let pipeline = DiaryPipeline::new(
        Arc::new(FixedProfiles { profile }),
        Annotator::default(),
        Reconciler::new(Arc::new(CannedModel { reply })),
        stories.clone(),
    );
    Harness { pipeline, stories }
}

#[tokio::test]
async fn test_full_pipeline_stores_story() {
    let reply = "Sure!\n```json\n{\"refined_text\": \"Alex, my son, went to the market.\", \
                 \"annotations\": [{\"entity\": \"Alex\", \"relationship\": \"son\", \"context\": \"market\"}]}\n```";
    let h = harness(Some(sam_profile()), Ok(reply.to_string())).await;

    let response = h
        .pipeline
        .annotate(&AnnotateRequest::new("Alex went to the market.\nSam", 1))
        .await
        .unwrap();

    assert_eq!(response.original_diary_text, "Alex went to the market.\nSam");
    assert_eq!(response.annotated_story, "Alex, my son, went to the market.");
    assert_eq!(response.annotations.len(), 1);
    assert_eq!(response.annotations[0]["entity"], "Alex");
    assert_eq!(response.ai_enhanced_annotations["id"], "chatcmpl-test");

    let story = h.stories.get(response.story_id).await.unwrap().unwrap();
    assert_eq!(story.diary_text, response.original_diary_text);
    assert_eq!(story.annotated_story, response.annotated_story);
    assert_eq!(story.annotations, response.annotations);
    assert_eq!(story.ai_enhanced_annotations, response.ai_enhanced_annotations);
    // The profile snapshot keeps fields the typed view ignores
    assert_eq!(story.personal_data["location"], "Pune");
    assert_eq!(story.personal_data["social_interactions"]["family"]["son"]["age"], 9);
}

#[tokio::test]
async fn test_missing_fields_fall_back() {
    let h = harness(Some(sam_profile()), Ok("{\"note\": \"nothing to add\"}".to_string())).await;

    let response = h
        .pipeline
        .annotate(&AnnotateRequest::new("Jordan called.\nSam", 1))
        .await
        .unwrap();

    assert_eq!(response.annotated_story, "Jordan called.\nSam");
    assert_eq!(response.annotations, Vec::<Value>::new());
    assert_eq!(h.stories.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_model_output_stores_nothing() {
    let h = harness(Some(sam_profile()), Ok("I am unable to comply.".to_string())).await;

    let err = h
        .pipeline
        .annotate(&AnnotateRequest::new("Alex went out.\nSam", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedModelOutput(_)));
    assert_eq!(h.stories.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_profile_failure_aborts_run() {
    let h = harness(None, Ok("{}".to_string())).await;

    let err = h
        .pipeline
        .annotate(&AnnotateRequest::new("Alex went out.\nSam", 99))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::UpstreamUnavailable {
            status: Some(404),
            ..
        }
    ));
    assert_eq!(h.stories.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_model_timeout_is_distinct() {
    let h = harness(
        Some(sam_profile()),
        Err(Error::Internal("unused".to_string())),
    )
    .await;

    let err = h
        .pipeline
        .annotate(&AnnotateRequest::new("Alex went out.\nSam", 1))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "E101");
    assert_eq!(h.stories.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_input_rejected_before_fetch() {
    // No profile available: a fetch would fail with E100, not E001
    let h = harness(None, Ok("{}".to_string())).await;

    let err = h
        .pipeline
        .annotate(&AnnotateRequest {
            diary_entry: Some("Alex went out.".to_string()),
            personal_id: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), "E001");
}

#[test]
fn test_annotation_end_to_end_with_rule_based_backend() {
    let profile = PersonalProfile::new("Sam")
        .with_family_member("son", FamilyMember::new("Alex"))
        .with_friend("Jordan");

    let result = Annotator::default().annotate("Alex met Jordan at the park.\nSam", &profile);
    let pairs: Vec<(&str, &str)> = result
        .annotations
        .iter()
        .map(|a| (a.entity.as_str(), a.relationship.as_str()))
        .collect();

    assert!(pairs.contains(&("Alex", "son")));
    assert!(pairs.contains(&("Jordan", "friend")));
}
