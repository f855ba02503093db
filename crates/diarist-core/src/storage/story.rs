//! Story records and their SQLite repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A story ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    /// Diary entry as submitted
    pub diary_text: String,
    /// Refined text from reconciliation
    pub annotated_story: String,
    /// Profile document the annotations were resolved against
    pub personal_data: Value,
    /// Reconciled annotations
    pub annotations: Vec<Value>,
    /// Full completion service response
    pub ai_enhanced_annotations: Value,
}

/// A stored story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub diary_text: String,
    pub annotated_story: String,
    pub personal_data: Value,
    pub annotations: Vec<Value>,
    pub ai_enhanced_annotations: Value,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for story persistence
///
/// Stories are written once and never updated.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Store a story and return its id
    async fn insert(&self, story: &NewStory) -> Result<i64>;

    /// Get a story by id
    async fn get(&self, id: i64) -> Result<Option<Story>>;

    /// List all stories, oldest first
    async fn list(&self) -> Result<Vec<Story>>;

    /// Number of stored stories
    async fn count(&self) -> Result<u64>;

    /// Delete a story; `false` when it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLite implementation of the story repository
#[derive(Debug, Clone)]
pub struct SqliteStoryRepository {
    pool: SqlitePool,
}

impl SqliteStoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_json<T: Serialize>(field: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", field, e)))
}

fn from_json<T: serde::de::DeserializeOwned>(field: &str, text: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| Error::Internal(format!("Stored {} is not valid JSON: {}", field, e)))
}

#[async_trait]
impl StoryRepository for SqliteStoryRepository {
    async fn insert(&self, story: &NewStory) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO stories (
                diary_text, annotated_story, personal_data,
                annotations, ai_enhanced_annotations, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.diary_text)
        .bind(&story.annotated_story)
        .bind(to_json("personal_data", &story.personal_data)?)
        .bind(to_json("annotations", &story.annotations)?)
        .bind(to_json("ai_enhanced_annotations", &story.ai_enhanced_annotations)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(story_id = id, "Story saved");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Story>> {
        let row: Option<StoryRow> = sqlx::query_as("SELECT * FROM stories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(StoryRow::into_story).transpose()
    }

    async fn list(&self) -> Result<Vec<Story>> {
        let rows: Vec<StoryRow> = sqlx::query_as("SELECT * FROM stories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Stories listed");
        rows.into_iter().map(StoryRow::into_story).collect()
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(story_id = id, "Story deleted");
        }
        Ok(deleted)
    }
}

#[derive(FromRow)]
struct StoryRow {
    id: i64,
    diary_text: String,
    annotated_story: String,
    personal_data: String,
    annotations: String,
    ai_enhanced_annotations: String,
    created_at: String,
}

impl StoryRow {
    fn into_story(self) -> Result<Story> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Internal(format!("Invalid created_at for story {}: {}", self.id, e)))?;

        Ok(Story {
            id: self.id,
            diary_text: self.diary_text,
            annotated_story: self.annotated_story,
            personal_data: from_json("personal_data", &self.personal_data)?,
            annotations: from_json("annotations", &self.annotations)?,
            ai_enhanced_annotations: from_json(
                "ai_enhanced_annotations",
                &self.ai_enhanced_annotations,
            )?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use serde_json::json;

    async fn repository() -> SqliteStoryRepository {
        let db = Database::in_memory().await.unwrap();
        SqliteStoryRepository::new(db.pool().clone())
    }

    fn new_story(text: &str) -> NewStory {
        NewStory {
            diary_text: text.to_string(),
            annotated_story: format!("refined: {}", text),
            personal_data: json!({"full_name": "Sam", "social_interactions": {"family": {}}}),
            annotations: vec![json!({"entity": "Alex", "relationship": "son", "context": text})],
            ai_enhanced_annotations: json!({"choices": [{"message": {"content": "{}"}}]}),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repository().await;
        let before = Utc::now();

        let id = repo.insert(&new_story("Alex went out.\nSam")).await.unwrap();
        let story = repo.get(id).await.unwrap().unwrap();

        assert_eq!(story.id, id);
        assert_eq!(story.diary_text, "Alex went out.\nSam");
        assert_eq!(story.annotated_story, "refined: Alex went out.\nSam");
        assert_eq!(story.personal_data["full_name"], "Sam");
        assert_eq!(story.annotations[0]["relationship"], "son");
        assert_eq!(story.ai_enhanced_annotations["choices"][0]["message"]["content"], "{}");
        assert!(story.created_at >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = repository().await;
        assert!(repo.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let repo = repository().await;
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.list().await.unwrap().is_empty());

        let first = repo.insert(&new_story("one")).await.unwrap();
        let second = repo.insert(&new_story("two")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repository().await;
        let id = repo.insert(&new_story("gone soon")).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = repository().await;
        let first = repo.insert(&new_story("a")).await.unwrap();
        repo.delete(first).await.unwrap();
        let second = repo.insert(&new_story("b")).await.unwrap();
        assert!(second > first);
    }
}
