//! Storage layer - SQLite story store
//!
//! # Architecture
//!
//! - `database`: Connection pool management and schema initialization
//! - `story`: `Story` records and the `StoryRepository` trait with its
//!   SQLite implementation
//!
//! # Usage
//!
//! ```ignore
//! use diarist_core::storage::{Database, SqliteStoryRepository, StoryRepository};
//!
//! let db = Database::in_memory().await?;
//! let stories = SqliteStoryRepository::new(db.pool().clone());
//! let total = stories.count().await?;
//! ```

pub mod database;
pub mod story;

pub use database::{Database, DatabaseConfig};
pub use story::{NewStory, SqliteStoryRepository, Story, StoryRepository};
