//! Diarist Core Library
//!
//! This crate provides the core functionality for Diarist, including:
//! - Kinship term canonicalization
//! - Relationship graphs built from personal profiles, and a resolver
//! - Entity recognition and coreference over swappable NLP backends
//! - Diary annotation with writer-relative overrides
//! - AI reconciliation through an OpenAI-compatible completion service
//! - Storage (SQLite story store)
//! - The end-to-end diary pipeline

pub mod annotation;
pub mod config;
pub mod error;
pub mod kinship;
pub mod llm;
pub mod nlp;
pub mod pipeline;
pub mod profile;
pub mod reconcile;
pub mod relationship;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::annotation::{AnnotationRecord, AnnotationResult, Annotator};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{AnnotateRequest, AnnotateResponse, DiaryPipeline};
    pub use crate::profile::{PersonalProfile, ProfileSource};
}
