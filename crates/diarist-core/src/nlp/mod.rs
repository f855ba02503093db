//! Entity recognition and coreference
//!
//! The pipeline needs two capabilities from an NLP backend:
//!
//! - [`EntityRecognizer`]: which substrings are person names and locations
//! - [`DependencyParser`]: per-token pronoun tagging and the syntactic head
//!   of subject / object tokens
//!
//! [`EntityExtractor`] consumes both through `Arc<dyn ...>` handles, so a
//! backend can be swapped without touching the annotation pipeline.
//! [`RuleBasedBackend`] is the built-in backend and needs no model files.

mod extractor;
mod rule_based;

pub use extractor::{EntityExtractor, ExtractedEntities};
pub use rule_based::RuleBasedBackend;

/// Person and location mentions found in a text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedEntities {
    /// Surface forms tagged as person names, in backend order
    pub persons: Vec<String>,
    /// Surface forms tagged as locations, in backend order
    pub locations: Vec<String>,
}

/// Grammatical role of a token relative to its head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntacticRole {
    /// Nominal subject
    Subject,
    /// Direct object
    DirectObject,
    /// Object of a preposition
    PrepositionalObject,
}

/// One token of a parsed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    /// Surface text, exactly as it appears in the input
    pub text: String,
    /// Whether the token is a pronoun
    pub is_pronoun: bool,
    /// Role of the token, when it is a subject or object
    pub role: Option<SyntacticRole>,
    /// Surface text of the token's syntactic head
    pub head: String,
}

impl ParsedToken {
    pub fn new(text: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_pronoun: false,
            role: None,
            head: head.into(),
        }
    }

    pub fn pronoun(mut self) -> Self {
        self.is_pronoun = true;
        self
    }

    pub fn with_role(mut self, role: SyntacticRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Person/location recognition capability
pub trait EntityRecognizer: Send + Sync {
    /// Recognize person names and locations in `text`
    fn recognize(&self, text: &str) -> RecognizedEntities;
}

/// Dependency-style parsing capability
pub trait DependencyParser: Send + Sync {
    /// Tokenize `text` in document order with pronoun tags, roles and heads
    fn parse(&self, text: &str) -> Vec<ParsedToken>;
}
