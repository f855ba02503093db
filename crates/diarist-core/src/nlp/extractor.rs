//! Entity extraction and pronoun resolution over pluggable backends

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DependencyParser, EntityRecognizer, ParsedToken, RuleBasedBackend};

/// Entities extracted from a diary entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub persons: Vec<String>,
    pub locations: Vec<String>,
}

/// Entity and coreference extractor
///
/// Holds read-only handles to the backends; cloning is cheap and clones
/// share the same backends.
#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
    parser: Arc<dyn DependencyParser>,
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor").finish_non_exhaustive()
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl EntityExtractor {
    /// Create an extractor from two backends
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, parser: Arc<dyn DependencyParser>) -> Self {
        Self { recognizer, parser }
    }

    /// Extractor using the built-in rule-based backend for both capabilities
    pub fn rule_based() -> Self {
        let backend = Arc::new(RuleBasedBackend::new());
        Self::new(backend.clone(), backend)
    }

    /// Person names and locations mentioned in `text`
    ///
    /// Order and duplicates are whatever the recognizer returns.
    pub fn extract_entities(&self, text: &str) -> ExtractedEntities {
        let recognized = self.recognizer.recognize(text);
        debug!(
            persons = ?recognized.persons,
            locations = ?recognized.locations,
            "Entities extracted"
        );
        ExtractedEntities {
            persons: recognized.persons,
            locations: recognized.locations,
        }
    }

    /// Replace pronouns with the head text of their role.
    ///
    /// One pass in token order. Each resolvable pronoun replaces every
    /// occurrence of its exact spelling in the whole text, including
    /// occurrences inside other words. Pronouns introduced by an earlier
    /// replacement are not revisited.
    pub fn resolve_coreferences(&self, text: &str) -> String {
        let tokens = self.parser.parse(text);
        let mentions = mentions(&tokens);

        let mut resolved = text.to_string();
        for token in tokens.iter().filter(|t| t.is_pronoun && !t.text.is_empty()) {
            if let Some(replacement) = mentions.get(&token.text.to_lowercase()) {
                resolved = resolved.replace(&token.text, replacement);
                debug!(pronoun = %token.text, replacement = %replacement, "Replaced pronoun");
            }
        }

        resolved
    }
}

/// Lower-cased subject/object tokens mapped to their head's surface text.
/// The last occurrence of a token wins.
fn mentions(tokens: &[ParsedToken]) -> HashMap<String, String> {
    tokens
        .iter()
        .filter(|token| token.role.is_some())
        .map(|token| (token.text.to_lowercase(), token.head.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{RecognizedEntities, SyntacticRole};

    /// Backend returning canned output regardless of input
    struct FixedBackend {
        entities: RecognizedEntities,
        tokens: Vec<ParsedToken>,
    }

    impl EntityRecognizer for FixedBackend {
        fn recognize(&self, _text: &str) -> RecognizedEntities {
            self.entities.clone()
        }
    }

    impl DependencyParser for FixedBackend {
        fn parse(&self, _text: &str) -> Vec<ParsedToken> {
            self.tokens.clone()
        }
    }

    fn extractor(entities: RecognizedEntities, tokens: Vec<ParsedToken>) -> EntityExtractor {
        let backend = Arc::new(FixedBackend { entities, tokens });
        EntityExtractor::new(backend.clone(), backend)
    }

    fn he_went_tokens() -> Vec<ParsedToken> {
        vec![
            ParsedToken::new("He", "went")
                .pronoun()
                .with_role(SyntacticRole::Subject),
            ParsedToken::new("went", "went"),
            ParsedToken::new("to", "went"),
            ParsedToken::new("Alex", "to").with_role(SyntacticRole::PrepositionalObject),
        ]
    }

    #[test]
    fn test_extract_entities_keeps_backend_order_and_duplicates() {
        let entities = RecognizedEntities {
            persons: vec!["Priya".into(), "Alex".into(), "Priya".into()],
            locations: vec!["Chennai".into()],
        };
        let extracted = extractor(entities, vec![]).extract_entities("ignored");
        assert_eq!(extracted.persons, vec!["Priya", "Alex", "Priya"]);
        assert_eq!(extracted.locations, vec!["Chennai"]);
    }

    #[test]
    fn test_mentions_lowercases_keys() {
        let map = mentions(&he_went_tokens());
        assert_eq!(map.get("he").map(String::as_str), Some("went"));
        assert_eq!(map.get("alex").map(String::as_str), Some("to"));
        assert!(!map.contains_key("went"));
    }

    #[test]
    fn test_resolve_coreferences_replaces_all_occurrences() {
        let extractor = extractor(RecognizedEntities::default(), he_went_tokens());
        let resolved = extractor.resolve_coreferences("He went to Alex. He smiled.");
        assert_eq!(resolved, "went went to Alex. went smiled.");
    }

    #[test]
    fn test_resolve_coreferences_over_matches_inside_words() {
        let tokens = vec![
            ParsedToken::new("he", "saw")
                .pronoun()
                .with_role(SyntacticRole::Subject),
        ];
        let extractor = extractor(RecognizedEntities::default(), tokens);
        assert_eq!(extractor.resolve_coreferences("he met the chef"), "saw met tsaw csawf");
    }

    #[test]
    fn test_resolve_coreferences_ignores_pronouns_without_role() {
        let tokens = vec![ParsedToken::new("it", "rained").pronoun()];
        let extractor = extractor(RecognizedEntities::default(), tokens);
        assert_eq!(extractor.resolve_coreferences("it rained"), "it rained");
    }

    #[test]
    fn test_resolve_coreferences_single_pass_is_stable() {
        let extractor = extractor(RecognizedEntities::default(), he_went_tokens());
        let once = extractor.resolve_coreferences("He went to Alex.");
        let twice = extractor.resolve_coreferences(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rule_based_default() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract_entities("Yesterday Alex and I walked in Mumbai.");
        assert_eq!(entities.persons, vec!["Alex"]);
        assert_eq!(entities.locations, vec!["Mumbai"]);
    }
}
