//! Rule-based NLP backend
//!
//! A dependency-free backend for both capabilities. It is deliberately
//! simple: capitalized word runs are names, runs after a locative
//! preposition are places, and roles come from word order around a closed
//! list of pronouns and prepositions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{DependencyParser, EntityRecognizer, ParsedToken, RecognizedEntities, SyntacticRole};

const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "it", "we", "they"];

const OBJECT_PRONOUNS: &[&str] = &["me", "him", "her", "us", "them"];

const POSSESSIVE_PRONOUNS: &[&str] = &["my", "his", "our", "their", "your", "its", "mine"];

const PREPOSITIONS: &[&str] = &[
    "to", "with", "for", "at", "in", "on", "from", "about", "of", "by", "near", "after",
    "before", "without", "beside",
];

/// Prepositions that introduce a place rather than a person
const LOCATIVE_PREPOSITIONS: &[&str] = &["in", "at", "from", "near"];

/// Capitalized words that are not names
const NON_NAME_WORDS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "his",
    "our", "their", "your", "its", "the", "a", "an", "this", "that", "these", "those", "and",
    "but", "or", "so", "then", "when", "while", "after", "before", "later", "finally", "there",
    "here", "what", "why", "how", "dear", "diary", "today", "yesterday", "tomorrow", "tonight",
    "morning", "evening", "afternoon", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday", "january", "february", "march", "april", "june", "july", "august",
    "september", "october", "november", "december", "love", "thanks", "regards", "yours",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Number,
    Punct,
}

#[derive(Debug, Clone)]
struct Token<'a> {
    text: &'a str,
    kind: TokenKind,
    /// A sentence or line boundary precedes this token
    starts_segment: bool,
}

/// Words, digit runs, and single punctuation marks
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}[\p{L}'’-]*|\p{N}+|[^\s\p{L}\p{N}]").unwrap());

/// Rule-based recognizer and parser
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedBackend;

impl RuleBasedBackend {
    pub fn new() -> Self {
        Self
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        let mut tokens: Vec<Token<'a>> = Vec::new();
        let mut last_end = 0;
        let mut boundary = true;

        for m in TOKEN_RE.find_iter(text) {
            let gap = &text[last_end..m.start()];
            if gap.contains('\n') {
                boundary = true;
            }

            let token_text = m.as_str();
            let first = token_text.chars().next().unwrap_or(' ');
            let kind = if first.is_alphabetic() {
                TokenKind::Word
            } else if first.is_numeric() {
                TokenKind::Number
            } else {
                TokenKind::Punct
            };

            tokens.push(Token {
                text: token_text,
                kind,
                starts_segment: boundary,
            });

            boundary = kind == TokenKind::Punct && matches!(token_text, "." | "!" | "?");
            last_end = m.end();
        }

        tokens
    }
}

fn is_name_word(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Word
        && token.text.chars().next().is_some_and(char::is_uppercase)
        && !NON_NAME_WORDS.contains(&token.text.to_lowercase().as_str())
}

fn lower_in(token: &Token<'_>, list: &[&str]) -> bool {
    list.contains(&token.text.to_lowercase().as_str())
}

/// The word directly before `tokens[i]` in the same sentence
fn previous_word<'t, 'a>(tokens: &'t [Token<'a>], i: usize) -> Option<&'t Token<'a>> {
    if tokens[i].starts_segment {
        return None;
    }
    tokens[..i].last().filter(|t| t.kind == TokenKind::Word)
}

/// The word directly after `tokens[i]` in the same sentence
fn next_word<'t, 'a>(tokens: &'t [Token<'a>], i: usize) -> Option<&'t Token<'a>> {
    tokens
        .get(i + 1)
        .filter(|t| t.kind == TokenKind::Word && !t.starts_segment)
}

fn push_distinct(target: &mut Vec<String>, seen: &mut HashSet<String>, value: String) {
    if seen.insert(value.clone()) {
        target.push(value);
    }
}

impl EntityRecognizer for RuleBasedBackend {
    fn recognize(&self, text: &str) -> RecognizedEntities {
        let tokens = self.tokenize(text);
        let mut entities = RecognizedEntities::default();
        let mut seen_persons = HashSet::new();
        let mut seen_locations = HashSet::new();

        let mut i = 0;
        while i < tokens.len() {
            if !is_name_word(&tokens[i]) {
                i += 1;
                continue;
            }

            let start = i;
            let mut words = vec![tokens[i].text];
            i += 1;
            while i < tokens.len() && !tokens[i].starts_segment && is_name_word(&tokens[i]) {
                words.push(tokens[i].text);
                i += 1;
            }
            let mention = words.join(" ");

            let after_locative = start > 0
                && !tokens[start].starts_segment
                && lower_in(&tokens[start - 1], LOCATIVE_PREPOSITIONS);

            if after_locative {
                push_distinct(&mut entities.locations, &mut seen_locations, mention);
            } else {
                push_distinct(&mut entities.persons, &mut seen_persons, mention);
            }
        }

        entities
    }
}

impl DependencyParser for RuleBasedBackend {
    fn parse(&self, text: &str) -> Vec<ParsedToken> {
        let tokens = self.tokenize(text);

        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let mut parsed = ParsedToken::new(token.text, token.text);
                if token.kind != TokenKind::Word {
                    return parsed;
                }

                let prev = previous_word(&tokens, i);
                let after_preposition = prev.is_some_and(|p| lower_in(p, PREPOSITIONS));

                if lower_in(token, POSSESSIVE_PRONOUNS) {
                    parsed.is_pronoun = true;
                    if let Some(next) = next_word(&tokens, i) {
                        parsed.head = next.text.to_string();
                    }
                    return parsed;
                }

                let is_subject_pronoun = lower_in(token, SUBJECT_PRONOUNS);
                let is_object_pronoun = lower_in(token, OBJECT_PRONOUNS);
                parsed.is_pronoun = is_subject_pronoun || is_object_pronoun;

                if after_preposition && (parsed.is_pronoun || is_name_word(token)) {
                    parsed.role = Some(SyntacticRole::PrepositionalObject);
                    parsed.head = prev.map(|p| p.text.to_string()).unwrap_or_default();
                } else if is_object_pronoun {
                    parsed.role = Some(SyntacticRole::DirectObject);
                    if let Some(p) = prev {
                        parsed.head = p.text.to_string();
                    }
                } else if is_subject_pronoun || (is_name_word(token) && prev.is_none()) {
                    if let Some(next) = next_word(&tokens, i) {
                        parsed.role = Some(SyntacticRole::Subject);
                        parsed.head = next.text.to_string();
                    }
                } else if let Some(p) = prev {
                    parsed.head = p.text.to_string();
                }

                parsed
            })
            .collect()
    }
}
