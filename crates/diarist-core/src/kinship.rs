//! Kinship vocabulary
//!
//! Maps vernacular kinship terms ("pitaji", "amma", "dost", ...) onto a
//! small set of canonical English labels. Synonym sets are disjoint, so the
//! lookup is unambiguous.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Canonical label and its vernacular synonyms, in lookup order
pub const KINSHIP_TABLE: &[(&str, &[&str])] = &[
    ("dad", &["pitaji", "baba", "abba", "appa", "achan"]),
    ("mom", &["maa", "amma", "mataji", "aai"]),
    ("brother", &["bhai", "anna", "annan", "ettan"]),
    ("sister", &["didi", "akka", "chechi", "behan"]),
    ("uncle", &["chacha", "mama", "kaka", "chittappa"]),
    ("aunt", &["chachi", "maasi", "kaki", "chithi"]),
    ("cousin", &["bhaiya"]),
    ("teacher", &["guruji", "masterji", "acharya"]),
    ("friend", &["dost", "mitra", "sakha", "yaar"]),
    ("grandfather", &["dadaji", "thatha", "ajja", "nana"]),
    ("grandmother", &["dadiji", "paati", "ajji", "nani"]),
    ("son", &["beta", "magan", "putra"]),
    ("daughter", &["beti", "magal", "putri"]),
    ("husband", &["pati", "kanavan", "bharya"]),
    ("wife", &["patni", "manaivi"]),
];

/// Map a term to its canonical kinship label.
///
/// The term is lower-cased first. Terms that are not a known synonym are
/// returned lower-cased but otherwise untouched.
pub fn canonicalize(term: &str) -> String {
    let term = term.to_lowercase();
    KINSHIP_TABLE
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&term.as_str()))
        .map(|(canonical, _)| (*canonical).to_string())
        .unwrap_or(term)
}

static KINSHIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = KINSHIP_TABLE
        .iter()
        .map(|(_, synonyms)| format!(r"my\s+(?:{})", synonyms.join("|")))
        .collect();
    let pattern = format!(r"\b({})\b", alternatives.join("|"));

    RegexBuilder::new(&pattern).case_insensitive(true).build().unwrap()
});

/// Case-insensitive pattern matching `my <synonym>` for every synonym in
/// the table.
///
/// Not consulted by the annotation pipeline; kept for text scanning.
pub fn kinship_pattern() -> &'static Regex {
    &KINSHIP_RE
}

/// Canonical labels of every `my <synonym>` phrase in `text`, in order.
pub fn find_kinship_mentions(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .filter_map(|m| m.as_str().split_whitespace().last().map(canonicalize))
        .collect()
}
