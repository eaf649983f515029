//! Lexical stance classification.
//!
//! Decides whether a snippet supports, contradicts or says nothing about a
//! claim. Purely lexical and deterministic: the same claim and snippet always
//! produce the same stance.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::types::evidence::Stance;

/// Fraction of claim terms the snippet must share to be on topic.
const MIN_TOPIC_OVERLAP: f64 = 0.2;

/// Fraction of claim terms the snippet must share to support on wording alone.
const SUPPORT_OVERLAP: f64 = 0.4;

/// Relative difference under which two numbers are treated as equal.
const NUMERIC_TOLERANCE: f64 = 0.01;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "that", "this", "with", "from", "have", "has",
    "had", "but", "not", "its", "our", "their", "they", "them", "than", "then", "there",
    "which", "who", "what", "when", "will", "would", "can", "could", "been", "being", "into",
    "about", "over", "more", "most", "also", "such", "all", "any", "some", "very", "per",
    "cent", "percent", "of", "in", "on", "to", "is", "it", "a", "an", "as", "at", "by", "or",
];

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();

    static ref NUMBER: Regex = Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap();

    static ref REFUTATION: Regex = Regex::new(
        r"(?i)\b(?:no\s+evidence|false|myth|debunked|incorrect|refuted|disputed|contrary\s+to|not\s+true|misleading|unfounded|disproven|inaccurate|hoax|misconception)\b"
    ).unwrap();

    static ref NEGATION: Regex = Regex::new(
        r"(?i)\b(?:not|no|never|neither|nor|without|cannot)\b|n't\b"
    ).unwrap();
}

fn content_terms(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 2 && !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn numbers(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse().ok())
        .collect()
}

fn numbers_match(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return true;
    }
    (a - b).abs() / scale <= NUMERIC_TOLERANCE
}

/// Share of the claim's content terms that also appear in the snippet.
pub fn term_overlap(claim: &str, snippet: &str) -> f64 {
    let claim_terms = content_terms(claim);
    if claim_terms.is_empty() {
        return 0.0;
    }
    let snippet_terms = content_terms(snippet);
    let shared = claim_terms.intersection(&snippet_terms).count();
    shared as f64 / claim_terms.len() as f64
}

/// Refutation cues by normalized phrase.
fn refutation_cues(text: &str) -> HashMap<String, usize> {
    let mut cues = HashMap::new();
    for m in REFUTATION.find_iter(text) {
        let phrase = m
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        *cues.entry(phrase).or_insert(0) += 1;
    }
    cues
}

/// Whether the snippet carries a refutation cue beyond those already in the claim.
///
/// A claim about "false positives" still lets a snippet calling it "false"
/// count as a refutation.
fn adds_refutation(claim: &str, snippet: &str) -> bool {
    let claimed = refutation_cues(claim);
    refutation_cues(snippet)
        .iter()
        .any(|(cue, count)| *count > claimed.get(cue).copied().unwrap_or(0))
}

#[derive(Debug, PartialEq, Eq)]
enum NumericRelation {
    Agree,
    Conflict,
    Unknown,
}

fn numeric_relation(claim: &str, snippet: &str) -> NumericRelation {
    let claimed = numbers(claim);
    let reported = numbers(snippet);
    if claimed.is_empty() || reported.is_empty() {
        return NumericRelation::Unknown;
    }

    let all_found = claimed
        .iter()
        .all(|c| reported.iter().any(|r| numbers_match(*c, *r)));
    if all_found {
        NumericRelation::Agree
    } else {
        NumericRelation::Conflict
    }
}

/// Classify a snippet's stance towards a claim.
///
/// Off-topic snippets are neutral. On-topic snippets contradict when they
/// carry a refutation cue, report different numbers, or flip the claim's
/// negation; they support when they share enough wording or confirm the
/// claim's numbers.
pub fn classify_stance(claim: &str, snippet: &str) -> Stance {
    let overlap = term_overlap(claim, snippet);
    let numeric = numeric_relation(claim, snippet);

    if overlap < MIN_TOPIC_OVERLAP && numeric != NumericRelation::Agree {
        return Stance::Neutral;
    }

    if adds_refutation(claim, snippet) {
        return Stance::Contradicts;
    }

    if numeric == NumericRelation::Conflict {
        return Stance::Contradicts;
    }

    if NEGATION.is_match(claim) != NEGATION.is_match(snippet) {
        return Stance::Contradicts;
    }

    if overlap >= SUPPORT_OVERLAP || numeric == NumericRelation::Agree {
        Stance::Supports
    } else {
        Stance::Neutral
    }
}
