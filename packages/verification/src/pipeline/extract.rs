//! Claim extraction - find checkable claims and run the pattern rules.
//!
//! A single pass over the sentences of a document produces two lists:
//! the claim spans that will be sent for verification, and the candidates
//! reported directly by the pattern rules.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::rules::{has_vague_attribution, RuleSet};
use super::sentences::{split_sentences, Sentence};
use crate::types::claim::{ClaimKind, ClaimSpan, HallucinationCandidate};

/// Words ending in "est" that are not superlatives.
const NOT_SUPERLATIVE: &[&str] = &[
    "interest", "test", "rest", "request", "contest", "protest", "forest", "harvest",
    "manifest", "quest", "guest", "chest", "west", "nest", "vest", "digest", "suggest",
    "invest", "arrest", "conquest", "honest", "modest", "earnest", "inquest", "midwest",
];

lazy_static! {
    static ref STATISTIC: Regex = Regex::new(
        r"(?i)\d\s*(?:%|percent\b|per\s+cent\b)|\b\d[\d,]*(?:\.\d+)?\s*(?:x\b|×|times\b|-?fold\b)|\b(?:hundred|thousand|million|billion|trillion|twice|double|triple|half|majority)\b|\b\d+\s+(?:out\s+of|in)\s+\d+\b"
    ).unwrap();

    static ref ATTRIBUTION_CUE: Regex = Regex::new(
        r"(?i)\baccording\s+to\b|\b(?:said|says|reported|stated|announced|concluded)\b|\bet\s+al\.|\bpublished\s+in\b|\bexperts?\s+(?:say|agree|believe|warn)\b"
    ).unwrap();

    static ref SUPERLATIVE: Regex = Regex::new(
        r"(?i)\bthe\s+(?:best|worst|first|last|only|leading|greatest|largest|biggest|smallest|fastest|slowest|highest|lowest)\b|\b(?:most|least)\s+[a-z]{3,}|\b(?:unprecedented|unmatched|unparalleled|unrivaled|world's\s+\w+)\b"
    ).unwrap();

    static ref SUPERLATIVE_EST: Regex = Regex::new(r"(?i)\bthe\s+(?P<word>[a-z]{2,}est)\b").unwrap();

    static ref CAUSAL: Regex = Regex::new(
        r"(?i)\b(?:causes?|caused|causing|leads?\s+to|led\s+to|results?\s+in|resulted\s+in|due\s+to|because\s+of|contributes?\s+to|triggers?|prevents?|linked\s+to|responsible\s+for|(?:reduces?|increases?|lowers?|raises?)\s+the\s+risk)\b"
    ).unwrap();

    static ref YEAR_OR_NUMBER: Regex = Regex::new(r"\b\d+(?:[.,]\d+)*\b").unwrap();
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// One span per checkable sentence, in document order.
    pub claims: Vec<ClaimSpan>,

    /// Findings from the pattern rules, in document order per rule.
    pub pattern_candidates: Vec<HallucinationCandidate>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty() && self.pattern_candidates.is_empty()
    }
}

/// Classify a sentence by the first matching claim kind, if it asserts anything checkable.
///
/// Priority: Statistic, Attribution, Superlative, Causal, then Other for a
/// sentence whose only checkable content is a year or bare number.
pub fn classify_claim(text: &str) -> Option<ClaimKind> {
    if STATISTIC.is_match(text) {
        Some(ClaimKind::Statistic)
    } else if has_vague_attribution(text) || ATTRIBUTION_CUE.is_match(text) {
        Some(ClaimKind::Attribution)
    } else if is_superlative(text) {
        Some(ClaimKind::Superlative)
    } else if CAUSAL.is_match(text) {
        Some(ClaimKind::Causal)
    } else if YEAR_OR_NUMBER.is_match(text) {
        Some(ClaimKind::Other)
    } else {
        None
    }
}

fn is_superlative(text: &str) -> bool {
    if SUPERLATIVE.is_match(text) {
        return true;
    }
    SUPERLATIVE_EST.captures_iter(text).any(|caps| {
        let word = caps["word"].to_lowercase();
        !NOT_SUPERLATIVE.contains(&word.as_str())
    })
}

/// Extracts claims and pattern candidates from raw content.
pub struct ClaimExtractor {
    rules: RuleSet,
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl ClaimExtractor {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// The registered pattern rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run claim identification and the pattern rules over `content`.
    ///
    /// Never fails; empty content yields an empty extraction.
    pub fn extract(&self, content: &str) -> Extraction {
        let mut extraction = Extraction::default();

        for sentence in split_sentences(content) {
            if let Some(claim) = self.identify(&sentence) {
                extraction.claims.push(claim);
            }
            extraction
                .pattern_candidates
                .extend(self.rules.evaluate(&sentence));
        }

        tracing::debug!(
            claims = extraction.claims.len(),
            candidates = extraction.pattern_candidates.len(),
            "Extraction complete"
        );

        extraction
    }

    fn identify(&self, sentence: &Sentence) -> Option<ClaimSpan> {
        let kind = classify_claim(&sentence.text)?;
        Some(ClaimSpan::new(
            sentence.text.clone(),
            sentence.start,
            sentence.end,
            kind,
        ))
    }
}

/// Extract with the default rule set.
pub fn extract(content: &str) -> Extraction {
    ClaimExtractor::default().extract(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::HallucinationKind;

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            classify_claim("Studies show 73.4% of users prefer dark mode."),
            Some(ClaimKind::Statistic)
        );
        assert_eq!(
            classify_claim("According to the CDC, handwashing works."),
            Some(ClaimKind::Attribution)
        );
        assert_eq!(
            classify_claim("This is the fastest database available."),
            Some(ClaimKind::Superlative)
        );
        assert_eq!(
            classify_claim("Smoking causes lung cancer."),
            Some(ClaimKind::Causal)
        );
        assert_eq!(
            classify_claim("The company was founded in 1998."),
            Some(ClaimKind::Other)
        );
        assert_eq!(classify_claim("Hello there, friend."), None);
    }

    #[test]
    fn test_est_words_are_not_superlatives() {
        assert_eq!(classify_claim("We ran the test again."), None);
        assert_eq!(classify_claim("This is the cheapest option."), Some(ClaimKind::Superlative));
    }

    #[test]
    fn test_extract_claims_and_candidates() {
        let content = "Our product achieves exactly 99.7% accuracy with zero false positives. \
                       We love our customers.";
        let extraction = extract(content);

        assert_eq!(extraction.claims.len(), 1);
        assert_eq!(extraction.claims[0].kind, ClaimKind::Statistic);
        assert_eq!(
            &content[extraction.claims[0].start..extraction.claims[0].end],
            extraction.claims[0].text
        );

        let kinds: Vec<_> = extraction.pattern_candidates.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&HallucinationKind::FalsePrecision));
        assert!(kinds.contains(&HallucinationKind::ImpossibleMetric));

        for candidate in &extraction.pattern_candidates {
            assert!(candidate.start < candidate.end);
            assert!(candidate.end <= content.len());
            assert_eq!(&content[candidate.start..candidate.end], candidate.text);
        }
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract("").is_empty());
        assert!(extract("   \n\n").is_empty());
    }

    #[test]
    fn test_plain_prose_has_no_findings() {
        let extraction = extract("We went for a walk in the park. It was a lovely afternoon.");
        assert!(extraction.claims.is_empty());
        assert!(extraction.pattern_candidates.is_empty());
    }

    #[test]
    fn test_empty_rule_set_only_identifies_claims() {
        let extractor = ClaimExtractor::new(RuleSet::empty());
        let extraction = extractor.extract("Recent studies show 42.42% growth.");
        assert_eq!(extraction.claims.len(), 1);
        assert!(extraction.pattern_candidates.is_empty());
    }
}
