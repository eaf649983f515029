//! Direct hallucination pattern rules.
//!
//! Each rule inspects one sentence and reports zero or more candidates
//! without consulting any knowledge source. Rules are registered strategy
//! objects, so applications can add their own with [`RuleSet::with_rule`].
//!
//! ```rust,ignore
//! struct BannedPhrase;
//!
//! impl PatternRule for BannedPhrase {
//!     fn name(&self) -> &'static str { "banned_phrase" }
//!     fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> { ... }
//! }
//!
//! let rules = RuleSet::default().with_rule(BannedPhrase);
//! ```

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::sentences::Sentence;
use crate::types::claim::{HallucinationCandidate, HallucinationKind};

const UNVERIFIABLE_CONFIDENCE: f64 = 0.7;
const IMPOSSIBLE_METRIC_CONFIDENCE: f64 = 0.85;
const TECHNICAL_IMPOSSIBILITY_CONFIDENCE: f64 = 0.8;
const MAX_PRECISION_CONFIDENCE: f64 = 0.95;

/// Ratio claims at or above this multiple are treated as implausible.
const IMPLAUSIBLE_RATIO: f64 = 1000.0;

/// Capitalised words that open a phrase without naming anyone.
const GENERIC_NAMES: &[&str] = &[
    "The", "A", "An", "Our", "Their", "This", "These", "Recent", "New", "Many", "Some",
    "Several", "Studies", "Research", "Experts", "Scientists", "Researchers", "Sources",
    "Reports", "Industry", "Internal", "Independent", "Leading", "Top", "Most",
];

/// Acronyms that look like organisations but name nothing.
const GENERIC_ACRONYMS: &[&str] = &[
    "AI", "ML", "IT", "API", "CEO", "CTO", "CFO", "OK", "TV", "PC", "FAQ", "ROI", "KPI", "SaaS",
];

/// Comparison targets that cannot be beaten.
const HARD_LIMITS: &[&str] = &[
    "light",
    "the speed of light",
    "speed of light",
    "instant",
    "instantaneous",
    "quantum computer",
    "quantum computers",
];

lazy_static! {
    // Decimal statistic with a percentage or ratio unit, e.g. "exactly 99.7%"
    static ref PRECISE_STATISTIC: Regex = Regex::new(
        r"(?i)(?P<qual>\b(?:exactly|precisely)\s+)?(?P<value>\b\d+(?:,\d{3})*\.(?P<dec>\d+))\s*(?P<unit>%|percent\b|per\s+cent\b|x\b|×|times\b|-?fold\b)"
    ).unwrap();

    // Vague attribution: "recent studies show", "research indicates"
    static ref ATTRIBUTION: Regex = Regex::new(
        r"(?i)\b(?:(?:recent|new|many|several|numerous|multiple|some|latest|independent)\s+)?(?:studies|study|research|surveys?|reports?|experts?|scientists|researchers|analysts|statistics|evidence)\s+(?:have\s+|has\s+)?(?:shows?|shown|indicates?|suggests?|proves?|proven|finds|found|reveals?|confirms?|demonstrates?|agree|says?|claims?)\b|\bit\s+is\s+(?:widely\s+|well\s+|commonly\s+)?(?:known|believed|accepted|reported|established)\b|\baccording\s+to\s+(?:many\s+|some\s+|leading\s+)?(?:experts|research|studies|sources|reports|scientists)\b"
    ).unwrap();

    // Bracketed references, et al., URLs, DOIs, "(Smith, 2020)"
    static ref CITATION_MARKER: Regex = Regex::new(
        r"(?i)\[\d+(?:\s*[,\-–]\s*\d+)*\]|\bet\s+al\.|https?://\S+|\bdoi:\s*\S+|\bsource:\s*\S+|\((?:[^()]*?,\s*)?(?:19|20)\d{2}[a-z]?\)"
    ).unwrap();

    // "according to the World Health Organization", "researchers at Stanford"
    static ref NAMED_SOURCE: Regex = Regex::new(
        r"\b(?:[Aa]ccording\s+to|by|from|at|[Pp]ublished\s+in|[Rr]eported\s+by|[Cc]ited\s+by)\s+(?:the\s+)?(?P<name>[A-Z][\w&.\-]*(?:\s+(?:of\s+|for\s+)?[A-Z][\w&.\-]*)*)"
    ).unwrap();

    static ref ACRONYM: Regex = Regex::new(r"\b[A-Z]{2,6}s?\b").unwrap();

    // "100% satisfaction", "one hundred percent accurate"
    static ref PERFECT_RATE: Regex = Regex::new(
        r"(?i)(?P<pct>\b\d{3,}(?:\.\d+)?|\bone\s+hundred)\s*(?:%|percent\b)\s*(?:of\s+)?(?:(?:customer|user|client|patient|test)\s+)?(?P<metric>satisf\w*|accura\w*|success\w*|effective\w*|reliab\w*|uptime|availab\w*|guarantee\w*|precision|detection|cure\w*|safe\w*|retention|conversion|compliance|correct\w*)"
    ).unwrap();

    // "accuracy of 100%", "success rate of 100 percent"
    static ref RATE_OF_PERFECT: Regex = Regex::new(
        r"(?i)\b(?P<metric>satisfaction|accuracy|success|effectiveness|reliability|uptime|availability|precision|detection|cure|retention)\s+(?:rate\s+)?(?:of\s+)?(?P<pct>\d{3,}(?:\.\d+)?)\s*(?:%|percent\b)"
    ).unwrap();

    // "zero false positives", "0 complaints"
    static ref ZERO_DEFECTS: Regex = Regex::new(
        r"(?i)\b(?:zero|0)\s+(?:(?:reported|known|customer|user|security|critical)\s+)?(?:errors?|mistakes?|complaints?|false[\s\-]+positives?|false[\s\-]+negatives?|defects?|bugs?|failures?|downtime|side[\s\-]+effects?|crashes|outages?|incidents?|vulnerabilities|churn)\b"
    ).unwrap();

    // "no side effects whatsoever", "no complaints"
    static ref NO_DEFECTS: Regex = Regex::new(
        r"(?i)\bno\s+(?:(?:reported|known)\s+)?(?:complaints|false[\s\-]+positives|false[\s\-]+negatives|side[\s\-]+effects|errors|defects|bugs)(?:\s+(?:whatsoever|at\s+all|ever))?\b"
    ).unwrap();

    static ref FASTER_THAN_LIGHT: Regex = Regex::new(
        r"(?i)\bfaster\s+than\s+(?:the\s+)?(?:speed\s+of\s+)?light\b"
    ).unwrap();

    // "1000x faster", "10 times faster than quantum computers"
    static ref RATIO_CLAIM: Regex = Regex::new(
        r"(?i)(?P<n>\b\d[\d,]*(?:\.\d+)?)\s*(?:x\b|×|times\b)\s*(?P<cmp>faster|quicker|more\s+efficient|more\s+powerful|cheaper|smaller|better|more\s+accurate)(?:\s+than\s+(?:an?\s+|the\s+)?(?P<target>[a-z][a-z\s]{0,30}[a-z]))?"
    ).unwrap();

    static ref UNBOUNDED_CAPACITY: Regex = Regex::new(
        r"(?i)\b(?:infinite|infinitely)\s+(?:fast|scalable|speed|bandwidth|storage|scalability|energy|throughput|compression|battery\s+life|capacity)\b|\bunlimited\s+(?:energy|speed|bandwidth|compression)\b|\bperpetual\s+motion\b"
    ).unwrap();

    static ref ZERO_LATENCY: Regex = Regex::new(
        r"(?i)\b(?:zero|0\s*ms)\s+latency\b|\binstantaneous\s+(?:processing|computation|transfer|training)\b"
    ).unwrap();

    // "150% energy efficiency"
    static ref OVER_UNITY: Regex = Regex::new(
        r"(?i)(?P<pct>\b\d{3,}(?:\.\d+)?)\s*(?:%|percent\b)\s+(?:energy\s+|power\s+|fuel\s+|conversion\s+)?efficien\w*"
    ).unwrap();
}

/// A hallucination signature evaluated one sentence at a time.
#[cfg_attr(test, mockall::automock)]
pub trait PatternRule: Send + Sync {
    /// Stable rule name, used in logs.
    fn name(&self) -> &'static str;

    /// Report every finding in the sentence, with content offsets.
    fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate>;
}

/// Registered pattern rules, run in registration order.
pub struct RuleSet {
    rules: Vec<Box<dyn PatternRule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
            .with_rule(FalsePrecisionRule)
            .with_rule(UnverifiableClaimRule)
            .with_rule(ImpossibleMetricRule)
            .with_rule(TechnicalImpossibilityRule)
    }
}

impl RuleSet {
    /// A rule set with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register an additional rule.
    pub fn with_rule(mut self, rule: impl PatternRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Run every rule against a sentence.
    pub fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> {
        self.rules
            .iter()
            .flat_map(|rule| {
                let found = rule.evaluate(sentence);
                if !found.is_empty() {
                    tracing::trace!(rule = rule.name(), count = found.len(), "Pattern rule matched");
                }
                found
            })
            .collect()
    }

    /// Names of the registered rules.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Whether a sentence contains a citation or names who said it.
pub fn has_named_source(text: &str) -> bool {
    if CITATION_MARKER.is_match(text) {
        return true;
    }

    let named = NAMED_SOURCE.captures_iter(text).any(|caps| {
        let first = caps["name"].split_whitespace().next().unwrap_or("");
        !GENERIC_NAMES.contains(&first)
    });
    if named {
        return true;
    }

    ACRONYM
        .find_iter(text)
        .any(|m| !GENERIC_ACRONYMS.contains(&m.as_str().trim_end_matches('s')))
}

/// Whether a sentence attributes its claim to an unnamed authority.
pub fn has_vague_attribution(text: &str) -> bool {
    ATTRIBUTION.is_match(text)
}

/// Parse a number that may contain thousands separators.
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

fn candidate_from_match(
    sentence: &Sentence,
    kind: HallucinationKind,
    local_start: usize,
    local_end: usize,
    confidence: f64,
    explanation: String,
) -> HallucinationCandidate {
    let (start, end) = sentence.absolute(local_start, local_end);
    HallucinationCandidate::new(
        kind,
        &sentence.text[local_start..local_end],
        start,
        end,
        confidence,
        explanation,
    )
}

/// Statistics stated with suspicious decimal precision and no citation.
pub struct FalsePrecisionRule;

impl FalsePrecisionRule {
    fn confidence(caps: &Captures<'_>) -> f64 {
        let decimals = caps["dec"].len();
        let mut confidence = 0.6 + 0.1 * (decimals.saturating_sub(1)) as f64;

        if caps.name("qual").is_some() {
            confidence += 0.15;
        }

        let unit = caps["unit"].to_lowercase();
        let is_percentage = unit == "%" || unit.starts_with("per");
        let near_perfect = parse_number(&caps["value"]).is_some_and(|v| v >= 99.0);
        if is_percentage && near_perfect {
            confidence += 0.1;
        }

        confidence.min(MAX_PRECISION_CONFIDENCE)
    }
}

impl PatternRule for FalsePrecisionRule {
    fn name(&self) -> &'static str {
        "false_precision"
    }

    fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> {
        if has_named_source(&sentence.text) {
            return Vec::new();
        }

        PRECISE_STATISTIC
            .captures_iter(&sentence.text)
            .filter_map(|caps| {
                let value = caps.name("value")?;
                let whole = caps.get(0)?;
                let decimals = caps["dec"].len();
                Some(candidate_from_match(
                    sentence,
                    HallucinationKind::FalsePrecision,
                    value.start(),
                    whole.end(),
                    Self::confidence(&caps),
                    format!(
                        "Statistic '{}' is stated with {} decimal place{} of precision and no citation",
                        &sentence.text[value.start()..whole.end()],
                        decimals,
                        if decimals == 1 { "" } else { "s" }
                    ),
                ))
            })
            .collect()
    }
}

/// Attribution to unnamed studies or experts.
pub struct UnverifiableClaimRule;

impl PatternRule for UnverifiableClaimRule {
    fn name(&self) -> &'static str {
        "unverifiable_claim"
    }

    fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> {
        if has_named_source(&sentence.text) {
            return Vec::new();
        }

        ATTRIBUTION
            .find_iter(&sentence.text)
            .map(|m| {
                candidate_from_match(
                    sentence,
                    HallucinationKind::UnverifiableClaim,
                    m.start(),
                    m.end(),
                    UNVERIFIABLE_CONFIDENCE,
                    format!("'{}' cites no identifiable source", m.as_str()),
                )
            })
            .collect()
    }
}

/// Absolute metrics at or beyond statistical extremes.
pub struct ImpossibleMetricRule;

impl ImpossibleMetricRule {
    fn is_extreme(raw: &str) -> bool {
        if raw.to_lowercase().starts_with("one") {
            return true;
        }
        parse_number(raw).is_some_and(|v| v >= 100.0)
    }
}

impl PatternRule for ImpossibleMetricRule {
    fn name(&self) -> &'static str {
        "impossible_metric"
    }

    fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> {
        let text = &sentence.text;
        let mut found = Vec::new();

        for caps in PERFECT_RATE
            .captures_iter(text)
            .chain(RATE_OF_PERFECT.captures_iter(text))
        {
            if !Self::is_extreme(&caps["pct"]) {
                continue;
            }
            let Some(m) = caps.get(0) else { continue };
            found.push(candidate_from_match(
                sentence,
                HallucinationKind::ImpossibleMetric,
                m.start(),
                m.end(),
                IMPOSSIBLE_METRIC_CONFIDENCE,
                format!("'{}' claims a perfect {} rate", m.as_str(), caps["metric"].to_lowercase()),
            ));
        }

        for m in ZERO_DEFECTS.find_iter(text).chain(NO_DEFECTS.find_iter(text)) {
            found.push(candidate_from_match(
                sentence,
                HallucinationKind::ImpossibleMetric,
                m.start(),
                m.end(),
                IMPOSSIBLE_METRIC_CONFIDENCE,
                format!("'{}' is a statistically implausible absolute", m.as_str()),
            ));
        }

        found
    }
}

/// Performance or capability beyond physical or technological bounds.
pub struct TechnicalImpossibilityRule;

impl TechnicalImpossibilityRule {
    fn ratio_is_implausible(caps: &Captures<'_>) -> bool {
        if parse_number(&caps["n"]).is_some_and(|n| n >= IMPLAUSIBLE_RATIO) {
            return true;
        }
        caps.name("target").is_some_and(|target| {
            let target = target.as_str().trim().to_lowercase();
            HARD_LIMITS.iter().any(|limit| target.starts_with(limit))
        })
    }
}

impl PatternRule for TechnicalImpossibilityRule {
    fn name(&self) -> &'static str {
        "technical_impossibility"
    }

    fn evaluate(&self, sentence: &Sentence) -> Vec<HallucinationCandidate> {
        let text = &sentence.text;
        let mut found = Vec::new();

        let mut push = |start: usize, end: usize, reason: &str| {
            found.push(candidate_from_match(
                sentence,
                HallucinationKind::TechnicalImpossibility,
                start,
                end,
                TECHNICAL_IMPOSSIBILITY_CONFIDENCE,
                format!("'{}' {}", &text[start..end], reason),
            ));
        };

        for m in FASTER_THAN_LIGHT.find_iter(text) {
            push(m.start(), m.end(), "exceeds the speed of light");
        }

        for caps in RATIO_CLAIM.captures_iter(text) {
            if Self::ratio_is_implausible(&caps) {
                if let Some(m) = caps.get(0) {
                    push(m.start(), m.end(), "claims an implausible performance ratio");
                }
            }
        }

        for m in UNBOUNDED_CAPACITY.find_iter(text) {
            push(m.start(), m.end(), "claims unbounded capability");
        }

        for m in ZERO_LATENCY.find_iter(text) {
            push(m.start(), m.end(), "claims physically impossible latency");
        }

        for caps in OVER_UNITY.captures_iter(text) {
            if parse_number(&caps["pct"]).is_some_and(|v| v > 100.0) {
                if let Some(m) = caps.get(0) {
                    push(m.start(), m.end(), "claims efficiency above 100%");
                }
            }
        }

        found
    }
}
