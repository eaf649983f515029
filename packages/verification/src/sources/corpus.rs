//! In-memory knowledge base.
//!
//! Holds snippets per source id and answers a claim with every snippet that
//! shares enough of its terms. Useful for offline corpora and tests.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{SourceError, SourceResult};
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::source::KnowledgeSource;

/// Default cap on hits returned per query.
pub const DEFAULT_MAX_HITS: usize = 5;

/// Keyword overlap between a claim and a snippet.
///
/// The fraction of the claim's terms (longer than two characters) that
/// occur in the snippet, case-insensitively.
pub fn keyword_match(claim: &str, text: &str) -> f64 {
    let claim_lower = claim.to_lowercase();
    let terms: Vec<&str> = claim_lower
        .split(|c: char| !c.is_alphanumeric() && c != '.' && c != '%')
        .map(|w| w.trim_matches('.'))
        .filter(|w| w.chars().count() > 2)
        .collect();

    if terms.is_empty() {
        return 0.0;
    }

    let text_lower = text.to_lowercase();
    let matches = terms.iter().filter(|term| text_lower.contains(*term)).count();

    matches as f64 / terms.len() as f64
}

/// Snippets grouped by the source that holds them.
#[derive(Debug, Clone)]
pub struct CorpusKnowledgeBase {
    entries: HashMap<String, Vec<SourceHit>>,
    max_hits: usize,
    min_score: f64,
}

impl Default for CorpusKnowledgeBase {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            max_hits: DEFAULT_MAX_HITS,
            min_score: 0.0,
        }
    }
}

impl CorpusKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain snippet to a source.
    pub fn with_snippet(self, source_id: impl Into<String>, snippet: impl Into<String>) -> Self {
        self.with_entry(source_id, SourceHit::new(snippet, 0.0))
    }

    /// Add a snippet with metadata (title, url, dates).
    ///
    /// The entry's relevance is replaced by the keyword score at query time.
    pub fn with_entry(mut self, source_id: impl Into<String>, entry: SourceHit) -> Self {
        self.insert(source_id, entry);
        self
    }

    pub fn insert(&mut self, source_id: impl Into<String>, entry: SourceHit) {
        self.entries.entry(source_id.into()).or_default().push(entry);
    }

    /// Cap the number of hits per query.
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Only return snippets scoring strictly above this.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Number of snippets held for a source.
    pub fn len_for(&self, source_id: &str) -> usize {
        self.entries.get(source_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Score every snippet of `source_id` against `claim`, best first.
    pub fn search(&self, source_id: &str, claim: &str) -> Vec<SourceHit> {
        let Some(entries) = self.entries.get(source_id) else {
            return Vec::new();
        };

        let mut scored: Vec<SourceHit> = entries
            .iter()
            .filter_map(|entry| {
                let score = keyword_match(claim, &entry.snippet);
                (score > self.min_score && score > 0.0).then(|| SourceHit {
                    raw_relevance: score,
                    ..entry.clone()
                })
            })
            .collect();

        scored.sort_by(|a, b| b.raw_relevance.total_cmp(&a.raw_relevance));
        scored.truncate(self.max_hits);
        scored
    }
}

#[async_trait]
impl KnowledgeQuery for CorpusKnowledgeBase {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        if ctx.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        Ok(self.search(&source.id, claim))
    }
}
