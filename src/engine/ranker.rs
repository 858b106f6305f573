use crate::models::KeywordStat;
use std::cmp::Reverse;
use std::collections::HashSet;

pub const DEFAULT_RELATED_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedKeywords {
    pub top_stats: Vec<KeywordStat>,
    pub related_keywords: Vec<String>,
}

/// Orders related-keyword candidates by combined PC + mobile monthly volume.
///
/// The seed is dropped by exact, case-sensitive match. Equal volumes keep their input
/// order, and a keyword listed twice keeps only its highest-volume entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRanker {
    limit: usize,
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new(DEFAULT_RELATED_LIMIT)
    }
}

impl KeywordRanker {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn rank(&self, candidates: &[KeywordStat], seed_keyword: &str) -> RankedKeywords {
        let mut ranked: Vec<&KeywordStat> = candidates
            .iter()
            .filter(|c| c.keyword != seed_keyword)
            .collect();
        // stable
        ranked.sort_by_key(|c| Reverse(c.total_count()));

        let mut seen = HashSet::new();
        let top_stats: Vec<KeywordStat> = ranked
            .into_iter()
            .filter(|c| seen.insert(c.keyword.as_str()))
            .take(self.limit)
            .cloned()
            .collect();
        let related_keywords = top_stats.iter().map(|s| s.keyword.clone()).collect();

        RankedKeywords {
            top_stats,
            related_keywords,
        }
    }
}
