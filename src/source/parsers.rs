//! Naver response shapes and their conversion into engine models.

use crate::error::FetchError;
use crate::models::{KeywordStat, KeywordStats, TrendPoint, TrendSeries};
use chrono::NaiveDate;
use serde::Deserialize;

// ── DataLab search trend ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DatalabResponse {
    #[serde(default)]
    pub results: Vec<DatalabResult>,
}

#[derive(Debug, Deserialize)]
pub struct DatalabResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Vec<DatalabPoint>,
}

#[derive(Debug, Deserialize)]
pub struct DatalabPoint {
    pub period: NaiveDate,
    pub ratio: f64,
}

impl DatalabResponse {
    /// Series of the first keyword group. The API omits days with no searches.
    pub fn into_series(self) -> Result<TrendSeries, FetchError> {
        let first = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MissingData("datalab response has no results".into()))?;

        TrendSeries::from_points(
            first
                .data
                .into_iter()
                .map(|p| TrendPoint::new(p.period, p.ratio)),
        )
        .map_err(|e| FetchError::Decode(format!("datalab group {:?}: {e}", first.title)))
    }
}

// ── Blog / news search ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
}

// ── Keyword tool ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordToolResponse {
    #[serde(default)]
    pub keyword_list: Vec<RawKeyword>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKeyword {
    pub rel_keyword: String,
    pub monthly_pc_qc_cnt: RawCount,
    pub monthly_mobile_qc_cnt: RawCount,
}

/// Query counts arrive as numbers, or as `"< 10"` below the reporting threshold.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawCount {
    Number(u64),
    Text(String),
}

/// Parse a count field. "< 10" → 0 | "1,234" → 1234 | "" → None
pub fn parse_count(raw: &RawCount) -> Option<u64> {
    match raw {
        RawCount::Number(n) => Some(*n),
        RawCount::Text(s) => {
            let s = s.trim();
            if s.starts_with('<') {
                return Some(0);
            }
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            cleaned.parse().ok()
        }
    }
}

/// Comparison form of a keyword: no whitespace, upper-case ASCII.
pub fn normalise_keyword(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

impl KeywordToolResponse {
    pub fn into_stats(self, query: &str) -> Result<KeywordStats, FetchError> {
        let candidates = self
            .keyword_list
            .into_iter()
            .map(|k| {
                let pc = parse_count(&k.monthly_pc_qc_cnt);
                let mobile = parse_count(&k.monthly_mobile_qc_cnt);
                match (pc, mobile) {
                    (Some(pc), Some(mobile)) => Ok(KeywordStat::new(k.rel_keyword, pc, mobile)),
                    _ => Err(FetchError::Decode(format!(
                        "unreadable counts for {:?}: {:?} / {:?}",
                        k.rel_keyword, k.monthly_pc_qc_cnt, k.monthly_mobile_qc_cnt
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        split_seed(query, candidates)
    }
}

/// Pick the query's own entry out of a keyword list; the first entry stands in when the
/// query is not listed verbatim.
pub fn split_seed(query: &str, candidates: Vec<KeywordStat>) -> Result<KeywordStats, FetchError> {
    let wanted = normalise_keyword(query);
    let seed = candidates
        .iter()
        .find(|c| normalise_keyword(&c.keyword) == wanted)
        .or_else(|| candidates.first())
        .cloned()
        .ok_or_else(|| FetchError::MissingData(format!("no keyword stats for {query:?}")))?;

    Ok(KeywordStats { seed, candidates })
}
