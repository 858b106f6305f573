pub mod file;
pub mod http_client;
pub mod naver;
pub mod parsers;

use crate::error::FetchError;
use crate::models::{DemographicGroup, KeywordStats, MentionCounts, TrendSeries};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use self::file::FileSource;
pub use self::naver::NaverSource;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable raw-data collaborator. Implementations own transport, auth and retries;
/// callers only see parsed series or a [`FetchError`].
#[async_trait]
pub trait TrendDataSource: Send + Sync {
    /// Daily relative search interest for `query` between `start` and `end` inclusive.
    async fn fetch_overall_trend(
        &self,
        query: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TrendSeries, FetchError>;

    /// Relative search interest restricted to one demographic group.
    async fn fetch_demographic_trend(
        &self,
        query: &str,
        group: DemographicGroup,
    ) -> Result<TrendSeries, FetchError>;

    async fn fetch_keyword_stats(&self, query: &str) -> Result<KeywordStats, FetchError>;

    async fn fetch_mention_counts(&self, query: &str) -> Result<MentionCounts, FetchError>;
}
