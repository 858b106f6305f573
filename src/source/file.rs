//! Offline source reading already-fetched raw data from CSV files.
//!
//! Directory layout:
//!
//! - `overall.csv`, `female.csv`, `male.csv`, `age_10.csv` … `age_50.csv`: `period,ratio`
//! - `keywords.csv`: `keyword,monthly_pc_count,monthly_mobile_count`, first row is the seed
//! - `mentions.csv`: `blog_count,news_count`

use super::TrendDataSource;
use crate::error::FetchError;
use crate::models::{
    DemographicGroup, KeywordStat, KeywordStats, MentionCounts, TrendPoint, TrendSeries,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SeriesRow {
    period: NaiveDate,
    ratio: f64,
}

#[derive(Debug, Deserialize)]
struct KeywordRow {
    keyword: String,
    monthly_pc_count: u64,
    monthly_mobile_count: u64,
}

pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_rows<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, FetchError> {
        let path = self.dir.join(name);
        let text = tokio::fs::read_to_string(&path).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<T>, _>>()?;

        debug!("{:?}: {} rows", path, rows.len());
        Ok(rows)
    }

    async fn read_series(&self, name: &str) -> Result<TrendSeries, FetchError> {
        let rows: Vec<SeriesRow> = self.read_rows(name).await?;
        TrendSeries::from_points(rows.into_iter().map(|r| TrendPoint::new(r.period, r.ratio)))
            .map_err(|e| FetchError::Decode(format!("{name}: {e}")))
    }
}

#[async_trait]
impl TrendDataSource for FileSource {
    async fn fetch_overall_trend(
        &self,
        _query: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TrendSeries, FetchError> {
        let series = self.read_series("overall.csv").await?;
        TrendSeries::from_points(series.since(start).filter(|p| p.period <= end))
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn fetch_demographic_trend(
        &self,
        _query: &str,
        group: DemographicGroup,
    ) -> Result<TrendSeries, FetchError> {
        self.read_series(&format!("{}.csv", group.as_str())).await
    }

    async fn fetch_keyword_stats(&self, _query: &str) -> Result<KeywordStats, FetchError> {
        let rows: Vec<KeywordRow> = self.read_rows("keywords.csv").await?;
        let candidates: Vec<KeywordStat> = rows
            .into_iter()
            .map(|r| KeywordStat::new(r.keyword, r.monthly_pc_count, r.monthly_mobile_count))
            .collect();

        let seed = candidates
            .first()
            .cloned()
            .ok_or_else(|| FetchError::MissingData("keywords.csv has no rows".into()))?;
        Ok(KeywordStats { seed, candidates })
    }

    async fn fetch_mention_counts(&self, _query: &str) -> Result<MentionCounts, FetchError> {
        let rows: Vec<MentionCounts> = self.read_rows("mentions.csv").await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| FetchError::MissingData("mentions.csv has no rows".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_io_error() {
        let source = FileSource::new("/nonexistent/trend-report");
        let result = tokio_test::block_on(source.fetch_mention_counts("q"));
        assert!(matches!(result, Err(FetchError::Io(_))));
    }

    #[test]
    fn test_negative_ratio_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("male.csv"), "period,ratio\n2024-01-01,-3\n").unwrap();

        let source = FileSource::new(dir.path());
        let result =
            tokio_test::block_on(source.fetch_demographic_trend("q", DemographicGroup::Male));
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
