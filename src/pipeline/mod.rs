//! Pipeline orchestrator: ties a data source → the aggregation engine together.
//!
//! `run()`:
//!   1. Resolve the date range (end defaults to yesterday; the overall series is fetched far
//!      enough back to cover the calibration window).
//!   2. Fetch overall, 7 demographic slices, keyword stats and mention counts concurrently.
//!      The first failure or the fetch timeout cancels the rest and fails the report.
//!   3. Hand everything to the assembler. Nothing is stored.

use crate::config::AppConfig;
use crate::engine::ReportAssembler;
use crate::error::{FetchError, TrendError, TrendResult};
use crate::models::{DailyReport, DemographicGroup, FetchedInputs, TrendSeries};
use crate::source::TrendDataSource;
use chrono::{Days, Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What the caller wants a report for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub keyword: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

pub struct Pipeline {
    config: AppConfig,
    source: Arc<dyn TrendDataSource>,
    assembler: ReportAssembler,
}

impl Pipeline {
    pub fn new(config: AppConfig, source: Arc<dyn TrendDataSource>) -> Self {
        let assembler = ReportAssembler::from_config(&config.engine);
        Self {
            config,
            source,
            assembler,
        }
    }

    pub async fn run(&self, request: &ReportRequest) -> TrendResult<DailyReport> {
        let keyword = request.keyword.trim();
        if keyword.is_empty() {
            return Err(TrendError::Validation("keyword is empty".into()));
        }

        let end = request
            .end
            .unwrap_or_else(|| Local::now().date_naive() - Days::new(1));
        if request.start > end {
            return Err(TrendError::Validation(format!(
                "start date {} is after end date {}",
                request.start, end
            )));
        }
        let fetch_start = self.fetch_start(request.start, end);

        info!("=== Fetching inputs for {:?} ({} → {}) ===", keyword, fetch_start, end);
        let inputs = self.fetch_inputs(keyword, fetch_start, end).await?;

        info!(
            "=== Assembling report: {} overall points, {} candidates ===",
            inputs.overall.len(),
            inputs.keyword_stats.candidates.len()
        );
        self.assembler.assemble(keyword, request.start, end, &inputs)
    }

    /// Earliest day to request so the newest `window_size` days are always present.
    fn fetch_start(&self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let window = u64::try_from(self.config.engine.window_size).unwrap_or(u64::MAX);
        end.checked_sub_days(Days::new(window))
            .map_or(start, |window_start| start.min(window_start))
    }

    async fn fetch_inputs(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> TrendResult<FetchedInputs> {
        let src = self.source.as_ref();
        let slice = move |group: DemographicGroup| async move {
            src.fetch_demographic_trend(keyword, group)
                .await
                .map_err(|e| TrendError::fetch(format!("{group} trend"), e))
        };

        let fan_out = async {
            tokio::try_join!(
                async {
                    src.fetch_overall_trend(keyword, start, end)
                        .await
                        .map_err(|e| TrendError::fetch("overall trend", e))
                },
                slice(DemographicGroup::Female),
                slice(DemographicGroup::Male),
                slice(DemographicGroup::Age10),
                slice(DemographicGroup::Age20),
                slice(DemographicGroup::Age30),
                slice(DemographicGroup::Age40),
                slice(DemographicGroup::Age50),
                async {
                    src.fetch_keyword_stats(keyword)
                        .await
                        .map_err(|e| TrendError::fetch("keyword stats", e))
                },
                async {
                    src.fetch_mention_counts(keyword)
                        .await
                        .map_err(|e| TrendError::fetch("mention counts", e))
                },
            )
        };

        let limit = Duration::from_secs(self.config.pipeline.fetch_timeout_secs);
        let (overall, female, male, age_10, age_20, age_30, age_40, age_50, keyword_stats, mentions) =
            match tokio::time::timeout(limit, fan_out).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Fetch fan-out for {:?} exceeded {:?}", keyword, limit);
                    return Err(TrendError::fetch("report inputs", FetchError::Timeout));
                }
            };

        let demographics: BTreeMap<DemographicGroup, TrendSeries> = DemographicGroup::all()
            .zip([female, male, age_10, age_20, age_30, age_40, age_50])
            .collect();

        Ok(FetchedInputs {
            keyword_stats,
            mentions,
            overall,
            demographics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileSource;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn pipeline(window_size: usize) -> Pipeline {
        let mut config = AppConfig::default();
        config.engine.window_size = window_size;
        Pipeline::new(config, Arc::new(FileSource::new("unused")))
    }

    #[test]
    fn test_fetch_start_covers_window() {
        let p = pipeline(7);
        assert_eq!(p.fetch_start(day(25), day(30)), day(23));
        assert_eq!(p.fetch_start(day(2), day(30)), day(2));
    }

    #[tokio::test]
    async fn test_inverted_range_fails_before_fetching() {
        let request = ReportRequest {
            keyword: "rust".into(),
            start: day(10),
            end: Some(day(1)),
        };
        let err = pipeline(30).run(&request).await.unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_keyword_rejected() {
        let request = ReportRequest {
            keyword: "  ".into(),
            start: day(1),
            end: Some(day(2)),
        };
        let err = pipeline(30).run(&request).await.unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }
}
