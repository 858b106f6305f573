use crate::error::{TrendError, TrendResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Trend series ──────────────────────────────────────────────────────────────

/// One sample of a relative search-interest index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub period: NaiveDate, // day or first day of month, depending on granularity
    pub ratio: f64,
}

impl TrendPoint {
    pub fn new(period: NaiveDate, ratio: f64) -> Self {
        Self { period, ratio }
    }
}

/// Ratio samples ordered by period. A repeated period keeps the last value seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    points: BTreeMap<NaiveDate, f64>,
}

impl TrendSeries {
    pub fn from_points<I>(points: I) -> TrendResult<Self>
    where
        I: IntoIterator<Item = TrendPoint>,
    {
        let mut series = Self::default();
        for p in points {
            if !p.ratio.is_finite() || p.ratio < 0.0 {
                return Err(TrendError::Validation(format!(
                    "ratio {} on {} is not a finite non-negative number",
                    p.ratio, p.period
                )));
            }
            series.points.insert(p.period, p.ratio);
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest → newest.
    pub fn points(&self) -> impl DoubleEndedIterator<Item = TrendPoint> + '_ {
        self.points.iter().map(|(&period, &ratio)| TrendPoint { period, ratio })
    }

    pub fn ratio_sum(&self) -> f64 {
        self.points.values().sum()
    }

    /// The newest `n` points, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = TrendPoint> + '_ {
        self.points().skip(self.len().saturating_sub(n))
    }

    /// Points with `period >= start`.
    pub fn since(&self, start: NaiveDate) -> impl Iterator<Item = TrendPoint> + '_ {
        self.points
            .range(start..)
            .map(|(&period, &ratio)| TrendPoint { period, ratio })
    }
}

// ── Demographic groups ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKind {
    Gender,
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicGroup {
    Female,
    Male,
    #[serde(rename = "age_10")]
    Age10,
    #[serde(rename = "age_20")]
    Age20,
    #[serde(rename = "age_30")]
    Age30,
    #[serde(rename = "age_40")]
    Age40,
    #[serde(rename = "age_50")]
    Age50,
}

impl DemographicGroup {
    pub const GENDER: [DemographicGroup; 2] = [Self::Female, Self::Male];
    pub const AGE: [DemographicGroup; 5] = [
        Self::Age10,
        Self::Age20,
        Self::Age30,
        Self::Age40,
        Self::Age50,
    ];

    pub fn all() -> impl Iterator<Item = DemographicGroup> {
        Self::GENDER.into_iter().chain(Self::AGE)
    }

    pub fn kind(self) -> GroupKind {
        match self {
            Self::Female | Self::Male => GroupKind::Gender,
            _ => GroupKind::Age,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Age10 => "age_10",
            Self::Age20 => "age_20",
            Self::Age30 => "age_30",
            Self::Age40 => "age_40",
            Self::Age50 => "age_50",
        }
    }

    /// Every group of the given kind, in display order.
    pub fn members(kind: GroupKind) -> &'static [DemographicGroup] {
        match kind {
            GroupKind::Gender => &Self::GENDER,
            GroupKind::Age => &Self::AGE,
        }
    }
}

impl fmt::Display for DemographicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Keyword volume ────────────────────────────────────────────────────────────

/// Absolute monthly query counts for one keyword.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub keyword: String,
    pub monthly_pc_count: u64,
    pub monthly_mobile_count: u64,
}

impl KeywordStat {
    pub fn new(keyword: impl Into<String>, pc: u64, mobile: u64) -> Self {
        Self {
            keyword: keyword.into(),
            monthly_pc_count: pc,
            monthly_mobile_count: mobile,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.monthly_pc_count.saturating_add(self.monthly_mobile_count)
    }
}

/// Keyword-tool answer for a query: the query's own stat plus related candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordStats {
    pub seed: KeywordStat,
    pub candidates: Vec<KeywordStat>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MentionCounts {
    pub blog_count: u64,
    pub news_count: u64,
}

// ── Engine input bundle ───────────────────────────────────────────────────────

/// Everything the collaborators fetched for one report.
#[derive(Debug, Clone)]
pub struct FetchedInputs {
    pub keyword_stats: KeywordStats,
    pub mentions: MentionCounts,
    pub overall: TrendSeries,
    pub demographics: BTreeMap<DemographicGroup, TrendSeries>,
}

// ── Report output ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Demographics {
    pub female: f64,
    pub male: f64,
    pub age_10: f64,
    pub age_20: f64,
    pub age_30: f64,
    pub age_40: f64,
    pub age_50: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub period: NaiveDate,
    pub estimated_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub title: String,
    pub seed_keywords: Vec<String>,
    pub related_keywords: Vec<String>,
    pub blog_mention_count: u64,
    pub news_mention_count: u64,
    pub pc_volume: u64,
    pub mobile_volume: u64,
    pub demographics: Demographics,
    pub daily: Vec<DailyCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_sorts_and_last_write_wins() {
        let series = TrendSeries::from_points([
            TrendPoint::new(day(3), 30.0),
            TrendPoint::new(day(1), 10.0),
            TrendPoint::new(day(3), 33.0),
        ])
        .unwrap();

        let pts: Vec<_> = series.points().collect();
        assert_eq!(pts, vec![TrendPoint::new(day(1), 10.0), TrendPoint::new(day(3), 33.0)]);
    }

    #[test]
    fn test_series_rejects_negative_and_nan() {
        assert!(TrendSeries::from_points([TrendPoint::new(day(1), -1.0)]).is_err());
        assert!(TrendSeries::from_points([TrendPoint::new(day(1), f64::NAN)]).is_err());
    }

    #[test]
    fn test_tail_and_since() {
        let series =
            TrendSeries::from_points((1..=5).map(|d| TrendPoint::new(day(d), d as f64))).unwrap();

        let tail: Vec<f64> = series.tail(2).map(|p| p.ratio).collect();
        assert_eq!(tail, vec![4.0, 5.0]);
        assert_eq!(series.tail(10).count(), 5);

        let since: Vec<f64> = series.since(day(4)).map(|p| p.ratio).collect();
        assert_eq!(since, vec![4.0, 5.0]);
    }

    #[test]
    fn test_report_json_keys() {
        let report = DailyReport {
            title: "rust".into(),
            seed_keywords: vec!["rust".into()],
            related_keywords: vec![],
            blog_mention_count: 1,
            news_mention_count: 2,
            pc_volume: 3,
            mobile_volume: 4,
            demographics: Demographics {
                female: 50.0,
                male: 50.0,
                age_10: 20.0,
                age_20: 20.0,
                age_30: 20.0,
                age_40: 20.0,
                age_50: 20.0,
            },
            daily: vec![DailyCount { period: day(1), estimated_count: 7 }],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seedKeywords"][0], "rust");
        assert_eq!(json["demographics"]["age_10"], 20.0);
        assert_eq!(json["daily"][0]["estimatedCount"], 7);
        assert_eq!(json["daily"][0]["period"], "2024-03-01");
    }
}
