use super::{DemographicNormalizer, KeywordRanker, VolumeRedistributor};
use crate::config::EngineConfig;
use crate::error::{TrendError, TrendResult};
use crate::models::{
    DailyReport, DemographicGroup, Demographics, FetchedInputs, GroupKind, TrendSeries,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Merges normalizer, redistributor and ranker output into one [`DailyReport`].
///
/// Any sub-step failure fails the whole report; there is no partial result.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    normalizer: DemographicNormalizer,
    redistributor: VolumeRedistributor,
    ranker: KeywordRanker,
}

impl ReportAssembler {
    pub fn new(
        normalizer: DemographicNormalizer,
        redistributor: VolumeRedistributor,
        ranker: KeywordRanker,
    ) -> Self {
        Self {
            normalizer,
            redistributor,
            ranker,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            DemographicNormalizer::new(config.demographic_offset),
            VolumeRedistributor::new(config.window_size),
            KeywordRanker::new(config.related_limit),
        )
    }

    pub fn assemble(
        &self,
        seed_keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
        inputs: &FetchedInputs,
    ) -> TrendResult<DailyReport> {
        if seed_keyword.trim().is_empty() {
            return Err(TrendError::Validation("seed keyword is empty".into()));
        }
        if start > end {
            return Err(TrendError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let gender = self
            .normalizer
            .normalize(groups_of(&inputs.demographics, GroupKind::Gender))?;
        let age = self
            .normalizer
            .normalize(groups_of(&inputs.demographics, GroupKind::Age))?;

        let ranked = self.ranker.rank(&inputs.keyword_stats.candidates, seed_keyword);

        let seed = &inputs.keyword_stats.seed;
        let daily = self
            .redistributor
            .redistribute(&inputs.overall, seed.total_count(), start)?;

        debug!(
            keyword = seed_keyword,
            days = daily.len(),
            related = ranked.related_keywords.len(),
            "report assembled"
        );

        let demographics = demographics_from(&gender, &age)?;

        Ok(DailyReport {
            title: seed.keyword.clone(),
            seed_keywords: vec![seed.keyword.clone()],
            related_keywords: ranked.related_keywords,
            blog_mention_count: inputs.mentions.blog_count,
            news_mention_count: inputs.mentions.news_count,
            pc_volume: seed.monthly_pc_count,
            mobile_volume: seed.monthly_mobile_count,
            demographics,
            daily,
        })
    }
}

/// Copies the seven shares out of the normalized gender and age maps.
fn demographics_from(
    gender: &BTreeMap<DemographicGroup, f64>,
    age: &BTreeMap<DemographicGroup, f64>,
) -> TrendResult<Demographics> {
    let share = |group: DemographicGroup| -> TrendResult<f64> {
        gender
            .get(&group)
            .or_else(|| age.get(&group))
            .copied()
            .ok_or_else(|| TrendError::Validation(format!("no share computed for {group}")))
    };

    Ok(Demographics {
        female: share(DemographicGroup::Female)?,
        male: share(DemographicGroup::Male)?,
        age_10: share(DemographicGroup::Age10)?,
        age_20: share(DemographicGroup::Age20)?,
        age_30: share(DemographicGroup::Age30)?,
        age_40: share(DemographicGroup::Age40)?,
        age_50: share(DemographicGroup::Age50)?,
    })
}

fn groups_of(
    all: &BTreeMap<DemographicGroup, TrendSeries>,
    kind: GroupKind,
) -> impl Iterator<Item = (&DemographicGroup, &TrendSeries)> {
    all.iter().filter(move |(g, _)| g.kind() == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeywordStat, KeywordStats, MentionCounts, TrendPoint};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn flat(ratio: f64) -> TrendSeries {
        TrendSeries::from_points([TrendPoint::new(day(1), ratio)]).unwrap()
    }

    fn inputs() -> FetchedInputs {
        let mut demographics = BTreeMap::new();
        demographics.insert(DemographicGroup::Female, flat(50.0));
        demographics.insert(DemographicGroup::Male, flat(150.0));
        for (g, r) in DemographicGroup::AGE.into_iter().zip([0.0, 100.0, 50.0, 25.0, 25.0]) {
            demographics.insert(g, flat(r));
        }

        FetchedInputs {
            keyword_stats: KeywordStats {
                seed: KeywordStat::new("seed", 80, 40),
                candidates: vec![
                    KeywordStat::new("A", 10, 5),
                    KeywordStat::new("seed", 999, 999),
                    KeywordStat::new("B", 10, 5),
                ],
            },
            mentions: MentionCounts { blog_count: 12, news_count: 3 },
            overall: TrendSeries::from_points([
                TrendPoint::new(day(1), 10.0),
                TrendPoint::new(day(2), 20.0),
                TrendPoint::new(day(3), 30.0),
            ])
            .unwrap(),
            demographics,
        }
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::new(
            DemographicNormalizer::default(),
            VolumeRedistributor::new(3),
            KeywordRanker::default(),
        )
    }

    #[test]
    fn test_assemble_full_report() {
        let report = assembler().assemble("seed", day(2), day(3), &inputs()).unwrap();

        assert_eq!(report.title, "seed");
        assert_eq!(report.seed_keywords, vec!["seed"]);
        assert_eq!(report.related_keywords, vec!["A", "B"]);
        assert_eq!((report.pc_volume, report.mobile_volume), (80, 40));
        assert_eq!((report.blog_mention_count, report.news_mention_count), (12, 3));

        assert_eq!(report.demographics.female, 37.5);
        assert_eq!(report.demographics.male, 62.5);
        let d = &report.demographics;
        let age_sum = d.age_10 + d.age_20 + d.age_30 + d.age_40 + d.age_50;
        assert!((age_sum - 100.0).abs() <= 0.02);

        // 120 / 60 = 2 per ratio point, day 1 filtered out by start.
        let counts: Vec<(NaiveDate, u64)> =
            report.daily.iter().map(|d| (d.period, d.estimated_count)).collect();
        assert_eq!(counts, vec![(day(2), 40), (day(3), 60)]);
    }

    #[test]
    fn test_missing_age_group_fails_whole_report() {
        let mut inputs = inputs();
        inputs.demographics.remove(&DemographicGroup::Age30);

        let err = assembler().assemble("seed", day(1), day(3), &inputs).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }

    #[test]
    fn test_zero_overall_series_fails() {
        let mut inputs = inputs();
        inputs.overall = TrendSeries::from_points([TrendPoint::new(day(1), 0.0)]).unwrap();

        let err = assembler().assemble("seed", day(1), day(3), &inputs).unwrap_err();
        assert!(matches!(err, TrendError::DegenerateInput(_)));
    }

    #[test]
    fn test_all_zero_age_slices_fail_whole_report() {
        let mut inputs = inputs();
        for g in DemographicGroup::AGE {
            inputs.demographics.insert(g, flat(0.0));
        }

        let err = assembler().assemble("seed", day(1), day(3), &inputs).unwrap_err();
        assert!(matches!(err, TrendError::DegenerateInput(_)));
    }

    #[test]
    fn test_missing_share_is_an_error_not_zero() {
        let gender = BTreeMap::from([(DemographicGroup::Female, 40.0), (DemographicGroup::Male, 60.0)]);
        let age = BTreeMap::from([(DemographicGroup::Age10, 100.0)]);

        let err = demographics_from(&gender, &age).unwrap_err();
        assert!(matches!(err, TrendError::Validation(msg) if msg.contains("age_20")));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = assembler().assemble("seed", day(3), day(1), &inputs()).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }
}
