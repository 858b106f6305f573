use super::round2;
use crate::error::{TrendError, TrendResult};
use crate::models::{DemographicGroup, TrendSeries};
use std::collections::BTreeMap;
use tracing::debug;

/// Added to every raw group sum before normalizing, so a group with no searches keeps a share.
pub const DEFAULT_DEMOGRAPHIC_OFFSET: f64 = 100.0;

/// Converts per-group ratio series into percentages of the whole group set.
///
/// Each group's score is `sum(ratio) + offset`; its share is `score / sum(scores) * 100`,
/// rounded to two decimals. Shares are rounded independently, so a set may add up to
/// anything between 99.99 and 100.01.
///
/// A set whose groups have no search interest at all carries no information and is
/// rejected before the offset is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemographicNormalizer {
    offset: f64,
}

impl Default for DemographicNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DEMOGRAPHIC_OFFSET)
    }
}

impl DemographicNormalizer {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    /// The groups must form exactly one complete set: both genders, or all five age brackets.
    pub fn normalize<'a, I>(&self, groups: I) -> TrendResult<BTreeMap<DemographicGroup, f64>>
    where
        I: IntoIterator<Item = (&'a DemographicGroup, &'a TrendSeries)>,
    {
        let mut raw = BTreeMap::new();
        for (&group, series) in groups {
            if raw.insert(group, series.ratio_sum()).is_some() {
                return Err(TrendError::Validation(format!("group {group} given twice")));
            }
        }
        validate_group_set(&raw)?;

        if raw.values().all(|&sum| sum == 0.0) {
            return Err(TrendError::DegenerateInput(format!(
                "every ratio of the {} groups is zero",
                raw.len()
            )));
        }

        let scores: BTreeMap<DemographicGroup, f64> = raw
            .into_iter()
            .map(|(group, sum)| (group, sum + self.offset))
            .collect();

        let total: f64 = scores.values().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(TrendError::DegenerateInput(format!(
                "demographic scores sum to {total} (offset {})",
                self.offset
            )));
        }
        if let Some((group, score)) = scores.iter().find(|(_, s)| **s < 0.0) {
            return Err(TrendError::DegenerateInput(format!(
                "group {group} has negative score {score}"
            )));
        }

        debug!(total, groups = scores.len(), "normalizing demographic scores");

        Ok(scores
            .into_iter()
            .map(|(group, score)| (group, round2(score / total * 100.0)))
            .collect())
    }
}

fn validate_group_set<V>(scores: &BTreeMap<DemographicGroup, V>) -> TrendResult<()> {
    let Some(first) = scores.keys().next() else {
        return Err(TrendError::Validation("no demographic groups given".into()));
    };
    let expected = DemographicGroup::members(first.kind());
    if !scores.keys().eq(expected.iter()) {
        let got: Vec<&str> = scores.keys().map(|g| g.as_str()).collect();
        let want: Vec<&str> = expected.iter().map(|g| g.as_str()).collect();
        return Err(TrendError::Validation(format!(
            "demographic groups {got:?} do not form the set {want:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrendPoint;
    use chrono::NaiveDate;

    fn series(ratios: &[f64]) -> TrendSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TrendSeries::from_points(
            ratios
                .iter()
                .enumerate()
                .map(|(i, &r)| TrendPoint::new(start + chrono::Days::new(i as u64), r)),
        )
        .unwrap()
    }

    fn groups(entries: Vec<(DemographicGroup, Vec<f64>)>) -> BTreeMap<DemographicGroup, TrendSeries> {
        entries.into_iter().map(|(g, r)| (g, series(&r))).collect()
    }

    #[test]
    fn test_gender_split_with_offset() {
        let input = groups(vec![
            (DemographicGroup::Female, vec![20.0, 30.0]),
            (DemographicGroup::Male, vec![100.0, 50.0]),
        ]);

        let pct = DemographicNormalizer::default().normalize(&input).unwrap();
        assert_eq!(pct[&DemographicGroup::Female], 37.5);
        assert_eq!(pct[&DemographicGroup::Male], 62.5);
    }

    #[test]
    fn test_age_split_sums_to_hundred_within_rounding() {
        let input = groups(vec![
            (DemographicGroup::Age10, vec![1.0]),
            (DemographicGroup::Age20, vec![2.0]),
            (DemographicGroup::Age30, vec![3.0]),
            (DemographicGroup::Age40, vec![4.0]),
            (DemographicGroup::Age50, vec![0.0]),
        ]);

        let pct = DemographicNormalizer::new(0.5).normalize(&input).unwrap();
        let sum: f64 = pct.values().sum();
        // Independent rounding may leave up to ±0.01 per set; it is not redistributed.
        assert!((sum - 100.0).abs() <= 0.02, "sum was {sum}");
        assert!(pct[&DemographicGroup::Age40] > pct[&DemographicGroup::Age10]);
    }

    #[test]
    fn test_all_zero_ratios_are_degenerate_with_default_offset() {
        let input = groups(
            DemographicGroup::AGE
                .into_iter()
                .map(|g| (g, vec![0.0]))
                .collect(),
        );

        let err = DemographicNormalizer::default().normalize(&input).unwrap_err();
        assert!(matches!(err, TrendError::DegenerateInput(_)));
    }

    #[test]
    fn test_all_zero_ratios_without_offset_is_degenerate() {
        let input = groups(vec![
            (DemographicGroup::Female, vec![0.0]),
            (DemographicGroup::Male, vec![0.0, 0.0]),
        ]);

        let err = DemographicNormalizer::new(0.0).normalize(&input).unwrap_err();
        assert!(matches!(err, TrendError::DegenerateInput(_)));
    }

    #[test]
    fn test_single_zero_group_keeps_offset_share() {
        let input = groups(vec![
            (DemographicGroup::Female, vec![0.0]),
            (DemographicGroup::Male, vec![100.0]),
        ]);

        let pct = DemographicNormalizer::default().normalize(&input).unwrap();
        assert_eq!(pct[&DemographicGroup::Female], 33.33);
        assert_eq!(pct[&DemographicGroup::Male], 66.67);
    }

    #[test]
    fn test_negative_offset_is_degenerate() {
        let input = groups(vec![
            (DemographicGroup::Female, vec![10.0]),
            (DemographicGroup::Male, vec![80.0]),
        ]);

        let err = DemographicNormalizer::new(-50.0).normalize(&input).unwrap_err();
        assert!(matches!(err, TrendError::DegenerateInput(_)));
    }

    #[test]
    fn test_mixed_or_partial_sets_are_rejected() {
        let mixed = groups(vec![
            (DemographicGroup::Female, vec![1.0]),
            (DemographicGroup::Age10, vec![1.0]),
        ]);
        let partial = groups(vec![(DemographicGroup::Male, vec![1.0])]);
        let empty: BTreeMap<DemographicGroup, TrendSeries> = BTreeMap::new();

        let n = DemographicNormalizer::default();
        for input in [mixed, partial, empty] {
            assert!(matches!(n.normalize(&input), Err(TrendError::Validation(_))));
        }
    }
}
