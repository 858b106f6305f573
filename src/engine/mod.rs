//! Trend aggregation engine.
//!
//! Pure, synchronous transformations over already-fetched series:
//!
//! - [`DemographicNormalizer`] turns per-group ratio sums into percentages.
//! - [`VolumeRedistributor`] spreads a known monthly total over a relative daily index.
//! - [`KeywordRanker`] orders related-keyword candidates by monthly demand.
//! - [`ReportAssembler`] runs the three and builds a [`DailyReport`](crate::models::DailyReport).
//!
//! Nothing here performs I/O or keeps state between calls.

pub mod assembler;
pub mod normalizer;
pub mod ranker;
pub mod redistributor;

pub use assembler::ReportAssembler;
pub use normalizer::{DemographicNormalizer, DEFAULT_DEMOGRAPHIC_OFFSET};
pub use ranker::{KeywordRanker, RankedKeywords, DEFAULT_RELATED_LIMIT};
pub use redistributor::{VolumeRedistributor, DEFAULT_WINDOW_SIZE};

/// Round half away from zero to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn test_round2() {
        assert_eq!(round2(37.5), 37.5);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.125), 0.13);
    }
}
