use crate::error::{TrendError, TrendResult};
use crate::models::{DailyCount, TrendSeries};
use chrono::NaiveDate;
use tracing::debug;

pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Turns a relative daily index into absolute daily counts.
///
/// The monthly total is assumed to be explained by the newest `window_size` ratio samples:
/// `scale = monthly_total / sum(tail ratios)` and each day gets `round(scale * ratio)`
/// (half away from zero). The window is taken from the tail regardless of `start`, so days
/// older than the window are extrapolated with the same scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRedistributor {
    window_size: usize,
}

impl Default for VolumeRedistributor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl VolumeRedistributor {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Counts per unit of ratio for this series and total.
    pub fn scale_factor(&self, overall: &TrendSeries, monthly_total: u64) -> TrendResult<f64> {
        if self.window_size == 0 {
            return Err(TrendError::Validation("window size must be at least 1".into()));
        }
        if overall.is_empty() {
            return Err(TrendError::DegenerateInput("overall series has no points".into()));
        }

        let window_ratio_sum: f64 = overall.tail(self.window_size).map(|p| p.ratio).sum();
        if window_ratio_sum <= 0.0 {
            return Err(TrendError::DegenerateInput(format!(
                "ratio sum over the last {} of {} points is zero",
                self.window_size,
                overall.len()
            )));
        }

        Ok(monthly_total as f64 / window_ratio_sum)
    }

    /// Estimated counts for every point with `period >= start`, oldest first.
    pub fn redistribute(
        &self,
        overall: &TrendSeries,
        monthly_total: u64,
        start: NaiveDate,
    ) -> TrendResult<Vec<DailyCount>> {
        let scale = self.scale_factor(overall, monthly_total)?;
        debug!(scale, monthly_total, window = self.window_size, "redistributing monthly volume");

        Ok(overall
            .since(start)
            .map(|p| DailyCount {
                period: p.period,
                estimated_count: (scale * p.ratio).round() as u64,
            })
            .collect())
    }
}
