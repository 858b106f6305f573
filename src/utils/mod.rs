use std::time::{Duration, Instant};
use tracing::info;

/// Logs how long a report stage took once it goes out of scope.
///
/// Emits a structured `stage` / `elapsed_ms` event so runs can be compared from the logs.
pub struct Timer {
    stage: String,
    started: Instant,
}

impl Timer {
    pub fn start(stage: impl Into<String>) -> Self {
        let stage = stage.into();
        info!(stage = %stage, "stage started");
        Self {
            stage,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        info!(
            stage = %self.stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "stage finished in {:.2?}",
            elapsed
        );
    }
}

/// Format a count with thousands separators.
pub fn fmt_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

/// Fixed-width bar for a percentage, `width` cells at 100%.
pub fn pct_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_elapsed_grows() {
        let timer = Timer::start("report");
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= first + Duration::from_millis(5));
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(42_000), "42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn test_pct_bar() {
        assert_eq!(pct_bar(50.0, 10), "█████░░░░░");
        assert_eq!(pct_bar(0.0, 4), "░░░░");
        assert_eq!(pct_bar(150.0, 4), "████");
    }
}
