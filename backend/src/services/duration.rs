use crate::api::{DurationReport, Histogram};
use crate::config::{DurationBinning, MAX_DURATION_BUCKETS};
use crate::error::{ErrorContext, StatsError, StatsResult};
use crate::services::outcomes::format_duration;

/// Bins optional durations into half-open buckets `[k*w, (k+1)*w)`.
///
/// Missing durations are counted as DNF and durations at or above the
/// cutoff as overflow; neither contributes to `ys`.
#[derive(Debug, Clone, Copy)]
pub struct DurationHistogramBuilder {
    binning: DurationBinning,
}

impl DurationHistogramBuilder {
    pub fn new(binning: DurationBinning) -> Self {
        Self { binning }
    }

    pub fn build(&self, durations: &[Option<f64>]) -> StatsResult<DurationReport> {
        let width = self.binning.bucket_width_seconds;
        let cutoff = self.binning.cutoff_seconds;
        let bucket_count = self.binning.bucket_count();
        if !(width.is_finite() && width > 0.0)
            || bucket_count == 0
            || bucket_count > MAX_DURATION_BUCKETS
        {
            return Err(StatsError::Configuration(format!(
                "cannot bin durations with width {} and cutoff {}",
                width, cutoff
            )));
        }

        let mut ys = vec![0u64; bucket_count];
        let mut dnf_count = 0u64;
        let mut overflow_count = 0u64;

        for duration in durations {
            let seconds = match duration {
                Some(seconds) => *seconds,
                None => {
                    dnf_count += 1;
                    continue;
                }
            };
            if !(seconds.is_finite() && seconds >= 0.0) {
                return Err(StatsError::consistency(
                    format!("invalid duration {}", seconds),
                    ErrorContext::new("duration_histogram"),
                ));
            }
            if seconds >= cutoff {
                overflow_count += 1;
                continue;
            }
            let bucket = ((seconds / width).floor() as usize).min(bucket_count - 1);
            ys[bucket] += 1;
        }

        let xs = (0..bucket_count).map(|k| k as f64 * width).collect();
        let histogram = Histogram::from_counts(xs, ys, 0)?;

        Ok(DurationReport {
            histogram,
            dnf_count,
            overflow_count,
            bucket_width_seconds: width,
            cutoff_seconds: cutoff,
            max_duration: format_duration(cutoff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(width: f64, cutoff: f64) -> DurationHistogramBuilder {
        DurationHistogramBuilder::new(DurationBinning::new(width, cutoff))
    }

    #[test]
    fn test_boundary_falls_into_higher_bucket() {
        let report = builder(300.0, 10800.0)
            .build(&[Some(299.9), Some(300.0), Some(600.0)])
            .unwrap();
        assert_eq!(report.histogram.xs.len(), 36);
        assert_eq!(report.histogram.ys[0], 1);
        assert_eq!(report.histogram.ys[1], 1);
        assert_eq!(report.histogram.ys[2], 1);
        assert_eq!(report.histogram.xs[1], 300.0);
    }

    #[test]
    fn test_overflow_counted_separately() {
        let report = builder(1.0, 30.0)
            .build(&[Some(30.0), Some(45.2), Some(29.99), Some(0.0)])
            .unwrap();
        assert_eq!(report.overflow_count, 2);
        assert_eq!(report.histogram.total_ys, 2);
        assert_eq!(report.histogram.ys[29], 1);
        assert_eq!(report.histogram.ys[0], 1);
        assert_eq!(report.max_duration, "0:00:30");
    }

    #[test]
    fn test_all_dnf() {
        let report = builder(300.0, 10800.0)
            .build(&[None, None, None])
            .unwrap();
        assert_eq!(report.histogram.total_ys, 0);
        assert_eq!(report.dnf_count, 3);
        assert_eq!(report.overflow_count, 0);
        assert!(report.histogram.ys.iter().all(|&y| y == 0));
        assert_eq!(report.max_duration, "3:00:00");
    }

    #[test]
    fn test_partial_last_bucket() {
        // Buckets [0,4), [4,8), [8,10)
        let report = builder(4.0, 10.0).build(&[Some(9.5)]).unwrap();
        assert_eq!(report.histogram.xs, vec![0.0, 4.0, 8.0]);
        assert_eq!(report.histogram.ys, vec![0, 0, 1]);
    }

    #[test]
    fn test_negative_duration_is_a_fault() {
        let err = builder(1.0, 30.0).build(&[Some(-1.0)]).unwrap_err();
        assert!(matches!(err, StatsError::InternalConsistency { .. }));
        assert!(builder(1.0, 30.0).build(&[Some(f64::NAN)]).is_err());
    }

    #[test]
    fn test_oversized_binning_refused_before_allocating() {
        let err = builder(1e-6, 1e6).build(&[Some(1.0)]).unwrap_err();
        assert!(matches!(err, StatsError::Configuration(_)));
    }

    #[test]
    fn test_empty_input() {
        let report = builder(1.0, 30.0).build(&[]).unwrap();
        assert_eq!(report.histogram.xs.len(), 30);
        assert_eq!(report.histogram.total_ys, 0);
        assert_eq!(report.dnf_count, 0);
    }
}
