use std::time::Duration;

use crate::record::RequestRecord;

/// Availability and latency figures derived from an ordered record list.
/// Timing fields are `None` when no request succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub success_count: usize,
    pub failure_count: usize,
    /// Percentage rounded to one decimal place.
    pub availability_pct: f64,
    pub avg_duration: Option<Duration>,
    pub min_duration: Option<Duration>,
    pub max_duration: Option<Duration>,
}

pub fn aggregate(records: &[RequestRecord]) -> Summary {
    let successes: Vec<Duration> = records
        .iter()
        .filter(|r| r.is_success())
        .map(|r| r.duration)
        .collect();

    let success_count = successes.len();
    let failure_count = records.len() - success_count;

    let availability_pct = if records.is_empty() {
        0.0
    } else {
        round_one_decimal(success_count as f64 / records.len() as f64 * 100.0)
    };

    let avg_duration = (!successes.is_empty()).then(|| {
        let total: f64 = successes.iter().map(Duration::as_secs_f64).sum();
        Duration::from_secs_f64(total / success_count as f64)
    });

    Summary {
        success_count,
        failure_count,
        availability_pct,
        avg_duration,
        min_duration: successes.iter().min().copied(),
        max_duration: successes.iter().max().copied(),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
