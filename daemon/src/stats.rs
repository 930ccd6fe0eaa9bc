//! Statistics over a history of scalar measurements
//!
//! Everything here is a pure function of its input: histories are borrowed
//! for the duration of the call and never modified.

pub mod regression;

use crate::collector::{CpuJiffies, InterfaceInstantStats, ProcessStats};
use crate::error::StatsError;
use regression::{DefaultLeastSquares, LeastSquares};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Percentage change between the two most recent values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InstantRate {
    Finite(f64),
    /// Growth from a zero baseline.
    Unbounded,
}

impl InstantRate {
    pub fn as_f64(&self) -> f64 {
        match self {
            InstantRate::Finite(value) => *value,
            InstantRate::Unbounded => f64::INFINITY,
        }
    }
}

impl From<f64> for InstantRate {
    fn from(value: f64) -> Self {
        if value.is_infinite() {
            InstantRate::Unbounded
        } else {
            InstantRate::Finite(value)
        }
    }
}

/// Mean, instant rate, linear trend and spread of a history.
///
/// Everything but `mean` is `None` until the history holds two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDigest {
    pub mean: f64,
    pub rate: Option<InstantRate>,
    /// (slope, intercept) against the sample index.
    pub regression: Option<(f64, f64)>,
    pub stddev: Option<f64>,
}

impl StatDigest {
    pub fn slope(&self) -> Option<f64> {
        self.regression.map(|(slope, _)| slope)
    }
}

pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyHistory);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// `100 * latest / previous - 100`, or +∞ when `previous` is zero.
pub fn instant_rate(latest: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        f64::INFINITY
    } else {
        100.0 * latest / previous - 100.0
    }
}

/// Population standard deviation around `avg`.
///
/// `avg` must be the mean of `values`; this is not checked.
pub fn stddev(values: &[f64], avg: f64) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyHistory);
    }
    let squares: f64 = values.iter().map(|x| (x - avg).powi(2)).sum();
    Ok((squares / values.len() as f64).sqrt())
}

/// Least-squares line through `(xs[i], ys[i])`, as `(slope, intercept)`.
///
/// All-equal `xs` leave the slope undefined (NaN or infinite); callers
/// must not pass them.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(StatsError::TooFewPoints(xs.len()));
    }
    DefaultLeastSquares::fit(xs, ys)
}

/// Regression of equally spaced values against their index.
pub fn periodic_regression(values: &[f64]) -> Result<(f64, f64), StatsError> {
    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    linear_regression(&xs, values)
}

pub fn digest(history: &[f64]) -> Result<StatDigest, StatsError> {
    let avg = mean(history)?;
    let mut result = StatDigest {
        mean: avg,
        rate: None,
        regression: None,
        stddev: None,
    };
    if let [.., previous, latest] = history {
        result.rate = Some(instant_rate(*latest, *previous).into());
        result.regression = Some(periodic_regression(history)?);
        result.stddev = Some(stddev(history, avg)?);
    }
    Ok(result)
}

/// Busy percentage of each entry between two CPU samples.
///
/// Entries are paired by position; a CPU with no elapsed time reads 0.
pub fn cpu_percentages(previous: &[CpuJiffies], current: &[CpuJiffies]) -> Vec<f64> {
    previous
        .iter()
        .zip(current)
        .map(|(before, after)| {
            let work = after.work - before.work;
            let total = after.total() - before.total();
            if total > 0.0 {
                (100.0 * work / total).clamp(0.0, 100.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Received and sent kilobytes per second for every interface present in
/// both samples.
///
/// Interfaces whose counters decreased (wrap-around or reset) are left out.
pub fn io_rates(
    previous: &InterfaceInstantStats,
    current: &InterfaceInstantStats,
    elapsed: Duration,
) -> HashMap<String, (f64, f64)> {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return HashMap::new();
    }
    current
        .iter()
        .filter_map(|(name, &(recv, sent))| {
            let &(prev_recv, prev_sent) = previous.get(name)?;
            let recv = recv.checked_sub(prev_recv)?;
            let sent = sent.checked_sub(prev_sent)?;
            Some((
                name.clone(),
                (recv as f64 / 1024.0 / seconds, sent as f64 / 1024.0 / seconds),
            ))
        })
        .collect()
}

/// CPU used by a process between two samples, in percent of one core.
///
/// `host_elapsed` is the time elapsed on an average core, i.e. the change of
/// `work + idle` of the whole-machine entry of a JiffiesList.
pub fn process_cpu_percent(previous: &ProcessStats, current: &ProcessStats, host_elapsed: f64) -> f64 {
    let work = current.work - previous.work;
    if host_elapsed <= 0.0 || work < 0.0 {
        return 0.0;
    }
    100.0 * work / host_elapsed
}
