use statwatch_daemon::collector::{CpuJiffies, InterfaceInstantStats, ProcessStats};
use statwatch_daemon::error::StatsError;
use statwatch_daemon::stats::{
    cpu_percentages, digest, instant_rate, io_rates, linear_regression, mean, periodic_regression,
    process_cpu_percent, stddev, InstantRate,
};
use std::time::Duration;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
}

#[test]
fn test_mean_is_order_independent() {
    let values = [3.0, 1.5, 9.0, 4.5];
    assert_close(mean(&values).unwrap(), 18.0 / 4.0);
    let reordered = [9.0, 4.5, 3.0, 1.5];
    assert_close(mean(&reordered).unwrap(), mean(&values).unwrap());
}

#[test]
fn test_mean_of_empty_history_fails() {
    assert_eq!(mean(&[]), Err(StatsError::EmptyHistory));
}

#[test]
fn test_instant_rate() {
    assert_close(instant_rate(7.0, 7.0), 0.0);
    assert_close(instant_rate(-3.0, -3.0), 0.0);
    assert_close(instant_rate(10.0, 5.0), 100.0);
    assert_close(instant_rate(5.0, 10.0), -50.0);
    assert_eq!(instant_rate(1.0, 0.0), f64::INFINITY);
}

#[test]
fn test_stddev() {
    assert_close(stddev(&[4.2, 4.2, 4.2], 4.2).unwrap(), 0.0);
    // population deviation of 2,4,4,4,5,5,7,9 is exactly 2
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert_close(stddev(&values, mean(&values).unwrap()).unwrap(), 2.0);
    assert_eq!(stddev(&[], 0.0), Err(StatsError::EmptyHistory));
}

#[test]
fn test_linear_regression() {
    let (slope, intercept) = linear_regression(&[0.0, 1.0, 2.0, 3.0], &[0.0, 2.0, 4.0, 6.0]).unwrap();
    assert!((slope - 2.0).abs() < 1e-9);
    assert!(intercept.abs() < 1e-9);
}

#[test]
fn test_linear_regression_with_timestamp_abscissas() {
    let xs = [1.7e9, 1.7e9 + 1.0, 1.7e9 + 2.0, 1.7e9 + 3.0];
    let (slope, intercept) = linear_regression(&xs, &[0.0, 2.0, 4.0, 6.0]).unwrap();
    assert!((slope - 2.0).abs() < 1e-9, "slope {}", slope);
    assert!((intercept + 3.4e9).abs() < 1e-3, "intercept {}", intercept);
}

#[test]
fn test_periodic_regression_with_large_values() {
    let values: Vec<f64> = (0..4).map(|i| 1e12 + 0.5 * f64::from(i)).collect();
    let (slope, intercept) = periodic_regression(&values).unwrap();
    assert!((slope - 0.5).abs() < 1e-9, "slope {}", slope);
    assert!((intercept - 1e12).abs() < 1e-3, "intercept {}", intercept);
    let trend = digest(&values).unwrap().slope().unwrap();
    assert!((trend - 0.5).abs() < 1e-9, "digest slope {}", trend);
}

#[test]
fn test_linear_regression_preconditions() {
    assert_eq!(
        linear_regression(&[0.0, 1.0, 2.0], &[1.0, 2.0]),
        Err(StatsError::LengthMismatch { xs: 3, ys: 2 })
    );
    assert_eq!(linear_regression(&[1.0], &[1.0]), Err(StatsError::TooFewPoints(1)));
}

#[test]
fn test_periodic_regression_uses_sample_index() {
    let (slope, intercept) = periodic_regression(&[10.0, 8.0, 6.0, 4.0]).unwrap();
    assert_close(slope, -2.0);
    assert_close(intercept, 10.0);
}

#[test]
fn test_digest_single_value() {
    let result = digest(&[5.0]).unwrap();
    assert_close(result.mean, 5.0);
    assert!(result.rate.is_none());
    assert!(result.regression.is_none());
    assert!(result.stddev.is_none());
}

#[test]
fn test_digest_two_values() {
    let result = digest(&[5.0, 10.0]).unwrap();
    assert_close(result.mean, 7.5);
    assert_eq!(result.rate, Some(InstantRate::Finite(100.0)));
    let (slope, intercept) = result.regression.unwrap();
    assert_close(slope, 5.0);
    assert_close(intercept, 5.0);
    assert_close(result.stddev.unwrap(), 2.5);
}

#[test]
fn test_digest_from_zero_baseline_is_unbounded() {
    let result = digest(&[0.0, 0.0, 3.0]).unwrap();
    assert_eq!(result.rate, Some(InstantRate::Unbounded));
    assert_eq!(result.rate.unwrap().as_f64(), f64::INFINITY);
    // computed zero is not the same as not computable
    let flat = digest(&[2.0, 2.0]).unwrap();
    assert_eq!(flat.rate, Some(InstantRate::Finite(0.0)));
}

#[test]
fn test_digest_of_empty_history_fails() {
    assert_eq!(digest(&[]), Err(StatsError::EmptyHistory));
}

#[test]
fn test_digest_serializes_unbounded_rate() {
    let result = digest(&[0.0, 1.0]).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["rate"]["kind"], "unbounded");
    let single = serde_json::to_value(digest(&[1.0]).unwrap()).unwrap();
    assert!(single["rate"].is_null());
}

#[test]
fn test_cpu_percentages() {
    let before = [
        CpuJiffies { work: 10.0, idle: 10.0 },
        CpuJiffies { work: 5.0, idle: 5.0 },
    ];
    let after = [
        CpuJiffies { work: 13.0, idle: 11.0 },
        CpuJiffies { work: 5.0, idle: 5.0 },
    ];
    let percentages = cpu_percentages(&before, &after);
    assert_eq!(percentages.len(), 2);
    assert_close(percentages[0], 75.0);
    // no elapsed time
    assert_close(percentages[1], 0.0);
}

#[test]
fn test_io_rates() {
    let mut before = InterfaceInstantStats::new();
    before.insert("eth0".to_string(), (1024, 2048));
    before.insert("wlan0".to_string(), (5000, 5000));
    before.insert("gone0".to_string(), (1, 1));
    let mut after = InterfaceInstantStats::new();
    after.insert("eth0".to_string(), (1024 + 4096, 2048));
    after.insert("wlan0".to_string(), (10, 6000));
    after.insert("new0".to_string(), (1, 1));

    let rates = io_rates(&before, &after, Duration::from_secs(2));
    assert_eq!(rates.len(), 1, "wrapped and unmatched interfaces are skipped");
    let (recv, sent) = rates["eth0"];
    assert_close(recv, 2.0);
    assert_close(sent, 0.0);

    assert!(io_rates(&before, &after, Duration::ZERO).is_empty());
}

#[test]
fn test_process_cpu_percent() {
    let before = ProcessStats { work: 10.0, memory: 1.0 };
    let after = ProcessStats { work: 12.5, memory: 1.0 };
    assert_close(process_cpu_percent(&before, &after, 5.0), 50.0);
    assert_close(process_cpu_percent(&before, &after, 0.0), 0.0);
    // pid reused by a younger process
    assert_close(process_cpu_percent(&after, &before, 5.0), 0.0);
}
