//! Small-sample statistics helpers.
//!
//! Everything here is hand-rolled: the aggregation needs exactly a mean,
//! a sample standard deviation, and a two-sided 95% interval, and no crate
//! in this stack carries a distribution table.

use crate::error::AuditError;

/// Two-tailed 95% standard-normal critical value.
pub const Z_95: f64 = 1.96;

/// Arithmetic mean. 0.0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (N-1 denominator). 0.0 below two samples.
pub fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    variance.sqrt()
}

/// Two-tailed 95% critical values of Student's t, df 1..=30.
const T_95_TABLE: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

/// Two-tailed 95% critical value of Student's t with `df` degrees of
/// freedom. Exact for df 1..=30; above that, steps down to the nearest
/// tabulated df (a conservative, slightly wider interval).
pub fn t_critical_95(df: usize) -> f64 {
    match df {
        0 => f64::NAN,
        1..=30 => T_95_TABLE[df - 1],
        31..=39 => T_95_TABLE[29],
        40..=59 => 2.021,
        60..=119 => 2.000,
        120..=999 => 1.980,
        _ => Z_95,
    }
}

/// Two-sided 95% confidence interval for the mean of `xs` via Student's t
/// with N-1 degrees of freedom and standard error std/sqrt(N).
///
/// Bounds are reported raw; intervals on [0,1]-valued metrics can extend
/// past the unit range and are not clipped here.
pub fn t_confidence_interval_95(xs: &[f64]) -> Result<(f64, f64), AuditError> {
    if xs.len() < 2 {
        return Err(AuditError::insufficient_sample(format!(
            "confidence interval requires at least 2 samples, got {}",
            xs.len()
        )));
    }
    let m = mean(xs);
    let se = sample_std(xs) / (xs.len() as f64).sqrt();
    let t = t_critical_95(xs.len() - 1);
    Ok((m - t * se, m + t * se))
}
