//! Scalar statistics over plain `f64` slices.

use crate::helpers::simd_helpers::sum_f64;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum_f64(values) / values.len() as f64)
}

/// Percentile `p` in `[0, 1]` of an ascending slice, interpolating linearly
/// between the two nearest order statistics.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        let frac = idx - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile(&sorted, 0.5)
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation of two equally long samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [40.0, 40.0, 70.0];
        assert_eq!(percentile(&sorted, 0.0), Some(40.0));
        assert_eq!(percentile(&sorted, 0.5), Some(40.0));
        assert_eq!(percentile(&sorted, 1.0), Some(70.0));
        assert!(close(percentile(&sorted, 0.75).unwrap(), 55.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[30.0, 10.0]), Some(20.0));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_sample_std() {
        assert!(close(sample_std(&[10.0, 30.0]).unwrap(), 200f64.sqrt()));
        assert_eq!(sample_std(&[50.0]), None);
    }

    #[test]
    fn test_pearson() {
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0));
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0));
        assert_eq!(pearson(&[1.0, 1.0], &[1.0, 2.0]), None);
    }
}
