#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _mm256_add_pd, _mm256_loadu_pd, _mm256_max_pd, _mm256_min_pd, _mm256_set1_pd,
    _mm256_setzero_pd, _mm256_storeu_pd,
};

/// Range of a slice of finite floats, `None` when empty
pub fn min_max_f64(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return Some(unsafe { min_max_f64_avx2(values) });
        }
    }

    Some(min_max_f64_scalar(values))
}

/// Sum of a slice of floats using AVX2 when available
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }

    values.iter().sum()
}

fn min_max_f64_scalar(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn min_max_f64_avx2(values: &[f64]) -> (f64, f64) {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut min = _mm256_set1_pd(f64::INFINITY);
    let mut max = _mm256_set1_pd(f64::NEG_INFINITY);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        min = _mm256_min_pd(min, v);
        max = _mm256_max_pd(max, v);
    }

    let mut min_arr = [f64::INFINITY; LANES];
    let mut max_arr = [f64::NEG_INFINITY; LANES];
    unsafe { _mm256_storeu_pd(min_arr.as_mut_ptr(), min) };
    unsafe { _mm256_storeu_pd(max_arr.as_mut_ptr(), max) };

    let (rest_min, rest_max) = min_max_f64_scalar(remainder);
    let lanes_min = min_arr.iter().copied().fold(rest_min, f64::min);
    let lanes_max = max_arr.iter().copied().fold(rest_max, f64::max);
    (lanes_min, lanes_max)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4;
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    sum_arr.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}
