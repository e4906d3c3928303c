pub mod dates;
pub mod simd_helpers;
pub mod stats;
