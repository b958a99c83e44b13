//! Level conversions and denormal handling.
//!
//! # Level Conversions
//!
//! - [`decibels_to_gain`] / [`gain_to_decibels`] - dB ⇄ linear with a silence floor
//!
//! # Denormals
//!
//! Recursive filters decaying toward silence drift into subnormal floats, which
//! are dramatically slower on most CPUs. Every stateful stage flushes its state
//! with [`snap_to_zero`] after each block.

use crate::Sample;

/// Level (in dB) treated as silence by the conversion functions.
pub const MINUS_INFINITY_DB: f64 = -100.0;

/// Convert decibels to linear gain.
///
/// Values at or below `floor_db` map to exactly zero.
///
/// # Example
/// ```rust
/// use ballast_core::decibels_to_gain;
///
/// assert!((decibels_to_gain(0.0_f32, -100.0) - 1.0).abs() < 1e-6);
/// assert!((decibels_to_gain(-6.0_f64, -100.0) - 0.501187).abs() < 1e-6);
/// assert_eq!(decibels_to_gain(-120.0_f32, -100.0), 0.0);
/// ```
#[inline]
pub fn decibels_to_gain<T: Sample>(db: T, floor_db: f64) -> T {
    let db = db.to_f64();
    if db > floor_db {
        T::from_f64(libm::pow(10.0, db * 0.05))
    } else {
        T::ZERO
    }
}

/// Convert linear gain to decibels, clamped below at `floor_db`.
///
/// # Example
/// ```rust
/// use ballast_core::gain_to_decibels;
///
/// assert!(gain_to_decibels(1.0_f64, -100.0).abs() < 1e-12);
/// assert!((gain_to_decibels(0.5_f32, -100.0) - (-6.0206)).abs() < 1e-3);
/// assert_eq!(gain_to_decibels(0.0_f32, -100.0), -100.0);
/// ```
#[inline]
pub fn gain_to_decibels<T: Sample>(gain: T, floor_db: f64) -> T {
    let gain = gain.to_f64();
    if gain > 0.0 {
        T::from_f64((20.0 * libm::log10(gain)).max(floor_db))
    } else {
        T::from_f64(floor_db)
    }
}

/// Flush a value to zero if its magnitude is below [`Sample::SNAP_THRESHOLD`].
///
/// Catches every subnormal as well as values far below audibility.
#[inline]
pub fn snap_to_zero<T: Sample>(value: &mut T) {
    if value.abs() < T::SNAP_THRESHOLD {
        *value = T::ZERO;
    }
}

/// Round `n` up to the next power of two (minimum 1).
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
