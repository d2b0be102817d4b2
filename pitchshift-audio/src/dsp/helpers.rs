//! Q15 coefficients and float/sample conversion shared by the effect stages.

/// Q15 representation of 1.0 (exclusive upper bound of the i16 range).
pub const Q15_ONE: i32 = 1 << 15;

/// Clamp to `[0.0, 1.0]`; NaN reads as 0.
#[inline]
pub fn unit_clamp(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Convert a coefficient in `[0.0, 1.0]` to Q15, clamping out-of-range input.
#[inline]
pub fn coefficient_q15(value: f32) -> i32 {
    (unit_clamp(value) * Q15_ONE as f32) as i32
}

/// Round a float sample to the nearest `i16`, saturating at the rails.
#[inline(always)]
pub fn sample_from_f32(value: f32) -> i16 {
    let rounded = if value >= 0.0 { value + 0.5 } else { value - 0.5 };
    if rounded >= i16::MAX as f32 {
        i16::MAX
    } else if rounded <= i16::MIN as f32 {
        i16::MIN
    } else {
        rounded as i16
    }
}
