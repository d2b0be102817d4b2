//! ARM DSP saturation instructions with pure-Rust fallbacks.
//!
//! On `thumbv7em` targets (Cortex-M4/M7 with DSP extension) these compile to
//! a single `SSAT`. Host builds and tests use the portable path.

/// Signed saturate after an arithmetic right shift.
///
/// Computes `saturate(val >> RSHIFT)` into a `BITS`-wide signed range. Both
/// parameters are const because `SSAT` takes them as immediates.
#[inline(always)]
pub fn signed_saturate_rshift<const BITS: u32, const RSHIFT: u32>(val: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #{bits}, {val}, asr #{rshift}",
                out = out(reg) out,
                val = in(reg) val,
                bits = const BITS,
                rshift = const RSHIFT,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        let shifted = val >> RSHIFT;
        let max = (1i32 << (BITS - 1)) - 1;
        let min = -(1i32 << (BITS - 1));
        shifted.clamp(min, max)
    }
}

/// Saturate an `i32` into the `i16` sample range.
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as i16
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        val.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}
