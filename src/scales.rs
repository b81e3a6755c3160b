#![allow(dead_code)]
use std::mem::transmute;

/// * Vorbis's own 32-bit float format, used nowhere but codebook `q_min`/
/// * `q_delta`: sign bit 31, exponent (biased by 788, already shifted down
/// * by the 20 mantissa bits borrowed from `ldexp`) in bits 21..30, 21-bit
/// * mantissa in bits 0..20. Mirrors `put_float()`.
pub fn vorbis_float32_pack(f: f32) -> u32 {
    if f == 0.0 {
        return 0;
    }
    let (frac, exp) = libm::frexpf(f);
    let mut mant = libm::ldexpf(frac, 20) as i32;
    let exp = exp + 788 - 20;
    let mut sign = 0u32;
    if mant < 0 {
        sign = 1u32 << 31;
        mant = -mant;
    }
    sign | (mant as u32 & 0x1f_ffff) | ((exp as u32) << 21)
}

/// * Inverse of [`vorbis_float32_pack`]. Mirrors `float32_unpack()`.
pub fn vorbis_float32_unpack(val: u32) -> f32 {
    let mant = (val & 0x1f_ffff) as i64;
    let sign = val & 0x8000_0000 != 0;
    let exp = ((val & 0x7fe0_0000) >> 21) as i32 - 788;
    let ret = if sign { -(mant as f64) } else { mant as f64 };
    libm::ldexp(ret, exp) as f32
}

#[inline(always)]
pub fn unitnorm(x: f32) -> f32 {
	let mut i: u32 = unsafe {transmute(x)};
	i = (i & 0x80000000) | 0x3f800000;
	unsafe {transmute(i)}
}

/// * Convert dB to gain
#[inline(always)]
#[allow(non_snake_case)]
pub fn todB(x: &f32) -> f32 {
	let mut i: u32 = unsafe {transmute(*x)};
	i &= 0x7FFFFFFF;
	i as f32 * 7.17711438e-7 - 764.6161886
}

/// * Convert gain to dB
#[inline(always)]
#[allow(non_snake_case)]
pub fn fromdB(x: f32) -> f32 {
    (x * 0.11512925).exp()
}

/* The bark scale equations are approximations, since the original
   table was somewhat hand rolled.  The below are chosen to have the
   best possible fit to the rolled tables, thus their somewhat odd
   appearance (these are more accurate and over a longer range than
   the oft-quoted bark equations found in the texts I have).  The
   approximations are valid from 0 - 30kHz (nyquist) or so.

   all f in Hz, z in Bark */

#[inline(always)]
#[allow(non_snake_case)]
pub fn toBARK(n: f32) -> f32 {
	13.1 * (n * 0.00074).atan()+2.24 * (n * n * 1.85e-8).atan() + 1e-4 * n
}

#[inline(always)]
#[allow(non_snake_case)]
pub fn fromBARK(z: f32) -> f32 {
	102.0 * z - 2.0 * z.powf(2.0) + 0.4 * z.powf(3.0) + 1.46_f32.powf(z) - 1.0
}

#[inline(always)]
#[allow(non_snake_case)]
pub fn toMEL(n: f32) -> f32 {
	(1.0 + n * 0.001).ln() * 1442.695
}

#[inline(always)]
#[allow(non_snake_case)]
pub fn fromMEL(m: f32) -> f32 {
	1000.0 * (m / 1442.695).exp() - 1000.0
}

/* Frequency to octave.  We arbitrarily declare 63.5 Hz to be octave
   0.0 */

#[inline(always)]
#[allow(non_snake_case)]
pub fn toOC(n: f32) -> f32 {
	n.ln() * 1.442695 - 5.965784
}

#[inline(always)]
#[allow(non_snake_case)]
pub fn fromOC(o: f32) -> f32 {
	((o + 5.965784) * 0.693147).exp()
}
