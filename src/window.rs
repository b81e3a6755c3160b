#![allow(dead_code)]
use std::f32::consts::PI;

/// * Generates the standard Vorbis analysis window of a given full length:
/// * `sin(pi/2 * sin(pi/N * (n+0.5))^2)`. Vorbis never tabulates this per
/// * block size the way some codecs do (the window is cheap to regenerate),
/// * so this crate caches one per block size instead of shipping a table.
pub fn generate_window(full_size: usize) -> Vec<f32> {
    (0..full_size).map(|n| {
        let x = (PI / full_size as f32) * (n as f32 + 0.5);
        (0.5 * PI * x.sin() * x.sin()).sin()
    }).collect()
}

/// * The ascending half (length `half_size`) of a full window of length
/// * `2 * half_size`. Used both as the lead-in ramp of a block's own window
/// * and, reversed, as the trail-out ramp.
fn ascending_half(half_size: usize) -> Vec<f32> {
    generate_window(2 * half_size)[..half_size].to_vec()
}

/// * Precomputed half-windows for the two block sizes this crate supports,
/// * built once at `Encoder::new` and reused for every frame.
#[derive(Clone, Debug)]
pub struct Windows {
    pub short_half: Vec<f32>,
    pub long_half: Vec<f32>,
}

impl Windows {
    pub fn new(short_size: usize, long_size: usize) -> Self {
        Self {
            short_half: ascending_half(short_size / 2),
            long_half: ascending_half(long_size / 2),
        }
    }

    fn half_for(&self, half_size: usize) -> &[f32] {
        if self.short_half.len() == half_size {
            &self.short_half
        } else if self.long_half.len() == half_size {
            &self.long_half
        } else {
            // a split short sub-block inside a long frame still uses the
            // short window, since its half-size always matches short_half.
            &self.short_half
        }
    }

    /// * Applies the three-region overlap-add window described for this
    /// * block (current half-size `cur_half`, with neighbor half-sizes
    /// * `prev_half`/`next_half` taken from the adjacent blocks' block
    /// * flags) to `pcm` (exactly `2 * cur_half` samples), and scales by
    /// * `1 / 2^(log2_block - 2)`. Mirrors `apply_window` in the original
    /// * encoder, generalized to owned half-window tables instead of a
    /// * fixed pair of global window arrays.
    pub fn apply(&self, pcm: &[f32], cur_half: usize, prev_half: usize, next_half: usize, log2_block: u32) -> Vec<f32> {
        assert_eq!(pcm.len(), 2 * cur_half);
        let mut out = vec![0.0f32; 2 * cur_half];

        let lead_start = cur_half - prev_half / 2;
        let lead_end = lead_start + prev_half;
        let prev_win = self.half_for(prev_half);
        for (i, slot) in out[lead_start..lead_end].iter_mut().enumerate() {
            *slot = pcm[lead_start + i] * prev_win[i];
        }

        let mid_end = cur_half + cur_half / 2 - next_half / 2;
        for i in lead_end..mid_end {
            out[i] = pcm[i];
        }

        let trail_end = mid_end + next_half;
        let next_win = self.half_for(next_half);
        for (i, slot) in out[mid_end..trail_end].iter_mut().enumerate() {
            *slot = pcm[mid_end + i] * next_win[next_half - 1 - i];
        }

        let scale = 1.0f32 / (1u32 << (log2_block - 2)) as f32;
        for v in out.iter_mut() {
            *v *= scale;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_symmetric_and_bounded() {
        let w = generate_window(256);
        assert_eq!(w.len(), 256);
        for &v in w.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((w[0] - w[255]).abs() < 1e-4);
    }

    #[test]
    fn apply_long_long_long_passes_through_middle() {
        let windows = Windows::new(256, 2048);
        let pcm = vec![1.0f32; 2048];
        let out = windows.apply(&pcm, 1024, 1024, 1024, 11);
        // middle samples should be passthrough scaled only by the global factor
        let scale = 1.0f32 / (1u32 << 9) as f32;
        assert!((out[1024] - scale).abs() < 1e-5);
    }
}
