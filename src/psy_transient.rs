#![allow(dead_code)]
use std::f32::consts::PI;

/// * A single second-order (biquad) IIR stage, Direct Form II, normalized so
/// * the feedback coefficients sum to unity gain at DC. Mirrors
/// * `biquad_filter_init`/`apply_filter` in `vorbispsy.c`; this crate ships no
/// * decoder, so (unlike a real highpass design this would be checked against
/// * a reference) only the cascade's qualitative behavior — attenuate the
/// * signal below the cutoff, pass everything above it — needs to hold.
#[derive(Clone, Copy, Debug, Default)]
struct IirFilter {
    b: [f32; 3],
    a: [f32; 3],
}

impl IirFilter {
    fn new(q: f32, crit_freq: f32, sample_rate: f32) -> Self {
        let k = (PI * crit_freq / sample_rate).tan();
        let norm = 1.0 / (1.0 + k / q + k * k);
        Self {
            b: [norm, -2.0 * norm, norm],
            a: [1.0, 2.0 * (k * k - 1.0) * norm, (1.0 - k / q + k * k) * norm],
        }
    }

    /// * `delay` holds `[w[n-1], w[n-2]]` and is updated in place.
    fn apply(&self, delay: &mut [f32; 2], x: f32) -> f32 {
        let w = self.a[0] * x - self.a[1] * delay[0] - self.a[2] * delay[1];
        let y = self.b[0] * w + self.b[1] * delay[0] + self.b[2] * delay[1];
        delay[1] = delay[0];
        delay[0] = w;
        y
    }
}

/// * Sample variance of a slice, matching `variance()` in `vorbispsy.c`
/// * (divides by `length - 1`, not `length`).
fn variance(samples: &[f32]) -> f32 {
    let length = samples.len();
    if length < 2 {
        return 0.0;
    }
    let mut sum = 0.0f32;
    let mut square_sum = 0.0f32;
    for &s in samples {
        sum += s;
        square_sum += s * s;
    }
    let mean = sum / length as f32;
    (square_sum - length as f32 * mean * mean) / (length - 1) as f32
}

const PREECHO_THRESH: f32 = 100.0;
const EPS: f32 = 1e-4;
const Q1: f32 = 0.54;
const Q2: f32 = 1.31;

/// * Per-channel cascaded-biquad pre-echo/transient detector. Decides,
/// * once per long frame, whether the next block should be short, by
/// * comparing the variance of consecutive short-sized sub-blocks of the
/// * highpass-filtered signal. Grounded on `VorbisPsyContext`/
/// * `ff_psy_vorbis_block_frame` in `vorbispsy.c`/`vorbispsy.h`; chosen over
/// * the teacher's unfinished `psy.rs`/`envelope.rs` masking-curve model
/// * (whose constructor is an empty stub) since this spec only asks for a
/// * short/long block decision, not full noise-floor masking.
pub struct TransientDetector {
    filters: [IirFilter; 2],
    /// per channel, per cascade stage: `[w[n-1], w[n-2]]`
    delay: Vec<[[f32; 2]; 2]>,
    /// per channel, per sub-block position: that position's variance from
    /// the previous call. Compared position-for-position across calls
    /// (never to the adjacent position within the same call), mirroring
    /// `vorbispsy.c`'s per-`(channel, block-index)` `var[i]`/`last_var`
    /// bookkeeping.
    last_var: Vec<Vec<f32>>,
    short_size: usize,
}

impl TransientDetector {
    pub fn new(channels: usize, sample_rate: i32, short_size: usize) -> Self {
        let crit_freq = sample_rate as f32 / 4.0;
        let fs = sample_rate as f32;
        Self {
            filters: [
                IirFilter::new(Q1, crit_freq, fs),
                IirFilter::new(Q2, crit_freq, fs),
            ],
            delay: vec![[[0.0; 2]; 2]; channels],
            last_var: vec![Vec::new(); channels],
            short_size,
        }
    }

    /// * Runs one channel's long-frame samples through both filter stages and
    /// * returns whether any short-sized sub-block looks transient relative
    /// * to its own position's variance in the previous call. `frame.len()`
    /// * must be a multiple of `short_size`.
    fn channel_is_short(&mut self, ch: usize, frame: &[f32]) -> bool {
        let mut filtered = vec![0.0f32; frame.len()];
        for (i, &x) in frame.iter().enumerate() {
            let mut v = x;
            for (stage, filter) in self.filters.iter().enumerate() {
                v = filter.apply(&mut self.delay[ch][stage], v);
            }
            filtered[i] = v;
        }

        let num_blocks = filtered.len() / self.short_size;
        if self.last_var[ch].len() != num_blocks {
            self.last_var[ch] = vec![0.0; num_blocks];
        }

        let mut is_short = false;
        for (i, block) in filtered.chunks(self.short_size).enumerate() {
            let var = variance(block);
            if var > PREECHO_THRESH * self.last_var[ch][i] + EPS {
                is_short = true;
            }
            self.last_var[ch][i] = var;
        }
        is_short
    }

    /// * Combines every channel's decision: if any channel wants a short
    /// * block, the whole frame is coded short.
    pub fn detect(&mut self, channels: &[Vec<f32>]) -> bool {
        let mut any_short = false;
        for (ch, frame) in channels.iter().enumerate() {
            if self.channel_is_short(ch, frame) {
                any_short = true;
            }
        }
        any_short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_never_triggers_short() {
        let mut det = TransientDetector::new(1, 44100, 256);
        let frame = vec![vec![0.0f32; 2048]];
        assert!(!det.detect(&frame));
    }

    #[test]
    fn sudden_loud_onset_triggers_short() {
        let mut det = TransientDetector::new(1, 44100, 256);
        let mut samples = vec![0.0f32; 2048];
        // first half silent, second half a sharp onset: a strong transient
        // partway through a frame should be visible as an increase in
        // sub-block variance.
        for s in samples[1024..].iter_mut() {
            *s = 0.9;
        }
        let frame = vec![samples];
        assert!(det.detect(&frame));
    }

    #[test]
    fn steady_tone_does_not_trigger_after_settling() {
        let mut det = TransientDetector::new(1, 44100, 256);
        let mut samples = vec![0.0f32; 2048];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = (i as f32 * 0.1).sin() * 0.5;
        }
        // run once to let the filter state settle, then check a second
        // identical frame doesn't look transient relative to the first.
        det.detect(&[samples.clone()]);
        assert!(!det.detect(&[samples]));
    }
}
