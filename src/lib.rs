mod bitwise;
mod utils;
mod error;

mod headers;
mod codebook;
mod floor;
mod mapping;
mod residue;
mod scales;
mod mdct;
mod window;
mod psy_transient;
mod templates;
mod codec;
mod highlevel;

pub use utils::*;
pub use bitwise::*;
pub use error::EncoderError;
pub use highlevel::{Encoder, EncoderConfig};

pub const SHOW_DEBUG: bool = false;
pub const DEBUG_ON_READ_BITS: bool = false;
pub const DEBUG_ON_WRITE_BITS: bool = false;
pub const PANIC_ON_ERROR: bool = false;

/// End-to-end scenarios that don't need a reference decoder to check
/// (mirroring this crate's S1/S5/S6-style coverage; S2-S4 need a decoder
/// to verify decoded amplitude/RMS or a pinned bit-exact digest, neither
/// of which this crate can produce since it ships no decoder).
#[cfg(test)]
mod tests {
    use super::*;

    /// S1-style: mono silence flushes cleanly and the extradata blob is
    /// well-formed.
    #[test]
    fn mono_silence_flushes_without_error() {
        let mut enc = Encoder::new(EncoderConfig::new(1, 44100)).unwrap();
        assert_eq!(enc.extradata()[0], 0x02);

        enc.push_frames(&[vec![0.0f32; 4096]]).unwrap();
        enc.finish();

        let mut total_samples = 0usize;
        let mut packet_count = 0usize;
        while let Some(packet) = enc.encode().unwrap() {
            assert!(!packet.data.is_empty());
            total_samples += packet.samples;
            packet_count += 1;
        }
        assert!(packet_count > 0);
        assert!(total_samples >= 4096);
    }

    /// S5-style: a partial final frame is zero-padded and reported via
    /// `skip_samples` rather than silently dropped.
    #[test]
    fn flushing_a_partial_frame_reports_skip_samples() {
        let mut enc = Encoder::new(EncoderConfig::new(1, 44100)).unwrap();
        enc.push_frames(&[vec![0.1f32; 1500]]).unwrap();
        enc.finish();

        let mut total_skip = 0usize;
        let mut total_samples = 0usize;
        while let Some(packet) = enc.encode().unwrap() {
            total_samples += packet.samples;
            total_skip += packet.skip_samples.unwrap_or(0);
        }
        assert!(total_samples >= 1500);
        assert_eq!(total_samples - total_skip, 1500);
    }

    /// S6-style: submitting less than one input frame and encoding without
    /// flushing produces no packet and no error.
    #[test]
    fn buffer_starvation_returns_none_without_flushing() {
        let mut enc = Encoder::new(EncoderConfig::new(1, 44100)).unwrap();
        enc.push_frames(&[vec![0.0f32; 63]]).unwrap();
        assert!(enc.encode().unwrap().is_none());
    }
}
