//! The public surface: `EncoderConfig`/`Encoder`. Grounded on
//! `vorbis_encode_init`/`vorbis_analysis_headerout` in `vorbisenc.c`/
//! `info.c`, minus their Ogg packet/page machinery -- this crate hands
//! back raw header bytes (an `ffmpeg`-style "extradata" blob) and raw
//! audio packet bytes, leaving container framing to the caller.

use std::io;

use crate::*;
use codec::{BlockTables, PacketOrchestrator, EncodedPacket};
use headers::{VorbisIdentificationHeader, VorbisCommentHeader, VorbisSetupHeader};
use bitwise::{BitWriter, BitWriterCursor};
use io_utils::CursorVecU8;

/// Configuration for a new [`Encoder`]: channel count, sample rate, and
/// encoding quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderConfig {
    pub channels: u8,
    pub sample_rate: u32,
    quality: Option<f32>,
}

impl EncoderConfig {
    /// Mono or stereo PCM at `sample_rate`, default quality.
    pub fn new(channels: u8, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            quality: None,
        }
    }

    /// `quality` in `(0.0, 10.0]`; the encoder uses `quality²` internally.
    /// Values outside the range are clamped.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality.clamp(f32::MIN_POSITIVE, 10.0));
        self
    }

    /// This crate's internal fit-tolerance knob: the external quality
    /// scalar squared, per this crate's external interface contract.
    fn quality_squared(&self) -> f32 {
        let q = self.quality.unwrap_or(8.0);
        q * q
    }
}

/// A Vorbis I encoder: buffers planar `f32` PCM and emits Vorbis audio
/// packets, plus a decoder-ready header blob built once at construction.
pub struct Encoder {
    config: EncoderConfig,
    tables: BlockTables,
    orchestrator: PacketOrchestrator,
    extradata: Vec<u8>,
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Result<Self, EncoderError> {
        if !(1..=2).contains(&config.channels) {
            return Err(EncoderError::UnsupportedConfig(format!(
                "only mono or stereo is supported, got {} channels", config.channels
            )));
        }

        let short_size = 1i32 << codec::LOG2_SHORT_BLOCK;
        let long_size = 1i32 << codec::LOG2_LONG_BLOCK;
        let tables = BlockTables::new(config.channels as i32, short_size / 2, long_size / 2)?;
        let orchestrator = PacketOrchestrator::new(config.channels as usize, config.sample_rate as i32);
        let extradata = build_extradata(&config, &tables)?;

        Ok(Self {
            config,
            tables,
            orchestrator,
            extradata,
        })
    }

    /// The codec-private blob a container needs to initialize a decoder:
    /// `0x02` marker, two Xiph-laced header lengths, then the
    /// identification, comment, and setup headers concatenated.
    pub fn extradata(&self) -> &[u8] {
        &self.extradata
    }

    /// Queues planar PCM: one `Vec<f32>` per channel, all the same length.
    pub fn push_frames(&mut self, frames: &[Vec<f32>]) -> Result<(), EncoderError> {
        self.orchestrator.push(frames)
    }

    /// Marks the end of input. Subsequent `encode()` calls drain and
    /// zero-pad whatever remains buffered instead of waiting for more.
    pub fn finish(&mut self) {
        self.orchestrator.finish();
    }

    /// Produces the next audio packet, or `None` if more input is needed
    /// (call `push_frames` again) or the stream is fully drained (after
    /// `finish`).
    pub fn encode(&mut self) -> Result<Option<EncodedPacket>, EncoderError> {
        self.orchestrator.encode(&self.tables, self.config.quality_squared())
    }
}

/// Xiph/Vorbis-style length lacing: `floor(len / 255)` bytes of `0xff`
/// followed by one byte holding `len % 255`.
fn xiph_lace(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len / 255 + 1);
    let mut remaining = len;
    while remaining >= 255 {
        out.push(0xff);
        remaining -= 255;
    }
    out.push(remaining as u8);
    out
}

fn pack_to_bytes<F>(f: F) -> io::Result<Vec<u8>>
where
    F: FnOnce(&mut BitWriterCursor) -> io::Result<usize>,
{
    let mut writer = BitWriter::new(CursorVecU8::default());
    f(&mut writer)?;
    Ok(writer.into_bytes())
}

fn build_extradata(config: &EncoderConfig, tables: &BlockTables) -> Result<Vec<u8>, EncoderError> {
    let ident = VorbisIdentificationHeader {
        version: 0,
        channels: config.channels as i32,
        sample_rate: config.sample_rate as i32,
        bitrate_upper: 0,
        bitrate_nominal: 0,
        bitrate_lower: 0,
        block_size: [1 << codec::LOG2_SHORT_BLOCK, 1 << codec::LOG2_LONG_BLOCK],
    };
    let comment = VorbisCommentHeader::new();
    let setup = VorbisSetupHeader {
        static_codebooks: tables.static_codebooks.clone(),
        floors: tables.floors.to_vec(),
        residues: tables.residues.to_vec(),
        maps: tables.mappings.to_vec(),
        modes: tables.modes.clone(),
    };

    let ident_bytes = pack_to_bytes(|w| ident.pack(w))?;
    let comment_bytes = pack_to_bytes(|w| comment.pack(w))?;
    let setup_bytes = pack_to_bytes(|w| setup.pack(w, &ident))?;

    let mut out = Vec::with_capacity(1 + 4 + ident_bytes.len() + comment_bytes.len() + setup_bytes.len());
    out.push(0x02);
    out.extend(xiph_lace(ident_bytes.len()));
    out.extend(xiph_lace(comment_bytes.len()));
    out.extend_from_slice(&ident_bytes);
    out.extend_from_slice(&comment_bytes);
    out.extend_from_slice(&setup_bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xiph_lace_handles_multiples_of_255() {
        assert_eq!(xiph_lace(0), vec![0]);
        assert_eq!(xiph_lace(254), vec![254]);
        assert_eq!(xiph_lace(255), vec![255, 0]);
        assert_eq!(xiph_lace(510), vec![255, 255, 0]);
        assert_eq!(xiph_lace(512), vec![255, 255, 2]);
    }

    #[test]
    fn mono_encoder_builds_extradata_with_marker_byte() {
        let cfg = EncoderConfig::new(1, 44100);
        let enc = Encoder::new(cfg).expect("template tables must build");
        assert_eq!(enc.extradata()[0], 0x02);
        assert!(enc.extradata().len() > 10);
    }

    #[test]
    fn rejects_unsupported_channel_counts() {
        let cfg = EncoderConfig::new(6, 44100);
        assert!(Encoder::new(cfg).is_err());
    }

    #[test]
    fn stereo_encoder_round_trips_a_short_buffer() {
        let cfg = EncoderConfig::new(2, 44100).with_quality(4.0);
        let mut enc = Encoder::new(cfg).expect("template tables must build");
        enc.push_frames(&[vec![0.1f32; 3000], vec![-0.1f32; 3000]]).unwrap();
        enc.finish();
        let mut packets = Vec::new();
        while let Some(p) = enc.encode().unwrap() {
            packets.push(p);
        }
        assert!(!packets.is_empty());
    }
}
