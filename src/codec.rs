#![allow(dead_code)]
//! The packet orchestrator: the per-packet state machine that turns queued
//! planar PCM into Vorbis audio packets. Grounded on `vorbis_analysis`/
//! `vorbis_analysis_blockout` in `analysis.c` and `_vp_tonemask`-adjacent
//! window-selection logic in `vorbispsy.c`, written against this crate's
//! own `EncodeCodebook`/`VorbisFloor1`/`EncodeResidue` structures instead
//! of the teacher's Ogg-muxed `VorbisDspState`/`VorbisBlock` (no Ogg page
//! framing, no VBR bitrate manager, no `PACKETBLOBS` multi-bitrate
//! buffering -- this crate emits one packet per `encode()` call at a
//! single fixed quality).

use std::collections::VecDeque;

use crate::*;
use codebook::{EncodeCodebook, StaticCodeBook};
use floor::{VorbisFloor1, VorbisLookFloor1, floor_fit, floor_encode, render_floor};
use residue::{VorbisResidue, EncodeResidue};
use mapping::VorbisMapping;
use headers::VorbisMode;
use window::Windows;
use mdct::MdctLookup;
use psy_transient::TransientDetector;
use bitwise::PacketWriter;

/// log2 of the short block's full sample count (256).
pub const LOG2_SHORT_BLOCK: u32 = 8;
/// log2 of the long block's full sample count (2048).
pub const LOG2_LONG_BLOCK: u32 = 11;
/// how many short blocks span one long block's worth of new samples.
pub const NUM_TRANSIENT: i32 = 1 << (LOG2_LONG_BLOCK - LOG2_SHORT_BLOCK);

/// One encoded Vorbis audio packet, plus the side data a container needs to
/// place it on a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPacket {
    /// The raw packet bytes (no Ogg page framing -- this crate is a
    /// bitstream encoder, not a muxer).
    pub data: Vec<u8>,
    /// How many real-time samples (per channel) this packet advances the
    /// stream by.
    pub samples: usize,
    /// Set on the final packet(s) when fewer real samples were available
    /// than the block needed and the tail was zero-padded: how many of
    /// `samples` are padding a decoder should trim.
    pub skip_samples: Option<usize>,
}

/// The fixed Static Setup Assembly this crate ships: one codebook set
/// shared by both floors/residues, two block-size-specific floors,
/// residues and mappings, and the two-entry mode list that selects between
/// them. Built once at `Encoder::new` and otherwise read-only.
pub(crate) struct BlockTables {
    pub static_codebooks: Vec<StaticCodeBook>,
    pub codebooks: Vec<EncodeCodebook>,
    /// index 0 = short block, index 1 = long block
    pub floors: [VorbisFloor1; 2],
    pub floor_looks: [VorbisLookFloor1; 2],
    pub residues: [VorbisResidue; 2],
    pub encode_residues: [EncodeResidue; 2],
    pub mappings: [VorbisMapping; 2],
    pub modes: Vec<VorbisMode>,
}

impl BlockTables {
    pub fn new(channels: i32, short_half: i32, long_half: i32) -> Result<Self, EncoderError> {
        let static_codebooks = templates::static_codebooks();
        let mut codebooks = Vec::with_capacity(static_codebooks.len());
        for cb in &static_codebooks {
            codebooks.push(EncodeCodebook::new(cb)?);
        }

        let floor_short = templates::short_floor();
        let floor_long = templates::long_floor();
        let floor_look_short = floor_short.look();
        let floor_look_long = floor_long.look();

        let residue_short = templates::residue_template(channels, short_half);
        let residue_long = templates::residue_template(channels, long_half);
        let encode_residue_short = EncodeResidue::new(&residue_short, &codebooks);
        let encode_residue_long = EncodeResidue::new(&residue_long, &codebooks);

        let mapping_short = VorbisMapping::new_for_channels(channels, 0, 0);
        let mapping_long = VorbisMapping::new_for_channels(channels, 1, 1);
        mapping_short.validate(channels)?;
        mapping_long.validate(channels)?;

        Ok(Self {
            static_codebooks,
            codebooks,
            floors: [floor_short, floor_long],
            floor_looks: [floor_look_short, floor_look_long],
            residues: [residue_short, residue_long],
            encode_residues: [encode_residue_short, encode_residue_long],
            mappings: [mapping_short, mapping_long],
            modes: templates::MODE_TEMPLATE.to_vec(),
        })
    }
}

/// A built, classified (but not yet coded) analysis window: `long_size`
/// raw samples per channel, half carried over from the previous window and
/// half freshly consumed from the input queue.
#[derive(Clone)]
struct WindowData {
    /// per channel, length `long_size`
    samples: Vec<Vec<f32>>,
    is_short: bool,
    /// how many of the `long_half` freshly-consumed samples were real
    /// (not zero-padding added to flush a short final window).
    real_count: usize,
}

/// The per-packet state machine. Drives input buffering, the transient
/// decision (with one window of lookahead so a long block's header can
/// carry a correct "next blockflag" bit), window/MDCT, floor fit+encode,
/// stereo coupling, and residue coding.
pub(crate) struct PacketOrchestrator {
    channels: usize,
    short_size: usize,
    long_size: usize,
    short_half: usize,
    long_half: usize,

    windows: Windows,
    mdct_short: MdctLookup,
    mdct_long: MdctLookup,
    detector: TransientDetector,

    queue: Vec<VecDeque<f32>>,
    eof: bool,
    /// per channel, length `long_half`: the raw tail of the most recently
    /// consumed window, reused as the next window's leading half.
    history: Vec<Vec<f32>>,

    /// the block type decided for the *next* window to be built, from
    /// running the detector on the freshly-dequeued chunk that becomes that
    /// next window's leading half. Seeded `false` (long) so the very first
    /// window is unconditionally long, matching `blockflags = [1,1,1]`'s
    /// initialization.
    pending_type: bool,

    /// the window about to be emitted (decided, not yet coded)
    current: Option<WindowData>,
    /// one window of lookahead, built only to answer a long block's "is
    /// the following window long" header bit
    pending: Option<WindowData>,
    /// the window currently being chopped into `NUM_TRANSIENT` short blocks
    splitting: Option<WindowData>,

    /// -1 = not mid-split, else the next short index (0..NUM_TRANSIENT) to emit
    transient: i32,
    /// [previous, current, next] block flags (true = long), tracked purely
    /// for the header bits a long block writes
    blockflags: [bool; 3],
}

impl PacketOrchestrator {
    pub fn new(channels: usize, sample_rate: i32) -> Self {
        let short_size = 1usize << LOG2_SHORT_BLOCK;
        let long_size = 1usize << LOG2_LONG_BLOCK;
        Self {
            channels,
            short_size,
            long_size,
            short_half: short_size / 2,
            long_half: long_size / 2,
            windows: Windows::new(short_size, long_size),
            mdct_short: MdctLookup::new(short_size),
            mdct_long: MdctLookup::new(long_size),
            detector: TransientDetector::new(channels, sample_rate, short_size),
            queue: (0..channels).map(|_| VecDeque::new()).collect(),
            eof: false,
            history: vec![vec![0.0f32; long_size / 2]; channels],
            pending_type: false,
            current: None,
            pending: None,
            splitting: None,
            transient: -1,
            blockflags: [false, false, false],
        }
    }

    pub fn push(&mut self, frames: &[Vec<f32>]) -> Result<(), EncoderError> {
        if frames.len() != self.channels {
            return Err(EncoderError::InvalidState(format!("expected {} channel(s), got {}", self.channels, frames.len())));
        }
        let len = frames[0].len();
        for f in frames {
            if f.len() != len {
                return Err(EncoderError::InvalidState("all channels must supply the same number of samples".to_string()));
            }
        }
        for (ch, f) in frames.iter().enumerate() {
            self.queue[ch].extend(f.iter().copied());
        }
        Ok(())
    }

    pub fn finish(&mut self) {
        self.eof = true;
    }

    fn all_input_exhausted(&self) -> bool {
        self.eof && self.queue.iter().all(|q| q.is_empty())
    }

    /// Consumes `long_half` fresh samples per channel (zero-padding the
    /// tail if flushing with less than that available). The window being
    /// built here takes its own block type from `pending_type` (decided a
    /// call earlier, from its *leading* half); the detector then runs on
    /// *this* call's freshly-dequeued chunk -- which is the *next* window's
    /// leading half -- and its result is stashed in `pending_type` for that
    /// next call, never applied to the window built right now. This is the
    /// one-call lag SPEC_FULL.md's packet orchestrator requires (mirroring
    /// `vorbisenc.c`'s `blockflags[2]` scheduling one frame ahead of use).
    fn try_build_window(&mut self) -> Result<Option<WindowData>, EncoderError> {
        if self.all_input_exhausted() {
            return Ok(None);
        }
        let available = self.queue[0].len();
        if available < self.long_half && !self.eof {
            return Ok(None);
        }
        let real_count = available.min(self.long_half);

        let mut samples = Vec::with_capacity(self.channels);
        let mut fresh_all = Vec::with_capacity(self.channels);
        for ch in 0..self.channels {
            let mut fresh = Vec::with_capacity(self.long_half);
            for _ in 0..self.long_half {
                fresh.push(self.queue[ch].pop_front().unwrap_or(0.0));
            }
            let mut full = self.history[ch].clone();
            full.extend_from_slice(&fresh);
            self.history[ch] = fresh.clone();
            fresh_all.push(fresh);
            samples.push(full);
        }

        let is_short = self.pending_type;
        self.pending_type = self.detector.detect(&fresh_all);
        Ok(Some(WindowData { samples, is_short, real_count }))
    }

    /// Drives the state machine forward by one packet. Returns `Ok(None)`
    /// when no packet can be produced yet (more input needed) or ever
    /// again (flushed and drained).
    pub fn encode(&mut self, tables: &BlockTables, quality: f32) -> Result<Option<EncodedPacket>, EncoderError> {
        if self.transient >= 0 {
            return self.emit_short(tables, quality);
        }

        if self.current.is_none() {
            self.current = self.try_build_window()?;
            if self.current.is_none() {
                return Ok(None);
            }
        }

        if self.current.as_ref().unwrap().is_short {
            let window = self.current.take().unwrap();
            self.splitting = Some(window);
            self.transient = 0;
            return self.emit_short(tables, quality);
        }

        // a long block needs to know whether the *following* window will
        // also be long before it can write its own header bits. don't
        // take `current` out until we know either `pending` resolved or
        // input is genuinely exhausted -- otherwise a retry would lose it.
        if self.pending.is_none() {
            self.pending = self.try_build_window()?;
            if self.pending.is_none() && !self.all_input_exhausted() {
                return Ok(None);
            }
        }

        let current = self.current.take().unwrap();
        let next_is_long = self.pending.as_ref().map(|w| !w.is_short).unwrap_or(false);
        let prev_flag = self.blockflags[0];

        let data = self.build_packet(tables, quality, true, prev_flag, next_is_long, &current.samples, self.long_half, 1)?;

        self.blockflags = [self.blockflags[1], true, next_is_long];
        let skip_samples = if current.real_count < self.long_half {
            Some(self.long_half - current.real_count)
        } else {
            None
        };

        // the lookahead window becomes next cycle's current window.
        self.current = self.pending.take();

        Ok(Some(EncodedPacket { data, samples: self.long_half, skip_samples }))
    }

    fn emit_short(&mut self, tables: &BlockTables, quality: f32) -> Result<Option<EncodedPacket>, EncoderError> {
        let idx = self.transient as usize;
        let start = idx * self.short_size;
        let (slice, real_count) = {
            let window = self.splitting.as_ref().expect("emit_short called without a splitting window");
            let slice: Vec<Vec<f32>> = (0..self.channels)
                .map(|ch| window.samples[ch][start..start + self.short_size].to_vec())
                .collect();
            (slice, window.real_count)
        };

        let data = self.build_packet(tables, quality, false, false, false, &slice, self.short_half, 0)?;

        let real_in_block = real_count.saturating_sub(start).min(self.short_size);
        let skip_samples = if real_in_block < self.short_size {
            Some(self.short_size - real_in_block)
        } else {
            None
        };

        if self.transient == NUM_TRANSIENT - 1 {
            self.transient = -1;
            self.splitting = None;
        } else {
            self.transient += 1;
        }
        self.blockflags = [self.blockflags[1], false, false];

        Ok(Some(EncodedPacket { data, samples: self.short_half, skip_samples }))
    }

    /// Windows, transforms, floor-fits, couples, and residue-codes one
    /// block's worth of per-channel PCM (`pcm[ch].len() == 2 * cur_half`)
    /// into a standalone packet buffer.
    #[allow(clippy::too_many_arguments)]
    fn build_packet(
        &self,
        tables: &BlockTables,
        quality: f32,
        is_long: bool,
        prev_flag: bool,
        next_flag: bool,
        pcm: &[Vec<f32>],
        cur_half: usize,
        mode_index: i32,
    ) -> Result<Vec<u8>, EncoderError> {
        let idx = mode_index as usize;
        let floor = &tables.floors[idx];
        let floor_look = &tables.floor_looks[idx];
        let residue = &tables.residues[idx];
        let encode_residue = &tables.encode_residues[idx];
        let mapping = &tables.mappings[idx];
        let mdct = if is_long { &self.mdct_long } else { &self.mdct_short };
        let log2_block = if is_long { LOG2_LONG_BLOCK } else { LOG2_SHORT_BLOCK };

        let mut writer = PacketWriter::new(8192);
        writer.write(0, 1)?; // packet type: audio
        writer.write(mode_index as u32, 1)?; // ilog(nmodes - 1) == 1 bit, nmodes == 2
        if is_long {
            writer.write(prev_flag as u32, 1)?;
            writer.write(next_flag as u32, 1)?;
        }

        let prev_half = if is_long { if prev_flag {self.long_half} else {self.short_half} } else { self.short_half };
        let next_half = if is_long { if next_flag {self.long_half} else {self.short_half} } else { self.short_half };

        let mut coeffs = vec![0.0f32; self.channels * cur_half];
        for ch in 0..self.channels {
            let windowed = self.windows.apply(&pcm[ch], cur_half, prev_half, next_half, log2_block);
            let mut out = vec![0.0f32; cur_half];
            mdct.forward(&windowed, &mut out);
            coeffs[ch * cur_half..(ch + 1) * cur_half].copy_from_slice(&out);
        }

        let mut floor_curves = vec![vec![0.0f32; cur_half]; self.channels];
        for ch in 0..self.channels {
            let slice = &coeffs[ch * cur_half..(ch + 1) * cur_half];
            let posts = floor_fit(floor, floor_look, slice, quality);
            floor_encode(floor, floor_look, &tables.codebooks, &mut writer, &posts)?;
            floor_curves[ch] = render_floor(floor, floor_look, &posts, cur_half);
        }
        for ch in 0..self.channels {
            for k in 0..cur_half {
                let f = floor_curves[ch][k].max(1e-9);
                coeffs[ch * cur_half + k] /= f;
            }
        }

        for s in 0..mapping.coupling_steps as usize {
            let m = mapping.coupling_mag[s] as usize * cur_half;
            let a = mapping.coupling_ang[s] as usize * cur_half;
            for k in 0..cur_half {
                let mag0 = coeffs[m + k];
                let a0 = coeffs[a + k];
                let mut ang = a0 - mag0;
                if mag0 > 0.0 {
                    ang = -ang;
                }
                if ang < 0.0 {
                    coeffs[m + k] = a0;
                }
                coeffs[a + k] = ang;
            }
        }

        encode_residue.encode(residue, &tables.codebooks, &mut writer, &mut coeffs, cur_half, self.channels)?;

        Ok(writer.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(channels: i32) -> BlockTables {
        BlockTables::new(channels, 128, 1024).expect("templates must build")
    }

    #[test]
    fn mono_silence_flushes_to_at_least_one_packet() {
        let mut orch = PacketOrchestrator::new(1, 44100);
        let t = tables(1);
        orch.push(&[vec![0.0f32; 400]]).unwrap();
        orch.finish();
        let packet = orch.encode(&t, 1.0).unwrap();
        assert!(packet.is_some());
        let packet = packet.unwrap();
        assert_eq!(packet.samples, 1024);
        assert_eq!(packet.skip_samples, Some(1024 - 400));
        assert!(!packet.data.is_empty());
    }

    #[test]
    fn needs_more_input_before_a_long_half_arrives() {
        let mut orch = PacketOrchestrator::new(1, 44100);
        let t = tables(1);
        orch.push(&[vec![0.0f32; 10]]).unwrap();
        assert!(orch.encode(&t, 1.0).unwrap().is_none());
    }

    #[test]
    fn stereo_silence_round_trips_through_build_packet() {
        let mut orch = PacketOrchestrator::new(2, 44100);
        let t = tables(2);
        orch.push(&[vec![0.0f32; 2048], vec![0.0f32; 2048]]).unwrap();
        orch.push(&[vec![0.0f32; 2048], vec![0.0f32; 2048]]).unwrap();
        orch.finish();
        let mut packets = Vec::new();
        while let Some(p) = orch.encode(&t, 1.0).unwrap() {
            packets.push(p);
        }
        assert!(!packets.is_empty());
        for p in &packets {
            assert!(!p.data.is_empty());
        }
    }

    #[test]
    fn sudden_onset_eventually_splits_into_short_packets() {
        let mut orch = PacketOrchestrator::new(1, 44100);
        let t = tables(1);
        let mut samples = vec![0.0f32; 4096];
        for s in samples[2048..].iter_mut() {
            *s = 0.9;
        }
        orch.push(&[samples]).unwrap();
        orch.finish();
        let mut saw_short = false;
        while let Some(p) = orch.encode(&t, 1.0).unwrap() {
            if p.samples == 128 {
                saw_short = true;
            }
        }
        assert!(saw_short, "a sharp onset should trigger at least one short packet");
    }
}
