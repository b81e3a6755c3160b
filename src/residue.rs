#![allow(dead_code)]
use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Write},
};

use crate::*;
use headers::VorbisSetupHeader;
use copiablebuf::CopiableBuffer;

/// * libvorbis codes every partition through this many interleaved VQ
/// * passes, each pass allowed its own (coarser-to-finer) cascade book.
pub const RES_PASSES: usize = 8;

/// * block-partitioned VQ coded straight residue
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VorbisResidue {
    /// The residue type
    pub residue_type: i32,

    pub begin: i32,
    pub end: i32,

    /// group n vectors per partition
    pub grouping: i32,

    /// possible codebooks for a partition
    pub partitions: i32,

    /// partitions ^ groupbook dim
    pub partvals: i32,

    /// huffbook for partitioning
    pub groupbook: i32,

    /// expanded out to pointers in lookup
    pub secondstages: CopiableBuffer<i32, 64>,

    /// list of second stage books
    pub booklist: CopiableBuffer<i32, 512>,

    pub classmetric1: [i32; 64],
    pub classmetric2: [i32; 64],
}

impl VorbisResidue {
    pub fn load(bitreader: &mut BitReader, vorbis_info: &VorbisSetupHeader) -> Result<Self, io::Error> {
        let static_codebooks = &vorbis_info.static_codebooks;
        let residue_type = read_bits!(bitreader, 16);

        if !(0..3).contains(&residue_type) {
            return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid residue type {residue_type}")))
        }

        let mut ret = Self {
            residue_type,
            begin: read_bits!(bitreader, 24),
            end: read_bits!(bitreader, 24),
            grouping: read_bits!(bitreader, 24).wrapping_add(1),
            partitions: read_bits!(bitreader, 6).wrapping_add(1),
            groupbook: read_bits!(bitreader, 8),
            classmetric1: [0; 64],
            classmetric2: [0; 64],
            ..Default::default()
        };

        if !(0..static_codebooks.len()).contains(&(ret.groupbook as usize)) {
            return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid groupbook index {}", ret.groupbook)));
        }

        let partitions = ret.partitions as usize;
        ret.secondstages.resize(partitions, 0);

        let mut acc = 0usize;
        for i in 0..partitions {
            let mut cascade = read_bits!(bitreader, 3);
            let cflag = read_bits!(bitreader, 1) != 0;
            if cflag {
                cascade |= read_bits!(bitreader, 5) << 3;
            }
            ret.secondstages[i] = cascade;
            acc += icount!(cascade);
        }

        ret.booklist.resize(acc, 0);
        for i in 0..acc {
            let book = read_bits!(bitreader, 8);
            if !(0..static_codebooks.len()).contains(&(book as usize)) {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid book index {book}")));
            }
            ret.booklist[i] = book;
            let book_maptype = static_codebooks[book as usize].maptype;
            if book_maptype == 0 {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid book maptype {book_maptype}")));
            }
        }

        let groupbook = &static_codebooks[ret.groupbook as usize];
        let entries = groupbook.entries;
        let mut dim = groupbook.dim;
        let mut partvals = 1i32;
        if dim < 1 {
            return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid groupbook dimension {dim}")));
        }
        while dim > 0 {
            partvals *= ret.partitions;
            if partvals > entries {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid partvals {partvals}")));
            }
            dim -= 1;
        }
        ret.partvals = partvals;
        Ok(ret)
    }
}

impl VorbisPackableObject for VorbisResidue {
    /// * Pack to the bitstream
    fn pack<W>(&self, bitwriter: &mut BitWriter<W>) -> Result<usize, io::Error>
    where
        W: Write {
        let begin_bits = bitwriter.total_bits;
        let mut acc = 0usize;

        write_bits!(bitwriter, self.residue_type, 16);
        write_bits!(bitwriter, self.begin, 24);
        write_bits!(bitwriter, self.end, 24);
        write_bits!(bitwriter, self.grouping.wrapping_sub(1), 24);
        write_bits!(bitwriter, self.partitions.wrapping_sub(1), 6);
        write_bits!(bitwriter, self.groupbook, 8);
        for i in 0..self.secondstages.len() {
            let secondstage = self.secondstages[i];
            if ilog!(secondstage) > 3 {
                write_bits!(bitwriter, secondstage, 3);
                write_bits!(bitwriter, 1, 1);
                write_bits!(bitwriter, secondstage >> 3, 5);
            } else {
                write_bits!(bitwriter, secondstage, 4);
            }
            acc += icount!(secondstage);
        }
        for i in 0..acc {
            write_bits!(bitwriter, self.booklist[i], 8);
        }

        Ok(bitwriter.total_bits - begin_bits)
    }
}

impl Debug for VorbisResidue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("VorbisResidue")
        .field("residue_type", &self.residue_type)
        .field("begin", &self.begin)
        .field("end", &self.end)
        .field("grouping", &self.grouping)
        .field("partitions", &self.partitions)
        .field("partvals", &self.partvals)
        .field("groupbook", &self.groupbook)
        .field("secondstages", &format_args!("[{}]", format_array!(self.secondstages, ", ", "{}")))
        .field("booklist", &format_args!("[{}]", format_array!(self.booklist, ", ", "{}")))
        .finish()
    }
}

impl Default for VorbisResidue {
    fn default() -> Self {
        Self {
            residue_type: 0,
            begin: 0,
            end: 0,
            grouping: 0,
            partitions: 0,
            partvals: 0,
            groupbook: 0,
            secondstages: CopiableBuffer::default(),
            booklist: CopiableBuffer::default(),
            classmetric1: [0; 64],
            classmetric2: [0; 64],
        }
    }
}

/// * The runtime residue encoder: expands the setup header's cascade bits
/// * (`secondstages`/`booklist`) into a dense `[classification][pass]` book
/// * table and precomputes the per-classification amplitude thresholds used
/// * to pick a partition's classification, mirroring `ready_residue()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodeResidue {
    /// `books[classification][pass]`, -1 where that pass has no book for
    /// this classification.
    pub books: Vec<[i32; RES_PASSES]>,

    /// per-classification, per-channel (mono/stereo only) amplitude bound
    /// used to pick the coarsest classification a partition still fits in.
    pub maxes: Vec<[f32; 2]>,
}

impl EncodeResidue {
    pub fn new(residue: &VorbisResidue, codebooks: &[EncodeCodebook]) -> Self {
        let classifications = residue.partitions as usize;
        let mut acc = 0usize;
        let mut books = vec![[-1i32; RES_PASSES]; classifications];
        for i in 0..classifications {
            let cascade = residue.secondstages[i];
            for j in 0..RES_PASSES {
                if (cascade >> j) & 1 != 0 {
                    books[i][j] = residue.booklist[acc];
                    acc += 1;
                }
            }
        }

        let mut maxes = vec![[0.0f32; 2]; classifications];
        for i in 0..classifications {
            if let Some(book_idx) = books[i].iter().copied().find(|&b| b != -1) {
                let cb = &codebooks[book_idx as usize];
                let dim = cb.dim as usize;
                if dim >= 2 {
                    for j in 0..cb.entries as usize {
                        if cb.lengths[j] <= 0 {
                            continue;
                        }
                        let a0 = cb.dimensions[j * dim].abs();
                        let a1 = cb.dimensions[j * dim + 1].abs();
                        if a0 > maxes[i][0] {
                            maxes[i][0] = a0;
                        }
                        if a1 > maxes[i][1] {
                            maxes[i][1] = a1;
                        }
                    }
                }
            }
            // small bias
            maxes[i][0] += 0.8;
            maxes[i][1] += 0.8;
        }

        Self { books, maxes }
    }

    /// * Mirrors `residue_encode()` for residue type 2 (the only type this
    /// * crate emits): channels are interleaved sample-by-sample into a
    /// * single logical stream, partitioned, classified by peak magnitude,
    /// * and coded in `RES_PASSES` cascading VQ passes. `coeffs` is
    /// * channel-major (`coeffs[ch * samples + k]`) and is left holding
    /// * whatever the codebooks couldn't represent.
    pub fn encode(&self, residue: &VorbisResidue, codebooks: &[EncodeCodebook], writer: &mut PacketWriter, coeffs: &mut [f32], samples: usize, real_ch: usize) -> Result<(), EncoderError> {
        let psize = residue.grouping as usize;
        let partitions = ((residue.end - residue.begin) as usize) / psize;
        let classifications = residue.partitions as usize;
        let classbook = &codebooks[residue.groupbook as usize];
        let classwords = classbook.dim as usize;

        let mut classes = vec![0i32; partitions];
        for p in 0..partitions {
            let mut max = [0.0f32; 2];
            let s = residue.begin as usize + p * psize;
            let mut k = s;
            while k < s + psize {
                for ch in 0..real_ch {
                    let v = coeffs[samples * ch + k / real_ch].abs();
                    if v > max[ch] {
                        max[ch] = v;
                    }
                }
                k += real_ch;
            }
            let mut chosen = classifications - 1;
            for i in 0..classifications - 1 {
                let found = (0..real_ch).filter(|&ch| max[ch] < self.maxes[i][ch]).count();
                if found == real_ch {
                    chosen = i;
                    break;
                }
            }
            classes[p] = chosen as i32;
        }

        for pass in 0..RES_PASSES {
            let mut p = 0usize;
            while p < partitions {
                if pass == 0 {
                    let mut entry = classes[p];
                    for i in 1..classwords {
                        entry *= classifications as i32;
                        if p + i < partitions {
                            entry += classes[p + i];
                        }
                    }
                    classbook.put_codeword(writer, entry as usize)?;
                }
                let mut i = 0usize;
                while i < classwords && p < partitions {
                    let nbook = self.books[classes[p] as usize][pass];
                    if nbook != -1 {
                        let book = &codebooks[nbook as usize];
                        let dim = book.dim as usize;
                        let s = residue.begin as usize + p * psize;
                        let stride = real_ch * samples;
                        let mut a1 = (s % real_ch) * samples;
                        let mut b1 = s / real_ch;
                        let mut k = 0usize;
                        while k < psize {
                            let mut vec = vec![0.0f32; dim];
                            let mut a2 = a1;
                            let mut b2 = b1;
                            for slot in vec.iter_mut() {
                                *slot = coeffs[a2 + b2];
                                a2 += samples;
                                if a2 == stride {
                                    a2 = 0;
                                    b2 += 1;
                                }
                            }
                            let coded = book.put_vector(writer, &vec)?.to_vec();
                            for v in coded.iter() {
                                coeffs[a1 + b1] -= v;
                                a1 += samples;
                                if a1 == stride {
                                    a1 = 0;
                                    b1 += 1;
                                }
                            }
                            k += dim;
                        }
                    }
                    i += 1;
                    p += 1;
                }
            }
        }
        Ok(())
    }
}
