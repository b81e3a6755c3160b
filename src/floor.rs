#![allow(dead_code)]
use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Write},
};

use crate::*;
use headers::VorbisSetupHeader;
use copiablebuf::CopiableBuffer;

pub const VIF_POSIT: usize = 63;
pub const VIF_CLASS: usize = 16;
pub const VIF_PARTS: usize = 31;
pub const MAX_FLOOR_VALUES: usize = VIF_POSIT + 2;

/// * Floor type 1 backend settings, the only floor type this crate emits
/// * (floor type 0, libvorbis's LPC-derived floor, is out of scope).
#[derive(Clone, Copy, PartialEq, Default)]
pub struct VorbisFloor1 {
    /// 0 to 31
    pub partitions: i32,

    /// 0 to 15
    pub partitions_class: CopiableBuffer<i32, VIF_PARTS>,

    /// 1 to 8
    pub class_dim: CopiableBuffer<i32, VIF_CLASS>,

    /// 0,1,2,3 (bits: 1<<n poss)
    pub class_subs: CopiableBuffer<i32, VIF_CLASS>,

    /// subs ^ dim entries
    pub class_book: CopiableBuffer<i32, VIF_CLASS>,

    /// [VIF_CLASS][subs]
    pub class_subbook: CopiableBuffer<CopiableBuffer<i32, 8>, VIF_CLASS>,

    /// 1 2 3 or 4
    pub mult: i32,

    /// first two implicit
    pub postlist: CopiableBuffer<i32, {VIF_POSIT + 2}>,
}

/// * Precomputed per-point neighbor/sort tables, built once per floor and
/// * reused across every frame (`floor_fit`/`floor_encode` only read it).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VorbisLookFloor1 {
    /// x value at each sorted position
    pub sorted_index: Vec<i32>,
    /// sorted position -> original point index
    pub forward_index: Vec<i32>,
    /// original point index -> sorted position
    pub reverse_index: Vec<i32>,

    /// for point i+2 (original order), the original index of its nearest lower-x neighbor
    pub loneighbor: Vec<i32>,
    /// for point i+2 (original order), the original index of its nearest higher-x neighbor
    pub hineighbor: Vec<i32>,

    pub posts: usize,
    pub n: i32,
    pub quant_q: i32,
}

impl VorbisFloor1 {
    pub fn load(bitreader: &mut BitReader, vorbis_info: &VorbisSetupHeader) -> Result<Self, io::Error> {
        let static_codebooks = &vorbis_info.static_codebooks;
        let mut ret = Self::default();

        ret.partitions = read_bits!(bitreader, 5);
        ret.partitions_class.resize(ret.partitions as usize, 0);
        for i in 0..ret.partitions_class.len() {
            ret.partitions_class[i] = read_bits!(bitreader, 4);
        }
        let maxclass = ret.partitions_class.iter().copied().max().unwrap() as usize + 1;
        ret.class_dim.resize(maxclass, 0);
        ret.class_subs.resize(maxclass, 0);
        ret.class_book.resize(maxclass, 0);
        ret.class_subbook.resize(maxclass, CopiableBuffer::default());

        for i in 0..maxclass {
            ret.class_dim[i] = read_bits!(bitreader, 3).wrapping_add(1);
            ret.class_subs[i] = read_bits!(bitreader, 2);
            if ret.class_subs[i] != 0 {
                ret.class_book[i] = read_bits!(bitreader, 8);
            }
            if ret.class_book[i] as usize >= static_codebooks.len() {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid class book index {}, max books is {}", ret.class_book[i], static_codebooks.len())));
            }
            let sublen = 1usize << ret.class_subs[i];
            ret.class_subbook[i].resize(sublen, 0);
            for k in 0..sublen {
                let subbook_index = read_bits!(bitreader, 8).wrapping_sub(1);
                if subbook_index < -1 || subbook_index >= static_codebooks.len() as i32 {
                    return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid class subbook index {subbook_index}, max books is {}", static_codebooks.len())));
                }
                ret.class_subbook[i][k] = subbook_index;
            }
        }

        ret.mult = read_bits!(bitreader, 2).wrapping_add(1);
        let rangebits = read_bits!(bitreader, 4);
        let maxrange = 1 << rangebits;

        let mut k = 0usize;
        let mut count = 0usize;
        for i in 0..ret.partitions_class.len() {
            count += ret.class_dim[ret.partitions_class[i] as usize] as usize;
            if count > VIF_POSIT {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid class dim sum {count}, max is {VIF_POSIT}")));
            }
            ret.postlist.resize(count + 2, 0);
            while k < count {
                let t = read_bits!(bitreader, rangebits);
                if t < 0 || t >= maxrange {
                    return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid value for postlist {t}")));
                }
                ret.postlist[k + 2] = t;
                k += 1;
            }
        }
        ret.postlist[0] = 0;
        ret.postlist[1] = maxrange;

        let mut checker = ret.postlist[..].to_vec();
        checker.sort();
        for i in 1..checker.len() {
            if checker[i - 1] == checker[i] {
                return_Err!(io::Error::new(io::ErrorKind::InvalidData, format!("Bad postlist: [{}]", format_array!(ret.postlist))));
            }
        }

        Ok(ret)
    }

    /// * Pack to the bitstream
    pub fn pack<W>(&self, bitwriter: &mut BitWriter<W>) -> Result<usize, io::Error>
    where
        W: Write {
        let begin_bits = bitwriter.total_bits;
        let maxposit = self.postlist[1];
        let rangebits = ilog!(maxposit - 1);
        // floor type
        write_bits!(bitwriter, 1, 16);
        write_bits!(bitwriter, self.partitions, 5);
        for i in 0..self.partitions_class.len() {
            write_bits!(bitwriter, self.partitions_class[i], 4);
        }
        let maxclass = self.partitions_class.iter().copied().max().unwrap() as usize + 1;
        for i in 0..maxclass {
            write_bits!(bitwriter, self.class_dim[i].wrapping_sub(1), 3);
            write_bits!(bitwriter, self.class_subs[i], 2);
            if self.class_subs[i] != 0 {
                write_bits!(bitwriter, self.class_book[i], 8);
            }
            for k in 0..self.class_subbook[i].len() {
                write_bits!(bitwriter, self.class_subbook[i][k].wrapping_add(1), 8);
            }
        }
        write_bits!(bitwriter, self.mult.wrapping_sub(1), 2);
        write_bits!(bitwriter, rangebits, 4);
        let mut k = 0usize;
        let mut count = 0usize;
        for i in 0..self.partitions_class.len() {
            count += self.class_dim[self.partitions_class[i] as usize] as usize;
            while k < count {
                write_bits!(bitwriter, self.postlist[k + 2], rangebits);
                k += 1;
            }
        }
        Ok(bitwriter.total_bits - begin_bits)
    }

    /// * Builds the sort/neighbor tables once per floor so per-frame fitting
    /// * never has to re-derive them. Mirrors `ff_vorbis_ready_floor1_list`.
    pub fn look(&self) -> VorbisLookFloor1 {
        let mut n = 0usize;
        for i in 0..self.partitions as usize {
            n += self.class_dim[self.partitions_class[i] as usize] as usize;
        }
        n += 2;
        let look_n = self.postlist[1];

        let mut sort_list: Vec<_> = (0..n as i32).collect();
        sort_list.sort_by_key(|&i| self.postlist[i as usize]);

        let mut sorted_index = vec![0i32; n];
        let mut forward_index = vec![0i32; n];
        let mut reverse_index = vec![0i32; n];

        // points from sort order back to range number
        for i in 0..n {
            forward_index[i] = sort_list[i];
        }
        // points from range order to sorted position
        for i in 0..n {
            reverse_index[forward_index[i] as usize] = i as i32;
        }
        // we actually need the post values too
        for i in 0..n {
            sorted_index[i] = self.postlist[forward_index[i] as usize];
        }

        let quant_q = match self.mult {
            1 => 256,
            2 => 128,
            3 => 86,
            4 => 64,
            _ => unreachable!(),
        };

        let mut loneighbor = Vec::<i32>::with_capacity(n.saturating_sub(2));
        let mut hineighbor = Vec::<i32>::with_capacity(n.saturating_sub(2));

        /* discover our neighbors; we don't use fit flags here (that would
           push the neighbors outward) */
        for i in 0..(n - 2) {
            let mut lo = 0i32;
            let mut hi = 1i32;
            let mut lx = 0;
            let mut hx = look_n;
            let currentx = self.postlist[i + 2];
            for j in 0..(i + 2) {
                let x = self.postlist[j];
                if ((lx + 1)..currentx).contains(&x) {
                    lo = j as i32;
                    lx = x;
                }
                if ((currentx + 1)..hx).contains(&x) {
                    hi = j as i32;
                    hx = x;
                }
            }
            loneighbor.push(lo);
            hineighbor.push(hi);
        }

        VorbisLookFloor1 {
            sorted_index,
            forward_index,
            reverse_index,
            hineighbor,
            loneighbor,
            posts: n,
            n: look_n,
            quant_q,
        }
    }
}

impl Debug for VorbisFloor1 {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("VorbisFloor1")
        .field("partitions", &self.partitions)
        .field("partitions_class", &format_args!("[{}]", format_array!(self.partitions_class)))
        .field("class_dim", &format_args!("[{}]", format_array!(self.class_dim)))
        .field("class_subs", &format_args!("[{}]", format_array!(self.class_subs)))
        .field("class_book", &format_args!("[{}]", format_array!(self.class_book)))
        .field("class_subbook", &format_args!("[{}]", self.class_subbook.iter().map(|subbook|format!("[{}]", format_array!(subbook))).collect::<Vec<_>>().join(", ")))
        .field("mult", &self.mult)
        .field("postlist", &format_args!("[{}]", format_array!(self.postlist)))
        .finish()
    }
}

/// * A 256-entry dB-to-linear lookup, stepped through by `mult` while fitting
/// * and coding a floor curve, generated from the crate's own `fromdB` scale
/// * rather than copied byte-for-byte from libvorbis's canonical table (no
/// * decoder in this crate needs to reproduce it bit-exactly).
pub fn floor1_inverse_db_table() -> [f32; 256] {
    const RANGE_DB: f32 = 140.0;
    let mut table = [0.0f32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let db = -RANGE_DB + (i as f32) * (RANGE_DB / 255.0);
        *slot = scales::fromdB(db);
    }
    table
}

fn render_point(x0: i32, y0: i32, x1: i32, y1: i32, x: i32) -> i32 {
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// * Mirrors `floor_fit()`: for each point of the floor curve, average the
/// * magnitude of the MDCT coefficients in its neighborhood, scale it into
/// * a target loudness that decays a little faster for high-frequency
/// * points (the `1.25^(x*0.005)` term), and quantize against the inverse-dB
/// * table. Returns one post value per point in ORIGINAL (bitstream) order.
pub fn floor_fit(fc: &VorbisFloor1, look: &VorbisLookFloor1, coeffs: &[f32], quality: f32) -> Vec<i32> {
    let range = 255 / fc.mult + 1;
    let n = look.posts;
    let table = floor1_inverse_db_table();

    let mut averages = vec![0.0f32; n];
    let mut tot_average = 0.0f32;
    for i in 0..n {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(n - 1);
        let begin = (look.sorted_index[lo] as usize).min(coeffs.len());
        let end = (look.sorted_index[hi] as usize).min(coeffs.len());
        let (begin, end) = if begin < end {(begin, end)} else {(begin, (begin + 1).min(coeffs.len()))};
        let mut avg = 0.0f32;
        for &c in coeffs[begin..end].iter() {
            avg += c.abs();
        }
        avg /= (end - begin).max(1) as f32;
        averages[i] = avg;
        tot_average += avg;
    }
    tot_average /= n as f32;
    tot_average /= quality.max(1e-6);

    let mut posts = vec![0i32; n];
    for i in 0..n {
        let orig = look.forward_index[i] as usize;
        let position = look.sorted_index[i];
        let average = (tot_average * averages[i]).sqrt() * 1.25f32.powf(position as f32 * 0.005);
        let mut j = range - 1;
        for jj in 0..(range - 1) {
            if table[(jj * fc.mult) as usize] > average {
                j = jj;
                break;
            }
        }
        posts[orig] = j;
    }
    posts
}

/// * Mirrors `floor_encode()`: code each point either as a flag (the linear
/// * prediction from its two already-coded neighbors already lands on the
/// * right value, so nothing further is sent) or as a signed, room-clamped
/// * delta from that prediction, then pack every class's codewords for the
/// * partitions in order. Returns the `coded[]` marker array so the caller
/// * can render the floor curve that was actually transmitted.
pub fn floor_encode(fc: &VorbisFloor1, look: &VorbisLookFloor1, codebooks: &[EncodeCodebook], writer: &mut PacketWriter, posts: &[i32]) -> Result<Vec<i32>, EncoderError> {
    let range = 255 / fc.mult + 1;
    let n = look.posts;
    let mut coded = vec![0i32; n];

    let rangebits = ilog!(range - 1);
    if writer.remaining_bits() < 1 + 2 * rangebits as usize {
        return Err(EncoderError::BufferTooSmall{needed_bits: 1 + 2 * rangebits as usize, available_bits: writer.remaining_bits()});
    }
    writer.write(1, 1)?; // non-zero floor
    writer.write(posts[0] as u32, rangebits)?;
    writer.write(posts[1] as u32, rangebits)?;
    coded[0] = 1;
    coded[1] = 1;

    for i in 2..n {
        let low = look.loneighbor[i - 2] as usize;
        let high = look.hineighbor[i - 2] as usize;
        let predicted = render_point(fc.postlist[low], posts[low], fc.postlist[high], posts[high], fc.postlist[i]);
        let highroom = range - predicted;
        let lowroom = predicted;
        let room = highroom.min(lowroom);
        if predicted == posts[i] {
            coded[i] = 0;
            continue;
        } else {
            if coded[low] == 0 {
                coded[low] = -1;
            }
            if coded[high] == 0 {
                coded[high] = -1;
            }
        }
        if posts[i] > predicted {
            if posts[i] - predicted > room {
                coded[i] = posts[i] - predicted + lowroom;
            } else {
                coded[i] = (posts[i] - predicted) << 1;
            }
        } else if predicted - posts[i] > room {
            coded[i] = predicted - posts[i] + highroom - 1;
        } else {
            coded[i] = ((predicted - posts[i]) << 1) - 1;
        }
    }

    let mut counter = 2usize;
    for i in 0..fc.partitions as usize {
        let class = fc.partitions_class[i] as usize;
        let dim = fc.class_dim[class] as usize;
        let subclass = fc.class_subs[class];
        let csub = 1usize << subclass;
        let mut cval = 0u32;
        if subclass != 0 {
            let book = &codebooks[fc.class_book[class] as usize];
            let mut cshift = 0u32;
            for k in 0..dim {
                let mut chosen = csub - 1;
                for l in 0..csub {
                    let maxval = if fc.class_subbook[class][l] != -1 {
                        codebooks[fc.class_subbook[class][l] as usize].entries
                    } else {
                        1
                    };
                    if coded[counter + k] < maxval {
                        chosen = l;
                        break;
                    }
                }
                cval |= (chosen as u32) << cshift;
                cshift += subclass as u32;
            }
            book.put_codeword(writer, cval as usize)?;
        }
        for _ in 0..dim {
            let sub = fc.class_subbook[class][(cval as usize) & (csub - 1)];
            let entry = coded[counter];
            counter += 1;
            cval >>= subclass;
            if sub == -1 {
                continue;
            }
            let entry = if entry == -1 {0} else {entry};
            codebooks[sub as usize].put_codeword(writer, entry as usize)?;
        }
    }

    Ok(coded)
}

/// * Reconstructs the linear-magnitude floor curve that a conforming decoder
/// * would produce from the bits `floor_encode` just wrote, so the caller can
/// * normalize the residue against it. A simplified, non-bit-exact stand-in
/// * for `ff_vorbis_floor1_render_list` (no decoder ships in this crate).
pub fn render_floor(fc: &VorbisFloor1, look: &VorbisLookFloor1, posts: &[i32], n_out: usize) -> Vec<f32> {
    let table = floor1_inverse_db_table();
    let mut out = vec![0.0f32; n_out];
    let mut lx = 0usize;
    let mut ly = (posts[0] * fc.mult) as usize;

    for i in 1..look.posts {
        let orig = look.forward_index[i] as usize;
        let hx = (fc.postlist[orig] as usize).min(n_out);
        let hy = (posts[orig] * fc.mult).clamp(0, 255) as usize;
        if hx > lx {
            for (x, slot) in out[lx..hx].iter_mut().enumerate() {
                let y = if hx == lx {ly} else {render_point(lx as i32, ly as i32, hx as i32, hy as i32, (lx + x) as i32).clamp(0, 255) as usize};
                *slot = table[y];
            }
        }
        lx = hx;
        ly = hy;
    }
    if lx < n_out {
        for slot in out[lx..].iter_mut() {
            *slot = table[ly.min(255)];
        }
    }
    out
}
