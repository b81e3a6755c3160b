#![allow(dead_code)]
//! Hard-coded Static Setup Assembly tables: the codebook/floor/residue class
//! structure this crate ships as compile-time data rather than deriving it,
//! per `create_floors`/`create_residues`/`create_vorbis_context` in
//! `vorbisenc.c`. The upstream numeric codebook tables
//! (`vorbis_enc_data.h`) were not available to this crate, so the class
//! shapes (partition counts, `{0,1,2,2,3,3,4,4}`-style partition-to-class
//! maps, two block-size-specific floors) are grounded on the original
//! source's structure, but the actual codeword lengths and quantization
//! grids below are self-authored and only required to be internally
//! consistent (a complete/sparse Huffman tree, a quantlist sized to match
//! `book_maptype1_quantvals`). See DESIGN.md.

use crate::*;
use codebook::StaticCodeBook;
use floor::VorbisFloor1;
use residue::VorbisResidue;
use headers::VorbisMode;
use copiablebuf::CopiableBuffer;

/// * `RES_PASSES` in `residue.rs`; only pass 0 is used by these templates
/// * (single-cascade residue coding is enough for this crate's fixed quality
/// * tier and keeps every classification's `secondstages` a one-bit mask).
pub const PARTITION_TO_CLASS_LONG: [i32; 8] = [0, 1, 2, 2, 3, 3, 4, 4];

/// * A codeword length list giving every entry the same length, used
/// * whenever this crate needs a codebook whose population is a power of
/// * two (so a uniform-length canonical Huffman tree is already exactly
/// * complete: no need to split any entries across two depths).
fn uniform_lengths(entries: i32) -> Vec<i8> {
    let len = ilog!(entries - 1);
    vec![len as i8; entries as usize]
}

/// * A generic "index-only" Huffman book (maptype 0): no vector mapping, a
/// * bare codeword per entry. Used both for floor delta coding and for a
/// * residue classbook.
fn index_book(dim: i32, entries: i32) -> StaticCodeBook {
    StaticCodeBook {
        dim,
        entries,
        lengthlist: uniform_lengths(entries),
        maptype: 0,
        ..Default::default()
    }
}

/// * Index 0 in every template's codebook list: a 256-entry, byte-wide
/// * Huffman book used by both floors' per-class subbooks to code floor-1
/// * delta values (`floor_encode`'s `coded[]`, which can range up to the
/// * partition's room bound).
pub fn floor_delta_book() -> StaticCodeBook {
    index_book(1, 256)
}

/// * Index 1: the residue classbook. `dim = RES_CLASSWORDS` so
/// * `residue.rs`'s `classwords = classbook.dim` packs two successive
/// * partitions' classifications per codeword, `entries =
/// * classifications^classwords = 8*8 = 64`, matching
/// * `RES_CLASSIFICATIONS`.
pub const RES_CLASSIFICATIONS: i32 = 8;
pub const RES_CLASSWORDS: i32 = 2;

pub fn res_classbook() -> StaticCodeBook {
    index_book(RES_CLASSWORDS, RES_CLASSIFICATIONS.pow(RES_CLASSWORDS as u32))
}

/// * Index 2: the residue's sole pass-0 VQ book. `dim = 2`, `entries =
/// * 256`, lattice-mapped (maptype 1) over a 16-point quantization grid
/// * spanning `[-2.0, 2.0]` (post-flatten residue coefficients cluster near
/// * unit magnitude, so +-2 gives comfortable headroom).
pub fn res_vq_book() -> StaticCodeBook {
    const DIM: i32 = 2;
    const ENTRIES: i32 = 256;
    const QUANTVALS: i32 = 16; // floor(256^(1/2))
    StaticCodeBook {
        dim: DIM,
        entries: ENTRIES,
        lengthlist: uniform_lengths(ENTRIES),
        maptype: 1,
        q_min: -2.0,
        q_delta: 4.0 / (QUANTVALS - 1) as f32,
        q_quant: ilog!(QUANTVALS - 1) as i32,
        q_sequencep: false,
        quantlist: (0..QUANTVALS).collect(),
    }
}

/// * All the static codebooks this crate's templates reference, in index
/// * order (`0` = floor delta book, `1` = residue classbook, `2` = residue
/// * VQ book).
pub fn static_codebooks() -> Vec<StaticCodeBook> {
    vec![floor_delta_book(), res_classbook(), res_vq_book()]
}

pub const FLOOR_DELTA_BOOK_IDX: i32 = 0;
pub const RES_CLASSBOOK_IDX: i32 = 1;
pub const RES_VQ_BOOK_IDX: i32 = 2;

/// * Builds a single-book-per-class, no-subclass-split floor: `classes.len()`
/// * classes each with one dimension count and one coding book (every class
/// * uses [`FLOOR_DELTA_BOOK_IDX`]), `partitions_class` assigns each
/// * partition its class, and `xvalues` supplies every partition's X
/// * template points in partition order (`sum(class dims) == xvalues.len()`).
fn build_floor(rangebits: i32, partitions_class: &[i32], class_dims: &[i32], xvalues: &[i32]) -> VorbisFloor1 {
    let maxclass = class_dims.len();
    let mut ret = VorbisFloor1 {
        partitions: partitions_class.len() as i32,
        mult: 2,
        ..Default::default()
    };
    ret.partitions_class.resize(partitions_class.len(), 0);
    for (i, &c) in partitions_class.iter().enumerate() {
        ret.partitions_class[i] = c;
    }
    ret.class_dim.resize(maxclass, 0);
    ret.class_subs.resize(maxclass, 0);
    ret.class_book.resize(maxclass, 0);
    ret.class_subbook.resize(maxclass, CopiableBuffer::default());
    for i in 0..maxclass {
        ret.class_dim[i] = class_dims[i];
        ret.class_subs[i] = 0;
        ret.class_book[i] = 0;
        ret.class_subbook[i].resize(1, 0);
        ret.class_subbook[i][0] = FLOOR_DELTA_BOOK_IDX;
    }
    let maxrange = 1i32 << rangebits;
    ret.postlist.resize(xvalues.len() + 2, 0);
    ret.postlist[0] = 0;
    ret.postlist[1] = maxrange;
    for (i, &x) in xvalues.iter().enumerate() {
        ret.postlist[i + 2] = x;
    }
    ret
}

/// * Generates `count` distinct ascending X-coordinate points in
/// * `(0, maxrange)`, geometrically spread (denser near DC) the way the
/// * original encoder's literal `a[2][27]` template tables are shaped,
/// * without copying their exact values (that table was not present in the
/// * retrieved source for this crate).
fn geometric_xpoints(count: usize, maxrange: i32) -> Vec<i32> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::with_capacity(count);
    let mut i = 1usize;
    while out.len() < count {
        let frac = (i as f32 / (count as f32 + 1.0)).powf(1.6);
        let x = (1.0 + frac * (maxrange - 2) as f32) as i32;
        if seen.insert(x) {
            out.push(x);
        }
        i += 1;
        if i as i32 > maxrange {
            break;
        }
    }
    out.sort_unstable();
    out
}

/// * The short-block floor (rangebits = 7, two classes of two points each).
pub fn short_floor() -> VorbisFloor1 {
    let xvalues = geometric_xpoints(4, 1 << 7);
    build_floor(7, &[0, 1], &[2, 2], &xvalues)
}

/// * The long-block floor (rangebits = 10, the five-class/eight-partition
/// * shape mirrored from `partition_to_class` in `create_floors`).
pub fn long_floor() -> VorbisFloor1 {
    let class_dims = [2, 2, 3, 3, 4];
    let total: i32 = PARTITION_TO_CLASS_LONG.iter().map(|&c| class_dims[c as usize]).sum();
    let xvalues = geometric_xpoints(total as usize, 1 << 10);
    build_floor(10, &PARTITION_TO_CLASS_LONG, &class_dims, &xvalues)
}

/// * Builds a residue-type-2 template for `real_ch` interleaved channels
/// * covering `samples` coefficients per channel, with [`RES_CLASSIFICATIONS`]
/// * classifications, the shared classbook/VQ book from
/// * [`static_codebooks`], and a single active cascade pass (pass 0) per
/// * classification. Mirrors `create_residues`' per-blocksize residue setup.
pub fn residue_template(real_ch: i32, samples: i32) -> VorbisResidue {
    const PARTITION_SIZE: i32 = 32;
    let mut ret = VorbisResidue {
        residue_type: 2,
        begin: 0,
        end: real_ch * samples,
        grouping: PARTITION_SIZE,
        partitions: RES_CLASSIFICATIONS,
        partvals: RES_CLASSIFICATIONS.pow(RES_CLASSWORDS as u32),
        groupbook: RES_CLASSBOOK_IDX,
        ..Default::default()
    };
    ret.secondstages.resize(RES_CLASSIFICATIONS as usize, 0);
    ret.booklist.resize(RES_CLASSIFICATIONS as usize, 0);
    for i in 0..RES_CLASSIFICATIONS as usize {
        ret.secondstages[i] = 1; // cascade bit 0 only: one pass
        ret.booklist[i] = RES_VQ_BOOK_IDX;
    }
    ret
}

/// * Index 0 = short block mode, index 1 = long block mode, matching this
/// * crate's two-floor/two-residue/two-mapping template layout throughout.
pub const MODE_TEMPLATE: [VorbisMode; 2] = [
    VorbisMode {
        block_flag: false,
        window_type: 0,
        transform_type: 0,
        mapping: 0,
    },
    VorbisMode {
        block_flag: true,
        window_type: 0,
        transform_type: 0,
        mapping: 1,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_templates_have_valid_postlists() {
        for floor in [short_floor(), long_floor()] {
            let mut sorted = floor.postlist[..].to_vec();
            sorted.sort();
            for w in sorted.windows(2) {
                assert_ne!(w[0], w[1], "postlist must have no duplicate X values");
            }
            assert_eq!(floor.postlist[0], 0);
        }
    }

    #[test]
    fn codebooks_are_internally_consistent() {
        let books = static_codebooks();
        assert_eq!(books.len(), 3);
        let vq = &books[RES_VQ_BOOK_IDX as usize];
        assert_eq!(vq.book_maptype1_quantvals(), vq.quantlist.len() as i32);
    }

    #[test]
    fn residue_template_end_matches_interleaved_length() {
        let r = residue_template(2, 1024);
        assert_eq!(r.end - r.begin, 2048);
        assert_eq!((r.end - r.begin) % r.grouping, 0);
    }
}
