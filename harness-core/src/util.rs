//! Utility functions.
//!
//! Rectangular transfers address memory as `origin[0]` bytes into a row,
//! `origin[1]` rows into a slice, and `origin[2]` slices in. A pitch of zero
//! means tightly packed.

use crate::error::{api_err, Result};
use crate::{OclPrm, Status};

/// Pads `len` to make it evenly divisible by `incr`.
pub fn padded_len(len: usize, incr: usize) -> usize {
    let len_mod = len % incr;

    if len_mod == 0 {
        len
    } else {
        let pad = incr - len_mod;
        let padded_len = len + pad;
        debug_assert_eq!(padded_len % incr, 0);
        padded_len
    }
}

/// Copies a slice of any primitive into a new byte vector.
pub fn to_bytes<T: OclPrm>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

/// Copies bytes into a new vector of `T`. Trailing bytes which do not make
/// up a whole element are ignored.
pub fn from_bytes<T: OclPrm>(bytes: &[u8]) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    bytes.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect()
}

/// A validated rectangle geometry: row and slice pitches with zeros
/// resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectPitch {
    pub row: usize,
    pub slice: usize,
}

/// Resolves and validates the pitches of a rectangle.
pub fn rect_pitch(region: [usize; 3], row_pitch: usize, slc_pitch: usize, fn_name: &'static str)
        -> Result<RectPitch> {
    if region.iter().any(|&r| r == 0) {
        return Err(api_err(Status::InvalidValue, fn_name,
            format!("region dimensions must be non-zero: {:?}", region)));
    }

    let row = if row_pitch == 0 { region[0] } else { row_pitch };
    if row < region[0] {
        return Err(api_err(Status::InvalidValue, fn_name,
            format!("row pitch ({}) is less than the region width ({})", row, region[0])));
    }

    let slice = if slc_pitch == 0 { region[1] * row } else { slc_pitch };
    if slice < region[1] * row || slice % row != 0 {
        return Err(api_err(Status::InvalidValue, fn_name, format!("slice pitch ({}) must be a \
            multiple of the row pitch ({}) of at least {} bytes", slice, row, region[1] * row)));
    }

    Ok(RectPitch { row, slice })
}

/// Returns one past the last byte touched by a rectangle.
pub fn rect_extent(origin: [usize; 3], region: [usize; 3], pitch: RectPitch) -> usize {
    rect_offset(origin, pitch)
        + (region[2] - 1) * pitch.slice
        + (region[1] - 1) * pitch.row
        + region[0]
}

fn rect_offset(origin: [usize; 3], pitch: RectPitch) -> usize {
    origin[2] * pitch.slice + origin[1] * pitch.row + origin[0]
}

/// Copies a rectangle of bytes from `src` to `dst`.
///
/// Both extents must already have been checked against the slice lengths.
pub fn copy_rect(src: &[u8], src_origin: [usize; 3], src_pitch: RectPitch, dst: &mut [u8],
        dst_origin: [usize; 3], dst_pitch: RectPitch, region: [usize; 3]) {
    let src_base = rect_offset(src_origin, src_pitch);
    let dst_base = rect_offset(dst_origin, dst_pitch);

    for z in 0..region[2] {
        for y in 0..region[1] {
            let s = src_base + z * src_pitch.slice + y * src_pitch.row;
            let d = dst_base + z * dst_pitch.slice + y * dst_pitch.row;
            dst[d..d + region[0]].copy_from_slice(&src[s..s + region[0]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_len_rounds_up() {
        assert_eq!(padded_len(0, 64), 0);
        assert_eq!(padded_len(65, 64), 128);
        assert_eq!(padded_len(128, 64), 128);
    }

    #[test]
    fn rect_pitch_defaults_and_validation() {
        let pitch = rect_pitch([16, 4, 1], 0, 0, "test").unwrap();
        assert_eq!(pitch, RectPitch { row: 16, slice: 64 });

        assert!(rect_pitch([16, 4, 1], 8, 0, "test").is_err());
        assert!(rect_pitch([16, 0, 1], 0, 0, "test").is_err());
        assert!(rect_pitch([4, 2, 2], 8, 20, "test").is_err());
    }

    #[test]
    fn copy_rect_moves_rows() {
        // 4x3 source, copy the 2x2 block at (1, 1) into the corner of a 3x3.
        let src: Vec<u8> = (0..12).collect();
        let mut dst = vec![0u8; 9];
        let sp = rect_pitch([2, 2, 1], 4, 0, "test").unwrap();
        let dp = rect_pitch([2, 2, 1], 3, 0, "test").unwrap();

        assert_eq!(rect_extent([1, 1, 0], [2, 2, 1], sp), 11);
        copy_rect(&src, [1, 1, 0], sp, &mut dst, [0, 0, 0], dp, [2, 2, 1]);
        assert_eq!(dst, vec![5, 6, 0, 9, 10, 0, 0, 0, 0]);
    }
}
