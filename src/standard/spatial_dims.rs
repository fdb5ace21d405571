//! A simple way to specify the sizes or offsets of up to three dimensions.

use std::fmt::Debug;
use std::ops::Index;
use num_traits::{Num, ToPrimitive};
use crate::core::util;
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{MemLen, WorkDims};

/// Specifies a size or offset in up to three dimensions.
///
/// Custom types implementing `MemLen` and `WorkDims` may be used instead
/// for kernels whose global work size does not correspond one to one with
/// the length of their data.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum SpatialDims {
    Unspecified,
    One(usize),
    Two(usize, usize),
    Three(usize, usize, usize),
}

impl SpatialDims {
    /// Returns a new `SpatialDims`.
    ///
    /// Dimensions must be specified in order from d0 -> d1 -> d2; i.e. `d1`
    /// cannot be `Some(x)` if `d0` is `None`.
    pub fn new(d0: Option<usize>, d1: Option<usize>, d2: Option<usize>)
            -> OclResult<SpatialDims> {
        match (d0, d1, d2) {
            (Some(x), Some(y), Some(z)) => Ok(SpatialDims::Three(x, y, z)),
            (Some(x), Some(y), None) => Ok(SpatialDims::Two(x, y)),
            (Some(x), None, None) => Ok(SpatialDims::One(x)),
            (None, None, None) => Ok(SpatialDims::Unspecified),
            _ => Err(OclError::from("Dimensions must be defined from left to right. If you \
                define the 2nd dimension, you must also define the 1st, etc.")),
        }
    }

    /// Returns the number of dimensions defined by this `SpatialDims`.
    pub fn dim_count(&self) -> u32 {
        match *self {
            SpatialDims::Unspecified => 0,
            SpatialDims::One(..) => 1,
            SpatialDims::Two(..) => 2,
            SpatialDims::Three(..) => 3,
        }
    }

    /// Returns a 3D size or an error if unspecified.
    pub fn to_lens(&self) -> OclResult<[usize; 3]> {
        match *self {
            SpatialDims::Unspecified => Err("SpatialDims::to_lens: dimensions are \
                unspecified".into()),
            SpatialDims::One(x) => Ok([x, 1, 1]),
            SpatialDims::Two(x, y) => Ok([x, y, 1]),
            SpatialDims::Three(x, y, z) => Ok([x, y, z]),
        }
    }

    /// Returns a 3D offset or an error if unspecified.
    pub fn to_offset(&self) -> OclResult<[usize; 3]> {
        match *self {
            SpatialDims::Unspecified => Err("SpatialDims::to_offset: dimensions are \
                unspecified".into()),
            SpatialDims::One(x) => Ok([x, 0, 0]),
            SpatialDims::Two(x, y) => Ok([x, y, 0]),
            SpatialDims::Three(x, y, z) => Ok([x, y, z]),
        }
    }

    /// Returns the product of all contained dimensional values (equivalent to
    /// a length, area, or volume) or zero if unspecified.
    pub fn to_len(&self) -> usize {
        match *self {
            SpatialDims::Unspecified => 0,
            SpatialDims::Three(d0, d1, d2) => d0 * d1 * d2,
            SpatialDims::Two(d0, d1) => d0 * d1,
            SpatialDims::One(d0) => d0,
        }
    }

    /// Takes the length and rounds it up to the nearest multiple of `incr`.
    pub fn to_len_padded(&self, incr: usize) -> usize {
        util::padded_len(self.to_len(), incr)
    }

    /// Returns `true` if this `SpatialDims` is an `Unspecified` variant.
    pub fn is_unspecified(&self) -> bool {
        *self == SpatialDims::Unspecified
    }
}

impl Default for SpatialDims {
    fn default() -> SpatialDims {
        SpatialDims::Unspecified
    }
}

impl MemLen for SpatialDims {
    fn to_len_padded(&self, incr: usize) -> usize {
        SpatialDims::to_len_padded(self, incr)
    }

    fn to_len(&self) -> usize {
        SpatialDims::to_len(self)
    }

    fn to_lens(&self) -> [usize; 3] {
        SpatialDims::to_lens(self).unwrap_or([0, 0, 0])
    }
}

impl WorkDims for SpatialDims {
    fn dim_count(&self) -> u32 {
        SpatialDims::dim_count(self)
    }

    fn to_work_size(&self) -> Option<[usize; 3]> {
        self.to_lens().ok()
    }

    fn to_work_offset(&self) -> Option<[usize; 3]> {
        self.to_offset().ok()
    }
}

impl Index<usize> for SpatialDims {
    type Output = usize;

    fn index(&self, index: usize) -> &usize {
        match (self, index) {
            (&SpatialDims::One(ref x), 0) => x,
            (&SpatialDims::Two(ref x, _), 0) => x,
            (&SpatialDims::Two(_, ref y), 1) => y,
            (&SpatialDims::Three(ref x, _, _), 0) => x,
            (&SpatialDims::Three(_, ref y, _), 1) => y,
            (&SpatialDims::Three(_, _, ref z), 2) => z,
            _ => panic!("SpatialDims::index: index [{}] is out of range for {:?}", index, self),
        }
    }
}

impl<'a> From<&'a SpatialDims> for SpatialDims {
    fn from(sd: &'a SpatialDims) -> SpatialDims {
        *sd
    }
}

impl From<usize> for SpatialDims {
    fn from(val: usize) -> SpatialDims {
        SpatialDims::One(val)
    }
}

impl From<u32> for SpatialDims {
    fn from(val: u32) -> SpatialDims {
        SpatialDims::One(val as usize)
    }
}

impl From<i32> for SpatialDims {
    fn from(val: i32) -> SpatialDims {
        SpatialDims::One(to_usize(val))
    }
}

impl<T: Num + ToPrimitive + Debug + Copy> From<[T; 1]> for SpatialDims {
    fn from(val: [T; 1]) -> SpatialDims {
        SpatialDims::One(to_usize(val[0]))
    }
}

impl<T: Num + ToPrimitive + Debug + Copy> From<(T, T)> for SpatialDims {
    fn from(pair: (T, T)) -> SpatialDims {
        SpatialDims::Two(to_usize(pair.0), to_usize(pair.1))
    }
}

impl<T: Num + ToPrimitive + Debug + Copy> From<[T; 2]> for SpatialDims {
    fn from(pair: [T; 2]) -> SpatialDims {
        SpatialDims::Two(to_usize(pair[0]), to_usize(pair[1]))
    }
}

impl<T: Num + ToPrimitive + Debug + Copy> From<(T, T, T)> for SpatialDims {
    fn from(set: (T, T, T)) -> SpatialDims {
        SpatialDims::Three(to_usize(set.0), to_usize(set.1), to_usize(set.2))
    }
}

impl<T: Num + ToPrimitive + Debug + Copy> From<[T; 3]> for SpatialDims {
    fn from(set: [T; 3]) -> SpatialDims {
        SpatialDims::Three(to_usize(set[0]), to_usize(set[1]), to_usize(set[2]))
    }
}

impl<'a, T: Num + ToPrimitive + Debug + Copy> From<&'a [T; 3]> for SpatialDims {
    fn from(set: &'a [T; 3]) -> SpatialDims {
        SpatialDims::from(*set)
    }
}

/// Converts a dimension to `usize`. Negative values become zero, which
/// every enqueue function rejects as a work size.
#[inline]
pub fn to_usize<T: Num + ToPrimitive + Debug + Copy>(val: T) -> usize {
    val.to_usize().unwrap_or(0)
}
