//! Types related to futures and asynchrony.

mod future_mem_map;
mod mem_map;
mod rw_vec;

pub use self::future_mem_map::FutureMemMap;
pub use self::mem_map::{MemMap, MemUnmapCmd};
pub use self::rw_vec::{ReadGuard, RwVec, WriteGuard};
