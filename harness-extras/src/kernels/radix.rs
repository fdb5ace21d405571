//! Radix sort of eight `ushort`s per work-item.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void radix_sort8(__global ushort8* global_data) {
        /* Sorts the eight lanes of global_data[get_global_id(0)] one bit
           at a time, least significant first. Each pass moves the lanes
           whose bit is clear ahead of those whose bit is set, keeping
           their order. */
    }
"#;

/// One least-significant-digit pass per bit of a `ushort`.
pub fn sort_lanes(lanes: [u16; 8]) -> [u16; 8] {
    (0..16).fold(lanes, |lanes, bit| {
        let mut sorted = [0u16; 8];
        let (clear, set): (Vec<u16>, Vec<u16>) = lanes.iter()
            .partition(|&&v| v & (1 << bit) == 0);
        for (slot, v) in sorted.iter_mut().zip(clear.into_iter().chain(set)) {
            *slot = v;
        }
        sorted
    })
}

pub fn radix_sort8(group: &WorkGroup) -> Result<()> {
    let global_data = group.global::<[u16; 8]>(0)?;
    for item in group.items() {
        let cell = global_data.get(item.global_id[0]).ok_or_else(|| format!(
            "radix_sort8: work-item {} is past the end of the data ({} vectors)",
            item.global_id[0], global_data.len()))?;
        cell.set(sort_lanes(cell.get()));
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("radix_sort8", radix_sort8)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_sort_ascending() {
        assert_eq!(sort_lanes([7, 3, 65535, 0, 3, 256, 1, 9]), [0, 1, 3, 3, 7, 9, 256, 65535]);
        assert_eq!(sort_lanes([5; 8]), [5; 8]);
    }
}
