//! Randomized input vectors.

use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use crate::core::OclScl;


/// Returns a vector of length `size` filled with random values drawn
/// uniformly from the half-open range `[vals.0, vals.1)`.
pub fn scrambled_vec<T>(vals: (T, T), size: usize) -> Vec<T> where T: OclScl + SampleUniform {
    assert!(size > 0, "scrambled_vec: Vector size must be greater than zero.");
    assert!(vals.0 < vals.1, "scrambled_vec: Minimum value must be less than maximum.");
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen_range(vals.0..vals.1)).collect()
}

/// Returns a vector with length `size` which is first filled with each
/// integer value in the (inclusive) range `[vals.0, vals.1]`, repeating if
/// `size` is greater than the number of integers in that range, then
/// shuffled.
pub fn shuffled_vec<T: OclScl>(vals: (T, T), size: usize) -> Vec<T> {
    assert!(size > 0, "shuffled_vec: Vector size must be greater than zero.");
    assert!(vals.0 < vals.1, "shuffled_vec: Minimum value must be less than maximum.");
    let min = vals.0.to_i64().unwrap_or(0);
    let max = vals.1.to_i64().unwrap_or(0) + 1;

    let mut vec: Vec<T> = (min..max).cycle()
        .take(size)
        .map(|v| T::from_i64(v).unwrap_or_else(T::zero))
        .collect();

    shuffle(&mut vec);
    vec
}

/// Shuffles the values in a slice using a single pass of Fisher-Yates.
pub fn shuffle<T>(vec: &mut [T]) {
    let len = vec.len();
    let mut rng = rand::thread_rng();
    for i in 0..len {
        let ridx = rng.gen_range(i..len);
        vec.swap(i, ridx);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrambled_values_stay_in_range() {
        let vec = scrambled_vec((-5.0f32, 5.0), 1000);
        assert_eq!(vec.len(), 1000);
        assert!(vec.iter().all(|&v| v >= -5.0 && v < 5.0));
    }

    #[test]
    fn shuffled_values_repeat_the_range() {
        let mut vec = shuffled_vec((0u32, 9), 30);
        vec.sort_unstable();
        let expected: Vec<u32> = (0..10).flat_map(|v| vec![v; 3]).collect();
        assert_eq!(vec, expected);
    }
}
