//! Square matrices of `float`s stored row-major as `float4`s.
//!
//! `transpose` works in place on 4x4 blocks: the work-item for block
//! `(row, col)` on or above the diagonal swaps it, transposed, with block
//! `(col, row)`. Launch it with `size * (size + 1) / 2` work-items, where
//! `size` is the matrix dimension divided by four.
//!
//! `matrix_mult` multiplies `a_mat` by a `b_mat` which has already been
//! transposed, one row of the product per work-item.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void transpose(__global float4* g_mat, uint size) {
        /* Swaps and transposes one pair of 4x4 blocks. */
    }

    __kernel void matrix_mult(__global float4* a_mat, __global float4* b_mat,
            __global float* c_mat) {
        /* Row get_global_id(0) of the product, from dot products of rows of
           'a_mat' and rows of the transposed 'b_mat'. */
    }
"#;

/// The block `(row, col)` with `row <= col` handled by work-item `idx`,
/// counting blocks of the upper triangle row by row.
pub fn upper_block(idx: usize, size: usize) -> Option<(usize, usize)> {
    let mut rem = idx;
    for row in 0..size {
        let width = size - row;
        if rem < width {
            return Some((row, row + rem));
        }
        rem -= width;
    }
    None
}

/// Reads the 4x4 block `(row, col)` as four rows.
fn load_block(g_mat: &[std::cell::Cell<[f32; 4]>], size: usize, row: usize, col: usize)
        -> [[f32; 4]; 4] {
    let mut block = [[0.0f32; 4]; 4];
    for (r, dst) in block.iter_mut().enumerate() {
        *dst = g_mat[(4 * row + r) * size + col].get();
    }
    block
}

/// Writes `block` transposed into the 4x4 block `(row, col)`.
fn store_transposed(g_mat: &[std::cell::Cell<[f32; 4]>], size: usize, row: usize, col: usize,
        block: &[[f32; 4]; 4]) {
    for r in 0..4 {
        g_mat[(4 * row + r) * size + col].set([block[0][r], block[1][r], block[2][r],
            block[3][r]]);
    }
}

pub fn transpose(group: &WorkGroup) -> Result<()> {
    let g_mat = group.global::<[f32; 4]>(0)?;
    let size = group.scalar::<u32>(1)? as usize;
    if g_mat.len() < 4 * size * size {
        return Err(format!("transpose: {} vectors cannot hold a {}x{} matrix", g_mat.len(),
            4 * size, 4 * size).into());
    }

    for item in group.items() {
        let (row, col) = match upper_block(item.global_id[0], size) {
            Some(block) => block,
            None => continue,
        };
        let upper = load_block(g_mat, size, row, col);
        let lower = load_block(g_mat, size, col, row);
        store_transposed(g_mat, size, col, row, &upper);
        if row != col {
            store_transposed(g_mat, size, row, col, &lower);
        }
    }
    Ok(())
}

pub fn matrix_mult(group: &WorkGroup) -> Result<()> {
    let a_mat = group.global::<[f32; 4]>(0)?;
    let b_mat = group.global::<[f32; 4]>(1)?;
    let c_mat = group.global::<f32>(2)?;

    let dim = group.global_size(0);
    let size = dim / 4;
    if dim % 4 != 0 || a_mat.len() < dim * size || b_mat.len() < dim * size
            || c_mat.len() < dim * dim {
        return Err(format!("matrix_mult: the arguments cannot hold {}x{} matrices", dim,
            dim).into());
    }

    for item in group.items() {
        let row = item.global_id[0];
        for col in 0..dim {
            let sum = (0..size).fold(0.0f32, |sum, k| {
                let (a, b) = (a_mat[row * size + k].get(), b_mat[col * size + k].get());
                sum + a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
            });
            c_mat[row * dim + col].set(sum);
        }
    }
    Ok(())
}

/// Packs a row-major matrix of `dim * dim` floats into `float4`s.
pub fn to_vec4s(values: &[f32]) -> Vec<[f32; 4]> {
    values.chunks(4).map(|c| {
        let mut v = [0.0f32; 4];
        v[..c.len()].copy_from_slice(c);
        v
    }).collect()
}

/// The product of two row-major `dim * dim` matrices.
pub fn mult_on_host(a: &[f32], b: &[f32], dim: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; dim * dim];
    for i in 0..dim {
        for j in 0..dim {
            c[i * dim + j] = (0..dim).map(|k| a[i * dim + k] * b[k * dim + j]).sum();
        }
    }
    c
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("transpose", transpose)
        .with("matrix_mult", matrix_mult)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_triangle_blocks() {
        let blocks: Vec<_> = (0..7).map(|i| upper_block(i, 3)).collect();
        assert_eq!(blocks, vec![Some((0, 0)), Some((0, 1)), Some((0, 2)), Some((1, 1)),
            Some((1, 2)), Some((2, 2)), None]);
    }

    #[test]
    fn host_product() {
        let identity = [1.0, 0.0, 0.0, 1.0];
        let m = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mult_on_host(&m, &identity, 2), m.to_vec());
    }
}
