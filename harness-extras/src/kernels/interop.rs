//! Kernels which write graphics-shared buffers and textures.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void fill_vbo(__global float2* vbo, float scale) {
        int i = get_global_id(0);
        int tri = i / 3;
        int corner = i % 3;
        float x = (corner == 1) ? 0.5f : -0.5f;
        float y = (corner == 2) ? 0.5f : -0.5f;
        vbo[i] = (float2)((x + tri) * scale, y * scale);
    }

    __kernel void fill_texture(__write_only image2d_t tex, float4 color) {
        int2 coord = (int2)(get_global_id(0), get_global_id(1));
        write_imagef(tex, coord, color);
    }
"#;

/// The vertex `fill_vbo` writes at index `i`.
pub fn vbo_vertex(i: usize, scale: f32) -> [f32; 2] {
    let (tri, corner) = (i / 3, i % 3);
    let x = if corner == 1 { 0.5 } else { -0.5 };
    let y = if corner == 2 { 0.5 } else { -0.5 };
    [(x + tri as f32) * scale, y * scale]
}

/// Writes three vertices per triangle, triangles side by side.
pub fn fill_vbo(group: &WorkGroup) -> Result<()> {
    let vbo = group.global::<[f32; 2]>(0)?;
    let scale = group.scalar::<f32>(1)?;
    for item in group.items() {
        let i = item.global_id[0];
        vbo[i].set(vbo_vertex(i, scale));
    }
    Ok(())
}

/// Fills a texture with one color.
pub fn fill_texture(group: &WorkGroup) -> Result<()> {
    let tex = group.image(0)?;
    let color = group.scalar::<[f32; 4]>(1)?;
    for item in group.items() {
        tex.write_imagef([item.global_id[0] as i32, item.global_id[1] as i32], color);
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("fill_vbo", fill_vbo)
        .with("fill_texture", fill_texture)
}
