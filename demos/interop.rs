//! Shares a vertex buffer and a texture between a graphics context and the
//! compute device.
//!
//! A kernel writes three triangles into the vertex buffer and a solid color
//! into the texture. Each object is acquired before the kernel runs and
//! released after, then read back from the graphics side.

use std::path::PathBuf;
use find_folder::Search;
use harness_interop::{GlContext, InteropResult};
use ocl_harness::builders::ImageFormat;
use ocl_harness::{Buffer, Error as OclError, Image, ProQue};
use harness_extras::kernels::interop;

// 3 triangles, 3 vertices per triangle.
const VERTEX_COUNT: usize = 9;
const SCALE: f32 = 0.25;
const TEX_WIDTH: usize = 16;
const TEX_HEIGHT: usize = 16;
const COLOR: [f32; 4] = [0.0, 0.5, 1.0, 1.0];

fn kernel_file(name: &str) -> InteropResult<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| OclError::from(format!("unable to locate the demos folder: {:?}", err)))?;
    Ok(demos.join("kernels").join(name))
}

fn share() -> InteropResult<()> {
    let gl = GlContext::new();
    gl.make_current();

    let context = harness_interop::get_context()?;
    println!("Sharing context: {}", context);

    let mut pro_que = ProQue::builder()
        .context(context)
        .src_file(kernel_file("interop.cl")?)
        .kernels(interop::library())
        .dims(VERTEX_COUNT)
        .build()?;

    let vbo = gl.create_buffer(VERTEX_COUNT * std::mem::size_of::<[f32; 2]>());
    let vertices = Buffer::<[f32; 2]>::from_gl_buffer(pro_que.queue(), None, vbo.clone())?;
    let fill_vbo = pro_que.kernel_builder("fill_vbo")
        .arg(&vertices)
        .arg(SCALE)
        .build()?;

    vertices.cmd().gl_acquire().enq()?;
    fill_vbo.enq()?;
    vertices.cmd().gl_release().enq()?;
    pro_que.queue().finish()?;

    for (i, v) in vbo.contents::<[f32; 2]>().iter().enumerate() {
        println!("    vertex {}: {:?}", i, v);
        if *v != interop::vbo_vertex(i, SCALE) {
            return Err(OclError::from(format!("vertex {} was not written", i)).into());
        }
    }

    let texture = gl.create_texture(TEX_WIDTH, TEX_HEIGHT, ImageFormat::new_rgba())?;
    texture.tex_image(&vec![0.0f32; TEX_WIDTH * TEX_HEIGHT * 4])?;
    gl.finish();

    pro_que.set_dims([TEX_WIDTH, TEX_HEIGHT]);
    let image = Image::<f32>::from_gl_texture_2d(pro_que.queue(), None, texture.clone(),
        texture.format(), TEX_WIDTH, TEX_HEIGHT)?;
    let fill_texture = pro_que.kernel_builder("fill_texture")
        .arg(&image)
        .arg(COLOR)
        .build()?;

    image.cmd().gl_acquire().enq()?;
    fill_texture.enq()?;
    image.cmd().gl_release().enq()?;
    pro_que.queue().finish()?;

    let pixels: Vec<f32> = texture.read_pixels();
    if pixels.chunks(4).any(|texel| texel != COLOR) {
        return Err(OclError::from("the texture was not filled").into());
    }
    println!("Texture {} filled with {:?}.", texture.name(), COLOR);

    GlContext::release_current();
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = share() {
        println!("{}", err);
        std::process::exit(1);
    }
}
