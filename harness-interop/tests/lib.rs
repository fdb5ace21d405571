use std::sync::Arc;
use harness_extras::kernels::interop;
use harness_interop::{GlContext, InteropError};
use ocl_harness::builders::ImageFormat;
use ocl_harness::core::GlObject;
use ocl_harness::enums::Status;
use ocl_harness::{Buffer, Context, Event, Image, ProQue};

// 3 triangles, 3 vertices per triangle.
const BUFFER_LENGTH: usize = 9;
const TEX_WIDTH: usize = 8;
const TEX_HEIGHT: usize = 4;

fn pro_que(context: Context, dims: usize) -> ProQue {
    ProQue::builder()
        .context(context)
        .src(interop::SRC)
        .kernels(interop::library())
        .dims(dims)
        .build().unwrap()
}

#[test]
fn context_requires_a_current_graphics_context() {
    GlContext::release_current();
    match harness_interop::get_context() {
        Err(InteropError::NoCurrentContext) => (),
        other => panic!("expected no current context, found: {:?}", other.map(|_| ())),
    }
}

#[test]
fn shared_objects_require_a_sharing_context() {
    let gl = GlContext::new();
    let vbo = gl.create_buffer(BUFFER_LENGTH * 8);

    let plain = Context::builder().build().unwrap();
    let err = Buffer::<[f32; 2]>::from_gl_buffer(&plain, None, vbo).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidGlSharegroupReferenceKhr));
}

#[test]
fn kernel_fills_a_vertex_buffer() {
    let gl = GlContext::new();
    gl.make_current();
    let context = harness_interop::get_context().unwrap();
    let pro_que = pro_que(context, BUFFER_LENGTH);

    let vbo = gl.create_buffer(BUFFER_LENGTH * 8);
    let gl_object: Arc<dyn GlObject> = vbo.clone();
    let buffer = Buffer::<[f32; 2]>::from_gl_buffer(pro_que.queue(), None, gl_object).unwrap();
    assert_eq!(buffer.len(), BUFFER_LENGTH);

    let kernel = pro_que.kernel_builder("fill_vbo")
        .arg(&buffer)
        .arg(0.5f32)
        .build().unwrap();

    // Not yet acquired.
    let mut event = Event::empty();
    kernel.cmd().enew(&mut event).enq().unwrap();
    let err = event.wait_for().unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidOperation));

    buffer.cmd().gl_acquire().enq().unwrap();
    kernel.enq().unwrap();
    buffer.cmd().gl_release().enq().unwrap();
    pro_que.queue().finish().unwrap();

    let vertices: Vec<[f32; 2]> = vbo.contents();
    for (i, v) in vertices.iter().enumerate() {
        assert_eq!(*v, interop::vbo_vertex(i, 0.5), "vertex: {}", i);
    }

    // Releasing twice fails the command.
    let mut event = Event::empty();
    buffer.cmd().gl_release().enew(&mut event).enq().unwrap();
    assert!(event.wait_for().is_err());
    GlContext::release_current();
}

#[test]
fn sub_buffers_follow_their_parent_acquisition() {
    let gl = GlContext::new();
    gl.make_current();
    let context = harness_interop::get_context().unwrap();
    let pro_que = pro_que(context, BUFFER_LENGTH);

    let vbo = gl.create_buffer(BUFFER_LENGTH * 8);
    let buffer = Buffer::<[f32; 2]>::from_gl_buffer(pro_que.queue(), None, vbo.clone())
        .unwrap();
    let sub_buffer = buffer.create_sub_buffer(None, 4, 4).unwrap();

    let kernel = pro_que.kernel_builder("fill_vbo")
        .arg(&sub_buffer)
        .arg(0.5f32)
        .global_work_size(4)
        .build().unwrap();

    // The parent is not acquired, so neither kernels nor transfers may run.
    let mut event = Event::empty();
    kernel.cmd().enew(&mut event).enq().unwrap();
    let err = event.wait_for().unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidOperation));
    let mut out = vec![[0.0f32; 2]; 4];
    assert!(sub_buffer.read(&mut out).enq().is_err());

    buffer.cmd().gl_acquire().enq().unwrap();
    kernel.enq().unwrap();
    buffer.cmd().gl_release().enq().unwrap();
    pro_que.queue().finish().unwrap();

    let vertices: Vec<[f32; 2]> = vbo.contents();
    for (i, v) in vertices.iter().enumerate() {
        if (4..8).contains(&i) {
            assert_eq!(*v, interop::vbo_vertex(i - 4, 0.5), "vertex: {}", i);
        } else {
            assert_eq!(*v, [0.0, 0.0], "vertex: {}", i);
        }
    }
    GlContext::release_current();
}

#[test]
fn graphics_writes_need_a_finish() {
    let gl = GlContext::new();
    gl.make_current();
    let context = harness_interop::get_context().unwrap();
    let pro_que = pro_que(context, BUFFER_LENGTH);

    let vbo = gl.create_buffer(BUFFER_LENGTH * 8);
    let buffer = Buffer::<[f32; 2]>::from_gl_buffer(pro_que.queue(), None, vbo.clone())
        .unwrap();
    let data = vec![[1.0f32, 2.0]; BUFFER_LENGTH];
    vbo.buffer_data(&data).unwrap();

    let read = |buffer: &Buffer<[f32; 2]>| {
        buffer.cmd().gl_acquire().enq().unwrap();
        let mut out = vec![[0.0f32; 2]; BUFFER_LENGTH];
        buffer.read(&mut out).enq().unwrap();
        buffer.cmd().gl_release().enq().unwrap();
        pro_que.queue().finish().unwrap();
        out
    };

    // The write is still queued on the graphics side.
    assert_eq!(read(&buffer), vec![[0.0f32; 2]; BUFFER_LENGTH]);

    gl.finish();
    assert_eq!(read(&buffer), data);

    assert!(vbo.buffer_data(&[0u8; 3]).is_err());
    GlContext::release_current();
}

#[test]
fn kernel_fills_a_texture() {
    let gl = GlContext::new();
    gl.make_current();
    let context = harness_interop::get_context().unwrap();
    let pro_que = ProQue::builder()
        .context(context)
        .src(interop::SRC)
        .kernels(interop::library())
        .dims([TEX_WIDTH, TEX_HEIGHT])
        .build().unwrap();

    let texture = gl.create_texture(TEX_WIDTH, TEX_HEIGHT, ImageFormat::new_rgba()).unwrap();
    texture.tex_image(&vec![0.25f32; TEX_WIDTH * TEX_HEIGHT * 4]).unwrap();
    gl.finish();

    let image = Image::<f32>::from_gl_texture_2d(pro_que.queue(), None, texture.clone(),
        texture.format(), TEX_WIDTH, TEX_HEIGHT).unwrap();

    let color = [1.0f32, 0.5, 0.0, 1.0];
    let kernel = pro_que.kernel_builder("fill_texture")
        .arg(&image)
        .arg(color)
        .build().unwrap();

    image.cmd().gl_acquire().enq().unwrap();
    kernel.enq().unwrap();
    image.cmd().gl_release().enq().unwrap();
    pro_que.queue().finish().unwrap();

    let pixels: Vec<f32> = texture.read_pixels();
    assert_eq!(pixels.len(), TEX_WIDTH * TEX_HEIGHT * 4);
    for texel in pixels.chunks(4) {
        assert_eq!(texel, &color);
    }
    GlContext::release_current();
}

#[test]
fn texture_size_must_match_its_format() {
    let gl = GlContext::new();
    let texture = gl.create_texture(4, 4, ImageFormat::new_rgba()).unwrap();
    match texture.tex_image(&[0.0f32; 4]) {
        Err(InteropError::TextureSize { found, expected, .. }) => {
            assert_eq!((found, expected), (16, 256));
        },
        other => panic!("expected a texture size error, found: {:?}", other),
    }
}
