//! Image reads and writes, and sampling through each addressing mode.

use harness_extras::kernels::image;
use crate::enums::{AddressingMode, FilterMode, ImageChannelDataType, ImageChannelOrder, Status};
use crate::standard::{Buffer, Image, Kernel, ProQue, Sampler};

const WIDTH: usize = 4;
const HEIGHT: usize = 4;

/// Texel `(x, y)` holds `[x, y, 0, 1]`.
fn coord_pixels() -> Vec<f32> {
    (0..HEIGHT).flat_map(|y| (0..WIDTH).flat_map(move |x| vec![x as f32, y as f32, 0.0, 1.0]))
        .collect()
}

fn pro_que() -> ProQue {
    ProQue::builder()
        .src(image::SRC)
        .kernels(image::library())
        .dims([WIDTH, HEIGHT])
        .build().unwrap()
}

fn float_image(pro_que: &ProQue, pixels: &[f32]) -> Image<f32> {
    Image::<f32>::builder()
        .channel_order(ImageChannelOrder::Rgba)
        .channel_data_type(ImageChannelDataType::Float)
        .dims([WIDTH, HEIGHT])
        .copy_host_slice(pixels)
        .queue(pro_que.queue().clone())
        .build().unwrap()
}

/// Samples `img` at each of `coords` through an `image_sample` kernel.
struct Sampling {
    kernel: Kernel,
    coords: Buffer<[f32; 2]>,
    out: Buffer<[f32; 4]>,
}

impl Sampling {
    fn new(pro_que: &ProQue, img: &Image<f32>, sampler: &Sampler, num_coords: usize) -> Sampling {
        let coords = pro_que.buffer_builder::<[f32; 2]>().len(num_coords).build().unwrap();
        let out = pro_que.buffer_builder::<[f32; 4]>().len(num_coords).build().unwrap();
        let kernel = pro_que.kernel_builder("image_sample")
            .arg(img)
            .arg_sampler(sampler)
            .arg(&coords)
            .arg(&out)
            .global_work_size(num_coords)
            .build().unwrap();
        Sampling { kernel, coords, out }
    }

    fn sample(&self, sampler: &Sampler, coords: &[[f32; 2]]) -> Vec<[f32; 4]> {
        self.kernel.set_arg_sampler(1u32, sampler).unwrap();
        self.coords.write(coords).enq().unwrap();
        self.kernel.enq().unwrap();
        let mut out = vec![[0.0f32; 4]; coords.len()];
        self.out.read(&mut out).enq().unwrap();
        out
    }
}

#[test]
fn write_then_read_image() {
    let pro_que = pro_que();
    let pixels = coord_pixels();
    let img = float_image(&pro_que, &vec![0.0; pixels.len()]);

    assert_eq!(img.pixel_element_len(), 4);
    assert_eq!(img.element_count(), pixels.len());

    img.write(&pixels).enq().unwrap();
    let mut out = vec![-1.0f32; pixels.len()];
    img.read(&mut out).enq().unwrap();
    assert_eq!(out, pixels);

    // A 2x2 region starting at (1, 2).
    let mut region = vec![0.0f32; 2 * 2 * 4];
    img.read(&mut region).origin([1, 2]).region([2, 2]).enq().unwrap();
    assert_eq!(&region[..4], &[1.0, 2.0, 0.0, 1.0]);
    assert_eq!(&region[12..], &[2.0, 3.0, 0.0, 1.0]);
}

#[test]
fn addressing_modes() {
    let pro_que = pro_que();
    let img = float_image(&pro_que, &coord_pixels());
    let context = pro_que.context();

    let clamp_to_edge = Sampler::new(context, false, AddressingMode::ClampToEdge,
        FilterMode::Nearest).unwrap();
    let sampling = Sampling::new(&pro_que, &img, &clamp_to_edge, 3);

    // Unnormalized coordinates address texel centers at +0.5.
    let coords = [[1.5, 2.5], [-3.0, 0.5], [9.0, 9.0]];
    let out = sampling.sample(&clamp_to_edge, &coords);
    assert_eq!(out, vec![[1.0, 2.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0], [3.0, 3.0, 0.0, 1.0]]);

    // Out of range reads return the border color, transparent black for
    // images with an alpha channel.
    let clamp = Sampler::new(context, false, AddressingMode::Clamp, FilterMode::Nearest)
        .unwrap();
    let out = sampling.sample(&clamp, &coords);
    assert_eq!(out[0], [1.0, 2.0, 0.0, 1.0]);
    assert_eq!(out[1], [0.0; 4]);
    assert_eq!(out[2], [0.0; 4]);

    let repeat = Sampler::new(context, true, AddressingMode::Repeat, FilterMode::Nearest)
        .unwrap();
    let out = sampling.sample(&repeat, &[[1.125, 0.125], [-0.125, 0.625], [0.375, 0.375]]);
    assert_eq!(out, vec![[0.0, 0.0, 0.0, 1.0], [3.0, 2.0, 0.0, 1.0], [1.0, 1.0, 0.0, 1.0]]);

    let mirrored = Sampler::new(context, true, AddressingMode::MirroredRepeat,
        FilterMode::Nearest).unwrap();
    let out = sampling.sample(&mirrored, &[[1.125, 0.125], [-0.125, 0.125], [0.875, 0.125]]);
    assert_eq!(out, vec![[3.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0], [3.0, 0.0, 0.0, 1.0]]);
}

#[test]
fn repeat_requires_normalized_coords() {
    let pro_que = pro_que();
    for &mode in &[AddressingMode::Repeat, AddressingMode::MirroredRepeat] {
        let err = Sampler::new(pro_que.context(), false, mode, FilterMode::Nearest).unwrap_err();
        assert_eq!(err.api_status(), Some(Status::InvalidValue));
    }
}

#[test]
fn linear_filter_interpolates() {
    let pro_que = pro_que();
    let img = float_image(&pro_que, &coord_pixels());
    let linear = Sampler::new(pro_que.context(), false, AddressingMode::ClampToEdge,
        FilterMode::Linear).unwrap();
    let sampling = Sampling::new(&pro_que, &img, &linear, 3);

    let out = sampling.sample(&linear, &[[1.0, 0.5], [2.5, 2.0], [2.0, 3.0]]);
    assert_eq!(out[0], [0.5, 0.0, 0.0, 1.0]);
    assert_eq!(out[1], [2.0, 1.5, 0.0, 1.0]);
    assert_eq!(out[2], [1.5, 2.5, 0.0, 1.0]);
}

#[test]
fn box_filter_preserves_a_flat_image() {
    let pro_que = pro_que();
    let flat = vec![0.25f32; WIDTH * HEIGHT * 4];
    let src = float_image(&pro_que, &flat);
    let dst = float_image(&pro_que, &vec![0.0; flat.len()]);
    let sampler = Sampler::new(pro_que.context(), false, AddressingMode::ClampToEdge,
        FilterMode::Nearest).unwrap();

    let kernel = pro_que.kernel_builder("texture_filter")
        .arg(&src)
        .arg_sampler(&sampler)
        .arg(&dst)
        .build().unwrap();
    kernel.enq().unwrap();

    let mut out = vec![0.0f32; flat.len()];
    dst.read(&mut out).enq().unwrap();
    for v in out {
        assert!((v - 0.25).abs() < 1e-6, "{}", v);
    }
}
