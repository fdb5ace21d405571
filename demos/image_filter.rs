//! Smooths a checkerboard image with a 3x3 box filter and prints a row
//! before and after.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::enums::{AddressingMode, FilterMode, ImageChannelDataType, ImageChannelOrder};
use ocl_harness::flags::MemFlags;
use ocl_harness::{Image, ProQue, Result, Sampler};
use harness_extras::kernels::image;

const WIDTH: usize = 32;
const HEIGHT: usize = 16;
const SQUARE: usize = 4;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

/// RGBA texels, white on even squares and black on odd ones.
fn checkerboard() -> Vec<f32> {
    (0..HEIGHT).flat_map(|y| (0..WIDTH).flat_map(move |x| {
        let v = if (x / SQUARE + y / SQUARE) % 2 == 0 { 1.0 } else { 0.0 };
        vec![v, v, v, 1.0]
    })).collect()
}

fn print_row(label: &str, pixels: &[f32], y: usize) {
    let row: Vec<String> = (0..WIDTH).map(|x| format!("{:.2}", pixels[(y * WIDTH + x) * 4]))
        .collect();
    println!("{}: {}", label, row.join(" "));
}

fn filter() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("image.cl")?)
        .kernels(image::library())
        .dims([WIDTH, HEIGHT])
        .build()?;

    let pixels = checkerboard();
    let src = Image::<f32>::builder()
        .channel_order(ImageChannelOrder::Rgba)
        .channel_data_type(ImageChannelDataType::Float)
        .dims([WIDTH, HEIGHT])
        .flags(MemFlags::new().read_only())
        .copy_host_slice(&pixels)
        .queue(pro_que.queue().clone())
        .build()?;
    let dst = Image::<f32>::builder()
        .channel_order(ImageChannelOrder::Rgba)
        .channel_data_type(ImageChannelDataType::Float)
        .dims([WIDTH, HEIGHT])
        .flags(MemFlags::new().write_only())
        .queue(pro_que.queue().clone())
        .build()?;
    println!("{}", src);

    let sampler = Sampler::new(pro_que.context(), false, AddressingMode::ClampToEdge,
        FilterMode::Nearest)?;
    let kernel = pro_que.kernel_builder("texture_filter")
        .arg(&src)
        .arg_sampler(&sampler)
        .arg(&dst)
        .build()?;
    kernel.enq()?;

    let mut out = vec![0.0f32; pixels.len()];
    dst.read(&mut out).enq()?;

    let y = SQUARE / 2;
    print_row("before", &pixels, y);
    print_row(" after", &out, y);

    // Away from square edges the filter sees a single color.
    let center = (y * WIDTH + SQUARE / 2) * 4;
    if (out[center] - pixels[center]).abs() > 1e-6 {
        return Err(format!("expected {} at a square's center, found {}", pixels[center],
            out[center]).into());
    }
    // On an edge it sees three columns, one of them from the next square.
    let edge = (y * WIDTH + SQUARE - 1) * 4;
    if (out[edge] - 2.0 / 3.0).abs() > 1e-6 {
        return Err(format!("expected 0.67 at a square's edge, found {}", out[edge]).into());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = filter() {
        println!("{}", err);
        std::process::exit(1);
    }
}
