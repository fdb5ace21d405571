//! Reads and writes rectangular regions of a buffer viewed as a 10x8 grid.

use ocl_harness::{ProQue, Result};
use harness_extras::kernels::misc;

const ROW_LEN: usize = 10;
const ROWS: usize = 8;
const LEN: usize = ROW_LEN * ROWS;

fn print_grid(label: &str, grid: &[f32]) {
    println!("{}:", label);
    for row in grid.chunks(ROW_LEN) {
        let cells: Vec<String> = row.iter().map(|v| format!("{:4}", v)).collect();
        println!("    {}", cells.join(""));
    }
}

fn rect() -> Result<()> {
    let pro_que = ProQue::builder()
        .src(misc::SRC)
        .kernels(misc::library())
        .dims(LEN)
        .build()?;

    let data: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let buffer = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build()?;
    let pitch = ROW_LEN * std::mem::size_of::<f32>();

    // A 4x4 block from column 5, row 3 of the buffer into column 1, row 1
    // of the host grid.
    let mut host = vec![0.0f32; LEN];
    buffer.read(&mut host)
        .rect([5, 3, 0], [1, 1, 0], [4, 4, 1], pitch, 0, pitch, 0)
        .enq()?;
    print_grid("Rectangular read", &host);

    for (row, start) in (1..5).zip([35, 45, 55, 65].iter()) {
        let expected: Vec<f32> = (*start..*start + 4).map(|v| v as f32).collect();
        if host[row * ROW_LEN + 1..row * ROW_LEN + 5] != expected[..] {
            return Err(format!("row {} of the read does not match", row).into());
        }
    }
    let untouched = host.iter().enumerate()
        .filter(|&(i, _)| !((1..5).contains(&(i % ROW_LEN)) && (1..5).contains(&(i / ROW_LEN))))
        .all(|(_, &v)| v == 0.0);
    if !untouched {
        return Err("the read wrote outside of its region".into());
    }

    // A 2x3 block of -1 written to column 2, row 1.
    let block = vec![-1.0f32; 2 * 3];
    buffer.write(&block)
        .rect([0, 0, 0], [2, 1, 0], [2, 3, 1], 2 * std::mem::size_of::<f32>(), 0, pitch, 0)
        .enq()?;
    buffer.read(&mut host).enq()?;
    print_grid("After rectangular write", &host);

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = rect() {
        println!("{}", err);
        std::process::exit(1);
    }
}
