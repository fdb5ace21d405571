//! Counts occurrences of four words in a text on the device.
//!
//! Pass a file path to search it instead of the built-in text.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::{ProQue, Result};
use harness_extras::kernels::search;

const WORDS: [&str; 4] = ["that", "with", "have", "from"];
const GLOBAL_SIZE: usize = 64;
const LOCAL_SIZE: usize = 16;

const TEXT: &str = "That was the year we learned what we could have done with less. \
    Letters came from home with news that nobody wanted, and we read them with care. \
    From the hill we could see that the river would have to be crossed, with or without \
    the bridge that had been promised. Nobody asked what the promise was worth; we knew \
    that we would have to carry what we had, and carry it from there.";

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

fn string_search() -> Result<()> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => TEXT.as_bytes().to_vec(),
    };
    if text.is_empty() {
        return Err("the text is empty".into());
    }

    let pro_que = ProQue::builder()
        .src_file(kernel_file("search.cl")?)
        .kernels(search::library())
        .dims(GLOBAL_SIZE)
        .build()?;

    let pattern = search::pattern(WORDS);
    let text_buf = pro_que.buffer_builder::<u8>()
        .len(text.len())
        .copy_host_slice(&text)
        .build()?;
    let result_buf = pro_que.buffer_builder::<i32>().len(WORDS.len()).fill_val(0).build()?;
    let chars_per_item = (text.len() / GLOBAL_SIZE + 1) as i32;

    let kernel = pro_que.kernel_builder("string_search")
        .arg(pattern)
        .arg(&text_buf)
        .arg(chars_per_item)
        .arg_local::<i32>(WORDS.len())
        .arg(&result_buf)
        .local_work_size(LOCAL_SIZE)
        .build()?;
    kernel.enq()?;

    let mut counts = vec![0i32; WORDS.len()];
    result_buf.read(&mut counts).enq()?;

    let expected = search::count_on_host(&pattern, &text);
    println!("Searched {} characters:", text.len());
    for ((word, found), expected) in WORDS.iter().zip(counts.iter()).zip(expected.iter()) {
        println!("    '{}': {} (host: {})", word, found, expected);
    }
    if counts[..] != expected[..] {
        return Err("device and host counts differ".into());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = string_search() {
        println!("{}", err);
        std::process::exit(1);
    }
}
