//! Counting occurrences of four four-character words in a text.

use crate::core::{KernelLibrary, Result, WorkGroup};

/// Number of words packed into the `uchar16` pattern argument.
pub const WORD_COUNT: usize = 4;
pub const WORD_LEN: usize = 4;

pub const SRC: &str = r#"
    __kernel void string_search(uchar16 pattern, __global uchar* text,
            int chars_per_item, __local int* local_result,
            __global int* global_result) {

        /* Each work-item scans 'chars_per_item' starting positions and
           counts the occurrences of each of the four words held in
           'pattern'. Counts are combined in local memory, then added to
           the global results by the first work-item of each group. */
    }
"#;

/// Packs four four-byte words into a pattern argument.
///
/// ## Panics
///
/// Each word must be exactly four bytes long.
pub fn pattern(words: [&str; WORD_COUNT]) -> [u8; 16] {
    let mut pattern = [0u8; 16];
    for (w, word) in words.iter().enumerate() {
        assert_eq!(word.len(), WORD_LEN, "string_search::pattern: '{}' is not {} bytes long",
            word, WORD_LEN);
        pattern[w * WORD_LEN..(w + 1) * WORD_LEN].copy_from_slice(word.as_bytes());
    }
    pattern
}

pub fn string_search(group: &WorkGroup) -> Result<()> {
    let pattern = group.scalar::<[u8; 16]>(0)?;
    let text = group.global::<u8>(1)?;
    let chars_per_item = group.scalar::<i32>(2)?.max(0) as usize;
    let local_result = group.local::<i32>(3)?;
    let global_result = group.global::<i32>(4)?;

    for count in local_result.iter().take(WORD_COUNT) {
        count.set(0);
    }

    for item in group.items() {
        let start = item.global_id[0] * chars_per_item;
        let end = (start + chars_per_item).min(text.len());

        for pos in start..end {
            if pos + WORD_LEN > text.len() {
                break;
            }
            for (w, count) in local_result.iter().take(WORD_COUNT).enumerate() {
                let word = &pattern[w * WORD_LEN..(w + 1) * WORD_LEN];
                if (0..WORD_LEN).all(|c| text[pos + c].get() == word[c]) {
                    count.set(count.get() + 1);
                }
            }
        }
    }

    for (total, count) in global_result.iter().zip(local_result.iter()).take(WORD_COUNT) {
        total.set(total.get() + count.get());
    }
    Ok(())
}

/// Counts occurrences of each packed word on the host.
pub fn count_on_host(pattern: &[u8; 16], text: &[u8]) -> [i32; WORD_COUNT] {
    let mut counts = [0i32; WORD_COUNT];
    for (w, count) in counts.iter_mut().enumerate() {
        let word = &pattern[w * WORD_LEN..(w + 1) * WORD_LEN];
        *count = text.windows(WORD_LEN).filter(|win| *win == word).count() as i32;
    }
    counts
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new().with("string_search", string_search)
}
