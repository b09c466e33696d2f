//! Grouping of consecutive sentences into fixed-size chunks

use veriscan_core::{Chunk, Sentence};

/// Partition `sentences` into consecutive chunks of `chunk_size` (the last
/// may be shorter). Every sentence belongs to exactly one chunk and order is
/// preserved. A `chunk_size` of zero is treated as one.
pub fn build_chunks(sentences: &[Sentence], chunk_size: usize) -> Vec<Chunk> {
    let size = chunk_size.max(1);

    sentences
        .chunks(size)
        .enumerate()
        .map(|(index, members)| {
            let start = index * size;
            Chunk {
                index,
                range: start..start + members.len(),
                text: members
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        })
        .collect()
}
