//! Streaming k-way merge of weight-sorted shard files.
//!
//! Each shard is already sorted by weight descending. The merge keeps one
//! buffered row per shard in a min-heap keyed on the negated weight so the
//! globally-largest weight is always popped next, writes it to the output,
//! refills from that shard's reader, and deletes the shard file once its
//! reader is exhausted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs;
use std::path::{Path, PathBuf};

use rlink_error::Result;

use crate::shard::WEIGHT_COLUMN;

struct HeapEntry {
    weight: f64,
    record: csv::StringRecord,
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight.total_cmp(&other.weight)
    }
}

/// Merges `shard_paths` into a single CSV at `out_path`, sorted by weight
/// descending, and deletes each shard file as it's exhausted. Returns the
/// shared header written to `out_path`.
pub fn merge_shards(shard_paths: &[PathBuf], out_path: &Path) -> Result<()> {
    if shard_paths.is_empty() {
        csv::Writer::from_path(out_path)?.flush()?;
        return Ok(());
    }

    let mut readers: Vec<csv::Reader<fs::File>> = shard_paths
        .iter()
        .map(csv::Reader::from_path)
        .collect::<std::result::Result<_, _>>()?;

    let header = readers[0].headers()?.clone();
    let mut writer = csv::Writer::from_path(out_path)?;
    writer.write_record(&header)?;

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    for (source, reader) in readers.iter_mut().enumerate() {
        push_next(reader, source, &mut heap)?;
    }

    while let Some(entry) = heap.pop() {
        writer.write_record(&entry.record)?;
        push_next(&mut readers[entry.source], entry.source, &mut heap)?;
    }
    writer.flush()?;

    for path in shard_paths {
        let _ = fs::remove_file(path);
    }
    Ok(())
}

fn push_next(reader: &mut csv::Reader<fs::File>, source: usize, heap: &mut BinaryHeap<HeapEntry>) -> Result<()> {
    let mut record = csv::StringRecord::new();
    if reader.read_record(&mut record)? {
        let weight: f64 = record
            .get(WEIGHT_COLUMN)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);
        heap.push(HeapEntry { weight, record, source });
    }
    Ok(())
}
