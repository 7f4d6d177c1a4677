//! Parallel match driver: dispatches a pass's candidate pairs to a
//! fixed-size worker pool in `2 * num_processes`-chunk groups, has each
//! worker score/accept/weigh/sort its own chunk and write a shard, then
//! performs a streaming weight-descending k-way merge of the shards.

mod merge;
mod shard;

use std::path::PathBuf;
use std::sync::Mutex;

use crossbeam_deque::{Injector, Steal};

use rlink_acceptor::Acceptor;
use rlink_comparers::CompiledComparer;
use rlink_error::{Result, RlinkError};
use rlink_types::pair::AcceptedPair;
use rlink_types::pass::{PassId, PassSchema};
use rlink_types::record::RecordTable;
use rlink_types::CandidatePair;

pub use merge::merge_shards;
pub use shard::write_shard;

/// Everything a worker needs to score one pass's chunks. Shared read-only
/// across every worker thread in the pass's scope.
pub struct PassContext<'a> {
    pub table_a: &'a RecordTable,
    pub table_b: &'a RecordTable,
    /// `(global_schema_index, comparer)` — a pass only computes the
    /// comparisons it's configured for, but every shard shares one schema
    /// across the whole match (see `rlink-core`), so a comparison this
    /// pass doesn't run is simply left at the missing sentinel.
    pub comparers: &'a [(usize, CompiledComparer)],
    pub schema: &'a PassSchema,
    pub acceptor: &'a dyn Acceptor,
    pub total_passes: u16,
}

struct ChunkJob {
    index: usize,
    pairs: Vec<CandidatePair>,
}

fn score_chunk(pass: &PassId, pairs: Vec<CandidatePair>, ctx: &PassContext) -> Vec<AcceptedPair> {
    let pass_indices: Vec<usize> = ctx.comparers.iter().map(|(idx, _)| *idx).collect();
    let mut accepted: Vec<AcceptedPair> = pairs
        .into_iter()
        .filter_map(|pair| {
            let row_a = &ctx.table_a.rows[pair.idx_a as usize];
            let row_b = &ctx.table_b.rows[pair.idx_b as usize];
            let mut scores = rlink_types::score::ScoreVector::missing(ctx.schema.len());
            for (global_idx, comparer) in ctx.comparers {
                scores.set(*global_idx, comparer.score(row_a, row_b));
            }
            let flags = ctx.acceptor.accept(pass, &scores, ctx.schema);
            if !flags.review {
                return None;
            }
            let weight = rlink_weigher::weight(pass, &scores, ctx.total_passes, &pass_indices);
            Some(AcceptedPair { pair, scores, flags, weight })
        })
        .collect();
    accepted.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    accepted
}

/// Runs one dispatch group (at most `2 * num_processes` chunks) through a
/// fixed-size worker pool backed by a [`crossbeam_deque::Injector`], and
/// writes one shard per chunk. Any worker panic or error aborts the whole
/// group.
fn run_group(
    pass: &PassId,
    group_name: &str,
    chunks: Vec<Vec<CandidatePair>>,
    ctx: &PassContext,
    num_workers: usize,
    scratch_dir: &std::path::Path,
) -> Result<Vec<PathBuf>> {
    let injector: Injector<ChunkJob> = Injector::new();
    for (index, pairs) in chunks.into_iter().enumerate() {
        injector.push(ChunkJob { index, pairs });
    }

    let results: Mutex<Vec<Result<PathBuf>>> = Mutex::new(Vec::new());
    let injector = &injector;
    let results = &results;

    std::thread::scope(|scope| {
        for _ in 0..num_workers.max(1) {
            scope.spawn(move || loop {
                match injector.steal() {
                    Steal::Success(job) => {
                        let accepted = score_chunk(pass, job.pairs, ctx);
                        let name = format!("{group_name}_chunk{}", job.index);
                        let outcome = shard::write_shard(scratch_dir, &name, &accepted, ctx.schema);
                        results.lock().unwrap().push(outcome);
                    }
                    Steal::Empty => break,
                    Steal::Retry => continue,
                }
            });
        }
    });

    let mut paths = Vec::new();
    for outcome in results.lock().unwrap().drain(..) {
        match outcome {
            Ok(path) => paths.push(path),
            Err(err) => return Err(RlinkError::worker(pass.to_string(), err)),
        }
    }
    Ok(paths)
}

/// Runs a full pass: splits `candidates` into `chunk_size`-sized chunks,
/// dispatches them to the worker pool in groups of `2 * num_processes`
/// (backpressure: the driver waits for one group to finish before
/// releasing the next), and returns the shard files produced.
pub fn run_pass(
    pass: &PassId,
    candidates: Vec<CandidatePair>,
    chunk_size: usize,
    num_processes: usize,
    ctx: &PassContext,
    scratch_dir: &std::path::Path,
) -> Result<Vec<PathBuf>> {
    if candidates.is_empty() {
        tracing::debug!(pass = %pass, "pass produced no candidates, skipping dispatch");
        return Ok(Vec::new());
    }
    let candidate_count = candidates.len();
    let start = std::time::Instant::now();
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Vec<CandidatePair>> = candidates
        .chunks(chunk_size)
        .map(<[CandidatePair]>::to_vec)
        .collect();

    let group_size = (2 * num_processes.max(1)).max(1);
    let mut shard_paths = Vec::new();
    for (group_idx, group) in chunks.chunks(group_size).enumerate() {
        let group_name = format!("pass_{pass}_group{group_idx}");
        let group_shards = run_group(pass, &group_name, group.to_vec(), ctx, num_processes, scratch_dir)?;
        shard_paths.extend(group_shards);
    }
    tracing::info!(
        pass = %pass,
        candidates = candidate_count,
        shards = shard_paths.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "pass dispatched"
    );
    Ok(shard_paths)
}
