//! End-to-end match orchestration: loads a [`MatchConfig`], runs every
//! ground-truth and regular blocking pass through the driver's worker pool,
//! merges the resulting shards into one weight-descending pairwise CSV, and
//! resolves a crosswalk per strictness level.
//!
//! This crate is the facade `rlink-cli` calls into; everything it does is
//! composed from `rlink-blocker`/`rlink-comparers`/`rlink-acceptor`/
//! `rlink-weigher`/`rlink-driver`/`rlink-resolver` without adding scoring or
//! resolution logic of its own.

pub mod demo_loader;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rlink_acceptor::AcceptorRegistry;
use rlink_blocker::{run_ground_truth_pass, run_pass as run_block_pass, BlockPass, PastJoinCond};
use rlink_driver::PassContext;
use rlink_error::{Result, RlinkError};
use rlink_resolver::CrosswalkResult;
use rlink_types::config::MatchConfig;
use rlink_types::pair::{AcceptFlags, AcceptedPair, Strictness};
use rlink_types::pass::{PassId, PassSchema};
use rlink_types::record::RecordTable;
use rlink_types::score::ScoreVector;

/// Loads and parses a match configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MatchConfig> {
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

/// The comparison names a match actually computes, in a fixed order shared
/// by every pass's shard so they can all be merged into one pairwise CSV.
/// Built by walking `comp_names_by_pass` in configured order and keeping the
/// first occurrence of each name.
fn build_global_schema(config: &MatchConfig) -> PassSchema {
    let mut names: Vec<Box<str>> = Vec::new();
    for pass_names in &config.comp_names_by_pass {
        for name in pass_names {
            if !names.iter().any(|n| n.as_ref() == name.as_str()) {
                names.push(name.as_str().into());
            }
        }
    }
    PassSchema::new(names)
}

fn compile_pass_comparers(
    config: &MatchConfig,
    comp_names: &[String],
    global_schema: &PassSchema,
    table_a: &RecordTable,
    table_b: &RecordTable,
) -> Result<Vec<(usize, rlink_comparers::CompiledComparer)>> {
    comp_names
        .iter()
        .map(|name| {
            let param = config
                .sim_param
                .get(name)
                .ok_or_else(|| RlinkError::config(format!("comparer '{name}' has no sim_param entry")))?;
            let comparer = rlink_comparers::CompiledComparer::compile(
                param,
                &table_a.columns,
                &table_b.columns,
                config.cutoff_scores.byear_within1_score,
            )?;
            let global_idx = global_schema
                .index_of(name)
                .ok_or_else(|| RlinkError::config(format!("comparer '{name}' missing from global schema")))?;
            Ok((global_idx, comparer))
        })
        .collect()
}

/// Everything a completed match produced: the merged pairwise CSV (weight
/// descending, every accepted pair at or above `review`) and one resolved
/// crosswalk file per strictness level.
pub struct MatchOutcome {
    pub pairwise_csv: PathBuf,
    pub crosswalks: HashMap<Strictness, PathBuf>,
}

/// Runs a full match: blocking (ground-truth passes first, then regular
/// passes in configured order), scoring/acceptance/weighing via the worker
/// pool, a streaming merge into one pairwise CSV, and crosswalk resolution
/// for every strictness level. `table_b` should be `table_a` again for a
/// `dedup` match; the blocker's self-pair and reverse-pair exclusion only
/// activates when `config.matchtype` is `Dedup`.
pub fn run_match(config: &MatchConfig, table_a: &RecordTable, table_b: &RecordTable, out_dir: &Path) -> Result<MatchOutcome> {
    fs::create_dir_all(out_dir)?;
    let scratch = tempfile::tempdir()?;

    let registry = AcceptorRegistry::with_defaults();
    let acceptor = registry
        .build(&config.acceptor, config.cutoff_scores.clone())
        .ok_or_else(|| RlinkError::config(format!("unknown acceptor '{}'", config.acceptor)))?;

    let global_schema = build_global_schema(config);
    let dedup = matches!(config.matchtype, rlink_types::config::MatchType::Dedup);
    let total_passes = config.blocks_by_pass.len() as u16;
    let chunk_size = *config.parallelization_metrics.chunk_sizes.values().max().unwrap_or(&1_000);
    let num_processes = config.parallelization_metrics.num_processes;

    let mut shard_paths = Vec::new();

    for gid in &config.ground_truth_ids {
        let candidates = run_ground_truth_pass(gid, &table_a.columns, &table_b.columns, table_a, table_b, dedup)?;
        tracing::info!(gid, candidates = candidates.len(), "ground truth pass joined");
        if candidates.is_empty() {
            continue;
        }
        let pass_id = PassId::GroundTruth(gid.as_str().into());
        let ctx = PassContext {
            table_a,
            table_b,
            comparers: &[],
            schema: &global_schema,
            acceptor: acceptor.as_ref(),
            total_passes,
        };
        let shards = rlink_driver::run_pass(&pass_id, candidates, chunk_size, num_processes, &ctx, scratch.path())?;
        shard_paths.extend(shards);
    }

    let mut past = PastJoinCond::new();
    for (passnum, blocks) in config.blocks_by_pass.iter().enumerate() {
        let Some(block_pass) = BlockPass::compile(blocks, &table_a.columns, &table_b.columns) else {
            continue;
        };
        let candidates = run_block_pass(passnum as u16, &block_pass, table_a, table_b, &past, dedup);
        tracing::info!(pass = passnum, candidates = candidates.len(), "regular pass blocked");
        past.accumulate(&block_pass);

        let comp_names = config.comp_names_by_pass.get(passnum).map(Vec::as_slice).unwrap_or(&[]);
        let comparers = compile_pass_comparers(config, comp_names, &global_schema, table_a, table_b)?;

        let pass_id = PassId::Regular(passnum as u16);
        let ctx = PassContext {
            table_a,
            table_b,
            comparers: &comparers,
            schema: &global_schema,
            acceptor: acceptor.as_ref(),
            total_passes,
        };
        let shards = rlink_driver::run_pass(&pass_id, candidates, chunk_size, num_processes, &ctx, scratch.path())?;
        shard_paths.extend(shards);
    }

    let pairwise_csv = out_dir.join("pairwise.csv");
    rlink_driver::merge_shards(&shard_paths, &pairwise_csv)?;
    tracing::info!(shards = shard_paths.len(), path = %pairwise_csv.display(), "shards merged into pairwise csv");

    let accepted = parse_accepted_pairs(&pairwise_csv, &global_schema)?;
    tracing::info!(accepted = accepted.len(), "pairwise csv parsed back for resolution");
    let all_ids_for_dedup: Vec<String> = if dedup {
        table_a.rows.iter().map(|r| r.indv_id.to_string()).collect()
    } else {
        Vec::new()
    };

    let mut crosswalks = HashMap::new();
    for strictness in Strictness::ALL {
        let result = rlink_resolver::resolve(config, &accepted, strictness, &all_ids_for_dedup);
        let path = out_dir.join(format!("{}.csv", strictness.as_str()));
        match result {
            CrosswalkResult::Pairwise(rows) => rlink_resolver::write_pairwise_crosswalk(&rows, &path)?,
            CrosswalkResult::Dedup(rows) => rlink_resolver::write_dedup_crosswalk(&rows, &path)?,
        }
        crosswalks.insert(strictness, path);
    }

    Ok(MatchOutcome { pairwise_csv, crosswalks })
}

/// Reads the merged pairwise CSV back into [`AcceptedPair`] values for the
/// resolver. The column layout mirrors `rlink-driver::shard` exactly: a
/// fixed ten-column prefix followed by one column per name in `schema`.
fn parse_accepted_pairs(path: &Path, schema: &PassSchema) -> Result<Vec<AcceptedPair>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let passnum = parse_pass_id(record.get(4).unwrap_or_default());
        let mut scores = ScoreVector::missing(schema.len());
        for i in 0..schema.len() {
            if let Some(raw) = record.get(10 + i) {
                if let Ok(value) = raw.parse::<f32>() {
                    scores.set(i, value);
                }
            }
        }
        out.push(AcceptedPair {
            pair: rlink_types::CandidatePair {
                indv_id_a: record.get(0).unwrap_or_default().into(),
                indv_id_b: record.get(1).unwrap_or_default().into(),
                idx_a: record.get(2).and_then(|s| s.parse().ok()).unwrap_or_default(),
                idx_b: record.get(3).and_then(|s| s.parse().ok()).unwrap_or_default(),
                passnum,
            },
            scores,
            flags: AcceptFlags {
                strict: record.get(5) == Some("true"),
                moderate: record.get(6) == Some("true"),
                relaxed: record.get(7) == Some("true"),
                review: record.get(8) == Some("true"),
            },
            weight: record.get(9).and_then(|s| s.parse().ok()).unwrap_or(0.0),
        });
    }
    Ok(out)
}

fn parse_pass_id(raw: &str) -> PassId {
    match raw.strip_prefix("dup_") {
        Some(gid) => PassId::GroundTruth(gid.into()),
        None => PassId::Regular(raw.parse().unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlink_types::config::{
        BlockField, CutoffScores, DataParam, MatchType, ParallelizationMetrics, SimParam, TableParam,
    };
    use rlink_types::record::{FieldValue, Record};
    use rlink_types::schema::ColumnMap;

    fn table(rows: Vec<(&str, &str, &str)>) -> RecordTable {
        let columns = ColumnMap::from_names(["fname", "ssn"]);
        let rows = rows
            .into_iter()
            .map(|(id, fname, ssn)| {
                Record::from_fields(
                    id,
                    vec![Some(FieldValue::Str(fname.into())), Some(FieldValue::Str(ssn.into()))],
                )
            })
            .collect();
        RecordTable::new(rows, columns)
    }

    fn config() -> MatchConfig {
        let mut sim_param = HashMap::new();
        sim_param.insert(
            "name_sim".to_string(),
            SimParam::JaroWinkler {
                field_a: "fname".into(),
                field_b: "fname".into(),
            },
        );
        MatchConfig {
            matchtype: MatchType::OneToOne,
            data_param: DataParam {
                df_a: TableParam { name: "a".into() },
                df_b: Some(TableParam { name: "b".into() }),
            },
            ground_truth_ids: vec!["ssn".to_string()],
            blocks_by_pass: vec![vec![BlockField {
                field_a: "fname".into(),
                field_b: "fname".into(),
                inverted: false,
            }]],
            comp_names_by_pass: vec![vec!["name_sim".to_string()]],
            sim_param,
            cutoff_scores: CutoffScores {
                name_high_score: 0.95,
                name_review_score: 0.8,
                name_very_high_score: 0.9,
                id_high_score: 0.95,
                id_review_score: 0.8,
                byear_within1_score: 0.5,
                bmonthbday_either_score: 0.25,
                bmonthbday_swap_score: 0.5,
                minit_match_mname_unclear_score: 0.7,
                review_offset: HashMap::new(),
            },
            parallelization_metrics: ParallelizationMetrics {
                chunk_sizes: HashMap::from([("default".to_string(), 10)]),
                num_processes: 2,
            },
            acceptor: "default".to_string(),
            include_singletons: false,
        }
    }

    #[test]
    fn ground_truth_pair_resolves_with_maximal_weight() {
        let table_a = table(vec![("a1", "jane", "111-22-3333")]);
        let table_b = table(vec![("b1", "jane", "111-22-3333")]);
        let out = tempfile::tempdir().unwrap();

        let outcome = run_match(&config(), &table_a, &table_b, out.path()).unwrap();
        assert!(outcome.pairwise_csv.exists());

        let mut reader = csv::Reader::from_path(&outcome.pairwise_csv).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(4), Some("dup_ssn"));

        let strict_path = outcome.crosswalks.get(&Strictness::Strict).unwrap();
        let mut crosswalk_reader = csv::Reader::from_path(strict_path).unwrap();
        assert_eq!(crosswalk_reader.records().count(), 1);
    }

    #[test]
    fn non_matching_pair_produces_empty_crosswalk() {
        let table_a = table(vec![("a1", "jane", "111-22-3333")]);
        let table_b = table(vec![("b1", "robert", "999-88-7777")]);
        let out = tempfile::tempdir().unwrap();

        let outcome = run_match(&config(), &table_a, &table_b, out.path()).unwrap();
        let strict_path = outcome.crosswalks.get(&Strictness::Strict).unwrap();
        let mut reader = csv::Reader::from_path(strict_path).unwrap();
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn global_schema_dedups_repeated_comparer_names() {
        let mut cfg = config();
        cfg.comp_names_by_pass = vec![vec!["name_sim".to_string()], vec!["name_sim".to_string()]];
        cfg.blocks_by_pass = vec![
            vec![BlockField {
                field_a: "fname".into(),
                field_b: "fname".into(),
                inverted: false,
            }],
            vec![BlockField {
                field_a: "ssn".into(),
                field_b: "ssn".into(),
                inverted: false,
            }],
        ];
        let schema = build_global_schema(&cfg);
        assert_eq!(schema.len(), 1);
    }
}
