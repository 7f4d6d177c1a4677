//! Exercises the full `rlink-core::run_match` pipeline the CLI drives,
//! from CSV fixtures through to a resolved crosswalk on disk.

use std::collections::HashMap;
use std::io::Write;

use rlink_types::config::{
    BlockField, CutoffScores, DataParam, MatchConfig, MatchType, ParallelizationMetrics, SimParam, TableParam,
};
use rlink_types::pair::Strictness;

fn write_fixture(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "indv_id,fname,lname,ssn").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
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
            field_a: "lname".into(),
            field_b: "lname".into(),
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
fn csv_fixtures_flow_through_to_a_strict_crosswalk_row() {
    let file_a = write_fixture(&["a1,jane,smith,111-22-3333"]);
    let file_b = write_fixture(&["b1,jane,smith,111-22-3333"]);
    let table_a = rlink_core::demo_loader::load_csv(file_a.path(), "indv_id").unwrap();
    let table_b = rlink_core::demo_loader::load_csv(file_b.path(), "indv_id").unwrap();

    let out = tempfile::tempdir().unwrap();
    let outcome = rlink_core::run_match(&config(), &table_a, &table_b, out.path()).unwrap();

    let strict_path = outcome.crosswalks.get(&Strictness::Strict).unwrap();
    let mut reader = csv::Reader::from_path(strict_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(0), Some("a1"));
    assert_eq!(rows[0].get(1), Some("b1"));
}

#[test]
fn config_parses_from_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
matchtype = "121"
ground_truth_ids = ["ssn"]
blocks_by_pass = [[{{ field_a = "lname", field_b = "lname" }}]]
comp_names_by_pass = [["name_sim"]]

[data_param.df_a]
name = "a"

[data_param.df_b]
name = "b"

[sim_param.name_sim]
kind = "jaro_winkler"
field_a = "fname"
field_b = "fname"

[cutoff_scores]
name_high_score = 0.95
name_review_score = 0.8
name_very_high_score = 0.9
id_high_score = 0.95
id_review_score = 0.8
byear_within1_score = 0.5
bmonthbday_either_score = 0.25
bmonthbday_swap_score = 0.5
minit_match_mname_unclear_score = 0.7

[parallelization_metrics]
num_processes = 2

[parallelization_metrics.chunk_sizes]
default = 10
"#
    )
    .unwrap();
    file.flush().unwrap();

    let loaded = rlink_core::load_config(file.path()).unwrap();
    assert_eq!(loaded.ground_truth_ids, vec!["ssn".to_string()]);
    assert_eq!(loaded.blocks_by_pass.len(), 1);
}
