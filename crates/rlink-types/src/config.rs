//! Deserializable match configuration, mirroring the external key table in
//! `spec.md` §6.2. Loaded from TOML by `rlink-cli`; any crate can build one
//! directly for embedding.

use std::collections::HashMap;

use serde::Deserialize;

/// The crosswalk cardinality regime a match produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MatchType {
    #[serde(rename = "121")]
    OneToOne,
    #[serde(rename = "12M")]
    OneToMany,
    #[serde(rename = "M21")]
    ManyToOne,
    #[serde(rename = "M2M")]
    ManyToMany,
    #[serde(rename = "dedup")]
    Dedup,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "121",
            Self::OneToMany => "12M",
            Self::ManyToOne => "M21",
            Self::ManyToMany => "M2M",
            Self::Dedup => "dedup",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableParam {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataParam {
    pub df_a: TableParam,
    #[serde(default)]
    pub df_b: Option<TableParam>,
}

/// One field reference within a blocking pass. `inverted` marks the whole
/// pass as using swapped-side blocking (the fnamelname/lnamefname
/// strategy): when any field in the pass sets it, `rlink-blocker` joins
/// the `a`-side fields against the `b`-side fields in reverse order
/// instead of position-for-position.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockField {
    pub field_a: String,
    pub field_b: String,
    #[serde(default)]
    pub inverted: bool,
}

/// One comparer's configuration. The `kind` tag selects the
/// `rlink-comparers` dispatch variant; unknown kinds are a `RlinkError::Config`
/// raised while compiling the comparer table, not at match time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimParam {
    JaroWinkler { field_a: String, field_b: String },
    Levenshtein { field_a: String, field_b: String },
    InvertedJaroWinkler {
        field_a1: String,
        field_a2: String,
        field_b1: String,
        field_b2: String,
    },
    Exact { field_a: String, field_b: String },
    NumericLinear {
        field_a: String,
        field_b: String,
        range: f64,
    },
    DateYmd {
        year_a: String,
        month_a: String,
        day_a: String,
        year_b: String,
        month_b: String,
        day_b: String,
    },
    Byear {
        year_a: String,
        year_b: String,
        /// Maximum absolute year delta still worth partial credit. Defaults
        /// to `1`, matching the original's `sim_param[cn].get("year_dif", 1)`.
        #[serde(default = "default_year_dif")]
        year_dif: f64,
    },
    BmonthBday {
        month_a: String,
        day_a: String,
        month_b: String,
        day_b: String,
        /// Score for a month/day pair that's an exact match once swapped
        /// (`s1_day == s2_month && s1_month == s2_day`).
        swap_month_day: f64,
        /// Score for a month/day pair that matches on exactly one of the
        /// two components.
        either_month_day: f64,
    },
    Minitial {
        field_a: String,
        field_b: String,
        /// Middle-name field backing `field_a`, consulted to tell a good
        /// minitial match (one side's middle name is a single letter) from
        /// a merely questionable one.
        mname_a: String,
        mname_b: String,
        /// Score for a matching initial when neither side's middle name is
        /// a single letter (the "questionable" tier).
        minit_match_mname_unclear: f64,
    },
}

fn default_year_dif() -> f64 {
    1.0
}

impl SimParam {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JaroWinkler { .. } => "jaro_winkler",
            Self::Levenshtein { .. } => "levenshtein",
            Self::InvertedJaroWinkler { .. } => "inverted_jaro_winkler",
            Self::Exact { .. } => "exact",
            Self::NumericLinear { .. } => "numeric_linear",
            Self::DateYmd { .. } => "date_ymd",
            Self::Byear { .. } => "byear",
            Self::BmonthBday { .. } => "bmonth_bday",
            Self::Minitial { .. } => "minitial",
        }
    }
}

/// Score thresholds consumed by the default acceptor. `review_offset`
/// carries the pass-specific `-0.05`/`-0.1` adjustments the original
/// hardcoded per pass (see `spec.md` §9 Open Questions); keyed by pass
/// number as a string so it round-trips cleanly through TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct CutoffScores {
    pub name_high_score: f64,
    pub name_review_score: f64,
    /// Minimum `mname_sim` for the acceptor's "very high similarity"
    /// middle-name route (`minit_match_mname_veryhighsim_mask`).
    pub name_very_high_score: f64,
    pub id_high_score: f64,
    pub id_review_score: f64,
    pub byear_within1_score: f64,
    /// The `bmonth_bday` comparer's `either_month_day`/`swap_month_day`
    /// thresholds, mirrored here so the acceptor can rebuild `dob_partial_mask`
    /// without depending on `sim_param`.
    pub bmonthbday_either_score: f64,
    pub bmonthbday_swap_score: f64,
    /// The `minitial` comparer's `minit_match_mname_unclear` tier score,
    /// mirrored here for the same reason.
    pub minit_match_mname_unclear_score: f64,
    #[serde(default)]
    pub review_offset: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParallelizationMetrics {
    pub chunk_sizes: HashMap<String, usize>,
    pub num_processes: usize,
}

fn default_acceptor_name() -> String {
    "default".to_string()
}

fn default_include_singletons() -> bool {
    false
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub matchtype: MatchType,
    pub data_param: DataParam,
    #[serde(default)]
    pub ground_truth_ids: Vec<String>,
    pub blocks_by_pass: Vec<Vec<BlockField>>,
    pub comp_names_by_pass: Vec<Vec<String>>,
    pub sim_param: HashMap<String, SimParam>,
    pub cutoff_scores: CutoffScores,
    pub parallelization_metrics: ParallelizationMetrics,
    #[serde(default = "default_acceptor_name")]
    pub acceptor: String,
    /// Dedup-only: whether the crosswalk includes ids that matched nothing
    /// as their own singleton group (`spec.md` §4.6, recovered from
    /// `mtom_or_dedup_matching`'s `all_ids` pass in the original).
    #[serde(default = "default_include_singletons")]
    pub include_singletons: bool,
}
