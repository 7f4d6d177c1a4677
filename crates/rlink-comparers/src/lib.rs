//! Typed, tagged-variant similarity comparers.
//!
//! Each [`CompiledComparer`] is built once per match from config, resolving
//! field names to dense column indices up front, and is then invoked as a
//! plain function over two records per candidate pair. There is no dynamic
//! comparer registration: unknown comparer kinds are rejected while
//! building the table, before any pass runs.

use rlink_error::{Result, RlinkError};
use rlink_types::record::{FieldValue, Record};
use rlink_types::schema::ColumnMap;
use rlink_types::score::MISSING;

/// Comparers that operate on two records and produce a similarity score in
/// `[0.0, 1.0]`, or [`MISSING`] when a required field is absent on either
/// side.
#[derive(Debug, Clone)]
pub enum CompiledComparer {
    JaroWinkler {
        idx_a: u32,
        idx_b: u32,
    },
    Levenshtein {
        idx_a: u32,
        idx_b: u32,
    },
    /// Scores `a1+a2` against `b1+b2` both straight and swapped and keeps
    /// the higher of the two Jaro-Winkler scores, catching first/last name
    /// transposition between the two sides.
    InvertedJaroWinkler {
        idx_a1: u32,
        idx_a2: u32,
        idx_b1: u32,
        idx_b2: u32,
    },
    Exact {
        idx_a: u32,
        idx_b: u32,
    },
    /// `1.0 - min(|a - b| / range, 1.0)`.
    NumericLinear {
        idx_a: u32,
        idx_b: u32,
        range: f64,
    },
    DateYmd {
        y_a: u32,
        m_a: u32,
        d_a: u32,
        y_b: u32,
        m_b: u32,
        d_b: u32,
    },
    Byear {
        y_a: u32,
        y_b: u32,
        within1_score: f32,
        year_dif: f32,
    },
    BmonthBday {
        m_a: u32,
        d_a: u32,
        m_b: u32,
        d_b: u32,
        swap_month_day: f32,
        either_month_day: f32,
    },
    /// Four-argument comparer over `(minit_a, mname_a, minit_b, mname_b)`:
    /// a matching initial scores `1.0` when at least one side's middle name
    /// is a single letter, `unclear_score` when neither is, `0.0` when the
    /// initials differ, and the missing sentinel when either initial is
    /// absent.
    Minitial {
        minit_idx_a: u32,
        mname_idx_a: u32,
        minit_idx_b: u32,
        mname_idx_b: u32,
        unclear_score: f32,
    },
}

fn resolve(columns: &ColumnMap, field: &str) -> Result<u32> {
    columns
        .index_of(field)
        .ok_or_else(|| RlinkError::config(format!("unknown field '{field}' in comparer config")))
}

impl CompiledComparer {
    /// Builds a comparer from its config representation, resolving every
    /// field reference against the two tables' column maps. `byear_within1`
    /// is threaded in from `cutoff_scores` since the byear comparer's
    /// partial-credit tier is itself a configured score, not a constant.
    pub fn compile(
        param: &rlink_types::config::SimParam,
        columns_a: &ColumnMap,
        columns_b: &ColumnMap,
        byear_within1: f64,
    ) -> Result<Self> {
        use rlink_types::config::SimParam;
        Ok(match param {
            SimParam::JaroWinkler { field_a, field_b } => Self::JaroWinkler {
                idx_a: resolve(columns_a, field_a)?,
                idx_b: resolve(columns_b, field_b)?,
            },
            SimParam::Levenshtein { field_a, field_b } => Self::Levenshtein {
                idx_a: resolve(columns_a, field_a)?,
                idx_b: resolve(columns_b, field_b)?,
            },
            SimParam::InvertedJaroWinkler {
                field_a1,
                field_a2,
                field_b1,
                field_b2,
            } => Self::InvertedJaroWinkler {
                idx_a1: resolve(columns_a, field_a1)?,
                idx_a2: resolve(columns_a, field_a2)?,
                idx_b1: resolve(columns_b, field_b1)?,
                idx_b2: resolve(columns_b, field_b2)?,
            },
            SimParam::Exact { field_a, field_b } => Self::Exact {
                idx_a: resolve(columns_a, field_a)?,
                idx_b: resolve(columns_b, field_b)?,
            },
            SimParam::NumericLinear {
                field_a,
                field_b,
                range,
            } => Self::NumericLinear {
                idx_a: resolve(columns_a, field_a)?,
                idx_b: resolve(columns_b, field_b)?,
                range: *range,
            },
            SimParam::DateYmd {
                year_a,
                month_a,
                day_a,
                year_b,
                month_b,
                day_b,
            } => Self::DateYmd {
                y_a: resolve(columns_a, year_a)?,
                m_a: resolve(columns_a, month_a)?,
                d_a: resolve(columns_a, day_a)?,
                y_b: resolve(columns_b, year_b)?,
                m_b: resolve(columns_b, month_b)?,
                d_b: resolve(columns_b, day_b)?,
            },
            SimParam::Byear { year_a, year_b, year_dif } => Self::Byear {
                y_a: resolve(columns_a, year_a)?,
                y_b: resolve(columns_b, year_b)?,
                within1_score: byear_within1 as f32,
                year_dif: *year_dif as f32,
            },
            SimParam::BmonthBday {
                month_a,
                day_a,
                month_b,
                day_b,
                swap_month_day,
                either_month_day,
            } => Self::BmonthBday {
                m_a: resolve(columns_a, month_a)?,
                d_a: resolve(columns_a, day_a)?,
                m_b: resolve(columns_b, month_b)?,
                d_b: resolve(columns_b, day_b)?,
                swap_month_day: *swap_month_day as f32,
                either_month_day: *either_month_day as f32,
            },
            SimParam::Minitial {
                field_a,
                field_b,
                mname_a,
                mname_b,
                minit_match_mname_unclear,
            } => Self::Minitial {
                minit_idx_a: resolve(columns_a, field_a)?,
                mname_idx_a: resolve(columns_a, mname_a)?,
                minit_idx_b: resolve(columns_b, field_b)?,
                mname_idx_b: resolve(columns_b, mname_b)?,
                unclear_score: *minit_match_mname_unclear as f32,
            },
        })
    }

    pub fn score(&self, a: &Record, b: &Record) -> f32 {
        match *self {
            Self::JaroWinkler { idx_a, idx_b } => with_strs(a, b, idx_a, idx_b, |sa, sb| {
                strsim::jaro_winkler(sa, sb) as f32
            }),
            Self::Levenshtein { idx_a, idx_b } => with_strs(a, b, idx_a, idx_b, |sa, sb| {
                strsim::normalized_levenshtein(sa, sb) as f32
            }),
            Self::InvertedJaroWinkler {
                idx_a1,
                idx_a2,
                idx_b1,
                idx_b2,
            } => inverted_jaro_winkler(a, b, idx_a1, idx_a2, idx_b1, idx_b2),
            Self::Exact { idx_a, idx_b } => with_strs(a, b, idx_a, idx_b, |sa, sb| {
                if sa == sb { 1.0 } else { 0.0 }
            }),
            Self::NumericLinear { idx_a, idx_b, range } => {
                with_nums(a, b, idx_a, idx_b, |na, nb| {
                    let delta = (na - nb).abs();
                    (1.0 - (delta / range).min(1.0)) as f32
                })
            }
            Self::DateYmd {
                y_a,
                m_a,
                d_a,
                y_b,
                m_b,
                d_b,
            } => date_ymd(a, b, y_a, m_a, d_a, y_b, m_b, d_b),
            Self::Byear {
                y_a,
                y_b,
                within1_score,
                year_dif,
            } => byear(a, b, y_a, y_b, within1_score, year_dif),
            Self::BmonthBday {
                m_a,
                d_a,
                m_b,
                d_b,
                swap_month_day,
                either_month_day,
            } => bmonth_bday(a, b, m_a, d_a, m_b, d_b, swap_month_day, either_month_day),
            Self::Minitial {
                minit_idx_a,
                mname_idx_a,
                minit_idx_b,
                mname_idx_b,
                unclear_score,
            } => minitial(a, b, minit_idx_a, mname_idx_a, minit_idx_b, mname_idx_b, unclear_score),
        }
    }
}

fn with_strs(a: &Record, b: &Record, idx_a: u32, idx_b: u32, f: impl Fn(&str, &str) -> f32) -> f32 {
    match (a.get(idx_a).and_then(FieldValue::as_str), b.get(idx_b).and_then(FieldValue::as_str)) {
        (Some(sa), Some(sb)) => f(sa, sb),
        _ => MISSING,
    }
}

fn with_nums(a: &Record, b: &Record, idx_a: u32, idx_b: u32, f: impl Fn(f64, f64) -> f32) -> f32 {
    match (a.get(idx_a).and_then(FieldValue::as_num), b.get(idx_b).and_then(FieldValue::as_num)) {
        (Some(na), Some(nb)) => f(na, nb),
        _ => MISSING,
    }
}

fn inverted_jaro_winkler(a: &Record, b: &Record, idx_a1: u32, idx_a2: u32, idx_b1: u32, idx_b2: u32) -> f32 {
    let (a1, a2, b1, b2) = (
        a.get(idx_a1).and_then(FieldValue::as_str),
        a.get(idx_a2).and_then(FieldValue::as_str),
        b.get(idx_b1).and_then(FieldValue::as_str),
        b.get(idx_b2).and_then(FieldValue::as_str),
    );
    let (Some(a1), Some(a2), Some(b1), Some(b2)) = (a1, a2, b1, b2) else {
        return MISSING;
    };
    let straight_a = format!("{a1} {a2}");
    let straight_b = format!("{b1} {b2}");
    let swapped_b = format!("{b2} {b1}");
    let straight = strsim::jaro_winkler(&straight_a, &straight_b) as f32;
    let swapped = strsim::jaro_winkler(&straight_a, &swapped_b) as f32;
    straight.max(swapped)
}

/// Exact match on all three components scores 1.0. A record pair that
/// matches on year but has its month and day transposed relative to the
/// other side still scores highly (same birthdate, different field-entry
/// convention), at a lower tier than an exact match. Any other combination
/// that shares the year scores lower still; no shared year scores 0.
fn date_ymd(a: &Record, b: &Record, y_a: u32, m_a: u32, d_a: u32, y_b: u32, m_b: u32, d_b: u32) -> f32 {
    let ya = a.get(y_a).and_then(FieldValue::as_num);
    let ma = a.get(m_a).and_then(FieldValue::as_num);
    let da = a.get(d_a).and_then(FieldValue::as_num);
    let yb = b.get(y_b).and_then(FieldValue::as_num);
    let mb = b.get(m_b).and_then(FieldValue::as_num);
    let db = b.get(d_b).and_then(FieldValue::as_num);
    let (Some(ya), Some(ma), Some(da), Some(yb), Some(mb), Some(db)) = (ya, ma, da, yb, mb, db)
    else {
        return MISSING;
    };
    if ya == yb && ma == mb && da == db {
        return 1.0;
    }
    if ya == yb && ma == db && da == mb {
        return 0.75;
    }
    if ya == yb && (ma == mb || da == db) {
        return 0.5;
    }
    0.0
}

fn byear(a: &Record, b: &Record, y_a: u32, y_b: u32, within1_score: f32, year_dif: f32) -> f32 {
    let (Some(ya), Some(yb)) = (
        a.get(y_a).and_then(FieldValue::as_num),
        b.get(y_b).and_then(FieldValue::as_num),
    ) else {
        return MISSING;
    };
    let delta = (ya - yb).abs() as f32;
    if delta == 0.0 {
        1.0
    } else if delta <= year_dif {
        within1_score
    } else {
        0.0
    }
}

fn bmonth_bday(
    a: &Record,
    b: &Record,
    m_a: u32,
    d_a: u32,
    m_b: u32,
    d_b: u32,
    swap_month_day: f32,
    either_month_day: f32,
) -> f32 {
    let ma = a.get(m_a).and_then(FieldValue::as_num);
    let da = a.get(d_a).and_then(FieldValue::as_num);
    let mb = b.get(m_b).and_then(FieldValue::as_num);
    let db = b.get(d_b).and_then(FieldValue::as_num);
    let (Some(ma), Some(da), Some(mb), Some(db)) = (ma, da, mb, db) else {
        return MISSING;
    };
    if ma == mb && da == db {
        1.0
    } else if ma == db && da == mb {
        swap_month_day
    } else if ma == mb || da == db {
        either_month_day
    } else {
        0.0
    }
}

/// `(minit_a, mname_a, minit_b, mname_b)`: a good match requires the
/// initials to agree AND at least one side's middle name to be a single
/// letter; a bare initial match with no single-letter middle name on
/// either side only clears `unclear_score`.
fn minitial(
    a: &Record,
    b: &Record,
    minit_idx_a: u32,
    mname_idx_a: u32,
    minit_idx_b: u32,
    mname_idx_b: u32,
    unclear_score: f32,
) -> f32 {
    let (ia, ib) = (
        a.get(minit_idx_a).and_then(FieldValue::as_str),
        b.get(minit_idx_b).and_then(FieldValue::as_str),
    );
    let (Some(ia), Some(ib)) = (ia, ib) else {
        return MISSING;
    };
    let (ca, cb) = (ia.chars().next(), ib.chars().next());
    let (Some(ca), Some(cb)) = (ca, cb) else {
        return MISSING;
    };
    if !ca.eq_ignore_ascii_case(&cb) {
        return 0.0;
    }
    let is_single_letter = |idx: u32, record: &Record| {
        record
            .get(idx)
            .and_then(FieldValue::as_str)
            .is_some_and(|s| s.chars().count() == 1)
    };
    if is_single_letter(mname_idx_a, a) || is_single_letter(mname_idx_b, b) {
        1.0
    } else {
        unclear_score
    }
}
