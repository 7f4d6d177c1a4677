//! Crosswalk resolution: turns a weight-descending stream of accepted pairs
//! into one of five crosswalk cardinality regimes.

pub mod union_find;

use std::collections::HashMap;

use rlink_error::Result;
use rlink_types::config::MatchConfig;
use rlink_types::pair::{AcceptedPair, Strictness};
use rlink_types::pass::PassId;

use union_find::UnionFind;

/// One resolved crosswalk row. `group_id` is only populated for `M2M`
/// (every member of a transitively-merged union-find group shares one),
/// and is `None` for the other cardinality regimes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CrosswalkRow {
    pub indv_id_a: String,
    pub indv_id_b: String,
    pub weight: f64,
    pub passnum: String,
    pub group_id: Option<u64>,
}

#[derive(Clone, Copy)]
enum ManySide {
    A,
    B,
}

struct Assignment {
    partner: Box<str>,
    weight: f64,
    deleted: bool,
    passnum: PassId,
}

/// `121`: greedy one-to-one matching by descending weight. `accepted` must
/// already be sorted by weight descending (the driver's merged output is).
/// A tie on either side marks *both* the existing and the incoming
/// assignment deleted, not just the later one — an ambiguous pair is
/// evidence against both candidate matches, not a vote for the first one
/// seen.
pub fn resolve_one_to_one(accepted: &[AcceptedPair], strictness: Strictness) -> Vec<CrosswalkRow> {
    let mut a_to_b: HashMap<Box<str>, Assignment> = HashMap::new();
    let mut b_to_a: HashMap<Box<str>, Assignment> = HashMap::new();

    for pair in accepted {
        if !pair.flags.at_least(strictness) {
            continue;
        }
        let a = pair.pair.indv_id_a.clone();
        let b = pair.pair.indv_id_b.clone();
        let weight = pair.weight;
        let passnum = pair.pair.passnum.clone();

        let a_seen = a_to_b.contains_key(&a);
        let b_seen = b_to_a.contains_key(&b);

        if !a_seen && !b_seen {
            a_to_b.insert(
                a.clone(),
                Assignment {
                    partner: b.clone(),
                    weight,
                    deleted: false,
                    passnum: passnum.clone(),
                },
            );
            b_to_a.insert(
                b,
                Assignment {
                    partner: a,
                    weight,
                    deleted: false,
                    passnum,
                },
            );
            continue;
        }

        if let Some(existing) = a_to_b.get(&a) {
            if (existing.weight - weight).abs() < f64::EPSILON {
                let partner = existing.partner.clone();
                a_to_b.get_mut(&a).unwrap().deleted = true;
                if let Some(other) = b_to_a.get_mut(&partner) {
                    other.deleted = true;
                }
            }
        }
        if let Some(existing) = b_to_a.get(&b) {
            if (existing.weight - weight).abs() < f64::EPSILON {
                let partner = existing.partner.clone();
                b_to_a.get_mut(&b).unwrap().deleted = true;
                if let Some(other) = a_to_b.get_mut(&partner) {
                    other.deleted = true;
                }
            }
        }
    }

    a_to_b
        .into_iter()
        .filter(|(_, assignment)| !assignment.deleted)
        .map(|(a, assignment)| CrosswalkRow {
            indv_id_a: a.to_string(),
            indv_id_b: assignment.partner.to_string(),
            weight: assignment.weight,
            passnum: assignment.passnum.to_string(),
            group_id: None,
        })
        .collect()
}

/// `12M`/`M21`: the "many" side is deduplicated with the same ambiguity
/// rule as `121`; the "one" side is left unconstrained, since by
/// definition it's expected to appear in multiple rows.
fn resolve_one_sided(accepted: &[AcceptedPair], strictness: Strictness, many_side: ManySide) -> Vec<CrosswalkRow> {
    let mut many_to_one: HashMap<Box<str>, Assignment> = HashMap::new();

    for pair in accepted {
        if !pair.flags.at_least(strictness) {
            continue;
        }
        let (many_id, one_id) = match many_side {
            ManySide::A => (pair.pair.indv_id_a.clone(), pair.pair.indv_id_b.clone()),
            ManySide::B => (pair.pair.indv_id_b.clone(), pair.pair.indv_id_a.clone()),
        };
        let weight = pair.weight;
        let passnum = pair.pair.passnum.clone();

        match many_to_one.get_mut(&many_id) {
            Some(existing) if (existing.weight - weight).abs() < f64::EPSILON => {
                existing.deleted = true;
            }
            Some(_) => {}
            None => {
                many_to_one.insert(
                    many_id,
                    Assignment {
                        partner: one_id,
                        weight,
                        deleted: false,
                        passnum,
                    },
                );
            }
        }
    }

    many_to_one
        .into_iter()
        .filter(|(_, assignment)| !assignment.deleted)
        .map(|(many, assignment)| {
            let (indv_id_a, indv_id_b) = match many_side {
                ManySide::A => (many.to_string(), assignment.partner.to_string()),
                ManySide::B => (assignment.partner.to_string(), many.to_string()),
            };
            CrosswalkRow {
                indv_id_a,
                indv_id_b,
                weight: assignment.weight,
                passnum: assignment.passnum.to_string(),
                group_id: None,
            }
        })
        .collect()
}

pub fn resolve_one_to_many(accepted: &[AcceptedPair], strictness: Strictness) -> Vec<CrosswalkRow> {
    resolve_one_sided(accepted, strictness, ManySide::B)
}

pub fn resolve_many_to_one(accepted: &[AcceptedPair], strictness: Strictness) -> Vec<CrosswalkRow> {
    resolve_one_sided(accepted, strictness, ManySide::A)
}

/// `M2M`: union-find over the pair namespace (`a_<id>` / `b_<id>` so ids
/// shared between the "a" and "b" input tables never collide) groups every
/// transitively-linked id together, but every accepted pair still becomes
/// its own output row — the union-find only assigns `group_id`, it never
/// collapses pairs. A group of size 4 made of 3 accepted pairs emits 3 rows,
/// all sharing one `group_id`.
pub fn resolve_many_to_many(accepted: &[AcceptedPair], strictness: Strictness) -> Vec<CrosswalkRow> {
    let mut uf: UnionFind<String> = UnionFind::new();
    let mut group = 0u64;
    let mut kept = Vec::new();
    for pair in accepted {
        if !pair.flags.at_least(strictness) {
            continue;
        }
        let a = format!("a_{}", pair.pair.indv_id_a);
        let b = format!("b_{}", pair.pair.indv_id_b);
        uf.add_pair(group, a.clone(), b.clone());
        group += 1;
        kept.push((pair, a));
    }

    kept.into_iter()
        .filter_map(|(pair, a_key)| {
            let group_id = uf.find(&a_key)?;
            Some(CrosswalkRow {
                indv_id_a: pair.pair.indv_id_a.to_string(),
                indv_id_b: pair.pair.indv_id_b.to_string(),
                weight: pair.weight,
                passnum: pair.pair.passnum.to_string(),
                group_id: Some(group_id),
            })
        })
        .collect()
}

/// `dedup`: union-find over the bare id space of a single table. When
/// `include_singletons` is set, every id that matched nothing still gets
/// its own one-member group in the crosswalk (a feature of the original's
/// `mtom_or_dedup_matching` the distilled spec dropped).
pub fn resolve_dedup(
    accepted: &[AcceptedPair],
    strictness: Strictness,
    all_ids: &[String],
    include_singletons: bool,
) -> Vec<(u64, String)> {
    let mut uf: UnionFind<String> = UnionFind::new();
    let mut group = 0u64;
    for pair in accepted {
        if !pair.flags.at_least(strictness) {
            continue;
        }
        uf.add_pair(group, pair.pair.indv_id_a.to_string(), pair.pair.indv_id_b.to_string());
        group += 1;
    }

    if include_singletons {
        for id in all_ids {
            if uf.find(id).is_none() {
                uf.add_item_dedup(group, id.clone());
                group += 1;
            }
        }
    }

    let mut out = Vec::new();
    for (case_id, (_, members)) in uf.super_cases().iter().enumerate() {
        for member in members {
            out.push((case_id as u64 + 1, member.clone()));
        }
    }
    out
}

/// Writes a `121`/`12M`/`M21` crosswalk to `path`.
pub fn write_pairwise_crosswalk(rows: &[CrosswalkRow], path: &std::path::Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
struct DedupRow {
    group: u64,
    indv_id: String,
}

/// Writes a `dedup` crosswalk (`group`, `indv_id` columns) to `path`.
pub fn write_dedup_crosswalk(rows: &[(u64, String)], path: &std::path::Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (group, indv_id) in rows {
        writer.serialize(DedupRow {
            group: *group,
            indv_id: indv_id.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Resolves a full crosswalk for one strictness level according to
/// `config.matchtype`.
pub fn resolve(
    config: &MatchConfig,
    accepted: &[AcceptedPair],
    strictness: Strictness,
    all_ids_for_dedup: &[String],
) -> CrosswalkResult {
    use rlink_types::config::MatchType;
    let result = match config.matchtype {
        MatchType::OneToOne => CrosswalkResult::Pairwise(resolve_one_to_one(accepted, strictness)),
        MatchType::OneToMany => CrosswalkResult::Pairwise(resolve_one_to_many(accepted, strictness)),
        MatchType::ManyToOne => CrosswalkResult::Pairwise(resolve_many_to_one(accepted, strictness)),
        MatchType::ManyToMany => CrosswalkResult::Pairwise(resolve_many_to_many(accepted, strictness)),
        MatchType::Dedup => CrosswalkResult::Dedup(resolve_dedup(
            accepted,
            strictness,
            all_ids_for_dedup,
            config.include_singletons,
        )),
    };
    let rows = match &result {
        CrosswalkResult::Pairwise(rows) => rows.len(),
        CrosswalkResult::Dedup(rows) => rows.len(),
    };
    tracing::info!(matchtype = config.matchtype.as_str(), strictness = strictness.as_str(), rows, "crosswalk resolved");
    result
}

pub enum CrosswalkResult {
    Pairwise(Vec<CrosswalkRow>),
    Dedup(Vec<(u64, String)>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlink_types::pair::AcceptFlags;
    use rlink_types::score::ScoreVector;
    use rlink_types::CandidatePair;

    fn pair(a: &str, b: &str, weight: f64, flags: AcceptFlags) -> AcceptedPair {
        AcceptedPair {
            pair: CandidatePair {
                indv_id_a: a.into(),
                indv_id_b: b.into(),
                idx_a: 0,
                idx_b: 0,
                passnum: PassId::Regular(0),
            },
            scores: ScoreVector::missing(0),
            flags,
            weight,
        }
    }

    #[test]
    fn one_to_one_picks_highest_weight_first() {
        let accepted = vec![
            pair("a1", "b1", 10.0, AcceptFlags::all_true()),
            pair("a1", "b2", 5.0, AcceptFlags::all_true()),
        ];
        let rows = resolve_one_to_one(&accepted, Strictness::Strict);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].indv_id_b, "b1");
    }

    #[test]
    fn one_to_one_tie_voids_both_sides() {
        let accepted = vec![
            pair("a1", "b1", 10.0, AcceptFlags::all_true()),
            pair("a2", "b1", 10.0, AcceptFlags::all_true()),
        ];
        let rows = resolve_one_to_one(&accepted, Strictness::Strict);
        assert!(rows.is_empty());
    }

    #[test]
    fn one_to_many_allows_repeated_one_side() {
        let accepted = vec![
            pair("a1", "b1", 10.0, AcceptFlags::all_true()),
            pair("a1", "b2", 9.0, AcceptFlags::all_true()),
        ];
        let rows = resolve_one_to_many(&accepted, Strictness::Strict);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn many_to_many_groups_transitive_pairs() {
        let accepted = vec![
            pair("a1", "b1", 10.0, AcceptFlags::all_true()),
            pair("a1", "b2", 9.0, AcceptFlags::all_true()),
        ];
        let rows = resolve_many_to_many(&accepted, Strictness::Strict);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.indv_id_b == "b1"));
        assert!(rows.iter().any(|r| r.indv_id_b == "b2"));
        let group_ids: std::collections::HashSet<_> = rows.iter().map(|r| r.group_id).collect();
        assert_eq!(group_ids.len(), 1, "both pairs belong to one transitively-merged group");
    }

    #[test]
    fn dedup_includes_singletons_when_requested() {
        let accepted = vec![pair("a1", "a2", 10.0, AcceptFlags::all_true())];
        let all_ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];
        let rows = resolve_dedup(&accepted, Strictness::Strict, &all_ids, true);
        let groups: std::collections::HashSet<u64> = rows.iter().map(|(g, _)| *g).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn dedup_omits_singletons_by_default() {
        let accepted = vec![pair("a1", "a2", 10.0, AcceptFlags::all_true())];
        let all_ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];
        let rows = resolve_dedup(&accepted, Strictness::Strict, &all_ids, false);
        assert_eq!(rows.len(), 2);
    }
}
