//! Generic union-find with aliased canonical groups, ported from the
//! original postprocessing step's `UnionFind` class.
//!
//! `union(g1, g2)` always keeps `g1` as the surviving canonical group and
//! redirects `g2`, plus every group previously aliased to `g2`, onto it.
//! Repeated unions of groups that have already been merged are no-ops.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub type GroupId = u64;

#[derive(Debug)]
pub struct UnionFind<Item: Eq + Hash + Clone> {
    group_to_items: HashMap<GroupId, HashSet<Item>>,
    item_to_group: HashMap<Item, GroupId>,
    group_alias: HashMap<GroupId, GroupId>,
    alias_members: HashMap<GroupId, HashSet<GroupId>>,
}

impl<Item: Eq + Hash + Clone> Default for UnionFind<Item> {
    fn default() -> Self {
        Self {
            group_to_items: HashMap::new(),
            item_to_group: HashMap::new(),
            group_alias: HashMap::new(),
            alias_members: HashMap::new(),
        }
    }
}

impl<Item: Eq + Hash + Clone> UnionFind<Item> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, item: &Item) -> Option<GroupId> {
        self.item_to_group.get(item).copied()
    }

    fn top(&self, group: GroupId) -> GroupId {
        *self.group_alias.get(&group).unwrap_or(&group)
    }

    /// Merges `group_b` into `group_a`. `group_a` survives as the canonical
    /// group name.
    pub fn union(&mut self, group_a: GroupId, group_b: GroupId) {
        if group_a == group_b {
            return;
        }
        if self.group_alias.get(&group_a) == Some(&group_b) {
            return;
        }
        if self.group_alias.get(&group_b) == Some(&group_a) {
            return;
        }

        let top_a = self.top(group_a);
        let top_b = self.top(group_b);
        if top_a == top_b {
            return;
        }

        let items_b = self.group_to_items.remove(&top_b).unwrap_or_default();
        for item in &items_b {
            self.item_to_group.insert(item.clone(), top_a);
        }
        self.group_to_items.entry(top_a).or_default().extend(items_b);

        self.group_alias.insert(group_b, top_a);
        self.group_alias.insert(top_b, top_a);

        let merged_prior = self.alias_members.remove(&top_b);
        let entry = self.alias_members.entry(top_a).or_default();
        entry.insert(group_b);
        entry.insert(top_b);
        if let Some(prior) = merged_prior {
            for g in &prior {
                self.group_alias.insert(*g, top_a);
            }
            self.alias_members.get_mut(&top_a).unwrap().extend(prior);
        }
    }

    /// Adds `item` to `group`. If `item` already belongs to a different
    /// group, the two groups are merged.
    pub fn add_item_dedup(&mut self, group: GroupId, item: Item) {
        if let Some(&existing) = self.item_to_group.get(&item) {
            if existing == group {
                return;
            }
            if self.group_to_items.contains_key(&group) {
                self.union(existing, group);
            } else if let Some(&aliased_top) = self.group_alias.get(&group) {
                if aliased_top != existing {
                    self.union(aliased_top, existing);
                }
            } else {
                self.group_to_items.insert(group, HashSet::from([item]));
                self.union(existing, group);
            }
        } else if let Some(&top) = self.group_alias.get(&group) {
            self.group_to_items.entry(top).or_default().insert(item.clone());
            self.item_to_group.insert(item, top);
        } else {
            self.group_to_items.entry(group).or_default().insert(item.clone());
            self.item_to_group.insert(item, group);
        }
    }

    /// Adds an edge `(a, b)` discovered under `group` to the structure,
    /// merging whichever groups `a` and/or `b` already belong to.
    pub fn add_pair(&mut self, group: GroupId, a: Item, b: Item) {
        if a == b {
            self.add_item_dedup(group, a);
            return;
        }
        let group_a = self.item_to_group.get(&a).copied();
        let group_b = self.item_to_group.get(&b).copied();
        match (group_a, group_b) {
            (Some(ga), None) => {
                self.union(ga, group);
                let top = self.top(ga);
                self.item_to_group.insert(b.clone(), top);
                self.group_to_items.entry(top).or_default().insert(b);
            }
            (None, Some(gb)) => {
                self.union(gb, group);
                let top = self.top(gb);
                self.item_to_group.insert(a.clone(), top);
                self.group_to_items.entry(top).or_default().insert(a);
            }
            (Some(ga), Some(gb)) if ga != gb => {
                self.union(ga, group);
                self.union(ga, gb);
            }
            (Some(ga), Some(_)) => {
                self.union(ga, group);
            }
            (None, None) => {
                self.group_to_items.insert(group, HashSet::from([a.clone(), b.clone()]));
                self.item_to_group.insert(a, group);
                self.item_to_group.insert(b, group);
            }
        }
    }

    pub fn super_cases(&self) -> &HashMap<GroupId, HashSet<Item>> {
        &self.group_to_items
    }

    pub fn super_case_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.group_to_items.values().map(HashSet::len).collect();
        sizes.sort_unstable();
        sizes
    }
}
