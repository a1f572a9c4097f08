//! Grouping of related items.
//!
//! Expansions are clustered with their base game, remaining items are
//! clustered by shared family/series identifiers, and groups whose total
//! footprint area exceeds the per-cube threshold are split so every group
//! has a chance to fit into a single cube.

use std::collections::{HashMap, HashSet};

use crate::model::{Group, ResolvedItem};
use crate::types::EPSILON_AREA;

/// Clusters expansions with their base items.
///
/// Every expansion whose base id resolves to an item in the candidate set
/// joins a group keyed by that base; the base item itself is inserted as
/// the first member. Groups without a genuine (non-expansion) base member
/// or with fewer than two members are discarded — a lone expansion is
/// treated as standalone.
///
/// # Parameters
/// * `items` - Resolved candidate items, in packing order
pub fn build_expansion_groups(items: &[ResolvedItem]) -> Vec<Group> {
    let by_id: HashMap<u64, &ResolvedItem> =
        items.iter().map(|r| (r.item.id, r)).collect();

    let mut base_order: Vec<u64> = Vec::new();
    let mut members: HashMap<u64, Vec<u64>> = HashMap::new();

    for resolved in items {
        if !resolved.item.is_expansion {
            continue;
        }
        let Some(base_id) = resolved.item.base_id else {
            continue;
        };
        let Some(base) = by_id.get(&base_id) else {
            continue;
        };
        if base.item.is_expansion {
            // No genuine base member; the expansion stays standalone.
            continue;
        }

        let entry = members.entry(base_id).or_insert_with(|| {
            base_order.push(base_id);
            vec![base_id]
        });
        entry.push(resolved.item.id);
    }

    base_order
        .into_iter()
        .filter_map(|base_id| {
            let member_ids = members.remove(&base_id)?;
            if member_ids.len() < 2 {
                return None;
            }
            let total_area = member_ids
                .iter()
                .filter_map(|id| by_id.get(id))
                .map(|r| r.area())
                .sum();
            Some(Group {
                representative: base_id,
                members: member_ids,
                total_area,
            })
        })
        .collect()
}

/// Clusters items by family/series identifiers.
///
/// Items already claimed by an expansion group are skipped. Each remaining
/// item with at least one family id is assigned greedily to the smallest
/// currently-sized family group among its families, so a single item does
/// not anchor many large groups. Groups of size < 2 are discarded.
///
/// # Parameters
/// * `items` - Resolved candidate items, in packing order
/// * `claimed` - Item ids already bound to an expansion group
pub fn build_series_groups(items: &[ResolvedItem], claimed: &HashSet<u64>) -> Vec<Group> {
    let areas: HashMap<u64, f64> = items.iter().map(|r| (r.item.id, r.area())).collect();

    // Family name -> member ids, in first-seen family order.
    let mut families: Vec<(String, Vec<u64>)> = Vec::new();

    for resolved in items {
        if claimed.contains(&resolved.item.id) || resolved.item.families.is_empty() {
            continue;
        }

        let mut chosen: Option<&str> = None;
        let mut chosen_size = usize::MAX;
        for family in &resolved.item.families {
            let size = families
                .iter()
                .find(|(name, _)| name == family)
                .map(|(_, ids)| ids.len())
                .unwrap_or(0);
            if size < chosen_size {
                chosen = Some(family);
                chosen_size = size;
            }
        }

        if let Some(family) = chosen {
            match families.iter_mut().find(|(name, _)| name == family) {
                Some((_, ids)) => ids.push(resolved.item.id),
                None => families.push((family.to_string(), vec![resolved.item.id])),
            }
        }
    }

    families
        .into_iter()
        .filter(|(_, ids)| ids.len() >= 2)
        .map(|(_, member_ids)| {
            let total_area = member_ids
                .iter()
                .filter_map(|id| areas.get(id))
                .sum();
            Group {
                representative: member_ids[0],
                members: member_ids,
                total_area,
            }
        })
        .collect()
}

/// Splits groups whose total area exceeds the per-cube threshold.
///
/// Members are sorted by footprint area descending; one sub-group is
/// seeded with the representative, then each remaining member goes to the
/// first sub-group whose running area stays within the threshold, or opens
/// a new sub-group otherwise.
///
/// # Parameters
/// * `groups` - The groups to check
/// * `items` - Resolved items backing the member ids
/// * `max_area` - Threshold (a fraction of the cube capacity)
pub fn split_oversized_groups(
    groups: Vec<Group>,
    items: &[ResolvedItem],
    max_area: f64,
) -> Vec<Group> {
    let areas: HashMap<u64, f64> = items.iter().map(|r| (r.item.id, r.area())).collect();
    let area_of = |id: &u64| areas.get(id).copied().unwrap_or(0.0);

    let mut result = Vec::with_capacity(groups.len());
    for group in groups {
        if group.total_area <= max_area + EPSILON_AREA {
            result.push(group);
            continue;
        }

        let mut remaining: Vec<u64> = group
            .members
            .iter()
            .copied()
            .filter(|id| *id != group.representative)
            .collect();
        remaining.sort_by(|a, b| {
            area_of(b)
                .partial_cmp(&area_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut buckets: Vec<(Vec<u64>, f64)> =
            vec![(vec![group.representative], area_of(&group.representative))];
        for id in remaining {
            let area = area_of(&id);
            match buckets
                .iter_mut()
                .find(|(_, used)| *used + area <= max_area + EPSILON_AREA)
            {
                Some((ids, used)) => {
                    ids.push(id);
                    *used += area;
                }
                None => buckets.push((vec![id], area)),
            }
        }

        for (member_ids, total_area) in buckets {
            result.push(Group {
                representative: member_ids[0],
                members: member_ids,
                total_area,
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FootprintSet, Item};

    fn resolved(id: u64, name: &str, edge: f64) -> ResolvedItem {
        let item = Item::new(id, name, (edge, edge, edge));
        ResolvedItem {
            footprints: FootprintSet::from_dims(item.dims.unwrap()).unwrap(),
            item,
            oversized: false,
        }
    }

    fn expansion(id: u64, name: &str, edge: f64, base_id: u64) -> ResolvedItem {
        let mut r = resolved(id, name, edge);
        r.item.is_expansion = true;
        r.item.base_id = Some(base_id);
        r
    }

    fn with_families(mut r: ResolvedItem, families: &[&str]) -> ResolvedItem {
        r.item.families = families.iter().map(|f| f.to_string()).collect();
        r
    }

    #[test]
    fn expansions_group_with_their_base_first() {
        let items = vec![
            expansion(2, "Base: Exp 1", 5.0, 1),
            resolved(1, "Base", 10.0),
            expansion(3, "Base: Exp 2", 4.0, 1),
        ];
        let groups = build_expansion_groups(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].representative, 1);
        assert_eq!(groups[0].members, vec![1, 2, 3]);
        assert!((groups[0].total_area - (100.0 + 25.0 + 16.0)).abs() < 1e-9);
    }

    #[test]
    fn lone_expansion_stays_standalone() {
        // Base id 99 is not in the candidate set.
        let items = vec![expansion(2, "Orphan", 5.0, 99), resolved(1, "Other", 6.0)];
        assert!(build_expansion_groups(&items).is_empty());
    }

    #[test]
    fn expansion_chained_to_expansion_is_discarded() {
        let items = vec![
            expansion(1, "Mid", 5.0, 99),
            expansion(2, "Leaf", 4.0, 1),
        ];
        assert!(build_expansion_groups(&items).is_empty());
    }

    #[test]
    fn series_groups_balance_across_families() {
        let items = vec![
            with_families(resolved(1, "A", 5.0), &["alpha"]),
            with_families(resolved(2, "B", 5.0), &["alpha"]),
            // Belongs to both; "beta" is empty, so it lands there.
            with_families(resolved(3, "C", 5.0), &["alpha", "beta"]),
            with_families(resolved(4, "D", 5.0), &["beta"]),
        ];
        let groups = build_series_groups(&items, &HashSet::new());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![1, 2]);
        assert_eq!(groups[1].members, vec![3, 4]);
    }

    #[test]
    fn series_groups_skip_claimed_items_and_singletons() {
        let items = vec![
            with_families(resolved(1, "A", 5.0), &["alpha"]),
            with_families(resolved(2, "B", 5.0), &["alpha"]),
            with_families(resolved(3, "C", 5.0), &["gamma"]),
        ];
        let claimed: HashSet<u64> = [1].into_iter().collect();
        // Item 1 is claimed, leaving "alpha" and "gamma" with one member each.
        assert!(build_series_groups(&items, &claimed).is_empty());
    }

    #[test]
    fn oversized_groups_split_first_fit_seeded_with_representative() {
        let items = vec![
            resolved(1, "Base", 10.0),   // 100
            resolved(2, "Big", 9.0),     // 81
            resolved(3, "Small", 4.0),   // 16
            resolved(4, "Tiny", 2.0),    // 4
        ];
        let group = Group {
            representative: 1,
            members: vec![1, 2, 3, 4],
            total_area: 201.0,
        };
        let split = split_oversized_groups(vec![group], &items, 120.0);

        assert_eq!(split.len(), 2);
        // Representative seeds the first bucket; 81 does not fit next to
        // 100, but 16 and 4 do.
        assert_eq!(split[0].members, vec![1, 3, 4]);
        assert!((split[0].total_area - 120.0).abs() < 1e-9);
        assert_eq!(split[1].members, vec![2]);
        assert_eq!(split[1].representative, 2);
    }

    #[test]
    fn groups_within_threshold_pass_through() {
        let items = vec![resolved(1, "A", 5.0), resolved(2, "B", 5.0)];
        let group = Group {
            representative: 1,
            members: vec![1, 2],
            total_area: 50.0,
        };
        let split = split_oversized_groups(vec![group.clone()], &items, 155.0);
        assert_eq!(split, vec![group]);
    }
}
