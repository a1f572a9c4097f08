//! Placement logic for packing items into storage cubes.
//!
//! This module implements the heuristic placement engine:
//! - direct bottom-left-fill placement with collision and support checks
//! - post-placement stability improvement (wider items migrate below
//!   narrower ones)
//! - aggressive whole-cube reorganization when direct placement fails
//! - group placement (all-or-nothing) and the packing orchestrator
//!
//! The engine is synchronous and deterministic: identical inputs produce
//! identical layouts. Every multi-item operation snapshots the cube and
//! restores it exactly on failure, so callers never observe partial state.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::{collides, find_position, has_full_support, round_to_grid};
use crate::grouping::{build_expansion_groups, build_series_groups, split_oversized_groups};
use crate::model::{Container, FootprintSet, Group, Item, PlacedItem, ResolvedItem};
use crate::sorting::{compare_by_area_desc, compare_items};
use crate::types::{EPSILON_AREA, EPSILON_LENGTH, Orientation, SortRule};

/// Engine tunables for the packing algorithm.
///
/// Contains the cube geometry and all thresholds controlling placement.
#[derive(Copy, Clone, Debug)]
pub struct PackerParams {
    /// Edge length of a storage cube.
    pub container_size: f64,
    /// Step size of the placement grid (smaller = finer, but slower).
    pub grid_step: f64,
    /// Footprint edge at or above which an item counts as oversized.
    pub oversize_limit: f64,
    /// Maximum group area as a fraction of the cube capacity.
    pub max_group_ratio: f64,
}

impl PackerParams {
    pub const DEFAULT_CONTAINER_SIZE: f64 = 12.8;
    pub const DEFAULT_GRID_STEP: f64 = 0.1;
    pub const DEFAULT_OVERSIZE_LIMIT: f64 = 13.0;
    pub const DEFAULT_MAX_GROUP_RATIO: f64 = 0.95;

    /// Creates a builder for custom parameters.
    pub fn builder() -> PackerParamsBuilder {
        PackerParamsBuilder::default()
    }

    /// Total capacity of one cube.
    #[inline]
    pub fn capacity(&self) -> f64 {
        self.container_size * self.container_size
    }

    /// Maximum total footprint area a group may have before it is split.
    #[inline]
    pub fn max_group_area(&self) -> f64 {
        self.max_group_ratio * self.capacity()
    }

    /// Half-step tolerance used for grid comparisons.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.grid_step * 0.5
    }

    /// Returns parameters with every invalid field replaced by its default.
    ///
    /// Each replacement is reported with a warning so a misconfigured
    /// caller still gets a working run.
    pub fn sanitized(&self) -> Self {
        let mut params = *self;
        if !(params.container_size.is_finite() && params.container_size > 0.0) {
            eprintln!(
                "⚠️ Invalid container size {}. Using {}.",
                params.container_size,
                Self::DEFAULT_CONTAINER_SIZE
            );
            params.container_size = Self::DEFAULT_CONTAINER_SIZE;
        }
        if !(params.grid_step.is_finite()
            && params.grid_step > 0.0
            && params.grid_step < params.container_size)
        {
            eprintln!(
                "⚠️ Invalid grid step {}. Using {}.",
                params.grid_step,
                Self::DEFAULT_GRID_STEP
            );
            params.grid_step = Self::DEFAULT_GRID_STEP;
        }
        if !(params.oversize_limit.is_finite() && params.oversize_limit > 0.0) {
            eprintln!(
                "⚠️ Invalid oversize limit {}. Using {}.",
                params.oversize_limit,
                Self::DEFAULT_OVERSIZE_LIMIT
            );
            params.oversize_limit = Self::DEFAULT_OVERSIZE_LIMIT;
        }
        if !(params.max_group_ratio.is_finite()
            && params.max_group_ratio > 0.0
            && params.max_group_ratio <= 1.0)
        {
            eprintln!(
                "⚠️ Invalid max group ratio {}. Using {}.",
                params.max_group_ratio,
                Self::DEFAULT_MAX_GROUP_RATIO
            );
            params.max_group_ratio = Self::DEFAULT_MAX_GROUP_RATIO;
        }
        params
    }
}

impl Default for PackerParams {
    fn default() -> Self {
        Self {
            container_size: Self::DEFAULT_CONTAINER_SIZE,
            grid_step: Self::DEFAULT_GRID_STEP,
            oversize_limit: Self::DEFAULT_OVERSIZE_LIMIT,
            max_group_ratio: Self::DEFAULT_MAX_GROUP_RATIO,
        }
    }
}

/// Builder pattern for PackerParams.
#[derive(Clone, Debug, Default)]
pub struct PackerParamsBuilder {
    params: Option<PackerParams>,
}

impl PackerParamsBuilder {
    fn params(&mut self) -> &mut PackerParams {
        self.params.get_or_insert_with(PackerParams::default)
    }

    /// Sets the cube edge length.
    pub fn container_size(mut self, size: f64) -> Self {
        self.params().container_size = size;
        self
    }

    /// Sets the placement grid step.
    pub fn grid_step(mut self, step: f64) -> Self {
        self.params().grid_step = step;
        self
    }

    /// Sets the oversized threshold.
    pub fn oversize_limit(mut self, limit: f64) -> Self {
        self.params().oversize_limit = limit;
        self
    }

    /// Sets the maximum group area ratio.
    pub fn max_group_ratio(mut self, ratio: f64) -> Self {
        self.params().max_group_ratio = ratio;
        self
    }

    /// Builds the final parameters.
    pub fn build(self) -> PackerParams {
        self.params.unwrap_or_default()
    }
}

/// Caller-facing behavior flags for one packing run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PackOptions {
    /// Orientation tried first for items without a forced orientation.
    pub primary_orientation: Orientation,
    /// Restricts every item to the primary orientation.
    pub lock_rotation: bool,
    /// Pack by area descending and backfill all cubes.
    pub optimize_space: bool,
    /// Only ever append to the most recently opened cube.
    pub respect_sort_order: bool,
    /// Squeeze oversized items into a cube instead of excluding them.
    pub fit_oversized: bool,
    /// Keep expansions together with their base game.
    pub group_expansions: bool,
    /// Keep items of the same family/series together.
    pub group_series: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            primary_orientation: Orientation::Horizontal,
            lock_rotation: false,
            optimize_space: false,
            respect_sort_order: false,
            fit_oversized: false,
            group_expansions: false,
            group_series: false,
        }
    }
}

/// An item excluded because its footprint exceeds the oversized threshold.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ExcludedItem {
    pub id: u64,
    pub name: String,
    #[schema(value_type = [f64; 3])]
    pub dims: (f64, f64, f64),
}

/// An oversized item that was forced into a cube (fit-oversized mode).
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StuffedItem {
    pub id: u64,
    pub name: String,
    pub container_id: usize,
}

/// An item that could not enter placement at all.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UnpackableItem {
    pub id: u64,
    pub name: String,
    pub reason: String,
}

/// Result of one packing run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingResult {
    pub containers: Vec<Container>,
    pub excluded_oversized: Vec<ExcludedItem>,
    pub stuffed_oversized: Vec<StuffedItem>,
    pub unpackable: Vec<UnpackableItem>,
}

impl PackingResult {
    /// Indicates whether every item entered a cube.
    pub fn is_complete(&self) -> bool {
        self.excluded_oversized.is_empty() && self.unpackable.is_empty()
    }

    /// Returns the total number of cubes.
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Returns the total number of placed items.
    pub fn placed_count(&self) -> usize {
        self.containers.iter().map(|c| c.placed.len()).sum()
    }

    /// Calculates the average utilization across all cubes.
    pub fn average_utilization(&self) -> f64 {
        if self.containers.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .containers
            .iter()
            .map(|c| c.utilization_percent())
            .sum();
        sum / self.containers.len() as f64
    }
}

/// Checks whether a footprint reaches the oversized threshold on any axis.
#[inline]
fn exceeds_threshold(footprint: crate::types::Footprint, limit: f64) -> bool {
    footprint.x >= limit - EPSILON_LENGTH || footprint.y >= limit - EPSILON_LENGTH
}

/// Orientation candidates for an item, in trial order.
fn orientation_candidates(item: &Item, options: &PackOptions) -> Vec<Orientation> {
    if let Some(forced) = item.forced_orientation {
        vec![forced]
    } else if options.lock_rotation {
        vec![options.primary_orientation]
    } else {
        vec![
            options.primary_orientation,
            options.primary_orientation.flipped(),
        ]
    }
}

/// Attempts to place one item directly into a cube.
///
/// The footprint is clamped to the cube edge (packed footprint); the true
/// extents are retained with per-axis oversized flags. A cheap area
/// pre-check runs before the positional scan. On success the item is
/// appended, the occupied-area cache updated and the stability improver
/// invoked.
///
/// # Returns
/// `true` if the item was placed; never errors
fn try_place_item(
    container: &mut Container,
    resolved: &ResolvedItem,
    orientation: Orientation,
    params: &PackerParams,
) -> bool {
    let actual = resolved.footprint(orientation);
    let packed = actual.clamped_to(container.size);

    if container.occupied_area() + packed.area() > container.capacity() + EPSILON_AREA {
        return false;
    }

    let Some((x, y)) = find_position(
        container.size,
        packed.x,
        packed.y,
        &container.placed,
        params.grid_step,
    ) else {
        return false;
    };

    let eps = params.epsilon();
    container.push_item(PlacedItem {
        item_id: resolved.item.id,
        name: resolved.item.name.clone(),
        position: (x, y),
        packed,
        actual,
        orientation,
        oversized_x: actual.x > container.size + eps,
        oversized_y: actual.y > container.size + eps,
    });
    improve_stability(container, container.placed.len() - 1, params);
    true
}

/// True if two placed items overlap horizontally by more than epsilon.
fn overlaps_x(a: &PlacedItem, b: &PlacedItem, eps: f64) -> bool {
    a.position.0 + eps < b.right() && b.position.0 + eps < a.right()
}

/// Tries to re-place one item at a fixed level.
///
/// Preferred x positions are tried first, then a full horizontal scan;
/// each candidate is checked for bounds, collision and full support
/// against the items currently in the cube.
fn place_at_level(
    container: &Container,
    item: &PlacedItem,
    y: f64,
    preferred_xs: &[f64],
    params: &PackerParams,
) -> Option<f64> {
    let step = params.grid_step;
    let eps = params.epsilon();
    let (w, h) = (item.packed.x, item.packed.y);

    if y + h > container.size + eps {
        return None;
    }

    for &preferred in preferred_xs {
        let x = round_to_grid(preferred, step);
        if x >= -eps
            && x + w <= container.size + eps
            && !collides(x, y, w, h, &container.placed, step)
            && has_full_support(x, y, w, &container.placed, step)
        {
            return Some(x);
        }
    }

    let x_steps = ((container.size - w + eps) / step).floor() as usize;
    for xi in 0..=x_steps {
        let x = xi as f64 * step;
        if !collides(x, y, w, h, &container.placed, step)
            && has_full_support(x, y, w, &container.placed, step)
        {
            return Some(x);
        }
    }
    None
}

/// Local repair after a successful placement: wider items migrate below.
///
/// For every direct supporter narrower than the placed item by more than
/// one grid step, a vertical swap is attempted so the wider item ends up
/// lower. Both re-placements must succeed, and every other item in the
/// cube must remain fully supported afterwards (the two moves expose both
/// old top edges, so third items can be left floating); on any failure
/// the original positions are restored exactly and the next supporter is
/// tried. After a committed swap, the moved item is re-checked recursively
/// (depth bounded by the cube's item count).
fn improve_stability(container: &mut Container, index: usize, params: &PackerParams) {
    let step = params.grid_step;
    let eps = params.epsilon();

    let item = container.placed[index].clone();
    if item.position.1 < step {
        return;
    }

    let supporter_ids: Vec<u64> = container
        .placed
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            *i != index
                && (p.top() - item.position.1).abs() <= eps
                && overlaps_x(p, &item, eps)
        })
        .map(|(_, p)| p.item_id)
        .collect();

    for supporter_id in supporter_ids {
        let Some(sup_index) = container
            .placed
            .iter()
            .position(|p| p.item_id == supporter_id)
        else {
            continue;
        };
        let supporter = container.placed[sup_index].clone();

        // Only swap when the supporter is narrower by more than one step.
        if item.packed.x - supporter.packed.x <= step + eps {
            continue;
        }

        let Some(item_index) = container
            .placed
            .iter()
            .position(|p| p.item_id == item.item_id)
        else {
            return;
        };

        let (high, low) = if item_index > sup_index {
            (item_index, sup_index)
        } else {
            (sup_index, item_index)
        };
        let removed_high = container.remove_item(high);
        let removed_low = container.remove_item(low);

        let (wider, narrower) = if removed_high.item_id == item.item_id {
            (removed_high.clone(), removed_low.clone())
        } else {
            (removed_low.clone(), removed_high.clone())
        };

        let lower_y = wider.position.1.min(narrower.position.1);
        let upper_y = wider.position.1.max(narrower.position.1);

        let mut committed = false;
        if let Some(wider_x) = place_at_level(
            container,
            &wider,
            lower_y,
            &[wider.position.0, narrower.position.0],
            params,
        ) {
            let mut moved_wider = wider.clone();
            moved_wider.position = (wider_x, lower_y);
            container.push_item(moved_wider);

            if let Some(narrower_x) = place_at_level(
                container,
                &narrower,
                upper_y,
                &[narrower.position.0, wider.position.0],
                params,
            ) {
                let mut moved_narrower = narrower.clone();
                moved_narrower.position = (narrower_x, upper_y);
                container.push_item(moved_narrower);

                // Items that rested on either vacated top edge must not
                // be left floating by the relocation.
                if items_fully_supported(container, step) {
                    committed = true;
                } else {
                    remove_by_id(container, narrower.item_id);
                    remove_by_id(container, wider.item_id);
                }
            } else {
                remove_by_id(container, wider.item_id);
            }
        }

        if committed {
            // The wider item's new supporters may themselves be unstable.
            if let Some(new_index) = container
                .placed
                .iter()
                .position(|p| p.item_id == wider.item_id)
            {
                improve_stability(container, new_index, params);
            }
            return;
        }

        // Restore both items at their original list positions.
        container.insert_item(low, removed_low);
        container.insert_item(high, removed_high);
    }
}

/// True when every elevated item in the cube rests on a full support span.
///
/// An item never counts as its own supporter (its top edge sits a full
/// height above its base), so the whole list can be passed as-is.
fn items_fully_supported(container: &Container, step: f64) -> bool {
    container.placed.iter().all(|item| {
        has_full_support(
            item.position.0,
            item.position.1,
            item.packed.x,
            &container.placed,
            step,
        )
    })
}

/// Removes an item by id and returns it; falls back to the last slot.
fn remove_by_id(container: &mut Container, item_id: u64) -> PlacedItem {
    let index = container
        .placed
        .iter()
        .position(|p| p.item_id == item_id)
        .unwrap_or(container.placed.len() - 1);
    container.remove_item(index)
}

/// Whole-cube re-layout attempt to accommodate an item that did not fit.
///
/// Snapshots every placed item, rebuilds a combined ordered list of the
/// existing items (keeping their applied orientation) plus the new item
/// (with the orientation under trial), then clears the cube and re-places
/// everything in comparator order. Any failure restores the snapshot
/// exactly; no partial state is ever observable.
fn try_aggressive_reorganization(
    container: &mut Container,
    new_item: &ResolvedItem,
    trial: Orientation,
    all: &[ResolvedItem],
    options: &PackOptions,
    rules: &[SortRule],
    params: &PackerParams,
) -> bool {
    let packed_new = new_item.footprint(trial).clamped_to(container.size);
    if container.occupied_area() + packed_new.area() > container.capacity() + EPSILON_AREA {
        return false;
    }

    let snapshot = container.placed.clone();

    // Existing items keep their applied orientation, the new item uses
    // the orientation under trial.
    let mut working: Vec<(&ResolvedItem, Orientation)> = Vec::with_capacity(snapshot.len() + 1);
    for placed in &snapshot {
        let Some(resolved) = all.iter().find(|r| r.item.id == placed.item_id) else {
            return false;
        };
        working.push((resolved, placed.orientation));
    }
    working.push((new_item, trial));

    if options.optimize_space {
        working.sort_by(|(a, _), (b, _)| {
            compare_by_area_desc(a.area(), b.area(), &a.item, &b.item, rules)
        });
    } else {
        working.sort_by(|(a, _), (b, _)| compare_items(&a.item, &b.item, rules));
    }

    container.clear_items();
    let eps = params.epsilon();
    for (resolved, orientation) in working {
        let actual = resolved.footprint(orientation);
        let packed = actual.clamped_to(container.size);
        match find_position(
            container.size,
            packed.x,
            packed.y,
            &container.placed,
            params.grid_step,
        ) {
            Some((x, y)) => container.push_item(PlacedItem {
                item_id: resolved.item.id,
                name: resolved.item.name.clone(),
                position: (x, y),
                packed,
                actual,
                orientation,
                oversized_x: actual.x > container.size + eps,
                oversized_y: actual.y > container.size + eps,
            }),
            None => {
                container.set_items(snapshot);
                return false;
            }
        }
    }
    true
}

/// Attempts to place every member of a group into one cube.
///
/// Members are placed into a temporary copy; the copy replaces the cube
/// only if every member succeeds (all-or-nothing).
fn try_place_group(
    container: &mut Container,
    group: &Group,
    all: &[ResolvedItem],
    options: &PackOptions,
    params: &PackerParams,
) -> bool {
    let mut trial = container.clone();
    for member_id in &group.members {
        let Some(resolved) = all.iter().find(|r| r.item.id == *member_id) else {
            return false;
        };
        let placed = orientation_candidates(&resolved.item, options)
            .into_iter()
            .any(|orientation| try_place_item(&mut trial, resolved, orientation, params));
        if !placed {
            return false;
        }
    }
    *container = trial;
    true
}

/// Candidate cubes to try before opening a new one, in trial order.
///
/// Optimize-space considers every cube, fullest first; respect-sort-order
/// only the most recently opened cube; the default is a backfill window of
/// the two most recently opened cubes.
fn candidate_containers(containers: &[Container], options: &PackOptions) -> Vec<usize> {
    if options.optimize_space {
        let mut indices: Vec<usize> = (0..containers.len()).collect();
        indices.sort_by(|&a, &b| {
            containers[b]
                .occupied_area()
                .partial_cmp(&containers[a].occupied_area())
                .unwrap_or(Ordering::Equal)
        });
        indices
    } else if options.respect_sort_order {
        containers.len().checked_sub(1).map(|i| vec![i]).unwrap_or_default()
    } else {
        (containers.len().saturating_sub(2)..containers.len()).collect()
    }
}

/// Places one item, trying existing cubes first and opening a new one
/// only when every candidate rejects it.
///
/// Per candidate cube: direct placement in every allowed orientation, then
/// aggressive reorganization in every allowed orientation.
///
/// # Returns
/// The id of the cube the item ended up in, or `None` if even a fresh
/// cube rejected it (not reachable with a clamped footprint).
fn place_item(
    containers: &mut Vec<Container>,
    resolved: &ResolvedItem,
    all: &[ResolvedItem],
    options: &PackOptions,
    rules: &[SortRule],
    params: &PackerParams,
) -> Option<usize> {
    let orientations = orientation_candidates(&resolved.item, options);

    for index in candidate_containers(containers, options) {
        for &orientation in &orientations {
            if try_place_item(&mut containers[index], resolved, orientation, params) {
                return Some(containers[index].id);
            }
        }
    }
    for index in candidate_containers(containers, options) {
        for &orientation in &orientations {
            if try_aggressive_reorganization(
                &mut containers[index],
                resolved,
                orientation,
                all,
                options,
                rules,
                params,
            ) {
                return Some(containers[index].id);
            }
        }
    }

    let mut fresh = open_container(containers.len() + 1, params);
    for &orientation in &orientations {
        if try_place_item(&mut fresh, resolved, orientation, params) {
            let id = fresh.id;
            containers.push(fresh);
            return Some(id);
        }
    }
    None
}

/// Opens a new empty cube.
fn open_container(id: usize, params: &PackerParams) -> Container {
    // Parameters are sanitized at the start of the run.
    Container::new(id, params.container_size).expect("container size validated")
}

/// Resolves footprints and partitions the input items.
///
/// Items without three finite positive dimensions are reported and
/// skipped; the run continues for everything else. Oversized items are
/// excluded unless fit-oversized is set, in which case they proceed but
/// stay flagged.
fn prepare(
    items: Vec<Item>,
    options: &PackOptions,
    params: &PackerParams,
) -> (Vec<ResolvedItem>, Vec<ExcludedItem>, Vec<UnpackableItem>) {
    let mut resolved = Vec::with_capacity(items.len());
    let mut excluded = Vec::new();
    let mut unpackable = Vec::new();

    for item in items {
        let Some(dims) = item.dims else {
            eprintln!("⚠️ Item {} ('{}') has no dimensions, skipping.", item.id, item.name);
            unpackable.push(UnpackableItem {
                id: item.id,
                name: item.name,
                reason: "missing dimensions".to_string(),
            });
            continue;
        };
        let footprints = match FootprintSet::from_dims(dims) {
            Ok(set) => set,
            Err(err) => {
                eprintln!("⚠️ Item {} ('{}') is not packable: {}", item.id, item.name, err);
                unpackable.push(UnpackableItem {
                    id: item.id,
                    name: item.name,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let chosen = item
            .forced_orientation
            .unwrap_or(options.primary_orientation);
        let oversized = exceeds_threshold(footprints.footprint(chosen), params.oversize_limit);

        if oversized && !options.fit_oversized {
            excluded.push(ExcludedItem {
                id: item.id,
                name: item.name.clone(),
                dims,
            });
            continue;
        }

        resolved.push(ResolvedItem {
            item,
            footprints,
            oversized,
        });
    }

    (resolved, excluded, unpackable)
}

/// Packs a collection into storage cubes.
///
/// Runs the linear pipeline: prepare, group, sort, place groups, place
/// standalone items, place leftover group members, finalize. Terminates
/// once every item is placed or excluded; never throws under normal
/// operation — unusable items are reported through the result lists.
///
/// # Parameters
/// * `items` - The collection to pack, in caller order
/// * `options` - Behavior flags for this run
/// * `rules` - Ordered sort rules applied to items and groups
/// * `params` - Engine tunables (sanitized before use)
pub fn pack_items(
    items: Vec<Item>,
    options: &PackOptions,
    rules: &[SortRule],
    params: &PackerParams,
) -> PackingResult {
    let params = params.sanitized();

    // Prepare
    let (mut resolved, excluded_oversized, unpackable) = prepare(items, options, &params);

    // Group
    let mut groups: Vec<Group> = Vec::new();
    if options.group_expansions {
        groups.extend(build_expansion_groups(&resolved));
    }
    if options.group_series {
        let claimed: HashSet<u64> = groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .collect();
        groups.extend(build_series_groups(&resolved, &claimed));
    }
    groups = split_oversized_groups(groups, &resolved, params.max_group_area());

    // Sort
    if options.optimize_space {
        resolved.sort_by(|a, b| compare_by_area_desc(a.area(), b.area(), &a.item, &b.item, rules));
    } else if !rules.is_empty() {
        resolved.sort_by(|a, b| compare_items(&a.item, &b.item, rules));
    }
    sort_groups(&mut groups, &resolved, options, rules);

    let grouped_ids: HashSet<u64> = groups
        .iter()
        .flat_map(|g| g.members.iter().copied())
        .collect();

    let mut containers: Vec<Container> = Vec::new();
    let mut placed_ids: HashSet<u64> = HashSet::new();
    let mut stuffed: Vec<StuffedItem> = Vec::new();

    // PlaceGroups
    for group in &groups {
        let mut placed_in: Option<usize> = None;
        for index in candidate_containers(&containers, options) {
            if try_place_group(&mut containers[index], group, &resolved, options, &params) {
                placed_in = Some(containers[index].id);
                break;
            }
        }
        if placed_in.is_none() {
            let mut fresh = open_container(containers.len() + 1, &params);
            if try_place_group(&mut fresh, group, &resolved, options, &params) {
                placed_in = Some(fresh.id);
                containers.push(fresh);
            }
            // Otherwise the members degrade to standalone placement.
        }
        if let Some(container_id) = placed_in {
            for member_id in &group.members {
                placed_ids.insert(*member_id);
                record_stuffed(&mut stuffed, &resolved, *member_id, container_id);
            }
        }
    }

    // PlaceStandalone
    for index in 0..resolved.len() {
        let id = resolved[index].item.id;
        if grouped_ids.contains(&id) || placed_ids.contains(&id) {
            continue;
        }
        place_one(
            &mut containers,
            &resolved,
            index,
            options,
            rules,
            &params,
            &mut placed_ids,
            &mut stuffed,
        );
    }

    // PlaceLeftoverGroupItems
    for index in 0..resolved.len() {
        let id = resolved[index].item.id;
        if placed_ids.contains(&id) {
            continue;
        }
        place_one(
            &mut containers,
            &resolved,
            index,
            options,
            rules,
            &params,
            &mut placed_ids,
            &mut stuffed,
        );
    }

    // Finalize
    let mut result = PackingResult {
        containers,
        excluded_oversized,
        stuffed_oversized: stuffed,
        unpackable,
    };
    for container in &mut result.containers {
        container.finalize(params.grid_step);
    }
    result
}

/// Orders groups by the active comparator applied to their representative.
fn sort_groups(
    groups: &mut [Group],
    resolved: &[ResolvedItem],
    options: &PackOptions,
    rules: &[SortRule],
) {
    let lookup = |id: u64| resolved.iter().find(|r| r.item.id == id);
    groups.sort_by(|ga, gb| match (lookup(ga.representative), lookup(gb.representative)) {
        (Some(a), Some(b)) => {
            if options.optimize_space {
                compare_by_area_desc(ga.total_area, gb.total_area, &a.item, &b.item, rules)
            } else {
                compare_items(&a.item, &b.item, rules)
            }
        }
        _ => Ordering::Equal,
    });
}

/// Places one resolved item and records bookkeeping.
#[allow(clippy::too_many_arguments)]
fn place_one(
    containers: &mut Vec<Container>,
    resolved: &[ResolvedItem],
    index: usize,
    options: &PackOptions,
    rules: &[SortRule],
    params: &PackerParams,
    placed_ids: &mut HashSet<u64>,
    stuffed: &mut Vec<StuffedItem>,
) {
    let item = &resolved[index];
    match place_item(containers, item, resolved, options, rules, params) {
        Some(container_id) => {
            placed_ids.insert(item.item.id);
            record_stuffed(stuffed, resolved, item.item.id, container_id);
        }
        None => {
            // Not reachable with a clamped footprint; leave the item out
            // rather than abort the run.
            eprintln!(
                "⚠️ Item {} ('{}') found no position in a fresh cube.",
                item.item.id, item.item.name
            );
        }
    }
}

/// Records an oversized item that was squeezed into a cube.
fn record_stuffed(
    stuffed: &mut Vec<StuffedItem>,
    resolved: &[ResolvedItem],
    item_id: u64,
    container_id: usize,
) {
    if let Some(r) = resolved.iter().find(|r| r.item.id == item_id) {
        if r.oversized {
            stuffed.push(StuffedItem {
                id: item_id,
                name: r.item.name.clone(),
                container_id,
            });
        }
    }
}
