//! Data models for the cube packing engine.
//!
//! This module defines the fundamental data structures for 2D placement:
//! - `Item`: A collection entry with physical dimensions and grouping data
//! - `ResolvedItem`: An item with its derived footprints, ready for packing
//! - `PlacedItem`: An item with its position inside a cube
//! - `Container`: A fixed-size square cube with its placed items
//!
//! Items and groups exist only for the duration of one packing run;
//! containers become final once `finalize` has computed rows and stats.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{Footprint, Orientation, validation};

/// Validation error for model data.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidConfiguration(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// One unit of the collection to be packed.
///
/// Dimensions may be missing when the catalog could not resolve a version;
/// such items cannot be packed and are excluded with a warning instead of
/// failing the run.
///
/// # Fields
/// * `id` - Stable unique key of the item
/// * `dims` - Physical dimensions (length, width, depth) in inches
/// * `is_expansion` / `base_id` - Expansion link to a base item
/// * `families` - Series identifiers used for family grouping
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Option<[f64; 3]>, example = json!([11.6, 11.6, 2.8]))]
    pub dims: Option<(f64, f64, f64)>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub mechanics: Vec<String>,
    #[serde(default)]
    pub is_expansion: bool,
    #[serde(default)]
    pub base_id: Option<u64>,
    #[serde(default)]
    pub forced_orientation: Option<Orientation>,
}

impl Item {
    /// Creates a minimal item with dimensions; remaining fields stay empty.
    pub fn new(id: u64, name: impl Into<String>, dims: (f64, f64, f64)) -> Self {
        Self {
            id,
            name: name.into(),
            dims: Some(dims),
            year: None,
            rank: None,
            rating: None,
            categories: Vec::new(),
            families: Vec::new(),
            mechanics: Vec::new(),
            is_expansion: false,
            base_id: None,
            forced_orientation: None,
        }
    }
}

/// Both candidate footprints of an item plus its stacking depth.
///
/// Derived once from the physical dimensions and immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootprintSet {
    pub horizontal: Footprint,
    pub vertical: Footprint,
    /// Largest physical dimension; points into the cube and is not used
    /// for 2D placement.
    pub depth: f64,
}

impl FootprintSet {
    /// Derives the footprint set from three physical dimensions.
    ///
    /// The largest dimension becomes the stacking depth; the middle and
    /// smallest form the two footprint candidates. `horizontal` puts the
    /// longer of the two along x, `vertical` is the transpose.
    ///
    /// # Returns
    /// `Ok(FootprintSet)` for three finite positive dimensions,
    /// otherwise `Err(ValidationError)`
    pub fn from_dims(dims: (f64, f64, f64)) -> Result<Self, ValidationError> {
        validation::validate_dimensions(dims).map_err(ValidationError::InvalidDimension)?;

        let mut sorted = [dims.0, dims.1, dims.2];
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let [depth, mid, min] = sorted;

        let horizontal = Footprint::new(mid.max(min), mid.min(min));
        Ok(Self {
            horizontal,
            vertical: horizontal.transposed(),
            depth,
        })
    }

    /// Returns the footprint for the given orientation.
    #[inline]
    pub fn footprint(&self, orientation: Orientation) -> Footprint {
        match orientation {
            Orientation::Horizontal => self.horizontal,
            Orientation::Vertical => self.vertical,
        }
    }
}

/// An item whose footprints have been resolved for the current run.
#[derive(Clone, Debug)]
pub struct ResolvedItem {
    pub item: Item,
    pub footprints: FootprintSet,
    /// True if the chosen orientation exceeds the oversized threshold.
    pub oversized: bool,
}

impl ResolvedItem {
    /// Footprint area of the item (identical in both orientations).
    #[inline]
    pub fn area(&self) -> f64 {
        self.footprints.horizontal.area()
    }

    /// Returns the footprint for the given orientation.
    #[inline]
    pub fn footprint(&self, orientation: Orientation) -> Footprint {
        self.footprints.footprint(orientation)
    }
}

/// An item with its position inside a cube.
///
/// # Fields
/// * `position` - Bottom-left corner (x, y) inside the cube
/// * `packed` - Footprint clamped to the cube edge, used for all geometry
/// * `actual` - True, unclamped footprint
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacedItem {
    pub item_id: u64,
    pub name: String,
    #[schema(value_type = [f64; 2], example = json!([0.0, 6.0]))]
    pub position: (f64, f64),
    pub packed: Footprint,
    pub actual: Footprint,
    pub orientation: Orientation,
    pub oversized_x: bool,
    pub oversized_y: bool,
}

impl PlacedItem {
    /// Right edge of the packed footprint.
    #[inline]
    pub fn right(&self) -> f64 {
        self.position.0 + self.packed.x
    }

    /// Top edge of the packed footprint.
    #[inline]
    pub fn top(&self) -> f64 {
        self.position.1 + self.packed.y
    }

    /// Packed footprint area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.packed.area()
    }
}

/// A horizontal row of items sharing the same grid-rounded y coordinate.
///
/// Only computed during finalization, for downstream reporting.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Row {
    pub y: f64,
    pub item_ids: Vec<u64>,
    pub total_width: f64,
    pub max_height: f64,
}

/// Usage statistics of a finalized container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct ContainerStats {
    pub item_count: usize,
    pub area_used: f64,
    pub utilization_percent: f64,
}

/// A fixed-size square storage cube.
///
/// The occupied-area cache is kept consistent by routing every placement
/// and removal through `push_item`, `remove_item` and `clear_items`.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Container {
    pub id: usize,
    /// Edge length of the square region.
    pub size: f64,
    #[serde(rename = "items")]
    pub placed: Vec<PlacedItem>,
    #[serde(skip)]
    occupied_area: f64,
    pub rows: Vec<Row>,
    pub stats: Option<ContainerStats>,
}

impl Container {
    /// Creates a new empty cube with validation.
    ///
    /// # Parameters
    /// * `id` - Sequential container id
    /// * `size` - Edge length, must be positive and finite
    pub fn new(id: usize, size: f64) -> Result<Self, ValidationError> {
        validation::validate_dimension(size, "Container size")
            .map_err(ValidationError::InvalidDimension)?;
        Ok(Self {
            id,
            size,
            placed: Vec::new(),
            occupied_area: 0.0,
            rows: Vec::new(),
            stats: None,
        })
    }

    /// Total capacity of the square region.
    #[inline]
    pub fn capacity(&self) -> f64 {
        self.size * self.size
    }

    /// Cached sum of the packed footprint areas.
    #[inline]
    pub fn occupied_area(&self) -> f64 {
        self.occupied_area
    }

    /// Remaining free area.
    #[inline]
    pub fn remaining_area(&self) -> f64 {
        self.capacity() - self.occupied_area
    }

    /// Utilization of the cube in percent (0.0 to 100.0).
    pub fn utilization_percent(&self) -> f64 {
        let total = self.capacity();
        if total <= 0.0 {
            return 0.0;
        }
        (self.occupied_area / total) * 100.0
    }

    /// Appends a placed item and updates the occupied-area cache.
    pub fn push_item(&mut self, item: PlacedItem) {
        self.occupied_area += item.area();
        self.placed.push(item);
    }

    /// Removes the item at the given index and updates the cache.
    pub fn remove_item(&mut self, index: usize) -> PlacedItem {
        let item = self.placed.remove(index);
        self.occupied_area -= item.area();
        item
    }

    /// Re-inserts an item at a specific index and updates the cache.
    ///
    /// Used to restore a previously removed item at its original list
    /// position when a repositioning attempt is rolled back.
    pub fn insert_item(&mut self, index: usize, item: PlacedItem) {
        self.occupied_area += item.area();
        self.placed.insert(index, item);
    }

    /// Removes all items and resets the cache.
    pub fn clear_items(&mut self) {
        self.placed.clear();
        self.occupied_area = 0.0;
    }

    /// Replaces the full item list and rebuilds the cache.
    pub fn set_items(&mut self, items: Vec<PlacedItem>) {
        self.placed = items;
        self.occupied_area = self.placed.iter().map(PlacedItem::area).sum();
    }

    /// Recomputes the occupied area from scratch.
    ///
    /// Used by tests to verify cache consistency.
    pub fn recomputed_occupied_area(&self) -> f64 {
        self.placed.iter().map(PlacedItem::area).sum()
    }

    /// Derives rows and usage statistics; the cube is final afterwards.
    ///
    /// Items sharing a grid-rounded y coordinate form one row; each row
    /// carries its total width and maximum height.
    pub fn finalize(&mut self, grid_step: f64) {
        let mut rows: Vec<Row> = Vec::new();
        for item in &self.placed {
            let y = crate::geometry::round_to_grid(item.position.1, grid_step);
            match rows
                .iter_mut()
                .find(|row| (row.y - y).abs() < grid_step / 2.0)
            {
                Some(row) => {
                    row.item_ids.push(item.item_id);
                    row.total_width += item.packed.x;
                    row.max_height = row.max_height.max(item.packed.y);
                }
                None => rows.push(Row {
                    y,
                    item_ids: vec![item.item_id],
                    total_width: item.packed.x,
                    max_height: item.packed.y,
                }),
            }
        }
        rows.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal));

        self.rows = rows;
        self.stats = Some(ContainerStats {
            item_count: self.placed.len(),
            area_used: self.occupied_area,
            utilization_percent: self.utilization_percent(),
        });
    }
}

/// A set of items the engine tries to keep in one cube.
///
/// Ephemeral: computed fresh per packing run, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// Base item for expansion groups, first member otherwise.
    pub representative: u64,
    pub members: Vec<u64>,
    pub total_area: f64,
}

impl Group {
    /// Number of members in the group.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Checks if the given item belongs to this group.
    #[inline]
    pub fn contains(&self, item_id: u64) -> bool {
        self.members.contains(&item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(id: u64, x: f64, y: f64, w: f64, h: f64) -> PlacedItem {
        PlacedItem {
            item_id: id,
            name: format!("item-{}", id),
            position: (x, y),
            packed: Footprint::new(w, h),
            actual: Footprint::new(w, h),
            orientation: Orientation::Horizontal,
            oversized_x: false,
            oversized_y: false,
        }
    }

    #[test]
    fn footprint_set_sorts_dimensions() {
        let set = FootprintSet::from_dims((2.8, 11.6, 10.2)).unwrap();
        assert!((set.depth - 11.6).abs() < 1e-9);
        assert_eq!(set.horizontal, Footprint::new(10.2, 2.8));
        assert_eq!(set.vertical, Footprint::new(2.8, 10.2));
    }

    #[test]
    fn footprint_set_rejects_invalid_dims() {
        assert!(FootprintSet::from_dims((0.0, 1.0, 1.0)).is_err());
        assert!(FootprintSet::from_dims((1.0, -2.0, 1.0)).is_err());
        assert!(FootprintSet::from_dims((1.0, 2.0, f64::NAN)).is_err());
        assert!(FootprintSet::from_dims((1.0, 2.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn container_cache_tracks_push_and_remove() {
        let mut cont = Container::new(1, 12.8).unwrap();
        cont.push_item(placed(1, 0.0, 0.0, 6.0, 6.0));
        cont.push_item(placed(2, 6.0, 0.0, 4.0, 3.0));
        assert!((cont.occupied_area() - 48.0).abs() < 1e-9);

        let removed = cont.remove_item(0);
        assert_eq!(removed.item_id, 1);
        assert!((cont.occupied_area() - 12.0).abs() < 1e-9);
        assert!((cont.occupied_area() - cont.recomputed_occupied_area()).abs() < 1e-9);

        cont.clear_items();
        assert_eq!(cont.occupied_area(), 0.0);
    }

    #[test]
    fn container_rejects_invalid_size() {
        assert!(Container::new(1, 0.0).is_err());
        assert!(Container::new(1, -5.0).is_err());
        assert!(Container::new(1, f64::NAN).is_err());
    }

    #[test]
    fn finalize_builds_rows_by_rounded_y() {
        let mut cont = Container::new(1, 12.8).unwrap();
        cont.push_item(placed(1, 0.0, 0.0, 6.0, 3.0));
        cont.push_item(placed(2, 6.0, 0.0, 4.0, 2.0));
        cont.push_item(placed(3, 0.0, 3.0, 5.0, 2.0));
        cont.finalize(0.1);

        assert_eq!(cont.rows.len(), 2);
        let floor = &cont.rows[0];
        assert_eq!(floor.item_ids, vec![1, 2]);
        assert!((floor.total_width - 10.0).abs() < 1e-9);
        assert!((floor.max_height - 3.0).abs() < 1e-9);
        let upper = &cont.rows[1];
        assert_eq!(upper.item_ids, vec![3]);

        let stats = cont.stats.expect("stats missing after finalize");
        assert_eq!(stats.item_count, 3);
        assert!((stats.area_used - 36.0).abs() < 1e-9);
    }

    #[test]
    fn utilization_percent_matches_occupied_share() {
        let mut cont = Container::new(1, 12.8).unwrap();
        cont.push_item(placed(1, 0.0, 0.0, 6.0, 6.0));
        let expected = 36.0 / (12.8 * 12.8) * 100.0;
        assert!((cont.utilization_percent() - expected).abs() < 1e-9);
    }
}
