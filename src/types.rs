//! Common types for 2D footprint geometry and sort rules.
//!
//! This module defines the reusable primitives shared by the placement
//! engine: footprints, orientations, ordering rules and validation helpers.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for area comparisons.
///
/// Used for capacity checks that are independent of the placement grid.
pub const EPSILON_AREA: f64 = 1e-6;

/// Global numerical tolerance for length comparisons.
///
/// Used where a single extent is checked against a threshold that is not
/// tied to the placement grid, such as the oversized limit.
pub const EPSILON_LENGTH: f64 = 1e-6;

/// Represents the 2D extents of an item in a given orientation.
///
/// `x` is the horizontal extent, `y` the vertical extent on the cube's
/// front face. The stacking depth of an item is tracked separately.
///
/// # Examples
/// ```
/// use cubefit::types::Footprint;
///
/// let fp = Footprint::new(10.0, 3.0);
/// assert_eq!(fp.area(), 30.0);
/// assert_eq!(fp.transposed(), Footprint::new(3.0, 10.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Footprint {
    pub x: f64,
    pub y: f64,
}

impl Footprint {
    /// Creates a new footprint.
    ///
    /// # Parameters
    /// * `x` - Horizontal extent
    /// * `y` - Vertical extent
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the occupied area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.x * self.y
    }

    /// Returns the footprint with both axes swapped.
    #[inline]
    pub const fn transposed(&self) -> Self {
        Self::new(self.y, self.x)
    }

    /// Checks if both extents are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.x.is_finite() && self.y.is_finite()
    }

    /// Checks if the footprint fits within a square of the given edge length.
    ///
    /// # Parameters
    /// * `edge` - Edge length of the square region
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, edge: f64, tolerance: f64) -> bool {
        self.x <= edge + tolerance && self.y <= edge + tolerance
    }

    /// Returns the footprint clamped to a square of the given edge length.
    #[inline]
    pub fn clamped_to(&self, edge: f64) -> Self {
        Self::new(self.x.min(edge), self.y.min(edge))
    }
}

/// Orientation of an item on the cube's front face.
///
/// `Horizontal` lays the longer footprint axis along x, `Vertical` along y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Returns the opposite orientation.
    #[inline]
    pub const fn flipped(&self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Direction of a sort rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Applies the direction to an already computed ordering.
    #[inline]
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Sortable item fields.
///
/// A closed set instead of free-form field names: unrecognized keys are
/// ignored by `from_key` rather than resolved reflectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Year,
    Rank,
    Rating,
    Category,
    Family,
    Mechanic,
}

impl SortField {
    /// Resolves a textual field key to a sort field.
    ///
    /// # Returns
    /// `Some(SortField)` for supported keys, `None` for unrecognized ones
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => Some(SortField::Name),
            "year" | "yearpublished" => Some(SortField::Year),
            "rank" => Some(SortField::Rank),
            "rating" | "average" => Some(SortField::Rating),
            "category" => Some(SortField::Category),
            "family" => Some(SortField::Family),
            "mechanic" => Some(SortField::Mechanic),
            _ => None,
        }
    }
}

/// A single ordering rule applied by the multi-key comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortRule {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortRule {
    /// Creates a new sort rule.
    #[inline]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Validation functions shared by the data model.
pub mod validation {

    /// Validates a single physical dimension.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the dimension for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates all three physical dimensions of an item.
    ///
    /// # Parameters
    /// * `dims` - The dimensions to validate (length, width, depth)
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimensions(dims: (f64, f64, f64)) -> Result<(), String> {
        validate_dimension(dims.0, "Length")?;
        validate_dimension(dims.1, "Width")?;
        validate_dimension(dims.2, "Depth")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_area_and_transpose() {
        let fp = Footprint::new(10.0, 3.0);
        assert!((fp.area() - 30.0).abs() < EPSILON_AREA);
        assert_eq!(fp.transposed(), Footprint::new(3.0, 10.0));
        assert_eq!(fp.transposed().transposed(), fp);
    }

    #[test]
    fn test_footprint_fits_within() {
        let fp = Footprint::new(12.8, 6.0);
        assert!(fp.fits_within(12.8, 0.05));
        assert!(!Footprint::new(13.0, 6.0).fits_within(12.8, 0.05));
    }

    #[test]
    fn test_footprint_clamped_to() {
        let fp = Footprint::new(14.0, 6.0);
        assert_eq!(fp.clamped_to(12.8), Footprint::new(12.8, 6.0));
        assert_eq!(
            Footprint::new(5.0, 5.0).clamped_to(12.8),
            Footprint::new(5.0, 5.0)
        );
    }

    #[test]
    fn test_footprint_validity() {
        assert!(Footprint::new(1.0, 2.0).is_valid_dimension());
        assert!(!Footprint::new(0.0, 2.0).is_valid_dimension());
        assert!(!Footprint::new(f64::NAN, 2.0).is_valid_dimension());
        assert!(!Footprint::new(1.0, f64::INFINITY).is_valid_dimension());
    }

    #[test]
    fn test_orientation_flipped() {
        assert_eq!(Orientation::Horizontal.flipped(), Orientation::Vertical);
        assert_eq!(Orientation::Vertical.flipped(), Orientation::Horizontal);
    }

    #[test]
    fn test_sort_direction_apply() {
        assert_eq!(
            SortDirection::Ascending.apply(Ordering::Less),
            Ordering::Less
        );
        assert_eq!(
            SortDirection::Descending.apply(Ordering::Less),
            Ordering::Greater
        );
        assert_eq!(
            SortDirection::Descending.apply(Ordering::Equal),
            Ordering::Equal
        );
    }

    #[test]
    fn test_sort_field_from_key() {
        assert_eq!(SortField::from_key("name"), Some(SortField::Name));
        assert_eq!(SortField::from_key(" Rank "), Some(SortField::Rank));
        assert_eq!(SortField::from_key("yearpublished"), Some(SortField::Year));
        assert_eq!(SortField::from_key("unknown_field"), None);
    }

    #[test]
    fn test_validation_dimensions() {
        assert!(validation::validate_dimensions((10.0, 5.0, 2.0)).is_ok());
        assert!(validation::validate_dimensions((0.0, 5.0, 2.0)).is_err());
        assert!(validation::validate_dimensions((10.0, -1.0, 2.0)).is_err());
        assert!(validation::validate_dimensions((10.0, 5.0, f64::NAN)).is_err());
    }
}
