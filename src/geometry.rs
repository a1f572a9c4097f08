//! Geometric primitives for 2D collision detection and position search.
//!
//! All coordinates are quantized to a fixed grid so that floating-point
//! comparisons stay well-defined: a half-step epsilon is used everywhere
//! two coordinates are compared.

use crate::model::PlacedItem;

/// Snaps a value to the placement grid.
///
/// # Parameters
/// * `v` - The value to snap
/// * `step` - Grid step size
///
/// # Returns
/// The nearest multiple of `step`
#[inline]
pub fn round_to_grid(v: f64, step: f64) -> f64 {
    (v / step).round() * step
}

/// Checks if a candidate rectangle intersects any placed item.
///
/// Uses Axis-Aligned Bounding Box (AABB) collision detection: two
/// rectangles do NOT intersect if they are separated in at least one axis.
/// Touching edges within the grid epsilon do not count as a collision.
///
/// # Parameters
/// * `x`, `y` - Bottom-left corner of the candidate rectangle
/// * `w`, `h` - Extents of the candidate rectangle
/// * `placed` - Items already placed in the container
/// * `step` - Grid step size (epsilon is half a step)
///
/// # Returns
/// `true` if the candidate overlaps any placed item
pub fn collides(x: f64, y: f64, w: f64, h: f64, placed: &[PlacedItem], step: f64) -> bool {
    let eps = step * 0.5;
    placed.iter().any(|p| {
        !(x + w <= p.position.0 + eps
            || p.right() <= x + eps
            || y + h <= p.position.1 + eps
            || p.top() <= y + eps)
    })
}

/// Checks if a candidate rectangle is fully supported from below.
///
/// Positions on the floor (`y` below one grid step) are always supported.
/// Above the floor, every grid sample across `[x, x + w)` must rest on some
/// placed item whose top edge equals `y` within epsilon and whose x-range
/// covers the sample.
///
/// # Parameters
/// * `x`, `y` - Bottom-left corner of the candidate rectangle
/// * `w` - Width of the candidate rectangle
/// * `placed` - Items already placed in the container
/// * `step` - Grid step size
///
/// # Returns
/// `true` if every sample under the candidate has a supporter
pub fn has_full_support(x: f64, y: f64, w: f64, placed: &[PlacedItem], step: f64) -> bool {
    let eps = step * 0.5;
    if y < step {
        return true;
    }

    let mut sample = round_to_grid(x, step);
    loop {
        let supported = placed.iter().any(|p| {
            (p.top() - y).abs() <= eps
                && sample >= p.position.0 - eps
                && sample < p.right() - eps
        });
        if !supported {
            return false;
        }

        sample = round_to_grid(sample + step, step);
        if sample >= x + w - eps {
            return true;
        }
    }
}

/// Finds the first free, supported position for a rectangle.
///
/// Bottom-left fill: scans `y` from 0 upward and, per level, `x` from 0
/// rightward in grid steps, returning the first position that passes both
/// the collision and the full-support test (lowest, then leftmost). Cost
/// is bounded by `(size / step)²` per call.
///
/// # Parameters
/// * `size` - Edge length of the square container
/// * `w`, `h` - Extents of the rectangle (already clamped to `size`)
/// * `placed` - Items already placed in the container
/// * `step` - Grid step size
///
/// # Returns
/// `Some((x, y))` for the first valid position, `None` if the scan
/// exhausts without success
pub fn find_position(
    size: f64,
    w: f64,
    h: f64,
    placed: &[PlacedItem],
    step: f64,
) -> Option<(f64, f64)> {
    let eps = step * 0.5;
    if w > size + eps || h > size + eps {
        return None;
    }

    let y_steps = ((size - h + eps) / step).floor() as usize;
    let x_steps = ((size - w + eps) / step).floor() as usize;

    for yi in 0..=y_steps {
        let y = yi as f64 * step;
        for xi in 0..=x_steps {
            let x = xi as f64 * step;
            if !collides(x, y, w, h, placed, step) && has_full_support(x, y, w, placed, step) {
                return Some((x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Footprint, Orientation};

    const STEP: f64 = 0.1;

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
    fn round_to_grid_snaps_to_tenths() {
        assert!((round_to_grid(3.04, STEP) - 3.0).abs() < 1e-9);
        assert!((round_to_grid(3.06, STEP) - 3.1).abs() < 1e-9);
        assert!((round_to_grid(0.0, STEP) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn collides_detects_overlap_but_not_touching_edges() {
        let items = vec![placed(1, 0.0, 0.0, 6.0, 6.0)];
        assert!(collides(5.0, 0.0, 6.0, 6.0, &items, STEP));
        assert!(collides(0.0, 5.9, 6.0, 6.0, &items, STEP));
        // Sharing an edge is not a collision.
        assert!(!collides(6.0, 0.0, 6.0, 6.0, &items, STEP));
        assert!(!collides(0.0, 6.0, 6.0, 6.0, &items, STEP));
        assert!(!collides(7.0, 7.0, 2.0, 2.0, &items, STEP));
    }

    #[test]
    fn floor_positions_are_always_supported() {
        assert!(has_full_support(3.0, 0.0, 5.0, &[], STEP));
        assert!(has_full_support(3.0, 0.05, 5.0, &[], STEP));
    }

    #[test]
    fn full_support_requires_every_sample_covered() {
        let items = vec![placed(1, 0.0, 0.0, 10.0, 3.0)];
        // Fully on top of the supporter.
        assert!(has_full_support(0.0, 3.0, 10.0, &items, STEP));
        assert!(has_full_support(2.0, 3.0, 5.0, &items, STEP));
        // Overhanging the right edge of the supporter.
        assert!(!has_full_support(8.0, 3.0, 4.0, &items, STEP));
        // Wrong level: nothing tops out at y = 2.0.
        assert!(!has_full_support(0.0, 2.0, 5.0, &items, STEP));
    }

    #[test]
    fn full_support_accepts_multiple_supporters() {
        let items = vec![
            placed(1, 0.0, 0.0, 4.0, 3.0),
            placed(2, 4.0, 0.0, 4.0, 3.0),
        ];
        assert!(has_full_support(1.0, 3.0, 6.0, &items, STEP));
        // A gap between supporters breaks the chain.
        let gapped = vec![
            placed(1, 0.0, 0.0, 3.0, 3.0),
            placed(2, 5.0, 0.0, 3.0, 3.0),
        ];
        assert!(!has_full_support(1.0, 3.0, 6.0, &gapped, STEP));
    }

    #[test]
    fn find_position_fills_bottom_left_first() {
        assert_eq!(find_position(12.8, 6.0, 6.0, &[], STEP), Some((0.0, 0.0)));

        let items = vec![placed(1, 0.0, 0.0, 6.0, 6.0)];
        assert_eq!(find_position(12.8, 6.0, 6.0, &items, STEP), Some((6.0, 0.0)));
    }

    #[test]
    fn find_position_prefers_floor_over_stacking() {
        // A 9x3 item sits at the origin; a 3x10 item must land beside it
        // at the floor, not partially supported on top of it.
        let items = vec![placed(1, 0.0, 0.0, 9.0, 3.0)];
        assert_eq!(
            find_position(12.8, 3.0, 10.0, &items, STEP),
            Some((9.0, 0.0))
        );
    }

    #[test]
    fn find_position_stacks_when_floor_is_full() {
        let items = vec![
            placed(1, 0.0, 0.0, 6.4, 3.0),
            placed(2, 6.4, 0.0, 6.4, 3.0),
        ];
        // Floor is fully occupied, so the next level starts at y = 3.0.
        assert_eq!(find_position(12.8, 6.0, 3.0, &items, STEP), Some((0.0, 3.0)));
    }

    #[test]
    fn find_position_returns_none_when_nothing_fits() {
        let items = vec![placed(1, 0.0, 0.0, 12.8, 12.0)];
        assert_eq!(find_position(12.8, 5.0, 5.0, &items, STEP), None);
        // Larger than the container in one axis.
        assert_eq!(find_position(12.8, 13.0, 2.0, &[], STEP), None);
    }
}
