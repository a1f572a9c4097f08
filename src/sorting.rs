//! Ordering logic for items.
//!
//! Two comparators drive every placement decision: the multi-key rule
//! comparator configured by the caller, and an area-descending comparator
//! used whenever space optimization is requested.

use std::cmp::Ordering;

use crate::model::Item;
use crate::types::{EPSILON_AREA, SortDirection, SortField, SortRule};

/// Compares two items by an ordered list of sort rules.
///
/// Rules are evaluated in order; the first non-equal field decides, with
/// the rule's direction applied as a sign. Missing numeric values and
/// empty list fields always sort last, regardless of direction.
///
/// # Parameters
/// * `a`, `b` - The items to compare
/// * `rules` - Ordered list of sort rules
pub fn compare_items(a: &Item, b: &Item, rules: &[SortRule]) -> Ordering {
    for rule in rules {
        let ordering = compare_field(a, b, rule.field, rule.direction);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Compares two items by footprint area, largest first.
///
/// Ties are broken by the configured sort rules; pure space optimization
/// passes an empty rule list and leaves ties unordered.
///
/// # Parameters
/// * `area_a`, `area_b` - Precomputed footprint areas of the two items
/// * `a`, `b` - The items, used only for tiebreaking
/// * `rules` - Tiebreak rules (may be empty)
pub fn compare_by_area_desc(
    area_a: f64,
    area_b: f64,
    a: &Item,
    b: &Item,
    rules: &[SortRule],
) -> Ordering {
    if (area_a - area_b).abs() > EPSILON_AREA {
        return area_b.partial_cmp(&area_a).unwrap_or(Ordering::Equal);
    }
    compare_items(a, b, rules)
}

/// Compares a single field of two items.
fn compare_field(a: &Item, b: &Item, field: SortField, direction: SortDirection) -> Ordering {
    match field {
        SortField::Name => {
            direction.apply(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        SortField::Year => compare_optional(a.year, b.year, direction),
        SortField::Rank => compare_optional(a.rank, b.rank, direction),
        SortField::Rating => compare_optional_f64(a.rating, b.rating, direction),
        SortField::Category => compare_first_entry(&a.categories, &b.categories, direction),
        SortField::Family => compare_first_entry(&a.families, &b.families, direction),
        SortField::Mechanic => compare_first_entry(&a.mechanics, &b.mechanics, direction),
    }
}

/// Compares two optional values; missing values sort last.
fn compare_optional<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(va), Some(vb)) => direction.apply(va.cmp(&vb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares two optional floats; missing or non-finite values sort last.
fn compare_optional_f64(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(va), Some(vb)) => {
            direction.apply(va.partial_cmp(&vb).unwrap_or(Ordering::Equal))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares the first entries of two list fields; empty lists sort last.
fn compare_first_entry(a: &[String], b: &[String], direction: SortDirection) -> Ordering {
    match (a.first(), b.first()) {
        (Some(va), Some(vb)) => {
            direction.apply(va.to_lowercase().cmp(&vb.to_lowercase()))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn item(id: u64, name: &str) -> Item {
        Item::new(id, name, (10.0, 10.0, 2.0))
    }

    #[test]
    fn name_comparison_is_case_insensitive() {
        let a = item(1, "azul");
        let b = item(2, "Brass");
        let rules = [SortRule::new(SortField::Name, SortDirection::Ascending)];
        assert_eq!(compare_items(&a, &b, &rules), Ordering::Less);

        let desc = [SortRule::new(SortField::Name, SortDirection::Descending)];
        assert_eq!(compare_items(&a, &b, &desc), Ordering::Greater);
    }

    #[test]
    fn first_rule_wins_then_falls_through() {
        let mut a = item(1, "Same");
        let mut b = item(2, "Same");
        a.year = Some(2015);
        b.year = Some(2018);
        let rules = [
            SortRule::new(SortField::Name, SortDirection::Ascending),
            SortRule::new(SortField::Year, SortDirection::Ascending),
        ];
        assert_eq!(compare_items(&a, &b, &rules), Ordering::Less);
    }

    #[test]
    fn missing_numerics_sort_last_in_both_directions() {
        let mut a = item(1, "A");
        let b = item(2, "B");
        a.rank = Some(10);

        let asc = [SortRule::new(SortField::Rank, SortDirection::Ascending)];
        let desc = [SortRule::new(SortField::Rank, SortDirection::Descending)];
        assert_eq!(compare_items(&a, &b, &asc), Ordering::Less);
        assert_eq!(compare_items(&a, &b, &desc), Ordering::Less);
    }

    #[test]
    fn list_fields_compare_first_entry() {
        let mut a = item(1, "A");
        let mut b = item(2, "B");
        a.categories = vec!["Economic".to_string(), "Trains".to_string()];
        b.categories = vec!["abstract".to_string()];
        let rules = [SortRule::new(SortField::Category, SortDirection::Ascending)];
        assert_eq!(compare_items(&a, &b, &rules), Ordering::Greater);

        b.categories.clear();
        assert_eq!(compare_items(&a, &b, &rules), Ordering::Less);
    }

    #[test]
    fn empty_rules_leave_items_equal() {
        let a = item(1, "A");
        let b = item(2, "B");
        assert_eq!(compare_items(&a, &b, &[]), Ordering::Equal);
    }

    #[test]
    fn area_desc_orders_largest_first() {
        let a = item(1, "A");
        let b = item(2, "B");
        assert_eq!(compare_by_area_desc(36.0, 100.0, &a, &b, &[]), Ordering::Greater);
        assert_eq!(compare_by_area_desc(100.0, 36.0, &a, &b, &[]), Ordering::Less);
    }

    #[test]
    fn area_desc_breaks_ties_with_rules() {
        let a = item(1, "Beta");
        let b = item(2, "Alpha");
        let rules = [SortRule::new(SortField::Name, SortDirection::Ascending)];
        assert_eq!(compare_by_area_desc(50.0, 50.0, &a, &b, &rules), Ordering::Greater);
        assert_eq!(compare_by_area_desc(50.0, 50.0, &a, &b, &[]), Ordering::Equal);
    }
}
