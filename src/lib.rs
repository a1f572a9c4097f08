//! cubefit packs tabletop-game collections into fixed-size square storage
//! cubes.
//!
//! Every item is reduced to a 2D footprint on the cube's front face and
//! placed bottom-left-first under collision and full-support constraints.
//! Expansions and series can be kept together, oversized items are
//! excluded or squeezed in on request, and the whole run is deterministic:
//! identical inputs always produce identical layouts.
//!
//! # Example
//! ```
//! use cubefit::{Item, PackOptions, PackerParams, pack_items};
//!
//! let items = vec![
//!     Item::new(1, "Brass: Birmingham", (12.0, 9.0, 3.0)),
//!     Item::new(2, "Cascadia", (8.4, 6.0, 2.0)),
//! ];
//! let result = pack_items(items, &PackOptions::default(), &[], &PackerParams::default());
//! assert_eq!(result.container_count(), 1);
//! assert!(result.is_complete());
//! ```

pub mod config;
pub mod geometry;
pub mod grouping;
pub mod model;
pub mod optimizer;
pub mod sorting;
pub mod types;

pub use config::EngineConfig;
pub use model::{Container, ContainerStats, Group, Item, PlacedItem, Row, ValidationError};
pub use optimizer::{
    ExcludedItem, PackOptions, PackerParams, PackingResult, StuffedItem, UnpackableItem,
    pack_items,
};
pub use types::{Footprint, Orientation, SortDirection, SortField, SortRule};
