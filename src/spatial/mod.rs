//! Broad-phase spatial index used by the render pass

pub mod quadtree;
pub mod rect;

pub use quadtree::{Quadtree, QuadtreeStats};
pub use rect::{Rectangle, Region};
