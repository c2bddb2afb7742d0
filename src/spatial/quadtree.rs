//! Capacity-bounded quadtree for broad-phase viewport queries
//!
//! Nodes live in one flat `Vec` and refer to their children by index, so a
//! tree that is thrown away and rebuilt every frame reuses its buffers through
//! [`Quadtree::reset`] instead of reallocating.
//!
//! A box straddling quadrant boundaries is stored in every quadrant it
//! touches. [`Quadtree::query`] can therefore yield the same entry more than
//! once; [`Quadtree::query_unique`] removes the repeats.

use smallvec::SmallVec;

use super::rect::{Rectangle, Region};
use crate::constants::quadtree::{CAPACITY, MAX_DEPTH};

/// Child index sentinel for leaves
const LEAF: u32 = u32::MAX;

/// Inline node items before spilling to the heap
const NODE_INLINE_ITEMS: usize = 8;

/// Inline query stack before spilling to the heap
const QUERY_STACK_INLINE: usize = 32;

#[derive(Debug, Clone)]
struct Node {
    boundary: Region,
    depth: u8,
    /// Indices into `Quadtree::entries`
    items: SmallVec<[u32; NODE_INLINE_ITEMS]>,
    /// Index of the NW child; NE, SW, SE follow contiguously
    first_child: u32,
}

impl Node {
    fn new(boundary: Region, depth: u8) -> Self {
        Self {
            boundary,
            depth,
            items: SmallVec::new(),
            first_child: LEAF,
        }
    }

    #[inline]
    fn children(&self) -> Option<std::ops::Range<u32>> {
        (self.first_child != LEAF).then(|| self.first_child..self.first_child + 4)
    }
}

/// Shape statistics for debugging and metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadtreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: u8,
    /// Distinct rectangles inserted
    pub entry_count: usize,
    /// Entry references held by leaves (> entry_count when boxes straddle)
    pub stored_refs: usize,
    pub subdivisions: usize,
    /// Rectangles dropped because they lie outside the root boundary
    pub outside: usize,
}

/// Quadtree over rectangles with payload `P`
#[derive(Debug, Clone)]
pub struct Quadtree<P> {
    entries: Vec<Rectangle<P>>,
    nodes: Vec<Node>,
    capacity: usize,
    max_depth: u8,
    subdivisions: usize,
    outside: usize,
}

impl<P> Quadtree<P> {
    /// Create a tree covering `boundary` with the default depth limit.
    /// A zero capacity is treated as 1.
    pub fn new(boundary: Region, capacity: usize) -> Self {
        Self::with_max_depth(boundary, capacity, MAX_DEPTH)
    }

    pub fn with_max_depth(boundary: Region, capacity: usize, max_depth: u8) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Node::new(boundary, 0));
        Self {
            entries: Vec::new(),
            nodes,
            capacity: capacity.max(1),
            max_depth,
            subdivisions: 0,
            outside: 0,
        }
    }

    /// Drop every entry and node, keeping allocations, and start over with a new root
    pub fn reset(&mut self, boundary: Region) {
        self.entries.clear();
        self.nodes.clear();
        self.nodes.push(Node::new(boundary, 0));
        self.subdivisions = 0;
        self.outside = 0;
    }

    #[inline]
    pub fn boundary(&self) -> &Region {
        &self.nodes[0].boundary
    }

    /// Number of distinct rectangles stored
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_subdivided(&self) -> bool {
        self.nodes[0].first_child != LEAF
    }

    /// Items held directly by the root (zero once it has subdivided)
    #[inline]
    pub fn root_item_count(&self) -> usize {
        self.nodes[0].items.len()
    }

    /// Insert a rectangle. Rectangles wholly outside the root boundary can
    /// never match a query inside it and are dropped.
    pub fn insert(&mut self, rect: Rectangle<P>) {
        if !self.nodes[0].boundary.intersects(&rect) {
            self.outside += 1;
            tracing::trace!(x = rect.x(), y = rect.y(), "rectangle outside quadtree root");
            return;
        }
        let entry = self.entries.len() as u32;
        self.entries.push(rect);
        self.insert_into(0, entry);
    }

    fn insert_into(&mut self, node_idx: u32, entry: u32) {
        if let Some(children) = self.nodes[node_idx as usize].children() {
            for child in children {
                let rect = &self.entries[entry as usize];
                if self.nodes[child as usize].boundary.intersects(rect) {
                    self.insert_into(child, entry);
                }
            }
            return;
        }

        let node = &self.nodes[node_idx as usize];
        // Degenerate boundaries would split into identical children forever
        let degenerate = node.boundary.width() <= 0.0 || node.boundary.height() <= 0.0;
        let must_hold = node.items.len() < self.capacity
            || node.depth >= self.max_depth
            || degenerate
            || !self.split_separates(node, entry);
        if must_hold {
            self.nodes[node_idx as usize].items.push(entry);
            return;
        }

        self.subdivide(node_idx);
        let items = std::mem::take(&mut self.nodes[node_idx as usize].items);
        for item in items {
            self.insert_into(node_idx, item);
        }
        self.insert_into(node_idx, entry);
    }

    /// Whether splitting `node` can spread its boxes out.
    ///
    /// No when every box touches the node's centre, since each would be copied
    /// into all four children. No either when the children would be narrower
    /// and shorter than the smallest box: every box would then straddle a
    /// child edge and the copies only multiply with depth.
    fn split_separates(&self, node: &Node, entry: u32) -> bool {
        let b = &node.boundary;
        let centre = b.center();
        let centre = Region::region(centre.x, centre.y, 0.0, 0.0);
        let mut off_centre = false;
        let mut min_w = f32::INFINITY;
        let mut min_h = f32::INFINITY;
        for &idx in node.items.iter().chain(std::iter::once(&entry)) {
            let rect = &self.entries[idx as usize];
            off_centre |= !rect.contains(&centre);
            min_w = min_w.min(rect.width());
            min_h = min_h.min(rect.height());
        }
        off_centre && (b.width() * 0.5 >= min_w || b.height() * 0.5 >= min_h)
    }

    /// Split a leaf into four children that exactly tile its boundary
    fn subdivide(&mut self, node_idx: u32) {
        let (b, depth) = {
            let node = &self.nodes[node_idx as usize];
            (node.boundary, node.depth + 1)
        };
        let half_w = b.width() * 0.5;
        let half_h = b.height() * 0.5;
        let mid_x = b.x() + half_w;
        let mid_y = b.y() + half_h;
        // Far halves take the remainder so the tiling has no float gaps
        let far_w = b.width() - half_w;
        let far_h = b.height() - half_h;

        let first_child = self.nodes.len() as u32;
        self.nodes.extend([
            Node::new(Region::region(b.x(), b.y(), half_w, half_h), depth),
            Node::new(Region::region(mid_x, b.y(), far_w, half_h), depth),
            Node::new(Region::region(b.x(), mid_y, half_w, far_h), depth),
            Node::new(Region::region(mid_x, mid_y, far_w, far_h), depth),
        ]);
        self.nodes[node_idx as usize].first_child = first_child;
        self.subdivisions += 1;
    }

    /// Every stored rectangle intersecting `range`.
    ///
    /// Lazy: the tree is walked as the iterator is advanced. Straddling boxes
    /// may be yielded once per quadrant they were stored in.
    pub fn query<'a>(&'a self, range: &Region) -> impl Iterator<Item = &'a Rectangle<P>> + 'a
    where
        P: 'a,
    {
        self.query_indices(*range)
            .map(move |idx| &self.entries[idx as usize])
    }

    /// Like [`query`](Self::query) but each rectangle appears at most once,
    /// in first-visit order.
    pub fn query_unique(&self, range: &Region) -> Vec<&Rectangle<P>> {
        let mut seen = vec![false; self.entries.len()];
        self.query_indices(*range)
            .filter(|&idx| !std::mem::replace(&mut seen[idx as usize], true))
            .map(|idx| &self.entries[idx as usize])
            .collect()
    }

    fn query_indices(&self, range: Region) -> QueryIter<'_, P> {
        let mut stack = SmallVec::new();
        stack.push(0);
        QueryIter {
            tree: self,
            range,
            stack,
            current: None,
        }
    }

    pub fn stats(&self) -> QuadtreeStats {
        let mut stats = QuadtreeStats {
            node_count: self.nodes.len(),
            entry_count: self.entries.len(),
            subdivisions: self.subdivisions,
            outside: self.outside,
            ..Default::default()
        };
        for node in &self.nodes {
            stats.max_depth = stats.max_depth.max(node.depth);
            if node.first_child == LEAF {
                stats.leaf_count += 1;
                stats.stored_refs += node.items.len();
            }
        }
        stats
    }
}

impl<P> Default for Quadtree<P> {
    fn default() -> Self {
        Self::new(Region::region(0.0, 0.0, 0.0, 0.0), CAPACITY)
    }
}

/// Depth-first walk yielding entry indices
struct QueryIter<'a, P> {
    tree: &'a Quadtree<P>,
    range: Region,
    stack: SmallVec<[u32; QUERY_STACK_INLINE]>,
    /// Node whose items are being scanned, and the scan position
    current: Option<(u32, usize)>,
}

impl<'a, P> Iterator for QueryIter<'a, P> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let tree = self.tree;
        loop {
            if let Some((node_idx, cursor)) = self.current.as_mut() {
                let items = &tree.nodes[*node_idx as usize].items;
                while *cursor < items.len() {
                    let entry = items[*cursor];
                    *cursor += 1;
                    if tree.entries[entry as usize].intersects(&self.range) {
                        return Some(entry);
                    }
                }
                self.current = None;
            }

            let node_idx = self.stack.pop()?;
            let node = &tree.nodes[node_idx as usize];
            if !node.boundary.intersects(&self.range) {
                continue;
            }
            if let Some(children) = node.children() {
                // Reversed so NW is visited first
                self.stack.extend(children.rev());
            }
            self.current = Some((node_idx, 0));
        }
    }
}
