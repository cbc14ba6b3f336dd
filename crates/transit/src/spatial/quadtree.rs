//! Quadrant tree over a fixed bounding region.
//!
//! Nodes live in an arena and refer to their children by index, so splitting
//! a node never moves or re-borrows stored points. Points are kept in a flat
//! entry list; nodes only hold entry indices.
//!
//! Coordinates are generic `(x, y)`. The stop network uses x = latitude and
//! y = longitude.

/// Depth at which a leaf stops splitting and accepts overflow.
///
/// Without it, more than `capacity` identical points would subdivide forever.
pub const MAX_DEPTH: u8 = 24;

/// Axis-aligned rectangle given by its center and half extents.
///
/// Covers `[x - hw, x + hw] × [y - hh, y + hh]`, edges included.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub hw: f64,
    pub hh: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, hw: f64, hh: f64) -> Self {
        Self { x, y, hw, hh }
    }

    /// Square range of half-size `margin` around a point
    pub fn around(x: f64, y: f64, margin: f64) -> Self {
        Self::new(x, y, margin, margin)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x - self.hw
            && x <= self.x + self.hw
            && y >= self.y - self.hh
            && y <= self.y + self.hh
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.x - other.hw >= self.x - self.hw
            && other.x + other.hw <= self.x + self.hw
            && other.y - other.hh >= self.y - self.hh
            && other.y + other.hh <= self.y + self.hh
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(other.x - other.hw > self.x + self.hw
            || other.x + other.hw < self.x - self.hw
            || other.y - other.hh > self.y + self.hh
            || other.y + other.hh < self.y - self.hh)
    }

    /// The four equal quadrants, split at the center: NW, NE, SW, SE
    fn quadrants(&self) -> [Rectangle; 4] {
        let hw = self.hw / 2.0;
        let hh = self.hh / 2.0;
        [
            Rectangle::new(self.x - hw, self.y + hh, hw, hh),
            Rectangle::new(self.x + hw, self.y + hh, hw, hh),
            Rectangle::new(self.x - hw, self.y - hh, hw, hh),
            Rectangle::new(self.x + hw, self.y - hh, hw, hh),
        ]
    }

    /// Index into [`Rectangle::quadrants`] for a point inside this rectangle.
    ///
    /// Decided against the center rather than by re-testing child bounds so a
    /// point on a split line, or one lost to rounding, still has exactly one home.
    fn quadrant_of(&self, x: f64, y: f64) -> usize {
        match (x <= self.x, y >= self.y) {
            (true, true) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        }
    }
}

#[derive(Debug)]
struct Entry<T> {
    x: f64,
    y: f64,
    payload: T,
}

#[derive(Debug)]
struct QuadNode {
    boundary: Rectangle,
    depth: u8,
    /// Entry indices held directly; always empty once the node has split
    points: Vec<usize>,
    children: Option<[usize; 4]>,
}

impl QuadNode {
    fn new(boundary: Rectangle, depth: u8) -> Self {
        Self {
            boundary,
            depth,
            points: Vec::new(),
            children: None,
        }
    }
}

/// Point quadtree with lazily created children.
///
/// There is no deletion: a tree is built once per stop load and replaced
/// wholesale on the next one.
#[derive(Debug)]
pub struct QuadTree<T> {
    capacity: usize,
    nodes: Vec<QuadNode>,
    entries: Vec<Entry<T>>,
}

impl<T> QuadTree<T> {
    /// Create an empty tree covering `boundary`. A capacity of zero is raised to one.
    pub fn new(boundary: Rectangle, capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            nodes: vec![QuadNode::new(boundary, 0)],
            entries: Vec::new(),
        }
    }

    pub fn boundary(&self) -> Rectangle {
        self.nodes[0].boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored points
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes in the arena, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a point. Returns `false` and stores nothing when the point lies
    /// outside the root region.
    pub fn insert(&mut self, x: f64, y: f64, payload: T) -> bool {
        if !self.nodes[0].boundary.contains(x, y) {
            tracing::trace!(x, y, "point outside quadtree boundary dropped");
            return false;
        }

        let entry = self.entries.len();
        self.entries.push(Entry { x, y, payload });
        self.place(0, entry);
        true
    }

    /// Walk down from `node` to the leaf owning `entry` and store it there,
    /// splitting full leaves on the way.
    fn place(&mut self, mut node: usize, entry: usize) {
        let (x, y) = (self.entries[entry].x, self.entries[entry].y);

        loop {
            if let Some(children) = self.nodes[node].children {
                node = children[self.nodes[node].boundary.quadrant_of(x, y)];
                continue;
            }

            let leaf = &mut self.nodes[node];
            if leaf.points.len() < self.capacity || leaf.depth >= MAX_DEPTH {
                leaf.points.push(entry);
                return;
            }

            self.subdivide(node);
        }
    }

    /// Split a full leaf into four children and push its points down.
    fn subdivide(&mut self, node: usize) {
        let boundary = self.nodes[node].boundary;
        let depth = self.nodes[node].depth + 1;

        let first = self.nodes.len();
        for quadrant in boundary.quadrants() {
            self.nodes.push(QuadNode::new(quadrant, depth));
        }
        let children = [first, first + 1, first + 2, first + 3];

        let held = std::mem::take(&mut self.nodes[node].points);
        self.nodes[node].children = Some(children);

        for entry in held {
            self.place(node, entry);
        }
    }

    /// All payloads whose point lies inside `range`, in no particular order
    pub fn query(&self, range: &Rectangle) -> Vec<&T> {
        let mut found = Vec::new();
        let mut stack = vec![0];

        while let Some(node) = stack.pop() {
            let node = &self.nodes[node];
            if !node.boundary.intersects(range) {
                continue;
            }

            found.extend(
                node.points
                    .iter()
                    .map(|&i| &self.entries[i])
                    .filter(|e| range.contains(e.x, e.y))
                    .map(|e| &e.payload),
            );

            if let Some(children) = node.children {
                stack.extend(children);
            }
        }

        found
    }
}
