//! Axis-aligned rectangle geometry
//!
//! All coordinates are integer pixels with y growing downward. A `Rect`
//! carries both its current bounds and the bounds it had at the start of the
//! frame; collision decisions compare the two to infer where something came
//! from.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// How a rectangle relates to moving window edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizePolicy {
    /// Pushed by (and pushes back on) every window edge
    #[default]
    Move,
    /// Ignored by window edges entirely
    Stay,
    /// Only interacts with the West/East edges
    PreventX,
    /// Only interacts with the North/South edges
    PreventY,
}

/// One of the four window edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    North,
    South,
    West,
    East,
}

impl Edge {
    /// Resolution order used by the simulator
    pub const ALL: [Edge; 4] = [Edge::North, Edge::South, Edge::West, Edge::East];

    pub fn opposite(self) -> Edge {
        match self {
            Edge::North => Edge::South,
            Edge::South => Edge::North,
            Edge::West => Edge::East,
            Edge::East => Edge::West,
        }
    }

    /// True for West/East, whose motion is along X
    #[inline]
    pub fn moves_along_x(self) -> bool {
        matches!(self, Edge::West | Edge::East)
    }
}

/// A half-open interval `[lo, hi)` along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub lo: i32,
    pub hi: i32,
}

impl Span {
    /// Strict overlap: touching intervals do not overlap, empty ones never do
    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.lo < self.hi && other.lo < other.hi && self.lo < other.hi && other.lo < self.hi
    }

    /// Twice the midpoint, kept integral
    #[inline]
    pub fn doubled_center(&self) -> i32 {
        self.lo + self.hi
    }
}

/// Plain position and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn span_x(&self) -> Span {
        Span {
            lo: self.x,
            hi: self.right(),
        }
    }

    #[inline]
    pub fn span_y(&self) -> Span {
        Span {
            lo: self.y,
            hi: self.bottom(),
        }
    }

    #[inline]
    pub fn overlaps_x(&self, other: &Bounds) -> bool {
        self.span_x().overlaps(&other.span_x())
    }

    #[inline]
    pub fn overlaps_y(&self, other: &Bounds) -> bool {
        self.span_y().overlaps(&other.span_y())
    }

    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    pub fn translated(&self, delta: IVec2) -> Bounds {
        Bounds {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..*self
        }
    }
}

/// Layout rule keeping an attached zone glued to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttachLayout {
    /// Owner edge the zone sits outside of; `None` places it at the owner's origin
    pub anchor: Option<Edge>,
    /// Copy the owner's width
    pub mirror_width: bool,
    /// Copy the owner's height
    pub mirror_height: bool,
    /// Extra pixel offset applied after anchoring
    pub offset: IVec2,
}

impl AttachLayout {
    /// A zone sitting on top of its owner, as wide as the owner
    pub fn on_top() -> Self {
        Self {
            anchor: Some(Edge::North),
            mirror_width: true,
            ..Default::default()
        }
    }

    /// Where the attached zone goes given its owner and its own current size
    pub fn place(&self, owner: Bounds, zone: Bounds) -> Bounds {
        let width = if self.mirror_width { owner.width } else { zone.width };
        let height = if self.mirror_height {
            owner.height
        } else {
            zone.height
        };

        let (x, y) = match self.anchor {
            Some(Edge::North) => (owner.x, owner.y - height),
            Some(Edge::South) => (owner.x, owner.bottom()),
            Some(Edge::West) => (owner.x - width, owner.y),
            Some(Edge::East) => (owner.right(), owner.y),
            None => (owner.x, owner.y),
        };

        Bounds::new(x + self.offset.x, y + self.offset.y, width, height)
    }
}

/// A zone glued to a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Index into `World::zones`
    pub zone: usize,
    pub layout: AttachLayout,
}

/// An axis-aligned rectangle with its start-of-frame snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub last_x: i32,
    pub last_y: i32,
    pub last_width: i32,
    pub last_height: i32,
    pub policy: ResizePolicy,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Rect {
    /// New rectangle whose snapshot equals its current geometry
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            last_x: x,
            last_y: y,
            last_width: width,
            last_height: height,
            policy: ResizePolicy::default(),
            attachments: Vec::new(),
        }
    }

    pub fn from_bounds(bounds: Bounds) -> Self {
        Self::new(bounds.x, bounds.y, bounds.width, bounds.height)
    }

    pub fn with_policy(mut self, policy: ResizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Snapshot the current geometry. Call once per frame before any movement.
    pub fn update_last_position(&mut self) {
        self.last_x = self.x;
        self.last_y = self.y;
        self.last_width = self.width;
        self.last_height = self.height;
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub fn last_bounds(&self) -> Bounds {
        Bounds::new(self.last_x, self.last_y, self.last_width, self.last_height)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    pub fn translate(&mut self, delta: IVec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_bounds_do_not_overlap() {
        let a = Bounds::new(0, 0, 10, 10);
        let b = Bounds::new(10, 0, 10, 10);
        assert!(!a.overlaps_x(&b));
        assert!(a.overlaps_y(&b));
        assert!(!a.intersects(&b));

        let c = Bounds::new(9, 9, 10, 10);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_zero_width_never_overlaps() {
        let a = Bounds::new(0, 0, 0, 10);
        let b = Bounds::new(-5, 0, 10, 10);
        assert!(!a.overlaps_x(&b));
        assert!(!b.overlaps_x(&a));
        assert!(!a.intersects(&b));

        let flat = Bounds::new(0, 5, 10, 0);
        assert!(!flat.intersects(&b));
    }

    #[test]
    fn test_update_last_position_snapshots_geometry() {
        let mut rect = Rect::new(1, 2, 3, 4);
        rect.translate(IVec2::new(5, -1));
        rect.width = 7;
        assert_eq!(rect.last_bounds(), Bounds::new(1, 2, 3, 4));

        rect.update_last_position();
        assert_eq!(rect.last_bounds(), Bounds::new(6, 1, 7, 4));
        assert_eq!(rect.last_bounds(), rect.bounds());
    }

    #[test]
    fn test_edge_opposites() {
        for edge in Edge::ALL {
            assert_eq!(edge.opposite().opposite(), edge);
            assert_eq!(edge.moves_along_x(), edge.opposite().moves_along_x());
        }
        assert!(Edge::West.moves_along_x());
        assert!(!Edge::North.moves_along_x());
    }

    #[test]
    fn test_attach_layout_glues_to_edges() {
        let owner = Bounds::new(100, 50, 40, 20);
        let zone = Bounds::new(0, 0, 10, 6);

        let on_top = AttachLayout::on_top();
        assert_eq!(on_top.place(owner, zone), Bounds::new(100, 44, 40, 6));

        let below = AttachLayout {
            anchor: Some(Edge::South),
            ..Default::default()
        };
        assert_eq!(below.place(owner, zone), Bounds::new(100, 70, 10, 6));

        let left = AttachLayout {
            anchor: Some(Edge::West),
            mirror_height: true,
            offset: IVec2::new(-2, 0),
            ..Default::default()
        };
        assert_eq!(left.place(owner, zone), Bounds::new(88, 50, 10, 20));

        let right = AttachLayout {
            anchor: Some(Edge::East),
            ..Default::default()
        };
        assert_eq!(right.place(owner, zone), Bounds::new(140, 50, 10, 6));

        let overlay = AttachLayout {
            mirror_width: true,
            mirror_height: true,
            ..Default::default()
        };
        assert_eq!(overlay.place(owner, zone), owner);
    }
}
