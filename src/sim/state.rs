//! World state: the body arena, static walls, zones and the viewport
//!
//! The four window edges are ordinary bodies at the front of the arena
//! (`Edge::ALL` order), so the propagator treats them like anything else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::rect::{AttachLayout, Attachment, Bounds, Edge, Rect};
use super::zone::{Zone, ZoneContext};
use crate::consts::*;

/// The window's interior in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport after moving each edge outward by the given amount
    pub fn resized(&self, deltas: &EdgeDeltas) -> Viewport {
        Viewport {
            x: self.x - deltas.west,
            y: self.y - deltas.north,
            width: self.width + deltas.west + deltas.east,
            height: self.height + deltas.north + deltas.south,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

/// Signed outward displacement of each window edge. Positive grows the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeDeltas {
    pub north: i32,
    pub south: i32,
    pub west: i32,
    pub east: i32,
}

impl EdgeDeltas {
    pub fn get(&self, edge: Edge) -> i32 {
        match edge {
            Edge::North => self.north,
            Edge::South => self.south,
            Edge::West => self.west,
            Edge::East => self.east,
        }
    }

    pub fn set(&mut self, edge: Edge, value: i32) {
        match edge {
            Edge::North => self.north = value,
            Edge::South => self.south = value,
            Edge::West => self.west = value,
            Edge::East => self.east = value,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == EdgeDeltas::default()
    }
}

/// Slab standing just outside `edge` of the viewport. Slabs overhang the
/// corners so the window stays closed whatever order edges move in.
pub fn side_bounds(edge: Edge, viewport: &Viewport) -> Bounds {
    let t = SIDE_THICKNESS;
    let Viewport {
        x,
        y,
        width,
        height,
    } = *viewport;
    match edge {
        Edge::North => Bounds::new(x - t, y - t, width + 2 * t, t),
        Edge::South => Bounds::new(x - t, y + height, width + 2 * t, t),
        Edge::West => Bounds::new(x - t, y - t, t, height + 2 * t),
        Edge::East => Bounds::new(x + width, y - t, t, height + 2 * t),
    }
}

/// A pair found intersecting by [`World::first_new_overlap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    Bodies(BodyId, BodyId),
    /// Body and index into `World::walls`
    Wall(BodyId, usize),
}

/// Everything the simulator owns
#[derive(Debug)]
pub struct World {
    /// Window edges first, then bodies in insertion order
    pub bodies: Vec<Body>,
    /// Immovable rectangles
    pub walls: Vec<Rect>,
    pub zones: Vec<Zone>,
    pub viewport: Viewport,
    /// Number of gravity zones each body is currently inside
    pub gravity_suppression: BTreeMap<BodyId, u32>,
    /// Pending next-level identifier, empty when none
    pub next_level: String,
}

impl World {
    /// Empty level with the window edges around `viewport`
    pub fn new(viewport: Viewport) -> Self {
        let bodies = Edge::ALL
            .iter()
            .map(|&edge| Body::side(edge, side_bounds(edge, &viewport)))
            .collect();
        Self {
            bodies,
            walls: Vec::new(),
            zones: Vec::new(),
            viewport,
            gravity_suppression: BTreeMap::new(),
            next_level: String::new(),
        }
    }

    /// Arena index of an edge's slab
    pub fn side_id(&self, edge: Edge) -> BodyId {
        match edge {
            Edge::North => 0,
            Edge::South => 1,
            Edge::West => 2,
            Edge::East => 3,
        }
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn add_wall(&mut self, wall: Rect) -> usize {
        self.walls.push(wall);
        self.walls.len() - 1
    }

    pub fn add_zone(&mut self, zone: Zone) -> usize {
        self.zones.push(zone);
        self.zones.len() - 1
    }

    /// Glue `zone` to `owner` and place it right away
    pub fn attach(&mut self, owner: BodyId, zone: usize, layout: AttachLayout) {
        self.bodies[owner]
            .rect
            .attachments
            .push(Attachment { zone, layout });
        self.sync_attachments(owner);
    }

    /// Re-place the zones glued to `id` after it moved or resized
    pub fn sync_attachments(&mut self, id: BodyId) {
        let owner = &self.bodies[id].rect;
        for attachment in &owner.attachments {
            let Some(zone) = self.zones.get_mut(attachment.zone) else {
                log::warn!("Body {id} is attached to missing zone {}", attachment.zone);
                continue;
            };
            let placed = attachment.layout.place(owner.bounds(), zone.rect.bounds());
            zone.rect.set_bounds(placed);
        }
    }

    pub fn sync_all_attachments(&mut self) {
        for id in 0..self.bodies.len() {
            if !self.bodies[id].rect.attachments.is_empty() {
                self.sync_attachments(id);
            }
        }
    }

    /// Run the zones of one phase against body `id`
    pub fn apply_zones(&mut self, id: BodyId, before_movement: bool) {
        let World {
            bodies,
            zones,
            gravity_suppression,
            next_level,
            ..
        } = self;

        for zone in zones
            .iter_mut()
            .filter(|zone| zone.effect.settles_before_movement() == before_movement)
        {
            let inside = zone.rect.bounds().intersects(&bodies[id].rect.bounds());
            let mut ctx = ZoneContext {
                body: id,
                bodies: bodies.as_mut_slice(),
                gravity_suppression: &mut *gravity_suppression,
                next_level: &mut *next_level,
            };
            zone.update(inside, &mut ctx);
        }
    }

    /// Live, non-edge bodies in arena order
    pub fn moving_ids(&self) -> Vec<BodyId> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.is_live() && !body.is_side())
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether something solid sits directly under body `id`
    pub fn is_supported(&self, id: BodyId) -> bool {
        let body = &self.bodies[id];
        let bounds = body.rect.bounds();
        let rests_on = |other: &Bounds| other.y == bounds.bottom() && bounds.overlaps_x(other);

        let on_wall = self
            .walls
            .iter()
            .filter(|wall| body.interacts_with(wall.policy, false))
            .any(|wall| rests_on(&wall.bounds()));

        on_wall
            || self.bodies.iter().enumerate().any(|(other_id, other)| {
                other_id != id
                    && other.is_live()
                    && other.can_push_y()
                    && other.interacts_with_body(body)
                    && rests_on(&other.rect.bounds())
            })
    }

    /// Flag every window edge except `moving` as a wall
    pub fn set_edges_solid(&mut self, moving: Option<Edge>) {
        for edge in Edge::ALL {
            let id = self.side_id(edge);
            self.bodies[id].set_acting_as_wall(Some(edge) != moving);
        }
    }

    pub fn clear_edge_flags(&mut self) {
        for edge in Edge::ALL {
            let id = self.side_id(edge);
            self.bodies[id].set_acting_as_wall(false);
        }
    }

    /// First solid pair that intersects now but did not in `before`.
    /// Only bodies flagged `has_moved` are considered; `before` must be a
    /// snapshot of this arena.
    pub fn first_new_overlap(&self, before: &[Body]) -> Option<Overlap> {
        for (id, body) in self.bodies.iter().enumerate() {
            if !body.has_moved || !body.is_live() {
                continue;
            }
            let now = body.rect.bounds();
            let was = before[id].rect.bounds();

            if !body.is_side() {
                let hit = self.walls.iter().position(|wall| {
                    let wall_bounds = wall.bounds();
                    body.interacts_with(wall.policy, false)
                        && now.intersects(&wall_bounds)
                        && !was.intersects(&wall_bounds)
                });
                if let Some(wall) = hit {
                    return Some(Overlap::Wall(id, wall));
                }
            }

            for (other_id, other) in self.bodies.iter().enumerate() {
                // pairs of moved bodies are checked from the lower index
                if other_id == id || (other.has_moved && other_id < id) {
                    continue;
                }
                if !other.is_live() || !body.interacts_with_body(other) {
                    continue;
                }
                if now.intersects(&other.rect.bounds())
                    && !was.intersects(&before[other_id].rect.bounds())
                {
                    return Some(Overlap::Bodies(id, other_id));
                }
            }
        }
        None
    }

    /// Gravity applies unless a zone suppresses it
    pub fn has_effective_gravity(&self, id: BodyId) -> bool {
        self.bodies[id].has_gravity && !self.gravity_suppression.contains_key(&id)
    }

    pub fn pending_next_level(&self) -> Option<&str> {
        if self.next_level.is_empty() {
            None
        } else {
            Some(&self.next_level)
        }
    }

    /// Read and clear the level-advance signal
    pub fn take_next_level(&mut self) -> Option<String> {
        if self.next_level.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.next_level))
        }
    }

    /// Current inner face of an edge's slab
    pub fn edge_coordinate(&self, edge: Edge) -> i32 {
        let side = &self.bodies[self.side_id(edge)].rect;
        match edge {
            Edge::North => side.bottom(),
            Edge::South => side.y,
            Edge::West => side.right(),
            Edge::East => side.x,
        }
    }

    /// How far body `id` is from an edge's inner face (negative when past it)
    pub fn distance_from_edge(&self, id: BodyId, edge: Edge) -> i32 {
        let rect = &self.bodies[id].rect;
        let face = self.edge_coordinate(edge);
        match edge {
            Edge::North => rect.y - face,
            Edge::South => face - rect.bottom(),
            Edge::West => rect.x - face,
            Edge::East => face - rect.right(),
        }
    }

    /// The viewport the edge slabs currently enclose
    pub fn viewport_from_sides(&self) -> Viewport {
        let x = self.edge_coordinate(Edge::West);
        let y = self.edge_coordinate(Edge::North);
        Viewport {
            x,
            y,
            width: self.edge_coordinate(Edge::East) - x,
            height: self.edge_coordinate(Edge::South) - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rect::ResizePolicy;
    use crate::sim::zone::GoalZone;

    #[test]
    fn test_sides_enclose_viewport() {
        let viewport = Viewport::new(10, 20, 300, 200);
        let world = World::new(viewport);

        assert_eq!(world.bodies.len(), 4);
        for edge in Edge::ALL {
            let side = &world.bodies[world.side_id(edge)];
            assert_eq!(side.side_edge(), Some(edge));
            assert!(!side.rect.bounds().intersects(&viewport.bounds()));
        }
        assert_eq!(world.edge_coordinate(Edge::North), 20);
        assert_eq!(world.edge_coordinate(Edge::South), 220);
        assert_eq!(world.edge_coordinate(Edge::West), 10);
        assert_eq!(world.edge_coordinate(Edge::East), 310);
        assert_eq!(world.viewport_from_sides(), viewport);
    }

    #[test]
    fn test_viewport_resized_by_deltas() {
        let viewport = Viewport::new(0, 0, 400, 300);
        let mut deltas = EdgeDeltas::default();
        assert!(deltas.is_zero());
        deltas.set(Edge::North, 10);
        deltas.set(Edge::West, -20);
        deltas.set(Edge::South, 5);
        assert_eq!(deltas.get(Edge::West), -20);

        assert_eq!(viewport.resized(&deltas), Viewport::new(20, -10, 380, 315));
    }

    #[test]
    fn test_distance_from_edges() {
        let mut world = World::new(Viewport::new(0, 0, 400, 300));
        let id = world.add_body(Body::new(Rect::new(100, 50, 20, 30)));

        assert_eq!(world.distance_from_edge(id, Edge::North), 50);
        assert_eq!(world.distance_from_edge(id, Edge::South), 220);
        assert_eq!(world.distance_from_edge(id, Edge::West), 100);
        assert_eq!(world.distance_from_edge(id, Edge::East), 280);
    }

    #[test]
    fn test_supported_by_wall_body_and_floor_edge() {
        let mut world = World::new(Viewport::new(0, 0, 200, 200));
        world.add_wall(Rect::new(0, 100, 50, 10));
        let on_wall = world.add_body(Body::new(Rect::new(10, 90, 10, 10)));
        let stacked = world.add_body(Body::new(Rect::new(10, 80, 10, 10)));
        let on_floor = world.add_body(Body::new(Rect::new(100, 190, 10, 10)));
        let floating = world.add_body(Body::new(Rect::new(100, 50, 10, 10)));
        let ignored = world.add_body(Body::new(Rect::new(150, 190, 10, 10).with_policy(ResizePolicy::Stay)));

        assert!(world.is_supported(on_wall));
        assert!(world.is_supported(stacked));
        assert!(world.is_supported(on_floor));
        assert!(!world.is_supported(floating));
        assert!(!world.is_supported(ignored));
    }

    #[test]
    fn test_inactive_switch_does_not_support() {
        let mut world = World::new(Viewport::new(0, 0, 200, 200));
        world.add_body(Body::switch(Rect::new(0, 100, 50, 10), 1, false));
        let id = world.add_body(Body::new(Rect::new(10, 90, 10, 10)));
        assert!(!world.is_supported(id));
        assert!(!world.moving_ids().contains(&4));
    }

    #[test]
    fn test_attached_zone_follows_owner() {
        let mut world = World::new(Viewport::new(0, 0, 200, 200));
        let owner = world.add_body(Body::new(Rect::new(40, 40, 20, 10)));
        let zone = world.add_zone(Zone::new(Rect::new(0, 0, 1, 4), GoalZone::new("next", 10)));
        world.attach(owner, zone, AttachLayout::on_top());
        assert_eq!(world.zones[zone].rect.bounds(), Bounds::new(40, 36, 20, 4));

        world.bodies[owner].translate(glam::IVec2::new(5, -3));
        world.sync_all_attachments();
        assert_eq!(world.zones[zone].rect.bounds(), Bounds::new(45, 33, 20, 4));
    }

    #[test]
    fn test_new_overlap_ignores_old_and_unmoved_pairs() {
        let mut world = World::new(Viewport::new(0, 0, 200, 200));
        world.add_wall(Rect::new(100, 0, 20, 200));
        let a = world.add_body(Body::new(Rect::new(0, 0, 10, 10)));
        let b = world.add_body(Body::new(Rect::new(5, 5, 10, 10)));
        let c = world.add_body(Body::new(Rect::new(50, 50, 10, 10)));
        for body in &mut world.bodies {
            body.update_last_position();
        }
        let before = world.bodies.clone();

        // a and b overlapped already; nothing moved
        assert_eq!(world.first_new_overlap(&before), None);

        world.bodies[a].translate(glam::IVec2::new(1, 0));
        assert_eq!(world.first_new_overlap(&before), None);

        world.bodies[c].translate(glam::IVec2::new(-42, -42));
        assert_eq!(world.first_new_overlap(&before), Some(Overlap::Bodies(a, c)));

        world.bodies = before.clone();
        world.bodies[c].translate(glam::IVec2::new(45, 0));
        assert_eq!(world.first_new_overlap(&before), Some(Overlap::Wall(c, 0)));

        world.bodies = before.clone();
        world.bodies[b].translate(glam::IVec2::new(0, 190));
        let south = world.side_id(Edge::South);
        assert_eq!(world.first_new_overlap(&before), Some(Overlap::Bodies(b, south)));
    }

    #[test]
    fn test_edge_flags() {
        let mut world = World::new(Viewport::new(0, 0, 10, 10));
        world.set_edges_solid(Some(Edge::East));
        for edge in Edge::ALL {
            let side = &world.bodies[world.side_id(edge)];
            assert_eq!(side.acts_as_wall(), edge != Edge::East);
        }
        world.set_edges_solid(None);
        assert!(world.bodies[..4].iter().all(Body::acts_as_wall));
        world.clear_edge_flags();
        assert!(!world.bodies.iter().any(Body::acts_as_wall));
    }

    #[test]
    fn test_take_next_level_clears_signal() {
        let mut world = World::new(Viewport::new(0, 0, 10, 10));
        assert_eq!(world.pending_next_level(), None);
        world.next_level = "forest-2".to_string();
        assert_eq!(world.pending_next_level(), Some("forest-2"));
        assert_eq!(world.take_next_level().as_deref(), Some("forest-2"));
        assert_eq!(world.take_next_level(), None);
    }
}
