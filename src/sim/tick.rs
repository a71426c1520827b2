//! Fixed timestep simulation tick
//!
//! One `step` per frame: snapshot, settle switches, move bodies bottom-up,
//! then drag the window edges to the requested viewport.

use std::cmp::Reverse;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::collision::CollisionPropagator;
use super::rect::{Bounds, Edge};
use super::state::{EdgeDeltas, Viewport, World, side_bounds};
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Held jump; releasing early cuts the jump short
    pub jump: bool,
}

/// Owns a world and advances it one frame at a time
#[derive(Debug)]
pub struct PhysicsSimulator {
    pub world: World,
    pub tuning: Tuning,
    /// Ticks simulated so far
    pub time_ticks: u64,
}

impl PhysicsSimulator {
    pub fn new(world: World, tuning: Tuning) -> Self {
        log::info!(
            "Simulator created: {} bodies, {} walls, {} zones",
            world.bodies.len(),
            world.walls.len(),
            world.zones.len()
        );
        Self {
            world,
            tuning,
            time_ticks: 0,
        }
    }

    /// Advance one frame toward the requested `viewport`.
    ///
    /// Returns how far each window edge actually moved outward; edges that
    /// ran into something immovable stop short of the request.
    pub fn step(&mut self, input: &TickInput, viewport: Viewport) -> EdgeDeltas {
        if let Some(level) = self.world.pending_next_level() {
            log::debug!("Tick skipped, level {level:?} pending");
            return EdgeDeltas::default();
        }
        self.time_ticks += 1;

        for body in &mut self.world.bodies {
            body.update_last_position();
        }

        for id in self.world.moving_ids() {
            self.world.apply_zones(id, true);
        }

        // lowest first so stacks settle bottom-up
        let mut order = self.world.moving_ids();
        order.sort_by_key(|&id| Reverse(self.world.bodies[id].rect.bottom()));

        self.world.set_edges_solid(None);
        for &id in &order {
            let snapshot = self.world.bodies.clone();
            self.world.apply_zones(id, false);
            if self.world.pending_next_level().is_some() {
                self.world.clear_edge_flags();
                return EdgeDeltas::default();
            }
            self.advance_body(id, input, &order);

            if let Some(overlap) = self.world.first_new_overlap(&snapshot) {
                log::debug!("Body {id} held in place this tick, its move left {overlap:?}");
                self.world.bodies = snapshot;
                self.world.bodies[id].vel = IVec2::ZERO;
                self.world.sync_all_attachments();
            }
        }
        self.world.clear_edge_flags();

        let deltas = self.move_edges(&viewport);
        self.world.sync_all_attachments();
        deltas
    }

    /// Input, gravity, friction and movement for one body, then resolve
    fn advance_body(&mut self, id: BodyId, input: &TickInput, order: &[BodyId]) {
        let grounded = self.world.is_supported(id);
        let gravity = self.world.has_effective_gravity(id);
        let tuning = &self.tuning;

        let body = &mut self.world.bodies[id];
        body.grounded = grounded;
        let mut vel = body.vel;
        let mut airborne = !grounded;

        if body.controlled_by_player {
            if input.left {
                vel.x -= tuning.horizontal_accel;
            }
            if input.right {
                vel.x += tuning.horizontal_accel;
            }
            if input.jump && grounded {
                vel.y = tuning.jump_velocity;
                body.grounded = false;
                airborne = true;
            } else if !input.jump && vel.y < tuning.jump_cap {
                vel.y = tuning.jump_cap;
            }
        }

        if gravity && airborne {
            vel.y += tuning.gravity;
        }
        vel.x = if vel.x > 0 {
            (vel.x - tuning.friction).max(0)
        } else {
            (vel.x + tuning.friction).min(0)
        };

        body.set_velocity(vel);
        body.apply_velocity();

        let mut propagator = CollisionPropagator::new();
        let back = propagator.resolve(id, &mut self.world.bodies, &self.world.walls, order);
        if back != IVec2::ZERO {
            log::trace!("Body {id} pushed back by {back}");
        }

        self.world.sync_attachments(id);
        for &moved in propagator.corrections().keys() {
            self.world.sync_attachments(moved);
        }
    }

    /// Move each window edge in turn, closest bodies first. The edge being
    /// moved pushes; the other three stand still as walls.
    fn move_edges(&mut self, viewport: &Viewport) -> EdgeDeltas {
        let mut deltas = EdgeDeltas::default();

        for edge in Edge::ALL {
            let side = self.world.side_id(edge);
            let before = self.world.bodies[side].rect.bounds();
            let target = side_bounds(edge, viewport);
            let requested = outward(edge, &before, &target);

            self.world.set_edges_solid(Some(edge));
            // resolved even when unmoved, so bodies that left the window come back in
            if !self.try_move_edge(edge, target) {
                // creep toward the request a pixel at a time, keeping what fit
                let step = requested.signum();
                let mut reached = 0;
                while reached != requested {
                    let next = shifted(edge, &before, &target, reached + step);
                    if !self.try_move_edge(edge, next) {
                        break;
                    }
                    reached += step;
                }
            }
            self.world.clear_edge_flags();

            let after = self.world.bodies[side].rect.bounds();
            let moved = outward(edge, &before, &after);
            if moved != requested {
                log::debug!("{edge:?} edge blocked: requested {requested}, moved {moved}");
            }
            deltas.set(edge, moved);
        }

        self.world.viewport = self.world.viewport_from_sides();
        deltas
    }

    /// Put one edge at `target` and push what it meets. Undone when the
    /// push leaves any solid pair overlapping.
    fn try_move_edge(&mut self, edge: Edge, target: Bounds) -> bool {
        let side = self.world.side_id(edge);
        let snapshot = self.world.bodies.clone();

        let mut order = self.world.moving_ids();
        order.sort_by_key(|&id| self.world.distance_from_edge(id, edge));

        self.world.bodies[side].update_last_position();
        self.world.bodies[side].set_bounds(target);
        CollisionPropagator::new().resolve(side, &mut self.world.bodies, &self.world.walls, &order);

        match self.world.first_new_overlap(&snapshot) {
            None => true,
            Some(overlap) => {
                log::trace!("{edge:?} edge move to {target:?} undone, left {overlap:?}");
                self.world.bodies = snapshot;
                false
            }
        }
    }
}

/// `target` with its moving coordinate `amount` outward from `before`
fn shifted(edge: Edge, before: &Bounds, target: &Bounds, amount: i32) -> Bounds {
    match edge {
        Edge::North => Bounds { y: before.y - amount, ..*target },
        Edge::South => Bounds { y: before.y + amount, ..*target },
        Edge::West => Bounds { x: before.x - amount, ..*target },
        Edge::East => Bounds { x: before.x + amount, ..*target },
    }
}

/// How far an edge's slab moved away from the window's centre
fn outward(edge: Edge, before: &Bounds, after: &Bounds) -> i32 {
    match edge {
        Edge::North => before.y - after.y,
        Edge::South => after.y - before.y,
        Edge::West => before.x - after.x,
        Edge::East => after.x - before.x,
    }
}
