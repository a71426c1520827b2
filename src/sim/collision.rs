//! Collision propagation for chains of pushing rectangles
//!
//! The tricky part of Window Push: one body moves, and every body it touches
//! must be shoved out of the way, which may shove further bodies into walls,
//! which shove back along the whole chain. Resolution is recursive over the
//! arena; a per-call correction map records who pushed whom so the chain can
//! be pulled flush afterwards.

use std::collections::{BTreeMap, BTreeSet};

use glam::IVec2;

use super::body::{Body, BodyId};
use super::rect::{Bounds, Rect, Span};
use crate::consts::{SLIVER_X, SLIVER_Y};

/// Collision view of a rectangle: bounds now and at frame start, and which
/// axes it may push along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collider {
    pub now: Bounds,
    pub last: Bounds,
    pub push_x: bool,
    pub push_y: bool,
}

impl Collider {
    /// Immovable wall
    pub fn wall(rect: &Rect) -> Self {
        Self {
            now: rect.bounds(),
            last: rect.last_bounds(),
            push_x: true,
            push_y: true,
        }
    }

    pub fn body(body: &Body) -> Self {
        Self {
            now: body.rect.bounds(),
            last: body.rect.last_bounds(),
            push_x: body.can_push_x(),
            push_y: body.can_push_y(),
        }
    }
}

/// Displacement to apply to `other` to get it out of `rect`.
///
/// Both axes may be nonzero for a clean diagonal clip; callers collapse with
/// [`collapse_to_one_axis`]. Exactly antisymmetric in its arguments.
pub fn calculate_collision(rect: &Collider, other: &Collider) -> IVec2 {
    let (a, b) = (rect.now, other.now);
    let (la, lb) = (rect.last, other.last);

    let overlap_x = a.overlaps_x(&b);
    let overlap_y = a.overlaps_y(&b);
    let was_overlap_x = la.overlaps_x(&lb);
    let was_overlap_y = la.overlaps_y(&lb);

    let (mut on_x, mut on_y) = match (overlap_x, overlap_y) {
        // the axis that was clear last frame is the one it came in on
        (true, true) => match (was_overlap_x, was_overlap_y) {
            (false, true) => (true, false),
            (true, false) => (false, true),
            _ => (true, true),
        },
        // slipped past a corner diagonally between frames
        (true, false) => (was_overlap_y && !was_overlap_x, false),
        (false, true) => (false, was_overlap_x && !was_overlap_y),
        (false, false) => (false, false),
    };

    // tunneled straight through along one axis
    if !(overlap_x && overlap_y) {
        if overlap_y && swapped(a.span_x(), b.span_x(), la.span_x(), lb.span_x()) {
            on_x = true;
        }
        if overlap_x && swapped(a.span_y(), b.span_y(), la.span_y(), lb.span_y()) {
            on_y = true;
        }
    }

    let dx = if on_x && rect.push_x && other.push_x {
        axis_push(a.span_x(), b.span_x(), la.span_x(), lb.span_x())
    } else {
        0
    };
    let dy = if on_y && rect.push_y && other.push_y {
        axis_push(a.span_y(), b.span_y(), la.span_y(), lb.span_y())
    } else {
        0
    };

    IVec2::new(dx, dy)
}

/// Keep a single axis of a diagonal push: the larger one, ties to X
pub fn collapse_to_one_axis(push: IVec2) -> IVec2 {
    if push.x != 0 && push.y != 0 {
        if push.x.abs() >= push.y.abs() {
            IVec2::new(push.x, 0)
        } else {
            IVec2::new(0, push.y)
        }
    } else {
        push
    }
}

/// Separated last frame with the order reversed now
fn swapped(a: Span, b: Span, la: Span, lb: Span) -> bool {
    (la.hi <= lb.lo && b.hi <= a.lo) || (lb.hi <= la.lo && a.hi <= b.lo)
}

/// Which side of `a` the span `b` belongs on: last frame's separation if it
/// is unambiguous, then current centres, then last centres
fn belongs_after(a: Span, b: Span, la: Span, lb: Span) -> Option<bool> {
    let was_after = lb.lo >= la.hi;
    let was_before = lb.hi <= la.lo;
    if was_after != was_before {
        return Some(was_after);
    }

    let (center_a, center_b) = (a.doubled_center(), b.doubled_center());
    if center_a != center_b {
        return Some(center_b > center_a);
    }

    let (last_a, last_b) = (la.doubled_center(), lb.doubled_center());
    if last_a != last_b {
        return Some(last_b > last_a);
    }

    None
}

/// Signed push moving `b` flush to the proper side of `a`
fn axis_push(a: Span, b: Span, la: Span, lb: Span) -> i32 {
    match belongs_after(a, b, la, lb) {
        Some(true) => (a.hi - b.lo).max(0),
        Some(false) => (a.lo - b.hi).min(0),
        None => 0,
    }
}

/// Who displaced a body and by how much
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub pusher: BodyId,
    pub applied: IVec2,
}

/// Resolves the chain of pushes started by one moved body.
///
/// Single use: the correction map accumulates during `resolve`, so a second
/// call on the same instance is a programming error and panics.
#[derive(Debug, Default)]
pub struct CollisionPropagator {
    resolved: bool,
    corrections: BTreeMap<BodyId, Correction>,
}

impl CollisionPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push everything `target` now overlaps out of the way, transitively.
    ///
    /// - `bodies`: the arena, window edges included; edges flagged
    ///   `acting_as_wall` behave as walls
    /// - `walls`: immovable rectangles
    /// - `order`: bodies eligible to be pushed, in resolution order
    ///
    /// Returns how far `target` itself was pushed back.
    pub fn resolve(
        &mut self,
        target: BodyId,
        bodies: &mut [Body],
        walls: &[Rect],
        order: &[BodyId],
    ) -> IVec2 {
        assert!(
            !self.resolved,
            "CollisionPropagator::resolve called twice on the same instance"
        );
        self.resolved = true;

        let mut path = vec![target];
        self.resolve_body(target, bodies, walls, order, &mut path)
    }

    /// Corrections recorded by `resolve`, keyed by the displaced body
    pub fn corrections(&self) -> &BTreeMap<BodyId, Correction> {
        &self.corrections
    }

    fn resolve_body(
        &mut self,
        id: BodyId,
        bodies: &mut [Body],
        walls: &[Rect],
        order: &[BodyId],
        path: &mut Vec<BodyId>,
    ) -> IVec2 {
        let mut total = wall_pass(id, bodies, walls);

        for &other in order {
            if path.contains(&other) {
                continue;
            }
            let (pusher, pushed) = (&bodies[id], &bodies[other]);
            if !pushed.is_live() || pushed.is_side() || !pusher.interacts_with_body(pushed) {
                continue;
            }

            let push =
                collapse_to_one_axis(calculate_collision(&Collider::body(pusher), &Collider::body(pushed)));
            if push == IVec2::ZERO {
                continue;
            }

            // the pusher's own growth into the other body is taken back first
            let push = -bodies[id].correct_growth_for_collision(-push);
            let applied = bodies[other].correct_growth_for_collision(push);
            if applied == IVec2::ZERO {
                continue;
            }
            bodies[other].move_collision(applied);

            self.corrections
                .entry(other)
                .and_modify(|c| {
                    if c.pusher == id {
                        c.applied += applied;
                    } else {
                        *c = Correction {
                            pusher: id,
                            applied,
                        };
                    }
                })
                .or_insert(Correction {
                    pusher: id,
                    applied,
                });

            path.push(other);
            let back = self.resolve_body(other, bodies, walls, order, path);
            path.pop();

            // shoved back along the axis of the original push only
            let recoil = if applied.x != 0 {
                IVec2::new(opposing(back.x, applied.x), 0)
            } else {
                IVec2::new(0, opposing(back.y, applied.y))
            };
            if recoil != IVec2::ZERO {
                bodies[id].move_collision(recoil);
                total += recoil;
            }
        }

        let mut visited = BTreeSet::new();
        self.pull_back(id, bodies, &mut visited);

        total
    }

    /// Pull everything `pusher` displaced back flush against it, then
    /// recurse into what those displaced.
    fn pull_back(&mut self, pusher: BodyId, bodies: &mut [Body], visited: &mut BTreeSet<BodyId>) {
        if !visited.insert(pusher) {
            return;
        }

        let displaced: Vec<(BodyId, Correction)> = self
            .corrections
            .iter()
            .filter(|(_, c)| c.pusher == pusher)
            .map(|(&id, &c)| (id, c))
            .collect();

        for (id, correction) in displaced {
            let pull = pull_distance(&bodies[pusher], &bodies[id], correction.applied);
            if pull != IVec2::ZERO {
                bodies[id].translate(pull);
                if let Some(entry) = self.corrections.get_mut(&id) {
                    entry.applied += pull;
                }
                log::trace!("pulled body {id} by {pull} back against body {pusher}");
            }
            self.pull_back(id, bodies, visited);
        }
    }
}

/// The part of `back` that opposes `pushed`
fn opposing(back: i32, pushed: i32) -> i32 {
    if back.signum() == -pushed.signum() {
        back
    } else {
        0
    }
}

/// Movement bringing `pushed` flush against `pusher` along the axis of
/// `applied`, bounded by `applied`. Zero when they overlap on the other axis
/// neither now nor last frame.
fn pull_distance(pusher: &Body, pushed: &Body, applied: IVec2) -> IVec2 {
    let (p, q) = (pusher.rect.bounds(), pushed.rect.bounds());
    let (lp, lq) = (pusher.rect.last_bounds(), pushed.rect.last_bounds());

    if applied.x != 0 {
        if !p.overlaps_y(&q) && !lp.overlaps_y(&lq) {
            return IVec2::ZERO;
        }
        let gap = if applied.x > 0 {
            q.x - p.right()
        } else {
            p.x - q.right()
        };
        let pull = gap.min(applied.x.abs());
        if pull <= 0 {
            return IVec2::ZERO;
        }
        IVec2::new(-applied.x.signum() * pull, 0)
    } else if applied.y != 0 {
        if !p.overlaps_x(&q) && !lp.overlaps_x(&lq) {
            return IVec2::ZERO;
        }
        let gap = if applied.y > 0 {
            q.y - p.bottom()
        } else {
            p.y - q.bottom()
        };
        let pull = gap.min(applied.y.abs());
        if pull <= 0 {
            return IVec2::ZERO;
        }
        IVec2::new(0, -applied.y.signum() * pull)
    } else {
        IVec2::ZERO
    }
}

/// Push `id` out of every wall it interacts with. Window edges pass over
/// static walls. Returns the total push.
fn wall_pass(id: BodyId, bodies: &mut [Body], walls: &[Rect]) -> IVec2 {
    let body = &bodies[id];
    let mut colliders: Vec<Collider> = walls
        .iter()
        .filter(|wall| !body.is_side() && body.interacts_with(wall.policy, false))
        .map(Collider::wall)
        .collect();
    colliders.extend(
        bodies
            .iter()
            .enumerate()
            .filter(|&(i, side)| i != id && side.acts_as_wall() && side.interacts_with_body(body))
            .map(|(_, side)| Collider::body(side)),
    );

    let mut total = IVec2::ZERO;
    for (index, wall) in colliders.iter().enumerate() {
        let push = collapse_to_one_axis(calculate_collision(wall, &Collider::body(&bodies[id])));
        if push == IVec2::ZERO {
            continue;
        }

        let push = bodies[id].correct_growth_for_collision(push);
        if push == IVec2::ZERO {
            continue;
        }

        let push = sliver_fudge(&bodies[id], push, index, &colliders).unwrap_or(push);
        bodies[id].move_collision(push);
        total += push;
    }
    total
}

/// Re-read a thin sideways push as stepping up onto the wall's top.
/// `None` when the push is not a sliver or the step-up would land the body
/// in a different wall.
fn sliver_fudge(body: &Body, push: IVec2, index: usize, walls: &[Collider]) -> Option<IVec2> {
    let wall = &walls[index];
    if !wall.push_y || !body.can_push_y() {
        return None;
    }
    if push.y != 0 || push.x == 0 || push.x.abs() > SLIVER_X {
        return None;
    }

    let bounds = body.rect.bounds();
    let lift = bounds.bottom() - wall.now.y;
    if lift <= 0 || lift > SLIVER_Y {
        return None;
    }

    let step_up = IVec2::new(0, -lift);
    let raised = bounds.translated(step_up);
    let blocked = walls
        .iter()
        .enumerate()
        .any(|(i, other)| i != index && raised.intersects(&other.now) && !bounds.intersects(&other.now));
    if blocked {
        log::trace!("sliver fudge {step_up} rejected, falling back to {push}");
        return None;
    }

    log::trace!("sliver fudge: {push} becomes step-up {step_up}");
    Some(step_up)
}
