//! Zones: non-colliding regions with enter/inside/exit effects
//!
//! A zone never blocks anything. It reacts to bodies overlapping it by
//! changing their state (gravity, size) or the world's (switch groups,
//! the level-advance signal) before collision runs for the tick.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::body::{Body, BodyId, BodyKind};
use super::rect::Rect;

/// What a zone callback may touch
pub struct ZoneContext<'a> {
    /// The body the callback is about
    pub body: BodyId,
    pub bodies: &'a mut [Body],
    /// Per-body count of gravity-suppressing zones currently containing it
    pub gravity_suppression: &'a mut BTreeMap<BodyId, u32>,
    /// Pending next-level identifier, empty when none
    pub next_level: &'a mut String,
}

impl ZoneContext<'_> {
    pub fn body(&self) -> &Body {
        &self.bodies[self.body]
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.bodies[self.body]
    }
}

/// Behavior of one zone variant
pub trait ZoneEffect: fmt::Debug {
    /// Effects that must settle before anything moves this tick
    fn settles_before_movement(&self) -> bool {
        false
    }

    fn on_enter(&mut self, _ctx: &mut ZoneContext<'_>) {}

    /// Called every tick the body overlaps the zone, including the entering tick
    fn on_inside(&mut self, _ctx: &mut ZoneContext<'_>) {}

    fn on_exit(&mut self, _ctx: &mut ZoneContext<'_>) {}
}

/// A zone placed in the world
#[derive(Debug)]
pub struct Zone {
    pub rect: Rect,
    pub effect: Box<dyn ZoneEffect>,
    occupants: BTreeSet<BodyId>,
}

impl Zone {
    pub fn new(rect: Rect, effect: impl ZoneEffect + 'static) -> Self {
        Self {
            rect,
            effect: Box::new(effect),
            occupants: BTreeSet::new(),
        }
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.occupants.contains(&body)
    }

    /// Fire enter/inside/exit for `ctx.body` given whether it overlaps now
    pub(crate) fn update(&mut self, inside: bool, ctx: &mut ZoneContext<'_>) {
        let was_inside = self.occupants.contains(&ctx.body);
        match (was_inside, inside) {
            (false, true) => {
                self.occupants.insert(ctx.body);
                self.effect.on_enter(ctx);
                self.effect.on_inside(ctx);
            }
            (true, true) => self.effect.on_inside(ctx),
            (true, false) => {
                self.occupants.remove(&ctx.body);
                self.effect.on_exit(ctx);
            }
            (false, false) => {}
        }
    }
}

/// Turns gravity off for bodies inside. Overlapping zones stack through the
/// world's suppression count, so leaving one of two keeps gravity off.
#[derive(Debug, Default)]
pub struct GravityZone;

impl ZoneEffect for GravityZone {
    fn on_enter(&mut self, ctx: &mut ZoneContext<'_>) {
        *ctx.gravity_suppression.entry(ctx.body).or_insert(0) += 1;
    }

    fn on_exit(&mut self, ctx: &mut ZoneContext<'_>) {
        if let Some(count) = ctx.gravity_suppression.get_mut(&ctx.body) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                ctx.gravity_suppression.remove(&ctx.body);
            }
        }
    }
}

/// Grows (or, with negative rates, shrinks) bodies inside, one step per tick,
/// until they reach the size limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthZone {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    /// Width stops changing once it reaches this
    pub width_limit: i32,
    /// Height stops changing once it reaches this
    pub height_limit: i32,
}

impl GrowthZone {
    /// Grow rightward and upward by one pixel a tick up to the given size
    pub fn up_and_right(width_limit: i32, height_limit: i32) -> Self {
        Self {
            left: 0,
            right: 1,
            top: 1,
            bottom: 0,
            width_limit,
            height_limit,
        }
    }
}

/// Clamp one edge pair's growth so the size stops exactly at `limit`
fn limited(near: i32, far: i32, size: i32, limit: i32) -> (i32, i32) {
    let total = near + far;
    let room = limit - size;
    if total == 0 || room == 0 || room.signum() != total.signum() {
        return (0, 0);
    }
    if total.abs() <= room.abs() {
        return (near, far);
    }
    // take the far edge first, then the near edge, never overshooting
    let far = if far.signum() == room.signum() {
        far.signum() * far.abs().min(room.abs())
    } else {
        0
    };
    let near = room - far;
    (near, far)
}

impl ZoneEffect for GrowthZone {
    fn on_inside(&mut self, ctx: &mut ZoneContext<'_>) {
        let body = ctx.body_mut();
        if body.is_side() {
            return;
        }
        let (left, right) = limited(self.left, self.right, body.rect.width, self.width_limit);
        let (top, bottom) = limited(self.top, self.bottom, body.rect.height, self.height_limit);
        body.grow(left, right, top, bottom);
    }
}

/// Advances the level once a player has stayed inside long enough
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalZone {
    pub next_level: String,
    pub required_ticks: u32,
    /// Extra ticks after the goal is reached, for the celebration
    pub settle_ticks: u32,
    timers: BTreeMap<BodyId, u32>,
}

impl GoalZone {
    pub fn new(next_level: impl Into<String>, required_ticks: u32) -> Self {
        Self {
            next_level: next_level.into(),
            required_ticks,
            settle_ticks: 0,
            timers: BTreeMap::new(),
        }
    }

    pub fn with_settle(mut self, settle_ticks: u32) -> Self {
        self.settle_ticks = settle_ticks;
        self
    }

    /// Ticks `body` has spent inside so far
    pub fn ticks_inside(&self, body: BodyId) -> u32 {
        self.timers.get(&body).copied().unwrap_or(0)
    }

    /// Whether `body` has met the goal (possibly still settling)
    pub fn reached(&self, body: BodyId) -> bool {
        self.ticks_inside(body) >= self.required_ticks
    }
}

impl ZoneEffect for GoalZone {
    fn on_enter(&mut self, ctx: &mut ZoneContext<'_>) {
        if ctx.body().controlled_by_player {
            self.timers.insert(ctx.body, 0);
        }
    }

    fn on_inside(&mut self, ctx: &mut ZoneContext<'_>) {
        let Some(timer) = self.timers.get_mut(&ctx.body) else {
            return;
        };
        *timer += 1;
        if *timer == self.required_ticks {
            log::info!("Goal reached, advancing to {:?}", self.next_level);
        }
        if *timer >= self.required_ticks + self.settle_ticks && ctx.next_level.is_empty() {
            *ctx.next_level = self.next_level.clone();
        }
    }

    fn on_exit(&mut self, ctx: &mut ZoneContext<'_>) {
        self.timers.remove(&ctx.body);
    }
}

/// Flips every switch block of a group when a body walks in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchZone {
    pub group: u32,
}

impl ZoneEffect for SwitchZone {
    fn settles_before_movement(&self) -> bool {
        true
    }

    fn on_enter(&mut self, ctx: &mut ZoneContext<'_>) {
        if matches!(ctx.body().kind, BodyKind::Switch { .. }) {
            return;
        }
        for body in ctx.bodies.iter_mut() {
            if let BodyKind::Switch { group, active } = &mut body.kind
                && *group == self.group
            {
                *active = !*active;
            }
        }
        log::debug!("Switch group {} toggled", self.group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        body: BodyId,
        bodies: &'a mut [Body],
        gravity: &'a mut BTreeMap<BodyId, u32>,
        next_level: &'a mut String,
    ) -> ZoneContext<'a> {
        ZoneContext {
            body,
            bodies,
            gravity_suppression: gravity,
            next_level,
        }
    }

    #[test]
    fn test_zone_fires_enter_inside_exit_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        #[derive(Debug, Default)]
        struct Counter {
            calls: Rc<Cell<(u32, u32, u32)>>,
        }
        impl ZoneEffect for Counter {
            fn on_enter(&mut self, _ctx: &mut ZoneContext<'_>) {
                let (e, i, x) = self.calls.get();
                self.calls.set((e + 1, i, x));
            }
            fn on_inside(&mut self, _ctx: &mut ZoneContext<'_>) {
                let (e, i, x) = self.calls.get();
                self.calls.set((e, i + 1, x));
            }
            fn on_exit(&mut self, _ctx: &mut ZoneContext<'_>) {
                let (e, i, x) = self.calls.get();
                self.calls.set((e, i, x + 1));
            }
        }

        let mut bodies = vec![Body::new(Rect::new(0, 0, 5, 5))];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let counter = Counter::default();
        let calls = Rc::clone(&counter.calls);
        let mut zone = Zone::new(Rect::new(0, 0, 10, 10), counter);

        for inside in [true, true, true, false, false] {
            zone.update(inside, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        }
        assert_eq!(calls.get(), (1, 3, 1));
        assert!(!zone.contains(0));
    }

    #[test]
    fn test_overlapping_gravity_zones_stack() {
        let mut bodies = vec![Body::new(Rect::new(0, 0, 5, 5)).with_gravity()];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut a = Zone::new(Rect::new(0, 0, 10, 10), GravityZone);
        let mut b = Zone::new(Rect::new(0, 0, 10, 10), GravityZone);

        a.update(true, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        b.update(true, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(gravity.get(&0), Some(&2));

        a.update(false, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(gravity.get(&0), Some(&1));

        b.update(false, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(gravity.get(&0), None);
    }

    #[test]
    fn test_gravity_counts_are_per_world() {
        let mut bodies = vec![Body::new(Rect::new(0, 0, 5, 5))];
        let mut first = BTreeMap::new();
        let mut second = BTreeMap::new();
        let mut next = String::new();
        let mut zone = Zone::new(Rect::new(0, 0, 10, 10), GravityZone);

        zone.update(true, &mut ctx(0, &mut bodies, &mut first, &mut next));
        assert_eq!(first.get(&0), Some(&1));
        assert!(second.is_empty());

        let mut other = Zone::new(Rect::new(0, 0, 10, 10), GravityZone);
        other.update(true, &mut ctx(0, &mut bodies, &mut second, &mut next));
        assert_eq!(first.get(&0), Some(&1));
        assert_eq!(second.get(&0), Some(&1));
    }

    #[test]
    fn test_growth_stops_at_limit() {
        let mut body = Body::new(Rect::new(0, 10, 10, 10));
        body.update_last_position();
        let mut bodies = vec![body];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut zone = GrowthZone::up_and_right(12, 11);

        for _ in 0..5 {
            zone.on_inside(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        }
        let rect = &bodies[0].rect;
        assert_eq!((rect.width, rect.height), (12, 11));
        assert_eq!((rect.x, rect.y), (0, 9));
        assert_eq!(bodies[0].top_height_delta, 1);
        assert_eq!(bodies[0].right_width_delta(), 2);
    }

    #[test]
    fn test_shrink_stops_at_limit() {
        let mut bodies = vec![Body::new(Rect::new(0, 0, 10, 10))];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut zone = GrowthZone {
            left: -2,
            right: -2,
            top: 0,
            bottom: 0,
            width_limit: 7,
            height_limit: 10,
        };

        zone.on_inside(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        zone.on_inside(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(bodies[0].rect.width, 7);
        assert_eq!(bodies[0].rect.height, 10);
    }

    #[test]
    fn test_limited_never_overshoots() {
        assert_eq!(limited(1, 1, 10, 20), (1, 1));
        assert_eq!(limited(1, 1, 19, 20), (0, 1));
        assert_eq!(limited(3, 0, 19, 20), (1, 0));
        assert_eq!(limited(1, 1, 20, 20), (0, 0));
        assert_eq!(limited(-1, -1, 10, 9), (0, -1));
        assert_eq!(limited(1, 1, 25, 20), (0, 0));
    }

    #[test]
    fn test_goal_requires_player_and_time() {
        let mut bodies = vec![
            Body::new(Rect::new(0, 0, 5, 5)).player(),
            Body::new(Rect::new(0, 0, 5, 5)),
        ];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut zone = Zone::new(Rect::new(0, 0, 10, 10), GoalZone::new("level-2", 3).with_settle(1));

        for _ in 0..10 {
            zone.update(true, &mut ctx(1, &mut bodies, &mut gravity, &mut next));
        }
        assert!(next.is_empty(), "crates do not finish levels");

        for tick in 1..=4 {
            zone.update(true, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
            if tick < 4 {
                assert!(next.is_empty());
            }
        }
        assert_eq!(next, "level-2");
    }

    #[test]
    fn test_goal_timer_resets_on_exit() {
        let mut bodies = vec![Body::new(Rect::new(0, 0, 5, 5)).player()];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut goal = GoalZone::new("next", 3);

        goal.on_enter(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        goal.on_inside(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        goal.on_inside(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(goal.ticks_inside(0), 2);
        assert!(!goal.reached(0));

        goal.on_exit(&mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert_eq!(goal.ticks_inside(0), 0);
        assert!(next.is_empty());
    }

    #[test]
    fn test_switch_toggles_its_group_only() {
        let mut bodies = vec![
            Body::new(Rect::new(0, 0, 5, 5)),
            Body::switch(Rect::new(20, 0, 5, 5), 7, false),
            Body::switch(Rect::new(30, 0, 5, 5), 7, true),
            Body::switch(Rect::new(40, 0, 5, 5), 8, false),
        ];
        let mut gravity = BTreeMap::new();
        let mut next = String::new();
        let mut zone = Zone::new(Rect::new(0, 0, 10, 10), SwitchZone { group: 7 });
        assert!(zone.effect.settles_before_movement());

        zone.update(true, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert!(bodies[1].is_live());
        assert!(!bodies[2].is_live());
        assert!(!bodies[3].is_live());

        // staying inside does not toggle again
        zone.update(true, &mut ctx(0, &mut bodies, &mut gravity, &mut next));
        assert!(bodies[1].is_live());
    }
}
