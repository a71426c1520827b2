//! Moving rectangles: player, crates, switch blocks and the window edges
//!
//! Every body lives in the `World` arena and is addressed by its index.
//! Kind-specific behavior is exposed through capability queries
//! (`can_push_x`, `interacts_with`, `is_live`, ...) so the propagator never
//! branches on the concrete kind.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::rect::{Bounds, Edge, Rect, ResizePolicy};
use crate::consts::*;

/// Arena handle of a body
pub type BodyId = usize;

/// What a body stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Ordinary pushable rectangle (player, crate)
    Block,
    /// Slab standing in for a window edge
    Side { edge: Edge, acting_as_wall: bool },
    /// Block that only exists while its group is switched on
    Switch { group: u32, active: bool },
}

/// A rectangle with velocity and per-frame motion bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub rect: Rect,
    pub vel: IVec2,
    pub has_gravity: bool,
    pub controlled_by_player: bool,
    pub grounded: bool,
    /// Set whenever the body moved or resized this frame
    pub has_moved: bool,
    /// Part of this frame's width change applied to the left edge
    pub left_width_delta: i32,
    /// Part of this frame's height change applied to the top edge
    pub top_height_delta: i32,
    pub kind: BodyKind,
}

impl Body {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            vel: IVec2::ZERO,
            has_gravity: false,
            controlled_by_player: false,
            grounded: false,
            has_moved: false,
            left_width_delta: 0,
            top_height_delta: 0,
            kind: BodyKind::Block,
        }
    }

    /// A window-edge slab
    pub fn side(edge: Edge, bounds: Bounds) -> Self {
        Self {
            kind: BodyKind::Side {
                edge,
                acting_as_wall: false,
            },
            ..Self::new(Rect::from_bounds(bounds))
        }
    }

    /// A switch block belonging to `group`
    pub fn switch(rect: Rect, group: u32, active: bool) -> Self {
        Self {
            kind: BodyKind::Switch { group, active },
            ..Self::new(rect)
        }
    }

    pub fn with_gravity(mut self) -> Self {
        self.has_gravity = true;
        self
    }

    pub fn player(mut self) -> Self {
        self.controlled_by_player = true;
        self
    }

    pub fn with_velocity(mut self, vel: IVec2) -> Self {
        self.set_velocity(vel);
        self
    }

    /// Start a new frame: snapshot geometry and clear per-frame bookkeeping
    pub fn update_last_position(&mut self) {
        self.rect.update_last_position();
        self.has_moved = false;
        self.left_width_delta = 0;
        self.top_height_delta = 0;
    }

    /// Whether the body currently takes part in collisions
    pub fn is_live(&self) -> bool {
        match self.kind {
            BodyKind::Switch { active, .. } => active,
            _ => true,
        }
    }

    pub fn is_side(&self) -> bool {
        matches!(self.kind, BodyKind::Side { .. })
    }

    pub fn side_edge(&self) -> Option<Edge> {
        match self.kind {
            BodyKind::Side { edge, .. } => Some(edge),
            _ => None,
        }
    }

    /// Window edge temporarily behaving as an immovable wall
    pub fn acts_as_wall(&self) -> bool {
        matches!(
            self.kind,
            BodyKind::Side {
                acting_as_wall: true,
                ..
            }
        )
    }

    pub fn set_acting_as_wall(&mut self, value: bool) {
        if let BodyKind::Side { acting_as_wall, .. } = &mut self.kind {
            *acting_as_wall = value;
        }
    }

    /// North/South edges never push sideways
    pub fn can_push_x(&self) -> bool {
        self.side_edge().is_none_or(Edge::moves_along_x)
    }

    /// West/East edges never push vertically
    pub fn can_push_y(&self) -> bool {
        self.side_edge().is_none_or(|edge| !edge.moves_along_x())
    }

    /// Solidity of this body toward something with the given policy.
    /// Only window edges are selective.
    pub fn interacts_with(&self, policy: ResizePolicy, other_is_side: bool) -> bool {
        let Some(edge) = self.side_edge() else {
            return true;
        };
        if other_is_side {
            return false;
        }
        match policy {
            ResizePolicy::Move => true,
            ResizePolicy::Stay => false,
            ResizePolicy::PreventX => edge.moves_along_x(),
            ResizePolicy::PreventY => !edge.moves_along_x(),
        }
    }

    /// Both directions of `interacts_with`
    pub fn interacts_with_body(&self, other: &Body) -> bool {
        self.interacts_with(other.rect.policy, other.is_side())
            && other.interacts_with(self.rect.policy, self.is_side())
    }

    /// Set velocity, clamped to the caps
    pub fn set_velocity(&mut self, vel: IVec2) {
        self.vel = IVec2::new(
            vel.x.clamp(-MAX_X_VELOCITY, MAX_X_VELOCITY),
            vel.y.clamp(-MAX_Y_VELOCITY, MAX_Y_VELOCITY),
        );
    }

    /// Re-clamp velocity and move by it
    pub fn apply_velocity(&mut self) {
        self.set_velocity(self.vel);
        self.translate(self.vel);
    }

    /// Plain translation, no velocity side effects
    pub fn translate(&mut self, delta: IVec2) {
        if delta != IVec2::ZERO {
            self.rect.translate(delta);
            self.has_moved = true;
        }
    }

    /// Place the body at new bounds (window edges following the viewport)
    pub fn set_bounds(&mut self, bounds: Bounds) {
        if bounds != self.rect.bounds() {
            self.rect.set_bounds(bounds);
            self.has_moved = true;
        }
    }

    /// Move as the result of a collision. A push against the current
    /// velocity on an axis stops the body on that axis; an upward push
    /// means it is standing on something.
    pub fn move_collision(&mut self, delta: IVec2) {
        self.translate(delta);
        if delta.x != 0 && delta.x.signum() == -self.vel.x.signum() {
            self.vel.x = 0;
        }
        if delta.y != 0 && delta.y.signum() == -self.vel.y.signum() {
            self.vel.y = 0;
        }
        if delta.y < 0 {
            self.grounded = true;
        }
    }

    /// Grow (or shrink, with negative values) each edge outward
    pub fn grow(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        if left == 0 && right == 0 && top == 0 && bottom == 0 {
            return;
        }
        self.rect.x -= left;
        self.rect.width += left + right;
        self.rect.y -= top;
        self.rect.height += top + bottom;
        self.left_width_delta += left;
        self.top_height_delta += top;
        self.has_moved = true;
    }

    /// This frame's growth of the right edge
    #[inline]
    pub fn right_width_delta(&self) -> i32 {
        self.rect.width - self.rect.last_width - self.left_width_delta
    }

    /// This frame's growth of the bottom edge
    #[inline]
    pub fn bottom_height_delta(&self) -> i32 {
        self.rect.height - self.rect.last_height - self.top_height_delta
    }

    /// Absorb a collision push into this frame's growth of the edge facing
    /// the pusher, shrinking that edge back. Returns the movement left over
    /// after the absorption.
    pub fn correct_growth_for_collision(&mut self, movement: IVec2) -> IVec2 {
        let mut residual = movement;

        if movement.x > 0 {
            let absorbed = movement.x.min(self.left_width_delta.max(0));
            if absorbed > 0 {
                self.rect.x += absorbed;
                self.rect.width -= absorbed;
                self.left_width_delta -= absorbed;
                residual.x -= absorbed;
            }
        } else if movement.x < 0 {
            let absorbed = (-movement.x).min(self.right_width_delta().max(0));
            if absorbed > 0 {
                self.rect.width -= absorbed;
                residual.x += absorbed;
            }
        }

        if movement.y > 0 {
            let absorbed = movement.y.min(self.top_height_delta.max(0));
            if absorbed > 0 {
                self.rect.y += absorbed;
                self.rect.height -= absorbed;
                self.top_height_delta -= absorbed;
                residual.y -= absorbed;
            }
        } else if movement.y < 0 {
            let absorbed = (-movement.y).min(self.bottom_height_delta().max(0));
            if absorbed > 0 {
                self.rect.height -= absorbed;
                residual.y += absorbed;
            }
        }

        if residual != movement {
            self.has_moved = true;
        }
        residual
    }
}
