//! Window Push - physics core for a puzzle-platformer with a collidable window
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, bodies, zones, collision propagation, tick)
//! - `tuning`: Data-driven player-feel parameters

pub mod sim;
pub mod tuning;

pub use sim::{
    Body, BodyId, BodyKind, CollisionPropagator, Edge, EdgeDeltas, PhysicsSimulator, Rect,
    ResizePolicy, TickInput, Viewport, World,
};
pub use tuning::{Tuning, TuningError};

/// Simulation constants
pub mod consts {
    /// Horizontal velocity cap (pixels per tick)
    pub const MAX_X_VELOCITY: i32 = 10;
    /// Vertical velocity cap (pixels per tick)
    pub const MAX_Y_VELOCITY: i32 = 20;

    /// Largest horizontal push still treated as a sliver
    pub const SLIVER_X: i32 = 4;
    /// Largest step-up a sliver fudge may apply
    pub const SLIVER_Y: i32 = 5;

    /// Thickness of the slab standing in for each window edge.
    /// Must exceed anything a single tick can push through it.
    pub const SIDE_THICKNESS: i32 = 4096;

    /// Default tuning values
    pub const HORIZONTAL_ACCEL: i32 = 2;
    pub const FRICTION: i32 = 1;
    pub const GRAVITY: i32 = 1;
    pub const JUMP_VELOCITY: i32 = -14;
    /// Upward speed kept when jump is released early
    pub const JUMP_CAP: i32 = -4;

    /// Ticks a player must stay inside a goal before the level advances (1 second at 60 Hz)
    pub const GOAL_TICKS: u32 = 60;
}
