//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep, integer pixels only
//! - Stable iteration order (arena index, ordered maps)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod rect;
pub mod state;
pub mod tick;
pub mod zone;

pub use body::{Body, BodyId, BodyKind};
pub use collision::{Collider, CollisionPropagator, Correction, calculate_collision, collapse_to_one_axis};
pub use rect::{AttachLayout, Attachment, Bounds, Edge, Rect, ResizePolicy};
pub use state::{EdgeDeltas, Viewport, World, side_bounds};
pub use tick::{PhysicsSimulator, TickInput};
pub use zone::{GoalZone, GravityZone, GrowthZone, SwitchZone, Zone, ZoneContext, ZoneEffect};
