//! Window Push headless demo
//!
//! Builds a small level, scripts a few seconds of input and window resizing,
//! and logs what the simulation does. Pass a tuning JSON file as the first
//! argument to try different player feel.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use window_push::consts::GOAL_TICKS;
    use window_push::sim::{
        AttachLayout, Body, GoalZone, GrowthZone, PhysicsSimulator, Rect, TickInput, Viewport,
        World, Zone,
    };
    use window_push::{Tuning, TuningError};

    env_logger::init();
    log::info!("Window Push (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e: TuningError| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let mut viewport = Viewport::new(0, 0, 640, 360);
    let mut world = World::new(viewport);
    world.add_wall(Rect::new(0, 320, 640, 40));
    world.add_wall(Rect::new(400, 316, 60, 4));
    let player = world.add_body(Body::new(Rect::new(40, 296, 16, 24)).with_gravity().player());
    let crate_id = world.add_body(Body::new(Rect::new(120, 288, 32, 32)).with_gravity());
    world.add_zone(Zone::new(Rect::new(200, 200, 80, 120), GrowthZone::up_and_right(48, 48)));
    let goal = world.add_zone(Zone::new(
        Rect::new(0, 0, 1, 8),
        GoalZone::new("level-2", GOAL_TICKS).with_settle(GOAL_TICKS / 2),
    ));
    world.attach(crate_id, goal, AttachLayout::on_top());

    let mut sim = PhysicsSimulator::new(world, tuning);

    for tick in 0..600u32 {
        let input = TickInput {
            right: tick < 240,
            jump: (250..262).contains(&tick),
            ..Default::default()
        };
        // squeeze the window from the east for a while, then let it go
        let target = if (300..400).contains(&tick) {
            Viewport {
                width: viewport.width - 2,
                ..viewport
            }
        } else {
            viewport
        };

        let deltas = sim.step(&input, target);
        viewport = viewport.resized(&deltas);

        if tick % 30 == 0 {
            let p = &sim.world.bodies[player].rect;
            let c = &sim.world.bodies[crate_id].rect;
            log::info!(
                "tick {tick}: player ({}, {}) crate ({}, {}) {}x{} viewport {:?}",
                p.x,
                p.y,
                c.x,
                c.y,
                c.width,
                c.height,
                viewport
            );
        }

        if let Some(level) = sim.world.take_next_level() {
            log::info!("Level complete after {} ticks, next: {level}", sim.time_ticks);
            break;
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // the library is driven by the host page on the web
}
