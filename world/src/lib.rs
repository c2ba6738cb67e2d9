#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-level world state for Gravitation.
//!
//! A [`World`] owns the level map, the player ship and the ghost for a single
//! level attempt. Adapters mutate it exclusively through [`apply`] and read it
//! through the [`query`] module.

mod collision;
mod entity;
mod level;
mod sprite;

use glam::Vec2;
use gravitation_core::{Command, Event, FlightTuning, ShipControls};
use tracing::{debug, info};

pub use collision::{bounce, find_safe_position, resolve, Resolution, COMPASS_DEGREES};
pub use entity::{Entity, Ghost, PhysicsState, Ship, Transform};
pub use level::{LevelMap, LevelMapError};
pub use sprite::{Sprite, SpriteMask, SpriteMaskError};

/// Everything required to build a world for one level.
#[derive(Clone, Debug)]
pub struct LevelSetup {
    /// Classified collision map of the level.
    pub map: LevelMap,
    /// Base alpha mask shared by the ship and its ghost.
    pub sprite: SpriteMask,
    /// Logical origin the ship spawns at and resets to.
    pub spawn: Vec2,
    /// Flight constants used for the level.
    pub tuning: FlightTuning,
}

/// Authoritative state of a single level attempt.
#[derive(Debug)]
pub struct World {
    map: LevelMap,
    ship: Ship,
    ghost: Ghost,
    tuning: FlightTuning,
    controls: ShipControls,
    level_completed: bool,
    tick_index: u64,
}

impl World {
    /// Creates a world with the ship resting at its spawn point.
    #[must_use]
    pub fn new(setup: LevelSetup) -> Self {
        let LevelSetup {
            map,
            sprite,
            spawn,
            tuning,
        } = setup;
        let (width, height) = map.dimensions();
        info!(width, height, x = spawn.x, y = spawn.y, "level loaded");

        Self {
            ship: Ship::new(sprite.clone(), spawn, &tuning),
            ghost: Ghost::new(sprite),
            map,
            tuning,
            controls: ShipControls::default(),
            level_completed: false,
            tick_index: 0,
        }
    }

    fn bounds(&self) -> Vec2 {
        let (width, height) = self.map.dimensions();
        Vec2::new(width as f32, height as f32)
    }

    fn fly(&mut self, delta: f32, out_events: &mut Vec<Event>) {
        if self.controls.thrust {
            self.ship.apply_thrust(delta);
        }

        let direction = if self.controls.rotate_left {
            -1.0
        } else if self.controls.rotate_right {
            1.0
        } else {
            0.0
        };
        if direction != 0.0 {
            self.ship.rotate(direction * self.tuning.rotation_speed * delta);
            out_events.push(Event::ShipRotated {
                rotation: self.ship.transform().rotation(),
            });
            self.reposition_after_rotation(out_events);
        }

        self.ship.update(delta);

        let resolution = resolve(
            self.ship.physics().previous_position(),
            self.ship.transform().position(),
            self.ship.sprite().extent(),
            self.bounds(),
            |position| self.ship.contact_at(&self.map, position),
        );

        match resolution {
            Resolution::GoalReached => {
                let pose = self.ship.transform().pose();
                self.level_completed = true;
                info!(x = pose.x, y = pose.y, tick = self.tick_index, "level completed");
                out_events.push(Event::ShipSettled { pose });
                out_events.push(Event::LevelCompleted { pose });
                return;
            }
            Resolution::Collided { axes, cause } => {
                self.ship.bounce(axes, self.tuning.bounce_damping);
                debug!(?axes, ?cause, tick = self.tick_index, "ship bounced");
                out_events.push(Event::ShipBounced { axes, cause });
            }
            Resolution::Accepted { hazard } => {
                if hazard {
                    out_events.push(Event::HazardTouched {
                        pose: self.ship.transform().pose(),
                    });
                }
            }
        }

        self.ship.clamp_velocity();
        out_events.push(Event::ShipSettled {
            pose: self.ship.transform().pose(),
        });
    }

    fn reposition_after_rotation(&mut self, out_events: &mut Vec<Event>) {
        let origin = self.ship.transform().position();
        if !self.ship.contact_at(&self.map, origin).solid {
            return;
        }

        let found = find_safe_position(
            origin,
            self.ship.physics().velocity(),
            &self.tuning,
            |candidate| self.ship.contact_at(&self.map, candidate).solid,
        );

        match found {
            Some(position) => {
                let from = self.ship.transform().pose();
                self.ship.set_position(position);
                let to = self.ship.transform().pose();
                debug!(?from, ?to, "ship repositioned after rotation");
                out_events.push(Event::ShipRepositioned { from, to });
            }
            None => debug!(x = origin.x, y = origin.y, "no safe position after rotation"),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            let delta = world.tuning.delta_factor(dt);
            world.ghost.update(delta);
            if !world.level_completed {
                world.fly(delta, out_events);
            }
        }
        Command::SetControls { controls } => {
            if !world.level_completed {
                world.controls = controls;
            }
        }
        Command::ResetShip => {
            world.ship.reset_to_spawn();
            world.controls = ShipControls::default();
            world.level_completed = false;
            out_events.push(Event::ShipReset {
                pose: world.ship.transform().pose(),
            });
        }
        Command::PoseGhost { pose } => {
            world.ghost.stage(pose);
            world.ghost.update(0.0);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use gravitation_core::{Pose, ShipControls};

    use super::{LevelMap, SpriteMask, World};

    /// Rotated ship mask together with its top-left corner in level pixels.
    #[derive(Clone, Copy, Debug)]
    pub struct Footprint<'a> {
        /// Left edge of the rotated mask.
        pub origin_x: i64,
        /// Top edge of the rotated mask.
        pub origin_y: i64,
        /// Mask rotated to the ship's heading.
        pub mask: &'a SpriteMask,
    }

    /// Current pose of the ship.
    #[must_use]
    pub fn ship_pose(world: &World) -> Pose {
        world.ship.transform().pose()
    }

    /// Current velocity of the ship in pixels per baseline frame.
    #[must_use]
    pub fn ship_velocity(world: &World) -> Vec2 {
        world.ship.physics().velocity()
    }

    /// Rotated mask of the ship placed in level coordinates.
    #[must_use]
    pub fn ship_footprint(world: &World) -> Footprint<'_> {
        let sprite = world.ship.sprite();
        let (origin_x, origin_y) = sprite.footprint_origin(world.ship.transform().position());
        Footprint {
            origin_x,
            origin_y,
            mask: sprite.current(),
        }
    }

    /// Pose the ghost is displayed at, or `None` while it is hidden.
    #[must_use]
    pub fn ghost_pose(world: &World) -> Option<Pose> {
        world
            .ghost
            .is_visible()
            .then(|| world.ghost.transform().pose())
    }

    /// Reports whether the ship has reached the goal.
    #[must_use]
    pub fn level_completed(world: &World) -> bool {
        world.level_completed
    }

    /// Width and height of the level in pixels.
    #[must_use]
    pub fn level_dimensions(world: &World) -> (u32, u32) {
        world.map.dimensions()
    }

    /// Collision map of the level.
    #[must_use]
    pub fn level_map(world: &World) -> &LevelMap {
        &world.map
    }

    /// Flight controls applied on the next tick.
    #[must_use]
    pub fn controls(world: &World) -> ShipControls {
        world.controls
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravitation_core::{
        BounceAxes, CollisionCause, Pose, Rgb, FREE_COLOR, GOAL_COLOR, HAZARD_COLOR, SOLID_COLOR,
    };

    const SIZE: u32 = 40;

    /// Builds a square level where `paint` decides each pixel's color.
    fn level(paint: impl Fn(u32, u32) -> Rgb) -> LevelMap {
        let pixels: Vec<Rgb> = (0..SIZE)
            .flat_map(|y| (0..SIZE).map(move |x| (x, y)))
            .map(|(x, y)| paint(x, y))
            .collect();
        LevelMap::from_pixels(SIZE, SIZE, &pixels).expect("valid level")
    }

    fn world_with(map: LevelMap, spawn: Vec2, tuning: FlightTuning) -> World {
        World::new(LevelSetup {
            map,
            sprite: SpriteMask::filled(4, 4),
            spawn,
            tuning,
        })
    }

    fn tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        let dt = world.tuning.baseline_frame();
        apply(world, Command::Tick { dt }, &mut events);
        events
    }

    fn set_controls(world: &mut World, controls: ShipControls) {
        let mut events = Vec::new();
        apply(world, Command::SetControls { controls }, &mut events);
        assert!(events.is_empty());
    }

    fn weightless() -> FlightTuning {
        FlightTuning {
            gravity: 0.0,
            thrust_power: 1.0,
            ..FlightTuning::default()
        }
    }

    #[test]
    fn new_world_rests_at_spawn() {
        let world = world_with(level(|_, _| FREE_COLOR), Vec2::new(5.0, 6.0), FlightTuning::default());
        assert_eq!(query::ship_pose(&world), Pose::new(5.0, 6.0, 0.0));
        assert_eq!(query::ship_velocity(&world), Vec2::ZERO);
        assert_eq!(query::ghost_pose(&world), None);
        assert!(!query::level_completed(&world));
        assert_eq!(query::level_dimensions(&world), (SIZE, SIZE));
    }

    #[test]
    fn tick_applies_gravity_and_settles() {
        let mut world = world_with(level(|_, _| FREE_COLOR), Vec2::new(10.0, 10.0), FlightTuning::default());
        let events = tick(&mut world);

        let pose = query::ship_pose(&world);
        assert!((pose.y - 10.12).abs() < 1e-4);
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: world.tuning.baseline_frame()
                },
                Event::ShipSettled { pose },
            ]
        );
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn thrust_into_ceiling_rolls_back_and_reflects() {
        let map = level(|_, y| if y <= 9 { SOLID_COLOR } else { FREE_COLOR });
        let mut world = world_with(map, Vec2::new(10.0, 10.0), weightless());
        set_controls(
            &mut world,
            ShipControls {
                thrust: true,
                ..ShipControls::default()
            },
        );

        let events = tick(&mut world);

        assert_eq!(query::ship_pose(&world), Pose::new(10.0, 10.0, 0.0));
        let velocity = query::ship_velocity(&world);
        assert_eq!(velocity.x, 0.0);
        assert!((velocity.y - 0.5).abs() < 1e-6);
        assert!(events.contains(&Event::ShipBounced {
            axes: BounceAxes::new(false, true),
            cause: CollisionCause::Terrain,
        }));
    }

    #[test]
    fn leaving_the_playfield_bounces_off_the_boundary() {
        let spawn = Vec2::new(10.0, SIZE as f32 - 4.05);
        let mut world = world_with(level(|_, _| FREE_COLOR), spawn, FlightTuning::default());

        let events = tick(&mut world);

        assert!(events.contains(&Event::ShipBounced {
            axes: BounceAxes::new(false, true),
            cause: CollisionCause::Boundary,
        }));
        let pose = query::ship_pose(&world);
        assert_eq!((pose.x, pose.y), (spawn.x, spawn.y));
        assert!((query::ship_velocity(&world).y + 0.06).abs() < 1e-6);
    }

    #[test]
    fn left_rotation_wins_over_right() {
        let mut world = world_with(level(|_, _| FREE_COLOR), Vec2::new(20.0, 20.0), weightless());
        set_controls(
            &mut world,
            ShipControls {
                rotate_left: true,
                rotate_right: true,
                ..ShipControls::default()
            },
        );

        let events = tick(&mut world);

        assert!(events.contains(&Event::ShipRotated { rotation: 354.0 }));
        assert_eq!(query::ship_pose(&world).rotation, 354.0);
    }

    #[test]
    fn rotating_into_terrain_repositions_the_ship() {
        // A 10x2 bar rotated upright grows above and below its logical row.
        let map = level(|_, y| if y >= 16 { SOLID_COLOR } else { FREE_COLOR });
        let mut world = World::new(LevelSetup {
            map,
            sprite: SpriteMask::filled(10, 2),
            spawn: Vec2::new(10.0, 12.0),
            tuning: weightless(),
        });
        set_controls(
            &mut world,
            ShipControls {
                rotate_right: true,
                ..ShipControls::default()
            },
        );
        let mut events = Vec::new();
        for _ in 0..15 {
            events.extend(tick(&mut world));
        }

        assert_eq!(query::ship_pose(&world).rotation, 90.0);
        let from_to = events.iter().find_map(|event| match event {
            Event::ShipRepositioned { from, to } => Some((*from, *to)),
            _ => None,
        });
        let (from, to) = from_to.expect("ship was pushed out of the floor");
        assert!(to.y < from.y);

        let footprint = query::ship_footprint(&world);
        let contact = query::level_map(&world).check_footprint(
            footprint.mask,
            footprint.origin_x,
            footprint.origin_y,
        );
        assert!(!contact.solid);
    }

    #[test]
    fn goal_contact_completes_the_level_and_freezes_input() {
        let map = level(|_, y| if y >= 19 { GOAL_COLOR } else { FREE_COLOR });
        let mut world = world_with(map, Vec2::new(10.0, 15.9), FlightTuning::default());

        let events = tick(&mut world);

        assert!(query::level_completed(&world));
        let pose = query::ship_pose(&world);
        assert_eq!(
            &events[1..],
            &[Event::ShipSettled { pose }, Event::LevelCompleted { pose }]
        );

        set_controls(
            &mut world,
            ShipControls {
                thrust: true,
                ..ShipControls::default()
            },
        );
        assert_eq!(query::controls(&world), ShipControls::default());
        let frozen = tick(&mut world);
        assert_eq!(frozen.len(), 1);
        assert_eq!(query::ship_pose(&world), pose);
    }

    #[test]
    fn hazard_contact_is_reported() {
        let map = level(|x, _| if x >= 12 { HAZARD_COLOR } else { FREE_COLOR });
        let mut world = world_with(map, Vec2::new(10.0, 10.0), FlightTuning::default());

        let events = tick(&mut world);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HazardTouched { .. })));
        assert!(!query::level_completed(&world));
    }

    #[test]
    fn reset_restores_spawn_and_clears_completion() {
        let map = level(|_, y| if y >= 19 { GOAL_COLOR } else { FREE_COLOR });
        let mut world = world_with(map, Vec2::new(10.0, 15.9), FlightTuning::default());
        let _ = tick(&mut world);
        assert!(query::level_completed(&world));

        let mut events = Vec::new();
        apply(&mut world, Command::ResetShip, &mut events);

        assert_eq!(
            events,
            vec![Event::ShipReset {
                pose: Pose::new(10.0, 15.9, 0.0)
            }]
        );
        assert!(!query::level_completed(&world));
        assert_eq!(query::ship_velocity(&world), Vec2::ZERO);
    }

    #[test]
    fn ghost_pose_is_shown_as_soon_as_it_is_posed() {
        let mut world = world_with(level(|_, _| FREE_COLOR), Vec2::new(10.0, 10.0), FlightTuning::default());
        let mut events = Vec::new();
        let staged = Pose::new(3.0, 4.0, 90.0);
        apply(&mut world, Command::PoseGhost { pose: Some(staged) }, &mut events);
        assert_eq!(query::ghost_pose(&world), Some(staged));

        let _ = tick(&mut world);
        assert_eq!(query::ghost_pose(&world), Some(staged), "ghost holds its pose");

        apply(&mut world, Command::PoseGhost { pose: None }, &mut events);
        assert_eq!(query::ghost_pose(&world), None);
        assert!(events.is_empty());
    }

    #[test]
    fn boxed_in_ship_keeps_rotation_and_position() {
        // The only open cells are a 10x2 pocket around the bar.
        let map = level(|x, y| {
            if (10..20).contains(&x) && (12..14).contains(&y) {
                FREE_COLOR
            } else {
                SOLID_COLOR
            }
        });
        let mut world = World::new(LevelSetup {
            map,
            sprite: SpriteMask::filled(10, 2),
            spawn: Vec2::new(10.0, 12.0),
            tuning: weightless(),
        });
        set_controls(
            &mut world,
            ShipControls {
                rotate_right: true,
                ..ShipControls::default()
            },
        );

        let mut events = Vec::new();
        for _ in 0..15 {
            events.extend(tick(&mut world));
        }

        assert_eq!(query::ship_pose(&world), Pose::new(10.0, 12.0, 90.0));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ShipRepositioned { .. })));
        assert!(events.contains(&Event::ShipRotated { rotation: 90.0 }));
    }

    #[test]
    fn velocity_is_clamped_after_resolution() {
        let tuning = FlightTuning {
            gravity: 20.0,
            ..FlightTuning::default()
        };
        let mut world = world_with(level(|_, _| FREE_COLOR), Vec2::new(10.0, 0.0), tuning);

        let _ = tick(&mut world);

        assert_eq!(query::ship_velocity(&world).y, 15.0);
    }
}
