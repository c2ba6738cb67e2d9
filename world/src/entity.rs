//! Entity components and the two entity kinds living in a level.

use glam::Vec2;
use gravitation_core::{BounceAxes, FlightTuning, FootprintContact, Pose};

use crate::{
    collision,
    level::LevelMap,
    sprite::{Sprite, SpriteMask},
};

/// Capability shared by every entity: advance its own state by one tick.
pub trait Entity {
    /// Advances the entity by `delta` baseline frames.
    fn update(&mut self, delta: f32);
}

/// Position and heading of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    position: Vec2,
    rotation: f32,
}

impl Transform {
    /// Creates a transform, normalising the heading into `[0, 360)`.
    #[must_use]
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation: normalize_degrees(rotation),
        }
    }

    /// Logical origin of the entity.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Heading in degrees within `[0, 360)`.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Moves the logical origin.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Replaces the heading, normalising it into `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(degrees);
    }

    /// Adds `delta` degrees to the heading.
    pub fn rotate(&mut self, delta: f32) {
        self.set_rotation(self.rotation + delta);
    }

    /// Snapshot of the transform as a pose.
    #[must_use]
    pub const fn pose(&self) -> Pose {
        Pose::new(self.position.x, self.position.y, self.rotation)
    }
}

fn normalize_degrees(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Velocity plus the rollback memory used by collision response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsState {
    velocity: Vec2,
    min_velocity: f32,
    max_velocity: f32,
    previous_position: Vec2,
}

impl PhysicsState {
    /// Creates a resting body whose velocity components are bounded by `[min, max]`.
    #[must_use]
    pub const fn new(min_velocity: f32, max_velocity: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            min_velocity,
            max_velocity,
            previous_position: Vec2::ZERO,
        }
    }

    /// Current velocity in pixels per baseline frame.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replaces the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Adds `delta` to the velocity.
    pub fn add_velocity(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Clamps each velocity component to the configured bounds.
    pub fn clamp_velocity(&mut self) {
        self.velocity = Vec2::new(
            self.velocity.x.max(self.min_velocity).min(self.max_velocity),
            self.velocity.y.max(self.min_velocity).min(self.max_velocity),
        );
    }

    /// Position cached immediately before the last integration step.
    #[must_use]
    pub const fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    /// Caches the pre-integration position, then moves `transform` along the velocity.
    pub fn integrate(&mut self, transform: &mut Transform, delta: f32) {
        self.previous_position = transform.position();
        transform.set_position(transform.position() + self.velocity * delta);
    }
}

/// Player-controlled ship.
#[derive(Clone, Debug)]
pub struct Ship {
    transform: Transform,
    physics: PhysicsState,
    sprite: Sprite,
    spawn: Vec2,
    gravity: f32,
    thrust_power: f32,
}

impl Ship {
    /// Creates a ship resting at `spawn` with heading zero.
    #[must_use]
    pub fn new(sprite: SpriteMask, spawn: Vec2, tuning: &FlightTuning) -> Self {
        let mut ship = Self {
            transform: Transform::default(),
            physics: PhysicsState::new(tuning.min_velocity, tuning.max_velocity),
            sprite: Sprite::new(sprite),
            spawn,
            gravity: tuning.gravity,
            thrust_power: tuning.thrust_power,
        };
        ship.reset_to_spawn();
        ship
    }

    /// Returns the ship to its spawn position at rest with heading zero.
    pub fn reset_to_spawn(&mut self) {
        self.transform = Transform::new(self.spawn, 0.0);
        self.physics.set_velocity(Vec2::ZERO);
        self.sprite.set_rotation(0.0);
    }

    /// Current transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Current physics state.
    #[must_use]
    pub const fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    /// Current sprite.
    #[must_use]
    pub const fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    /// Adds the thrust vector along the current heading.
    pub fn apply_thrust(&mut self, delta: f32) {
        let (sin, cos) = self.transform.rotation().to_radians().sin_cos();
        // Heading zero points up, so the thrust vector is (sin, -cos) in y-down space.
        self.physics
            .add_velocity(Vec2::new(sin, -cos) * self.thrust_power * delta);
    }

    /// Rotates the ship by `degrees` and refreshes its rotated mask.
    pub fn rotate(&mut self, degrees: f32) {
        self.transform.rotate(degrees);
        self.sprite.set_rotation(self.transform.rotation());
    }

    /// Moves the logical origin without touching the rollback memory.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.set_position(position);
    }

    /// Applies a bounce response using the ship's rollback memory.
    pub fn bounce(&mut self, axes: BounceAxes, damping: f32) {
        collision::bounce(&mut self.physics, &mut self.transform, axes, damping);
    }

    /// Clamps velocity to the configured bounds.
    pub fn clamp_velocity(&mut self) {
        self.physics.clamp_velocity();
    }

    /// Scans the current rotated mask against `map` as if the ship stood at `position`.
    #[must_use]
    pub fn contact_at(&self, map: &LevelMap, position: Vec2) -> FootprintContact {
        let (origin_x, origin_y) = self.sprite.footprint_origin(position);
        map.check_footprint(self.sprite.current(), origin_x, origin_y)
    }
}

impl Entity for Ship {
    fn update(&mut self, delta: f32) {
        self.physics.add_velocity(Vec2::new(0.0, self.gravity * delta));
        self.physics.integrate(&mut self.transform, delta);
    }
}

/// Translucent replay of a previous run, driven entirely by recorded poses.
#[derive(Clone, Debug)]
pub struct Ghost {
    transform: Transform,
    sprite: Sprite,
    target: Option<Pose>,
    visible: bool,
}

impl Ghost {
    /// Alpha applied by renderers when drawing the ghost.
    pub const ALPHA: u8 = 128;

    /// Creates a hidden ghost sharing the ship's base mask.
    #[must_use]
    pub fn new(sprite: SpriteMask) -> Self {
        Self {
            transform: Transform::default(),
            sprite: Sprite::new(sprite),
            target: None,
            visible: false,
        }
    }

    /// Stages the recorded pose to display, or hides the ghost when absent.
    pub fn stage(&mut self, pose: Option<Pose>) {
        self.target = pose;
    }

    /// Whether the ghost should be drawn.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Current sprite.
    #[must_use]
    pub const fn sprite(&self) -> &Sprite {
        &self.sprite
    }
}

impl Entity for Ghost {
    fn update(&mut self, _delta: f32) {
        match self.target {
            Some(pose) => {
                self.transform = Transform::new(Vec2::new(pose.x, pose.y), pose.rotation);
                self.sprite.set_rotation(self.transform.rotation());
                self.visible = true;
            }
            None => self.visible = false,
        }
    }
}
