#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gravitation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative per-level world, and pure systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems such as the ghost recorder consume deterministically. Systems
//! respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical title displayed when the experience boots.
pub const GAME_TITLE: &str = "Gravitation";

/// Palette color marking solid terrain.
pub const SOLID_COLOR: Rgb = Rgb::new(0, 0, 0);
/// Palette color marking open space.
pub const FREE_COLOR: Rgb = Rgb::new(255, 255, 255);
/// Palette color marking the level-complete trigger region.
pub const GOAL_COLOR: Rgb = Rgb::new(0, 0, 255);
/// Palette color marking hazard zones.
pub const HAZARD_COLOR: Rgb = Rgb::new(255, 0, 0);
/// Palette color reserved for future level features. Passable, triggers nothing.
pub const RESERVED_COLOR: Rgb = Rgb::new(0, 255, 0);

/// Opaque RGB color sampled from a level raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Classification assigned to a single level cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// Blocking terrain. Also used for unmatched colors and off-map queries.
    Solid,
    /// Open space the ship may traverse.
    Free,
    /// Trigger region that completes the level on contact.
    Goal,
    /// Hazard zone reported to observers without blocking movement.
    Hazard,
    /// Reserved palette entry that behaves like open space.
    Reserved,
}

impl CellClass {
    /// Maps a palette color onto its classification.
    ///
    /// Only exact palette matches are recognised. Every other color resolves
    /// to [`CellClass::Solid`] so that ambiguous pixels are deadly rather than
    /// passable.
    #[must_use]
    pub fn from_color(color: Rgb) -> Self {
        if color == FREE_COLOR {
            Self::Free
        } else if color == GOAL_COLOR {
            Self::Goal
        } else if color == HAZARD_COLOR {
            Self::Hazard
        } else if color == RESERVED_COLOR {
            Self::Reserved
        } else {
            Self::Solid
        }
    }

    /// Palette color that encodes the classification.
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Solid => SOLID_COLOR,
            Self::Free => FREE_COLOR,
            Self::Goal => GOAL_COLOR,
            Self::Hazard => HAZARD_COLOR,
            Self::Reserved => RESERVED_COLOR,
        }
    }
}

/// Collision flags gathered while scanning a sprite footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FootprintContact {
    /// At least one opaque sprite pixel overlaps solid terrain.
    pub solid: bool,
    /// At least one opaque sprite pixel overlaps the goal region.
    pub goal: bool,
    /// At least one opaque sprite pixel overlaps a hazard zone.
    pub hazard: bool,
}

impl FootprintContact {
    /// Reports whether the footprint touched nothing but open space.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        !self.solid && !self.goal && !self.hazard
    }
}

/// Flight controls held during a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ShipControls {
    /// Main engine is firing.
    pub thrust: bool,
    /// Ship rotates counter-clockwise.
    pub rotate_left: bool,
    /// Ship rotates clockwise.
    pub rotate_right: bool,
}

/// Debounced input snapshot supplied once per tick by the input source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameInput {
    /// Main engine is firing.
    pub thrust: bool,
    /// Ship rotates counter-clockwise.
    pub rotate_left: bool,
    /// Ship rotates clockwise.
    pub rotate_right: bool,
    /// Player requested a fresh attempt on the current level.
    pub reset: bool,
    /// Player requested to abandon the level and return to the menu.
    pub back_to_menu: bool,
}

impl FrameInput {
    const THRUST_BIT: u8 = 0x01;
    const LEFT_BIT: u8 = 0x02;
    const RIGHT_BIT: u8 = 0x04;
    const RESET_BIT: u8 = 0x08;
    const MENU_BIT: u8 = 0x10;

    /// Flight controls carried by the snapshot.
    #[must_use]
    pub const fn controls(&self) -> ShipControls {
        ShipControls {
            thrust: self.thrust,
            rotate_left: self.rotate_left,
            rotate_right: self.rotate_right,
        }
    }

    /// Packs the snapshot into a single tape byte.
    #[must_use]
    pub const fn encode_byte(self) -> u8 {
        (if self.thrust { Self::THRUST_BIT } else { 0 })
            | (if self.rotate_left { Self::LEFT_BIT } else { 0 })
            | (if self.rotate_right { Self::RIGHT_BIT } else { 0 })
            | (if self.reset { Self::RESET_BIT } else { 0 })
            | (if self.back_to_menu { Self::MENU_BIT } else { 0 })
    }

    /// Unpacks a tape byte. Unused high bits are ignored.
    #[must_use]
    pub const fn decode_byte(byte: u8) -> Self {
        Self {
            thrust: byte & Self::THRUST_BIT != 0,
            rotate_left: byte & Self::LEFT_BIT != 0,
            rotate_right: byte & Self::RIGHT_BIT != 0,
            reset: byte & Self::RESET_BIT != 0,
            back_to_menu: byte & Self::MENU_BIT != 0,
        }
    }
}

/// Tunable constants that govern ship flight and collision response.
///
/// All per-tick quantities are expressed against the baseline frame and are
/// scaled by [`FlightTuning::delta_factor`] so that physics stays frame-rate
/// independent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTuning {
    /// Downward acceleration added to vertical velocity every baseline frame.
    pub gravity: f32,
    /// Magnitude of the thrust vector added along the heading.
    pub thrust_power: f32,
    /// Degrees rotated per baseline frame while a direction is held.
    pub rotation_speed: f32,
    /// Lower bound applied to each velocity component.
    pub min_velocity: f32,
    /// Upper bound applied to each velocity component.
    pub max_velocity: f32,
    /// Multiplier applied to both velocity components after a bounce.
    pub bounce_damping: f32,
    /// Largest distance, in pixels, searched for a collision-free pose after rotating.
    pub reposition_radius: u32,
    /// Pixel increment between successive search probes.
    pub reposition_step: u32,
    /// Minimum speed for the velocity direction to steer the search.
    pub reposition_min_speed: f32,
    /// Duration of the baseline frame in microseconds.
    pub baseline_frame_micros: u64,
}

impl FlightTuning {
    /// Duration of the baseline frame that per-tick constants are tuned for.
    #[must_use]
    pub const fn baseline_frame(&self) -> Duration {
        Duration::from_micros(self.baseline_frame_micros)
    }

    /// Converts an elapsed duration into a multiple of the baseline frame.
    #[must_use]
    pub fn delta_factor(&self, dt: Duration) -> f32 {
        let baseline = self.baseline_frame().as_secs_f32();
        if baseline <= 0.0 {
            return 1.0;
        }
        dt.as_secs_f32() / baseline
    }
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self {
            gravity: 0.12,
            thrust_power: 0.25,
            rotation_speed: 6.0,
            min_velocity: -15.0,
            max_velocity: 15.0,
            bounce_damping: 0.5,
            reposition_radius: 25,
            reposition_step: 2,
            reposition_min_speed: 0.1,
            baseline_frame_micros: 16_670,
        }
    }
}

/// Position and heading of an entity in level pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    /// Horizontal coordinate of the entity's logical origin.
    pub x: f32,
    /// Vertical coordinate of the entity's logical origin.
    pub y: f32,
    /// Heading in degrees, normalised to `[0, 360)`. Zero points up.
    pub rotation: f32,
}

impl Pose {
    /// Creates a pose from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32, rotation: f32) -> Self {
        Self { x, y, rotation }
    }
}

/// Single sample of a recorded run.
///
/// Field names match the persisted ghost shape. Coordinates and rotation are
/// stored as floats; integer values written by older clients deserialize
/// without loss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GhostFrame {
    /// Milliseconds elapsed since the recording started.
    pub timestamp: u64,
    /// Horizontal coordinate of the recorded pose.
    pub x: f32,
    /// Vertical coordinate of the recorded pose.
    pub y: f32,
    /// Heading of the recorded pose in degrees.
    pub rotation: f32,
}

impl GhostFrame {
    /// Captures a pose at the provided timestamp.
    #[must_use]
    pub const fn from_pose(timestamp: u64, pose: Pose) -> Self {
        Self {
            timestamp,
            x: pose.x,
            y: pose.y,
            rotation: pose.rotation,
        }
    }

    /// Pose stored in the frame.
    #[must_use]
    pub const fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.rotation)
    }
}

/// Axes whose velocity component is reflected by a bounce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BounceAxes {
    /// Horizontal velocity is negated.
    pub x: bool,
    /// Vertical velocity is negated.
    pub y: bool,
}

impl BounceAxes {
    /// Bounce that reflects both velocity components.
    pub const BOTH: Self = Self { x: true, y: true };

    /// Creates a bounce selection from per-axis flags.
    #[must_use]
    pub const fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }
}

/// Origin of a collision resolved by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionCause {
    /// The ship's logical box left the playfield.
    Boundary,
    /// The ship's footprint overlapped solid terrain.
    Terrain,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the flight controls applied on subsequent ticks.
    SetControls {
        /// Controls held by the player.
        controls: ShipControls,
    },
    /// Returns the ship to its spawn pose and clears level completion.
    ResetShip,
    /// Shows the ghost at the given pose right away, or hides it when absent.
    PoseGhost {
        /// Recorded pose to snap the ghost to.
        pose: Option<Pose>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that the ship's heading changed.
    ShipRotated {
        /// Heading after the rotation, in degrees.
        rotation: f32,
    },
    /// Reports that a rotation pushed the ship to a nearby collision-free pose.
    ShipRepositioned {
        /// Pose before the search moved the ship.
        from: Pose,
        /// Collision-free pose selected by the search.
        to: Pose,
    },
    /// Reports that the ship collided and was rolled back with a bounce.
    ShipBounced {
        /// Velocity components that were reflected.
        axes: BounceAxes,
        /// What the ship collided with.
        cause: CollisionCause,
    },
    /// Reports that the ship's footprint overlapped a hazard zone.
    HazardTouched {
        /// Pose of the ship during the contact.
        pose: Pose,
    },
    /// Confirms the ship's pose after the tick's collision response.
    ShipSettled {
        /// Pose of the ship once the tick resolved.
        pose: Pose,
    },
    /// Announces that the ship reached the goal region.
    LevelCompleted {
        /// Pose of the ship at the moment of contact.
        pose: Pose,
    },
    /// Confirms that the ship returned to its spawn pose.
    ShipReset {
        /// Spawn pose restored by the reset.
        pose: Pose,
    },
}
