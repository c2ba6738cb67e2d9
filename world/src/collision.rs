//! Collision resolution and rotation-time repositioning.

use glam::Vec2;
use gravitation_core::{BounceAxes, CollisionCause, FlightTuning, FootprintContact};

use crate::entity::{PhysicsState, Transform};

/// Compass headings, in degrees, probed by the expanding-ring search.
pub const COMPASS_DEGREES: [f32; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

/// Outcome of resolving one integration step against the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The new position stands.
    Accepted {
        /// The footprint overlapped a hazard zone.
        hazard: bool,
    },
    /// The footprint reached the goal region; physics halts for the tick.
    GoalReached,
    /// The move must be rolled back with a bounce.
    Collided {
        /// Velocity components to reflect.
        axes: BounceAxes,
        /// What the ship ran into.
        cause: CollisionCause,
    },
}

/// Decides how the move from `previous` to `current` resolves.
///
/// `extent` is the entity's unrotated size and `bounds` the playfield size;
/// the boundary test uses the logical box while terrain uses `probe`, which
/// scans the footprint as if the entity stood at the given position.
///
/// Goal contact wins over everything else. Boundary crossings bounce on each
/// crossed axis. For terrain, an axis bounces when reverting that axis alone
/// clears the collision; when neither single-axis reversion helps, both bounce.
pub fn resolve<F>(previous: Vec2, current: Vec2, extent: Vec2, bounds: Vec2, probe: F) -> Resolution
where
    F: Fn(Vec2) -> FootprintContact,
{
    let contact = probe(current);
    if contact.goal {
        return Resolution::GoalReached;
    }

    let crossed_x = current.x < 0.0 || current.x + extent.x > bounds.x;
    let crossed_y = current.y < 0.0 || current.y + extent.y > bounds.y;
    if crossed_x || crossed_y {
        return Resolution::Collided {
            axes: BounceAxes::new(crossed_x, crossed_y),
            cause: CollisionCause::Boundary,
        };
    }

    if !contact.solid {
        return Resolution::Accepted {
            hazard: contact.hazard,
        };
    }

    let x_reverted_clear = !probe(Vec2::new(previous.x, current.y)).solid;
    let y_reverted_clear = !probe(Vec2::new(current.x, previous.y)).solid;
    let axes = match (x_reverted_clear, y_reverted_clear) {
        (false, false) => BounceAxes::BOTH,
        (x, y) => BounceAxes::new(x, y),
    };

    Resolution::Collided {
        axes,
        cause: CollisionCause::Terrain,
    }
}

/// Reflects the selected velocity components, rolls the transform back to the
/// cached previous position and damps both components.
pub fn bounce(physics: &mut PhysicsState, transform: &mut Transform, axes: BounceAxes, damping: f32) {
    let mut velocity = physics.velocity();
    if axes.x {
        velocity.x = -velocity.x;
    }
    if axes.y {
        velocity.y = -velocity.y;
    }
    physics.set_velocity(velocity * damping);
    transform.set_position(physics.previous_position());
}

/// Searches for the nearest position around `origin` where `blocked` is false.
///
/// Probes along the velocity direction first when the ship is moving fast
/// enough, then falls back to rings of growing radius sampled at the eight
/// compass headings. Returns `None` when nothing within the configured radius
/// is free.
pub fn find_safe_position<F>(
    origin: Vec2,
    velocity: Vec2,
    tuning: &FlightTuning,
    blocked: F,
) -> Option<Vec2>
where
    F: Fn(Vec2) -> bool,
{
    let step = tuning.reposition_step.max(1) as usize;
    let distances = || (1..=tuning.reposition_radius).step_by(step).map(|d| d as f32);

    if velocity.length() > tuning.reposition_min_speed {
        let direction = velocity.normalize_or_zero();
        if let Some(found) = distances()
            .map(|distance| origin + direction * distance)
            .find(|candidate| !blocked(*candidate))
        {
            return Some(found);
        }
    }

    distances()
        .flat_map(|distance| {
            COMPASS_DEGREES.iter().map(move |degrees| {
                let (sin, cos) = degrees.to_radians().sin_cos();
                origin + Vec2::new(cos, sin) * distance
            })
        })
        .find(|candidate| !blocked(*candidate))
}
