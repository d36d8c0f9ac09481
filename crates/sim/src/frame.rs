//! World/local frame transforms and angle helpers.
//!
//! Local frame: +Z forward, +Y up, +X right. A positive pitch rotation
//! drops the nose, a positive yaw turns right.

use glam::{Quat, Vec3};
use std::f32::consts::PI;

pub fn forward(orientation: Quat) -> Vec3 {
    orientation * Vec3::Z
}

/// World point expressed in the local frame of a body at `position`/`orientation`.
pub fn to_local_point(position: Vec3, orientation: Quat, point: Vec3) -> Vec3 {
    orientation.inverse() * (point - position)
}

/// World direction expressed in a body's local frame (no translation).
pub fn to_local_direction(orientation: Quat, direction: Vec3) -> Vec3 {
    orientation.inverse() * direction
}

/// Rotation taking `from`'s frame to `to`'s frame.
pub fn relative_rotation(from: Quat, to: Quat) -> Quat {
    from.inverse() * to
}

/// Unsigned angle between two directions in radians; 0 when either is degenerate.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Shortest signed difference `target - current`, wrapped to [-PI, PI].
pub fn angle_diff(target: f32, current: f32) -> f32 {
    let mut diff = target - current;
    while diff > PI {
        diff -= 2.0 * PI;
    }
    while diff < -PI {
        diff += 2.0 * PI;
    }
    diff
}

/// Heading (about +Y, positive to the right) and elevation (positive nose
/// down, matching the pitch sign) of a world direction.
pub fn heading_elevation(direction: Vec3) -> (f32, f32) {
    let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
    (direction.x.atan2(direction.z), (-direction.y).atan2(horizontal))
}

/// Signed (horizontal, vertical) angular error from a body's nose to a world direction.
pub fn aim_error(orientation: Quat, direction: Vec3) -> (f32, f32) {
    let (my_heading, my_elevation) = heading_elevation(forward(orientation));
    let (heading, elevation) = heading_elevation(direction);
    (
        angle_diff(heading, my_heading),
        angle_diff(elevation, my_elevation),
    )
}

/// Turn command on one axis toward a signed angular `error` given the
/// current signed turn `rate` (rad/s).
///
/// Returns 0 when already turning the right way fast enough to close the
/// error within `gate_secs`, otherwise a full turn toward the error.
pub fn turn_command(error: f32, rate: f32, gate_secs: f32) -> i8 {
    if error > 0.0 {
        if rate > 0.0 && error / rate < gate_secs {
            0
        } else {
            1
        }
    } else if error < 0.0 {
        if rate < 0.0 && error / rate < gate_secs {
            0
        } else {
            -1
        }
    } else {
        0
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Orientation with the given heading (degrees) and no pitch or roll.
pub fn level_heading(heading_deg: f32) -> Quat {
    Quat::from_rotation_y(heading_deg.to_radians())
}

/// Closest distance from `point` to the segment `a`..`b`.
pub fn segment_distance(a: Vec3, b: Vec3, point: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return (point - a).length();
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t - point).length()
}
