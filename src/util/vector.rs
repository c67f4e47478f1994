//! Plain 2D geometry helpers shared by steering and collision code
//!
//! Vectors are `(f32, f32)` tuples. All angular arithmetic goes through
//! [`wrap_angle`], which maps onto the half-open range (-π, π].

use std::f32::consts::{PI, TAU};

/// Magnitudes below this are treated as the zero vector.
pub const DEGENERATE_LENGTH: f32 = 1e-9;

pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

pub fn length(x: f32, y: f32) -> f32 {
    x.hypot(y)
}

pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    (bx - ax).hypot(by - ay)
}

pub fn distance_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    dx * dx + dy * dy
}

/// Unit vector in the direction of `(x, y)`, or `(0, 0)` for degenerate input.
pub fn normalize(x: f32, y: f32) -> (f32, f32) {
    let len = length(x, y);
    if len > DEGENERATE_LENGTH {
        (x / len, y / len)
    } else {
        (0.0, 0.0)
    }
}

pub fn angle_to_vector(angle: f32) -> (f32, f32) {
    (angle.cos(), angle.sin())
}

pub fn vector_to_angle(x: f32, y: f32) -> f32 {
    y.atan2(x)
}

/// Wrap any angle into (-π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped += TAU;
    }
    if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Signed rotation that takes `current` onto `target` by the short way round.
pub fn shortest_angle_diff(target: f32, current: f32) -> f32 {
    wrap_angle(target - current)
}
