//! Toroidal grid geometry
//!
//! Every axis wraps: exiting one face re-enters through the opposite face.
//! All distance math must use the nearest wrap image, otherwise attraction
//! forces point the long way around the torus.

use glam::Vec3;

use crate::{axis_delta, wrap_coord};

/// The six axis-aligned unit directions
pub const AXIS_DIRS: [Vec3; 6] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];

/// A boundary crossing on one axis, recorded during a wrapping move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    /// Axis index (0 = x, 1 = y, 2 = z)
    pub axis: usize,
    /// True if the entity left through the low face (coordinate went below 0)
    pub low: bool,
}

/// Wrap a position into `[0, n)` on every axis.
#[inline]
pub fn wrap(pos: Vec3, n: f32) -> Vec3 {
    Vec3::new(
        wrap_coord(pos.x, n),
        wrap_coord(pos.y, n),
        wrap_coord(pos.z, n),
    )
}

/// Wrap a position after a bounded move, recording which faces were crossed.
///
/// Used by entities whose wraps are visible (portal effects). The move is
/// assumed smaller than one grid length per axis, so a single correction
/// suffices.
pub fn wrap_crossings(pos: Vec3, n: f32) -> (Vec3, Vec<Crossing>) {
    let mut out = pos;
    let mut crossings = Vec::new();
    for axis in 0..3 {
        if out[axis] < 0.0 {
            out[axis] += n;
            crossings.push(Crossing { axis, low: true });
        } else if out[axis] >= n {
            out[axis] -= n;
            crossings.push(Crossing { axis, low: false });
        }
    }
    (out, crossings)
}

/// Nearest-image displacement from `from` to `to`.
#[inline]
pub fn nearest_delta(from: Vec3, to: Vec3, n: f32) -> Vec3 {
    Vec3::new(
        axis_delta(from.x, to.x, n),
        axis_delta(from.y, to.y, n),
        axis_delta(from.z, to.z, n),
    )
}

/// Shortest wrap-around Euclidean distance between two points.
#[inline]
pub fn toroidal_distance(a: Vec3, b: Vec3, n: f32) -> f32 {
    nearest_delta(a, b, n).length()
}

/// Shortest wrap-around squared Euclidean distance.
#[inline]
pub fn toroidal_distance_sq(a: Vec3, b: Vec3, n: f32) -> f32 {
    nearest_delta(a, b, n).length_squared()
}

/// Nearest-image Manhattan distance.
#[inline]
pub fn manhattan(a: Vec3, b: Vec3, n: f32) -> f32 {
    let d = nearest_delta(a, b, n);
    d.x.abs() + d.y.abs() + d.z.abs()
}

/// True when two positions occupy the same grid cell, within `eps` per axis.
#[inline]
pub fn same_cell(a: Vec3, b: Vec3, n: f32, eps: f32) -> bool {
    let d = nearest_delta(a, b, n);
    d.x.abs() < eps && d.y.abs() < eps && d.z.abs() < eps
}
