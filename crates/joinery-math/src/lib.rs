#![warn(missing_docs)]

//! Math types for the joinery assembly engine.
//!
//! Thin wrappers around nalgebra providing the rigid-frame algebra that
//! component placement is built on: points, vectors, 4x4 transforms,
//! planes, the [`CoordSystem`] frame type and tolerance constants.

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::Deserialize;
use thiserror::Error;

mod coord_system;

pub use coord_system::CoordSystem;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Errors raised while building frames.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// The given directions cannot span an orthonormal basis.
    #[error("degenerate basis: {0}")]
    DegenerateBasis(&'static str),
    /// A 4x4 matrix was not a rigid (rotation + translation) transform.
    #[error("transform is not rigid")]
    NotRigid,
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

/// A planar face description: a point on the plane, its outward normal and
/// an in-plane reference direction.
///
/// This is the shape geometry kernels report for face queries; convert it
/// into a frame with [`CoordSystem::from_plane`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Outward normal of the plane.
    pub normal: Vec3,
    /// Reference direction lying in the plane.
    pub x_dir: Vec3,
}

impl Plane {
    /// Create a plane from its origin, normal and in-plane x direction.
    pub fn new(origin: Point3, normal: Vec3, x_dir: Vec3) -> Self {
        Self {
            origin,
            normal,
            x_dir,
        }
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Tolerance on unit-vector components (dimensionless).
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 mm linear, 1e-9 on direction components).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if two unit directions agree within tolerance.
    pub fn directions_equal(&self, a: &Vec3, b: &Vec3) -> bool {
        (a - b).amax() < self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_tolerance_from_toml_keeps_defaults() {
        let tol: Tolerance = toml::from_str("linear = 0.01").unwrap();
        assert_eq!(tol.linear, 0.01);
        assert_eq!(tol.angular, Tolerance::DEFAULT.angular);
    }
}
