//! Rigid coordinate frames.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use approx::AbsDiffEq;
use nalgebra::{Matrix3, Matrix4, Rotation3, Unit};
use serde::{Deserialize, Serialize};

use crate::{MathError, Plane, Point3, Tolerance, Transform, Vec3};

/// Squared length below which a direction is treated as zero.
const DEGENERATE_NORM_SQ: f64 = 1e-24;

/// An immutable rigid frame: an origin plus an orthonormal, right-handed basis.
///
/// A frame maps local coordinates into its parent's coordinates:
/// `p_parent = R * p_local + origin`, where the columns of `R` are
/// [`x_dir`](Self::x_dir), [`y_dir`](Self::y_dir) and [`z_dir`](Self::z_dir).
///
/// Frames form a group under `+`:
///
/// * `a + b` applies offset `b` inside frame `a`;
/// * `a - b` removes offset `b`, so `(a - b) + b == a` and `(a + b) - b == a`;
/// * [`CoordSystem::identity`] is the neutral element.
///
/// Equality uses [`Tolerance::DEFAULT`]; see [`CoordSystem::approx_eq`] for
/// explicit tolerances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "FrameRepr", try_from = "FrameRepr")]
pub struct CoordSystem {
    origin: Point3,
    x_dir: Vec3,
    z_dir: Vec3,
}

impl CoordSystem {
    /// Build a frame from an origin, an x direction and a normal (z direction).
    ///
    /// `normal` is normalized; `x_dir` is made orthogonal to it and
    /// normalized. Fails when either vector is zero or they are parallel.
    pub fn new(origin: Point3, x_dir: Vec3, normal: Vec3) -> Result<Self, MathError> {
        if normal.norm_squared() < DEGENERATE_NORM_SQ {
            return Err(MathError::DegenerateBasis("normal has zero length"));
        }
        if x_dir.norm_squared() < DEGENERATE_NORM_SQ {
            return Err(MathError::DegenerateBasis("x direction has zero length"));
        }
        let z = normal.normalize();
        let x = x_dir - z * x_dir.dot(&z);
        if x.norm_squared() < DEGENERATE_NORM_SQ {
            return Err(MathError::DegenerateBasis(
                "x direction is parallel to the normal",
            ));
        }
        Ok(Self {
            origin,
            x_dir: x.normalize(),
            z_dir: z,
        })
    }

    /// The identity frame: origin `(0, 0, 0)` with the standard basis.
    pub fn identity() -> Self {
        Self {
            origin: Point3::origin(),
            x_dir: Vec3::x(),
            z_dir: Vec3::z(),
        }
    }

    /// A pure translation.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            origin: Point3::new(x, y, z),
            ..Self::identity()
        }
    }

    /// A pure rotation of `angle` radians about `axis`.
    pub fn from_axis_angle(axis: &Vec3, angle: f64) -> Result<Self, MathError> {
        if axis.norm_squared() < DEGENERATE_NORM_SQ {
            return Err(MathError::DegenerateBasis("rotation axis has zero length"));
        }
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle);
        Ok(Self::from_rotation(Point3::origin(), rotation.matrix()))
    }

    /// A pure rotation from Euler angles in degrees, applied X, then Y, then Z.
    pub fn from_euler_degrees(x: f64, y: f64, z: f64) -> Self {
        let rotation = Rotation3::from_euler_angles(x.to_radians(), y.to_radians(), z.to_radians());
        Self::from_rotation(Point3::origin(), rotation.matrix())
    }

    /// Frame lying on a plane: z follows the plane normal, x follows the
    /// plane's reference direction.
    pub fn from_plane(plane: &Plane) -> Result<Self, MathError> {
        Self::new(plane.origin, plane.x_dir, plane.normal)
    }

    /// Frame equivalent to a rigid 4x4 transform.
    pub fn from_transform(transform: &Transform) -> Result<Self, MathError> {
        let m = &transform.matrix;
        let tol = Tolerance::DEFAULT;
        let bottom = [m[(3, 0)], m[(3, 1)], m[(3, 2)], m[(3, 3)] - 1.0];
        if bottom.iter().any(|v| v.abs() > tol.linear) {
            return Err(MathError::NotRigid);
        }
        let rotation: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let drift = rotation.transpose() * rotation - Matrix3::identity();
        if drift.amax() > tol.linear || rotation.determinant() < 0.0 {
            return Err(MathError::NotRigid);
        }
        let origin = Point3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        Self::new(origin, rotation.column(0).into_owned(), rotation.column(2).into_owned())
    }

    /// Re-orthonormalize a rotation matrix that is already close to orthonormal.
    fn from_rotation(origin: Point3, rotation: &Matrix3<f64>) -> Self {
        Self::orthonormalized(
            origin,
            rotation.column(0).into_owned(),
            rotation.column(2).into_owned(),
        )
    }

    /// Gram-Schmidt on a basis known to be non-degenerate; bounds the
    /// rounding error accumulated by repeated composition.
    fn orthonormalized(origin: Point3, x_dir: Vec3, z_dir: Vec3) -> Self {
        let z = z_dir.normalize();
        let x = (x_dir - z * x_dir.dot(&z)).normalize();
        Self {
            origin,
            x_dir: x,
            z_dir: z,
        }
    }

    /// Origin of the frame.
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Unit x axis.
    pub fn x_dir(&self) -> &Vec3 {
        &self.x_dir
    }

    /// Unit y axis (`z × x`).
    pub fn y_dir(&self) -> Vec3 {
        self.z_dir.cross(&self.x_dir)
    }

    /// Unit z axis (the frame's normal).
    pub fn z_dir(&self) -> &Vec3 {
        &self.z_dir
    }

    /// Rotation part as a 3x3 matrix with the basis vectors as columns.
    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.x_dir, self.y_dir(), self.z_dir])
    }

    /// Apply `offset` inside this frame (`self + offset`).
    pub fn compose(&self, offset: &CoordSystem) -> Self {
        let rotation = self.rotation();
        Self::orthonormalized(
            self.origin + rotation * offset.origin.coords,
            rotation * offset.x_dir,
            rotation * offset.z_dir,
        )
    }

    /// Remove `offset` from this frame (`self - offset`).
    pub fn difference(&self, offset: &CoordSystem) -> Self {
        self.compose(&offset.inverse())
    }

    /// The inverse frame: `a + a.inverse() == identity`.
    pub fn inverse(&self) -> Self {
        let transposed = self.rotation().transpose();
        let origin = -(transposed * self.origin.coords);
        Self::from_rotation(Point3::from(origin), &transposed)
    }

    /// This frame expressed in `base`'s local coordinates.
    ///
    /// `base + self.relative_to(base) == self`.
    pub fn relative_to(&self, base: &CoordSystem) -> Self {
        base.inverse().compose(self)
    }

    /// This frame rotated `angle` radians about `axis`, where the axis is
    /// given in this frame's local coordinates and passes through its origin.
    pub fn rotated(&self, axis: &Vec3, angle: f64) -> Result<Self, MathError> {
        Ok(self.compose(&Self::from_axis_angle(axis, angle)?))
    }

    /// This frame rotated by local Euler angles in degrees (X, then Y, then Z).
    pub fn rotated_euler(&self, x: f64, y: f64, z: f64) -> Self {
        self.compose(&Self::from_euler_degrees(x, y, z))
    }

    /// This frame moved by `offset`, given in local coordinates.
    pub fn translated(&self, offset: &Vec3) -> Self {
        self.compose(&Self::at(offset.x, offset.y, offset.z))
    }

    /// Map a local point into the parent frame.
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        self.origin + self.rotation() * p.coords
    }

    /// Map a local direction into the parent frame (rotation only).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation() * v
    }

    /// Matrix converting local coordinates into parent coordinates.
    pub fn local_to_world_transform(&self) -> Transform {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.origin.coords);
        Transform { matrix: m }
    }

    /// Matrix converting parent coordinates into local coordinates.
    pub fn world_to_local_transform(&self) -> Transform {
        self.inverse().local_to_world_transform()
    }

    /// Compare against `other` with explicit tolerances.
    pub fn approx_eq(&self, other: &CoordSystem, tol: &Tolerance) -> bool {
        tol.points_equal(&self.origin, &other.origin)
            && tol.directions_equal(&self.x_dir, &other.x_dir)
            && tol.directions_equal(&self.z_dir, &other.z_dir)
    }
}

impl Default for CoordSystem {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for CoordSystem {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, &Tolerance::DEFAULT)
    }
}

impl AbsDiffEq for CoordSystem {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        Tolerance::DEFAULT.linear
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.approx_eq(
            other,
            &Tolerance {
                linear: epsilon,
                angular: epsilon,
            },
        )
    }
}

impl Add for CoordSystem {
    type Output = CoordSystem;

    fn add(self, rhs: CoordSystem) -> CoordSystem {
        self.compose(&rhs)
    }
}

impl Add<&CoordSystem> for &CoordSystem {
    type Output = CoordSystem;

    fn add(self, rhs: &CoordSystem) -> CoordSystem {
        self.compose(rhs)
    }
}

impl Sub for CoordSystem {
    type Output = CoordSystem;

    fn sub(self, rhs: CoordSystem) -> CoordSystem {
        self.difference(&rhs)
    }
}

impl Sub<&CoordSystem> for &CoordSystem {
    type Output = CoordSystem;

    fn sub(self, rhs: &CoordSystem) -> CoordSystem {
        self.difference(rhs)
    }
}

impl Neg for CoordSystem {
    type Output = CoordSystem;

    fn neg(self) -> CoordSystem {
        self.inverse()
    }
}

impl fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.origin;
        let x = &self.x_dir;
        let z = &self.z_dir;
        write!(
            f,
            "<CoordSystem: origin=({:.6}, {:.6}, {:.6}) x=({:.6}, {:.6}, {:.6}) z=({:.6}, {:.6}, {:.6})>",
            o.x, o.y, o.z, x.x, x.y, x.z, z.x, z.y, z.z
        )
    }
}

/// Serialized form of a [`CoordSystem`].
#[derive(Serialize, Deserialize)]
struct FrameRepr {
    origin: [f64; 3],
    x_dir: [f64; 3],
    normal: [f64; 3],
}

impl From<CoordSystem> for FrameRepr {
    fn from(cs: CoordSystem) -> Self {
        Self {
            origin: cs.origin.coords.into(),
            x_dir: cs.x_dir.into(),
            normal: cs.z_dir.into(),
        }
    }
}

impl TryFrom<FrameRepr> for CoordSystem {
    type Error = MathError;

    fn try_from(repr: FrameRepr) -> Result<Self, MathError> {
        CoordSystem::new(
            Point3::from(repr.origin),
            Vec3::from(repr.x_dir),
            Vec3::from(repr.normal),
        )
    }
}
