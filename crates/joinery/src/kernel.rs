//! Geometry kernel contract and a bounding-box kernel.
//!
//! Components only ever produce [`Shape`] trees; a [`GeometryKernel`] turns
//! them into solids and answers face queries for mate construction.
//! [`BoundsKernel`] evaluates shapes to axis-aligned boxes, which is enough
//! for placement checks and box-like face mates without a B-rep back end.

use std::str::FromStr;

use joinery_ir::Shape;
use joinery_math::{Plane, Point3, Vec3};
use thiserror::Error;

/// Errors reported by geometry kernels.
#[derive(Error, Debug)]
pub enum KernelError {
    /// The kernel cannot evaluate this kind of shape or query.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The shape has no geometry.
    #[error("shape is empty")]
    EmptyShape,
    /// Back-end failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// One of the six axis-aligned faces of a solid's extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceSelector {
    /// Face with the largest X.
    PosX,
    /// Face with the smallest X.
    NegX,
    /// Face with the largest Y.
    PosY,
    /// Face with the smallest Y.
    NegY,
    /// Face with the largest Z.
    PosZ,
    /// Face with the smallest Z.
    NegZ,
}

impl FaceSelector {
    /// Outward normal of the face.
    pub fn normal(self) -> Vec3 {
        match self {
            FaceSelector::PosX => Vec3::x(),
            FaceSelector::NegX => -Vec3::x(),
            FaceSelector::PosY => Vec3::y(),
            FaceSelector::NegY => -Vec3::y(),
            FaceSelector::PosZ => Vec3::z(),
            FaceSelector::NegZ => -Vec3::z(),
        }
    }
}

impl FromStr for FaceSelector {
    type Err = KernelError;

    /// Parses `">X"`, `"<X"`, `">Y"`, `"<Y"`, `">Z"` and `"<Z"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            ">X" => FaceSelector::PosX,
            "<X" => FaceSelector::NegX,
            ">Y" => FaceSelector::PosY,
            "<Y" => FaceSelector::NegY,
            ">Z" => FaceSelector::PosZ,
            "<Z" => FaceSelector::NegZ,
            other => return Err(KernelError::Unsupported(format!("face selector {other:?}"))),
        })
    }
}

/// Evaluates shape trees into solids.
pub trait GeometryKernel {
    /// Kernel-specific solid type.
    type Solid;

    /// Evaluate a shape tree.
    fn evaluate(&self, shape: &Shape) -> Result<Self::Solid, KernelError>;

    /// Plane of the selected face; `x_dir` is +Z for side faces and +X for
    /// top and bottom faces.
    fn face_plane(&self, solid: &Self::Solid, face: FaceSelector) -> Result<Plane, KernelError>;
}

// =============================================================================
// Bounds
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bounds {
    /// Create bounds from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Bounds centered at the origin with the given size.
    pub fn centered(x: f64, y: f64, z: f64) -> Self {
        Self::new(
            Point3::new(-x / 2.0, -y / 2.0, -z / 2.0),
            Point3::new(x / 2.0, y / 2.0, z / 2.0),
        )
    }

    /// Smallest bounds holding every point; `None` for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self::new(first, first);
        for p in points {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    /// Smallest bounds holding both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// The eight corners.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Plane of one face of the box.
    pub fn face_plane(&self, face: FaceSelector) -> Plane {
        let c = self.center();
        let origin = match face {
            FaceSelector::PosX => Point3::new(self.max.x, c.y, c.z),
            FaceSelector::NegX => Point3::new(self.min.x, c.y, c.z),
            FaceSelector::PosY => Point3::new(c.x, self.max.y, c.z),
            FaceSelector::NegY => Point3::new(c.x, self.min.y, c.z),
            FaceSelector::PosZ => Point3::new(c.x, c.y, self.max.z),
            FaceSelector::NegZ => Point3::new(c.x, c.y, self.min.z),
        };
        let x_dir = match face {
            FaceSelector::PosZ | FaceSelector::NegZ => Vec3::x(),
            _ => Vec3::z(),
        };
        Plane::new(origin, face.normal(), x_dir)
    }
}

/// Kernel that evaluates shapes to their axis-aligned bounds.
///
/// Differences keep the bounds of their base; unions merge their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsKernel;

fn primitive_bounds(shape: &Shape) -> anyhow::Result<Option<Bounds>> {
    let check = |name: &str, v: f64| {
        anyhow::ensure!(v.is_finite() && v > 0.0, "{name} must be positive, got {v}");
        Ok(())
    };
    Ok(match shape {
        Shape::Empty => None,
        Shape::Cuboid { size } => {
            check("cuboid x", size.x)?;
            check("cuboid y", size.y)?;
            check("cuboid z", size.z)?;
            Some(Bounds::centered(size.x, size.y, size.z))
        }
        Shape::Cylinder { radius, height } => {
            check("cylinder radius", *radius)?;
            check("cylinder height", *height)?;
            Some(Bounds::centered(2.0 * radius, 2.0 * radius, *height))
        }
        Shape::Sphere { radius } => {
            check("sphere radius", *radius)?;
            let d = 2.0 * radius;
            Some(Bounds::centered(d, d, d))
        }
        Shape::Union { children } => {
            let mut acc: Option<Bounds> = None;
            for child in children {
                if let Some(b) = primitive_bounds(child)? {
                    acc = Some(match acc {
                        Some(a) => a.union(&b),
                        None => b,
                    });
                }
            }
            acc
        }
        Shape::Difference { base, .. } => primitive_bounds(base)?,
        Shape::Transformed { child, frame } => primitive_bounds(child)?.and_then(|b| {
            let corners = b.corners().map(|p| frame.transform_point(&p));
            Bounds::from_points(&corners)
        }),
    })
}

impl GeometryKernel for BoundsKernel {
    type Solid = Bounds;

    fn evaluate(&self, shape: &Shape) -> Result<Bounds, KernelError> {
        primitive_bounds(shape)?.ok_or(KernelError::EmptyShape)
    }

    fn face_plane(&self, solid: &Bounds, face: FaceSelector) -> Result<Plane, KernelError> {
        Ok(solid.face_plane(face))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use joinery_math::CoordSystem;

    #[test]
    fn selector_parse() {
        assert_eq!(">X".parse::<FaceSelector>().unwrap(), FaceSelector::PosX);
        assert_eq!("<Z".parse::<FaceSelector>().unwrap(), FaceSelector::NegZ);
        assert!(matches!(
            "X".parse::<FaceSelector>(),
            Err(KernelError::Unsupported(_))
        ));
    }

    #[test]
    fn primitives_are_centered() {
        let b = BoundsKernel.evaluate(&Shape::cylinder(2.0, 10.0)).unwrap();
        assert_relative_eq!(b.min, Point3::new(-2.0, -2.0, -5.0));
        assert_relative_eq!(b.size(), Vec3::new(4.0, 4.0, 10.0));
    }

    #[test]
    fn transformed_bounds_rotate() {
        let frame = CoordSystem::at(0.0, 0.0, 3.0).rotated_euler(0.0, 0.0, 90.0);
        let shape = Shape::cuboid(4.0, 2.0, 2.0).transformed(&frame);
        let b = BoundsKernel.evaluate(&shape).unwrap();
        assert_relative_eq!(b.size(), Vec3::new(2.0, 4.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(b.center(), Point3::new(0.0, 0.0, 3.0), epsilon = 1e-9);
    }

    #[test]
    fn union_and_difference() {
        let shape = Shape::cuboid(1.0, 1.0, 1.0)
            .union(Shape::sphere(1.0).transformed(&CoordSystem::at(5.0, 0.0, 0.0)))
            .cut(Shape::sphere(10.0));
        let b = BoundsKernel.evaluate(&shape).unwrap();
        assert_relative_eq!(b.min.x, -0.5);
        assert_relative_eq!(b.max.x, 6.0);
    }

    #[test]
    fn empty_and_invalid_shapes() {
        assert!(matches!(
            BoundsKernel.evaluate(&Shape::Empty),
            Err(KernelError::EmptyShape)
        ));
        let err = BoundsKernel.evaluate(&Shape::sphere(-1.0)).unwrap_err();
        assert!(matches!(err, KernelError::Backend(_)));
        assert!(err.to_string().contains("sphere radius"));
    }

    #[test]
    fn face_planes() {
        let b = Bounds::centered(2.0, 4.0, 6.0);
        let top = BoundsKernel.face_plane(&b, FaceSelector::PosZ).unwrap();
        assert_relative_eq!(top.origin, Point3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(top.x_dir, Vec3::x());
        let side = b.face_plane(FaceSelector::NegY);
        assert_relative_eq!(side.origin, Point3::new(0.0, -2.0, 0.0));
        assert_relative_eq!(side.normal, -Vec3::y());
        assert_relative_eq!(side.x_dir, Vec3::z());
    }
}
