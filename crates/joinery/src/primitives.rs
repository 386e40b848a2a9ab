//! Stock parts: cube, block, cylinder and sphere.
//!
//! Each part is defined by a [`ParamTable`] and exposes face mates whose
//! z-axis points out of (or, for bottoms, up through) the face.

use std::sync::LazyLock;

use joinery_ir::Shape;
use joinery_math::CoordSystem;
use joinery_params::{ParamTable, Parameter, ParametricObject, Params};

use crate::component::Part;
use crate::kernel::{Bounds, BoundsKernel, FaceSelector, GeometryKernel};
use crate::registry::{ComponentClass, Registry};
use crate::Result;

/// Criteria shared by every stock primitive.
pub const PRIMITIVE_CRITERIA: [(&str, &str); 2] = [("lib", "basic"), ("type", "primitive")];

/// Register the stock primitives under [`PRIMITIVE_CRITERIA`] plus a
/// `shape` criterion.
pub fn register_primitives(registry: &mut Registry) {
    let common = PRIMITIVE_CRITERIA.map(|(k, v)| (k.to_string(), serde_json::Value::from(v)));
    for (class, shape) in [
        (ComponentClass::part::<Cube>(), "cube"),
        (ComponentClass::part::<Block>(), "box"),
        (ComponentClass::part::<Cylinder>(), "cylinder"),
        (ComponentClass::part::<Sphere>(), "sphere"),
    ] {
        registry.register_with_common(
            class,
            common.clone(),
            [("shape".to_string(), serde_json::Value::from(shape))],
        );
    }
}

/// Side mate on a face of `bounds`.
fn face_mate(bounds: &Bounds, face: FaceSelector) -> Result<CoordSystem> {
    let plane = BoundsKernel.face_plane(bounds, face)?;
    Ok(CoordSystem::from_plane(&plane)?)
}

fn side_face(name: &str) -> Option<FaceSelector> {
    match name {
        "pos_x" => Some(FaceSelector::PosX),
        "neg_x" => Some(FaceSelector::NegX),
        "pos_y" => Some(FaceSelector::PosY),
        "neg_y" => Some(FaceSelector::NegY),
        _ => None,
    }
}

// =============================================================================
// Cube
// =============================================================================

static CUBE: LazyLock<ParamTable> = LazyLock::new(|| {
    ParamTable::builder("Cube")
        .param(Parameter::positive_float("size", 1.0).doc("length of all sides"))
        .build()
});

/// Cube centered on the origin.
///
/// Mates: `top`, `bottom` (both z-up), `pos_x`, `neg_x`, `pos_y`, `neg_y`
/// (z along the face normal, x along +Z).
#[derive(Debug, Clone)]
pub struct Cube(Params);

impl Cube {
    fn size(&self) -> Result<f64> {
        Ok(self.0.float("size")?)
    }
}

impl ParametricObject for Cube {
    fn param_table() -> &'static ParamTable {
        &CUBE
    }

    fn from_params(params: Params) -> Self {
        Cube(params)
    }

    fn params(&self) -> &Params {
        &self.0
    }
}

impl Part for Cube {
    fn make(&self) -> Result<Shape> {
        let s = self.size()?;
        Ok(Shape::cuboid(s, s, s))
    }

    fn mate(&self, name: &str) -> Result<Option<CoordSystem>> {
        let s = self.size()?;
        Ok(match name {
            "top" => Some(CoordSystem::at(0.0, 0.0, s / 2.0)),
            "bottom" => Some(CoordSystem::at(0.0, 0.0, -s / 2.0)),
            _ => match side_face(name) {
                Some(face) => Some(face_mate(&Bounds::centered(s, s, s), face)?),
                None => None,
            },
        })
    }
}

// =============================================================================
// Block
// =============================================================================

static BLOCK: LazyLock<ParamTable> = LazyLock::new(|| {
    ParamTable::builder("Block")
        .param(Parameter::positive_float("length", 1.0).doc("dimension along x"))
        .param(Parameter::positive_float("width", 1.0).doc("dimension along y"))
        .param(Parameter::positive_float("height", 1.0).doc("dimension along z"))
        .build()
});

/// Rectangular block with its base on the XY plane.
///
/// Mates: `top` at full height, `bottom` at the origin, and side mates at
/// half height.
#[derive(Debug, Clone)]
pub struct Block(Params);

impl Block {
    fn dims(&self) -> Result<(f64, f64, f64)> {
        Ok((
            self.0.float("length")?,
            self.0.float("width")?,
            self.0.float("height")?,
        ))
    }
}

impl ParametricObject for Block {
    fn param_table() -> &'static ParamTable {
        &BLOCK
    }

    fn from_params(params: Params) -> Self {
        Block(params)
    }

    fn params(&self) -> &Params {
        &self.0
    }
}

impl Part for Block {
    fn make(&self) -> Result<Shape> {
        let (l, w, h) = self.dims()?;
        Ok(Shape::cuboid(l, w, h).transformed(&CoordSystem::at(0.0, 0.0, h / 2.0)))
    }

    fn mate(&self, name: &str) -> Result<Option<CoordSystem>> {
        let (_, _, h) = self.dims()?;
        Ok(match name {
            "top" => Some(CoordSystem::at(0.0, 0.0, h)),
            "bottom" => Some(CoordSystem::identity()),
            _ => match side_face(name) {
                Some(face) => {
                    let bounds = BoundsKernel.evaluate(&self.make()?)?;
                    Some(face_mate(&bounds, face)?)
                }
                None => None,
            },
        })
    }
}

// =============================================================================
// Cylinder
// =============================================================================

static CYLINDER: LazyLock<ParamTable> = LazyLock::new(|| {
    ParamTable::builder("Cylinder")
        .param(Parameter::positive_float("radius", 1.0).doc("cylinder radius"))
        .param(Parameter::positive_float("length", 1.0).doc("cylinder length"))
        .build()
});

/// Cylinder along +Z with its base on the XY plane.
///
/// Mates: `bottom` at the origin, `top` at full length.
#[derive(Debug, Clone)]
pub struct Cylinder(Params);

impl ParametricObject for Cylinder {
    fn param_table() -> &'static ParamTable {
        &CYLINDER
    }

    fn from_params(params: Params) -> Self {
        Cylinder(params)
    }

    fn params(&self) -> &Params {
        &self.0
    }
}

impl Part for Cylinder {
    fn make(&self) -> Result<Shape> {
        let r = self.0.float("radius")?;
        let l = self.0.float("length")?;
        Ok(Shape::cylinder(r, l).transformed(&CoordSystem::at(0.0, 0.0, l / 2.0)))
    }

    fn mate(&self, name: &str) -> Result<Option<CoordSystem>> {
        Ok(match name {
            "bottom" => Some(CoordSystem::identity()),
            "top" => Some(CoordSystem::at(0.0, 0.0, self.0.float("length")?)),
            _ => None,
        })
    }
}

// =============================================================================
// Sphere
// =============================================================================

static SPHERE: LazyLock<ParamTable> = LazyLock::new(|| {
    ParamTable::builder("Sphere")
        .param(Parameter::positive_float("radius", 1.0).doc("sphere radius"))
        .build()
});

/// Sphere resting on the XY plane.
#[derive(Debug, Clone)]
pub struct Sphere(Params);

impl ParametricObject for Sphere {
    fn param_table() -> &'static ParamTable {
        &SPHERE
    }

    fn from_params(params: Params) -> Self {
        Sphere(params)
    }

    fn params(&self) -> &Params {
        &self.0
    }
}

impl Part for Sphere {
    fn make(&self) -> Result<Shape> {
        let r = self.0.float("radius")?;
        Ok(Shape::sphere(r).transformed(&CoordSystem::at(0.0, 0.0, r)))
    }

    fn make_simplified(&self) -> Result<Shape> {
        let r = self.0.float("radius")?;
        let d = 2.0 * r;
        Ok(Shape::cuboid(d, d, d).transformed(&CoordSystem::at(0.0, 0.0, r)))
    }
}
