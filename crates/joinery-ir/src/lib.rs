#![warn(missing_docs)]

//! Intermediate representation for the joinery assembly engine.
//!
//! Two families of plain data live here:
//!
//! * [`Shape`], a declarative solid description (primitives, booleans and
//!   rigid placements) that geometry kernels evaluate;
//! * the persisted schemas: [`ComponentRecord`] (a serialized component),
//!   [`CatalogueItem`] and [`CatalogueDocument`] (a JSON parts catalogue).
//!
//! Nothing in this crate evaluates geometry.

use std::collections::BTreeMap;

use joinery_math::CoordSystem;
use serde::{Deserialize, Serialize};

/// Search criteria: scalar values keyed by category.
pub type Criteria = BTreeMap<String, serde_json::Value>;

/// Returns true if every pair of `query` is present, with an equal value,
/// in `entry`. An empty query matches everything.
pub fn criteria_match(entry: &Criteria, query: &Criteria) -> bool {
    query.iter().all(|(k, v)| entry.get(k) == Some(v))
}

/// 3D vector with f64 components (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// =============================================================================
// Shape IR
// =============================================================================

/// A declarative solid, expressed in its owner's local frame.
///
/// Shapes form a tree; combining operations own their operands. The
/// constructors [`Shape::union`], [`Shape::cut`] and [`Shape::transformed`]
/// fold away identities, so an empty tool never produces a `Difference`
/// node and nested placements collapse into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum Shape {
    /// No geometry (identity for union).
    #[default]
    Empty,
    /// Axis-aligned box centered at the origin.
    Cuboid {
        /// Size along each axis.
        size: Vec3,
    },
    /// Cylinder along the Z axis, centered at the origin.
    Cylinder {
        /// Radius of the cylinder.
        radius: f64,
        /// Height of the cylinder.
        height: f64,
    },
    /// Sphere centered at the origin.
    Sphere {
        /// Radius of the sphere.
        radius: f64,
    },
    /// Boolean union of all children.
    Union {
        /// Operands.
        children: Vec<Shape>,
    },
    /// `base` with `tool` removed.
    Difference {
        /// Shape being cut.
        base: Box<Shape>,
        /// Shape removed from `base`.
        tool: Box<Shape>,
    },
    /// `child` placed by a rigid frame.
    Transformed {
        /// Placed shape.
        child: Box<Shape>,
        /// Frame mapping the child's coordinates into this shape's.
        frame: CoordSystem,
    },
}

impl Shape {
    /// Box of the given size, centered at the origin.
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        Shape::Cuboid {
            size: Vec3::new(x, y, z),
        }
    }

    /// Cylinder along Z, centered at the origin.
    pub fn cylinder(radius: f64, height: f64) -> Self {
        Shape::Cylinder { radius, height }
    }

    /// Sphere centered at the origin.
    pub fn sphere(radius: f64) -> Self {
        Shape::Sphere { radius }
    }

    /// Returns true for [`Shape::Empty`] and unions with no children.
    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Empty => true,
            Shape::Union { children } => children.iter().all(Shape::is_empty),
            _ => false,
        }
    }

    /// Union of `self` and `other`; nested unions are flattened.
    pub fn union(self, other: Shape) -> Shape {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        let mut children = match self {
            Shape::Union { children } => children,
            s => vec![s],
        };
        match other {
            Shape::Union { children: more } => children.extend(more),
            o => children.push(o),
        }
        Shape::Union { children }
    }

    /// `self` with `tool` removed.
    pub fn cut(self, tool: Shape) -> Shape {
        if self.is_empty() || tool.is_empty() {
            return self;
        }
        Shape::Difference {
            base: Box::new(self),
            tool: Box::new(tool),
        }
    }

    /// `self` placed by `frame`.
    pub fn transformed(self, frame: &CoordSystem) -> Shape {
        if self.is_empty() {
            return Shape::Empty;
        }
        if *frame == CoordSystem::identity() {
            return self;
        }
        match self {
            Shape::Transformed { child, frame: inner } => Shape::Transformed {
                child,
                frame: frame + &inner,
            },
            s => Shape::Transformed {
                child: Box::new(s),
                frame: *frame,
            },
        }
    }

    /// Count of primitive leaves.
    pub fn primitive_count(&self) -> usize {
        match self {
            Shape::Empty => 0,
            Shape::Cuboid { .. } | Shape::Cylinder { .. } | Shape::Sphere { .. } => 1,
            Shape::Union { children } => children.iter().map(Shape::primitive_count).sum(),
            Shape::Difference { base, tool } => base.primitive_count() + tool.primitive_count(),
            Shape::Transformed { child, .. } => child.primitive_count(),
        }
    }
}

// =============================================================================
// Persisted records
// =============================================================================

/// Library that wrote a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibInfo {
    /// Library name.
    pub name: String,
    /// Library version.
    pub version: String,
}

/// A serialized component: enough to rebuild an equivalent, unplaced one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Writer information.
    pub lib: LibInfo,
    /// Registered class name.
    pub class: String,
    /// Parameter values, as produced by the parameter system.
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueItem {
    /// Unique identifier within the catalogue.
    pub id: String,
    /// Search criteria.
    #[serde(default)]
    pub criteria: Criteria,
    /// The stored component.
    pub obj: ComponentRecord,
}

/// Catalogue provenance, written once when a catalogue is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbInfo {
    /// Catalogue implementation name.
    pub name: String,
    /// Catalogue format version.
    pub ver: String,
    /// Library that created the catalogue.
    pub lib: LibInfo,
}

/// A catalogue file: provenance plus items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueDocument {
    /// Provenance block.
    pub dbinfo: DbInfo,
    /// Items in insertion order.
    #[serde(default)]
    pub items: Vec<CatalogueItem>,
}

impl CatalogueDocument {
    /// Create an empty catalogue.
    pub fn new(dbinfo: DbInfo) -> Self {
        Self {
            dbinfo,
            items: Vec::new(),
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
