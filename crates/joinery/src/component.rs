//! The component tree: parts, assemblies and their identities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use joinery_ir::{ComponentRecord, LibInfo, Shape};
use joinery_math::CoordSystem;
use joinery_params::{ParametricObject, Params};

use crate::build::{self, BuildPhase, BuildReport, ComponentPath, Rounds};
use crate::config::BuildConfig;
use crate::constraint::Constraint;
use crate::mate::Mate;
use crate::{Error, Result};

/// Name of the mate every component provides at its local origin.
pub const ORIGIN_MATE: &str = "origin";

/// Library name written into component records.
pub const LIB_NAME: &str = "joinery";

/// Process-unique identity of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Global atomic counter for component ids.
static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a globally unique [`ComponentId`].
pub(crate) fn alloc_component_id() -> ComponentId {
    ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// Definitions
// =============================================================================

/// Object-safe view of a parametric definition.
pub trait Parametric: fmt::Debug {
    /// Validated parameters of the definition.
    fn parameters(&self) -> &Params;

    /// Class name, taken from the parameter table.
    fn class_name(&self) -> &'static str {
        self.parameters().class_name()
    }
}

impl<T: ParametricObject + fmt::Debug> Parametric for T {
    fn parameters(&self) -> &Params {
        self.params()
    }
}

/// A leaf component with geometry.
pub trait Part: Parametric {
    /// Local geometry of the part.
    fn make(&self) -> Result<Shape>;

    /// Geometry removed from other parts when this part is used as a tool.
    fn make_cutter(&self) -> Result<Option<Shape>> {
        Ok(None)
    }

    /// Cheaper geometry for previews.
    fn make_simplified(&self) -> Result<Shape> {
        self.make()
    }

    /// Named mate in local coordinates; `None` if the part has no such mate.
    fn mate(&self, _name: &str) -> Result<Option<CoordSystem>> {
        Ok(None)
    }
}

/// A component made of named child components placed by constraints.
pub trait Assembly: Parametric {
    /// Build rounds, pulled lazily one at a time.
    fn rounds(&self) -> Rounds<'_>;

    /// Named mate in local coordinates; `None` if the assembly has no such mate.
    fn mate(&self, _name: &str) -> Result<Option<CoordSystem>> {
        Ok(None)
    }
}

// =============================================================================
// Component tree
// =============================================================================

/// Part state: its definition and the current local geometry.
#[derive(Debug)]
pub struct PartNode {
    def: Box<dyn Part>,
    shape: Option<Shape>,
}

/// Assembly state: its definition, children, constraints and build phase.
#[derive(Debug)]
pub struct AssemblyNode {
    pub(crate) def: Box<dyn Assembly>,
    pub(crate) children: IndexMap<String, Component>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) phase: BuildPhase,
}

/// The two kinds of component.
#[derive(Debug)]
pub enum ComponentKind {
    /// Leaf with geometry.
    Part(PartNode),
    /// Container of child components.
    Assembly(AssemblyNode),
}

/// A node of the component tree.
///
/// Components compare by identity: two separately constructed components
/// are never equal, even with identical parameters.
#[derive(Debug)]
pub struct Component {
    id: ComponentId,
    pub(crate) world: Option<CoordSystem>,
    pub(crate) kind: ComponentKind,
}

impl Component {
    /// Wrap a part definition.
    pub fn part(def: impl Part + 'static) -> Self {
        Self {
            id: alloc_component_id(),
            world: None,
            kind: ComponentKind::Part(PartNode {
                def: Box::new(def),
                shape: None,
            }),
        }
    }

    /// Wrap an assembly definition.
    pub fn assembly(def: impl Assembly + 'static) -> Self {
        Self {
            id: alloc_component_id(),
            world: None,
            kind: ComponentKind::Assembly(AssemblyNode {
                def: Box::new(def),
                children: IndexMap::new(),
                constraints: Vec::new(),
                phase: BuildPhase::Pending,
            }),
        }
    }

    /// Unique id of this instance.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// World frame, once placed.
    pub fn world(&self) -> Option<&CoordSystem> {
        self.world.as_ref()
    }

    /// Place a root component.
    ///
    /// Children are placed by their assembly's constraints; a child handed
    /// to an assembly with a frame already set fails its build with
    /// [`Error::DuplicatePlacement`]. Moving a built assembly carries every
    /// placed descendant along, so the result matches a fresh build at the
    /// new frame.
    pub fn set_world(&mut self, world: CoordSystem) {
        if let Some(old) = self.world.replace(world) {
            self.move_descendants(&(world + old.inverse()));
        }
    }

    fn move_descendants(&mut self, delta: &CoordSystem) {
        let ComponentKind::Assembly(node) = &mut self.kind else {
            return;
        };
        for child in node.children.values_mut() {
            if let Some(world) = child.world.as_mut() {
                *world = delta.compose(world);
            }
            child.move_descendants(delta);
        }
    }

    /// Returns true for parts.
    pub fn is_part(&self) -> bool {
        matches!(self.kind, ComponentKind::Part(_))
    }

    /// Returns true for assemblies.
    pub fn is_assembly(&self) -> bool {
        matches!(self.kind, ComponentKind::Assembly(_))
    }

    /// The component's kind and state.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The part definition, if this is a part.
    pub fn as_part(&self) -> Option<&dyn Part> {
        match &self.kind {
            ComponentKind::Part(p) => Some(p.def.as_ref()),
            ComponentKind::Assembly(_) => None,
        }
    }

    /// The assembly definition, if this is an assembly.
    pub fn as_assembly(&self) -> Option<&dyn Assembly> {
        match &self.kind {
            ComponentKind::Part(_) => None,
            ComponentKind::Assembly(a) => Some(a.def.as_ref()),
        }
    }

    /// Validated parameters.
    pub fn params(&self) -> &Params {
        match &self.kind {
            ComponentKind::Part(p) => p.def.parameters(),
            ComponentKind::Assembly(a) => a.def.parameters(),
        }
    }

    /// Class name of the definition.
    pub fn class_name(&self) -> &'static str {
        self.params().class_name()
    }

    // =========================================================================
    // Mates
    // =========================================================================

    /// Named mate of this component.
    ///
    /// Definitions answer first; `"origin"` falls back to the identity frame.
    pub fn mate(&self, name: &str) -> Result<Mate> {
        let local = match &self.kind {
            ComponentKind::Part(p) => p.def.mate(name)?,
            ComponentKind::Assembly(a) => a.def.mate(name)?,
        };
        match local {
            Some(local) => Ok(Mate::new(self.id, name, local)),
            None if name == ORIGIN_MATE => Ok(self.mate_origin()),
            None => Err(Error::UnknownMate {
                class: self.class_name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Mate at the local origin.
    pub fn mate_origin(&self) -> Mate {
        Mate::new(self.id, ORIGIN_MATE, CoordSystem::identity())
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Child table of an assembly, in insertion order.
    pub fn children(&self) -> Option<&IndexMap<String, Component>> {
        match &self.kind {
            ComponentKind::Assembly(a) => Some(&a.children),
            ComponentKind::Part(_) => None,
        }
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children().and_then(|c| c.get(name))
    }

    /// Constraints accumulated by an assembly's build.
    pub fn constraints(&self) -> &[Constraint] {
        match &self.kind {
            ComponentKind::Assembly(a) => &a.constraints,
            ComponentKind::Part(_) => &[],
        }
    }

    /// Build phase of an assembly.
    pub fn phase(&self) -> Option<BuildPhase> {
        match &self.kind {
            ComponentKind::Assembly(a) => Some(a.phase),
            ComponentKind::Part(_) => None,
        }
    }

    /// Nested component by dotted path, e.g. `"bearing.outer_ring"`.
    ///
    /// Every segment but the last must name an assembly. An empty path
    /// returns `self`.
    pub fn find(&self, path: &str) -> Result<&Component> {
        let mut current = self;
        let mut walked = ComponentPath::root();
        for key in path.split('.').filter(|k| !k.is_empty()) {
            let children = current.children().ok_or_else(|| Error::NotAnAssembly {
                path: walked.to_string(),
            })?;
            walked = walked.child(key);
            current = children.get(key).ok_or_else(|| Error::ComponentNotFound {
                path: walked.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Mutable variant of [`Component::find`].
    pub fn find_mut(&mut self, path: &str) -> Result<&mut Component> {
        let mut current = self;
        let mut walked = ComponentPath::root();
        for key in path.split('.').filter(|k| !k.is_empty()) {
            let children = match &mut current.kind {
                ComponentKind::Assembly(a) => &mut a.children,
                ComponentKind::Part(_) => {
                    return Err(Error::NotAnAssembly {
                        path: walked.to_string(),
                    })
                }
            };
            walked = walked.child(key);
            current = children.get_mut(key).ok_or_else(|| Error::ComponentNotFound {
                path: walked.to_string(),
            })?;
        }
        Ok(current)
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Geometry in the component's own frame.
    ///
    /// Parts return their altered shape if one was set, otherwise a fresh
    /// [`Part::make`]. Assemblies union their placed children, each moved
    /// into the assembly's frame.
    pub fn local_shape(&self) -> Result<Shape> {
        match &self.kind {
            ComponentKind::Part(p) => match &p.shape {
                Some(shape) => Ok(shape.clone()),
                None => p.def.make(),
            },
            ComponentKind::Assembly(a) => {
                let origin = self.world.unwrap_or_default();
                let mut shape = Shape::Empty;
                for (name, child) in &a.children {
                    let world = child.world.ok_or_else(|| Error::NotBuilt {
                        path: name.clone(),
                    })?;
                    shape = shape.union(child.local_shape()?.transformed(&world.relative_to(&origin)));
                }
                Ok(shape)
            }
        }
    }

    /// Geometry in world coordinates.
    pub fn world_shape(&self) -> Result<Shape> {
        let world = self.world.ok_or_else(|| Error::NotBuilt {
            path: self.class_name().to_string(),
        })?;
        Ok(self.local_shape()?.transformed(&world))
    }

    /// Replace a part's local geometry.
    pub fn set_shape(&mut self, shape: Shape) -> Result<()> {
        match &mut self.kind {
            ComponentKind::Part(p) => {
                p.shape = Some(shape);
                Ok(())
            }
            ComponentKind::Assembly(a) => Err(Error::NotAPart {
                path: a.def.class_name().to_string(),
            }),
        }
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Build with the default [`BuildConfig`].
    pub fn build(&mut self) -> Result<BuildReport> {
        self.build_with(&BuildConfig::default())
    }

    /// Run every build round of this assembly (and, if configured, of its
    /// child assemblies). Parts have nothing to build.
    ///
    /// An unplaced root is built at the identity frame.
    pub fn build_with(&mut self, config: &BuildConfig) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        if self.is_part() {
            return Ok(report);
        }
        if self.world.is_none() {
            tracing::warn!(class = self.class_name(), "building unplaced assembly at the origin");
            self.world = Some(CoordSystem::identity());
        }
        build::build_assembly(self, &ComponentPath::root(), config, &mut report)?;
        Ok(report)
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Persistable record of this component's class and parameters.
    pub fn serialize(&self) -> ComponentRecord {
        ComponentRecord {
            lib: LibInfo {
                name: LIB_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            class: self.class_name().to_string(),
            params: self.params().to_json(),
        }
    }

    /// Printable hierarchy, children sorted by name.
    ///
    /// `├─` marks an assembly and `├○` a part; the first line is `name`, or
    /// the component's parameters when no name is given.
    ///
    /// ```text
    /// block_tree
    ///  ├○ base
    ///  └─ tower
    ///      ├○ left
    ///      └○ right
    /// ```
    pub fn tree_string(&self, name: Option<&str>) -> String {
        let mut out = match name {
            Some(name) => name.to_string(),
            None => self.params().to_string(),
        };
        out.push('\n');
        self.write_tree(&mut out, "");
        out
    }

    fn write_tree(&self, out: &mut String, prefix: &str) {
        let Some(children) = self.children() else {
            return;
        };
        let mut sorted: Vec<_> = children.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let count = sorted.len();
        for (i, (name, child)) in sorted.into_iter().enumerate() {
            let last = i + 1 == count;
            let branch = if last { '└' } else { '├' };
            let marker = if child.is_assembly() { '─' } else { '○' };
            out.push_str(&format!("{prefix} {branch}{marker} {name}\n"));
            if child.is_assembly() {
                let nested = format!("{prefix}{}", if last { "    " } else { " │  " });
                child.write_tree(out, &nested);
            }
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}
