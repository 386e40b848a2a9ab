#![warn(missing_docs)]

//! Parametric assemblies: parts and assemblies placed by mates and constraints.
//!
//! A [`Component`] wraps either a [`Part`] (a leaf producing a [`Shape`]) or
//! an [`Assembly`] (a container that creates named children and constrains
//! them). Building an assembly runs its [`Round`]s: each round creates
//! components, constrains them, lets the solver place them, and may then
//! alter local geometry now that every placement is known.
//!
//! ```
//! use joinery::{rounds, Assembly, Component, Constraint, Rounds, Round};
//! use joinery::primitives::Cube;
//! use joinery_math::CoordSystem;
//! use joinery_params::{ParamTable, ParametricObject, Params};
//! use std::sync::LazyLock;
//!
//! static STACK: LazyLock<ParamTable> = LazyLock::new(|| ParamTable::builder("Stack").build());
//!
//! #[derive(Debug)]
//! struct Stack(Params);
//!
//! impl ParametricObject for Stack {
//!     fn param_table() -> &'static ParamTable { &STACK }
//!     fn from_params(params: Params) -> Self { Stack(params) }
//!     fn params(&self) -> &Params { &self.0 }
//! }
//!
//! impl Assembly for Stack {
//!     fn rounds(&self) -> Rounds<'_> {
//!         rounds([Round::new(|_| {
//!             Ok(vec![
//!                 ("base".to_string(), Component::part(Cube::with_defaults()?)),
//!                 ("top".to_string(), Component::part(Cube::with_defaults()?)),
//!             ])
//!         })
//!         .constraints(|ctx| {
//!             Ok(vec![
//!                 Constraint::fixed_at_origin(ctx.mate("base", "origin")?),
//!                 Constraint::coincident(ctx.mate("top", "bottom")?, ctx.mate("base", "top")?),
//!             ])
//!         })])
//!     }
//! }
//!
//! let mut stack = Component::assembly(Stack::with_defaults()?);
//! stack.build()?;
//! assert_eq!(stack.find("top")?.world(), Some(&CoordSystem::at(0.0, 0.0, 1.0)));
//! # Ok::<(), joinery::Error>(())
//! ```

pub mod build;
pub mod catalogue;
pub mod component;
pub mod config;
pub mod constraint;
pub mod error;
pub mod kernel;
pub mod mate;
pub mod primitives;
pub mod registry;
pub mod solver;

pub use build::{
    rounds, AlterContext, BuildContext, BuildPhase, BuildReport, ComponentPath, PhaseEvent, Round,
    Rounds,
};
pub use catalogue::{Catalogue, JsonCatalogue};
pub use component::{
    Assembly, Component, ComponentId, ComponentKind, Parametric, Part, LIB_NAME, ORIGIN_MATE,
};
pub use config::BuildConfig;
pub use constraint::Constraint;
pub use error::{Error, Result};
pub use kernel::{Bounds, BoundsKernel, FaceSelector, GeometryKernel, KernelError};
pub use mate::Mate;
pub use registry::{ClassKind, ComponentClass, Registry};

pub use joinery_ir::{ComponentRecord, Criteria, Shape};
pub use joinery_math::{CoordSystem, Tolerance};
pub use joinery_params::{ParamTable, Parameter, ParameterError, ParametricObject, Params, Value};
