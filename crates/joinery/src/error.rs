use joinery_math::MathError;
use joinery_params::ParameterError;
use thiserror::Error;

use crate::kernel::KernelError;

/// Errors returned by assembly operations.
///
/// Placement errors carry the dotted path of the component from the root of
/// the build.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter failed validation.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    /// A frame could not be built.
    #[error(transparent)]
    Math(#[from] MathError),
    /// A component was the target of two constraints, or re-placed in a later round.
    #[error("{path}: component is placed more than once")]
    DuplicatePlacement {
        /// Component path.
        path: String,
    },
    /// A constraint named a component that is unknown or not yet placed.
    #[error("{path}: unresolved reference to {reference}")]
    UnresolvedReference {
        /// Path of the constrained component.
        path: String,
        /// The reference that could not be resolved.
        reference: String,
    },
    /// A component introduced in a round was not placed by any constraint.
    #[error("{path}: component is not placed by any constraint")]
    UnplacedComponent {
        /// Component path.
        path: String,
    },
    /// Two components of one assembly share a name.
    #[error("{assembly}: duplicate component name {name:?}")]
    DuplicateComponentName {
        /// Assembly path.
        assembly: String,
        /// Repeated name.
        name: String,
    },
    /// A component name is empty or contains `.`.
    #[error("{assembly}: invalid component name {name:?}")]
    InvalidComponentName {
        /// Assembly path.
        assembly: String,
        /// Offending name.
        name: String,
    },
    /// A component has no mate with the requested name.
    #[error("{class} has no mate named {name:?}")]
    UnknownMate {
        /// Component class.
        class: String,
        /// Requested mate.
        name: String,
    },
    /// No component at the given path.
    #[error("no component at {path:?}")]
    ComponentNotFound {
        /// Requested path.
        path: String,
    },
    /// A path descended through a part.
    #[error("{path} is a part and has no children")]
    NotAnAssembly {
        /// Path of the part.
        path: String,
    },
    /// An operation needed a part but found an assembly.
    #[error("{path} is not a part")]
    NotAPart {
        /// Component path.
        path: String,
    },
    /// A world frame was needed before the component was placed.
    #[error("{path} has no world frame yet")]
    NotBuilt {
        /// Component path.
        path: String,
    },
    /// The assembly's previous build failed part way through.
    #[error("{path}: previous build failed; create a new assembly to retry")]
    PartialBuild {
        /// Assembly path.
        path: String,
    },
    /// The assembly yielded more rounds than configured.
    #[error("{path}: more than {limit} build rounds")]
    TooManyRounds {
        /// Assembly path.
        path: String,
        /// Configured limit.
        limit: usize,
    },
    /// A search matched nothing.
    #[error("no match for {criteria}")]
    SearchNoneFound {
        /// Query, as JSON.
        criteria: String,
    },
    /// A search expected one match and found several.
    #[error("{count} matches for {criteria}")]
    SearchMultipleFound {
        /// Query, as JSON.
        criteria: String,
        /// Number of matches.
        count: usize,
    },
    /// A record named a class the registry does not know.
    #[error("unknown component class {0:?}")]
    UnknownClass(String),
    /// A catalogue already holds an item with this id.
    #[error("catalogue already has an item with id {0:?}")]
    DuplicateCatalogueId(String),
    /// The geometry kernel failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias for assembly operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
