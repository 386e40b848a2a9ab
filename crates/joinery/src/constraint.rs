//! Placement constraints.

use joinery_math::CoordSystem;

use crate::component::ComponentId;
use crate::mate::Mate;

/// How one component's world frame is derived.
///
/// The constrained component is always the owner of `mate`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Put `mate` at `world`, given in the owning assembly's frame.
    Fixed {
        /// Mate on the constrained component.
        mate: Mate,
        /// Target frame relative to the assembly.
        world: CoordSystem,
    },
    /// Make `mate` coincide with `to`, a mate on an already placed component
    /// or on the owning assembly itself.
    Coincident {
        /// Mate on the constrained component.
        mate: Mate,
        /// Reference mate.
        to: Mate,
    },
}

impl Constraint {
    /// [`Constraint::Fixed`] at `world`.
    pub fn fixed(mate: Mate, world: CoordSystem) -> Self {
        Constraint::Fixed { mate, world }
    }

    /// [`Constraint::Fixed`] at the assembly's origin.
    pub fn fixed_at_origin(mate: Mate) -> Self {
        Self::fixed(mate, CoordSystem::identity())
    }

    /// [`Constraint::Coincident`] of `mate` onto `to`.
    pub fn coincident(mate: Mate, to: Mate) -> Self {
        Constraint::Coincident { mate, to }
    }

    /// Mate on the constrained component.
    pub fn mate(&self) -> &Mate {
        match self {
            Constraint::Fixed { mate, .. } | Constraint::Coincident { mate, .. } => mate,
        }
    }

    /// The component this constraint places.
    pub fn target(&self) -> ComponentId {
        self.mate().owner()
    }
}
