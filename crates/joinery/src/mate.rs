//! Named attachment frames.

use std::ops::Add;

use joinery_math::CoordSystem;

use crate::component::ComponentId;

/// A named frame in its owner's local coordinates.
///
/// Mates are plain values: the owner is an id resolved through the owning
/// assembly's component table when constraints are solved.
#[derive(Debug, Clone, PartialEq)]
pub struct Mate {
    owner: ComponentId,
    name: String,
    local: CoordSystem,
}

impl Mate {
    /// Create a mate owned by `owner`.
    pub fn new(owner: ComponentId, name: impl Into<String>, local: CoordSystem) -> Self {
        Self {
            owner,
            name: name.into(),
            local,
        }
    }

    /// Component the mate belongs to.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    /// Mate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame in the owner's local coordinates.
    pub fn local(&self) -> &CoordSystem {
        &self.local
    }

    /// The same mate moved by `offset`, expressed in the mate's own frame.
    pub fn offset(&self, offset: &CoordSystem) -> Mate {
        Mate {
            owner: self.owner,
            name: self.name.clone(),
            local: self.local + *offset,
        }
    }

    /// World frame of the mate, given its owner's world frame.
    pub fn world(&self, owner_world: &CoordSystem) -> CoordSystem {
        owner_world + &self.local
    }
}

impl Add<CoordSystem> for Mate {
    type Output = Mate;

    fn add(self, rhs: CoordSystem) -> Mate {
        Mate {
            local: self.local + rhs,
            ..self
        }
    }
}

impl Add<&CoordSystem> for &Mate {
    type Output = Mate;

    fn add(self, rhs: &CoordSystem) -> Mate {
        self.offset(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::alloc_component_id;

    #[test]
    fn offset_applies_in_mate_frame() {
        let owner = alloc_component_id();
        let m = Mate::new(
            owner,
            "side",
            CoordSystem::at(1.0, 0.0, 0.0).rotated_euler(0.0, 0.0, 90.0),
        );
        let shifted = m.clone() + CoordSystem::at(2.0, 0.0, 0.0);
        assert_eq!(shifted.owner(), owner);
        assert_eq!(shifted.name(), "side");
        // local x of the mate points along +Y of its owner
        assert_eq!(*shifted.local(), CoordSystem::at(1.0, 2.0, 0.0).rotated_euler(0.0, 0.0, 90.0));
        assert_eq!(&m + &CoordSystem::at(2.0, 0.0, 0.0), shifted);
    }

    #[test]
    fn world_composes_owner_frame() {
        let m = Mate::new(alloc_component_id(), "top", CoordSystem::at(0.0, 0.0, 5.0));
        let world = m.world(&CoordSystem::at(10.0, 0.0, 0.0));
        assert_eq!(world, CoordSystem::at(10.0, 0.0, 5.0));
    }
}
