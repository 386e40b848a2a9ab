//! Deterministic placement of one round's components.
//!
//! Every introduced component is the target of exactly one constraint, so
//! placement is a single pass: `Fixed` constraints first, then `Coincident`
//! constraints in authoring order.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use joinery_math::CoordSystem;

use crate::build::ComponentPath;
use crate::component::{Component, ComponentId};
use crate::constraint::Constraint;
use crate::{Error, Result};

/// World frame chosen for one child.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Child name.
    pub name: String,
    /// New world frame.
    pub world: CoordSystem,
}

/// Solve `constraints` for the children of the assembly `assembly`.
///
/// `introduced` names the children created this round; each must end up
/// with exactly one placement. Children placed in earlier rounds may be used
/// as coincident references but never re-targeted.
pub fn solve(
    constraints: &[Constraint],
    children: &IndexMap<String, Component>,
    introduced: &[String],
    assembly: ComponentId,
    origin: &CoordSystem,
    path: &ComponentPath,
) -> Result<Vec<Placement>> {
    let names: HashMap<ComponentId, &str> = children
        .iter()
        .map(|(name, c)| (c.id(), name.as_str()))
        .collect();

    // Targets
    let mut targeted = HashSet::new();
    for constraint in constraints {
        let id = constraint.target();
        let Some(name) = names.get(&id) else {
            return Err(Error::UnresolvedReference {
                path: path.to_string(),
                reference: format!("component {id}"),
            });
        };
        let placed_earlier = children
            .get(*name)
            .is_some_and(|c| c.world.is_some());
        if placed_earlier || !targeted.insert(id) {
            return Err(Error::DuplicatePlacement {
                path: path.child(name).to_string(),
            });
        }
    }

    let mut solved: HashMap<ComponentId, CoordSystem> = HashMap::new();
    let mut placements = Vec::with_capacity(constraints.len());

    let fixed = constraints
        .iter()
        .filter(|c| matches!(c, Constraint::Fixed { .. }));
    let coincident = constraints
        .iter()
        .filter(|c| matches!(c, Constraint::Coincident { .. }));

    for constraint in fixed.chain(coincident) {
        let mate = constraint.mate();
        let name = names
            .get(&mate.owner())
            .copied()
            .ok_or_else(|| Error::UnresolvedReference {
                path: path.to_string(),
                reference: format!("component {}", mate.owner()),
            })?;
        let world = match constraint {
            Constraint::Fixed { world, .. } => origin + world - *mate.local(),
            Constraint::Coincident { to, .. } => {
                let base = if to.owner() == assembly {
                    *origin
                } else {
                    let reference = names.get(&to.owner()).copied();
                    let placed = reference.and_then(|r| {
                        solved
                            .get(&to.owner())
                            .copied()
                            .or_else(|| children.get(r).and_then(|c| c.world))
                    });
                    placed.ok_or_else(|| Error::UnresolvedReference {
                        path: path.child(name).to_string(),
                        reference: format!(
                            "{}.{}",
                            reference.map_or_else(|| to.owner().to_string(), str::to_string),
                            to.name()
                        ),
                    })?
                };
                base + *to.local() - *mate.local()
            }
        };
        solved.insert(mate.owner(), world);
        placements.push(Placement {
            name: name.to_string(),
            world,
        });
    }

    for name in introduced {
        let placed = children
            .get(name)
            .is_some_and(|c| solved.contains_key(&c.id()));
        if !placed {
            return Err(Error::UnplacedComponent {
                path: path.child(name).to_string(),
            });
        }
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{alloc_component_id, ORIGIN_MATE};
    use crate::primitives::Cube;
    use joinery_params::ParametricObject;

    fn table(names: &[&str]) -> IndexMap<String, Component> {
        names
            .iter()
            .map(|n| (n.to_string(), Component::part(Cube::with_defaults().unwrap())))
            .collect()
    }

    fn introduced(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn mate(children: &IndexMap<String, Component>, c: &str, m: &str) -> crate::Mate {
        children[c].mate(m).unwrap()
    }

    #[test]
    fn fixed_respects_assembly_origin() {
        let children = table(&["a"]);
        let origin = CoordSystem::at(10.0, 0.0, 0.0);
        let top = mate(&children, "a", "top");
        let out = solve(
            &[Constraint::fixed(top, CoordSystem::at(0.0, 0.0, 5.0))],
            &children,
            &introduced(&["a"]),
            alloc_component_id(),
            &origin,
            &ComponentPath::root(),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        // the top face (z = 0.5 locally) lands at z = 5 in the assembly
        assert_eq!(out[0].world, CoordSystem::at(10.0, 0.0, 4.5));
    }

    #[test]
    fn coincident_after_fixed_regardless_of_order() {
        let children = table(&["a", "b"]);
        let constraints = [
            Constraint::coincident(mate(&children, "b", "bottom"), mate(&children, "a", "top")),
            Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE)),
        ];
        let out = solve(
            &constraints,
            &children,
            &introduced(&["a", "b"]),
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap();
        assert_eq!(out[0].name, "a");
        assert_eq!(out[1].name, "b");
        assert_eq!(out[1].world, CoordSystem::at(0.0, 0.0, 1.0));
    }

    #[test]
    fn coincident_to_assembly_uses_origin() {
        let children = table(&["a"]);
        let asm = alloc_component_id();
        let to = crate::Mate::new(asm, "shelf", CoordSystem::at(0.0, 2.0, 0.0));
        let out = solve(
            &[Constraint::coincident(mate(&children, "a", ORIGIN_MATE), to)],
            &children,
            &introduced(&["a"]),
            asm,
            &CoordSystem::at(1.0, 0.0, 0.0),
            &ComponentPath::root(),
        )
        .unwrap();
        assert_eq!(out[0].world, CoordSystem::at(1.0, 2.0, 0.0));
    }

    #[test]
    fn forward_reference_is_unresolved() {
        let children = table(&["a", "b", "c"]);
        let constraints = [
            Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE)),
            Constraint::coincident(mate(&children, "b", "bottom"), mate(&children, "c", "top")),
            Constraint::coincident(mate(&children, "c", "bottom"), mate(&children, "a", "top")),
        ];
        let err = solve(
            &constraints,
            &children,
            &introduced(&["a", "b", "c"]),
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root().child("stack"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedReference { ref path, ref reference }
                if path == "stack.b" && reference == "c.top"
        ));
    }

    #[test]
    fn double_target_is_duplicate() {
        let children = table(&["a"]);
        let constraints = [
            Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE)),
            Constraint::fixed(mate(&children, "a", ORIGIN_MATE), CoordSystem::at(1.0, 0.0, 0.0)),
        ];
        let err = solve(
            &constraints,
            &children,
            &introduced(&["a"]),
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicatePlacement { ref path } if path == "a"));
    }

    #[test]
    fn replacing_earlier_round_is_duplicate() {
        let mut children = table(&["a"]);
        children["a"].world = Some(CoordSystem::identity());
        let err = solve(
            &[Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE))],
            &children,
            &[],
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicatePlacement { .. }));
    }

    #[test]
    fn unknown_target_is_unresolved() {
        let children = table(&["a"]);
        let stranger = Component::part(Cube::with_defaults().unwrap());
        let err = solve(
            &[Constraint::fixed_at_origin(stranger.mate_origin())],
            &children,
            &[],
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn unconstrained_component_is_unplaced() {
        let children = table(&["a", "b"]);
        let err = solve(
            &[Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE))],
            &children,
            &introduced(&["a", "b"]),
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnplacedComponent { ref path } if path == "b"));
    }

    #[test]
    fn existing_frame_is_not_a_placement() {
        let mut children = table(&["a", "b"]);
        children["b"].world = Some(CoordSystem::at(9.0, 9.0, 9.0));
        let err = solve(
            &[Constraint::fixed_at_origin(mate(&children, "a", ORIGIN_MATE))],
            &children,
            &introduced(&["a", "b"]),
            alloc_component_id(),
            &CoordSystem::identity(),
            &ComponentPath::root(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnplacedComponent { ref path } if path == "b"));
    }
}
