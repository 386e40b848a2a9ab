//! The multi-round assembly build cycle.
//!
//! Each round runs four phases: the assembly creates components, creates
//! constraints for them, the solver places them, and an optional
//! alteration step edits local geometry now that placement is known.
//! Rounds repeat until the assembly's [`Rounds`] iterator is exhausted.

use std::fmt;

use indexmap::IndexMap;
use joinery_ir::Shape;
use joinery_math::CoordSystem;
use tracing::{debug, info, instrument, trace};

use crate::component::{Component, ComponentId, ComponentKind};
use crate::config::BuildConfig;
use crate::constraint::Constraint;
use crate::mate::Mate;
use crate::solver;
use crate::{Error, Result};

// =============================================================================
// Phases and reports
// =============================================================================

/// Build state of one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    /// Not built yet.
    Pending,
    /// Creating this round's components.
    Components,
    /// Creating this round's constraints.
    Constraints,
    /// This round's components are placed.
    Solved,
    /// This round's alterations have run.
    Altered,
    /// Every round finished.
    Done,
    /// A round failed; the assembly cannot be rebuilt.
    Failed,
}

impl BuildPhase {
    /// Returns true if `next` may follow `self`.
    pub fn can_advance_to(self, next: BuildPhase) -> bool {
        use BuildPhase::*;
        matches!(
            (self, next),
            (Pending, Components)
                | (Pending, Done)
                | (Components, Constraints)
                | (Constraints, Solved)
                | (Solved, Altered)
                | (Altered, Components)
                | (Altered, Done)
        ) || (next == Failed && self != Done)
    }
}

/// Dotted path of a component from the root of a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComponentPath(Vec<String>);

impl ComponentPath {
    /// The root of a build.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the child `name`.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Names from the root down.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// One phase entry recorded during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEvent {
    /// Assembly that entered the phase.
    pub assembly: ComponentPath,
    /// 1-based round number; 0 for an assembly with no rounds.
    pub round: usize,
    /// Phase entered.
    pub phase: BuildPhase,
}

/// Trace of a build, in the order phases were entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Every phase entry, parents and children interleaved.
    pub events: Vec<PhaseEvent>,
}

impl BuildReport {
    /// Phases entered by the assembly at `path`.
    pub fn phases_of(&self, path: &ComponentPath) -> Vec<BuildPhase> {
        self.events
            .iter()
            .filter(|e| &e.assembly == path)
            .map(|e| e.phase)
            .collect()
    }

    /// Number of rounds run by the assembly at `path`.
    pub fn rounds_of(&self, path: &ComponentPath) -> usize {
        self.events
            .iter()
            .filter(|e| &e.assembly == path && e.phase == BuildPhase::Components)
            .count()
    }
}

// =============================================================================
// Rounds
// =============================================================================

type ComponentsFn<'a> = Box<dyn FnOnce(&BuildContext<'_>) -> Result<Vec<(String, Component)>> + 'a>;
type ConstraintsFn<'a> = Box<dyn FnOnce(&BuildContext<'_>) -> Result<Vec<Constraint>> + 'a>;
type AlterationsFn<'a> = Box<dyn FnOnce(&mut AlterContext<'_>) -> Result<()> + 'a>;

/// Lazily produced build rounds of an assembly.
pub type Rounds<'a> = Box<dyn Iterator<Item = Round<'a>> + 'a>;

/// Box any iterator of rounds.
pub fn rounds<'a, I>(rounds: I) -> Rounds<'a>
where
    I: IntoIterator<Item = Round<'a>>,
    I::IntoIter: 'a,
{
    Box::new(rounds.into_iter())
}

/// One build round: components, then constraints, then optional alterations.
///
/// ```
/// use joinery::{Component, Constraint, Round};
/// use joinery::primitives::Cube;
/// use joinery_params::ParametricObject;
///
/// let round = Round::new(|_| Ok(vec![("base".to_string(), Component::part(Cube::with_defaults()?))]))
///     .constraints(|ctx| Ok(vec![Constraint::fixed_at_origin(ctx.mate("base", "origin")?)]));
/// # drop(round);
/// ```
pub struct Round<'a> {
    components: ComponentsFn<'a>,
    constraints: ConstraintsFn<'a>,
    alterations: Option<AlterationsFn<'a>>,
}

impl<'a> Round<'a> {
    /// A round creating components with `f` and no constraints yet.
    pub fn new(f: impl FnOnce(&BuildContext<'_>) -> Result<Vec<(String, Component)>> + 'a) -> Self {
        Self {
            components: Box::new(f),
            constraints: Box::new(|_| Ok(Vec::new())),
            alterations: None,
        }
    }

    /// Set the constraints step. It sees this round's new components.
    pub fn constraints(mut self, f: impl FnOnce(&BuildContext<'_>) -> Result<Vec<Constraint>> + 'a) -> Self {
        self.constraints = Box::new(f);
        self
    }

    /// Set the alterations step. It runs after placement and after child
    /// assemblies introduced this round have been built.
    pub fn alterations(mut self, f: impl FnOnce(&mut AlterContext<'_>) -> Result<()> + 'a) -> Self {
        self.alterations = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Round<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Round")
            .field("alterations", &self.alterations.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Contexts
// =============================================================================

/// Read-only view of an assembly while it creates components and constraints.
pub struct BuildContext<'a> {
    assembly: ComponentId,
    path: &'a ComponentPath,
    origin: CoordSystem,
    children: &'a IndexMap<String, Component>,
}

impl<'a> BuildContext<'a> {
    /// Path of the assembly being built.
    pub fn path(&self) -> &ComponentPath {
        self.path
    }

    /// World frame of the assembly being built.
    pub fn origin(&self) -> &CoordSystem {
        &self.origin
    }

    /// Mate at the assembly's own origin, usable as a `Coincident` reference.
    pub fn assembly_origin(&self) -> Mate {
        Mate::new(self.assembly, crate::ORIGIN_MATE, CoordSystem::identity())
    }

    /// Child created in this or an earlier round.
    pub fn component(&self, name: &str) -> Result<&'a Component> {
        self.children.get(name).ok_or_else(|| Error::ComponentNotFound {
            path: self.path.child(name).to_string(),
        })
    }

    /// Named mate of a child.
    pub fn mate(&self, component: &str, mate: &str) -> Result<Mate> {
        self.component(component)?.mate(mate)
    }

    /// World frame of a child placed in an earlier round.
    pub fn world(&self, name: &str) -> Result<CoordSystem> {
        self.component(name)?
            .world
            .ok_or_else(|| Error::NotBuilt {
                path: self.path.child(name).to_string(),
            })
    }

    /// Frame of a placed child relative to the assembly.
    pub fn placement(&self, name: &str) -> Result<CoordSystem> {
        Ok(self.world(name)?.relative_to(&self.origin))
    }
}

/// Mutable view of an assembly's children during the alteration phase.
pub struct AlterContext<'a> {
    path: &'a ComponentPath,
    origin: CoordSystem,
    children: &'a mut IndexMap<String, Component>,
}

impl AlterContext<'_> {
    /// Path of the assembly being altered.
    pub fn path(&self) -> &ComponentPath {
        self.path
    }

    /// World frame of the assembly.
    pub fn origin(&self) -> &CoordSystem {
        &self.origin
    }

    /// A child.
    pub fn component(&self, name: &str) -> Result<&Component> {
        self.children.get(name).ok_or_else(|| Error::ComponentNotFound {
            path: self.path.child(name).to_string(),
        })
    }

    /// A child, mutably.
    pub fn component_mut(&mut self, name: &str) -> Result<&mut Component> {
        let path = self.path;
        self.children
            .get_mut(name)
            .ok_or_else(|| Error::ComponentNotFound {
                path: path.child(name).to_string(),
            })
    }

    /// World frame of a placed child.
    pub fn world(&self, name: &str) -> Result<CoordSystem> {
        self.component(name)?
            .world
            .ok_or_else(|| Error::NotBuilt {
                path: self.path.child(name).to_string(),
            })
    }

    /// Subtract `tool`'s cutter from the part `target`.
    ///
    /// The tool contributes [`Part::make_cutter`](crate::Part::make_cutter)
    /// when it has one, otherwise its local shape. The cutter is moved into
    /// the target's local frame before the cut.
    pub fn cut(&mut self, target: &str, tool: &str) -> Result<()> {
        let tool_component = self.component(tool)?;
        let cutter = match tool_component.as_part() {
            Some(part) => match part.make_cutter()? {
                Some(cutter) => cutter,
                None => tool_component.local_shape()?,
            },
            None => tool_component.local_shape()?,
        };
        let relative = self.world(tool)?.relative_to(&self.world(target)?);
        let moved = cutter.transformed(&relative);

        let path = self.path.child(target).to_string();
        let part = self.component_mut(target)?;
        if !part.is_part() {
            return Err(Error::NotAPart { path });
        }
        let shape: Shape = part.local_shape()?.cut(moved);
        part.set_shape(shape)?;
        trace!(part = %path, tool, "cut applied");
        Ok(())
    }
}

// =============================================================================
// Driver
// =============================================================================

fn enter(
    phase: &mut BuildPhase,
    next: BuildPhase,
    path: &ComponentPath,
    round: usize,
    report: &mut BuildReport,
) {
    debug_assert!(phase.can_advance_to(next), "{phase:?} -> {next:?}");
    *phase = next;
    debug!(assembly = %path, round, phase = ?next, "entering phase");
    report.events.push(PhaseEvent {
        assembly: path.clone(),
        round,
        phase: next,
    });
}

fn validate_name(name: &str, path: &ComponentPath) -> Result<()> {
    if name.is_empty() || name.contains('.') {
        return Err(Error::InvalidComponentName {
            assembly: path.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Build `component`, which must already have a world frame.
///
/// A finished assembly is rebuilt from scratch; a failed one is refused.
#[instrument(level = "debug", skip_all, fields(assembly = %path))]
pub(crate) fn build_assembly(
    component: &mut Component,
    path: &ComponentPath,
    config: &BuildConfig,
    report: &mut BuildReport,
) -> Result<()> {
    let id = component.id();
    let origin = component.world.ok_or_else(|| Error::NotBuilt {
        path: path.to_string(),
    })?;
    let ComponentKind::Assembly(node) = &mut component.kind else {
        return Ok(());
    };
    match node.phase {
        BuildPhase::Failed => {
            return Err(Error::PartialBuild {
                path: path.to_string(),
            })
        }
        BuildPhase::Pending => {}
        _ => {
            node.children.clear();
            node.constraints.clear();
            node.phase = BuildPhase::Pending;
        }
    }

    let crate::component::AssemblyNode {
        def,
        children,
        constraints,
        phase,
    } = node;

    let mut round = 0;
    let result = (|| -> Result<()> {
        for Round {
            components: make_components,
            constraints: make_constraints,
            alterations,
        } in def.rounds()
        {
            round += 1;
            if round > config.max_rounds {
                return Err(Error::TooManyRounds {
                    path: path.to_string(),
                    limit: config.max_rounds,
                });
            }

            // Components
            enter(phase, BuildPhase::Components, path, round, report);
            let ctx = BuildContext {
                assembly: id,
                path,
                origin,
                children: &*children,
            };
            let created = make_components(&ctx)?;
            let mut introduced = Vec::with_capacity(created.len());
            for (name, child) in created {
                validate_name(&name, path)?;
                if children.contains_key(&name) {
                    return Err(Error::DuplicateComponentName {
                        assembly: path.to_string(),
                        name,
                    });
                }
                // children are placed by constraints only
                if child.world.is_some() {
                    return Err(Error::DuplicatePlacement {
                        path: path.child(&name).to_string(),
                    });
                }
                children.insert(name.clone(), child);
                introduced.push(name);
            }

            // Constraints
            enter(phase, BuildPhase::Constraints, path, round, report);
            let ctx = BuildContext {
                assembly: id,
                path,
                origin,
                children: &*children,
            };
            let new_constraints = make_constraints(&ctx)?;

            // Solve
            let placements =
                solver::solve(&new_constraints, children, &introduced, id, &origin, path)?;
            for placement in placements {
                trace!(component = %path.child(&placement.name), world = %placement.world, "placed");
                if let Some(child) = children.get_mut(&placement.name) {
                    child.world = Some(placement.world);
                }
            }
            constraints.extend(new_constraints);
            enter(phase, BuildPhase::Solved, path, round, report);

            if config.recursive {
                for name in &introduced {
                    if let Some(child) = children.get_mut(name) {
                        if child.is_assembly() {
                            build_assembly(child, &path.child(name), config, report)?;
                        }
                    }
                }
            }

            // Alterations
            if let Some(alter) = alterations {
                let mut ctx = AlterContext {
                    path,
                    origin,
                    children: &mut *children,
                };
                alter(&mut ctx)?;
            }
            enter(phase, BuildPhase::Altered, path, round, report);
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            enter(phase, BuildPhase::Done, path, round, report);
            info!(assembly = %path, rounds = round, components = children.len(), "assembly built");
            Ok(())
        }
        Err(e) => {
            *phase = BuildPhase::Failed;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_transitions() {
        use BuildPhase::*;
        assert!(Pending.can_advance_to(Components));
        assert!(Altered.can_advance_to(Components));
        assert!(Altered.can_advance_to(Done));
        assert!(Pending.can_advance_to(Done));
        assert!(Constraints.can_advance_to(Failed));
        assert!(!Components.can_advance_to(Solved));
        assert!(!Solved.can_advance_to(Components));
        assert!(!Done.can_advance_to(Failed));
    }

    #[test]
    fn path_display() {
        let root = ComponentPath::root();
        assert_eq!(root.to_string(), "(root)");
        assert!(root.is_root());
        let p = root.child("motor").child("shaft");
        assert_eq!(p.to_string(), "motor.shaft");
        assert_eq!(p.segments().len(), 2);
    }

    #[test]
    fn report_filters_by_assembly() {
        let root = ComponentPath::root();
        let child = root.child("sub");
        let report = BuildReport {
            events: vec![
                PhaseEvent { assembly: root.clone(), round: 1, phase: BuildPhase::Components },
                PhaseEvent { assembly: child.clone(), round: 1, phase: BuildPhase::Components },
                PhaseEvent { assembly: root.clone(), round: 1, phase: BuildPhase::Done },
            ],
        };
        assert_eq!(report.phases_of(&root), [BuildPhase::Components, BuildPhase::Done]);
        assert_eq!(report.rounds_of(&child), 1);
    }
}
