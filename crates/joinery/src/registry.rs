//! Criteria-keyed index of component classes.
//!
//! Classes are registered with scalar search criteria; [`Registry::search`]
//! returns every class matching all pairs of a query and
//! [`Registry::find`] insists on exactly one. The registry also maps class
//! names back to constructors, which is how serialized components are
//! rebuilt.

use std::fmt;

use indexmap::IndexMap;
use joinery_ir::{criteria_match, ComponentRecord, Criteria};
use joinery_params::{ParametricObject, Params};

use crate::component::{Assembly, Component, Part};
use crate::{Error, Result};

/// JSON parameter map of a component record.
pub type ParamMap = serde_json::Map<String, serde_json::Value>;

/// Whether a class builds parts or assemblies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Leaf components.
    Part,
    /// Container components.
    Assembly,
}

/// A registrable component class: name, kind and constructor.
#[derive(Clone, Copy)]
pub struct ComponentClass {
    name: &'static str,
    kind: ClassKind,
    /// Build an unplaced component from a JSON parameter map.
    pub construct: fn(&ParamMap) -> Result<Component>,
}

fn params_for<T: ParametricObject>(json: &ParamMap) -> Result<T> {
    let mut params = Params::from_json(T::param_table(), json)?;
    T::initialize_parameters(&mut params)?;
    Ok(T::from_params(params))
}

fn construct_part<T: ParametricObject + Part + 'static>(json: &ParamMap) -> Result<Component> {
    Ok(Component::part(params_for::<T>(json)?))
}

fn construct_assembly<T: ParametricObject + Assembly + 'static>(
    json: &ParamMap,
) -> Result<Component> {
    Ok(Component::assembly(params_for::<T>(json)?))
}

impl ComponentClass {
    /// Class entry for the part type `T`.
    pub fn part<T: ParametricObject + Part + 'static>() -> Self {
        Self {
            name: T::param_table().class_name(),
            kind: ClassKind::Part,
            construct: construct_part::<T>,
        }
    }

    /// Class entry for the assembly type `T`.
    pub fn assembly<T: ParametricObject + Assembly + 'static>() -> Self {
        Self {
            name: T::param_table().class_name(),
            kind: ClassKind::Assembly,
            construct: construct_assembly::<T>,
        }
    }

    /// Class name, as written in component records.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Part or assembly.
    pub fn kind(&self) -> ClassKind {
        self.kind
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The only entry of `found`, or the search error describing `query`.
pub(crate) fn single_match<T>(found: Vec<T>, query: &Criteria) -> Result<T> {
    let describe = || serde_json::Value::Object(query.clone().into_iter().collect()).to_string();
    let count = found.len();
    let mut found = found.into_iter();
    match (found.next(), count) {
        (Some(only), 1) => Ok(only),
        (None, _) => Err(Error::SearchNoneFound {
            criteria: describe(),
        }),
        _ => Err(Error::SearchMultipleFound {
            criteria: describe(),
            count,
        }),
    }
}

/// Registered classes, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    classes: IndexMap<&'static str, (ComponentClass, Criteria)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` under `criteria`.
    ///
    /// Registering a class name again replaces its entry. Nothing stops two
    /// classes from sharing criteria; such classes can only be told apart
    /// with [`Registry::search`].
    pub fn register<I>(&mut self, class: ComponentClass, criteria: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        self.classes
            .insert(class.name, (class, criteria.into_iter().collect()));
    }

    /// Register a class with no criteria; it can still be deserialized.
    pub fn register_class(&mut self, class: ComponentClass) {
        self.register(class, std::iter::empty());
    }

    /// Register with `common` criteria shared by a family of classes, then
    /// `criteria` specific to this one (which win on conflict).
    pub fn register_with_common<C, I>(&mut self, class: ComponentClass, common: C, criteria: I)
    where
        C: IntoIterator<Item = (String, serde_json::Value)>,
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        self.register(class, common.into_iter().chain(criteria));
    }

    /// Every class matching all pairs of `query`; all classes for an empty query.
    pub fn search(&self, query: &Criteria) -> Vec<&ComponentClass> {
        self.classes
            .values()
            .filter(|(_, criteria)| criteria_match(criteria, query))
            .map(|(class, _)| class)
            .collect()
    }

    /// The single class matching `query`.
    pub fn find(&self, query: &Criteria) -> Result<&ComponentClass> {
        single_match(self.search(query), query)
    }

    /// Class registered under `name`.
    pub fn class(&self, name: &str) -> Result<&ComponentClass> {
        self.classes
            .get(name)
            .map(|(class, _)| class)
            .ok_or_else(|| Error::UnknownClass(name.to_string()))
    }

    /// Criteria registered for `name`.
    pub fn criteria(&self, name: &str) -> Option<&Criteria> {
        self.classes.get(name).map(|(_, criteria)| criteria)
    }

    /// Rebuild an unplaced component from its record.
    pub fn deserialize(&self, record: &ComponentRecord) -> Result<Component> {
        let class = self.class(&record.class)?;
        (class.construct)(&record.params)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
