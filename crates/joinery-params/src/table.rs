use std::fmt;

use indexmap::IndexMap;

use crate::{Parameter, Value};

/// The flattened parameter table of one class.
///
/// Built once per class, usually inside a `static LazyLock`, by copying the
/// parent's table and layering the class's own declarations on top.
///
/// ```
/// use std::sync::LazyLock;
/// use joinery_params::{ParamTable, Parameter};
///
/// static SCREW: LazyLock<ParamTable> = LazyLock::new(|| {
///     ParamTable::builder("Screw")
///         .param(Parameter::positive_float("length", 10.0))
///         .param(Parameter::lower_case_string("drive", "phillips"))
///         .build()
/// });
///
/// static WOOD_SCREW: LazyLock<ParamTable> = LazyLock::new(|| {
///     ParamTable::builder("WoodScrew")
///         .extends(&SCREW)
///         .override_default("length", 25.0)
///         .build()
/// });
///
/// assert_eq!(WOOD_SCREW.names().collect::<Vec<_>>(), ["length", "drive"]);
/// ```
pub struct ParamTable {
    class: &'static str,
    params: IndexMap<String, Parameter>,
    orphans: Vec<String>,
}

impl ParamTable {
    /// Start a table for `class`.
    pub fn builder(class: &'static str) -> ParamTableBuilder {
        ParamTableBuilder {
            table: ParamTable {
                class,
                params: IndexMap::new(),
                orphans: Vec::new(),
            },
        }
    }

    /// Name of the class this table belongs to.
    pub fn class_name(&self) -> &'static str {
        self.class
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Returns true if `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Parameters in declaration order (inherited ones first).
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if the class declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Default overrides that named no declared parameter.
    pub(crate) fn orphans(&self) -> &[String] {
        &self.orphans
    }
}

impl fmt::Debug for ParamTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamTable")
            .field("class", &self.class)
            .field("params", &self.params.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder returned by [`ParamTable::builder`].
pub struct ParamTableBuilder {
    table: ParamTable,
}

impl ParamTableBuilder {
    /// Inherit every parameter of `parent`, in the parent's order.
    pub fn extends(mut self, parent: &ParamTable) -> Self {
        for p in parent.iter() {
            self.table.params.insert(p.name().to_string(), p.clone());
        }
        self.table.orphans.extend(parent.orphans.iter().cloned());
        self
    }

    /// Declare a parameter. Redeclaring an inherited name replaces it in place.
    pub fn param(mut self, param: Parameter) -> Self {
        self.table.params.insert(param.name().to_string(), param);
        self
    }

    /// Change the default of an inherited parameter, keeping its kind.
    ///
    /// Naming an undeclared parameter makes every construction of the class
    /// fail with [`ParameterError::UnknownParameters`](crate::ParameterError).
    pub fn override_default(mut self, name: &str, default: impl Into<Value>) -> Self {
        match self.table.params.get_mut(name) {
            Some(p) => *p = p.clone().with_default(default),
            None => self.table.orphans.push(name.to_string()),
        }
        self
    }

    /// Finish the table.
    pub fn build(self) -> ParamTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParamTable {
        ParamTable::builder("Base")
            .param(Parameter::float("a", 1.0))
            .param(Parameter::int("b", 2))
            .build()
    }

    #[test]
    fn redeclared_parameter_keeps_position() {
        let parent = base();
        let child = ParamTable::builder("Child")
            .extends(&parent)
            .param(Parameter::string("c", "x"))
            .param(Parameter::positive_int("a", 5))
            .build();
        assert_eq!(child.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(child.get("a").unwrap().default_value(), &Value::Int(5));
        assert_eq!(child.class_name(), "Child");
        assert_eq!(parent.get("a").unwrap().default_value(), &Value::Float(1.0));
    }

    #[test]
    fn override_default_keeps_kind() {
        let child = ParamTable::builder("Child")
            .extends(&base())
            .override_default("b", 7)
            .build();
        let b = child.get("b").unwrap();
        assert_eq!(b.default_value(), &Value::Int(7));
        assert_eq!(b.kind().label(), "int");
        assert!(child.orphans().is_empty());
    }

    #[test]
    fn override_of_unknown_name_is_recorded() {
        let child = ParamTable::builder("Child")
            .extends(&base())
            .override_default("zz", 1)
            .build();
        assert_eq!(child.orphans().to_vec(), vec!["zz".to_string()]);
        assert_eq!(child.len(), 2);
    }
}
