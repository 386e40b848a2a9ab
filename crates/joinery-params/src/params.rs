use std::fmt;

use indexmap::IndexMap;

use crate::{ParamTable, ParameterError, Value};

/// Validated parameter values of one instance, keyed by name.
///
/// Every declared parameter has an entry, and every entry went through its
/// parameter's cast. Two `Params` are equal when they belong to the same
/// class and hold equal values.
#[derive(Clone)]
pub struct Params {
    table: &'static ParamTable,
    values: IndexMap<String, Value>,
}

impl Params {
    /// Validate `overrides` against `table`, filling the rest from defaults.
    ///
    /// Unknown names are all reported together. Defaults are cast as well,
    /// so an invalid default surfaces here.
    pub fn build<I, K, V>(table: &'static ParamTable, overrides: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let class = table.class_name();
        let mut given: IndexMap<String, Value> = overrides
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut unknown: Vec<String> = given
            .keys()
            .filter(|k| !table.contains(k))
            .cloned()
            .chain(table.orphans().iter().cloned())
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(ParameterError::UnknownParameters {
                class: class.to_string(),
                names: unknown,
            });
        }

        let mut values = IndexMap::with_capacity(table.len());
        for param in table.iter() {
            let raw = given
                .shift_remove(param.name())
                .unwrap_or_else(|| param.default_value().clone());
            values.insert(param.name().to_string(), param.cast(class, raw)?);
        }
        Ok(Self { table, values })
    }

    /// All defaults of `table`.
    pub fn defaults(table: &'static ParamTable) -> Result<Self, ParameterError> {
        Self::build(table, std::iter::empty::<(String, Value)>())
    }

    /// Validate a JSON parameter map, as produced by [`Params::to_json`].
    pub fn from_json(
        table: &'static ParamTable,
        json: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, ParameterError> {
        Self::build(
            table,
            json.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))),
        )
    }

    /// Name of the owning class.
    pub fn class_name(&self) -> &'static str {
        self.table.class_name()
    }

    /// The flattened table these values were validated against.
    pub fn table(&self) -> &'static ParamTable {
        self.table
    }

    /// Raw value of `name`.
    pub fn get(&self, name: &str) -> Result<&Value, ParameterError> {
        self.values.get(name).ok_or_else(|| self.undeclared(name))
    }

    /// Replace the value of `name`, casting it through the parameter.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ParameterError> {
        let param = self.table.get(name).ok_or_else(|| self.undeclared(name))?;
        let cast = param.cast(self.class_name(), value.into())?;
        self.values.insert(name.to_string(), cast);
        Ok(())
    }

    /// The error an `initialize_parameters` hook returns when values that
    /// are valid one by one do not fit together.
    pub fn reject(&self, reason: impl Into<String>) -> ParameterError {
        ParameterError::Initialize {
            class: self.class_name().to_string(),
            reason: reason.into(),
        }
    }

    /// Values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Non-null float.
    pub fn float(&self, name: &str) -> Result<f64, ParameterError> {
        self.required(name, "float", self.opt_float(name)?)
    }

    /// Float or `None` when null.
    pub fn opt_float(&self, name: &str) -> Result<Option<f64>, ParameterError> {
        self.typed(name, "float", |v| match v {
            Value::Float(f) => Some(*f),
            _ => None,
        })
    }

    /// Non-null integer.
    pub fn int(&self, name: &str) -> Result<i64, ParameterError> {
        self.required(name, "int", self.opt_int(name)?)
    }

    /// Integer or `None` when null.
    pub fn opt_int(&self, name: &str) -> Result<Option<i64>, ParameterError> {
        self.typed(name, "int", Value::as_i64)
    }

    /// Non-null boolean.
    pub fn boolean(&self, name: &str) -> Result<bool, ParameterError> {
        self.required(name, "bool", self.typed(name, "bool", Value::as_bool)?)
    }

    /// Non-null string.
    pub fn string(&self, name: &str) -> Result<&str, ParameterError> {
        self.required(name, "string", self.opt_string(name)?)
    }

    /// String or `None` when null.
    pub fn opt_string(&self, name: &str) -> Result<Option<&str>, ParameterError> {
        self.typed(name, "string", Value::as_str)
    }

    /// Non-null nested object.
    pub fn object(&self, name: &str) -> Result<&Params, ParameterError> {
        self.required(name, "object", self.opt_object(name)?)
    }

    /// Nested object or `None` when null.
    pub fn opt_object(&self, name: &str) -> Result<Option<&Params>, ParameterError> {
        self.typed(name, "object", Value::as_object)
    }

    /// Serialize every value to JSON, in declaration order.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        view: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, ParameterError> {
        let value = self.get(name)?;
        if value.is_null() {
            return Ok(None);
        }
        view(value)
            .map(Some)
            .ok_or_else(|| ParameterError::WrongType {
                class: self.class_name().to_string(),
                name: name.to_string(),
                expected,
                found: value.type_name(),
            })
    }

    fn required<T>(
        &self,
        name: &str,
        expected: &'static str,
        value: Option<T>,
    ) -> Result<T, ParameterError> {
        value.ok_or_else(|| ParameterError::WrongType {
            class: self.class_name().to_string(),
            name: name.to_string(),
            expected,
            found: "null",
        })
    }

    fn undeclared(&self, name: &str) -> ParameterError {
        ParameterError::Undeclared {
            class: self.class_name().to_string(),
            name: name.to_string(),
        }
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.class_name() == other.class_name() && self.values == other.values
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("class", &self.class_name())
            .field("values", &self.values)
            .finish()
    }
}

/// `<Class: a=1, b='x'>`, sorted by name; names starting with `_` are hidden.
impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "<{}:", self.class_name())?;
        for (i, (k, v)) in entries.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{k}={v}")?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parameter, ParametricObject};
    use std::sync::LazyLock;

    struct Head(Params);

    impl ParametricObject for Head {
        fn param_table() -> &'static ParamTable {
            &HEAD
        }

        fn from_params(params: Params) -> Self {
            Head(params)
        }

        fn params(&self) -> &Params {
            &self.0
        }
    }

    static HEAD: LazyLock<ParamTable> = LazyLock::new(|| {
        ParamTable::builder("Head")
            .param(Parameter::positive_float("diameter", 5.0))
            .param(Parameter::positive_float("height", 2.0))
            .build()
    });

    static SCREW: LazyLock<ParamTable> = LazyLock::new(|| {
        ParamTable::builder("Screw")
            .param(Parameter::positive_float("length", 10.0))
            .param(Parameter::int_range("i", Some(1), Some(10), 3))
            .param(Parameter::float("tip", None::<f64>).nullable())
            .param(Parameter::lower_case_string("drive", "Phillips"))
            .param(Parameter::object::<Head>("head"))
            .param(Parameter::boolean("_internal", false))
            .build()
    });

    static BAD_DEFAULT: LazyLock<ParamTable> = LazyLock::new(|| {
        ParamTable::builder("BadDefault")
            .param(Parameter::positive_float("x", -1.0))
            .build()
    });

    #[test]
    fn defaults_are_cast() {
        let p = Params::defaults(&SCREW).unwrap();
        assert_eq!(p.float("length").unwrap(), 10.0);
        assert_eq!(p.int("i").unwrap(), 3);
        assert_eq!(p.opt_float("tip").unwrap(), None);
        assert_eq!(p.string("drive").unwrap(), "phillips");
        assert_eq!(p.object("head").unwrap().float("diameter").unwrap(), 5.0);
    }

    #[test]
    fn overrides_are_cast() {
        let p = Params::build(&SCREW, [("length", Value::from("123")), ("i", Value::from(2))]).unwrap();
        assert_eq!(p.float("length").unwrap(), 123.0);
        assert_eq!(p.int("i").unwrap(), 2);
    }

    #[test]
    fn unknown_names_reported_together() {
        let err = Params::build(&SCREW, [("zeta", 1), ("alpha", 2), ("i", 4)]).unwrap_err();
        assert_eq!(
            err,
            ParameterError::UnknownParameters {
                class: "Screw".into(),
                names: vec!["alpha".into(), "zeta".into()],
            }
        );
        assert_eq!(err.to_string(), "Screw does not accept parameter(s): alpha, zeta");
    }

    #[test]
    fn out_of_range_override_fails() {
        let err = Params::build(&SCREW, [("i", 11)]).unwrap_err();
        assert!(matches!(err, ParameterError::InvalidValue { ref name, .. } if name == "i"));
    }

    #[test]
    fn invalid_default_fails_at_construction() {
        assert!(matches!(
            Params::defaults(&BAD_DEFAULT),
            Err(ParameterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn nested_object_from_map() {
        let mut head = IndexMap::new();
        head.insert("height".to_string(), Value::Int(4));
        let p = Params::build(&SCREW, [("head", Value::Map(head))]).unwrap();
        let head = p.object("head").unwrap();
        assert_eq!(head.class_name(), "Head");
        assert_eq!(head.float("height").unwrap(), 4.0);
        assert_eq!(head.float("diameter").unwrap(), 5.0);
    }

    #[test]
    fn nested_object_rejects_bad_values() {
        let mut head = IndexMap::new();
        head.insert("height".to_string(), Value::Float(-1.0));
        assert!(Params::build(&SCREW, [("head", Value::Map(head))]).is_err());
    }

    #[test]
    fn set_revalidates() {
        let mut p = Params::defaults(&SCREW).unwrap();
        p.set("tip", 1).unwrap();
        assert_eq!(p.opt_float("tip").unwrap(), Some(1.0));
        assert!(p.set("length", -3.0).is_err());
        assert!(matches!(
            p.set("nope", 1),
            Err(ParameterError::Undeclared { .. })
        ));
    }

    #[test]
    fn typed_getters_report_mismatches() {
        let p = Params::defaults(&SCREW).unwrap();
        assert!(matches!(
            p.int("length"),
            Err(ParameterError::WrongType { expected: "int", found: "float", .. })
        ));
        assert!(matches!(
            p.float("tip"),
            Err(ParameterError::WrongType { found: "null", .. })
        ));
        assert!(matches!(p.get("missing"), Err(ParameterError::Undeclared { .. })));
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let mut head = IndexMap::new();
        head.insert("diameter".to_string(), Value::Float(6.5));
        let p = Params::build(
            &SCREW,
            [
                ("length", Value::Float(12.0)),
                ("tip", Value::Null),
                ("head", Value::Map(head)),
            ],
        )
        .unwrap();
        let json = p.to_json();
        assert_eq!(json["head"]["diameter"], serde_json::json!(6.5));
        let back = Params::from_json(&SCREW, &json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn display_sorted_and_hides_private_names() {
        let p = Params::defaults(&HEAD).unwrap();
        assert_eq!(p.to_string(), "<Head: diameter=5.0, height=2.0>");
        let s = Params::defaults(&SCREW).unwrap().to_string();
        assert!(s.starts_with("<Screw: drive='phillips', head=<Head: "));
        assert!(!s.contains("_internal"));
    }
}
