use std::fmt;
use std::sync::Arc;

use crate::{ParamTable, ParameterError, ParametricObject, Params, Value};

/// User-supplied cast function for [`ParamKind::Custom`].
///
/// Receives a non-null value and returns the stored value or a message.
pub type Validator = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Class hooks needed to cast a nested parametric object.
#[derive(Clone, Copy)]
pub struct ObjectClass {
    /// Flattened table of the nested class.
    pub table: fn() -> &'static ParamTable,
    /// The nested class's `initialize_parameters` hook.
    pub initialize: fn(&mut Params) -> Result<(), ParameterError>,
}

impl ObjectClass {
    /// Hooks for the parametric type `T`.
    pub fn of<T: ParametricObject>() -> Self {
        Self {
            table: T::param_table,
            initialize: T::initialize_parameters,
        }
    }
}

/// How a parameter validates and coerces its values.
#[derive(Clone)]
pub enum ParamKind {
    /// Any number; integers widen and strings are parsed.
    Float,
    /// A float `>= 0`.
    PositiveFloat,
    /// A float inside an inclusive range; `None` bounds are open.
    FloatRange {
        /// Lower bound.
        min: Option<f64>,
        /// Upper bound.
        max: Option<f64>,
    },
    /// An integer; integral floats and numeric strings are accepted.
    Int,
    /// An integer `>= 0`.
    PositiveInt,
    /// An integer inside an inclusive range; `None` bounds are open.
    IntRange {
        /// Lower bound.
        min: Option<i64>,
        /// Upper bound.
        max: Option<i64>,
    },
    /// A boolean; numbers are true when non-zero.
    Boolean,
    /// A string; numbers and booleans are formatted.
    String,
    /// A string folded to lower case.
    LowerCaseString,
    /// A string folded to upper case.
    UpperCaseString,
    /// A nested parametric object, given as an object or as an override map.
    Object(ObjectClass),
    /// A user-supplied validator.
    Custom {
        /// Type label shown in documentation and errors.
        label: &'static str,
        /// The cast function.
        validator: Validator,
    },
}

impl ParamKind {
    /// Human-readable type label.
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::PositiveFloat => "positive float",
            ParamKind::FloatRange { .. } => "float range",
            ParamKind::Int => "int",
            ParamKind::PositiveInt => "positive int",
            ParamKind::IntRange { .. } => "int range",
            ParamKind::Boolean => "bool",
            ParamKind::String => "string",
            ParamKind::LowerCaseString => "lower case string",
            ParamKind::UpperCaseString => "upper case string",
            ParamKind::Object(class) => (class.table)().class_name(),
            ParamKind::Custom { label, .. } => *label,
        }
    }

    /// Cast a non-null value into this kind.
    pub fn cast(&self, value: Value) -> Result<Value, String> {
        match self {
            ParamKind::Float => cast_float(&value).map(Value::Float),
            ParamKind::PositiveFloat => {
                let v = cast_float(&value)?;
                if v < 0.0 {
                    return Err(format!("value is not positive: {v}"));
                }
                Ok(Value::Float(v))
            }
            ParamKind::FloatRange { min, max } => {
                let v = cast_float(&value)?;
                if min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m) {
                    return Err(format!(
                        "value of {v} outside the range {{{}, {}}}",
                        bound(min),
                        bound(max)
                    ));
                }
                Ok(Value::Float(v))
            }
            ParamKind::Int => cast_int(&value).map(Value::Int),
            ParamKind::PositiveInt => {
                let v = cast_int(&value)?;
                if v < 0 {
                    return Err(format!("value is not positive: {v}"));
                }
                Ok(Value::Int(v))
            }
            ParamKind::IntRange { min, max } => {
                let v = cast_int(&value)?;
                if min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m) {
                    return Err(format!(
                        "value of {v} outside the range {{{}, {}}}",
                        bound(min),
                        bound(max)
                    ));
                }
                Ok(Value::Int(v))
            }
            ParamKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::Int(i) => Ok(Value::Bool(i != 0)),
                Value::Float(f) => Ok(Value::Bool(f != 0.0)),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(format!("value cannot be cast to bool: '{s}'")),
                },
                other => Err(format!("value cannot be cast to bool: {other}")),
            },
            ParamKind::String => cast_string(value).map(Value::Str),
            ParamKind::LowerCaseString => cast_string(value).map(|s| Value::Str(s.to_lowercase())),
            ParamKind::UpperCaseString => cast_string(value).map(|s| Value::Str(s.to_uppercase())),
            ParamKind::Object(class) => cast_object(class, value),
            ParamKind::Custom { validator, .. } => validator(value),
        }
    }
}

impl fmt::Debug for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::FloatRange { min, max } => write!(f, "FloatRange({min:?}, {max:?})"),
            ParamKind::IntRange { min, max } => write!(f, "IntRange({min:?}, {max:?})"),
            other => write!(f, "{}", other.label()),
        }
    }
}

fn bound<T: fmt::Display>(b: &Option<T>) -> String {
    b.as_ref().map_or_else(|| "None".to_string(), ToString::to_string)
}

fn cast_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("value cannot be cast to a float: {value}")),
        other => Err(format!("value cannot be cast to a float: {other}")),
    }
}

fn cast_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Float(f)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            Ok(*f as i64)
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("value cannot be cast to an integer: {value}")),
        other => Err(format!("value cannot be cast to an integer: {other}")),
    }
}

fn cast_string(value: Value) -> Result<String, String> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("value cannot be cast to string: {other}")),
    }
}

fn cast_object(class: &ObjectClass, value: Value) -> Result<Value, String> {
    let table = (class.table)();
    match value {
        Value::Object(params) if params.class_name() == table.class_name() => {
            Ok(Value::Object(params))
        }
        Value::Object(params) => Err(format!(
            "expected {}, got {}",
            table.class_name(),
            params.class_name()
        )),
        Value::Map(overrides) => {
            let mut params = Params::build(table, overrides).map_err(|e| e.to_string())?;
            (class.initialize)(&mut params).map_err(|e| e.to_string())?;
            Ok(Value::Object(Box::new(params)))
        }
        other => Err(format!(
            "value cannot be cast to {}: {other}",
            table.class_name()
        )),
    }
}

/// Declaration of one named parameter: kind, default and nullability.
///
/// ```
/// use joinery_params::Parameter;
///
/// let p = Parameter::float_range("angle", Some(0.0), Some(90.0), 45.0)
///     .doc("chamfer angle in degrees");
/// assert_eq!(p.name(), "angle");
/// ```
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    default: Value,
    nullable: bool,
    doc: Option<String>,
}

impl Parameter {
    /// Declare a parameter of any kind.
    pub fn new(name: impl Into<String>, kind: ParamKind, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: default.into(),
            nullable: false,
            doc: None,
        }
    }

    /// A [`ParamKind::Float`] parameter.
    pub fn float(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::Float, default)
    }

    /// A [`ParamKind::PositiveFloat`] parameter.
    pub fn positive_float(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::PositiveFloat, default)
    }

    /// A [`ParamKind::FloatRange`] parameter.
    pub fn float_range(
        name: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
        default: impl Into<Value>,
    ) -> Self {
        Self::new(name, ParamKind::FloatRange { min, max }, default)
    }

    /// A [`ParamKind::Int`] parameter.
    pub fn int(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::Int, default)
    }

    /// A [`ParamKind::PositiveInt`] parameter.
    pub fn positive_int(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::PositiveInt, default)
    }

    /// A [`ParamKind::IntRange`] parameter.
    pub fn int_range(
        name: impl Into<String>,
        min: Option<i64>,
        max: Option<i64>,
        default: impl Into<Value>,
    ) -> Self {
        Self::new(name, ParamKind::IntRange { min, max }, default)
    }

    /// A [`ParamKind::Boolean`] parameter.
    pub fn boolean(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::Boolean, default)
    }

    /// A [`ParamKind::String`] parameter.
    pub fn string(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::String, default)
    }

    /// A [`ParamKind::LowerCaseString`] parameter.
    pub fn lower_case_string(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::LowerCaseString, default)
    }

    /// A [`ParamKind::UpperCaseString`] parameter.
    pub fn upper_case_string(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::new(name, ParamKind::UpperCaseString, default)
    }

    /// A nested `T` object; the default builds `T` with its own defaults.
    pub fn object<T: ParametricObject>(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ParamKind::Object(ObjectClass::of::<T>()),
            Value::Map(Default::default()),
        )
    }

    /// A parameter cast by `validator`.
    pub fn custom(
        name: impl Into<String>,
        label: &'static str,
        validator: impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
        default: impl Into<Value>,
    ) -> Self {
        Self::new(
            name,
            ParamKind::Custom {
                label,
                validator: Arc::new(validator),
            },
            default,
        )
    }

    /// Allow null values (they bypass the kind's cast).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Attach a description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Replace the default value, keeping kind and nullability.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validation kind.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Uncast default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whether null is accepted.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Validate `value` for this parameter of `class`.
    pub fn cast(&self, class: &str, value: Value) -> Result<Value, ParameterError> {
        if value.is_null() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(ParameterError::NullValue {
                    class: class.to_string(),
                    name: self.name.clone(),
                })
            };
        }
        self.kind
            .cast(value)
            .map_err(|reason| ParameterError::InvalidValue {
                class: class.to_string(),
                name: self.name.clone(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast(p: &Parameter, v: impl Into<Value>) -> Result<Value, ParameterError> {
        p.cast("Test", v.into())
    }

    #[test]
    fn float_accepts_ints_and_numeric_strings() {
        let p = Parameter::float("x", 0.0);
        assert_eq!(cast(&p, 3).unwrap(), Value::Float(3.0));
        assert_eq!(cast(&p, "123").unwrap(), Value::Float(123.0));
        assert!(cast(&p, "abc").is_err());
        assert!(cast(&p, true).is_err());
    }

    #[test]
    fn positive_and_range_bounds() {
        let p = Parameter::positive_float("x", 1.0);
        assert!(cast(&p, 0.0).is_ok());
        assert!(cast(&p, -0.1).is_err());

        let r = Parameter::int_range("i", Some(1), Some(10), 3);
        assert_eq!(cast(&r, 10).unwrap(), Value::Int(10));
        let err = cast(&r, 11).unwrap_err();
        assert_eq!(
            err,
            ParameterError::InvalidValue {
                class: "Test".into(),
                name: "i".into(),
                reason: "value of 11 outside the range {1, 10}".into(),
            }
        );

        let open = Parameter::float_range("f", None, Some(2.0), 0.0);
        assert!(cast(&open, -1e9).is_ok());
        assert!(cast(&open, 2.5).is_err());
    }

    #[test]
    fn int_rejects_fractional_floats() {
        let p = Parameter::int("i", 0);
        assert_eq!(cast(&p, 4.0).unwrap(), Value::Int(4));
        assert!(cast(&p, 4.5).is_err());
        assert_eq!(cast(&p, " 2 ").unwrap(), Value::Int(2));
    }

    #[test]
    fn int_rejects_floats_outside_i64() {
        let p = Parameter::positive_int("n", 1);
        assert!(cast(&p, 1e20).is_err());
        assert!(cast(&Parameter::int("i", 0), -1e20).is_err());
        assert!(cast(&p, f64::INFINITY).is_err());
        assert_eq!(cast(&p, 2f64.powi(62)).unwrap(), Value::Int(1 << 62));
    }

    #[test]
    fn strings_fold_case() {
        let lower = Parameter::lower_case_string("s", "");
        let upper = Parameter::upper_case_string("s", "");
        assert_eq!(cast(&lower, "M3 Pan").unwrap(), Value::from("m3 pan"));
        assert_eq!(cast(&upper, "m3").unwrap(), Value::from("M3"));
        assert_eq!(cast(&Parameter::string("s", ""), 7).unwrap(), Value::from("7"));
    }

    #[test]
    fn booleans_from_numbers() {
        let p = Parameter::boolean("b", false);
        assert_eq!(cast(&p, 0).unwrap(), Value::Bool(false));
        assert_eq!(cast(&p, 2).unwrap(), Value::Bool(true));
        assert_eq!(cast(&p, "True").unwrap(), Value::Bool(true));
        assert!(cast(&p, "maybe").is_err());
    }

    #[test]
    fn null_requires_nullable() {
        let strict = Parameter::float("x", 1.0);
        assert!(matches!(
            cast(&strict, Value::Null),
            Err(ParameterError::NullValue { .. })
        ));
        let loose = Parameter::float("x", 1.0).nullable();
        assert_eq!(cast(&loose, Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn custom_validator_runs() {
        let even = Parameter::custom(
            "n",
            "even int",
            |v| match v {
                Value::Int(i) if i % 2 == 0 => Ok(Value::Int(i)),
                other => Err(format!("{other} is not even")),
            },
            0,
        );
        assert_eq!(cast(&even, 4).unwrap(), Value::Int(4));
        assert!(cast(&even, 3).is_err());
        assert_eq!(even.kind().label(), "even int");
    }
}
