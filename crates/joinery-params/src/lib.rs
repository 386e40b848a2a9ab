#![warn(missing_docs)]

//! Typed, inheritable parameters for parametric objects.
//!
//! A class declares its parameters once in a [`ParamTable`], optionally
//! extending a parent's table. Instances are built from keyword overrides:
//! unknown names are rejected, every value is cast by its [`Parameter`],
//! and the class's [`ParametricObject::initialize_parameters`] hook runs
//! last.
//!
//! ```
//! use std::sync::LazyLock;
//! use joinery_params::{ParamTable, Parameter, ParametricObject, Params};
//!
//! struct Washer(Params);
//!
//! static WASHER: LazyLock<ParamTable> = LazyLock::new(|| {
//!     ParamTable::builder("Washer")
//!         .param(Parameter::positive_float("inner", 3.2))
//!         .param(Parameter::positive_float("outer", 7.0))
//!         .build()
//! });
//!
//! impl ParametricObject for Washer {
//!     fn param_table() -> &'static ParamTable { &WASHER }
//!     fn from_params(params: Params) -> Self { Washer(params) }
//!     fn params(&self) -> &Params { &self.0 }
//! }
//!
//! let w = Washer::new([("outer", 9)]).unwrap();
//! assert_eq!(w.params().float("outer").unwrap(), 9.0);
//! assert!(Washer::new([("thickness", 1.0)]).is_err());
//! ```

mod error;
mod parameter;
mod params;
mod table;
mod value;

pub use error::ParameterError;
pub use parameter::{ObjectClass, ParamKind, Parameter, Validator};
pub use params::Params;
pub use table::{ParamTable, ParamTableBuilder};
pub use value::Value;

/// An object whose state is a validated parameter set.
pub trait ParametricObject: Sized {
    /// The class's flattened parameter table.
    fn param_table() -> &'static ParamTable;

    /// Wrap already validated parameters.
    fn from_params(params: Params) -> Self;

    /// The instance's parameters.
    fn params(&self) -> &Params;

    /// Adjust values after casting; runs once per construction.
    ///
    /// Implementations that refine a parent class usually call the parent's
    /// hook first. Values written with [`Params::set`] are re-validated;
    /// combinations that do not fit are refused with [`Params::reject`].
    fn initialize_parameters(_params: &mut Params) -> Result<(), ParameterError> {
        Ok(())
    }

    /// Construct from keyword overrides.
    fn new<I, K, V>(overrides: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut params = Params::build(Self::param_table(), overrides)?;
        Self::initialize_parameters(&mut params)?;
        Ok(Self::from_params(params))
    }

    /// Construct with every parameter at its default.
    fn with_defaults() -> Result<Self, ParameterError> {
        Self::new(std::iter::empty::<(String, Value)>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{LazyLock, Mutex};

    static SEEN: Mutex<Vec<f64>> = Mutex::new(Vec::new());
    static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

    static BASE: LazyLock<ParamTable> = LazyLock::new(|| {
        ParamTable::builder("Base")
            .param(Parameter::positive_float("length", 10.0))
            .param(Parameter::positive_float("clearance", None::<f64>).nullable())
            .build()
    });

    static DERIVED: LazyLock<ParamTable> = LazyLock::new(|| {
        ParamTable::builder("Derived")
            .extends(&BASE)
            .override_default("length", 25.0)
            .param(Parameter::string("finish", "raw"))
            .build()
    });

    struct Base(Params);

    impl ParametricObject for Base {
        fn param_table() -> &'static ParamTable {
            &BASE
        }

        fn from_params(params: Params) -> Self {
            Base(params)
        }

        fn params(&self) -> &Params {
            &self.0
        }

        fn initialize_parameters(params: &mut Params) -> Result<(), ParameterError> {
            HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
            let length = params.float("length")?;
            if let Ok(mut seen) = SEEN.lock() {
                seen.push(length);
            }
            if params.opt_float("clearance")?.is_none() {
                params.set("clearance", length / 100.0)?;
            }
            Ok(())
        }
    }

    struct Derived(Params);

    impl ParametricObject for Derived {
        fn param_table() -> &'static ParamTable {
            &DERIVED
        }

        fn from_params(params: Params) -> Self {
            Derived(params)
        }

        fn params(&self) -> &Params {
            &self.0
        }

        fn initialize_parameters(params: &mut Params) -> Result<(), ParameterError> {
            Base::initialize_parameters(params)
        }
    }

    #[test]
    fn hook_sees_redeclared_default() {
        let before = HOOK_CALLS.load(Ordering::SeqCst);
        let d = Derived::with_defaults().unwrap();
        assert!(HOOK_CALLS.load(Ordering::SeqCst) > before);
        assert!(SEEN.lock().unwrap().contains(&25.0));
        assert_eq!(d.params().float("clearance").unwrap(), 0.25);
        assert_eq!(d.params().string("finish").unwrap(), "raw");
    }

    #[test]
    fn hook_values_are_validated() {
        struct Broken(Params);
        impl ParametricObject for Broken {
            fn param_table() -> &'static ParamTable {
                &BASE
            }
            fn from_params(params: Params) -> Self {
                Broken(params)
            }
            fn params(&self) -> &Params {
                &self.0
            }
            fn initialize_parameters(params: &mut Params) -> Result<(), ParameterError> {
                params.set("clearance", -1.0)
            }
        }
        assert!(matches!(
            Broken::with_defaults(),
            Err(ParameterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn hook_can_refuse_a_combination() {
        struct Sleeve(Params);
        impl ParametricObject for Sleeve {
            fn param_table() -> &'static ParamTable {
                &BASE
            }
            fn from_params(params: Params) -> Self {
                Sleeve(params)
            }
            fn params(&self) -> &Params {
                &self.0
            }
            fn initialize_parameters(params: &mut Params) -> Result<(), ParameterError> {
                let length = params.float("length")?;
                match params.opt_float("clearance")? {
                    Some(c) if c >= length => Err(params.reject("clearance must be below length")),
                    _ => Ok(()),
                }
            }
        }
        assert!(Sleeve::new([("clearance", 2.0)]).is_ok());
        let err = Sleeve::new([("clearance", 12.0)]).err();
        assert_eq!(
            err,
            Some(ParameterError::Initialize {
                class: "Base".into(),
                reason: "clearance must be below length".into(),
            })
        );
    }

    #[test]
    fn explicit_values_survive_the_hook() {
        let b = Base::new([("clearance", 0.5)]).unwrap();
        assert_eq!(b.params().float("clearance").unwrap(), 0.5);
        assert_eq!(b.params().float("length").unwrap(), 10.0);
    }

    #[test]
    fn unknown_keyword_rejected() {
        let err = Base::new([("finish", "polished")]).err();
        assert_eq!(
            err,
            Some(ParameterError::UnknownParameters {
                class: "Base".into(),
                names: vec!["finish".into()],
            })
        );
    }

    #[test]
    fn params_compare_by_value() {
        let a = Derived::new([("length", 30)]).unwrap();
        let b = Derived::new([("length", 30.0)]).unwrap();
        let c = Base::new([("length", 30.0)]).unwrap();
        assert_eq!(a.params(), b.params());
        assert_ne!(a.params(), c.params());
    }
}
