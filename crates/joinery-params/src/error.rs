use thiserror::Error;

/// Errors raised while validating or reading parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// One or more names passed to a constructor are not declared by the class.
    #[error("{class} does not accept parameter(s): {}", names.join(", "))]
    UnknownParameters {
        /// Class being constructed.
        class: String,
        /// Every rejected name, sorted.
        names: Vec<String>,
    },
    /// A value could not be cast to the parameter's kind.
    #[error("{class}.{name}: {reason}")]
    InvalidValue {
        /// Owning class.
        class: String,
        /// Parameter name.
        name: String,
        /// Validator message.
        reason: String,
    },
    /// Null given to a parameter that is not nullable.
    #[error("{class}.{name} cannot be null")]
    NullValue {
        /// Owning class.
        class: String,
        /// Parameter name.
        name: String,
    },
    /// A read or write named a parameter the class does not declare.
    #[error("{class} has no parameter {name:?}")]
    Undeclared {
        /// Owning class.
        class: String,
        /// Requested name.
        name: String,
    },
    /// A typed getter found a value of another type.
    #[error("{class}.{name} is {found}, expected {expected}")]
    WrongType {
        /// Owning class.
        class: String,
        /// Parameter name.
        name: String,
        /// Type the getter wanted.
        expected: &'static str,
        /// Type actually stored.
        found: &'static str,
    },
    /// The class's `initialize_parameters` hook rejected the values.
    #[error("{class}: {reason}")]
    Initialize {
        /// Class being constructed.
        class: String,
        /// Hook message.
        reason: String,
    },
}
