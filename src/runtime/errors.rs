use std::fmt;

/// Errors raised to the managed caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Operation on a wrapper that holds no native object
    NullReference { class: String },

    /// No overload (or constructor) accepts the arguments
    NoMatchingOverload {
        class: Option<String>,
        member: String,

        /// Kinds of the arguments that were passed, eg. `(int, str)`
        args: String,
    },

    UnknownMember { class: String, member: String },
    UnknownClass(String),

    /// Constructor call on a class that can only be adopted
    NotConstructible(String),

    /// Constructor call on a wrapper that already holds an object
    AlreadyInitialized(String),

    ReadOnlyProperty { class: String, property: String },
    WriteOnlyProperty { class: String, property: String },

    /// The native library handed back something the binding did not announce
    UnexpectedValue { member: String, found: &'static str },
}

impl std::error::Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::NullReference { class } => {
                write!(f, "'{}' wrapper does not hold a native object", class)
            }
            RuntimeError::NoMatchingOverload {
                class: Some(class),
                member,
                args,
            } => write!(f, "no overload of {}.{} accepts {}", class, member, args),
            RuntimeError::NoMatchingOverload {
                class: None,
                member,
                args,
            } => write!(f, "no overload of {} accepts {}", member, args),
            RuntimeError::UnknownMember { class, member } => {
                write!(f, "'{}' has no member '{}'", class, member)
            }
            RuntimeError::UnknownClass(class) => write!(f, "no binding for class '{}'", class),
            RuntimeError::NotConstructible(class) => {
                write!(f, "'{}' cannot be instantiated from Python", class)
            }
            RuntimeError::AlreadyInitialized(class) => {
                write!(f, "'{}' wrapper is already initialized", class)
            }
            RuntimeError::ReadOnlyProperty { class, property } => {
                write!(f, "{}.{} is read-only", class, property)
            }
            RuntimeError::WriteOnlyProperty { class, property } => {
                write!(f, "{}.{} is write-only", class, property)
            }
            RuntimeError::UnexpectedValue { member, found } => {
                write!(f, "{} returned an unexpected {}", member, found)
            }
        }
    }
}
