use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// The descriptor of a class is inconsistent (bad names, duplicates, no way to construct it)
    MalformedDescriptor { class: String, reason: String },

    /// Two constructors cannot be told apart by argument shapes
    AmbiguousConstructor {
        class: String,
        first: usize,
        second: usize,
        signature: String,
    },

    /// Ownership fell back to a guess and the settings forbid that
    UnresolvedOwnership { class: String, members: Vec<String> },

    /// A configured name is not a valid identifier
    MalformedName(String),

    Io(io::Error),
    Json(serde_json::Error),
}

impl Error {
    /// Class this error is confined to, if any
    pub fn class(&self) -> Option<&str> {
        match self {
            Error::MalformedDescriptor { class, .. }
            | Error::AmbiguousConstructor { class, .. }
            | Error::UnresolvedOwnership { class, .. } => Some(class),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedDescriptor { class, reason } => {
                write!(f, "malformed descriptor for '{}': {}", class, reason)
            }
            Error::AmbiguousConstructor {
                class,
                first,
                second,
                signature,
            } => write!(
                f,
                "constructors #{} and #{} of '{}' both take {}",
                first, second, class, signature
            ),
            Error::UnresolvedOwnership { class, members } => write!(
                f,
                "ownership of values returned by '{}' ({}) is not specified",
                class,
                members.join(", ")
            ),
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
            Error::Io(err) => write!(f, "{}", err),
            Error::Json(err) => write!(f, "bad descriptor file: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
