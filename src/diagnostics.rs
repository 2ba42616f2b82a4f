use std::fmt;

/// Non-fatal findings made while generating bindings
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Ownership of a returned native object could not be determined, so the wrapper will not own
    /// it (possible leak, never a double free)
    ReviewOwnership,

    /// A member was left out of the wrapper, usually because of an unmappable type
    SkippedMember,

    /// An overload can never be selected because an earlier one has the same signature
    ShadowedOverload,

    /// The class cannot be constructed from the managed side (only adopted)
    NoConstructionPath,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ReviewOwnership => "review ownership",
            DiagnosticKind::SkippedMember => "skipped member",
            DiagnosticKind::ShadowedOverload => "shadowed overload",
            DiagnosticKind::NoConstructionPath => "no construction path",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Class concerned (`None` for free functions)
    pub class: Option<String>,

    /// Member concerned, if any
    pub member: Option<String>,

    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] ", self.kind)?;
        match (&self.class, &self.member) {
            (Some(class), Some(member)) => write!(f, "{}::{}: ", class, member)?,
            (Some(class), None) => write!(f, "{}: ", class)?,
            (None, Some(member)) => write!(f, "{}: ", member)?,
            (None, None) => (),
        }
        f.write_str(&self.message)
    }
}

/// Sink for diagnostics, in the order they were found
#[derive(Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics(vec![])
    }

    /// Record (and log) a diagnostic
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        class: Option<&str>,
        member: Option<&str>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            class: class.map(String::from),
            member: member.map(String::from),
            message: message.into(),
        };
        log::warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Does any diagnostic of this kind concern the given class?
    pub fn any_for(&self, kind: DiagnosticKind, class: &str) -> bool {
        self.0
            .iter()
            .any(|d| d.kind == kind && d.class.as_deref() == Some(class))
    }

    /// Move everything from another sink into this one
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}
