//! Deciding which wrapper releases a native object
//!
//! Every native object must have exactly one owning wrapper. Wrappers that get at an object
//! some other way (reading a field, calling an accessor that hands out internal state) are
//! non-owning. When the descriptor does not say enough to tell, the wrapper does not own the
//! object: a leak is recoverable, a double free is not.

use crate::descriptor::{Indirection, ReturnOwnership};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Ownership flag of a wrapper, fixed when the wrapper is created
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Destroying the wrapper releases the native object
    Owning,

    /// The native object's lifetime is managed elsewhere
    NonOwning,
}

impl Ownership {
    pub const fn is_owning(&self) -> bool {
        matches!(self, Ownership::Owning)
    }

    /// Flag value as written in generated Cython
    pub const fn as_flag(&self) -> &'static str {
        match self {
            Ownership::Owning => "True",
            Ownership::NonOwning => "False",
        }
    }
}

/// Where an adopted pointer came from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdoptionSource {
    /// Return value of a method on another wrapper
    MethodReturn,

    /// Return value of a free function
    FunctionReturn,

    /// Read of a class-typed field through another wrapper
    FieldRead,
}

/// How a wrapper comes to hold its native object
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Construction<'a> {
    /// A generated constructor allocated the object
    FreshAllocation,

    /// The caller explicitly hands over a pointer it used to own
    TakeOwnership,

    /// The pointer was obtained from another operation
    Adoption {
        source: AdoptionSource,

        /// Class and member the pointer comes from (for diagnostics)
        class: Option<&'a str>,
        member: &'a str,

        /// How the native side hands the object over
        indirection: Indirection,

        /// What the descriptor says about ownership, if anything
        annotation: Option<ReturnOwnership>,
    },
}

/// Outcome of resolving ownership for an adopted object
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub ownership: Ownership,

    /// How the generated code should take hold of the object
    ///
    /// This differs from the declared indirection in one case: a by-value return annotated as
    /// borrowed really is a reference into the callee's state.
    pub indirection: Indirection,
}

/// Assigns ownership flags to wrapper construction sites
#[derive(Default)]
pub struct OwnershipResolver;

impl OwnershipResolver {
    pub fn new() -> OwnershipResolver {
        OwnershipResolver
    }

    /// Resolve the ownership flag of a wrapper created in the given way
    ///
    /// A [`DiagnosticKind::ReviewOwnership`] diagnostic is recorded whenever the answer is a
    /// fallback rather than something the descriptor determines.
    pub fn resolve(
        &self,
        construction: &Construction<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Resolution {
        match *construction {
            Construction::FreshAllocation | Construction::TakeOwnership => Resolution {
                ownership: Ownership::Owning,
                indirection: Indirection::Pointer,
            },

            Construction::Adoption {
                source: AdoptionSource::FieldRead,
                class,
                member,
                indirection,
                ..
            } => {
                if indirection == Indirection::Pointer {
                    diagnostics.push(
                        DiagnosticKind::ReviewOwnership,
                        class,
                        Some(member),
                        "pointer field is exposed without ownership",
                    );
                }
                Resolution {
                    ownership: Ownership::NonOwning,
                    indirection: match indirection {
                        Indirection::Pointer => Indirection::Pointer,
                        _ => Indirection::Reference,
                    },
                }
            }

            Construction::Adoption {
                class,
                member,
                indirection,
                annotation,
                ..
            } => match (annotation, indirection) {
                (Some(ReturnOwnership::Transferred), indirection) => Resolution {
                    ownership: Ownership::Owning,
                    indirection,
                },
                (Some(ReturnOwnership::Borrowed), Indirection::Value) => Resolution {
                    ownership: Ownership::NonOwning,
                    indirection: Indirection::Reference,
                },
                (Some(ReturnOwnership::Borrowed), indirection) => Resolution {
                    ownership: Ownership::NonOwning,
                    indirection,
                },

                // The returned value gets copied into a fresh allocation
                (None, Indirection::Value) => Resolution {
                    ownership: Ownership::Owning,
                    indirection: Indirection::Value,
                },

                // References never transfer ownership
                (None, Indirection::Reference) => Resolution {
                    ownership: Ownership::NonOwning,
                    indirection: Indirection::Reference,
                },

                (None, Indirection::Pointer) => {
                    diagnostics.push(
                        DiagnosticKind::ReviewOwnership,
                        class,
                        Some(member),
                        "returned pointer has unspecified ownership, wrapping it as non-owning",
                    );
                    Resolution {
                        ownership: Ownership::NonOwning,
                        indirection: Indirection::Pointer,
                    }
                }
            },
        }
    }
}
