use crate::descriptor::{Indirection, NativeType};
use crate::runtime::Value;
use std::fmt;

/// What an argument has to look like, from the managed side, to be accepted for a parameter
///
/// Several native types collapse onto one shape (`int` and `long` are both Python `int`), which
/// is exactly what makes two native signatures indistinguishable to a caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Int,

    /// Floating point parameters also accept integers (which get widened)
    Float,
    Str,

    /// A wrapper of the given class (or `None`, for pointer parameters)
    Object {
        class: String,
        nullable: bool,
    },
}

impl Shape {
    /// Shape of a parameter of the given type (`None` for `void`)
    pub fn of(native: &NativeType) -> Option<Shape> {
        let shape = match native {
            NativeType::Void => return None,
            NativeType::Primitive(primitive) if primitive.is_floating() => Shape::Float,
            NativeType::Primitive(crate::descriptor::Primitive::Bool) => Shape::Bool,
            NativeType::Primitive(_) => Shape::Int,
            NativeType::String => Shape::Str,
            NativeType::Class {
                name, indirection, ..
            } => Shape::Object {
                class: name.clone(),
                nullable: *indirection == Indirection::Pointer,
            },
        };
        Some(shape)
    }

    /// Is the value structurally compatible with this shape?
    pub fn accepts<P>(&self, value: &Value<P>) -> bool {
        match (self, value) {
            (Shape::Bool, Value::Bool(_)) => true,
            (Shape::Int, Value::Int(_)) => true,
            (Shape::Float, Value::Float(_) | Value::Int(_)) => true,
            (Shape::Str, Value::Str(_)) => true,
            (Shape::Object { class, .. }, Value::Object(object)) => &object.class == class,
            (Shape::Object { class, .. }, Value::Unbound(unbound)) => unbound == class,
            (Shape::Object { nullable, .. }, Value::Null) => *nullable,
            _ => false,
        }
    }

    /// Could no argument ever tell these two shapes apart?
    pub fn indistinguishable(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Object { class: c1, .. }, Shape::Object { class: c2, .. }) => c1 == c2,
            (s1, s2) => s1 == s2,
        }
    }

    /// Is every value accepted by `other` also accepted by this shape?
    pub fn covers(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Float, Shape::Int) => true,
            (
                Shape::Object {
                    class: c1,
                    nullable: n1,
                },
                Shape::Object {
                    class: c2,
                    nullable: n2,
                },
            ) => c1 == c2 && (*n1 || !*n2),
            (s1, s2) => s1 == s2,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Shape::Bool => f.write_str("bool"),
            Shape::Int => f.write_str("int"),
            Shape::Float => f.write_str("float"),
            Shape::Str => f.write_str("str"),
            Shape::Object {
                class,
                nullable: false,
            } => f.write_str(class),
            Shape::Object {
                class,
                nullable: true,
            } => write!(f, "{} or None", class),
        }
    }
}

/// Managed-side signature of a constructor or method
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<Shape>);

impl Signature {
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Do the arguments match this signature (count and shapes)?
    pub fn accepts<P>(&self, args: &[Value<P>]) -> bool {
        self.0.len() == args.len()
            && self
                .0
                .iter()
                .zip(args)
                .all(|(shape, arg)| shape.accepts(arg))
    }

    /// Would every argument list accepted by one also be accepted by the other?
    pub fn indistinguishable(&self, other: &Signature) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(s1, s2)| s1.indistinguishable(s2))
    }

    /// Would this signature be picked for every argument list `other` accepts?
    pub fn covers(&self, other: &Signature) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(s1, s2)| s1.covers(s2))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (i, shape) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", shape)?;
        }
        f.write_str(")")
    }
}

/// Something selected at call time by argument shape
pub trait Candidate {
    fn signature(&self) -> &Signature;
}

/// Resolve a call against candidates
///
/// Candidates are tried in the order given (which is declaration order) and the first one whose
/// signature accepts the arguments wins, even if a later one would match more precisely.
pub fn first_match<'c, C: Candidate, P>(candidates: &'c [C], args: &[Value<P>]) -> Option<&'c C> {
    candidates
        .iter()
        .find(|candidate| candidate.signature().accepts(args))
}
