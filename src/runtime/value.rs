use std::fmt;

/// Reference to a native object, tagged with the class it is an instance of
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef<P> {
    pub class: String,
    pub ptr: P,
}

impl<P> ObjectRef<P> {
    pub fn new(class: impl Into<String>, ptr: P) -> ObjectRef<P> {
        ObjectRef {
            class: class.into(),
            ptr,
        }
    }
}

/// Value crossing the boundary between the managed caller and the native library
///
/// `P` is the native library's pointer type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<P> {
    /// Result of a `void` call
    Void,

    /// Null pointer (Python `None`)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(ObjectRef<P>),

    /// Wrapper of the given class that holds no native object
    ///
    /// It is an instance of the class as far as overload selection goes, but handing it to the
    /// native side fails.
    Unbound(String),
}

impl<P> Value<P> {
    pub fn str(value: impl Into<String>) -> Value<P> {
        Value::Str(value.into())
    }

    pub fn object(class: impl Into<String>, ptr: P) -> Value<P> {
        Value::Object(ObjectRef::new(class, ptr))
    }

    /// Kind of value, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
            Value::Unbound(_) => "unbound",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl<P: fmt::Debug> fmt::Display for Value<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(object) => write!(f, "<{} at {:?}>", object.class, object.ptr),
            Value::Unbound(class) => write!(f, "<{} at null>", class),
        }
    }
}
