use bitflags::bitflags;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;

bitflags! {
    /// What the managed side may do with a native field
    pub struct FieldAccess: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
    }
}

impl Default for FieldAccess {
    fn default() -> FieldAccess {
        FieldAccess::READ | FieldAccess::WRITE
    }
}

impl FieldAccess {
    /// Parse the short forms used in descriptor files (`r`, `w`, `rw`)
    pub fn from_spelling(spelling: &str) -> Result<FieldAccess, String> {
        match spelling {
            "r" | "read" | "readonly" => Ok(FieldAccess::READ),
            "w" | "write" | "writeonly" => Ok(FieldAccess::WRITE),
            "rw" | "readwrite" | "read-write" => Ok(FieldAccess::READ | FieldAccess::WRITE),
            other => Err(format!("Unknown field access '{}'", other)),
        }
    }

    fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldAccess, D::Error> {
        let spelling = String::deserialize(deserializer)?;
        FieldAccess::from_spelling(&spelling).map_err(serde::de::Error::custom)
    }
}

/// Who owns a native object handed back by a method or function
///
/// When absent from the descriptor, the ownership resolver decides from the shape of the return
/// type (and defaults to not owning when it cannot tell).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnOwnership {
    /// The callee hands over a freshly allocated (or released) object
    Transferred,

    /// The callee hands out a view into state it keeps owning
    Borrowed,
}

/// Typed parameter of a constructor, method, or free function
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    /// Parameter name (may be empty when the declaration leaves it out)
    #[serde(default)]
    pub name: String,

    /// Native type spelling, eg. `const Point &`
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Parameter {
        Parameter {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One native constructor
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub params: Vec<Parameter>,
}

impl ConstructorDescriptor {
    pub fn new(params: Vec<Parameter>) -> ConstructorDescriptor {
        ConstructorDescriptor { params }
    }
}

/// One native data member
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, deserialize_with = "FieldAccess::deserialize")]
    pub access: FieldAccess,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        access: FieldAccess,
    ) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            type_name: type_name.into(),
            access,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.access.contains(FieldAccess::READ)
    }

    pub fn is_writable(&self) -> bool {
        self.access.contains(FieldAccess::WRITE)
    }
}

/// One native member function
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,

    #[serde(default)]
    pub params: Vec<Parameter>,

    /// Native return type spelling
    #[serde(default = "void_type", rename = "returns")]
    pub return_type: String,

    /// Methods with the same group id are exposed together under the group id
    #[serde(default, rename = "group")]
    pub overload_group: Option<String>,

    #[serde(default)]
    pub ownership: Option<ReturnOwnership>,

    /// Header declaring a free function (methods use their class's header)
    #[serde(default)]
    pub header: Option<String>,

    /// C++ namespace of a free function
    #[serde(default)]
    pub namespace: Option<String>,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Parameter>,
        return_type: impl Into<String>,
    ) -> MethodDescriptor {
        MethodDescriptor {
            name: name.into(),
            params,
            return_type: return_type.into(),
            overload_group: None,
            ownership: None,
            header: None,
            namespace: None,
        }
    }

    pub fn with_ownership(mut self, ownership: ReturnOwnership) -> MethodDescriptor {
        self.ownership = Some(ownership);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> MethodDescriptor {
        self.overload_group = Some(group.into());
        self
    }

    pub fn declared_in(mut self, header: impl Into<String>) -> MethodDescriptor {
        self.header = Some(header.into());
        self
    }

    /// Key under which overloads are collected
    pub fn overload_key(&self) -> &str {
        self.overload_group.as_deref().unwrap_or(&self.name)
    }
}

/// Free native function (a method without a receiver)
pub type FunctionDescriptor = MethodDescriptor;

/// A native class, as handed over by the declaration parser
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,

    /// Header declaring the class (`cdef extern from` target)
    #[serde(default)]
    pub header: Option<String>,

    /// C++ namespace of the class, eg. `geo::shapes`
    #[serde(default)]
    pub namespace: Option<String>,

    /// Whether the class has an implicit default constructor
    #[serde(default)]
    pub default_constructible: bool,

    #[serde(default)]
    pub constructors: Vec<ConstructorDescriptor>,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    /// New class with no members
    pub fn new(name: impl Into<String>) -> ClassDescriptor {
        ClassDescriptor {
            name: name.into(),
            header: None,
            namespace: None,
            default_constructible: false,
            constructors: vec![],
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> ClassDescriptor {
        self.header = Some(header.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> ClassDescriptor {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn default_constructible(mut self) -> ClassDescriptor {
        self.default_constructible = true;
        self
    }

    pub fn constructor(mut self, params: Vec<Parameter>) -> ClassDescriptor {
        self.constructors.push(ConstructorDescriptor::new(params));
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> ClassDescriptor {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> ClassDescriptor {
        self.methods.push(method);
        self
    }

    /// Constructors through which the managed side can allocate a fresh object
    ///
    /// A class with no declared constructors still gets the implicit default constructor when it
    /// is default constructible. Otherwise there is no construction path at all, which is
    /// reported as a malformed descriptor (the wrapper can then only adopt existing pointers).
    pub fn construction_paths(&self) -> Result<Cow<'_, [ConstructorDescriptor]>, String> {
        if !self.constructors.is_empty() {
            Ok(Cow::Borrowed(&self.constructors))
        } else if self.default_constructible {
            Ok(Cow::Owned(vec![ConstructorDescriptor::default()]))
        } else {
            Err(format!(
                "Class '{}' declares no constructors and is not default constructible",
                self.name
            ))
        }
    }
}

fn void_type() -> String {
    String::from("void")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn implicit_default_constructor() {
        let class = ClassDescriptor::new("Point").default_constructible();
        let paths = class.construction_paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].params.is_empty());
    }

    #[test]
    fn declared_constructors_win() {
        let class = ClassDescriptor::new("Point")
            .default_constructible()
            .constructor(vec![Parameter::new("x", "int")]);
        let paths = class.construction_paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].params.len(), 1);
    }

    #[test]
    fn no_construction_path() {
        let class = ClassDescriptor::new("Handle");
        assert!(class.construction_paths().is_err());
    }

    #[test]
    fn field_access_spellings() {
        assert_eq!(FieldAccess::from_spelling("r"), Ok(FieldAccess::READ));
        assert_eq!(FieldAccess::from_spelling("rw"), Ok(FieldAccess::all()));
        assert!(FieldAccess::from_spelling("x").is_err());
    }

    #[test]
    fn overload_key_prefers_group() {
        let method = MethodDescriptor::new("addPoint", vec![], "void").in_group("add");
        assert_eq!(method.overload_key(), "add");
        let method = MethodDescriptor::new("add", vec![], "void");
        assert_eq!(method.overload_key(), "add");
    }
}
