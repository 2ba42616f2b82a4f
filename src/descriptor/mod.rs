//! Generation-time description of the native side
//!
//! This is pure data, handed over by whatever parsed the native headers. It keeps declaration
//! order everywhere since that order ends up deciding overload resolution order.
//!
//!   - __Class__ is represented using [`ClassDescriptor`]
//!   - __Constructor__ is represented using [`ConstructorDescriptor`]
//!   - __Field__ is represented using [`FieldDescriptor`]
//!   - __Method__ (and free function) is represented using [`MethodDescriptor`]
//!
//! All of the descriptors for one generation unit live in a [`DescriptorSet`].

mod class;
mod names;
mod types;
mod validate;

pub use class::*;
pub use names::*;
pub use types::*;
pub use validate::*;

use elsa::map::FrozenMap;
use elsa::FrozenVec;
use serde::Deserialize;
use std::collections::BTreeMap;
use typed_arena::Arena;

pub struct DescriptorArenas {
    class_arena: Arena<ClassDescriptor>,
    function_arena: Arena<FunctionDescriptor>,
}

impl DescriptorArenas {
    pub fn new() -> Self {
        DescriptorArenas {
            class_arena: Arena::new(),
            function_arena: Arena::new(),
        }
    }
}

impl Default for DescriptorArenas {
    fn default() -> Self {
        Self::new()
    }
}

/// Every descriptor in one generation unit
///
/// Descriptors can be added through a shared reference, so bindings for classes already in the
/// set can be held onto while more classes get added.
pub struct DescriptorSet<'d> {
    arenas: &'d DescriptorArenas,

    /// Classes in declaration order (including ones with a clashing name)
    classes: FrozenVec<&'d ClassDescriptor>,

    /// First class registered under each name
    classes_by_name: FrozenMap<String, &'d ClassDescriptor>,

    /// Free functions in declaration order
    functions: FrozenVec<&'d FunctionDescriptor>,

    /// Type aliases, mapping to the spelling of the aliased type
    typedefs: FrozenMap<String, String>,
}

impl<'d> DescriptorSet<'d> {
    /// New empty set
    pub fn new(arenas: &'d DescriptorArenas) -> Self {
        DescriptorSet {
            arenas,
            classes: FrozenVec::new(),
            classes_by_name: FrozenMap::new(),
            functions: FrozenVec::new(),
            typedefs: FrozenMap::new(),
        }
    }

    /// Add a class to the set
    ///
    /// A class whose name is already taken is still recorded (so that it can be reported), but
    /// lookups by name keep finding the first one.
    pub fn add_class(&self, class: ClassDescriptor) -> &'d ClassDescriptor {
        let class: &'d ClassDescriptor = self.arenas.class_arena.alloc(class);
        if self.classes_by_name.get(class.name.as_str()).is_none() {
            self.classes_by_name.insert(class.name.clone(), class);
        } else {
            log::debug!("Class name '{}' registered more than once", class.name);
        }
        self.classes.push(class);
        class
    }

    /// Add a free function to the set
    pub fn add_function(&self, function: FunctionDescriptor) -> &'d FunctionDescriptor {
        let function: &'d FunctionDescriptor = self.arenas.function_arena.alloc(function);
        self.functions.push(function);
        function
    }

    /// Add a type alias
    pub fn add_typedef(&self, alias: impl Into<String>, underlying: impl Into<String>) {
        self.typedefs.insert(alias.into(), underlying.into());
    }

    /// Add everything from a parsed descriptor file
    pub fn load(&self, file: DescriptorFile) {
        for (alias, underlying) in file.typedefs {
            self.add_typedef(alias, underlying);
        }
        for class in file.classes {
            self.add_class(class);
        }
        for function in file.functions {
            self.add_function(function);
        }
    }

    /// Classes in declaration order
    pub fn classes(&self) -> Vec<&ClassDescriptor> {
        self.classes.iter().collect()
    }

    /// Free functions in declaration order
    pub fn functions(&self) -> Vec<&FunctionDescriptor> {
        self.functions.iter().collect()
    }

    pub fn lookup_class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes_by_name.get(name)
    }

    /// Constructors of a class, in declaration order
    pub fn constructors(&self, class_name: &str) -> Option<&[ConstructorDescriptor]> {
        self.lookup_class(class_name)
            .map(|class| class.constructors.as_slice())
    }

    /// Fields of a class, in declaration order
    pub fn fields(&self, class_name: &str) -> Option<&[FieldDescriptor]> {
        self.lookup_class(class_name).map(|class| class.fields.as_slice())
    }

    /// Methods of a class, in declaration order
    pub fn methods(&self, class_name: &str) -> Option<&[MethodDescriptor]> {
        self.lookup_class(class_name).map(|class| class.methods.as_slice())
    }

    /// Full validation of one class of the set, including name uniqueness
    pub fn check_class(&self, class: &ClassDescriptor) -> Result<(), String> {
        check_class(class)?;
        match self.lookup_class(&class.name) {
            Some(first) if std::ptr::eq(first, class) => Ok(()),
            _ => Err(format!(
                "Class name '{}' is already used in this generation unit",
                class.name
            )),
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl<'d> TypeScope for DescriptorSet<'d> {
    fn resolve_typedef(&self, alias: &str) -> Option<&str> {
        self.typedefs.get(alias)
    }

    fn is_class(&self, name: &str) -> bool {
        self.lookup_class(name).is_some()
    }
}

/// On-disk format of a descriptor set
#[derive(Debug, Default, Deserialize)]
pub struct DescriptorFile {
    /// Suggested module name (the command line can override it)
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub typedefs: BTreeMap<String, String>,

    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,

    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
}

impl DescriptorFile {
    pub fn from_json(source: &str) -> Result<DescriptorFile, serde_json::Error> {
        serde_json::from_str(source)
    }
}
