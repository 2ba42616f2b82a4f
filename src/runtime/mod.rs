//! Executable model of the generated wrappers
//!
//! The wrappers themselves are Cython, but what they do is entirely determined by a
//! [`ClassBinding`]. This module runs the same bindings against any [`NativeLibrary`], with
//! Rust ownership standing in for reference counting: dropping an owning [`Wrapper`] releases
//! its object exactly once, and a borrowed view cannot outlive the wrapper it was obtained from.

mod errors;
mod value;
mod wrapper;

pub use errors::*;
pub use value::*;
pub use wrapper::*;

use crate::bind::{ClassBinding, OverloadSet, ParamPlan, Shape};
use crate::descriptor::{ClassDescriptor, FieldDescriptor, FunctionDescriptor, MethodDescriptor};
use std::fmt;

/// The native side, as seen by generated wrappers
///
/// Objects in returned values follow the declared return type: a by-value result is a fresh
/// copy (which the wrapper will usually own), while a reference or pointer result points into
/// state that already exists.
pub trait NativeLibrary {
    type Ptr: Copy + Eq + fmt::Debug;

    /// Allocate an object through one of the class's constructors
    ///
    /// `constructor` indexes the declared constructors (it is `0` for the implicit default
    /// constructor of a class that declares none).
    fn construct(
        &self,
        class: &ClassDescriptor,
        constructor: usize,
        args: &[Value<Self::Ptr>],
    ) -> Self::Ptr;

    /// Destroy an object allocated by this library
    fn release(&self, class: &ClassDescriptor, ptr: Self::Ptr);

    fn read_field(
        &self,
        class: &ClassDescriptor,
        ptr: Self::Ptr,
        field: &FieldDescriptor,
    ) -> Value<Self::Ptr>;

    fn write_field(
        &self,
        class: &ClassDescriptor,
        ptr: Self::Ptr,
        field: &FieldDescriptor,
        value: Value<Self::Ptr>,
    );

    fn invoke(
        &self,
        class: &ClassDescriptor,
        ptr: Self::Ptr,
        method: &MethodDescriptor,
        args: &[Value<Self::Ptr>],
    ) -> Value<Self::Ptr>;

    fn invoke_function(
        &self,
        function: &FunctionDescriptor,
        args: &[Value<Self::Ptr>],
    ) -> Value<Self::Ptr>;
}

/// How [`Runtime::adopt`] takes hold of an existing pointer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Adoption {
    /// Someone else keeps releasing the object
    Borrow,

    /// The new wrapper releases the object
    TakeOwnership,
}

/// Bound classes and functions, together with the library implementing them
pub struct Runtime<'b, L: NativeLibrary> {
    library: L,
    classes: Vec<ClassBinding<'b>>,
    functions: Vec<OverloadSet<'b>>,
}

impl<'b, L: NativeLibrary> Runtime<'b, L> {
    pub fn new(library: L) -> Runtime<'b, L> {
        Runtime {
            library,
            classes: vec![],
            functions: vec![],
        }
    }

    pub fn register_class(&mut self, binding: ClassBinding<'b>) {
        self.classes.push(binding);
    }

    pub fn register_functions(&mut self, functions: Vec<OverloadSet<'b>>) {
        self.functions.extend(functions);
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Binding of a class, by native name
    pub fn binding(&self, class: &str) -> Result<&ClassBinding<'b>, RuntimeError> {
        self.classes
            .iter()
            .find(|binding| binding.name() == class)
            .ok_or_else(|| RuntimeError::UnknownClass(class.to_owned()))
    }

    /// Wrapper holding no object yet (what allocation gives before the constructor runs)
    pub fn unbound(&self, class: &str) -> Result<Wrapper<'_, L>, RuntimeError> {
        let binding = self.binding(class)?;
        Ok(Wrapper::new(self, binding, None))
    }

    /// Managed constructor call
    pub fn construct(
        &self,
        class: &str,
        args: &[Value<L::Ptr>],
    ) -> Result<Wrapper<'_, L>, RuntimeError> {
        let mut wrapper = self.unbound(class)?;
        wrapper.init(args)?;
        Ok(wrapper)
    }

    /// Wrap a pointer obtained outside of the bindings
    pub fn adopt(
        &self,
        class: &str,
        ptr: L::Ptr,
        adoption: Adoption,
    ) -> Result<Wrapper<'_, L>, RuntimeError> {
        let binding = self.binding(class)?;
        let handle = match adoption {
            Adoption::Borrow => Handle::Borrowed(ptr),
            Adoption::TakeOwnership => Handle::Owned(ptr),
        };
        Ok(Wrapper::new(self, binding, Some(handle)))
    }

    /// Call a free function
    pub fn call_function(
        &self,
        name: &str,
        args: &[Value<L::Ptr>],
    ) -> Result<Returned<'_, '_, L>, RuntimeError> {
        let set = self
            .functions
            .iter()
            .find(|set| set.name == name)
            .ok_or_else(|| RuntimeError::UnknownMember {
                class: String::from("<module>"),
                member: name.to_owned(),
            })?;
        let stub = set
            .resolve(args)
            .ok_or_else(|| RuntimeError::NoMatchingOverload {
                class: None,
                member: name.to_owned(),
                args: describe_args(args),
            })?;

        log::trace!("Calling {} through {}", stub.descriptor.name, stub.helper);
        let args = marshal(&stub.params, args)?;
        let result = self.library.invoke_function(stub.descriptor, &args);
        wrapper::wrap_result(self, &stub.returns, result, name)
    }
}

/// Argument conversions done by typed helper parameters
///
/// Wrappers holding nothing get past overload selection but are stopped here, before the native
/// side sees them.
fn marshal<P: Clone>(
    params: &[ParamPlan],
    args: &[Value<P>],
) -> Result<Vec<Value<P>>, RuntimeError> {
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| marshal_value(&param.shape, arg.clone()))
        .collect()
}

fn marshal_value<P>(shape: &Shape, value: Value<P>) -> Result<Value<P>, RuntimeError> {
    match (shape, value) {
        (_, Value::Unbound(class)) => Err(RuntimeError::NullReference { class }),
        (Shape::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (_, value) => Ok(value),
    }
}

fn describe_args<P>(args: &[Value<P>]) -> String {
    let kinds: Vec<&str> = args.iter().map(|arg| arg.kind()).collect();
    format!("({})", kinds.join(", "))
}
