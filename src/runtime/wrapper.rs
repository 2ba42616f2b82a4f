use super::{describe_args, marshal, marshal_value, NativeLibrary, Runtime, RuntimeError, Value};
use crate::bind::{ClassBinding, ReturnPlan};
use crate::ownership::Ownership;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

/// How a wrapper holds its native object
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Handle<P> {
    /// Released when the wrapper is dropped
    Owned(P),

    /// Released by someone else
    Borrowed(P),
}

impl<P: Copy> Handle<P> {
    pub fn ptr(&self) -> P {
        match self {
            Handle::Owned(ptr) | Handle::Borrowed(ptr) => *ptr,
        }
    }

    pub fn ownership(&self) -> Ownership {
        match self {
            Handle::Owned(_) => Ownership::Owning,
            Handle::Borrowed(_) => Ownership::NonOwning,
        }
    }
}

/// Managed-side object standing in for a native one
///
/// The ownership flag is decided once, when the wrapper gets its object, and never changes.
/// Wrappers are confined to one thread at a time, like the interpreter objects they model.
pub struct Wrapper<'r, L: NativeLibrary> {
    runtime: &'r Runtime<'r, L>,
    binding: &'r ClassBinding<'r>,
    handle: Option<Handle<L::Ptr>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<'r, L: NativeLibrary> Wrapper<'r, L> {
    pub(super) fn new(
        runtime: &'r Runtime<'r, L>,
        binding: &'r ClassBinding<'r>,
        handle: Option<Handle<L::Ptr>>,
    ) -> Wrapper<'r, L> {
        Wrapper {
            runtime,
            binding,
            handle,
            _not_sync: PhantomData,
        }
    }

    /// Native name of the wrapped class
    pub fn class_name(&self) -> &str {
        self.binding.name()
    }

    pub fn binding(&self) -> &ClassBinding<'r> {
        self.binding
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    pub fn ptr(&self) -> Option<L::Ptr> {
        self.handle.map(|handle| handle.ptr())
    }

    /// Ownership flag (`None` until the wrapper holds an object)
    pub fn ownership(&self) -> Option<Ownership> {
        self.handle.map(|handle| handle.ownership())
    }

    /// Reference to the wrapped object, for passing as an argument
    pub fn as_value(&self) -> Value<L::Ptr> {
        match self.handle {
            Some(handle) => Value::object(self.binding.name(), handle.ptr()),
            None => Value::Unbound(self.binding.name().to_owned()),
        }
    }

    /// Run the managed constructor on a wrapper that does not hold anything yet
    pub fn init(&mut self, args: &[Value<L::Ptr>]) -> Result<(), RuntimeError> {
        if self.handle.is_some() {
            return Err(RuntimeError::AlreadyInitialized(self.class_name().to_owned()));
        }
        if !self.binding.is_constructible() {
            return Err(RuntimeError::NotConstructible(self.class_name().to_owned()));
        }
        let path = self.binding.constructors.resolve(args).ok_or_else(|| {
            RuntimeError::NoMatchingOverload {
                class: Some(self.class_name().to_owned()),
                member: String::from("__init__"),
                args: describe_args(args),
            }
        })?;

        let args = marshal(&path.params, args)?;
        let ptr = self
            .runtime
            .library()
            .construct(self.binding.descriptor, path.index, &args);
        log::trace!(
            "Constructed {} at {:?} through {}",
            self.class_name(),
            ptr,
            path.helper
        );
        self.handle = Some(Handle::Owned(ptr));
        Ok(())
    }

    fn check_native(&self) -> Result<L::Ptr, RuntimeError> {
        self.ptr().ok_or_else(|| RuntimeError::NullReference {
            class: self.class_name().to_owned(),
        })
    }

    fn unknown_member(&self, member: &str) -> RuntimeError {
        RuntimeError::UnknownMember {
            class: self.class_name().to_owned(),
            member: member.to_owned(),
        }
    }

    /// Read a property
    ///
    /// Class-typed fields come back as views that cannot outlive this wrapper.
    pub fn get<'a>(&'a self, property: &str) -> Result<Returned<'r, 'a, L>, RuntimeError> {
        let pair = self
            .binding
            .property(property)
            .ok_or_else(|| self.unknown_member(property))?;
        let plan = pair
            .getter
            .as_ref()
            .ok_or_else(|| RuntimeError::WriteOnlyProperty {
                class: self.class_name().to_owned(),
                property: property.to_owned(),
            })?;
        let ptr = self.check_native()?;

        let value = self
            .runtime
            .library()
            .read_field(self.binding.descriptor, ptr, pair.field);
        wrap_result(self.runtime, plan, value, property)
    }

    /// Write a property
    pub fn set(&self, property: &str, value: Value<L::Ptr>) -> Result<(), RuntimeError> {
        let pair = self
            .binding
            .property(property)
            .ok_or_else(|| self.unknown_member(property))?;
        let setter = pair
            .setter
            .as_ref()
            .ok_or_else(|| RuntimeError::ReadOnlyProperty {
                class: self.class_name().to_owned(),
                property: property.to_owned(),
            })?;
        let ptr = self.check_native()?;
        if !setter.param.shape.accepts(&value) {
            return Err(RuntimeError::NoMatchingOverload {
                class: Some(self.class_name().to_owned()),
                member: property.to_owned(),
                args: describe_args(std::slice::from_ref(&value)),
            });
        }

        let value = marshal_value(&setter.param.shape, value)?;
        self.runtime
            .library()
            .write_field(self.binding.descriptor, ptr, pair.field, value);
        Ok(())
    }

    /// Call a method
    ///
    /// Overloads are tried in declaration order and the first one accepting the arguments runs.
    pub fn call<'a>(
        &'a self,
        method: &str,
        args: &[Value<L::Ptr>],
    ) -> Result<Returned<'r, 'a, L>, RuntimeError> {
        let set = self
            .binding
            .method(method)
            .ok_or_else(|| self.unknown_member(method))?;
        let ptr = self.check_native()?;
        let stub = set
            .resolve(args)
            .ok_or_else(|| RuntimeError::NoMatchingOverload {
                class: Some(self.class_name().to_owned()),
                member: method.to_owned(),
                args: describe_args(args),
            })?;

        let args = marshal(&stub.params, args)?;
        let result =
            self.runtime
                .library()
                .invoke(self.binding.descriptor, ptr, stub.descriptor, &args);
        wrap_result(self.runtime, &stub.returns, result, method)
    }
}

impl<'r, L: NativeLibrary> Drop for Wrapper<'r, L> {
    fn drop(&mut self) {
        if let Some(Handle::Owned(ptr)) = self.handle.take() {
            log::trace!("Releasing {} at {:?}", self.binding.name(), ptr);
            self.runtime.library().release(self.binding.descriptor, ptr);
        }
    }
}

impl<'r, L: NativeLibrary> fmt::Debug for Wrapper<'r, L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class_name())
            .field("handle", &self.handle)
            .finish()
    }
}

/// Result of a call or property read
///
/// Owning wrappers are independent of where they came from. Views borrow from the wrapper (or
/// runtime) that produced them.
pub enum Returned<'r, 'a, L: NativeLibrary> {
    Value(Value<L::Ptr>),
    Owned(Wrapper<'r, L>),
    View(Wrapper<'a, L>),
}

impl<'r, 'a, L: NativeLibrary> Returned<'r, 'a, L>
where
    'r: 'a,
{
    pub fn value(&self) -> Option<&Value<L::Ptr>> {
        match self {
            Returned::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value<L::Ptr>> {
        match self {
            Returned::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn wrapper(&self) -> Option<&Wrapper<'a, L>> {
        match self {
            Returned::Value(_) => None,
            Returned::Owned(wrapper) => Some(wrapper),
            Returned::View(wrapper) => Some(wrapper),
        }
    }

    pub fn into_owned(self) -> Option<Wrapper<'r, L>> {
        match self {
            Returned::Owned(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    /// `None` from the managed side's point of view
    pub fn is_none(&self) -> bool {
        matches!(self, Returned::Value(Value::Null))
    }
}

impl<'r, 'a, L: NativeLibrary> fmt::Debug for Returned<'r, 'a, L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Returned::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Returned::Owned(wrapper) => f.debug_tuple("Owned").field(wrapper).finish(),
            Returned::View(wrapper) => f.debug_tuple("View").field(wrapper).finish(),
        }
    }
}

/// Hand a native result to the caller the way the return plan says
pub(super) fn wrap_result<'r, 'a, L: NativeLibrary>(
    runtime: &'r Runtime<'r, L>,
    plan: &ReturnPlan,
    value: Value<L::Ptr>,
    member: &str,
) -> Result<Returned<'r, 'a, L>, RuntimeError>
where
    'r: 'a,
{
    let unexpected = |found: &Value<L::Ptr>| RuntimeError::UnexpectedValue {
        member: member.to_owned(),
        found: found.kind(),
    };

    match (plan, value) {
        (ReturnPlan::Void, _) => Ok(Returned::Value(Value::Void)),
        (ReturnPlan::Value(_), value @ (Value::Object(_) | Value::Unbound(_) | Value::Void)) => {
            Err(unexpected(&value))
        }
        (ReturnPlan::Value(_), value) => Ok(Returned::Value(value)),
        (ReturnPlan::Wrap { .. }, Value::Null) => Ok(Returned::Value(Value::Null)),
        (
            ReturnPlan::Wrap {
                class, resolution, ..
            },
            Value::Object(object),
        ) => {
            let binding = runtime.binding(class)?;
            let wrapped = match resolution.ownership {
                Ownership::Owning => Returned::Owned(Wrapper::new(
                    runtime,
                    binding,
                    Some(Handle::Owned(object.ptr)),
                )),
                Ownership::NonOwning => Returned::View(Wrapper::new(
                    runtime,
                    binding,
                    Some(Handle::Borrowed(object.ptr)),
                )),
            };
            Ok(wrapped)
        }
        (ReturnPlan::Wrap { .. }, other) => Err(unexpected(&other)),
    }
}
