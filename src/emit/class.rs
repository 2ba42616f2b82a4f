use super::marshal::{
    dispatch_condition, forwarded_args, native_args, native_class, type_check, typed_param,
    typed_params, write_argument_checks, write_return,
};
use super::writer::PyWriter;
use crate::bind::{AccessorPair, ClassBinding, ConstructionPath, OverloadSet};
use crate::generate::Settings;
use std::io::{Result, Write};

/// Renders the `cdef class` wrapping one native class
pub struct ClassWriter<'a, 'c> {
    pub binding: &'a ClassBinding<'c>,
    pub settings: &'a Settings,
}

impl<'a, 'c> ClassWriter<'a, 'c> {
    pub fn write<W: Write>(&self, out: &mut PyWriter<W>) -> Result<()> {
        log::debug!("Rendering wrapper of '{}'", self.binding.name());
        out.block_header(format!("cdef class {}", self.binding.python_name))?;

        self.write_scaffold(out)?;
        self.write_constructor(out)?;
        for pair in &self.binding.properties {
            out.newline()?;
            self.write_property(out, pair)?;
        }
        for set in &self.binding.methods {
            out.newline()?;
            self.write_overload_set(out, set)?;
        }

        out.close_block()
    }

    fn native(&self) -> String {
        native_class(self.settings, self.binding.name())
    }

    /// `self.thisptr`
    fn this(&self) -> String {
        format!("self.{}", self.settings.pointer_attribute)
    }

    /// Attributes, allocation, release, adoption, and the null guard
    fn write_scaffold<W: Write>(&self, out: &mut PyWriter<W>) -> Result<()> {
        let settings = self.settings;
        let name = &self.binding.python_name;
        let native = self.native();
        let ptr = &settings.pointer_attribute;
        let owning = &settings.ownership_attribute;
        let owner = &settings.owner_attribute;

        writeln!(out, "cdef {}* {}", native, ptr)?;
        writeln!(out, "cdef bint {}", owning)?;
        writeln!(out, "cdef object {}", owner)?;

        out.newline()?;
        out.block_header("def __cinit__(self, *args, **kwargs)")?;
        writeln!(out, "self.{} = NULL", ptr)?;
        writeln!(out, "self.{} = False", owning)?;
        writeln!(out, "self.{} = None", owner)?;
        out.close_block()?;

        out.newline()?;
        out.block_header("def __dealloc__(self)")?;
        out.block_header(format!("if self.{} and self.{} != NULL", owning, ptr))?;
        writeln!(out, "del self.{}", ptr)?;
        out.close_block()?;
        out.close_block()?;

        out.newline()?;
        writeln!(out, "@staticmethod")?;
        out.block_header(format!(
            "cdef {} adopt({}* ptr, bint owning, object owner=None)",
            name, native
        ))?;
        writeln!(out, "cdef {0} wrapper = {0}.__new__({0})", name)?;
        writeln!(out, "wrapper.{} = ptr", ptr)?;
        writeln!(out, "wrapper.{} = owning", owning)?;
        writeln!(out, "wrapper.{} = owner", owner)?;
        writeln!(out, "return wrapper")?;
        out.close_block()?;

        out.newline()?;
        out.block_header("cdef check_native(self)")?;
        out.block_header(format!("if self.{} == NULL", ptr))?;
        writeln!(
            out,
            "raise NullReferenceError(\"'{}' wrapper does not hold a native object\")",
            self.binding.name()
        )?;
        out.close_block()?;
        out.close_block()
    }

    /// Managed constructor dispatching over the construction paths
    fn write_constructor<W: Write>(&self, out: &mut PyWriter<W>) -> Result<()> {
        let name = self.binding.name();

        out.newline()?;
        out.block_header("def __init__(self, *args)")?;
        if !self.binding.is_constructible() {
            writeln!(
                out,
                "raise TypeError(\"'{}' cannot be instantiated from Python\")",
                name
            )?;
            return out.close_block();
        }

        out.block_header(format!("if {} != NULL", self.this()))?;
        writeln!(
            out,
            "raise RuntimeError(\"'{}' wrapper is already initialized\")",
            name
        )?;
        out.close_block()?;
        for path in &self.binding.constructors.paths {
            out.block_header(format!(
                "if {}",
                dispatch_condition(self.settings, &path.signature)
            ))?;
            writeln!(
                out,
                "self.{}({})",
                path.helper,
                forwarded_args(path.signature.arity())
            )?;
            writeln!(out, "return")?;
            out.close_block()?;
        }
        writeln!(
            out,
            "raise NoMatchingOverloadError(\"no overload of {}.__init__ accepts %r\" % (args,))",
            name
        )?;
        out.close_block()?;

        for path in &self.binding.constructors.paths {
            out.newline()?;
            self.write_construction_path(out, path)?;
        }
        Ok(())
    }

    fn write_construction_path<W: Write>(
        &self,
        out: &mut PyWriter<W>,
        path: &ConstructionPath,
    ) -> Result<()> {
        out.block_header(format!(
            "cdef {}({})",
            path.helper,
            typed_params(self.settings, &path.params, true)
        ))?;
        write_argument_checks(out, &path.params)?;
        writeln!(
            out,
            "{} = new {}({})",
            self.this(),
            self.native(),
            native_args(self.settings, &path.params)
        )?;
        writeln!(out, "self.{} = True", self.settings.ownership_attribute)?;
        out.close_block()
    }

    /// Property block, plus the typed helper behind its setter
    fn write_property<W: Write>(&self, out: &mut PyWriter<W>, pair: &AccessorPair) -> Result<()> {
        let field = format!("{}.{}", self.this(), pair.field.name);

        out.block_header(format!("property {}", pair.property))?;
        if let Some(getter) = &pair.getter {
            out.block_header("def __get__(self)")?;
            writeln!(out, "self.check_native()")?;
            write_return(out, self.settings, getter, &field, Some("self"))?;
            out.close_block()?;
        }
        if let Some(setter) = &pair.setter {
            if pair.getter.is_some() {
                out.newline()?;
            }
            out.block_header("def __set__(self, value)")?;
            writeln!(out, "self.check_native()")?;
            out.block_header(format!(
                "if not {}",
                type_check(self.settings, &setter.param.shape, "value")
            ))?;
            writeln!(
                out,
                "raise NoMatchingOverloadError(\"cannot assign %r to {}.{}\" % (value,))",
                self.binding.name(),
                pair.property
            )?;
            out.close_block()?;
            writeln!(out, "self.{}(value)", setter.helper)?;
            out.close_block()?;
        }
        out.close_block()?;

        if let Some(setter) = &pair.setter {
            out.newline()?;
            out.block_header(format!(
                "cdef {}(self, {})",
                setter.helper,
                typed_param(self.settings, &setter.param)
            ))?;
            write_argument_checks(out, std::slice::from_ref(&setter.param))?;
            writeln!(
                out,
                "{} = {}",
                field,
                native_args(self.settings, std::slice::from_ref(&setter.param))
            )?;
            out.close_block()?;
        }
        Ok(())
    }

    /// Dispatcher for one exposed name, followed by one typed helper per overload
    fn write_overload_set<W: Write>(&self, out: &mut PyWriter<W>, set: &OverloadSet) -> Result<()> {
        let binary = set.is_binary_operator();
        if binary {
            out.block_header(format!("def {}(self, other)", set.name))?;
            writeln!(out, "args = (other,)")?;
        } else {
            out.block_header(format!("def {}(self, *args)", set.name))?;
        }
        writeln!(out, "self.check_native()")?;
        for stub in &set.stubs {
            out.block_header(format!(
                "if {}",
                dispatch_condition(self.settings, &stub.signature)
            ))?;
            writeln!(
                out,
                "return self.{}({})",
                stub.helper,
                forwarded_args(stub.signature.arity())
            )?;
            out.close_block()?;
        }
        writeln!(
            out,
            "raise NoMatchingOverloadError(\"no overload of {}.{} accepts %r\" % (args,))",
            self.binding.name(),
            set.name
        )?;
        out.close_block()?;

        for stub in &set.stubs {
            out.newline()?;
            out.block_header(format!(
                "cdef {}({})",
                stub.helper,
                typed_params(self.settings, &stub.params, true)
            ))?;
            write_argument_checks(out, &stub.params)?;
            let call = format!(
                "{}.{}({})",
                self.this(),
                stub.native_name,
                native_args(self.settings, &stub.params)
            );
            write_return(out, self.settings, &stub.returns, &call, Some("self"))?;
            out.close_block()?;
        }
        Ok(())
    }
}
