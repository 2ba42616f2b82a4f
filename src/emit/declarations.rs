use super::marshal::declared_return;
use super::writer::PyWriter;
use crate::bind::{ClassBinding, MethodStub, OverloadSet, ParamPlan, ReturnPlan};
use crate::descriptor::{Indirection, NativeType};
use std::io::{Result, Write};

/// Where a group of declarations lives on the native side
#[derive(Clone, Debug, PartialEq, Eq)]
struct ExternBlock<'a> {
    header: Option<&'a str>,
    namespace: Option<&'a str>,
}

impl<'a> ExternBlock<'a> {
    fn open<W: Write>(&self, out: &mut PyWriter<W>) -> Result<()> {
        match self.header {
            Some(header) => write!(out, "cdef extern from \"{}\"", header)?,
            None => write!(out, "cdef extern from *")?,
        }
        if let Some(namespace) = self.namespace {
            write!(out, " namespace \"{}\"", namespace)?;
        }
        out.open_block()
    }
}

/// Renders the `cdef extern` declarations the wrappers are compiled against
///
/// Only what got bound is declared: members that were skipped may have types Cython cannot
/// express.
pub struct DeclarationsWriter<'a, 'c> {
    pub classes: &'a [ClassBinding<'c>],
    pub functions: &'a [OverloadSet<'c>],
}

impl<'a, 'c> DeclarationsWriter<'a, 'c> {
    pub fn write<W: Write>(&self, out: &mut PyWriter<W>) -> Result<()> {
        writeln!(out, "# Generated by pywrap. Do not edit.")?;
        out.newline()?;
        writeln!(out, "from libcpp cimport bool")?;
        writeln!(out, "from libcpp.string cimport string")?;

        // Forward declarations, so classes can mention each other in any order
        for binding in self.classes {
            out.newline()?;
            out.newline()?;
            Self::block_of(binding).open(out)?;
            writeln!(out, "cppclass {}", binding.name())?;
            out.close_block()?;
        }

        for binding in self.classes {
            out.newline()?;
            out.newline()?;
            Self::block_of(binding).open(out)?;
            self.write_class(out, binding)?;
            out.close_block()?;
        }

        let mut blocks: Vec<(ExternBlock, Vec<&MethodStub>)> = vec![];
        for stub in self.functions.iter().flat_map(|set| set.stubs.iter()) {
            let block = ExternBlock {
                header: stub.descriptor.header.as_deref(),
                namespace: stub.descriptor.namespace.as_deref(),
            };
            match blocks.iter_mut().find(|(existing, _)| *existing == block) {
                Some((_, stubs)) => stubs.push(stub),
                None => blocks.push((block, vec![stub])),
            }
        }
        for (block, stubs) in blocks {
            out.newline()?;
            out.newline()?;
            block.open(out)?;
            for stub in stubs {
                Self::write_callable(out, &stub.native_name, stub)?;
            }
            out.close_block()?;
        }
        Ok(())
    }

    fn block_of<'b>(binding: &'b ClassBinding) -> ExternBlock<'b> {
        ExternBlock {
            header: binding.descriptor.header.as_deref(),
            namespace: binding.descriptor.namespace.as_deref(),
        }
    }

    fn write_class<W: Write>(&self, out: &mut PyWriter<W>, binding: &ClassBinding) -> Result<()> {
        let name = binding.name();
        out.block_header(format!("cppclass {}", name))?;

        let mut copyable = false;
        for path in &binding.constructors.paths {
            copyable |= Self::is_copy(name, &path.params);
            writeln!(out, "{}({}) except +", name, Self::param_list(&path.params))?;
        }
        // By-value results are wrapped through a heap copy
        if !copyable && self.returns_by_value(name) {
            writeln!(out, "{0}(const {0}&) except +", name)?;
        }

        for pair in &binding.properties {
            writeln!(out, "{} {}", pair.native.cpp_spelling(), pair.field.name)?;
        }
        for set in &binding.methods {
            for stub in &set.stubs {
                if set.operator {
                    let alias = format!("{} \"{}\"", stub.native_name, stub.descriptor.name);
                    Self::write_callable(out, &alias, stub)?;
                } else {
                    Self::write_callable(out, &stub.native_name, stub)?;
                }
            }
        }
        out.close_block()
    }

    fn write_callable<W: Write>(
        out: &mut PyWriter<W>,
        declared_name: &str,
        stub: &MethodStub,
    ) -> Result<()> {
        writeln!(
            out,
            "{} {}({}) except +",
            declared_return(&stub.returns),
            declared_name,
            Self::param_list(&stub.params)
        )
    }

    fn param_list(params: &[ParamPlan]) -> String {
        params
            .iter()
            .map(|param| param.native.cpp_spelling())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Single parameter that is the class itself, by value or reference
    fn is_copy(class: &str, params: &[ParamPlan]) -> bool {
        match params {
            [ParamPlan {
                native:
                    NativeType::Class {
                        name, indirection, ..
                    },
                ..
            }] => name == class && *indirection != Indirection::Pointer,
            _ => false,
        }
    }

    /// Is an instance of `class` returned by value anywhere in the module?
    fn returns_by_value(&self, class: &str) -> bool {
        self.classes
            .iter()
            .flat_map(|binding| binding.methods.iter())
            .chain(self.functions.iter())
            .flat_map(|set| set.stubs.iter())
            .any(|stub| match &stub.returns {
                ReturnPlan::Wrap {
                    class: returned,
                    resolution,
                    ..
                } => returned == class && resolution.indirection == Indirection::Value,
                _ => false,
            })
    }
}
