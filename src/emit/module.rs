use super::class::ClassWriter;
use super::declarations::DeclarationsWriter;
use super::marshal::{
    dispatch_condition, forwarded_args, native_args, typed_params, write_argument_checks,
    write_return,
};
use super::writer::PyWriter;
use crate::bind::{ClassBinding, OverloadSet};
use crate::generate::{Error, Settings};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Everything that ends up in one extension module
pub struct ModuleWriter<'a, 'c> {
    pub classes: &'a [ClassBinding<'c>],
    pub functions: &'a [OverloadSet<'c>],
    pub settings: &'a Settings,
}

impl<'a, 'c> ModuleWriter<'a, 'c> {
    /// Render every generated file, keyed by file name
    pub fn render(&self) -> Result<BTreeMap<String, String>, Error> {
        let mut files = BTreeMap::new();
        files.insert(
            format!("{}.pyx", self.settings.module_name),
            Self::render_with(|out| self.write_wrappers(out))?,
        );
        files.insert(
            format!("{}.pxd", self.settings.declarations_module),
            Self::render_with(|out| {
                DeclarationsWriter {
                    classes: self.classes,
                    functions: self.functions,
                }
                .write(out)
            })?,
        );
        files.insert(
            String::from("setup.py"),
            Self::render_with(|out| self.write_setup_py(out))?,
        );
        Ok(files)
    }

    fn render_with(
        write: impl FnOnce(&mut PyWriter<&mut Vec<u8>>) -> io::Result<()>,
    ) -> Result<String, Error> {
        let mut output = vec![];
        let mut out = PyWriter::new(&mut output);
        write(&mut out)?;
        out.close()?;
        String::from_utf8(output)
            .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    /// The `.pyx` module: preamble, wrapper classes, then free functions
    pub fn write_wrappers<W: Write>(&self, out: &mut PyWriter<W>) -> io::Result<()> {
        let settings = self.settings;
        writeln!(out, "# distutils: language = c++")?;
        writeln!(out, "# Generated by pywrap. Do not edit.")?;
        out.newline()?;
        writeln!(out, "from cython.operator cimport dereference as deref")?;
        writeln!(out, "from libcpp cimport bool")?;
        writeln!(out, "from libcpp.string cimport string")?;
        writeln!(
            out,
            "cimport {} as {}",
            settings.declarations_module, settings.native_alias
        )?;

        out.newline()?;
        out.newline()?;
        out.block_header("class NullReferenceError(Exception)")?;
        out.close_block()?;
        out.newline()?;
        out.newline()?;
        out.block_header("class NoMatchingOverloadError(TypeError)")?;
        out.close_block()?;

        for binding in self.classes {
            out.newline()?;
            out.newline()?;
            ClassWriter { binding, settings }.write(out)?;
        }
        for set in self.functions {
            out.newline()?;
            out.newline()?;
            self.write_function(out, set)?;
        }
        Ok(())
    }

    fn write_function<W: Write>(&self, out: &mut PyWriter<W>, set: &OverloadSet) -> io::Result<()> {
        let settings = self.settings;
        out.block_header(format!("def {}(*args)", set.name))?;
        for stub in &set.stubs {
            out.block_header(format!("if {}", dispatch_condition(settings, &stub.signature)))?;
            writeln!(
                out,
                "return {}({})",
                stub.helper,
                forwarded_args(stub.signature.arity())
            )?;
            out.close_block()?;
        }
        writeln!(
            out,
            "raise NoMatchingOverloadError(\"no overload of {} accepts %r\" % (args,))",
            set.name
        )?;
        out.close_block()?;

        for stub in &set.stubs {
            out.newline()?;
            out.newline()?;
            out.block_header(format!(
                "cdef {}({})",
                stub.helper,
                typed_params(settings, &stub.params, false)
            ))?;
            write_argument_checks(out, &stub.params)?;
            let call = format!(
                "{}.{}({})",
                settings.native_alias,
                stub.native_name,
                native_args(settings, &stub.params)
            );
            write_return(out, settings, &stub.returns, &call, None)?;
            out.close_block()?;
        }
        Ok(())
    }

    /// Build script compiling the module as a C++ extension
    pub fn write_setup_py<W: Write>(&self, out: &mut PyWriter<W>) -> io::Result<()> {
        let settings = self.settings;
        let quoted = |items: &[String]| {
            items
                .iter()
                .map(|item| format!("{:?}", item))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sources = vec![format!("{}.pyx", settings.module_name)];
        sources.extend(settings.sources.iter().cloned());

        writeln!(out, "# Generated by pywrap. Do not edit.")?;
        writeln!(out, "from setuptools import Extension, setup")?;
        writeln!(out, "from Cython.Build import cythonize")?;
        out.newline()?;
        out.newline()?;
        writeln!(out, "extensions = [")?;
        writeln!(out, "    Extension(")?;
        writeln!(out, "        {:?},", settings.module_name)?;
        writeln!(out, "        sources=[{}],", quoted(&sources))?;
        writeln!(out, "        include_dirs=[{}],", quoted(&settings.include_dirs))?;
        writeln!(out, "        language=\"c++\",")?;
        writeln!(out, "    ),")?;
        writeln!(out, "]")?;
        out.newline()?;
        writeln!(out, "setup(")?;
        writeln!(out, "    name={:?},", settings.module_name)?;
        writeln!(out, "    ext_modules=cythonize(extensions, language_level=3),")?;
        writeln!(out, ")")
    }
}
