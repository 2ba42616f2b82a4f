use super::{Error, PythonRenamer, Renamer};
use crate::descriptor::check_identifier;
use std::collections::BTreeMap;

pub struct Settings {
    /// Name of the generated extension module (`<module>.pyx`)
    pub module_name: String,

    /// Name of the `.pxd` file carrying the `cdef extern` declarations
    pub declarations_module: String,

    /// Name under which the declarations module is cimported
    pub native_alias: String,

    /// Wrapper attribute holding the native pointer
    pub pointer_attribute: String,

    /// Wrapper attribute recording whether the native object gets deleted with the wrapper
    pub ownership_attribute: String,

    /// Wrapper attribute keeping alive whatever a non-owning pointer points into
    ///
    /// A wrapper obtained from a field or a borrowed return holds a reference to the wrapper it
    /// came from, so that the owning wrapper is not collected while the view is still reachable.
    pub owner_attribute: String,

    /// Python special method name for each supported C++ operator
    ///
    /// Operators missing from this table are skipped (with a diagnostic).
    pub operators: BTreeMap<String, String>,

    /// Treat every ownership fallback as an error for the class concerned
    pub strict_ownership: bool,

    /// Include directories passed on to the generated `setup.py`
    pub include_dirs: Vec<String>,

    /// Extra C++ sources compiled into the extension by the generated `setup.py`
    pub sources: Vec<String>,

    /// Naming policy for exposed classes and members
    pub renamer: Box<dyn Renamer>,
}

impl Settings {
    pub fn new(module_name: impl Into<String>) -> Result<Settings, Error> {
        fn make_name(name: impl Into<String>) -> Result<String, Error> {
            let name = name.into();
            check_identifier(&name).map_err(Error::MalformedName)?;
            Ok(name)
        }

        Ok(Settings {
            module_name: make_name(module_name)?,
            declarations_module: make_name("_declarations")?,
            native_alias: make_name("cpp")?,
            pointer_attribute: make_name("thisptr")?,
            ownership_attribute: make_name("delete_thisptr")?,
            owner_attribute: make_name("owner")?,
            operators: Self::default_operators(),
            strict_ownership: false,
            include_dirs: vec![],
            sources: vec![],
            renamer: Box::new(PythonRenamer::new()),
        })
    }

    /// Operators with a natural Python counterpart
    pub fn default_operators() -> BTreeMap<String, String> {
        [
            ("operator+", "__add__"),
            ("operator-", "__sub__"),
            ("operator*", "__mul__"),
            ("operator/", "__truediv__"),
            ("operator%", "__mod__"),
            ("operator==", "__eq__"),
            ("operator!=", "__ne__"),
            ("operator<", "__lt__"),
            ("operator<=", "__le__"),
            ("operator>", "__gt__"),
            ("operator>=", "__ge__"),
            ("operator()", "__call__"),
            ("operator[]", "__getitem__"),
        ]
        .iter()
        .map(|(op, special)| (String::from(*op), String::from(*special)))
        .collect()
    }

    /// Check that names set after construction are still usable
    pub fn validate(&self) -> Result<(), Error> {
        for name in [
            &self.module_name,
            &self.declarations_module,
            &self.native_alias,
            &self.pointer_attribute,
            &self.ownership_attribute,
            &self.owner_attribute,
        ] {
            check_identifier(name).map_err(Error::MalformedName)?;
        }
        if self.module_name == self.declarations_module {
            return Err(Error::MalformedName(format!(
                "Module '{}' would overwrite its own declarations",
                self.module_name
            )));
        }
        for special in self.operators.values() {
            check_identifier(special).map_err(Error::MalformedName)?;
        }
        Ok(())
    }

    /// Names on generated wrappers that exposed members must not shadow
    pub fn reserved_members(&self) -> [&str; 5] {
        [
            self.pointer_attribute.as_str(),
            self.ownership_attribute.as_str(),
            self.owner_attribute.as_str(),
            "adopt",
            "check_native",
        ]
    }

    /// Names the module preamble defines, which wrapper classes and functions must not shadow
    pub fn reserved_globals(&self) -> [&str; 6] {
        [
            "NullReferenceError",
            "NoMatchingOverloadError",
            "deref",
            "bool",
            "string",
            self.native_alias.as_str(),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::new("geometry").unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.operators["operator+"], "__add__");
        assert!(settings.reserved_members().contains(&"thisptr"));
        assert!(settings.reserved_globals().contains(&"cpp"));
    }

    #[test]
    fn bad_names() {
        assert!(matches!(
            Settings::new("my-module"),
            Err(Error::MalformedName(_))
        ));
        let mut settings = Settings::new("geometry").unwrap();
        settings.declarations_module = String::from("geometry");
        assert!(settings.validate().is_err());
    }
}
