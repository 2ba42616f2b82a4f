use crate::descriptor::from_camel_case;
use std::collections::HashSet;

/// Naming policy for everything exposed to Python
pub trait Renamer {
    /// Rename a wrapper class
    fn rename_class(&self, name: &str) -> String;

    /// Rename a method, overload group, or free function
    fn rename_method(&self, name: &str) -> String;

    /// Rename a field's property
    fn rename_property(&self, name: &str) -> String;

    /// Rename a parameter (used as a local variable in generated code)
    fn rename_parameter(&self, name: &str) -> String;
}

/// Doesn't rename anything
pub struct IdentityRenamer;

impl Renamer for IdentityRenamer {
    fn rename_class(&self, name: &str) -> String {
        name.to_owned()
    }

    fn rename_method(&self, name: &str) -> String {
        name.to_owned()
    }

    fn rename_property(&self, name: &str) -> String {
        name.to_owned()
    }

    fn rename_parameter(&self, name: &str) -> String {
        name.to_owned()
    }
}

/// Renames into something that is usable from Python (and compiles as Cython)
///
/// Members get snake case names unless `keep_case` is set. Class names never change case. Either
/// way, names that would collide with a keyword get underscores appended.
pub struct PythonRenamer {
    reserved: HashSet<&'static str>,
    keep_case: bool,
}

impl PythonRenamer {
    pub fn new() -> PythonRenamer {
        PythonRenamer {
            reserved: Self::RESERVED_IDENTIFIERS.iter().copied().collect(),
            keep_case: false,
        }
    }

    /// Only escape keywords, leave the case of member names alone
    pub fn keeping_case() -> PythonRenamer {
        PythonRenamer {
            keep_case: true,
            ..PythonRenamer::new()
        }
    }

    /// Python keywords, plus what Cython reserves on top of them
    pub const RESERVED_IDENTIFIERS: [&'static str; 56] = [
        "False",
        "None",
        "True",
        "and",
        "as",
        "assert",
        "async",
        "await",
        "break",
        "class",
        "continue",
        "def",
        "del",
        "elif",
        "else",
        "except",
        "finally",
        "for",
        "from",
        "global",
        "if",
        "import",
        "in",
        "is",
        "lambda",
        "nonlocal",
        "not",
        "or",
        "pass",
        "raise",
        "return",
        "try",
        "while",
        "with",
        "yield",
        "self",
        "cdef",
        "cpdef",
        "cimport",
        "ctypedef",
        "extern",
        "struct",
        "union",
        "enum",
        "include",
        "inline",
        "public",
        "readonly",
        "api",
        "gil",
        "nogil",
        "new",
        "sizeof",
        "NULL",
        "property",
        "object",
    ];

    fn escape(&self, mut name: String) -> String {
        while self.reserved.contains(name.as_str()) {
            name.push('_');
        }
        name
    }

    fn rename_member(&self, name: &str) -> String {
        if self.keep_case {
            self.escape(name.to_owned())
        } else {
            self.escape(from_camel_case(name))
        }
    }
}

impl Default for PythonRenamer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renamer for PythonRenamer {
    fn rename_class(&self, name: &str) -> String {
        self.escape(name.to_owned())
    }

    fn rename_method(&self, name: &str) -> String {
        self.rename_member(name)
    }

    fn rename_property(&self, name: &str) -> String {
        self.rename_member(name)
    }

    fn rename_parameter(&self, name: &str) -> String {
        self.rename_member(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn snake_case_members() {
        let renamer = PythonRenamer::new();
        assert_eq!(renamer.rename_method("getLength"), "get_length");
        assert_eq!(renamer.rename_property("originX"), "origin_x");
        assert_eq!(renamer.rename_class("HTTPServer"), "HTTPServer");
    }

    #[test]
    fn keywords_are_escaped() {
        let renamer = PythonRenamer::new();
        assert_eq!(renamer.rename_parameter("lambda"), "lambda_");
        assert_eq!(renamer.rename_method("from"), "from_");
        assert_eq!(renamer.rename_class("None"), "None_");
        assert_eq!(PythonRenamer::keeping_case().rename_method("del"), "del_");
    }

    #[test]
    fn keeping_case() {
        let renamer = PythonRenamer::keeping_case();
        assert_eq!(renamer.rename_method("getLength"), "getLength");
        assert_eq!(IdentityRenamer.rename_method("lambda"), "lambda");
    }
}
