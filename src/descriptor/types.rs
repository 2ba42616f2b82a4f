use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Typedefs are followed at most this many times before giving up on a spelling
const MAX_TYPEDEF_DEPTH: usize = 16;

/// What a type spelling can refer to besides builtin types
///
/// The descriptor set is the usual scope, but anything that knows about typedefs and class names
/// will do (which keeps the parser testable on its own).
pub trait TypeScope {
    /// Underlying spelling of a typedef
    fn resolve_typedef(&self, alias: &str) -> Option<&str>;

    /// Is this the name of a class that is being wrapped?
    fn is_class(&self, name: &str) -> bool;
}

/// Builtin arithmetic types with automatic conversion to and from Python numbers
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Primitive {
    Bool,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    SizeT,
    Float,
    Double,
}

impl Primitive {
    /// Spelling used on the native side (and in `.pxd` declarations)
    pub const fn cpp_name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Short => "short",
            Primitive::UnsignedShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UnsignedInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::UnsignedLong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::UnsignedLongLong => "unsigned long long",
            Primitive::SizeT => "size_t",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Spelling used for typed arguments in `.pyx` code
    pub const fn cython_name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bint",
            other => other.cpp_name(),
        }
    }

    pub const fn is_floating(&self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }

    fn from_words(words: &str) -> Option<Primitive> {
        let primitive = match words {
            "bool" => Primitive::Bool,
            "short" | "short int" | "signed short" | "signed short int" => Primitive::Short,
            "unsigned short" | "unsigned short int" => Primitive::UnsignedShort,
            "int" | "signed" | "signed int" => Primitive::Int,
            "unsigned" | "unsigned int" => Primitive::UnsignedInt,
            "long" | "long int" | "signed long" | "signed long int" => Primitive::Long,
            "unsigned long" | "unsigned long int" => Primitive::UnsignedLong,
            "long long" | "long long int" | "signed long long" | "signed long long int" => {
                Primitive::LongLong
            }
            "unsigned long long" | "unsigned long long int" => Primitive::UnsignedLongLong,
            "size_t" => Primitive::SizeT,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        };
        Some(primitive)
    }
}

/// How a class-typed value is passed across the boundary
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Indirection {
    Value,
    Reference,
    Pointer,
}

/// Native type, after typedefs, `const`, and namespaces have been dealt with
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum NativeType {
    Void,
    Primitive(Primitive),

    /// `std::string`, exchanged as Python `str`
    String,

    /// One of the classes being wrapped
    Class {
        name: String,
        indirection: Indirection,
        is_const: bool,
    },
}

/// Why a type spelling cannot be mapped
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BadType {
    Empty,

    /// Templates, function pointers, arrays, `char`, ...
    Unsupported(String),

    /// Pointers to anything but a wrapped class
    UnsupportedIndirection(String),

    /// Looks like a class name, but no such class is being wrapped
    UnknownClass(String),

    /// Typedefs that refer back to themselves (or nest absurdly deep)
    TypedefCycle(String),
}

impl fmt::Display for BadType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BadType::Empty => write!(f, "empty type spelling"),
            BadType::Unsupported(spelling) => write!(f, "unsupported type '{}'", spelling),
            BadType::UnsupportedIndirection(spelling) => {
                write!(f, "unsupported indirection in '{}'", spelling)
            }
            BadType::UnknownClass(name) => write!(f, "unknown class '{}'", name),
            BadType::TypedefCycle(name) => write!(f, "typedef '{}' does not resolve", name),
        }
    }
}

impl std::error::Error for BadType {}

/// Lexical pieces of a type spelling
#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Pointer,
    Reference,
}

impl NativeType {
    /// Parse a C++ type spelling such as `const geo::Point &` or `unsigned long`
    pub fn parse(spelling: &str, scope: &dyn TypeScope) -> Result<NativeType, BadType> {
        Self::parse_at_depth(spelling, scope, 0)
    }

    fn parse_at_depth(
        spelling: &str,
        scope: &dyn TypeScope,
        depth: usize,
    ) -> Result<NativeType, BadType> {
        let tokens = Self::tokenize(&mut spelling.chars().peekable(), spelling)?;

        let mut is_const = false;
        let mut words: Vec<&str> = vec![];
        let mut indirection = Indirection::Value;
        for token in &tokens {
            match token {
                Token::Word(word) if word == "const" || word == "volatile" => {
                    is_const |= word == "const";
                }
                Token::Word(_) if indirection != Indirection::Value => {
                    return Err(BadType::Unsupported(spelling.to_owned()));
                }
                Token::Word(word) => words.push(strip_namespace(word)),
                Token::Pointer | Token::Reference if indirection != Indirection::Value => {
                    return Err(BadType::UnsupportedIndirection(spelling.to_owned()));
                }
                Token::Pointer => indirection = Indirection::Pointer,
                Token::Reference => indirection = Indirection::Reference,
            }
        }
        if words.is_empty() {
            return Err(BadType::Empty);
        }

        let base = match words.as_slice() {
            [word] => {
                // Typedefs are looked up by full spelling first, then without namespace
                let full = tokens.iter().find_map(|token| match token {
                    Token::Word(w) if w != "const" && w != "volatile" => Some(w.as_str()),
                    _ => None,
                });
                let alias = full
                    .and_then(|full| scope.resolve_typedef(full))
                    .or_else(|| scope.resolve_typedef(word));
                if let Some(underlying) = alias {
                    if depth >= MAX_TYPEDEF_DEPTH {
                        return Err(BadType::TypedefCycle((*word).to_owned()));
                    }
                    let resolved = Self::parse_at_depth(underlying, scope, depth + 1)?;
                    return resolved.with_indirection(indirection, is_const, spelling);
                }
                Self::base_type(word, scope)?
            }
            _ => {
                let joined = words.join(" ");
                match Primitive::from_words(&joined) {
                    Some(primitive) => NativeType::Primitive(primitive),
                    None => return Err(BadType::Unsupported(spelling.to_owned())),
                }
            }
        };

        base.with_indirection(indirection, is_const, spelling)
    }

    fn base_type(word: &str, scope: &dyn TypeScope) -> Result<NativeType, BadType> {
        if word == "void" {
            Ok(NativeType::Void)
        } else if word == "string" {
            Ok(NativeType::String)
        } else if let Some(primitive) = Primitive::from_words(word) {
            Ok(NativeType::Primitive(primitive))
        } else if scope.is_class(word) {
            Ok(NativeType::Class {
                name: word.to_owned(),
                indirection: Indirection::Value,
                is_const: false,
            })
        } else if word == "char" || word == "wchar_t" || word == "auto" {
            Err(BadType::Unsupported(word.to_owned()))
        } else {
            Err(BadType::UnknownClass(word.to_owned()))
        }
    }

    /// Layer indirection and constness read off the spelling onto a base type
    ///
    /// References to builtin types are passed by value (the same way `const int &` and `int` look
    /// identical from Python) but pointers to them have no Python counterpart.
    fn with_indirection(
        self,
        indirection: Indirection,
        is_const: bool,
        spelling: &str,
    ) -> Result<NativeType, BadType> {
        match (self, indirection) {
            (
                NativeType::Class {
                    name,
                    indirection: Indirection::Value,
                    is_const: inner_const,
                },
                indirection,
            ) => Ok(NativeType::Class {
                name,
                indirection,
                is_const: is_const || inner_const,
            }),
            // `const` on an aliased reference or pointer qualifies the alias, never the pointee
            (ty, Indirection::Value) => Ok(ty),
            (NativeType::Void, _) => Err(BadType::UnsupportedIndirection(spelling.to_owned())),
            (ty @ NativeType::Primitive(_), Indirection::Reference)
            | (ty @ NativeType::String, Indirection::Reference) => Ok(ty),
            (NativeType::Primitive(_), Indirection::Pointer)
            | (NativeType::String, Indirection::Pointer) => {
                Err(BadType::UnsupportedIndirection(spelling.to_owned()))
            }
            (NativeType::Class { .. }, _) => {
                Err(BadType::UnsupportedIndirection(spelling.to_owned()))
            }
        }
    }

    fn tokenize(source: &mut Peekable<Chars>, spelling: &str) -> Result<Vec<Token>, BadType> {
        let mut tokens = vec![];
        while let Some(c) = source.next() {
            match c {
                c if c.is_whitespace() => (),
                '*' => tokens.push(Token::Pointer),
                '&' => {
                    // `&&` (rvalue references) bind like plain references from our side
                    source.next_if_eq(&'&');
                    tokens.push(Token::Reference);
                }
                c if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(c) =
                        source.next_if(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ':')
                    {
                        word.push(c);
                    }
                    tokens.push(Token::Word(word));
                }
                _ => return Err(BadType::Unsupported(spelling.to_owned())),
            }
        }
        Ok(tokens)
    }

    /// Name of the wrapped class, if this is a class type
    pub fn class_name(&self) -> Option<&str> {
        match self {
            NativeType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, NativeType::Void)
    }

    /// Spelling used in `.pxd` declarations
    pub fn cpp_spelling(&self) -> String {
        match self {
            NativeType::Void => String::from("void"),
            NativeType::Primitive(primitive) => primitive.cpp_name().to_owned(),
            NativeType::String => String::from("string"),
            NativeType::Class {
                name,
                indirection,
                is_const,
            } => {
                let mut spelling = String::new();
                if *is_const {
                    spelling.push_str("const ");
                }
                spelling.push_str(name);
                match indirection {
                    Indirection::Value => (),
                    Indirection::Reference => spelling.push('&'),
                    Indirection::Pointer => spelling.push('*'),
                }
                spelling
            }
        }
    }
}

/// `std::string` becomes `string`, `geo::Point` becomes `Point`
fn strip_namespace(word: &str) -> &str {
    word.rsplit("::").next().unwrap_or(word)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    struct Scope {
        typedefs: HashMap<&'static str, &'static str>,
        classes: Vec<&'static str>,
    }

    impl TypeScope for Scope {
        fn resolve_typedef(&self, alias: &str) -> Option<&str> {
            self.typedefs.get(alias).copied()
        }

        fn is_class(&self, name: &str) -> bool {
            self.classes.contains(&name)
        }
    }

    fn scope() -> Scope {
        Scope {
            typedefs: HashMap::from([
                ("coord_t", "double"),
                ("geo::index_t", "unsigned long"),
                ("PointRef", "Point &"),
                ("PointPtr", "Point *"),
                ("loop_a", "loop_b"),
                ("loop_b", "loop_a"),
            ]),
            classes: vec!["Point", "Polygon"],
        }
    }

    fn parse(spelling: &str) -> Result<NativeType, BadType> {
        NativeType::parse(spelling, &scope())
    }

    #[test]
    fn builtin_types() {
        assert_eq!(parse("int"), Ok(NativeType::Primitive(Primitive::Int)));
        assert_eq!(parse("unsigned  int"), Ok(NativeType::Primitive(Primitive::UnsignedInt)));
        assert_eq!(parse("long long"), Ok(NativeType::Primitive(Primitive::LongLong)));
        assert_eq!(parse("const double &"), Ok(NativeType::Primitive(Primitive::Double)));
        assert_eq!(parse("std::string"), Ok(NativeType::String));
        assert_eq!(parse("const std::string&"), Ok(NativeType::String));
        assert_eq!(parse("void"), Ok(NativeType::Void));
    }

    #[test]
    fn class_types() {
        assert_eq!(
            parse("const geo::Point &"),
            Ok(NativeType::Class {
                name: String::from("Point"),
                indirection: Indirection::Reference,
                is_const: true,
            })
        );
        assert_eq!(
            parse("Polygon*"),
            Ok(NativeType::Class {
                name: String::from("Polygon"),
                indirection: Indirection::Pointer,
                is_const: false,
            })
        );
    }

    #[test]
    fn typedefs() {
        assert_eq!(parse("coord_t"), Ok(NativeType::Primitive(Primitive::Double)));
        assert_eq!(
            parse("geo::index_t"),
            Ok(NativeType::Primitive(Primitive::UnsignedLong))
        );
        assert_eq!(
            parse("PointRef").map(|ty| ty.cpp_spelling()),
            Ok(String::from("Point&"))
        );
        assert!(matches!(parse("loop_a"), Err(BadType::TypedefCycle(_))));
    }

    #[test]
    fn const_aliases() {
        // `const PointRef` is still `Point &`, `const PointPtr` is `Point * const`
        assert_eq!(
            parse("const PointRef").map(|ty| ty.cpp_spelling()),
            Ok(String::from("Point&"))
        );
        assert_eq!(
            parse("const PointPtr").map(|ty| ty.cpp_spelling()),
            Ok(String::from("Point*"))
        );
        assert_eq!(
            parse("const Point").map(|ty| ty.cpp_spelling()),
            Ok(String::from("const Point"))
        );
    }

    #[test]
    fn unsupported_types() {
        assert!(matches!(parse("std::vector<int>"), Err(BadType::Unsupported(_))));
        assert!(matches!(parse("int *"), Err(BadType::UnsupportedIndirection(_))));
        assert!(matches!(parse("Point **"), Err(BadType::UnsupportedIndirection(_))));
        assert!(matches!(parse("void *"), Err(BadType::UnsupportedIndirection(_))));
        assert_eq!(parse("Line"), Err(BadType::UnknownClass(String::from("Line"))));
        assert_eq!(parse("  "), Err(BadType::Empty));
    }
}
