//! Generating whole modules from descriptor files

use pywrap::descriptor::{DescriptorArenas, DescriptorFile, DescriptorSet};
use pywrap::diagnostics::DiagnosticKind;
use pywrap::generate::{generate, Error, Generated, Settings};

const GEOMETRY_JSON: &str = r#"{
    "module": "geometry",
    "typedefs": { "coord_t": "int" },
    "classes": [
        {
            "name": "Point",
            "header": "point.hpp",
            "namespace": "geo",
            "constructors": [
                { "params": [] },
                { "params": [{ "name": "x", "type": "coord_t" }, { "name": "y", "type": "coord_t" }] }
            ],
            "fields": [
                { "name": "x", "type": "coord_t", "access": "rw" },
                { "name": "label", "type": "std::string", "access": "r" }
            ],
            "methods": [
                { "name": "clone", "returns": "Point", "ownership": "transferred" },
                { "name": "peek", "returns": "const Point &" },
                { "name": "parent", "returns": "Point *" },
                { "name": "scaleBy", "params": [{ "name": "factor", "type": "double" }] },
                { "name": "labels", "returns": "std::vector<std::string>" },
                { "name": "operator==", "params": [{ "name": "other", "type": "const Point &" }], "returns": "bool" }
            ]
        },
        {
            "name": "Ambiguous",
            "header": "point.hpp",
            "constructors": [
                { "params": [{ "name": "a", "type": "int" }] },
                { "params": [{ "name": "b", "type": "long" }] }
            ]
        },
        {
            "name": "Registry",
            "header": "registry.hpp",
            "methods": [
                { "name": "find", "params": [{ "name": "name", "type": "std::string" }], "returns": "Point *" },
                { "name": "broken", "returns": "Ambiguous &" }
            ]
        }
    ],
    "functions": [
        {
            "name": "distance",
            "header": "point.hpp",
            "namespace": "geo",
            "params": [{ "name": "a", "type": "const Point &" }, { "name": "b", "type": "const Point &" }],
            "returns": "double"
        }
    ]
}"#;

fn generate_geometry(settings: &Settings) -> Result<Generated, Error> {
    let arenas = DescriptorArenas::new();
    let set = DescriptorSet::new(&arenas);
    set.load(DescriptorFile::from_json(GEOMETRY_JSON)?);
    generate(&set, settings)
}

#[test]
fn failing_classes_are_left_out() {
    let settings = Settings::new("geometry").unwrap();
    let generated = generate_geometry(&settings).unwrap();

    assert!(!generated.is_complete());
    assert_eq!(generated.failures.len(), 1);
    assert!(matches!(
        &generated.failures[0],
        Error::AmbiguousConstructor { class, first: 0, second: 1, .. } if class == "Ambiguous"
    ));
    assert_eq!(generated.wrapped, vec!["Point", "Registry"]);

    let pyx = &generated.files["geometry.pyx"];
    assert!(pyx.contains("cdef class Point:\n"));
    assert!(pyx.contains("cdef class Registry:\n"));
    assert!(!pyx.contains("Ambiguous"));
    assert!(!pyx.contains("def broken"));
}

#[test]
fn diagnostics() {
    let settings = Settings::new("geometry").unwrap();
    let generated = generate_geometry(&settings).unwrap();
    let diagnostics = &generated.diagnostics;

    assert!(diagnostics.any_for(DiagnosticKind::ReviewOwnership, "Point"));
    assert!(diagnostics.any_for(DiagnosticKind::ReviewOwnership, "Registry"));
    assert!(diagnostics.any_for(DiagnosticKind::SkippedMember, "Point"));
    assert!(diagnostics.any_for(DiagnosticKind::SkippedMember, "Registry"));
    assert!(diagnostics.any_for(DiagnosticKind::NoConstructionPath, "Registry"));
}

#[test]
fn strict_ownership_fails_guessing_classes() {
    let mut settings = Settings::new("geometry").unwrap();
    settings.strict_ownership = true;
    let generated = generate_geometry(&settings).unwrap();

    let failed: Vec<&str> = generated
        .failures
        .iter()
        .filter_map(|err| err.class())
        .collect();
    assert_eq!(failed, vec!["Point", "Ambiguous", "Registry"]);
    assert!(generated.wrapped.is_empty());

    // Nothing is left for the free function to take
    assert!(!generated.files["geometry.pyx"].contains("def distance"));
}

#[test]
fn wrappers() {
    let settings = Settings::new("geometry").unwrap();
    let generated = generate_geometry(&settings).unwrap();
    let pyx = &generated.files["geometry.pyx"];

    // Camel case methods become snake case, operators become special methods
    assert!(pyx.contains("    def scale_by(self, *args):\n"));
    assert!(pyx.contains("    def __eq__(self, other):\n"));
    assert!(pyx.contains(
        "        return Point.adopt(<cpp.Point*>&self.thisptr.peek(), False, self)\n"
    ));
    assert!(pyx.contains(
        "        return Point.adopt(new cpp.Point(self.thisptr.clone()), True)\n"
    ));
    assert!(pyx.contains(
        "    cdef _find_0(self, str name):\n        cdef cpp.Point* result = <cpp.Point*>self.thisptr.find(name.encode('utf8'))\n        if result == NULL:\n            return None\n        return Point.adopt(result, False, self)\n"
    ));
    assert!(pyx.contains(
        "    def __init__(self, *args):\n        raise TypeError(\"'Registry' cannot be instantiated from Python\")\n"
    ));
    assert!(pyx.contains(
        "def distance(*args):\n    if len(args) == 2 and isinstance(args[0], Point) and isinstance(args[1], Point):\n        return _distance_0(args[0], args[1])\n"
    ));
    assert!(pyx.contains(
        "cdef _distance_0(Point a, Point b):\n    a.check_native()\n    b.check_native()\n    return cpp.distance(deref(a.thisptr), deref(b.thisptr))\n"
    ));
}

#[test]
fn declarations() {
    let settings = Settings::new("geometry").unwrap();
    let generated = generate_geometry(&settings).unwrap();
    let pxd = &generated.files["_declarations.pxd"];

    assert!(pxd.contains("cdef extern from \"point.hpp\" namespace \"geo\":\n    cppclass Point\n"));
    assert!(pxd.contains("    cppclass Point:\n        Point() except +\n        Point(int, int) except +\n        Point(const Point&) except +\n"));
    assert!(pxd.contains("        int x\n        string label\n"));
    assert!(pxd.contains("        const Point& peek() except +\n"));
    assert!(pxd.contains("        bool op_eq \"operator==\"(const Point&) except +\n"));
    assert!(!pxd.contains("labels"));
    assert!(pxd.contains("cdef extern from \"registry.hpp\":\n    cppclass Registry:\n        Point* find(string) except +\n"));
    assert!(pxd.contains("    double distance(const Point&, const Point&) except +\n"));
}

#[test]
fn output_is_deterministic() {
    let settings = Settings::new("geometry").unwrap();
    let first = generate_geometry(&settings).unwrap();
    let second = generate_geometry(&settings).unwrap();
    assert_eq!(first.files, second.files);
}

#[test]
fn bad_settings() {
    let mut settings = Settings::new("geometry").unwrap();
    settings.declarations_module = String::from("geometry");
    assert!(matches!(
        generate_geometry(&settings),
        Err(Error::MalformedName(_))
    ));
}

const ENGINE_JSON: &str = r#"{
    "module": "engines",
    "classes": [
        {
            "name": "Engine",
            "constructors": [{ "params": [] }],
            "fields": [
                { "name": "_rpm", "type": "int", "access": "rw" },
                { "name": "rpm", "type": "int", "access": "rw" },
                { "name": "next", "type": "Engine *", "access": "rw" }
            ],
            "methods": [
                { "name": "init" },
                { "name": "_reset" },
                { "name": "reset" }
            ]
        }
    ],
    "functions": [
        { "name": "deref", "params": [{ "name": "e", "type": "Engine *" }], "returns": "int" },
        { "name": "_tune" },
        { "name": "tune" }
    ]
}"#;

#[test]
fn generated_names_do_not_collide() {
    let arenas = DescriptorArenas::new();
    let set = DescriptorSet::new(&arenas);
    set.load(DescriptorFile::from_json(ENGINE_JSON).unwrap());
    let settings = Settings::new("engines").unwrap();
    let generated = generate(&set, &settings).unwrap();
    assert!(generated.is_complete());

    let pyx = &generated.files["engines.pyx"];
    let helpers: Vec<&str> = pyx
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("cdef _"))
        .map(|line| &line["cdef ".len()..line.find('(').unwrap()])
        .collect();
    let mut unique = helpers.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(helpers.len(), unique.len(), "{:?}", helpers);
    assert!(helpers.contains(&"_init_0"));
    assert!(helpers.contains(&"_init_0_"));
    assert!(helpers.contains(&"_reset_0_"));
    assert!(helpers.contains(&"_tune_0_"));

    // The pointer field cannot be assigned, and the function would shadow `deref`
    assert!(pyx.contains("    property next:\n"));
    assert!(!pyx.contains("_set_next"));
    assert!(!pyx.contains("def deref"));
    assert!(generated.diagnostics.iter().any(|d| {
        d.kind == DiagnosticKind::ReviewOwnership && d.member.as_deref() == Some("next")
    }));
}
