//! Bound plan of a wrapper class
//!
//! Binding a class resolves every type spelling, ownership question, and overload once. The
//! resulting [`ClassBinding`] is what gets rendered as Cython and also what the
//! [`crate::runtime`] interprets, so both agree on which overload a call picks and which wrapper
//! owns what.

mod accessors;
mod forwarder;
mod signature;

pub use accessors::*;
pub use forwarder::*;
pub use signature::*;

use crate::descriptor::{
    BadType, ClassDescriptor, DescriptorSet, FunctionDescriptor, NativeType, Parameter, TypeScope,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::generate::{Error, Settings};
use crate::ownership::{OwnershipResolver, Resolution};
use std::collections::HashSet;

/// Typed parameter of a generated helper
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamPlan {
    /// Local name in generated code
    pub name: String,

    pub native: NativeType,
    pub shape: Shape,
}

/// How a native result gets handed back to the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnPlan {
    Void,

    /// Builtin value, converted to the matching Python object
    Value(NativeType),

    /// Class instance, handed to a new wrapper
    Wrap {
        class: String,
        is_const: bool,
        resolution: Resolution,
    },
}

/// Everything needed to render or interpret the wrapper of one class
#[derive(Debug)]
pub struct ClassBinding<'c> {
    pub descriptor: &'c ClassDescriptor,

    /// Name of the wrapper class on the Python side
    pub python_name: String,

    pub constructors: ConstructorDispatch,
    pub properties: Vec<AccessorPair<'c>>,
    pub methods: Vec<OverloadSet<'c>>,
}

impl<'c> ClassBinding<'c> {
    /// Native class name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn property(&self, name: &str) -> Option<&AccessorPair<'c>> {
        self.properties.iter().find(|pair| pair.property == name)
    }

    pub fn method(&self, name: &str) -> Option<&OverloadSet<'c>> {
        self.methods.iter().find(|set| set.name == name)
    }

    /// Can the managed side allocate instances (as opposed to only adopting them)?
    pub fn is_constructible(&self) -> bool {
        !self.constructors.is_empty()
    }
}

/// Bind one class of a descriptor set
///
/// Diagnostics about the class are added to `diagnostics` even when binding fails.
pub fn bind_class<'c>(
    set: &DescriptorSet<'_>,
    class: &'c ClassDescriptor,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Result<ClassBinding<'c>, Error> {
    bind_class_in(set, set, class, settings, diagnostics)
}

/// Bind one class, resolving type names in a narrower scope than the whole set
///
/// This is how classes get bound when some other classes of the set could not be: members
/// mentioning a class missing from `scope` are skipped.
pub fn bind_class_in<'c>(
    set: &DescriptorSet<'_>,
    scope: &dyn TypeScope,
    class: &'c ClassDescriptor,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Result<ClassBinding<'c>, Error> {
    let mut found = Diagnostics::new();
    let result = bind_class_inner(set, scope, class, settings, &mut found);
    let mut unresolved: Vec<String> = vec![];
    for member in found
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ReviewOwnership)
        .filter_map(|d| d.member.as_ref())
    {
        if !unresolved.contains(member) {
            unresolved.push(member.clone());
        }
    }
    diagnostics.extend(found);

    let binding = result?;
    if settings.strict_ownership && !unresolved.is_empty() {
        return Err(Error::UnresolvedOwnership {
            class: class.name.clone(),
            members: unresolved,
        });
    }
    Ok(binding)
}

fn bind_class_inner<'c>(
    set: &DescriptorSet<'_>,
    scope: &dyn TypeScope,
    class: &'c ClassDescriptor,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Result<ClassBinding<'c>, Error> {
    log::debug!("Binding class '{}'", class.name);
    set.check_class(class)
        .map_err(|reason| Error::MalformedDescriptor {
            class: class.name.clone(),
            reason,
        })?;

    let resolver = OwnershipResolver::new();
    let constructors = synthesize_constructors(class, scope, settings, diagnostics)?;
    let properties = synthesize_properties(class, scope, settings, &resolver, diagnostics);
    let forwarder = Forwarder {
        owner: Some(class.name.as_str()),
        scope,
        settings,
        resolver: &resolver,
    };
    let methods = forwarder.forward(&class.methods, diagnostics);

    let mut binding = ClassBinding {
        descriptor: class,
        python_name: settings.renamer.rename_class(&class.name),
        constructors,
        properties,
        methods,
    };
    let mut taken = check_exposed_names(&binding, settings).map_err(|reason| {
        Error::MalformedDescriptor {
            class: class.name.clone(),
            reason,
        }
    })?;

    let ClassBinding {
        constructors,
        properties,
        methods,
        ..
    } = &mut binding;
    let helpers = constructors
        .paths
        .iter_mut()
        .map(|path| &mut path.helper)
        .chain(
            properties
                .iter_mut()
                .filter_map(|pair| pair.setter.as_mut())
                .map(|setter| &mut setter.helper),
        )
        .chain(
            methods
                .iter_mut()
                .flat_map(|set| set.stubs.iter_mut())
                .map(|stub| &mut stub.helper),
        );
    assign_helper_names(&mut taken, helpers);
    Ok(binding)
}

/// Exposed members must not collide with each other, or with what the wrapper itself defines
///
/// Returns every name the class now uses.
fn check_exposed_names(
    binding: &ClassBinding<'_>,
    settings: &Settings,
) -> Result<HashSet<String>, String> {
    if settings.reserved_globals().contains(&binding.python_name.as_str()) {
        return Err(format!(
            "Wrapper name '{}' clashes with a module level name",
            binding.python_name
        ));
    }

    let mut taken: HashSet<String> = settings
        .reserved_members()
        .iter()
        .map(|name| (*name).to_owned())
        .collect();
    let names = binding
        .properties
        .iter()
        .map(|pair| pair.property.as_str())
        .chain(binding.methods.iter().map(|set| set.name.as_str()));
    for name in names {
        if settings.reserved_members().contains(&name) {
            return Err(format!(
                "Exposed member '{}' clashes with a generated member",
                name
            ));
        }
        if !taken.insert(name.to_owned()) {
            return Err(format!("Member name '{}' is exposed twice", name));
        }
    }
    Ok(taken)
}

/// Rename helpers until no two share a name, and none shadows anything in `taken`
///
/// Helpers are visited in a fixed order, so renaming is deterministic.
fn assign_helper_names<'h>(
    taken: &mut HashSet<String>,
    helpers: impl IntoIterator<Item = &'h mut String>,
) {
    for helper in helpers {
        while taken.contains(helper.as_str()) {
            helper.push('_');
        }
        taken.insert(helper.clone());
    }
}

/// Drop free functions that would shadow a module level name, then settle helper names
///
/// Functions share the module namespace with the wrapper classes and with the preamble.
pub fn place_functions<'f>(
    functions: Vec<OverloadSet<'f>>,
    classes: &[ClassBinding<'_>],
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Vec<OverloadSet<'f>> {
    let mut taken: HashSet<String> = settings
        .reserved_globals()
        .iter()
        .map(|name| (*name).to_owned())
        .chain(classes.iter().map(|binding| binding.python_name.clone()))
        .collect();

    let mut placed = vec![];
    for set in functions {
        if taken.contains(&set.name) {
            for stub in &set.stubs {
                diagnostics.push(
                    DiagnosticKind::SkippedMember,
                    None,
                    Some(stub.descriptor.name.as_str()),
                    format!("'{}' clashes with a module level name", set.name),
                );
            }
            continue;
        }
        taken.insert(set.name.clone());
        placed.push(set);
    }

    let helpers = placed
        .iter_mut()
        .flat_map(|set| set.stubs.iter_mut())
        .map(|stub| &mut stub.helper);
    assign_helper_names(&mut taken, helpers);
    placed
}

/// Bind the free functions of a descriptor set
pub fn bind_functions<'f>(
    functions: impl IntoIterator<Item = &'f FunctionDescriptor>,
    scope: &dyn TypeScope,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Vec<OverloadSet<'f>> {
    let resolver = OwnershipResolver::new();
    let forwarder = Forwarder {
        owner: None,
        scope,
        settings,
        resolver: &resolver,
    };
    forwarder.forward(functions, diagnostics)
}

/// Locals that generated helpers already use
const HELPER_LOCALS: [&str; 5] = ["self", "args", "kwargs", "result", "deref"];

/// Map the parameters of a callable, naming them so they are valid locals
pub(crate) fn plan_params(
    params: &[Parameter],
    scope: &dyn TypeScope,
    settings: &Settings,
) -> Result<Vec<ParamPlan>, BadType> {
    let mut plans: Vec<ParamPlan> = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let native = NativeType::parse(&param.type_name, scope)?;
        let shape = Shape::of(&native)
            .ok_or_else(|| BadType::Unsupported(param.type_name.clone()))?;

        let mut name = if param.name.is_empty() {
            format!("arg{}", i)
        } else {
            settings.renamer.rename_parameter(&param.name)
        };
        while HELPER_LOCALS.contains(&name.as_str())
            || name == settings.native_alias
            || scope.is_class(&name)
            || plans.iter().any(|plan| plan.name == name)
        {
            name.push('_');
        }

        plans.push(ParamPlan {
            name,
            native,
            shape,
        });
    }
    Ok(plans)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{
        DescriptorArenas, FieldAccess, FieldDescriptor, MethodDescriptor, ReturnOwnership,
    };

    fn point() -> ClassDescriptor {
        ClassDescriptor::new("Point")
            .with_header("point.hpp")
            .constructor(vec![])
            .constructor(vec![Parameter::new("x", "int"), Parameter::new("y", "int")])
            .field(FieldDescriptor::new("x", "int", FieldAccess::all()))
            .field(FieldDescriptor::new("y", "int", FieldAccess::all()))
            .method(
                MethodDescriptor::new("clone", vec![], "Point")
                    .with_ownership(ReturnOwnership::Transferred),
            )
            .method(
                MethodDescriptor::new("peek", vec![], "Point")
                    .with_ownership(ReturnOwnership::Borrowed),
            )
            .method(MethodDescriptor::new("origin", vec![], "Point *"))
    }

    #[test]
    fn bind_point() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(point());
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let binding = bind_class(&set, class, &settings, &mut diagnostics).unwrap();
        assert_eq!(binding.python_name, "Point");
        assert!(binding.is_constructible());
        assert_eq!(binding.constructors.paths.len(), 2);
        assert!(binding.property("x").is_some());
        assert!(binding.method("clone").is_some());
        assert!(binding.method("peek").is_some());

        // Only the unannotated pointer return needs a second look
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.any_for(DiagnosticKind::ReviewOwnership, "Point"));
    }

    #[test]
    fn strict_ownership() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(point());
        let mut settings = Settings::new("geometry").unwrap();
        settings.strict_ownership = true;
        let mut diagnostics = Diagnostics::new();

        match bind_class(&set, class, &settings, &mut diagnostics) {
            Err(Error::UnresolvedOwnership { class, members }) => {
                assert_eq!(class, "Point");
                assert_eq!(members, vec![String::from("origin")]);
            }
            other => panic!("expected an ownership error, got {:?}", other),
        }
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn name_clashes() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let clash = set.add_class(
            ClassDescriptor::new("Counter")
                .default_constructible()
                .field(FieldDescriptor::new("count", "int", FieldAccess::all()))
                .method(MethodDescriptor::new("count", vec![], "int")),
        );
        assert!(matches!(
            bind_class(&set, clash, &settings, &mut diagnostics),
            Err(Error::MalformedDescriptor { .. })
        ));

        let reserved = set.add_class(
            ClassDescriptor::new("Node")
                .default_constructible()
                .field(FieldDescriptor::new("owner", "int", FieldAccess::all())),
        );
        assert!(matches!(
            bind_class(&set, reserved, &settings, &mut diagnostics),
            Err(Error::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn helper_names_are_unique() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let settings = Settings::new("engines").unwrap();
        let mut diagnostics = Diagnostics::new();

        let class = set.add_class(
            ClassDescriptor::new("Engine")
                .constructor(vec![])
                .field(FieldDescriptor::new("_x", "int", FieldAccess::all()))
                .field(FieldDescriptor::new("x", "int", FieldAccess::all()))
                .method(MethodDescriptor::new("init", vec![], "void"))
                .method(MethodDescriptor::new("_reset", vec![], "void"))
                .method(MethodDescriptor::new("reset", vec![], "void")),
        );
        let binding = bind_class(&set, class, &settings, &mut diagnostics).unwrap();

        let helpers: Vec<&str> = binding
            .constructors
            .paths
            .iter()
            .map(|path| path.helper.as_str())
            .chain(
                binding
                    .properties
                    .iter()
                    .filter_map(|pair| pair.setter.as_ref())
                    .map(|setter| setter.helper.as_str()),
            )
            .chain(
                binding
                    .methods
                    .iter()
                    .flat_map(|set| set.stubs.iter())
                    .map(|stub| stub.helper.as_str()),
            )
            .collect();
        assert_eq!(
            helpers,
            vec!["_init_0", "_set_x", "_set_x_", "_init_0_", "_reset_0", "_reset_0_"]
        );
    }

    #[test]
    fn module_names() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(point());
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();
        let binding = bind_class(&set, class, &settings, &mut diagnostics).unwrap();

        let functions = vec![
            MethodDescriptor::new("Point", vec![], "void"),
            MethodDescriptor::new("deref", vec![], "void"),
            MethodDescriptor::new("_distance", vec![], "double"),
            MethodDescriptor::new("distance", vec![], "double"),
        ];
        let mut diagnostics = Diagnostics::new();
        let mut keep_names = Settings::new("geometry").unwrap();
        keep_names.renamer = Box::new(crate::generate::PythonRenamer::keeping_case());
        let bound = bind_functions(&functions, &set, &keep_names, &mut diagnostics);
        let classes = [binding];
        let placed = place_functions(bound, &classes, &keep_names, &mut diagnostics);

        let names: Vec<&str> = placed.iter().map(|set| set.name.as_str()).collect();
        assert_eq!(names, vec!["_distance", "distance"]);
        assert_eq!(placed[0].stubs[0].helper, "_distance_0");
        assert_eq!(placed[1].stubs[0].helper, "_distance_0_");
        assert_eq!(
            diagnostics
                .iter()
                .filter(|d| d.kind == DiagnosticKind::SkippedMember)
                .count(),
            2
        );

        let clash =
            set.add_class(ClassDescriptor::new("NullReferenceError").default_constructible());
        assert!(matches!(
            bind_class(&set, clash, &settings, &mut diagnostics),
            Err(Error::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn parameter_names() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        set.add_class(ClassDescriptor::new("Point").default_constructible());
        let settings = Settings::new("geometry").unwrap();

        let params = vec![
            Parameter::new("", "int"),
            Parameter::new("lambda", "double"),
            Parameter::new("result", "int"),
            Parameter::new("Point", "const Point &"),
        ];
        let plans = plan_params(&params, &set, &settings).unwrap();
        let names: Vec<&str> = plans.iter().map(|plan| plan.name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "lambda_", "result_", "point"]);
        assert_eq!(plans[3].shape.to_string(), "Point");
    }
}
