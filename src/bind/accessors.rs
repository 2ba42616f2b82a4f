use super::signature::{first_match, Candidate, Shape, Signature};
use super::{plan_params, ParamPlan, ReturnPlan};
use crate::descriptor::{ClassDescriptor, FieldDescriptor, Indirection, NativeType, TypeScope};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::generate::{Error, Settings};
use crate::ownership::{AdoptionSource, Construction, OwnershipResolver};
use crate::runtime::Value;

/// One way of allocating a fresh native object from the managed side
#[derive(Debug)]
pub struct ConstructionPath {
    /// Position among the class's declared constructors
    pub index: usize,

    /// Name of the typed helper doing the allocation
    pub helper: String,

    pub params: Vec<ParamPlan>,
    pub signature: Signature,

    /// Is this the default constructor of a class that declares none?
    pub implicit: bool,
}

impl Candidate for ConstructionPath {
    fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Managed constructor of a wrapper: dispatch over construction paths by argument shape
#[derive(Debug, Default)]
pub struct ConstructorDispatch {
    pub paths: Vec<ConstructionPath>,
}

impl ConstructorDispatch {
    /// Construction path selected by the arguments, if any
    pub fn resolve<P>(&self, args: &[Value<P>]) -> Option<&ConstructionPath> {
        first_match(&self.paths, args)
    }

    /// Classes with no construction path can only be adopted
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Typed helper assigning a field
#[derive(Debug)]
pub struct SetterPlan {
    pub helper: String,
    pub param: ParamPlan,
}

/// Property exposing one native field
#[derive(Debug)]
pub struct AccessorPair<'c> {
    /// Exposed property name
    pub property: String,

    pub field: &'c FieldDescriptor,
    pub native: NativeType,

    /// How a read gets handed to the caller (missing for write-only fields)
    pub getter: Option<ReturnPlan>,

    /// Missing for read-only fields
    pub setter: Option<SetterPlan>,
}

impl<'c> AccessorPair<'c> {
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

/// Build the constructor dispatch of a class
///
/// Constructors with an unmappable parameter are dropped. When nothing is left (or nothing was
/// there to begin with) the wrapper is adopt-only, which is reported but not fatal. Two
/// constructors no caller could choose between are fatal. A constructor that an earlier, wider one
/// always takes precedence over (`(double)` before `(int)`) is kept but reported as shadowed.
pub fn synthesize_constructors(
    class: &ClassDescriptor,
    scope: &dyn TypeScope,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> Result<ConstructorDispatch, Error> {
    let declared = match class.construction_paths() {
        Ok(declared) => declared,
        Err(reason) => {
            diagnostics.push(
                DiagnosticKind::NoConstructionPath,
                Some(class.name.as_str()),
                None,
                reason,
            );
            return Ok(ConstructorDispatch::default());
        }
    };
    let implicit = class.constructors.is_empty();

    let mut paths: Vec<ConstructionPath> = vec![];
    for (index, constructor) in declared.iter().enumerate() {
        let params = match plan_params(&constructor.params, scope, settings) {
            Ok(params) => params,
            Err(bad) => {
                diagnostics.push(
                    DiagnosticKind::SkippedMember,
                    Some(class.name.as_str()),
                    Some(format!("constructor #{}", index).as_str()),
                    format!("cannot map parameter: {}", bad),
                );
                continue;
            }
        };
        let signature = Signature(params.iter().map(|param| param.shape.clone()).collect());

        if let Some(earlier) = paths
            .iter()
            .find(|path| path.signature.indistinguishable(&signature))
        {
            return Err(Error::AmbiguousConstructor {
                class: class.name.clone(),
                first: earlier.index,
                second: index,
                signature: signature.to_string(),
            });
        }
        if let Some(earlier) = paths.iter().find(|path| path.signature.covers(&signature)) {
            diagnostics.push(
                DiagnosticKind::ShadowedOverload,
                Some(class.name.as_str()),
                Some(format!("constructor #{}", index).as_str()),
                format!(
                    "constructor {} is never selected, constructor #{} {} comes first",
                    signature, earlier.index, earlier.signature
                ),
            );
        }

        paths.push(ConstructionPath {
            index,
            helper: format!("_init_{}", index),
            params,
            signature,
            implicit,
        });
    }

    if paths.is_empty() {
        diagnostics.push(
            DiagnosticKind::NoConstructionPath,
            Some(class.name.as_str()),
            None,
            "no constructor has parameters that can be mapped",
        );
    }
    log::trace!(
        "Class '{}' has {} construction path(s)",
        class.name,
        paths.len()
    );
    Ok(ConstructorDispatch { paths })
}

/// Build a property for every field whose type can be mapped
pub fn synthesize_properties<'c>(
    class: &'c ClassDescriptor,
    scope: &dyn TypeScope,
    settings: &Settings,
    resolver: &OwnershipResolver,
    diagnostics: &mut Diagnostics,
) -> Vec<AccessorPair<'c>> {
    let mut properties = vec![];
    for field in &class.fields {
        let native = match NativeType::parse(&field.type_name, scope) {
            Ok(NativeType::Void) => {
                diagnostics.push(
                    DiagnosticKind::SkippedMember,
                    Some(class.name.as_str()),
                    Some(field.name.as_str()),
                    "field type resolves to void",
                );
                continue;
            }
            Ok(native) => native,
            Err(bad) => {
                diagnostics.push(
                    DiagnosticKind::SkippedMember,
                    Some(class.name.as_str()),
                    Some(field.name.as_str()),
                    format!("cannot map field type: {}", bad),
                );
                continue;
            }
        };

        let getter = if field.is_readable() {
            let plan = match &native {
                NativeType::Class {
                    name,
                    indirection,
                    is_const,
                } => {
                    let read = Construction::Adoption {
                        source: AdoptionSource::FieldRead,
                        class: Some(class.name.as_str()),
                        member: &field.name,
                        indirection: *indirection,
                        annotation: None,
                    };
                    ReturnPlan::Wrap {
                        class: name.clone(),
                        is_const: *is_const,
                        resolution: resolver.resolve(&read, diagnostics),
                    }
                }
                builtin => ReturnPlan::Value(builtin.clone()),
            };
            Some(plan)
        } else {
            None
        };

        let property = settings.renamer.rename_property(&field.name);
        let assignable = match &native {
            NativeType::Class { is_const: true, .. } => false,
            NativeType::Class {
                indirection: Indirection::Pointer,
                ..
            } if field.is_writable() => {
                // The wrapper assigned would not be kept alive by the receiver
                diagnostics.push(
                    DiagnosticKind::ReviewOwnership,
                    Some(class.name.as_str()),
                    Some(field.name.as_str()),
                    "pointer field is exposed read-only, nothing would keep the assigned object alive",
                );
                false
            }
            _ => true,
        };
        let setter = match Shape::of(&native) {
            Some(shape) if field.is_writable() && assignable => Some(SetterPlan {
                helper: format!("_set_{}", property.trim_start_matches('_')),
                param: ParamPlan {
                    name: String::from("value"),
                    native: native.clone(),
                    shape,
                },
            }),
            _ => None,
        };

        properties.push(AccessorPair {
            property,
            field,
            native,
            getter,
            setter,
        });
    }
    properties
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{
        DescriptorArenas, DescriptorSet, FieldAccess, FieldDescriptor, Parameter,
    };
    use crate::ownership::Ownership;

    fn point() -> ClassDescriptor {
        ClassDescriptor::new("Point")
            .constructor(vec![])
            .constructor(vec![Parameter::new("x", "int"), Parameter::new("y", "int")])
            .field(FieldDescriptor::new("x", "int", FieldAccess::all()))
            .field(FieldDescriptor::new("id", "long", FieldAccess::READ))
    }

    #[test]
    fn constructors_in_declaration_order() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(point());
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let dispatch = synthesize_constructors(class, &set, &settings, &mut diagnostics).unwrap();
        assert_eq!(dispatch.paths.len(), 2);
        assert_eq!(dispatch.paths[1].helper, "_init_1");
        assert_eq!(dispatch.resolve::<u32>(&[]).unwrap().index, 0);
        let args = [Value::<u32>::Int(3), Value::Int(4)];
        assert_eq!(dispatch.resolve(&args).unwrap().index, 1);
        assert!(dispatch.resolve(&[Value::<u32>::Int(3)]).is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn ambiguous_constructors() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(
            ClassDescriptor::new("Id")
                .constructor(vec![Parameter::new("value", "int")])
                .constructor(vec![Parameter::new("value", "long")]),
        );
        let settings = Settings::new("ids").unwrap();
        let mut diagnostics = Diagnostics::new();

        match synthesize_constructors(class, &set, &settings, &mut diagnostics) {
            Err(Error::AmbiguousConstructor {
                first,
                second,
                signature,
                ..
            }) => {
                assert_eq!((first, second), (0, 1));
                assert_eq!(signature, "(int)");
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn shadowed_constructors() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(
            ClassDescriptor::new("Scalar")
                .constructor(vec![Parameter::new("value", "double")])
                .constructor(vec![Parameter::new("value", "int")]),
        );
        let settings = Settings::new("scalars").unwrap();
        let mut diagnostics = Diagnostics::new();

        let dispatch = synthesize_constructors(class, &set, &settings, &mut diagnostics).unwrap();
        assert_eq!(dispatch.paths.len(), 2);
        assert_eq!(dispatch.resolve(&[Value::<u32>::Int(1)]).unwrap().index, 0);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.any_for(DiagnosticKind::ShadowedOverload, "Scalar"));
    }

    #[test]
    fn adopt_only_class() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(ClassDescriptor::new("Handle"));
        let settings = Settings::new("handles").unwrap();
        let mut diagnostics = Diagnostics::new();

        let dispatch = synthesize_constructors(class, &set, &settings, &mut diagnostics).unwrap();
        assert!(dispatch.is_empty());
        assert!(diagnostics.any_for(DiagnosticKind::NoConstructionPath, "Handle"));
    }

    #[test]
    fn properties() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        set.add_class(point());
        let segment = set.add_class(
            ClassDescriptor::new("Segment")
                .default_constructible()
                .field(FieldDescriptor::new("start", "Point", FieldAccess::all()))
                .field(FieldDescriptor::new("labels", "std::vector<int>", FieldAccess::all())),
        );
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let properties = synthesize_properties(
            segment,
            &set,
            &settings,
            &OwnershipResolver::new(),
            &mut diagnostics,
        );
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].property, "start");
        match &properties[0].getter {
            Some(ReturnPlan::Wrap {
                class, resolution, ..
            }) => {
                assert_eq!(class, "Point");
                assert_eq!(resolution.ownership, Ownership::NonOwning);
            }
            other => panic!("unexpected getter {:?}", other),
        }
        assert!(diagnostics.any_for(DiagnosticKind::SkippedMember, "Segment"));
    }

    #[test]
    fn read_only_fields() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        let class = set.add_class(point());
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let properties = synthesize_properties(
            class,
            &set,
            &settings,
            &OwnershipResolver::new(),
            &mut diagnostics,
        );
        assert!(!properties[0].is_read_only());
        assert!(properties[1].is_read_only());
        assert!(properties[1].getter.is_some());
        assert_eq!(properties[0].setter.as_ref().unwrap().helper, "_set_x");
    }

    #[test]
    fn pointer_fields_are_read_only() {
        let arenas = DescriptorArenas::new();
        let set = DescriptorSet::new(&arenas);
        set.add_class(point());
        let node = set.add_class(
            ClassDescriptor::new("Node")
                .default_constructible()
                .field(FieldDescriptor::new("target", "Point *", FieldAccess::all()))
                .field(FieldDescriptor::new("anchor", "const Point", FieldAccess::all()))
                .field(FieldDescriptor::new("start", "Point", FieldAccess::all())),
        );
        let settings = Settings::new("geometry").unwrap();
        let mut diagnostics = Diagnostics::new();

        let properties = synthesize_properties(
            node,
            &set,
            &settings,
            &OwnershipResolver::new(),
            &mut diagnostics,
        );
        assert!(properties[0].is_read_only());
        assert!(properties[0].getter.is_some());
        assert!(properties[1].is_read_only());
        assert!(!properties[2].is_read_only());
        assert!(diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ReviewOwnership
                && d.member.as_deref() == Some("target")
                && d.message.contains("read-only")));
    }
}
