use super::{check_identifier, is_operator, ClassDescriptor, Parameter};
use std::collections::HashSet;

/// Sanity check a single class descriptor
///
/// This only catches problems visible from the descriptor itself. Type spellings are checked
/// later, when they are mapped (and an unmappable type only disqualifies its member).
pub fn check_class(class: &ClassDescriptor) -> Result<(), String> {
    check_identifier(&class.name).map_err(|msg| format!("Bad class name: {}", msg))?;

    let mut field_names = HashSet::new();
    for field in &class.fields {
        check_identifier(&field.name).map_err(|msg| format!("Bad field name: {}", msg))?;
        if !field_names.insert(field.name.as_str()) {
            return Err(format!("Field '{}' is declared twice", field.name));
        }
        if field.type_name.trim() == "void" {
            return Err(format!("Field '{}' has type void", field.name));
        }
        if field.access.is_empty() {
            return Err(format!("Field '{}' can be neither read nor written", field.name));
        }
    }

    for (i, constructor) in class.constructors.iter().enumerate() {
        check_parameters(&constructor.params)
            .map_err(|msg| format!("Constructor #{}: {}", i, msg))?;
    }

    for method in &class.methods {
        if !is_operator(&method.name) {
            check_identifier(&method.name).map_err(|msg| format!("Bad method name: {}", msg))?;
        }
        if let Some(group) = &method.overload_group {
            check_identifier(group).map_err(|msg| format!("Bad overload group: {}", msg))?;
        }
        check_parameters(&method.params)
            .map_err(|msg| format!("Method '{}': {}", method.name, msg))?;
    }

    Ok(())
}

/// Parameter names must be distinct (unnamed parameters are fine, they get positional names)
pub fn check_parameters(params: &[Parameter]) -> Result<(), String> {
    let mut names = HashSet::new();
    for param in params {
        if param.type_name.trim() == "void" {
            return Err(String::from("Parameter has type void"));
        }
        if param.name.is_empty() {
            continue;
        }
        check_identifier(&param.name)?;
        if !names.insert(param.name.as_str()) {
            return Err(format!("Parameter '{}' is declared twice", param.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{FieldAccess, FieldDescriptor, MethodDescriptor};

    #[test]
    fn well_formed_class() {
        let class = ClassDescriptor::new("Point")
            .constructor(vec![Parameter::new("x", "int"), Parameter::new("y", "int")])
            .field(FieldDescriptor::new("x", "int", FieldAccess::all()))
            .method(MethodDescriptor::new("operator+", vec![Parameter::new("", "Point")], "Point"));
        assert_eq!(check_class(&class), Ok(()));
    }

    #[test]
    fn duplicate_field() {
        let class = ClassDescriptor::new("Point")
            .field(FieldDescriptor::new("x", "int", FieldAccess::all()))
            .field(FieldDescriptor::new("x", "double", FieldAccess::READ));
        assert!(check_class(&class).is_err());
    }

    #[test]
    fn duplicate_parameter() {
        let class = ClassDescriptor::new("Point")
            .constructor(vec![Parameter::new("x", "int"), Parameter::new("x", "int")]);
        assert!(check_class(&class).is_err());
    }

    #[test]
    fn void_field() {
        let class =
            ClassDescriptor::new("Point").field(FieldDescriptor::new("x", "void", FieldAccess::all()));
        assert!(check_class(&class).is_err());
    }

    #[test]
    fn bad_class_name() {
        assert!(check_class(&ClassDescriptor::new("geo::Point")).is_err());
    }
}
