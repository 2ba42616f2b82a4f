//! Cython fragments shared by every kind of generated callable

use super::writer::PyWriter;
use crate::bind::{ParamPlan, ReturnPlan, Shape, Signature};
use crate::descriptor::{Indirection, NativeType};
use crate::generate::Settings;
use crate::ownership::Ownership;
use std::io::{Result, Write};

/// Python name of the wrapper class for a native class
pub fn wrapper_class(settings: &Settings, native: &str) -> String {
    settings.renamer.rename_class(native)
}

/// Qualified name of a native class in the declarations module
pub fn native_class(settings: &Settings, native: &str) -> String {
    format!("{}.{}", settings.native_alias, native)
}

/// Expression checking that `expr` is an acceptable argument for `shape`
///
/// These mirror [`Shape::accepts`] exactly: `bool` is never taken for a number.
pub fn type_check(settings: &Settings, shape: &Shape, expr: &str) -> String {
    match shape {
        Shape::Bool => format!("isinstance({}, bool)", expr),
        Shape::Int => format!("(isinstance({0}, int) and not isinstance({0}, bool))", expr),
        Shape::Float => format!(
            "(isinstance({0}, (int, float)) and not isinstance({0}, bool))",
            expr
        ),
        Shape::Str => format!("isinstance({}, str)", expr),
        Shape::Object {
            class,
            nullable: false,
        } => format!("isinstance({}, {})", expr, wrapper_class(settings, class)),
        Shape::Object {
            class,
            nullable: true,
        } => format!(
            "({0} is None or isinstance({0}, {1}))",
            expr,
            wrapper_class(settings, class)
        ),
    }
}

/// Condition selecting an overload from the `args` tuple of a dispatcher
pub fn dispatch_condition(settings: &Settings, signature: &Signature) -> String {
    let mut condition = format!("len(args) == {}", signature.arity());
    for (i, shape) in signature.0.iter().enumerate() {
        condition.push_str(" and ");
        condition.push_str(&type_check(settings, shape, &format!("args[{}]", i)));
    }
    condition
}

/// Arguments of a call into a typed helper, taken from the `args` tuple
pub fn forwarded_args(arity: usize) -> String {
    (0..arity)
        .map(|i| format!("args[{}]", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declaration of a typed helper parameter
pub fn typed_param(settings: &Settings, param: &ParamPlan) -> String {
    match &param.native {
        NativeType::Primitive(primitive) => format!("{} {}", primitive.cython_name(), param.name),
        NativeType::String => format!("str {}", param.name),
        NativeType::Class { name, .. } => {
            format!("{} {}", wrapper_class(settings, name), param.name)
        }
        NativeType::Void => param.name.clone(),
    }
}

/// Comma separated typed parameters, with a leading `self` for methods
pub fn typed_params(settings: &Settings, params: &[ParamPlan], method: bool) -> String {
    let mut all: Vec<String> = vec![];
    if method {
        all.push(String::from("self"));
    }
    all.extend(params.iter().map(|param| typed_param(settings, param)));
    all.join(", ")
}

/// Guard wrappers passed as arguments against holding nothing
pub fn write_argument_checks<W: Write>(
    out: &mut PyWriter<W>,
    params: &[ParamPlan],
) -> Result<()> {
    for param in params {
        if let NativeType::Class { indirection, .. } = &param.native {
            if *indirection == Indirection::Pointer {
                out.block_header(format!("if {} is not None", param.name))?;
                writeln!(out, "{}.check_native()", param.name)?;
                out.close_block()?;
            } else {
                writeln!(out, "{}.check_native()", param.name)?;
            }
        }
    }
    Ok(())
}

/// Expression handing a helper parameter to the native side
pub fn native_arg(settings: &Settings, param: &ParamPlan) -> String {
    match &param.native {
        NativeType::String => format!("{}.encode('utf8')", param.name),
        NativeType::Class {
            indirection: Indirection::Pointer,
            ..
        } => format!(
            "(NULL if {0} is None else {0}.{1})",
            param.name, settings.pointer_attribute
        ),
        NativeType::Class { .. } => {
            format!("deref({}.{})", param.name, settings.pointer_attribute)
        }
        NativeType::Primitive(_) | NativeType::Void => param.name.clone(),
    }
}

pub fn native_args(settings: &Settings, params: &[ParamPlan]) -> String {
    params
        .iter()
        .map(|param| native_arg(settings, param))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Return the result of a native call the way the return plan says
///
/// `owner` is the expression non-owning results keep alive (`None` when there is nothing to
/// keep alive, as for free functions).
pub fn write_return<W: Write>(
    out: &mut PyWriter<W>,
    settings: &Settings,
    plan: &ReturnPlan,
    call: &str,
    owner: Option<&str>,
) -> Result<()> {
    let (class, resolution) = match plan {
        ReturnPlan::Void => return writeln!(out, "{}", call),
        ReturnPlan::Value(NativeType::String) => {
            return writeln!(out, "return {}.decode('utf8')", call)
        }
        ReturnPlan::Value(_) => return writeln!(out, "return {}", call),
        ReturnPlan::Wrap {
            class, resolution, ..
        } => (class, resolution),
    };

    let wrapper = wrapper_class(settings, class);
    let native = native_class(settings, class);
    let flag = resolution.ownership.as_flag();
    let owner = match (resolution.ownership, owner) {
        (Ownership::NonOwning, Some(owner)) => format!(", {}", owner),
        _ => String::new(),
    };

    match resolution.indirection {
        Indirection::Value => writeln!(
            out,
            "return {}.adopt(new {}({}), {}{})",
            wrapper, native, call, flag, owner
        ),
        Indirection::Reference => writeln!(
            out,
            "return {}.adopt(<{}*>&{}, {}{})",
            wrapper, native, call, flag, owner
        ),
        Indirection::Pointer => {
            writeln!(out, "cdef {0}* result = <{0}*>{1}", native, call)?;
            out.block_header("if result == NULL")?;
            writeln!(out, "return None")?;
            out.close_block()?;
            writeln!(out, "return {}.adopt(result, {}{})", wrapper, flag, owner)
        }
    }
}

/// Spelling of a return type in the declarations module
///
/// Borrowed by-value results are declared as references, which is what they really are.
pub fn declared_return(plan: &ReturnPlan) -> String {
    match plan {
        ReturnPlan::Void => String::from("void"),
        ReturnPlan::Value(native) => native.cpp_spelling(),
        ReturnPlan::Wrap {
            class,
            is_const,
            resolution,
        } => NativeType::Class {
            name: class.clone(),
            indirection: resolution.indirection,
            is_const: *is_const,
        }
        .cpp_spelling(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::Primitive;
    use crate::ownership::Resolution;

    fn render(plan: &ReturnPlan, owner: Option<&str>) -> String {
        let settings = Settings::new("geometry").unwrap();
        let mut output = vec![];
        let mut out = PyWriter::new(&mut output);
        write_return(&mut out, &settings, plan, "self.thisptr.peek()", owner).unwrap();
        out.close().unwrap();
        String::from_utf8(output).unwrap()
    }

    fn wrap(ownership: Ownership, indirection: Indirection) -> ReturnPlan {
        ReturnPlan::Wrap {
            class: String::from("Point"),
            is_const: false,
            resolution: Resolution {
                ownership,
                indirection,
            },
        }
    }

    #[test]
    fn checks() {
        let settings = Settings::new("geometry").unwrap();
        let signature = Signature(vec![
            Shape::Int,
            Shape::Object {
                class: String::from("Point"),
                nullable: true,
            },
        ]);
        assert_eq!(
            dispatch_condition(&settings, &signature),
            "len(args) == 2 and (isinstance(args[0], int) and not isinstance(args[0], bool)) \
             and (args[1] is None or isinstance(args[1], Point))"
        );
        assert_eq!(forwarded_args(2), "args[0], args[1]");
    }

    #[test]
    fn returns() {
        assert_eq!(
            render(&ReturnPlan::Value(NativeType::String), Some("self")),
            "return self.thisptr.peek().decode('utf8')\n"
        );
        assert_eq!(
            render(&wrap(Ownership::Owning, Indirection::Value), Some("self")),
            "return Point.adopt(new cpp.Point(self.thisptr.peek()), True)\n"
        );
        assert_eq!(
            render(&wrap(Ownership::NonOwning, Indirection::Reference), Some("self")),
            "return Point.adopt(<cpp.Point*>&self.thisptr.peek(), False, self)\n"
        );
        assert_eq!(
            render(&wrap(Ownership::NonOwning, Indirection::Pointer), None),
            "cdef cpp.Point* result = <cpp.Point*>self.thisptr.peek()\n\
             if result == NULL:\n    return None\n\
             return Point.adopt(result, False)\n"
        );
    }

    #[test]
    fn declarations() {
        assert_eq!(
            declared_return(&wrap(Ownership::NonOwning, Indirection::Reference)),
            "Point&"
        );
        assert_eq!(
            declared_return(&ReturnPlan::Value(NativeType::Primitive(Primitive::Double))),
            "double"
        );
    }
}
