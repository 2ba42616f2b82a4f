/// Check if a string is usable as an identifier on both sides of the boundary
///
/// Operator methods (eg. `operator+`) are the one exception: they are allowed as native method
/// names and get renamed through the operator table before they reach Python.
pub fn check_identifier(name: impl AsRef<str>) -> Result<(), String> {
    let name = name.as_ref();
    let mut chars = name.chars();
    match chars.next() {
        None => Err(String::from("Identifier is empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            Err(format!("Identifier '{}' does not start with a letter", name))
        }
        Some(_) if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => Ok(()),
        Some(_) => Err(format!(
            "Identifier '{}' contains an illegal character",
            name
        )),
    }
}

/// Is this the name of a C++ operator overload?
pub fn is_operator(name: &str) -> bool {
    match name.strip_prefix("operator") {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(false, |c| !(c.is_ascii_alphanumeric() || c == '_')),
        None => false,
    }
}

/// Convert `MyFunctionName` or `myFunctionName` into `my_function_name`
///
/// Runs of capitals are kept together, so `HTTPServer` becomes `http_server`.
pub fn from_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut converted = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().copied().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && prev != '_' {
                converted.push('_');
            }
        }
        converted.push(c.to_ascii_lowercase());
    }
    converted
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn camel_case() {
        assert_eq!(from_camel_case("MyFunctionName"), "my_function_name");
        assert_eq!(from_camel_case("myFunctionName"), "my_function_name");
        assert_eq!(from_camel_case("HTTPServer"), "http_server");
        assert_eq!(from_camel_case("already_snake"), "already_snake");
        assert_eq!(from_camel_case("x"), "x");
        assert_eq!(from_camel_case("vec3Length"), "vec3_length");
    }

    #[test]
    fn identifiers() {
        assert!(check_identifier("Point").is_ok());
        assert!(check_identifier("_private2").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("2d").is_err());
        assert!(check_identifier("geo::Point").is_err());
    }

    #[test]
    fn operators() {
        assert!(is_operator("operator+"));
        assert!(is_operator("operator()"));
        assert!(is_operator("operator=="));
        assert!(!is_operator("operator"));
        assert!(!is_operator("operatorName"));
    }
}
