//! Canonical textual signatures.
//!
//! Layouts:
//!
//! | Member | Layout |
//! |--------|--------|
//! | method | `Class::name( type $a, $b ): Return` |
//! | property | `visibility type $name = default` |
//! | constant | `const NAME = value` |
//!
//! The argument list is always wrapped in `( ` and ` )`, so a method with no
//! arguments renders as `Class::name(  )`. Optional parts (argument type,
//! return clause, property default) are dropped when empty.

use crate::model::{Argument, Visibility};

/// Render a method signature for the class named `class_short_name`.
pub fn method_signature(
    class_short_name: &str,
    method_name: &str,
    arguments: &[Argument],
    return_type: &str,
) -> String {
    let arguments = arguments
        .iter()
        .map(|arg| {
            if arg.type_name.is_empty() {
                arg.name.clone()
            } else {
                format!("{} {}", arg.type_name, arg.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut signature = format!("{}::{}( {} )", class_short_name, method_name, arguments);
    if !return_type.is_empty() {
        signature.push_str(": ");
        signature.push_str(return_type);
    }
    signature
}

/// Render a property signature.
pub fn property_signature(
    visibility: Visibility,
    type_name: &str,
    name: &str,
    default: &str,
) -> String {
    let mut signature = format!("{} {} {}", visibility, type_name, name);
    if !default.is_empty() {
        signature.push_str(" = ");
        signature.push_str(default);
    }
    signature
}

/// Render a constant signature.
pub fn constant_signature(name: &str, value: &str) -> String {
    format!("const {} = {}", name, value)
}
