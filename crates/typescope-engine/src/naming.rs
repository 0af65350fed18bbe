//! Human-readable names for types and members
//!
//! | Input                         | Rendered                    |
//! |-------------------------------|-----------------------------|
//! | primitive `int32`             | `int`                       |
//! | `Demo.Person`                 | `Demo.Person`               |
//! | `Box` with arguments `int`    | `Box<int>`                  |
//! | method `Greet(string, int)`   | `Demo.Person.Greet(string, int)` |

use typescope_runtime::TypeHandle;

use crate::descriptor::MemberDescriptor;

/// Display name of a type, generic arguments included
pub fn type_name(ty: &TypeHandle) -> String {
    let base = ty.full_name();
    if !ty.is_generic() {
        return base;
    }
    let arguments: Vec<String> = ty.generic_arguments().iter().map(type_name).collect();
    format!("{}<{}>", base, arguments.join(", "))
}

/// Comma-separated list of type names
pub fn type_list(types: &[TypeHandle]) -> String {
    types.iter().map(type_name).collect::<Vec<_>>().join(", ")
}

/// Display name of a member, qualified by its declaring type
pub fn member_name(member: &MemberDescriptor) -> String {
    let owner = type_name(member.declaring_type());
    match member {
        MemberDescriptor::Method(m) => {
            let generics = if m.generic_arity() > 0 {
                format!("<{}>", m.def().generic_parameters.join(", "))
            } else {
                String::new()
            };
            format!(
                "{}.{}{}({})",
                owner,
                m.name(),
                generics,
                type_list(&m.parameter_types())
            )
        }
        MemberDescriptor::Constructor(c) => {
            format!("{}.{}({})", owner, c.name(), type_list(&c.parameter_types()))
        }
        MemberDescriptor::Property(p) if p.is_indexer() => {
            format!(
                "{}.{}[{}]",
                owner,
                p.name(),
                type_list(&p.index_parameter_types())
            )
        }
        other => format!("{}.{}", owner, other.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typescope_runtime::{types, ClassBuilder};

    #[test]
    fn test_primitive_names() {
        assert_eq!(type_name(&types::int32()), "int");
        assert_eq!(type_name(&types::string()), "string");
        assert_eq!(type_name(&types::float64()), "double");
    }

    #[test]
    fn test_generic_names() {
        let mut builder = ClassBuilder::class("Pair");
        builder.set_namespace("Demo");
        builder.add_generic_argument(types::int32());
        builder.add_generic_argument(types::string());
        let pair = builder.build().unwrap();
        assert_eq!(type_name(&pair), "Demo.Pair<int, string>");
    }
}
