//! Shared utilities for Meridian procedural macro crates.
//!
//! Generated code has to name items from the runtime crates with fully
//! qualified paths. Consumers may depend on a single crate, rename it in their
//! `Cargo.toml`, or only pull in the `meridian` umbrella; [`resolve_crate_path`]
//! picks the path that works in each case.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// A Meridian crate that macro-generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeridianCrate {
    /// `meridian_resource`
    Resource,
}

impl MeridianCrate {
    /// Returns the `Cargo.toml` package name for this crate.
    fn package(self) -> &'static str {
        match self {
            Self::Resource => "meridian_resource",
        }
    }
}

/// Returns a [`TokenStream`] path for the given Meridian crate.
///
/// Resolution order:
/// 1. The crate itself or a direct (possibly renamed) dependency.
/// 2. Access through the `meridian` umbrella crate (`meridian::<name>`),
///    including from the umbrella crate's own doctests.
/// 3. The literal package name, so the compiler reports the missing
///    dependency at the call site.
pub fn resolve_crate_path(krate: MeridianCrate) -> TokenStream {
    let name = krate.package();

    match crate_name(name) {
        Ok(FoundCrate::Itself) => {
            let ident = format_ident!("{}", name);
            quote!(#ident)
        }
        Ok(FoundCrate::Name(found)) => {
            let ident = format_ident!("{}", found);
            quote!(#ident)
        }
        Err(_) => match crate_name("meridian") {
            Ok(FoundCrate::Name(found)) => {
                let umbrella = format_ident!("{}", found);
                let ident = format_ident!("{}", name);
                quote!(#umbrella::#ident)
            }
            // doctests and integration tests of the umbrella crate
            Ok(FoundCrate::Itself) => {
                let ident = format_ident!("{}", name);
                quote!(::meridian::#ident)
            }
            _ => {
                let ident = format_ident!("{}", name);
                quote!(#ident)
            }
        },
    }
}

/// Converts a `snake_case` or lowercase identifier into `PascalCase`.
///
/// A leading raw-identifier prefix (`r#`) is dropped.
#[must_use]
pub fn to_pascal_case(ident: &str) -> String {
    unraw(ident)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Strips the raw-identifier prefix from an identifier's textual form.
#[must_use]
pub fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_from_snake_case() {
        assert_eq!(to_pascal_case("status"), "Status");
        assert_eq!(to_pascal_case("intl_string"), "IntlString");
        assert_eq!(to_pascal_case("__x__y"), "XY");
    }

    #[test]
    fn pascal_case_strips_raw_prefix() {
        assert_eq!(to_pascal_case("r#const"), "Const");
        assert_eq!(unraw("r#type"), "type");
        assert_eq!(unraw("class"), "class");
    }

    #[test]
    fn package_names() {
        assert_eq!(MeridianCrate::Resource.package(), "meridian_resource");
    }
}
