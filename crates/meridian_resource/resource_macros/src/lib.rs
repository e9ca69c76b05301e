//! Procedural macros for the `meridian_resource` crate.
//!
//! Provides [`plugin!`](macro@plugin), which turns a declarative resource tree
//! into a typed plugin struct and the two-pass declaration that fills it.

use meridian_macro_utils::{MeridianCrate, resolve_crate_path, to_pascal_case, unraw};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Expr, Ident, LitStr, Token, Type, Visibility, braced, parse_macro_input};

/// Declares a plugin's resource tree.
///
/// # Usage
///
/// ```ignore
/// plugin! {
///     /// Resources of the demo plugin.
///     pub struct Demo = "demo" |p| {
///         status {
///             Err: StatusFactory<Text> = p.get::<StatusProvider>()?.status(ResultCode::Error),
///         }
///         class {
///             Doc: ResourceId<Class, DocClass> = Leaf::internal(DocClass::default()),
///         }
///     }
/// }
///
/// let demo = Demo::declare(&mut registry)?;
/// demo.status.Err.create(Text { text: "boom".into() });
/// ```
///
/// Each category block becomes a field of the plugin struct, and each entry a
/// field of that category's struct (`DemoStatus`, `DemoClass`). The entry
/// expression must evaluate to a `Leaf<T>` where `T` is the declared type.
/// The optional `|p|` binds the frozen `Providers` for use in the
/// expressions; `?` may be used inside them.
///
/// # Generated Code
///
/// ```ignore
/// pub struct Demo {
///     pub id: PluginId,
///     pub status: DemoStatus,
///     pub class: DemoClass,
/// }
///
/// impl Demo {
///     pub const NAME: &'static str = "demo";
///
///     pub fn declare(registry: &mut PluginRegistry) -> Result<Self, DeclareError> {
///         let mut __builder = registry.builder("demo")?;
///         // pass 1: every id is stamped before any leaf resolves
///         let __stamp_0 = __builder.stamp("status", "Err")?;
///         let __stamp_1 = __builder.stamp("class", "Doc")?;
///         // pass 2
///         let p = &*__builder.providers();
///         let status = DemoStatus { Err: __builder.resolve(&__stamp_0, /* expr */)? };
///         let class = DemoClass { Doc: __builder.resolve(&__stamp_1, /* expr */)? };
///         Ok(Self { id: __builder.finish()?, status, class })
///     }
/// }
/// ```
#[proc_macro]
pub fn plugin(input: TokenStream) -> TokenStream {
    let def = parse_macro_input!(input as PluginDef);
    match expand(&def) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

struct PluginDef {
    attrs: Vec<Attribute>,
    vis: Visibility,
    name: Ident,
    plugin_name: LitStr,
    providers: Option<Ident>,
    categories: Vec<CategoryDef>,
}

struct CategoryDef {
    attrs: Vec<Attribute>,
    ident: Ident,
    entries: Vec<EntryDef>,
}

struct EntryDef {
    attrs: Vec<Attribute>,
    key: Ident,
    ty: Type,
    expr: Expr,
}

impl Parse for PluginDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![struct]>()?;
        let name: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let plugin_name: LitStr = input.parse()?;

        let providers = if input.peek(Token![|]) {
            input.parse::<Token![|]>()?;
            let ident: Ident = input.parse()?;
            input.parse::<Token![|]>()?;
            Some(ident)
        } else {
            None
        };

        let body;
        braced!(body in input);
        let mut categories = Vec::new();
        while !body.is_empty() {
            categories.push(body.parse()?);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            plugin_name,
            providers,
            categories,
        })
    }
}

impl Parse for CategoryDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let ident: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let entries = content
            .parse_terminated(EntryDef::parse, Token![,])?
            .into_iter()
            .collect();
        Ok(Self {
            attrs,
            ident,
            entries,
        })
    }
}

impl Parse for EntryDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let key: Ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty: Type = input.parse()?;
        input.parse::<Token![=]>()?;
        let expr: Expr = input.parse()?;
        Ok(Self {
            attrs,
            key,
            ty,
            expr,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expansion
// ─────────────────────────────────────────────────────────────────────────────

fn expand(def: &PluginDef) -> syn::Result<proc_macro2::TokenStream> {
    validate(def)?;

    let krate = resolve_crate_path(MeridianCrate::Resource);
    let PluginDef {
        attrs,
        vis,
        name,
        plugin_name,
        providers,
        categories,
    } = def;
    let plugin_str = plugin_name.value();

    let plugin_doc = (!attrs.iter().any(|attr| attr.path().is_ident("doc")))
        .then(|| {
            let doc = format!("Resources of the `{plugin_str}` plugin.");
            quote!(#[doc = #doc])
        });

    let mut category_structs = Vec::new();
    let mut plugin_fields = Vec::new();
    let mut stamps = Vec::new();
    let mut resolves = Vec::new();
    let mut field_inits = Vec::new();
    let mut stamp_index = 0usize;

    for category in categories {
        let cat_ident = &category.ident;
        let cat_str = unraw(&cat_ident.to_string()).to_string();
        let cat_struct = format_ident!("{}{}", name, to_pascal_case(&cat_str));
        let cat_attrs = &category.attrs;
        let cat_doc = format!("`{cat_str}` resources of the `{plugin_str}` plugin.");
        let field_doc = format!("The `{cat_str}` resources.");

        let mut entry_fields = Vec::new();
        let mut entry_inits = Vec::new();

        for entry in &category.entries {
            let EntryDef {
                attrs: entry_attrs,
                key,
                ty,
                expr,
            } = entry;
            let key_str = unraw(&key.to_string()).to_string();
            let id_doc = format!("`{plugin_str}:{cat_str}:{key_str}`");
            let stamp = format_ident!("__stamp_{}", stamp_index);
            stamp_index += 1;

            entry_fields.push(quote! {
                #(#entry_attrs)*
                #[doc = #id_doc]
                pub #key: #ty
            });
            stamps.push(quote! {
                let #stamp = __builder.stamp(#cat_str, #key_str)?;
            });
            entry_inits.push(quote! {
                #key: __builder.resolve::<#ty>(&#stamp, #expr)?
            });
        }

        // `allow`, not `expect`: keys written in snake_case would leave the
        // expectation unfulfilled and warn in the caller's crate.
        category_structs.push(quote! {
            #(#cat_attrs)*
            #[doc = #cat_doc]
            #[allow(non_snake_case, reason = "resource keys keep their declared spelling")]
            #vis struct #cat_struct {
                #(#entry_fields,)*
            }
        });
        plugin_fields.push(quote! {
            #[doc = #field_doc]
            pub #cat_ident: #cat_struct
        });
        resolves.push(quote! {
            let #cat_ident = #cat_struct {
                #(#entry_inits,)*
            };
        });
        field_inits.push(quote!(#cat_ident));
    }

    let bind_providers = providers.as_ref().map(|ident| {
        quote! {
            let #ident: &#krate::provider::Providers = &__providers;
        }
    });

    Ok(quote! {
        #(#attrs)*
        #plugin_doc
        #vis struct #name {
            /// The plugin id.
            pub id: #krate::id::PluginId,
            #(#plugin_fields,)*
        }

        #(#category_structs)*

        impl #name {
            /// The plugin name.
            pub const NAME: &'static str = #plugin_name;

            /// Declares the plugin into `registry`, stamping every resource id
            /// before resolving any leaf.
            ///
            /// # Errors
            ///
            /// Returns the first declaration error raised by the registry or
            /// by a leaf expression.
            #vis fn declare(
                registry: &mut #krate::registry::PluginRegistry,
            ) -> ::core::result::Result<Self, #krate::registry::DeclareError> {
                let mut __builder = registry.builder(#plugin_name)?;
                let __providers = __builder.providers();
                #(#stamps)*
                #bind_providers
                #(#resolves)*
                let __id = __builder.finish()?;
                ::core::result::Result::Ok(Self {
                    id: __id,
                    #(#field_inits,)*
                })
            }
        }
    })
}

fn validate(def: &PluginDef) -> syn::Result<()> {
    let mut seen_categories: Vec<String> = Vec::new();
    for category in &def.categories {
        let cat = unraw(&category.ident.to_string()).to_string();
        if cat == "id" {
            return Err(syn::Error::new(
                category.ident.span(),
                "`id` is reserved for the plugin id",
            ));
        }
        if seen_categories.contains(&cat) {
            return Err(syn::Error::new(
                category.ident.span(),
                format!("category `{cat}` appears twice"),
            ));
        }
        seen_categories.push(cat);

        let mut seen_keys: Vec<String> = Vec::new();
        for entry in &category.entries {
            let key = unraw(&entry.key.to_string()).to_string();
            if seen_keys.contains(&key) {
                return Err(syn::Error::new(
                    entry.key.span(),
                    format!("key `{key}` appears twice in this category"),
                ));
            }
            seen_keys.push(key);
        }
    }

    let name = def.plugin_name.value();
    if name.is_empty() || name.contains(':') {
        return Err(syn::Error::new(
            def.plugin_name.span(),
            "plugin name must be non-empty and must not contain `:`",
        ));
    }
    Ok(())
}
