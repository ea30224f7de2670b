use proc_macro::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, LitStr, Result};

/// Case conventions accepted by `#[mo(rename_all = "...")]`.
fn rename(ident: &str, rule: Option<&str>) -> std::result::Result<String, String> {
    match rule {
        None => Ok(ident.to_string()),
        Some("UPPERCASE") => Ok(ident.to_uppercase()),
        Some("lowercase") => Ok(ident.to_lowercase()),
        Some("snake_case") => Ok(snake_case(ident)),
        Some("SCREAMING_SNAKE_CASE") => Ok(snake_case(ident).to_uppercase()),
        Some(other) => Err(format!(
            "Unknown rename rule `{}`, expected UPPERCASE, lowercase, snake_case or SCREAMING_SNAKE_CASE",
            other
        )),
    }
}

fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.char_indices() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

pub(crate) fn generate_doc_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut rename_all: Option<String> = None;
    for attr in &ast.attrs {
        if attr.path().is_ident("mo") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    rename_all = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown enum attribute, expected `rename_all`"))
                }
            })?;
        }
    }

    let mut idents = Vec::with_capacity(data.variants.len());
    let mut names: Vec<String> = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Only unit variants can be stored by name",
            ));
        }

        let mut stored = None;
        for attr in &variant.attrs {
            if attr.path().is_ident("mo") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value = meta.value()?;
                        let s: LitStr = value.parse()?;
                        stored = Some(s.value());
                        Ok(())
                    } else {
                        Err(meta.error("Unknown variant attribute, expected `name`"))
                    }
                })?;
            }
        }

        let stored = match stored {
            Some(stored) => stored,
            None => rename(&variant.ident.to_string(), rename_all.as_deref())
                .map_err(|e| syn::Error::new_spanned(ast, e))?,
        };

        if names.contains(&stored) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("Variant name `{}` is used twice", stored),
            ));
        }

        idents.push(&variant.ident);
        names.push(stored);
    }

    let gen = quote! {
        impl #impl_generics docmap::mapper::DocEnum for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name::#idents => #names,)*
                }
            }

            fn from_name(name: &str) -> docmap::errors::DocmapResult<Self> {
                match name {
                    #(#names => Ok(#name::#idents),)*
                    _ => Err(docmap::mapper::unknown_enum_value::<Self>(#type_name, name)),
                }
            }

            fn variants() -> &'static [&'static str] {
                &[#(#names),*]
            }
        }

        impl #impl_generics docmap::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> docmap::errors::DocmapResult<docmap::common::Value> {
                docmap::mapper::enum_to_value(self)
            }

            fn from_value(value: &docmap::common::Value) -> docmap::errors::DocmapResult<Self> {
                docmap::mapper::enum_from_value(value)
            }
        }
    };

    Ok(TokenStream::from(gen))
}
