use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{DataStruct, DeriveInput, Field, LitStr, Result};

/// How the `#[mo(...)]` attributes of one field resolved.
struct FieldRule<'a> {
    ident: &'a Ident,
    ty: &'a syn::Type,
    key: Option<String>,
    converter: proc_macro2::TokenStream,
    is_id: bool,
}

pub(crate) fn generate_entity_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut entity_name = name.to_string();
    for attr in &ast.attrs {
        if attr.path().is_ident("mo") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute, expected `name`"))
                }
            })?;
        }
    }

    let fields: Vec<&Field> = match &data.fields {
        syn::Fields::Named(fields) => fields.named.iter().collect(),
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let mut rules = Vec::with_capacity(fields.len());
    let mut id_seen = false;
    for field in fields {
        if let Some(rule) = parse_field(field)? {
            if rule.is_id {
                if id_seen {
                    return Err(syn::Error::new_spanned(
                        field,
                        "Multiple id fields are not allowed",
                    ));
                }
                id_seen = true;
            }
            rules.push(rule);
        }
    }

    let field_mappings = rules.iter().map(|rule| {
        let ident = rule.ident;
        let ty = rule.ty;
        let field_name = ident.to_string();
        let converter = &rule.converter;
        let with_key = rule.key.as_ref().map(|key| quote! { .with_key(#key) });

        quote! {
            .field(
                docmap::mapper::FieldMapping::new(
                    #field_name,
                    #converter,
                    |entity: &Self| docmap::common::Convertible::to_value(&entity.#ident),
                    |entity: &mut Self, value: &docmap::common::Value| {
                        entity.#ident = <#ty as docmap::common::Convertible>::from_value(value)?;
                        Ok(())
                    },
                )
                #with_key
            )
        }
    });

    let gen = quote! {
        impl #impl_generics docmap::mapper::Entity for #name #ty_generics #where_clause {
            fn mapping() -> docmap::errors::DocmapResult<docmap::mapper::EntityMapping<Self>> {
                docmap::mapper::EntityMapping::builder(#entity_name)
                    #(#field_mappings)*
                    .build()
            }
        }

        impl #impl_generics docmap::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> docmap::errors::DocmapResult<docmap::common::Value> {
                docmap::mapper::entity_to_value(self)
            }

            fn from_value(value: &docmap::common::Value) -> docmap::errors::DocmapResult<Self> {
                docmap::mapper::entity_from_value(value)
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Reads the `#[mo(...)]` attributes of a field. `None` for ignored fields.
fn parse_field(field: &Field) -> Result<Option<FieldRule<'_>>> {
    let ident = match field.ident.as_ref() {
        Some(ident) => ident,
        None => return Err(syn::Error::new_spanned(field, "Field has no name")),
    };

    let mut key: Option<String> = None;
    let mut converter: Option<String> = None;
    let mut is_id = false;
    let mut ignored = false;

    for attr in &field.attrs {
        if attr.path().is_ident("mo") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    key = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else if meta.path.is_ident("ignore") {
                    ignored = true;
                    Ok(())
                } else if meta.path.is_ident("converter") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    converter = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error(
                        "Unknown field attribute, expected `key`, `id`, `ignore` or `converter`",
                    ))
                }
            })?;
        }
    }

    if ignored {
        return Ok(None);
    }

    if is_id && key.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "An id field is always stored under `_id` and cannot set `key`",
        ));
    }

    let converter = match (is_id, converter.as_deref()) {
        (true, None) | (_, Some("id")) => {
            is_id = true;
            quote! { docmap::mapper::Converter::Identity }
        }
        (true, Some(other)) => {
            return Err(syn::Error::new_spanned(
                field,
                format!("An id field cannot use converter `{}`", other),
            ))
        }
        (false, None) | (false, Some("passthrough")) => {
            quote! { docmap::mapper::Converter::Passthrough }
        }
        (false, Some("enum")) => quote! { docmap::mapper::Converter::EnumName },
        (false, Some("nested")) => quote! { docmap::mapper::Converter::Nested },
        (false, Some("nested_array")) => quote! { docmap::mapper::Converter::NestedArray },
        (false, Some(other)) => {
            return Err(syn::Error::new_spanned(
                field,
                format!(
                    "Unknown converter `{}`, expected one of passthrough, enum, nested, nested_array, id",
                    other
                ),
            ))
        }
    };

    Ok(Some(FieldRule {
        ident,
        ty: &field.ty,
        key,
        converter,
        is_id,
    }))
}
