#![recursion_limit = "128"]
//! # docmap Derive Macros
//!
//! This crate provides procedural macros for deriving docmap traits automatically.
//! All attributes live under `#[mo(...)]`.
//!
//! ## Macros
//!
//! ### `Entity`
//!
//! Derives `docmap::mapper::Entity` and `docmap::common::Convertible` for a
//! struct with named fields. The struct must also implement `Default`, and
//! every mapped field type must implement `Convertible`.
//!
//! - **Struct attribute**: `#[mo(name = "...")]` overrides the entity name
//! - **Field attributes**:
//!   - `#[mo(key = "nm")]` stores the field under another key
//!   - `#[mo(id)]` marks the identity field, stored under `_id`; use
//!     `Option<ObjectId>` or `String` so an unset id stays unset, since
//!     `ObjectId::default()` generates a fresh id
//!   - `#[mo(ignore)]` leaves the field out of the mapping
//!   - `#[mo(converter = "enum" | "nested" | "nested_array" | "passthrough")]`
//!
//! ```rust,ignore
//! use docmap_derive::{DocEnum, Entity};
//!
//! #[derive(Entity, Default)]
//! pub struct Pet {
//!     #[mo(id)]
//!     pub id: String,
//!     #[mo(key = "nm")]
//!     pub name: String,
//!     #[mo(converter = "enum")]
//!     pub pet_type: PetType,
//!     #[mo(ignore)]
//!     pub comment: String,
//! }
//! ```
//!
//! ### `DocEnum`
//!
//! Derives `docmap::mapper::DocEnum` and `Convertible` for an enum of unit
//! variants, stored by variant name.
//!
//! - **Enum attribute**: `#[mo(rename_all = "UPPERCASE" | "lowercase" | "snake_case" | "SCREAMING_SNAKE_CASE")]`
//! - **Variant attribute**: `#[mo(name = "...")]`
//!
//! ```rust,ignore
//! #[derive(DocEnum, Default)]
//! #[mo(rename_all = "UPPERCASE")]
//! pub enum PetType {
//!     #[default]
//!     Cat,
//!     Dog,
//! }
//! ```

extern crate proc_macro;
mod doc_enum;
mod entity;

use crate::doc_enum::generate_doc_enum;
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `Entity` and `Convertible` for a struct with named fields.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union or a tuple struct
/// - More than one field is marked `#[mo(id)]`
/// - An id field also sets `key`
/// - A converter name is unknown
#[proc_macro_derive(Entity, attributes(mo))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!("Failed to derive Entity for struct '{}': {}", ast.ident, e),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for enums. Use #[derive(DocEnum)] to store an enum by name.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}

/// Derives `DocEnum` and `Convertible` for an enum of unit variants.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to a struct or a union
/// - A variant carries data
/// - Two variants resolve to the same stored name
#[proc_macro_derive(DocEnum, attributes(mo))]
pub fn derive_doc_enum(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Enum(ref data) => match generate_doc_enum(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!("Failed to derive DocEnum for enum '{}': {}", ast.ident, e),
                );
                error.to_compile_error().into()
            }
        },
        _ => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive DocEnum for structs or unions. Only enums are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
