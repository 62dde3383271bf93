#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the profile storage crates.
//!
//! * [`osp_error`] turns an enum into a context-aware error type.
//! * [`profile_model`] turns a struct into a security-classified profile record.
//!
//! The examples below are `ignore`d because they need the consuming crates to compile.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Defines a crate error enum with context support.
///
/// # Injected Behaviors
///
/// * Adds `#[derive(Debug, thiserror::Error)]` when missing.
/// * Generates an `<Name>Ext` trait with `.context(..)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every wrapped source type.
/// * Implements `From<Source>` for variants holding a `source` field (or a field marked
///   `#[source]`/`#[from]`). Each source type may appear in only one variant.
/// * Implements `From<&'static str>` and `From<String>` when an `Internal` variant exists.
///
/// # Requirements
///
/// Variants use named fields. Variants with a source must also declare
/// `context: Option<Cow<'static, str>>`. Tuple and unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[osprofiles_derive::osp_error]
/// pub enum StorageError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal storage error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &std::path::Path) -> Result<Vec<u8>, StorageError> {
///     std::fs::read(path).context("Reading artifact")
/// }
/// ```
#[proc_macro_attribute]
pub fn osp_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Declares a profile record whose fields carry a security classification.
///
/// Each named field may be tagged with `#[security(secure)]`, `#[security(plaintext)]` or
/// `#[security(temporary)]` (the string form `#[security = "secure"]` is accepted too).
/// Untagged fields are `plaintext`. An unknown level is a compile error.
///
/// # Generated Items
///
/// * `Classified` impl from the store crate: a static field table plus per-field JSON
///   read and assignment used by the split and merge routines.
/// * `Serialize`/`Deserialize` impls that honour field-level serde attributes, unless the
///   struct derives them itself.
/// * A `Debug` impl printing `secure` fields as `<redacted>`, unless `Debug` is derived.
///
/// Fields marked `#[serde(skip)]` are left out of classification and merge. Field keys are
/// the serialized names, so `#[serde(rename = "..")]` is honoured; container-level
/// `rename_all` is rejected.
///
/// # Arguments
///
/// * `crate = "path"` - where the store crate is reachable (default `::osprofiles_store`).
///
/// # Example
///
/// ```rust,ignore
/// use osprofiles_store::profile_model;
///
/// #[profile_model]
/// #[derive(Clone, Default, PartialEq)]
/// pub struct ServiceProfile {
///     pub endpoint: String,
///     #[security(secure)]
///     pub api_key: String,
///     #[security(temporary)]
///     pub session_token: Option<String>,
/// }
/// ```
#[proc_macro_attribute]
pub fn profile_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::profile::expand(args.into(), input).into()
}
