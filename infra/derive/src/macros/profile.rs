use crate::macros::error::derived_names;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::parse::{ParseStream, Parser};
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Lit, LitStr, Meta, Token, Type};

const DEFAULT_CRATE: &str = "::osprofiles_store";

/// Parsed classification for a single struct field.
struct ProfileField {
    ident: Ident,
    ty: Type,
    key: String,
    level: Level,
    skipped: bool,
    serde_attrs: Vec<Attribute>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Secure,
    Plaintext,
    Temporary,
}

impl Level {
    fn parse(raw: &str, span: Span) -> syn::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "secure" => Ok(Self::Secure),
            "plaintext" => Ok(Self::Plaintext),
            "temporary" => Ok(Self::Temporary),
            other => Err(syn::Error::new(
                span,
                format!(
                    "unknown security level `{other}`, expected `secure`, `plaintext` or `temporary`"
                ),
            )),
        }
    }

    fn tokens(self, krate: &syn::Path) -> TokenStream {
        match self {
            Self::Secure => quote! { #krate::SecurityLevel::Secure },
            Self::Plaintext => quote! { #krate::SecurityLevel::Plaintext },
            Self::Temporary => quote! { #krate::SecurityLevel::Temporary },
        }
    }
}

/// Arguments accepted by the attribute itself.
struct ModelArgs {
    krate: syn::Path,
    krate_literal: String,
}

fn parse_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut krate_literal = None::<LitStr>;

    for meta in metas {
        let Meta::NameValue(pair) = &meta else {
            return Err(syn::Error::new_spanned(meta, "expected `crate = \"path\"`"));
        };
        if !pair.path.is_ident("crate") {
            return Err(syn::Error::new_spanned(&pair.path, "only `crate = \"...\"` is supported"));
        }
        if krate_literal.is_some() {
            return Err(syn::Error::new_spanned(pair, "duplicate `crate` argument"));
        }
        let syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(lit), .. }) = &pair.value else {
            return Err(syn::Error::new_spanned(&pair.value, "expected a string literal path"));
        };
        krate_literal = Some(lit.clone());
    }

    let krate_literal =
        krate_literal.map_or_else(|| DEFAULT_CRATE.to_owned(), |lit| lit.value());
    let krate = syn::parse_str::<syn::Path>(&krate_literal)?;
    Ok(ModelArgs { krate, krate_literal })
}

/// Reads `#[security(level)]` or `#[security = "level"]`; absent means plaintext.
fn field_level(attrs: &[Attribute]) -> syn::Result<Level> {
    let mut level = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("security")) {
        if level.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate `security` attribute"));
        }
        let parsed = match &attr.meta {
            Meta::List(list) => {
                let ident: Ident = list.parse_args()?;
                Level::parse(&ident.to_string(), ident.span())?
            },
            Meta::NameValue(pair) => match &pair.value {
                syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(lit), .. }) => {
                    Level::parse(&lit.value(), lit.span())?
                },
                other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
            },
            Meta::Path(path) => {
                return Err(syn::Error::new_spanned(
                    path,
                    "expected `#[security(secure|plaintext|temporary)]`",
                ));
            },
        };
        level = Some(parsed);
    }

    Ok(level.unwrap_or(Level::Plaintext))
}

/// Consumes whatever follows a serde meta key we do not interpret.
fn discard_value(input: ParseStream<'_>) -> syn::Result<()> {
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        input.parse::<syn::Expr>()?;
    } else if input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in input);
        content.parse::<TokenStream>()?;
    }
    Ok(())
}

/// Returns the serialized key and whether serde skips the field.
fn serde_naming(ident: &Ident, attrs: &[Attribute]) -> (String, bool) {
    let mut key = ident.to_string();
    let mut skipped = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip")
                || meta.path.is_ident("skip_serializing")
                || meta.path.is_ident("skip_deserializing")
            {
                skipped = true;
                return Ok(());
            }
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let lit: LitStr = meta.value()?.parse()?;
                key = lit.value();
                return Ok(());
            }
            discard_value(meta.input)
        });
    }

    (key, skipped)
}

fn rejects_container_renaming(input: &DeriveInput) -> syn::Result<()> {
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let mut offending = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") || meta.path.is_ident("rename_all_fields") {
                offending = Some(meta.path.clone());
            }
            discard_value(meta.input)
        });
        if let Some(path) = offending {
            return Err(syn::Error::new_spanned(
                path,
                "profile_model keys follow field names; use `#[serde(rename)]` per field",
            ));
        }
    }
    Ok(())
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<ProfileField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "profile_model only supports structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "profile_model only supports structs with named fields",
        ));
    };

    let mut seen = Vec::<String>::new();
    let mut fields = Vec::with_capacity(named.named.len());

    for field in &named.named {
        let Some(ident) = field.ident.clone() else { continue };
        let level = field_level(&field.attrs)?;
        let (key, skipped) = serde_naming(&ident, &field.attrs);

        if !skipped {
            if seen.contains(&key) {
                return Err(syn::Error::new_spanned(
                    &ident,
                    format!("field key `{key}` is classified more than once"),
                ));
            }
            seen.push(key.clone());
        }

        fields.push(ProfileField {
            ident,
            ty: field.ty.clone(),
            key,
            level,
            skipped,
            serde_attrs: field.attrs.iter().filter(|a| a.path().is_ident("serde")).cloned().collect(),
        });
    }

    Ok(fields)
}

/// Removes attributes that only this macro (or the generated helpers) understand.
fn strip_field_attrs(input: &mut DeriveInput, keep_serde: bool) {
    if !keep_serde {
        input.attrs.retain(|a| !a.path().is_ident("serde"));
    }
    if let Data::Struct(data) = &mut input.data {
        for field in &mut data.fields {
            field.attrs.retain(|a| {
                !a.path().is_ident("security") && (keep_serde || !a.path().is_ident("serde"))
            });
        }
    }
}

fn classified_impl(name: &Ident, krate: &syn::Path, fields: &[ProfileField]) -> TokenStream {
    let json = quote! { #krate::__private::serde_json };
    let active: Vec<&ProfileField> = fields.iter().filter(|f| !f.skipped).collect();

    let specs = active.iter().map(|f| {
        let key = &f.key;
        let level = f.level.tokens(krate);
        let ty = &f.ty;
        let type_name = quote!(#ty).to_string().replace(' ', "");
        quote! { #krate::FieldSpec::new(#key, #level, #type_name) }
    });
    let reads = active.iter().map(|f| {
        let key = &f.key;
        let ident = &f.ident;
        quote! { #key => ::core::option::Option::Some(#json::to_value(&self.#ident)), }
    });
    let writes = active.iter().map(|f| {
        let key = &f.key;
        let ident = &f.ident;
        let ty = &f.ty;
        quote! {
            #key => match #json::from_value::<#ty>(value) {
                ::core::result::Result::Ok(parsed) => {
                    self.#ident = parsed;
                    #krate::FieldAssignment::Assigned
                },
                ::core::result::Result::Err(_) => #krate::FieldAssignment::Incompatible,
            },
        }
    });

    quote! {
        #[automatically_derived]
        impl #krate::Classified for #name {
            const FIELDS: &'static [#krate::FieldSpec] = &[#(#specs),*];

            fn field_value(
                &self,
                name: &str,
            ) -> ::core::option::Option<::core::result::Result<#json::Value, #json::Error>> {
                match name {
                    #(#reads)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn assign_field(&mut self, name: &str, value: #json::Value) -> #krate::FieldAssignment {
                match name {
                    #(#writes)*
                    _ => #krate::FieldAssignment::Unknown,
                }
            }
        }
    }
}

fn redacted_debug(name: &Ident, fields: &[ProfileField]) -> TokenStream {
    let entries = fields.iter().map(|f| {
        let ident = &f.ident;
        if f.level == Level::Secure {
            quote! { builder.field(stringify!(#ident), &"<redacted>"); }
        } else {
            quote! { builder.field(stringify!(#ident), &self.#ident); }
        }
    });

    quote! {
        #[automatically_derived]
        impl ::core::fmt::Debug for #name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut builder = f.debug_struct(stringify!(#name));
                #(#entries)*
                builder.finish()
            }
        }
    }
}

struct SerdePlan<'a> {
    name: &'a Ident,
    krate: &'a syn::Path,
    serde_path: LitStr,
    container_attrs: Vec<Attribute>,
    serialize: bool,
    deserialize: bool,
}

fn serde_impls(plan: &SerdePlan<'_>, fields: &[ProfileField]) -> TokenStream {
    if !plan.serialize && !plan.deserialize {
        return quote! {};
    }

    let SerdePlan { name, krate, serde_path, container_attrs, .. } = plan;
    let serde = quote! { #krate::__private::serde };
    let helper = format_ident!("__osprofiles_profile_{}", name);
    let idents: Vec<&Ident> = fields.iter().map(|f| &f.ident).collect();

    let borrowed = fields.iter().map(|f| {
        let ProfileField { ident, ty, serde_attrs, .. } = f;
        quote! { #(#serde_attrs)* pub(super) #ident: &'a #ty }
    });
    let owned = fields.iter().map(|f| {
        let ProfileField { ident, ty, serde_attrs, .. } = f;
        quote! { #(#serde_attrs)* pub(super) #ident: #ty }
    });

    let ser = plan.serialize.then(|| {
        quote! {
            #[automatically_derived]
            impl #serde::Serialize for #name {
                fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
                where
                    S: #serde::Serializer,
                {
                    let view = #helper::Borrowed { #(#idents: &self.#idents,)* };
                    #serde::Serialize::serialize(&view, serializer)
                }
            }
        }
    });
    let de = plan.deserialize.then(|| {
        quote! {
            #[automatically_derived]
            impl<'de> #serde::Deserialize<'de> for #name {
                fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
                where
                    D: #serde::Deserializer<'de>,
                {
                    let owned = <#helper::Owned as #serde::Deserialize<'de>>::deserialize(deserializer)?;
                    ::core::result::Result::Ok(Self { #(#idents: owned.#idents,)* })
                }
            }
        }
    });

    quote! {
        #[allow(non_snake_case, non_camel_case_types, unused_imports, dead_code, unreachable_pub)]
        mod #helper {
            use super::*;

            #[derive(#serde::Serialize)]
            #[serde(crate = #serde_path)]
            #(#container_attrs)*
            pub struct Borrowed<'a> {
                #(#borrowed,)*
            }

            #[derive(#serde::Deserialize)]
            #[serde(crate = #serde_path)]
            #(#container_attrs)*
            pub struct Owned {
                #(#owned,)*
            }
        }

        #ser
        #de
    }
}

/// Expands `#[profile_model]`.
pub fn expand(args: TokenStream, mut input: DeriveInput) -> TokenStream {
    match try_expand(args, &mut input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn try_expand(args: TokenStream, input: &mut DeriveInput) -> syn::Result<TokenStream> {
    let ModelArgs { krate, krate_literal } = parse_args(args)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "profile_model does not support generic parameters",
        ));
    }
    rejects_container_renaming(input)?;

    let fields = collect_fields(input)?;
    let derived = derived_names(&input.attrs);
    let user_serde = derived.contains("Serialize") || derived.contains("Deserialize");

    let plan = SerdePlan {
        name: &input.ident,
        krate: &krate,
        serde_path: LitStr::new(
            &format!("{}::__private::serde", krate_literal.trim_start_matches("::")),
            Span::call_site(),
        ),
        container_attrs: input.attrs.iter().filter(|a| a.path().is_ident("serde")).cloned().collect(),
        serialize: !derived.contains("Serialize"),
        deserialize: !derived.contains("Deserialize"),
    };
    let serde_tokens = serde_impls(&plan, &fields);
    let classified = classified_impl(&input.ident, &krate, &fields);
    let debug = if derived.contains("Debug") {
        quote! {}
    } else {
        redacted_debug(&input.ident, &fields)
    };

    strip_field_attrs(input, user_serde);

    Ok(quote! {
        #input
        #serde_tokens
        #classified
        #debug
    })
}
