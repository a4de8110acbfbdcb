//! Procedural macros for the Fezz request router.
//!
//! This crate provides the `#[fezz_handler]` attribute macro, which turns an
//! `async fn` into a routable `Handler`.
//!
//! # Example
//!
//! ```ignore
//! use fezz_router::prelude::*;
//!
//! #[fezz_handler(method = "GET", path = "/api/users/:id")]
//! async fn get_user(
//!     req: &FezzRequest,
//!     env: &Environment,
//!     ctx: &ExecutionContext,
//!     rc: &mut RequestContext,
//! ) -> HandlerResult {
//!     let id = rc.path_param("id").unwrap_or_default();
//!     Ok(FezzResponse::text(format!("user {}", id)).into())
//! }
//!
//! let mut router = ServiceRouter::new();
//! router.route::<GetUserHandler>();
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, Expr, ExprLit, FnArg, ItemFn, Lit, Meta, Token,
};

/// Attributes for the `#[fezz_handler]` macro.
#[derive(Default, Debug)]
struct FezzHandlerAttrs {
    /// Handler name; defaults to the function name.
    name: Option<String>,
    /// HTTP method, or `*` for every method.
    method: Option<String>,
    /// Route pattern.
    path: Option<String>,
    /// Optional description.
    description: Option<String>,
}

impl FezzHandlerAttrs {
    fn parse_meta_list(metas: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut attrs = FezzHandlerAttrs::default();

        for meta in metas {
            let Meta::NameValue(nv) = meta else {
                return Err(syn::Error::new_spanned(meta, "expected name = value"));
            };
            let ident = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "expected identifier"))?
                .to_string();

            let value = match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(lit_str),
                    ..
                }) => lit_str.value(),
                _ => return Err(syn::Error::new_spanned(&nv.value, "expected string literal")),
            };

            match ident.as_str() {
                "name" => attrs.name = Some(value),
                "method" => attrs.method = Some(value),
                "path" => attrs.path = Some(value),
                "description" => attrs.description = Some(value),
                _ => {
                    return Err(syn::Error::new_spanned(
                        nv.path,
                        format!("unknown attribute: {}", ident),
                    ));
                }
            }
        }

        Ok(attrs)
    }
}

/// The `#[fezz_handler]` attribute macro.
///
/// Generates a `<Name>Handler` struct implementing `Handler` and
/// `RoutedHandler`, plus a static manifest, and keeps the function itself.
///
/// # Attributes
///
/// - `path` (required): route pattern
/// - `method` (optional): HTTP method, `*` for all methods (default: "GET")
/// - `name` (optional): handler name (default: the function name)
/// - `description` (optional): handler description
#[proc_macro_attribute]
pub fn fezz_handler(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_fezz_handler(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Normalize the method attribute into the manifest's method string.
fn method_name(method: &str) -> syn::Result<String> {
    match method.to_ascii_uppercase().as_str() {
        "*" | "ANY" => Ok("*".to_string()),
        name if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()) => {
            Ok(name.to_string())
        }
        other => Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            format!("invalid method: {:?}", other),
        )),
    }
}

fn generate_fezz_handler(
    args: Punctuated<Meta, Token![,]>,
    input_fn: ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = FezzHandlerAttrs::parse_meta_list(args)?;

    let path = attrs.path.ok_or_else(|| {
        syn::Error::new(
            proc_macro2::Span::call_site(),
            "missing required attribute: path",
        )
    })?;

    if input_fn.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "fezz_handler must be async",
        ));
    }
    let arity = input_fn
        .sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();
    if arity != 4 {
        return Err(syn::Error::new_spanned(
            &input_fn.sig.inputs,
            "fezz_handler expects (request, env, ctx, req_ctx) arguments",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let name = attrs.name.unwrap_or_else(|| fn_name.to_string());
    let method = method_name(attrs.method.as_deref().unwrap_or("GET"))?;
    let description = attrs.description.unwrap_or_default();

    let struct_name = format_ident!("{}Handler", to_pascal_case(&fn_name.to_string()));
    let manifest_name = format_ident!("{}_MANIFEST", fn_name.to_string().to_uppercase());
    let fn_vis = &input_fn.vis;

    let expanded = quote! {
        #[allow(dead_code)]
        #fn_vis static #manifest_name: ::fezz_router::handler::HandlerManifest =
            ::fezz_router::handler::HandlerManifest::new(#name, #method, #path)
                .with_description(#description);

        #[derive(Debug, Default, Clone, Copy)]
        #fn_vis struct #struct_name;

        impl ::fezz_router::handler::RoutedHandler for #struct_name {
            fn manifest() -> &'static ::fezz_router::handler::HandlerManifest {
                &#manifest_name
            }

            fn create() -> Self {
                Self
            }
        }

        #[::fezz_router::prelude::async_trait]
        impl ::fezz_router::handler::Handler for #struct_name {
            async fn call(
                &self,
                request: &::fezz_router::http::FezzRequest,
                env: &::fezz_router::handler::Environment,
                ctx: &::fezz_router::handler::ExecutionContext,
                req_ctx: &mut ::fezz_router::handler::RequestContext,
            ) -> ::fezz_router::handler::HandlerResult {
                #fn_name(request, env, ctx, req_ctx).await
            }
        }

        #input_fn
    };

    Ok(expanded)
}

/// Convert a snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
