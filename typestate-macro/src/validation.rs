//! Validation of `#[transition]` and `#[not_a_transition]` functions.
//!
//! The attribute macros extract the source state from the function's first
//! parameter and the destination from its return type, then hand both
//! display names to [`typestate_core::check_transition`]. Only the
//! signature matters: bodies are never analysed, and the annotations are
//! erased from the expansion.

use proc_macro2::Span;
use quote::ToTokens;
use syn::{ItemFn, Result, Type, spanned::Spanned};
use typestate_core::{CheckedTransition, Registry, TypestateError, check_transition};

/// A state type mention pulled out of a signature.
pub struct StateRef {
    /// The display name used for graph lookups (last path segment, generic
    /// arguments ignored).
    pub name: String,
    /// The full type spelling, for diagnostics.
    pub spelling: String,
    pub span: Span,
}

/// Validates a `#[transition]` function against the registered graphs.
pub fn check_transition_fn(registry: &Registry, func: &ItemFn) -> Result<CheckedTransition> {
    let source = source_of(func)?;
    let dest = dest_of(func)?;
    check_transition(registry, &source.name, &dest.name).map_err(|err| {
        let span = match &err {
            TypestateError::UnregisteredState { .. } => source.span,
            _ => dest.span,
        };
        syn::Error::new(span, err.to_string())
    })
}

/// Validates a `#[not_a_transition]` function: its first parameter must be
/// a registered state, nothing more.
pub fn check_not_a_transition_fn(registry: &Registry, func: &ItemFn) -> Result<()> {
    let source = source_of(func)?;
    if registry.find_owning(&source.name).is_none() {
        return Err(syn::Error::new(
            source.span,
            TypestateError::UnregisteredState {
                state: source.spelling,
            }
            .to_string(),
        ));
    }
    Ok(())
}

/// The source state: the function's first parameter.
pub fn source_of(func: &ItemFn) -> Result<StateRef> {
    match func.sig.inputs.first() {
        None => Err(syn::Error::new(
            func.sig.ident.span(),
            "transition functions take the source state as their first parameter",
        )),
        Some(syn::FnArg::Receiver(receiver)) => Err(syn::Error::new(
            receiver.span(),
            "transition functions take the source state as their first parameter, not `self`",
        )),
        Some(syn::FnArg::Typed(param)) => state_ref(&param.ty),
    }
}

/// The destination state: the function's declared return type.
pub fn dest_of(func: &ItemFn) -> Result<StateRef> {
    match &func.sig.output {
        syn::ReturnType::Default => Err(syn::Error::new(
            func.sig.ident.span(),
            "transition functions declare the destination state as their return type",
        )),
        syn::ReturnType::Type(_, ty) => state_ref(ty),
    }
}

/// Resolves a type to the state it names. References and parentheses are
/// looked through; the display name is the last path segment.
fn state_ref(ty: &Type) -> Result<StateRef> {
    match ty {
        Type::Reference(reference) => state_ref(&reference.elem),
        Type::Paren(paren) => state_ref(&paren.elem),
        Type::Path(path) => {
            let segment = path.path.segments.last().ok_or_else(|| {
                syn::Error::new(ty.span(), "empty type path cannot name a state")
            })?;
            Ok(StateRef {
                name: segment.ident.to_string(),
                spelling: type_spelling(ty),
                span: segment.ident.span(),
            })
        }
        other => Err(syn::Error::new(
            other.span(),
            "this type cannot name a typestate state",
        )),
    }
}

/// The full type spelling, with token-stream spacing collapsed.
fn type_spelling(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.peek().copied();
            let both_wordy = matches!(
                (prev, next),
                (Some(p), Some(n)) if (p.is_alphanumeric() || p == '_') && (n.is_alphanumeric() || n == '_')
            );
            if both_wordy {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}
