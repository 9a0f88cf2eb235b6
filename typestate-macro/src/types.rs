//! Parse-tree types for the `typestate!` macro.
//!
//! The parser produces a [`TypestateDecl`]: the reified [`Graph`] handed to
//! the registry, plus the identifier lists (with their original spans) the
//! generator needs, plus a symbol-to-span table so graph-level errors can
//! point at the offending token instead of the whole declaration.

use proc_macro2::Span;
use std::collections::HashMap;
use syn::Ident;
use typestate_core::{Graph, TypestateError};

/// One parsed `typestate!` declaration.
pub struct TypestateDecl {
    /// The graph name, span-preserving.
    pub name: Ident,
    /// The fully populated graph handed to the registry.
    pub graph: Graph,
    /// The states declared in this block, in declaration order.
    pub states: Vec<Ident>,
    /// The branching result types declared in this block.
    pub branches: Vec<BranchDecl>,
    /// First-seen span for every identifier mentioned in the block.
    pub spans: HashMap<String, Span>,
}

/// A branching transition's result type and its destinations.
pub struct BranchDecl {
    pub ident: Ident,
    pub destinations: Vec<Ident>,
}

impl TypestateDecl {
    /// Converts a graph-level error into a compiler diagnostic, spanned to
    /// the token the error is about when the declaration mentions it.
    pub fn error(&self, err: &TypestateError) -> syn::Error {
        let span = err
            .subject()
            .and_then(|symbol| self.spans.get(symbol))
            .copied()
            .unwrap_or_else(|| self.name.span());
        syn::Error::new(span, err.to_string())
    }

    /// Records the first span seen for a symbol.
    pub fn note_span(spans: &mut HashMap<String, Span>, symbol: &Ident) {
        spans.entry(symbol.to_string()).or_insert(symbol.span());
    }
}
