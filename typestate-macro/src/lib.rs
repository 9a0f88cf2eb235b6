//! Procedural macros for the typestate crate.
//!
//! Three macros cooperate through a registry shared across invocations
//! within one compilation:
//!
//! - [`typestate!`](macro@typestate) reifies a declarative state graph,
//!   registers it, and generates the state types, discriminator, union,
//!   branch sums, and introspection constant.
//! - [`#[transition]`](macro@transition) validates a state-changing
//!   function's signature against the registered graphs.
//! - [`#[not_a_transition]`](macro@not_a_transition) marks a function that
//!   operates on a state type without changing state, as strict graphs
//!   require.
//!
//! # Architecture
//!
//! - **types**: the parse tree handed between parser, registry, and codegen
//! - **parser**: the declaration grammar
//! - **validation**: signature extraction for the attribute macros
//! - **codegen**: artifact generation
//! - **registry**: the static, cross-invocation graph store
//!
//! # Example
//!
//! ```ignore
//! use typestate::{transition, typestate};
//!
//! typestate! {
//!     name: File,
//!     states: [Closed, Open],
//!     initial: Closed,
//!     transitions: {
//!         Closed -> Open,
//!         Open -> Closed,
//!     },
//! }
//!
//! #[transition]
//! fn open(file: Closed) -> Open {
//!     let _ = file;
//!     Open
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemFn;

mod codegen;
mod parser;
mod registry;
mod types;
mod validation;

/// Declare a typestate graph.
///
/// Parses the declaration, merges it into the compilation's registry
/// (extending a sealed graph is a compile error), and expands to the
/// generated artifacts. See the crate docs for the grammar.
#[proc_macro]
pub fn typestate(input: TokenStream) -> TokenStream {
    let decl = syn::parse_macro_input!(input as types::TypestateDecl);
    match expand_typestate(decl) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_typestate(mut decl: types::TypestateDecl) -> syn::Result<TokenStream2> {
    // The source-unit token recorded on the graph. Cargo sets this for
    // every compilation the macro can run in.
    decl.graph.declared_in =
        std::env::var("CARGO_CRATE_NAME").unwrap_or_else(|_| String::from("unknown"));

    registry::with(|reg| {
        let fresh = reg.lookup(&decl.graph.name).is_none();
        reg.register(decl.graph.clone())
            .map_err(|err| decl.error(&err))?;
        codegen::expand(&decl, fresh)
    })
}

/// Mark a function as a state-changing transition.
///
/// The function's first parameter is the source state and its return type
/// the destination (or a branch sum, or a bridged foreign state). The
/// signature is validated against the registered graphs; the function
/// itself is emitted unchanged.
#[proc_macro_attribute]
pub fn transition(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = syn::parse_macro_input!(item as ItemFn);
    let verdict = registry::with(|reg| validation::check_transition_fn(reg, &func));
    match verdict {
        Ok(_) => quote!(#func).into(),
        Err(err) => {
            // Emit the diagnostic and the original item, so a single bad
            // transition does not cascade into missing-function errors.
            let error = err.to_compile_error();
            quote!(#error #func).into()
        }
    }
}

/// Mark a function that operates on a state type without changing state.
///
/// Required on such functions when the owning graph sets
/// `strict_transitions` (the offline tool flags unmarked ones). The first
/// parameter must resolve to a registered state.
#[proc_macro_attribute]
pub fn not_a_transition(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = syn::parse_macro_input!(item as ItemFn);
    let verdict = registry::with(|reg| validation::check_not_a_transition_fn(reg, &func));
    match verdict {
        Ok(()) => quote!(#func).into(),
        Err(err) => {
            let error = err.to_compile_error();
            quote!(#error #func).into()
        }
    }
}
