//! Code generation for the `typestate!` macro.
//!
//! For a freshly registered graph the macro expands to:
//!
//! 1. One nominal type per state (`pub struct Closed;`) — move-only when
//!    `consume_on_transition` is set, `Copy` otherwise
//! 2. The discriminator enum (`FileState`) with one variant per state
//! 3. The union type (`FileStates`) holding any state, with `From`
//!    injectors and a `state()` accessor
//! 4. A `Typestate` impl per state mapping the type to its discriminator
//! 5. One tagged sum per branching transition, closed over exactly the
//!    declared destinations, with per-destination constructors and `From`
//!    injectors
//! 6. The `DEFINITION` constant: a static mirror of the graph
//!
//! A block that extends an existing unsealed graph only contributes its new
//! state types and branch sums: Rust enums are closed, so the discriminator
//! and union stay as the first declaration emitted them, while the registry
//! (and with it every later validation) sees the merged graph.
//!
//! # Example expansion
//!
//! ```rust,ignore
//! pub struct Closed;
//! pub struct Open;
//!
//! pub enum FileState { Closed, Open }
//!
//! pub enum FileStates { Closed(Closed), Open(Open) }
//!
//! impl ::typestate::Typestate for Closed {
//!     type Discriminant = FileState;
//!     const STATE_NAME: &'static str = "Closed";
//!     fn discriminant(&self) -> FileState { FileState::Closed }
//! }
//! ```

use crate::types::{BranchDecl, TypestateDecl};
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Ident, Result};
use typestate_core::TypestateError;

/// Expands one declaration. `fresh` is whether the registry saw the graph
/// name for the first time.
pub fn expand(decl: &TypestateDecl, fresh: bool) -> Result<TokenStream2> {
    if fresh && decl.states.is_empty() {
        return Err(syn::Error::new(
            decl.name.span(),
            TypestateError::EmptyGraph {
                graph: decl.graph.name.clone(),
            }
            .to_string(),
        ));
    }

    let state_types = state_types(decl);
    let branch_sums = branch_sums(decl, fresh);

    let mut output = quote! {
        #state_types
        #branch_sums
    };
    if fresh {
        let discriminator = discriminator(decl);
        let union_type = union_type(decl);
        let typestate_impls = typestate_impls(decl);
        let definition = definition_const(decl);
        output = quote! {
            #output
            #discriminator
            #union_type
            #typestate_impls
            #definition
        };
    }
    Ok(output)
}

fn state_enum_ident(decl: &TypestateDecl) -> Ident {
    format_ident!("{}State", decl.name)
}

fn union_ident(decl: &TypestateDecl) -> Ident {
    format_ident!("{}States", decl.name)
}

/// Derives for generated state-carrying types. Without
/// `consume_on_transition` states may be duplicated freely; with it the
/// compiler's move checker enforces that the last read of a value is the
/// one handed to a transition.
fn value_derives(decl: &TypestateDecl) -> TokenStream2 {
    if decl.graph.consume_on_transition {
        quote!(#[derive(Debug, PartialEq, Eq)])
    } else {
        quote!(#[derive(Debug, Clone, Copy, PartialEq, Eq)])
    }
}

/// One nominal zero-sized type per state.
fn state_types(decl: &TypestateDecl) -> TokenStream2 {
    let derives = value_derives(decl);
    let types = decl.states.iter().map(|state| {
        quote! {
            #derives
            pub struct #state;
        }
    });
    quote! { #(#types)* }
}

/// The discriminator enum. Variants carry the bare state names: Rust
/// already scopes them under the enum name.
fn discriminator(decl: &TypestateDecl) -> TokenStream2 {
    let state_enum = state_enum_ident(decl);
    let states = &decl.states;
    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum #state_enum {
            #(#states,)*
        }
    }
}

/// The union-of-states type with injectors and a discriminator accessor.
fn union_type(decl: &TypestateDecl) -> TokenStream2 {
    let derives = value_derives(decl);
    let state_enum = state_enum_ident(decl);
    let union = union_ident(decl);
    let states = &decl.states;

    let variants = states.iter().map(|state| quote! { #state(#state) });
    let arms = states
        .iter()
        .map(|state| quote! { Self::#state(_) => #state_enum::#state });
    let injectors = states.iter().map(|state| {
        quote! {
            impl ::core::convert::From<#state> for #union {
                fn from(state: #state) -> Self {
                    Self::#state(state)
                }
            }
        }
    });

    quote! {
        #derives
        pub enum #union {
            #(#variants,)*
        }

        impl #union {
            /// The discriminator for the state currently held.
            pub fn state(&self) -> #state_enum {
                match self {
                    #(#arms,)*
                }
            }
        }

        #(#injectors)*
    }
}

/// Per-state introspection: map each state type to its discriminator.
fn typestate_impls(decl: &TypestateDecl) -> TokenStream2 {
    let state_enum = state_enum_ident(decl);
    let impls = decl.states.iter().map(|state| {
        let name = state.to_string();
        quote! {
            impl ::typestate::Typestate for #state {
                type Discriminant = #state_enum;
                const STATE_NAME: &'static str = #name;
                fn discriminant(&self) -> #state_enum {
                    #state_enum::#state
                }
            }
        }
    });
    quote! { #(#impls)* }
}

/// Tagged sums for branching transitions.
fn branch_sums(decl: &TypestateDecl, fresh: bool) -> TokenStream2 {
    let derives = value_derives(decl);
    let state_enum = state_enum_ident(decl);

    let sums = decl.branches.iter().map(|branch| {
        let BranchDecl { ident, destinations } = branch;
        let variants = destinations.iter().map(|dest| quote! { #dest(#dest) });
        let constructors = destinations.iter().map(|dest| {
            let ctor = snake_case_ident(dest);
            quote! {
                pub fn #ctor(state: #dest) -> Self {
                    Self::#dest(state)
                }
            }
        });
        let injectors = destinations.iter().map(|dest| {
            quote! {
                impl ::core::convert::From<#dest> for #ident {
                    fn from(state: #dest) -> Self {
                        Self::#dest(state)
                    }
                }
            }
        });
        // Extension blocks cannot add variants to the first declaration's
        // discriminator, so the accessor only exists on fresh graphs.
        let accessor = fresh.then(|| {
            let arms = destinations
                .iter()
                .map(|dest| quote! { Self::#dest(_) => #state_enum::#dest });
            quote! {
                impl #ident {
                    /// The discriminator for the destination actually taken.
                    pub fn state(&self) -> #state_enum {
                        match self {
                            #(#arms,)*
                        }
                    }
                }
            }
        });

        quote! {
            #derives
            pub enum #ident {
                #(#variants,)*
            }

            impl #ident {
                #(#constructors)*
            }

            #accessor

            #(#injectors)*
        }
    });

    quote! { #(#sums)* }
}

/// The static graph mirror attached to the discriminator enum.
fn definition_const(decl: &TypestateDecl) -> TokenStream2 {
    let graph = &decl.graph;
    let state_enum = state_enum_ident(decl);

    let name = graph.name.as_str();
    let states = graph.state_names();
    let initial = option_tokens(graph.initial.as_deref());
    let terminal = option_tokens(graph.terminal.as_deref());
    let sealed = graph.is_sealed;
    let strict = graph.strict_transitions;
    let consume = graph.consume_on_transition;

    let transitions = graph.transitions.iter().map(|transition| {
        let from = transition.from.as_str();
        let to = transition.to.iter().map(String::as_str);
        let wildcard = transition.is_wildcard;
        let branch = option_tokens(transition.branch.as_deref());
        quote! {
            ::typestate::core::TransitionDefinition {
                from: #from,
                to: &[#(#to),*],
                wildcard: #wildcard,
                branch: #branch,
            }
        }
    });
    let bridges = graph.bridges.iter().map(|bridge| {
        let from = bridge.from.as_str();
        let other_graph = bridge.graph.as_str();
        let state = bridge.state.as_str();
        let wildcard = bridge.is_wildcard;
        quote! {
            ::typestate::core::BridgeDefinition {
                from: #from,
                graph: #other_graph,
                state: #state,
                wildcard: #wildcard,
            }
        }
    });

    quote! {
        impl #state_enum {
            /// Static mirror of this typestate's graph.
            pub const DEFINITION: ::typestate::core::GraphDefinition =
                ::typestate::core::GraphDefinition {
                    name: #name,
                    states: &[#(#states),*],
                    initial: #initial,
                    terminal: #terminal,
                    sealed: #sealed,
                    strict_transitions: #strict,
                    consume_on_transition: #consume,
                    transitions: &[#(#transitions),*],
                    bridges: &[#(#bridges),*],
                };
        }
    }
}

fn option_tokens(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}

/// PascalCase to snake_case, for branch constructor names.
fn snake_case(input: &str) -> String {
    let mut result = String::new();
    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                result.push('_');
            }
            for lower in ch.to_lowercase() {
                result.push(lower);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

fn snake_case_ident(ident: &Ident) -> Ident {
    Ident::new(&snake_case(&ident.to_string()), ident.span())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_handles_pascal_names() {
        assert_eq!(snake_case("Success"), "success");
        assert_eq!(snake_case("HalfOpen"), "half_open");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn fresh_graphs_expand_every_artifact() {
        let decl: TypestateDecl = syn::parse2(quote::quote! {
            name: File,
            states: [Closed, Open],
            transitions: {
                Closed -> Open,
            },
        })
        .unwrap();
        let expanded = expand(&decl, true).unwrap().to_string();
        assert!(expanded.contains("pub struct Closed"));
        assert!(expanded.contains("pub enum FileState"));
        assert!(expanded.contains("pub enum FileStates"));
        assert!(expanded.contains("STATE_NAME"));
        assert!(expanded.contains("DEFINITION"));
    }

    #[test]
    fn extension_blocks_only_add_state_types() {
        let decl: TypestateDecl = syn::parse2(quote::quote! {
            name: Payment,
            states: [Refunded],
            transitions: {
                Captured -> Refunded,
            },
        })
        .unwrap();
        let expanded = expand(&decl, false).unwrap().to_string();
        assert!(expanded.contains("pub struct Refunded"));
        assert!(!expanded.contains("pub enum PaymentState"));
        assert!(!expanded.contains("DEFINITION"));
    }

    #[test]
    fn zero_state_graphs_are_a_generator_error() {
        let decl: TypestateDecl = syn::parse2(quote::quote! {
            name: Empty,
        })
        .unwrap();
        let err = expand(&decl, true).unwrap_err();
        assert!(err.to_string().contains("declares no states"));
    }

    #[test]
    fn copyable_graphs_derive_copy() {
        let decl: TypestateDecl = syn::parse2(quote::quote! {
            name: Sensor,
            consume_on_transition = false,
            states: [Idle],
        })
        .unwrap();
        let expanded = expand(&decl, true).unwrap().to_string();
        assert!(expanded.contains("Copy"));
    }

    #[test]
    fn branch_sums_close_over_declared_destinations() {
        let decl: TypestateDecl = syn::parse2(quote::quote! {
            name: Auth,
            states: [Pending, Success, Failure],
            transitions: {
                Pending -> Success | Failure as AuthResult,
            },
        })
        .unwrap();
        let expanded = expand(&decl, true).unwrap().to_string();
        assert!(expanded.contains("pub enum AuthResult"));
        assert!(expanded.contains("pub fn success"));
        assert!(expanded.contains("pub fn failure"));
    }
}
