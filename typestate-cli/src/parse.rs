//! The tool's own parser for `typestate!` declaration bodies.
//!
//! This is deliberately independent of the macro's parser: the tool runs
//! outside compilation and owns its whole pipeline, from source text to
//! [`Graph`]. The grammar is the same — key/value sections, `->` transition
//! lines with `|` destinations and `as` result names, `Graph::State`
//! bridges — and so are the diagnostics, so a declaration that the macro
//! accepts round-trips through here to an equal graph.

use proc_macro2::TokenStream;
use syn::{
    Ident, LitBool, Token, braced, bracketed, parenthesized,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
};
use typestate_core::{Bridge, Graph, State, Transition, WILDCARD};

/// Parses one declaration body into a graph.
pub fn parse_declaration(tokens: TokenStream) -> syn::Result<Graph> {
    syn::parse2::<DeclBody>(tokens).map(|body| body.graph)
}

/// A transition or bridge source: a state identifier or `*`.
struct Source {
    name: String,
    span: proc_macro2::Span,
}

impl Parse for Source {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        if input.peek(Token![*]) {
            let star: Token![*] = input.parse()?;
            Ok(Source {
                name: WILDCARD.to_owned(),
                span: star.span(),
            })
        } else {
            let ident: Ident = input.parse()?;
            Ok(Source {
                name: ident.to_string(),
                span: ident.span(),
            })
        }
    }
}

/// One `from -> to [| to …] [as Name]` line.
struct TransitionExpr {
    transition: Transition,
    span: proc_macro2::Span,
}

impl Parse for TransitionExpr {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let source: Source = input.parse()?;
        let arrow: Token![->] = input.parse()?;
        let destinations: Punctuated<Ident, Token![|]> =
            Punctuated::parse_separated_nonempty(input)?;
        let branch = if input.peek(Token![as]) {
            input.parse::<Token![as]>()?;
            Some(input.parse::<Ident>()?)
        } else {
            None
        };

        if destinations.len() > 1 && branch.is_none() {
            return Err(syn::Error::new(
                arrow.span(),
                "branching transitions require a result type name (`as <Name>`)",
            ));
        }
        if let Some(branch) = &branch {
            if destinations.len() == 1 {
                return Err(syn::Error::new(
                    branch.span(),
                    "`as` is only valid on branching transitions",
                ));
            }
            if source.name == WILDCARD {
                return Err(syn::Error::new(
                    source.span,
                    "branching transitions require an explicit source state",
                ));
            }
        }

        let to: Vec<String> = destinations.iter().map(Ident::to_string).collect();
        let transition = match branch {
            Some(branch) => Transition::branching(source.name, to, branch.to_string()),
            None => Transition::new(source.name, to),
        };
        Ok(TransitionExpr {
            transition,
            span: source.span,
        })
    }
}

/// One `from -> Graph::State` line.
struct BridgeExpr {
    bridge: Bridge,
}

impl Parse for BridgeExpr {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let source: Source = input.parse()?;
        input.parse::<Token![->]>()?;
        let graph: Ident = input.parse()?;
        input.parse::<Token![::]>()?;
        let state: Ident = input.parse()?;
        Ok(BridgeExpr {
            bridge: Bridge::new(source.name, graph.to_string(), state.to_string()),
        })
    }
}

struct DeclBody {
    graph: Graph,
}

impl Parse for DeclBody {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let mut name: Option<Ident> = None;
        let mut graph = Graph::new(String::new());
        let mut seen_sections: Vec<String> = Vec::new();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            let key_name = key.to_string();
            if seen_sections.contains(&key_name) {
                return Err(syn::Error::new(
                    key.span(),
                    format!("duplicate `{key_name}` section"),
                ));
            }
            seen_sections.push(key_name.clone());

            match key_name.as_str() {
                "name" => {
                    input.parse::<Token![:]>()?;
                    name = Some(input.parse()?);
                }
                "states" => {
                    let content;
                    if input.peek(syn::token::Paren) {
                        parenthesized!(content in input);
                    } else {
                        input.parse::<Token![:]>()?;
                        bracketed!(content in input);
                    }
                    let listed: Punctuated<Ident, Token![,]> =
                        content.parse_terminated(Ident::parse, Token![,])?;
                    for state in listed {
                        graph
                            .add_state(State::new(state.to_string()))
                            .map_err(|_| syn::Error::new(state.span(), "duplicate state"))?;
                    }
                }
                "initial" => {
                    input.parse::<Token![:]>()?;
                    let state: Ident = input.parse()?;
                    graph.initial = Some(state.to_string());
                }
                "terminal" => {
                    input.parse::<Token![:]>()?;
                    let state: Ident = input.parse()?;
                    graph.terminal = Some(state.to_string());
                }
                "transitions" => {
                    input.parse::<Token![:]>()?;
                    let content;
                    braced!(content in input);
                    let lines: Punctuated<TransitionExpr, Token![,]> =
                        content.parse_terminated(TransitionExpr::parse, Token![,])?;
                    for line in lines {
                        graph
                            .add_transition(line.transition)
                            .map_err(|err| syn::Error::new(line.span, err.to_string()))?;
                    }
                }
                "bridges" => {
                    input.parse::<Token![:]>()?;
                    let content;
                    braced!(content in input);
                    let lines: Punctuated<BridgeExpr, Token![,]> =
                        content.parse_terminated(BridgeExpr::parse, Token![,])?;
                    for line in lines {
                        graph.add_bridge(line.bridge);
                    }
                }
                "is_sealed" => graph.is_sealed = flag_value(input)?,
                "strict_transitions" => graph.strict_transitions = flag_value(input)?,
                "consume_on_transition" => graph.consume_on_transition = flag_value(input)?,
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown section or flag `{other}`"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        let name = name.ok_or_else(|| {
            syn::Error::new(proc_macro2::Span::call_site(), "missing `name` field")
        })?;
        graph.name = name.to_string();

        // Membership of `initial`/`terminal` is a graph-level invariant and
        // is checked when the registry validates the (possibly merged)
        // graph, like transition endpoints.
        Ok(DeclBody { graph })
    }
}

fn flag_value(input: ParseStream<'_>) -> syn::Result<bool> {
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
    } else {
        input.parse::<Token![:]>()?;
    }
    Ok(input.parse::<LitBool>()?.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn parses_the_full_grammar() {
        let graph = parse_declaration(quote! {
            name: Door,
            is_sealed = false,
            states: [Closed, Open, Locked],
            initial: Closed,
            terminal: Locked,
            transitions: {
                Closed -> Open,
                Open -> Closed,
                * -> Locked,
            },
            bridges: {
                Open -> Alarm::Armed,
            },
        })
        .unwrap();

        assert_eq!(graph.name, "Door");
        assert!(!graph.is_sealed);
        assert_eq!(
            graph.state_names().collect::<Vec<_>>(),
            ["Closed", "Open", "Locked"]
        );
        assert_eq!(graph.initial.as_deref(), Some("Closed"));
        assert_eq!(graph.terminal.as_deref(), Some("Locked"));
        assert!(graph.has_transition("Open", "Locked"));
        assert!(graph.has_bridge("Open", "Alarm", "Armed"));
    }

    #[test]
    fn branching_without_as_is_rejected() {
        let err = parse_declaration(quote! {
            name: Auth,
            states: [Pending, Success, Failure],
            transitions: {
                Pending -> Success | Failure,
            },
        })
        .unwrap_err();
        assert!(err.to_string().contains("result type name"));
    }

    #[test]
    fn canonical_printing_round_trips() {
        let original = parse_declaration(quote! {
            name: Order,
            is_sealed = false,
            states: [Draft, Submitted, Approved, Declined, Cancelled],
            initial: Draft,
            transitions: {
                Draft -> Submitted,
                Submitted -> Approved | Declined as Review,
                * -> Cancelled,
            },
            bridges: {
                Approved -> Ledger::Recorded,
            },
        })
        .unwrap();

        let printed = original.canonical_decl();
        let body = printed
            .trim()
            .strip_prefix("typestate! {")
            .and_then(|rest| rest.strip_suffix('}'))
            .expect("canonical form is a typestate! block");
        let reparsed = parse_declaration(body.parse().unwrap()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let err = parse_declaration(quote! {
            name: Door,
            states: [Closed],
            states: [Open],
        })
        .unwrap_err();
        assert!(err.to_string().contains("duplicate `states` section"));
    }
}
