//! Parsing logic for the `typestate!` macro.
//!
//! The declaration body is a sequence of key/value sections, each allowed at
//! most once:
//!
//! - `name: Ident` (required)
//! - `is_sealed = bool`, `strict_transitions = bool`,
//!   `consume_on_transition = bool` (flags, `=` or `:`, all default `true`)
//! - `states: [A, B, …]` or `states(A, B, …)`
//! - `initial: A`, `terminal: B`
//! - `transitions: { A -> B, C -> D | E as Outcome, * -> F, … }`
//! - `bridges: { A -> OtherGraph::State, * -> OtherGraph::State, … }`
//!
//! Everything syntactic is rejected here with the offending token's span.
//! Endpoint resolution and the initial/terminal invariants are graph-level
//! concerns: they run when the registry validates the (possibly merged)
//! graph, so extension blocks may reference states declared earlier.

use crate::types::{BranchDecl, TypestateDecl};
use proc_macro2::Span;
use std::collections::HashMap;
use syn::{
    Ident, LitBool, Result, Token, braced, bracketed, parenthesized,
    parse::{Parse, ParseBuffer, ParseStream},
    spanned::Spanned,
};
use typestate_core::{Bridge, Graph, State, Transition, WILDCARD};

/// The left-hand side of a transition or bridge line.
enum LineSource {
    State(Ident),
    Wildcard(Span),
}

impl LineSource {
    fn name(&self) -> String {
        match self {
            Self::State(ident) => ident.to_string(),
            Self::Wildcard(_) => WILDCARD.to_owned(),
        }
    }

    fn span(&self) -> Span {
        match self {
            Self::State(ident) => ident.span(),
            Self::Wildcard(span) => *span,
        }
    }
}

/// One parsed transition line, spans intact.
struct TransitionLine {
    from: LineSource,
    to: Vec<Ident>,
    branch: Option<Ident>,
}

/// One parsed bridge line, spans intact.
struct BridgeLine {
    from: LineSource,
    graph: Ident,
    state: Ident,
}

impl Parse for TypestateDecl {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut name: Option<Ident> = None;
        let mut states: Option<Vec<Ident>> = None;
        let mut initial: Option<Ident> = None;
        let mut terminal: Option<Ident> = None;
        let mut transitions: Option<Vec<TransitionLine>> = None;
        let mut bridges: Option<Vec<BridgeLine>> = None;
        let mut is_sealed: Option<bool> = None;
        let mut strict_transitions: Option<bool> = None;
        let mut consume_on_transition: Option<bool> = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            let key_str = key.to_string();

            match key_str.as_str() {
                "name" => {
                    reject_duplicate_section(&key, name.is_some())?;
                    input.parse::<Token![:]>()?;
                    name = Some(input.parse()?);
                }
                "states" => {
                    reject_duplicate_section(&key, states.is_some())?;
                    let content;
                    if input.peek(syn::token::Paren) {
                        parenthesized!(content in input);
                    } else {
                        input.parse::<Token![:]>()?;
                        bracketed!(content in input);
                    }
                    states = Some(parse_state_list(&content)?);
                }
                "initial" => {
                    reject_duplicate_section(&key, initial.is_some())?;
                    input.parse::<Token![:]>()?;
                    initial = Some(input.parse()?);
                }
                "terminal" => {
                    reject_duplicate_section(&key, terminal.is_some())?;
                    input.parse::<Token![:]>()?;
                    terminal = Some(input.parse()?);
                }
                "transitions" => {
                    reject_duplicate_section(&key, transitions.is_some())?;
                    input.parse::<Token![:]>()?;
                    let content;
                    braced!(content in input);
                    transitions = Some(parse_transition_lines(&content)?);
                }
                "bridges" => {
                    reject_duplicate_section(&key, bridges.is_some())?;
                    input.parse::<Token![:]>()?;
                    let content;
                    braced!(content in input);
                    bridges = Some(parse_bridge_lines(&content)?);
                }
                "is_sealed" => {
                    reject_duplicate_section(&key, is_sealed.is_some())?;
                    is_sealed = Some(parse_flag_value(input)?);
                }
                "strict_transitions" => {
                    reject_duplicate_section(&key, strict_transitions.is_some())?;
                    strict_transitions = Some(parse_flag_value(input)?);
                }
                "consume_on_transition" => {
                    reject_duplicate_section(&key, consume_on_transition.is_some())?;
                    consume_on_transition = Some(parse_flag_value(input)?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown section or flag `{}`", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        let name =
            name.ok_or_else(|| syn::Error::new(Span::call_site(), "missing `name` field"))?;
        let states = states.unwrap_or_default();
        let transitions = transitions.unwrap_or_default();
        let bridges = bridges.unwrap_or_default();

        build_decl(
            name,
            states,
            initial,
            terminal,
            transitions,
            bridges,
            is_sealed.unwrap_or(true),
            strict_transitions.unwrap_or(true),
            consume_on_transition.unwrap_or(true),
        )
    }
}

fn reject_duplicate_section(key: &Ident, already_seen: bool) -> Result<()> {
    if already_seen {
        return Err(syn::Error::new(
            key.span(),
            format!("duplicate `{}` section", key),
        ));
    }
    Ok(())
}

/// Flags accept `= value` or `: value`.
fn parse_flag_value(input: ParseStream<'_>) -> Result<bool> {
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
    } else {
        input.parse::<Token![:]>()?;
    }
    let value: LitBool = input.parse()?;
    Ok(value.value())
}

/// Parse a comma-separated state list, rejecting re-declared names.
fn parse_state_list(input: &ParseBuffer<'_>) -> Result<Vec<Ident>> {
    let mut states: Vec<Ident> = Vec::new();
    while !input.is_empty() {
        let ident: Ident = input.parse()?;
        if states.iter().any(|seen| *seen == ident) {
            return Err(syn::Error::new(ident.span(), "duplicate state"));
        }
        states.push(ident);
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
    }
    Ok(states)
}

fn parse_line_source(input: &ParseBuffer<'_>) -> Result<LineSource> {
    if input.peek(Token![*]) {
        let star: Token![*] = input.parse()?;
        Ok(LineSource::Wildcard(star.span()))
    } else {
        Ok(LineSource::State(input.parse()?))
    }
}

/// Parse the transitions block: comma-separated `from -> to` lines where
/// the right-hand side may be a `|`-joined destination list with a
/// mandatory `as Name` result type.
fn parse_transition_lines(input: &ParseBuffer<'_>) -> Result<Vec<TransitionLine>> {
    let mut lines = Vec::new();
    while !input.is_empty() {
        let from = parse_line_source(input)?;
        let arrow: Token![->] = input.parse()?;
        let mut to = vec![input.parse::<Ident>()?];
        while input.peek(Token![|]) {
            input.parse::<Token![|]>()?;
            to.push(input.parse()?);
        }
        let branch = if input.peek(Token![as]) {
            input.parse::<Token![as]>()?;
            Some(input.parse::<Ident>()?)
        } else {
            None
        };

        if to.len() > 1 && branch.is_none() {
            return Err(syn::Error::new(
                arrow.span(),
                "branching transitions require a result type name (`as <Name>`)",
            ));
        }
        if let Some(branch) = &branch {
            if to.len() == 1 {
                return Err(syn::Error::new(
                    branch.span(),
                    "`as` is only valid on branching transitions",
                ));
            }
            if matches!(from, LineSource::Wildcard(_)) {
                return Err(syn::Error::new(
                    from.span(),
                    "branching transitions require an explicit source state",
                ));
            }
        }

        lines.push(TransitionLine { from, to, branch });
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
    }
    Ok(lines)
}

/// Parse the bridges block: comma-separated `from -> Graph::State` lines.
fn parse_bridge_lines(input: &ParseBuffer<'_>) -> Result<Vec<BridgeLine>> {
    let mut lines = Vec::new();
    while !input.is_empty() {
        let from = parse_line_source(input)?;
        input.parse::<Token![->]>()?;
        let graph: Ident = input.parse()?;
        input.parse::<Token![::]>()?;
        let state: Ident = input.parse()?;
        lines.push(BridgeLine { from, graph, state });
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
    }
    Ok(lines)
}

#[allow(clippy::too_many_arguments)]
fn build_decl(
    name: Ident,
    states: Vec<Ident>,
    initial: Option<Ident>,
    terminal: Option<Ident>,
    transitions: Vec<TransitionLine>,
    bridges: Vec<BridgeLine>,
    is_sealed: bool,
    strict_transitions: bool,
    consume_on_transition: bool,
) -> Result<TypestateDecl> {
    let mut graph = Graph::new(name.to_string());
    graph.is_sealed = is_sealed;
    graph.strict_transitions = strict_transitions;
    graph.consume_on_transition = consume_on_transition;

    let mut spans: HashMap<String, Span> = HashMap::new();

    for state in &states {
        TypestateDecl::note_span(&mut spans, state);
        graph
            .add_state(State::new(state.to_string()))
            .map_err(|err| syn::Error::new(state.span(), err.to_string()))?;
    }

    // Membership of `initial`/`terminal` is checked by the registry against
    // the merged graph, like transition endpoints, so an extension block may
    // point at a state from an earlier declaration.
    if let Some(initial) = &initial {
        TypestateDecl::note_span(&mut spans, initial);
        graph.initial = Some(initial.to_string());
    }
    if let Some(terminal) = &terminal {
        TypestateDecl::note_span(&mut spans, terminal);
        graph.terminal = Some(terminal.to_string());
    }

    let mut branches = Vec::new();
    for line in &transitions {
        if let LineSource::State(ident) = &line.from {
            TypestateDecl::note_span(&mut spans, ident);
        }
        for dest in &line.to {
            TypestateDecl::note_span(&mut spans, dest);
        }
        let destinations: Vec<String> = line.to.iter().map(Ident::to_string).collect();
        let transition = match &line.branch {
            Some(branch) => {
                TypestateDecl::note_span(&mut spans, branch);
                branches.push(BranchDecl {
                    ident: branch.clone(),
                    destinations: line.to.clone(),
                });
                Transition::branching(line.from.name(), destinations, branch.to_string())
            }
            None => Transition::new(line.from.name(), destinations),
        };
        graph
            .add_transition(transition)
            .map_err(|err| syn::Error::new(line.from.span(), err.to_string()))?;
    }

    for line in &bridges {
        if let LineSource::State(ident) = &line.from {
            TypestateDecl::note_span(&mut spans, ident);
        }
        graph.add_bridge(Bridge::new(
            line.from.name(),
            line.graph.to_string(),
            line.state.to_string(),
        ));
    }

    Ok(TypestateDecl {
        name,
        graph,
        states,
        branches,
        spans,
    })
}
