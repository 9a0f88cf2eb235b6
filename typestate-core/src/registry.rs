//! Compile-time registry of typestate graphs.
//!
//! One registry lives for the duration of a compilation (the macro keeps it
//! in a process-wide static; the offline tool builds a fresh one per
//! invocation). Registration is the only mutation: a graph is inserted, or
//! merged with an existing unsealed graph of the same name, and is read-only
//! afterwards. Merging is copy-on-write — the merged candidate is validated
//! in full before it replaces the previous entry, so a failed merge leaves
//! no partial state behind.

use indexmap::IndexMap;

use crate::error::TypestateError;
use crate::graph::Graph;

/// Outcome of a successful [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// The graph name was not present before.
    Fresh,
    /// The graph was merged into an existing unsealed graph of the same name.
    Merged,
}

/// Keyed store of graphs with sealing and extension semantics.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    graphs: IndexMap<String, Graph>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a graph, merging it into an existing unsealed graph of the
    /// same name.
    ///
    /// A fresh graph is validated and inserted. Any re-registration of a
    /// sealed graph is fatal, even with an equal value. For an unsealed
    /// graph, re-registering an equal value is an idempotent no-op;
    /// otherwise the two graphs merge: union of states (duplicates are
    /// fatal), concatenated transitions (exact repeats dedup), union of
    /// bridges, agreeing `initial`/`terminal`, and `is_sealed` ORed; the
    /// remaining flags keep the first declaration's values.
    pub fn register(&mut self, graph: Graph) -> Result<Registered, TypestateError> {
        if let Some(existing) = self.graphs.get(&graph.name) {
            if existing.is_sealed {
                return Err(TypestateError::SealedExtension {
                    graph: graph.name.clone(),
                });
            }
            if *existing == graph {
                return Ok(Registered::Merged);
            }
            let merged = merge(existing, graph)?;
            merged.validate()?;
            self.graphs.insert(merged.name.clone(), merged);
            return Ok(Registered::Merged);
        }

        graph.validate()?;
        self.graphs.insert(graph.name.clone(), graph);
        Ok(Registered::Fresh)
    }

    pub fn lookup(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    /// The first registered graph owning a state with the given display
    /// name. Where two graphs accidentally share a state name (a malformed
    /// program), the first graph wins and validation flags the clash.
    pub fn find_owning(&self, state: &str) -> Option<&Graph> {
        self.graphs.values().find(|graph| graph.has_state(state))
    }

    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.values()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

/// Produces the merged graph value, without touching the registry.
fn merge(existing: &Graph, incoming: Graph) -> Result<Graph, TypestateError> {
    let mut merged = existing.clone();

    for (_, state) in incoming.states {
        merged.add_state(state)?;
    }
    for transition in incoming.transitions {
        merged.add_transition(transition)?;
    }
    for bridge in incoming.bridges {
        merged.add_bridge(bridge);
    }

    match (&merged.initial, &incoming.initial) {
        (Some(existing_initial), Some(incoming_initial))
            if existing_initial != incoming_initial =>
        {
            return Err(TypestateError::ConflictingInitial {
                graph: merged.name.clone(),
                existing: existing_initial.clone(),
                incoming: incoming_initial.clone(),
            });
        }
        (None, Some(incoming_initial)) => merged.initial = Some(incoming_initial.clone()),
        _ => {}
    }
    match (&merged.terminal, &incoming.terminal) {
        (Some(existing_terminal), Some(incoming_terminal))
            if existing_terminal != incoming_terminal =>
        {
            return Err(TypestateError::ConflictingTerminal {
                graph: merged.name.clone(),
                existing: existing_terminal.clone(),
                incoming: incoming_terminal.clone(),
            });
        }
        (None, Some(incoming_terminal)) => merged.terminal = Some(incoming_terminal.clone()),
        _ => {}
    }

    merged.is_sealed = merged.is_sealed || incoming.is_sealed;
    Ok(merged)
}
