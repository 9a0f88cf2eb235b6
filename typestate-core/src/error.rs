//! Error taxonomy for typestate declarations.
//!
//! Structural, registry, validation, and generator failures all surface as
//! [`TypestateError`]. Syntactic failures stay in the parsers (the macro and
//! the offline tool report those with their own source locations); everything
//! that can be phrased in terms of graphs and states lives here so the macro
//! and the tool emit identical diagnostics.

use thiserror::Error;

/// A fatal error detected while building, merging, or consulting a typestate
/// graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypestateError {
    // Structural errors, detected while a declaration is assembled or when a
    // merged graph is validated.
    #[error("duplicate state `{state}` in typestate `{graph}`")]
    DuplicateState { graph: String, state: String },

    #[error("branching transitions require a result type name: `{from} -> {to}` needs `as <Name>`")]
    BranchWithoutName { from: String, to: String },

    #[error("duplicate branching transition from `{from}` in typestate `{graph}`")]
    DuplicateBranchingSource { graph: String, from: String },

    #[error("duplicate branch type `{branch}` in typestate `{graph}`")]
    DuplicateBranchName { graph: String, branch: String },

    #[error("transition endpoint `{state}` is not a declared state of typestate `{graph}`")]
    UnknownEndpoint { graph: String, state: String },

    #[error("`initial` state `{state}` is not a member of typestate `{graph}`")]
    InitialNotAMember { graph: String, state: String },

    #[error("`terminal` state `{state}` is not a member of typestate `{graph}`")]
    TerminalNotAMember { graph: String, state: String },

    #[error("cannot transition from terminal state `{state}` in typestate `{graph}`")]
    TransitionFromTerminal { graph: String, state: String },

    #[error("cannot transition into initial state `{state}` in typestate `{graph}`")]
    TransitionIntoInitial { graph: String, state: String },

    // Registry errors.
    #[error("cannot extend sealed typestate `{graph}`")]
    SealedExtension { graph: String },

    #[error("conflicting initial states for typestate `{graph}`: `{existing}` vs `{incoming}`")]
    ConflictingInitial {
        graph: String,
        existing: String,
        incoming: String,
    },

    #[error("conflicting terminal states for typestate `{graph}`: `{existing}` vs `{incoming}`")]
    ConflictingTerminal {
        graph: String,
        existing: String,
        incoming: String,
    },

    // Validation errors, raised while checking transition-annotated functions.
    #[error("state `{state}` is not part of any registered typestate")]
    UnregisteredState { state: String },

    #[error(
        "no transition from `{from}` to `{to}` in typestate `{graph}`; \
         valid destinations from `{from}`: [{valid}]; \
         declare `{from} -> {to},` in the transitions block of `{graph}`"
    )]
    UndeclaredTransition {
        graph: String,
        from: String,
        to: String,
        valid: String,
    },

    #[error(
        "undeclared bridge from `{from}` to `{to_graph}::{to_state}`; \
         declared bridges from `{from}` in typestate `{graph}`: [{valid}]"
    )]
    UndeclaredBridge {
        graph: String,
        from: String,
        to_graph: String,
        to_state: String,
        valid: String,
    },

    #[error("branch type `{branch}` does not belong to a branching transition from `{from}` in typestate `{graph}`")]
    BranchSourceMismatch {
        graph: String,
        from: String,
        branch: String,
    },

    #[error("function on state `{state}` of strict typestate `{graph}` must be marked `#[transition]` or `#[not_a_transition]`")]
    StrictTransitionViolation { graph: String, state: String },

    // Generator errors.
    #[error("typestate `{graph}` declares no states")]
    EmptyGraph { graph: String },
}

impl TypestateError {
    /// The state or branch name the error is about, when there is one.
    ///
    /// Callers with a symbol-to-span table (the macro) use this to point the
    /// diagnostic at the offending token instead of the whole declaration.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::DuplicateState { state, .. }
            | Self::UnknownEndpoint { state, .. }
            | Self::InitialNotAMember { state, .. }
            | Self::TerminalNotAMember { state, .. }
            | Self::TransitionFromTerminal { state, .. }
            | Self::TransitionIntoInitial { state, .. }
            | Self::UnregisteredState { state }
            | Self::StrictTransitionViolation { state, .. } => Some(state),
            Self::DuplicateBranchingSource { from, .. } => Some(from),
            Self::DuplicateBranchName { branch, .. }
            | Self::BranchSourceMismatch { branch, .. } => Some(branch),
            Self::BranchWithoutName { from, .. } => Some(from),
            Self::ConflictingInitial { incoming, .. }
            | Self::ConflictingTerminal { incoming, .. } => Some(incoming),
            Self::UndeclaredTransition { to, .. } => Some(to),
            Self::UndeclaredBridge { to_state, .. } => Some(to_state),
            Self::SealedExtension { .. } | Self::EmptyGraph { .. } => None,
        }
    }
}

/// Join state names for display inside an error message.
///
/// An empty list renders as `none` so messages never show a bare `[]`.
pub(crate) fn join_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let joined = names.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_owned()
    } else {
        joined
    }
}
