//! The transition check shared by the macro validator and the offline tool.
//!
//! Host-specific code (the attribute macro, the tool's source scanner) is
//! responsible for extracting the source and destination display names from
//! a function signature; everything after that is graph work and lives
//! here, so both front ends report identical diagnostics.

use crate::error::{TypestateError, join_names};
use crate::registry::Registry;

/// How a transition-annotated function was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedTransition {
    /// A declared edge inside one graph.
    Direct { graph: String },
    /// The function returns the tagged sum of a branching transition.
    Branch { graph: String, branch: String },
    /// A declared bridge into another graph.
    Bridge { graph: String, to_graph: String },
}

/// Validates a `source -> dest` function against the registered graphs.
///
/// Mirrors the validation algorithm: resolve the source state to its owning
/// graph; accept a branch-sum return whose branching transition originates
/// at the source; otherwise require a declared transition; and if the
/// destination belongs to a different graph, retry as a bridge.
pub fn check_transition(
    registry: &Registry,
    source: &str,
    dest: &str,
) -> Result<CheckedTransition, TypestateError> {
    let graph = registry
        .find_owning(source)
        .ok_or_else(|| TypestateError::UnregisteredState {
            state: source.to_owned(),
        })?;

    if let Some(transition) = graph.branch_named(dest) {
        if transition.from == source {
            return Ok(CheckedTransition::Branch {
                graph: graph.name.clone(),
                branch: dest.to_owned(),
            });
        }
        return Err(TypestateError::BranchSourceMismatch {
            graph: graph.name.clone(),
            from: source.to_owned(),
            branch: dest.to_owned(),
        });
    }

    if graph.has_transition(source, dest) {
        return Ok(CheckedTransition::Direct {
            graph: graph.name.clone(),
        });
    }

    if let Some(other) = registry.find_owning(dest) {
        if other.name != graph.name {
            if graph.has_bridge(source, &other.name, dest) {
                return Ok(CheckedTransition::Bridge {
                    graph: graph.name.clone(),
                    to_graph: other.name.clone(),
                });
            }
            let declared: Vec<String> = graph
                .bridges_from(source)
                .iter()
                .map(|bridge| bridge.display_line())
                .collect();
            return Err(TypestateError::UndeclaredBridge {
                graph: graph.name.clone(),
                from: source.to_owned(),
                to_graph: other.name.clone(),
                to_state: dest.to_owned(),
                valid: join_names(declared.iter().map(String::as_str)),
            });
        }
    }

    Err(TypestateError::UndeclaredTransition {
        graph: graph.name.clone(),
        from: source.to_owned(),
        to: dest.to_owned(),
        valid: join_names(graph.valid_destinations(source)),
    })
}
