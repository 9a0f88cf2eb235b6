//! Const introspection mirrors of a typestate graph.
//!
//! The generator emits one [`GraphDefinition`] per graph as an associated
//! constant of the discriminator enum. Everything is `&'static`, so the
//! definition is available in const contexts and costs nothing at runtime.

/// Static mirror of a registered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphDefinition {
    pub name: &'static str,
    pub states: &'static [&'static str],
    pub initial: Option<&'static str>,
    pub terminal: Option<&'static str>,
    pub sealed: bool,
    pub strict_transitions: bool,
    pub consume_on_transition: bool,
    pub transitions: &'static [TransitionDefinition],
    pub bridges: &'static [BridgeDefinition],
}

/// Static mirror of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDefinition {
    pub from: &'static str,
    pub to: &'static [&'static str],
    pub wildcard: bool,
    pub branch: Option<&'static str>,
}

/// Static mirror of one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeDefinition {
    pub from: &'static str,
    pub graph: &'static str,
    pub state: &'static str,
    pub wildcard: bool,
}

impl GraphDefinition {
    fn wildcard_matches(&self, from: &str) -> bool {
        self.states.iter().any(|state| *state == from)
            && self.initial != Some(from)
            && self.terminal != Some(from)
    }

    /// Mirror of the graph query: true iff some transition reaches `to`
    /// from `from`, explicitly or through a wildcard.
    pub fn has_transition(&self, from: &str, to: &str) -> bool {
        self.transitions.iter().any(|t| {
            t.to.iter().any(|dest| *dest == to)
                && (t.from == from || (t.wildcard && self.wildcard_matches(from)))
        })
    }

    /// Mirror of the graph query: destinations reachable from `from`, in
    /// first-seen order.
    pub fn valid_destinations(&self, from: &str) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for transition in self.transitions {
            if transition.from != from && !(transition.wildcard && self.wildcard_matches(from)) {
                continue;
            }
            for dest in transition.to {
                if !seen.contains(dest) {
                    seen.push(*dest);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: GraphDefinition = GraphDefinition {
        name: "App",
        states: &["Running", "Paused", "Stopped"],
        initial: None,
        terminal: Some("Stopped"),
        sealed: true,
        strict_transitions: true,
        consume_on_transition: true,
        transitions: &[
            TransitionDefinition {
                from: "Running",
                to: &["Paused"],
                wildcard: false,
                branch: None,
            },
            TransitionDefinition {
                from: "*",
                to: &["Stopped"],
                wildcard: true,
                branch: None,
            },
        ],
        bridges: &[],
    };

    #[test]
    fn mirrors_the_graph_queries() {
        assert!(APP.has_transition("Running", "Paused"));
        assert!(APP.has_transition("Paused", "Stopped"));
        assert!(!APP.has_transition("Stopped", "Stopped"));
        assert_eq!(APP.valid_destinations("Running"), ["Paused", "Stopped"]);
        assert!(APP.valid_destinations("Unknown").is_empty());
    }
}
