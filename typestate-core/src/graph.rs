//! Graph model for typestate declarations.
//!
//! A [`Graph`] is the reified form of one `typestate!` declaration: an
//! ordered map of states, the transitions between them, and the bridges that
//! point into other graphs. The validator and the offline tool only ever ask
//! the three total queries ([`Graph::has_transition`],
//! [`Graph::valid_destinations`], [`Graph::has_bridge`]); everything else
//! here exists to build and check graphs.

use indexmap::IndexMap;

use crate::error::TypestateError;

/// The wildcard source token. A wildcard transition or bridge matches every
/// declared state except the graph's initial and terminal states.
pub const WILDCARD: &str = "*";

/// One node of a typestate graph.
///
/// `name` is the display name used throughout the DSL and in diagnostics;
/// `ty` is the full type spelling of the host type backing the state. For
/// identifier-declared states the two agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
    pub ty: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let ty = name.clone();
        Self { name, ty }
    }

    pub fn with_type(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A directed edge with one source and one or more destinations.
///
/// Two or more destinations make the transition *branching*; branching
/// transitions carry the user-chosen `branch` result type name. Wildcard
/// transitions keep `from == "*"` and the `is_wildcard` flag rather than
/// being expanded eagerly; the queries treat them as one edge per eligible
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub to: Vec<String>,
    pub is_wildcard: bool,
    pub branch: Option<String>,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: Vec<String>) -> Self {
        let from = from.into();
        let is_wildcard = from == WILDCARD;
        Self {
            from,
            to,
            is_wildcard,
            branch: None,
        }
    }

    pub fn branching(from: impl Into<String>, to: Vec<String>, branch: impl Into<String>) -> Self {
        let mut transition = Self::new(from, to);
        transition.branch = Some(branch.into());
        transition
    }

    pub fn is_branching(&self) -> bool {
        self.to.len() > 1
    }

    /// The canonical DSL line for this transition, without the trailing comma.
    pub fn display_line(&self) -> String {
        let mut line = format!("{} -> {}", self.from, self.to.join(" | "));
        if let Some(branch) = &self.branch {
            line.push_str(" as ");
            line.push_str(branch);
        }
        line
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// A directed edge whose destination belongs to a different graph.
///
/// Bridges are declarative permissions: a function consuming a local state
/// and returning `graph::state` is only valid if the bridge exists. The
/// destination graph does not need to be registered when the bridge is
/// declared; resolution happens at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bridge {
    pub from: String,
    pub graph: String,
    pub state: String,
    pub is_wildcard: bool,
}

impl Bridge {
    pub fn new(
        from: impl Into<String>,
        graph: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        let from = from.into();
        let is_wildcard = from == WILDCARD;
        Self {
            from,
            graph: graph.into(),
            state: state.into(),
            is_wildcard,
        }
    }

    /// The canonical DSL line for this bridge, without the trailing comma.
    pub fn display_line(&self) -> String {
        format!("{} -> {}::{}", self.from, self.graph, self.state)
    }
}

impl std::fmt::Display for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// A fully reified typestate declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub name: String,
    pub states: IndexMap<String, State>,
    pub transitions: Vec<Transition>,
    pub bridges: Vec<Bridge>,
    pub is_sealed: bool,
    pub strict_transitions: bool,
    pub consume_on_transition: bool,
    pub initial: Option<String>,
    pub terminal: Option<String>,
    /// Token naming the source unit (crate or file) the graph came from.
    pub declared_in: String,
}

impl Graph {
    /// A fresh graph with the default flags: sealed, strict, consuming.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: IndexMap::new(),
            transitions: Vec::new(),
            bridges: Vec::new(),
            is_sealed: true,
            strict_transitions: true,
            consume_on_transition: true,
            initial: None,
            terminal: None,
            declared_in: String::new(),
        }
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// Adds a state. Re-declaring a state name is fatal.
    pub fn add_state(&mut self, state: State) -> Result<(), TypestateError> {
        if self.states.contains_key(&state.name) {
            return Err(TypestateError::DuplicateState {
                graph: self.name.clone(),
                state: state.name,
            });
        }
        self.states.insert(state.name.clone(), state);
        Ok(())
    }

    /// Adds a transition.
    ///
    /// An exact duplicate is deduplicated silently. A branching transition
    /// without a result type name, or a second branching transition from a
    /// source that already has one, is fatal.
    pub fn add_transition(&mut self, transition: Transition) -> Result<(), TypestateError> {
        if transition.is_branching() && transition.branch.is_none() {
            return Err(TypestateError::BranchWithoutName {
                from: transition.from,
                to: transition.to.join(" | "),
            });
        }
        if self.transitions.contains(&transition) {
            return Ok(());
        }
        if transition.is_branching()
            && self
                .transitions
                .iter()
                .any(|t| t.is_branching() && t.from == transition.from)
        {
            return Err(TypestateError::DuplicateBranchingSource {
                graph: self.name.clone(),
                from: transition.from,
            });
        }
        if let Some(branch) = &transition.branch {
            if self
                .transitions
                .iter()
                .any(|t| t.branch.as_deref() == Some(branch))
            {
                return Err(TypestateError::DuplicateBranchName {
                    graph: self.name.clone(),
                    branch: branch.clone(),
                });
            }
        }
        self.transitions.push(transition);
        Ok(())
    }

    /// Adds a bridge, deduplicating exact repeats.
    pub fn add_bridge(&mut self, bridge: Bridge) {
        if !self.bridges.contains(&bridge) {
            self.bridges.push(bridge);
        }
    }

    /// Whether a wildcard edge applies to `from` as an implicit source.
    ///
    /// The initial and terminal states are silently skipped: the terminal
    /// state may never be a source, and the initial state is kept out of
    /// wildcard expansion entirely.
    fn wildcard_matches(&self, from: &str) -> bool {
        self.has_state(from)
            && self.initial.as_deref() != Some(from)
            && self.terminal.as_deref() != Some(from)
    }

    /// True iff some transition reaches `to` from `from`, either explicitly
    /// or through a wildcard. Total: unknown states simply yield `false`.
    pub fn has_transition(&self, from: &str, to: &str) -> bool {
        self.transitions.iter().any(|t| {
            t.to.iter().any(|dest| dest == to)
                && (t.from == from || (t.is_wildcard && self.wildcard_matches(from)))
        })
    }

    /// Every destination reachable from `from`, deduplicated while keeping
    /// first-seen order.
    pub fn valid_destinations(&self, from: &str) -> Vec<&str> {
        let mut seen = Vec::new();
        for transition in &self.transitions {
            if transition.from != from && !(transition.is_wildcard && self.wildcard_matches(from)) {
                continue;
            }
            for dest in &transition.to {
                if !seen.contains(&dest.as_str()) {
                    seen.push(dest.as_str());
                }
            }
        }
        seen
    }

    /// True iff a bridge from `from` into `other_graph::other_state` exists,
    /// explicitly or through a wildcard.
    pub fn has_bridge(&self, from: &str, other_graph: &str, other_state: &str) -> bool {
        self.bridges.iter().any(|b| {
            b.graph == other_graph
                && b.state == other_state
                && (b.from == from || (b.is_wildcard && self.wildcard_matches(from)))
        })
    }

    /// All bridges that apply to `from`, for diagnostics.
    pub fn bridges_from(&self, from: &str) -> Vec<&Bridge> {
        self.bridges
            .iter()
            .filter(|b| b.from == from || (b.is_wildcard && self.wildcard_matches(from)))
            .collect()
    }

    /// The branching transition originating at `from`, if any. Uniqueness is
    /// an invariant, so the first match is the only match.
    pub fn branch_from(&self, from: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.is_branching() && t.from == from)
    }

    /// The branching transition whose result type is named `branch`, if any.
    pub fn branch_named(&self, branch: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.branch.as_deref() == Some(branch))
    }

    /// Checks the structural invariants of the graph:
    ///
    /// - every non-wildcard transition endpoint names a declared state;
    /// - `initial`/`terminal`, when set, are members;
    /// - no transition leaves the terminal state or enters the initial state
    ///   (wildcard edges included);
    /// - at most one branching transition per source, and branch type names
    ///   are unique.
    ///
    /// The registry runs this on every freshly registered graph and on every
    /// merge result before installing it.
    pub fn validate(&self) -> Result<(), TypestateError> {
        if let Some(initial) = &self.initial {
            if !self.has_state(initial) {
                return Err(TypestateError::InitialNotAMember {
                    graph: self.name.clone(),
                    state: initial.clone(),
                });
            }
        }
        if let Some(terminal) = &self.terminal {
            if !self.has_state(terminal) {
                return Err(TypestateError::TerminalNotAMember {
                    graph: self.name.clone(),
                    state: terminal.clone(),
                });
            }
        }

        for transition in &self.transitions {
            if !transition.is_wildcard {
                if !self.has_state(&transition.from) {
                    return Err(TypestateError::UnknownEndpoint {
                        graph: self.name.clone(),
                        state: transition.from.clone(),
                    });
                }
                if self.terminal.as_deref() == Some(transition.from.as_str()) {
                    return Err(TypestateError::TransitionFromTerminal {
                        graph: self.name.clone(),
                        state: transition.from.clone(),
                    });
                }
            }
            for dest in &transition.to {
                if !self.has_state(dest) {
                    return Err(TypestateError::UnknownEndpoint {
                        graph: self.name.clone(),
                        state: dest.clone(),
                    });
                }
                if self.initial.as_deref() == Some(dest.as_str()) {
                    return Err(TypestateError::TransitionIntoInitial {
                        graph: self.name.clone(),
                        state: dest.clone(),
                    });
                }
            }
            if transition.is_branching() && transition.branch.is_none() {
                return Err(TypestateError::BranchWithoutName {
                    from: transition.from.clone(),
                    to: transition.to.join(" | "),
                });
            }
        }

        for (index, transition) in self.transitions.iter().enumerate() {
            if !transition.is_branching() {
                continue;
            }
            if self.transitions[..index]
                .iter()
                .any(|t| t.is_branching() && t.from == transition.from)
            {
                return Err(TypestateError::DuplicateBranchingSource {
                    graph: self.name.clone(),
                    from: transition.from.clone(),
                });
            }
            if let Some(branch) = &transition.branch {
                if self.transitions[..index]
                    .iter()
                    .any(|t| t.branch.as_deref() == Some(branch))
                {
                    return Err(TypestateError::DuplicateBranchName {
                        graph: self.name.clone(),
                        branch: branch.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Prints the graph back in canonical DSL form.
    ///
    /// Re-parsing the result yields an equal graph, which is how the offline
    /// tool round-trips declarations and how diagnostics suggest the exact
    /// line that would authorise a missing edge.
    pub fn canonical_decl(&self) -> String {
        let mut out = String::from("typestate! {\n");
        out.push_str(&format!("    name: {},\n", self.name));
        out.push_str(&format!("    is_sealed = {},\n", self.is_sealed));
        out.push_str(&format!(
            "    strict_transitions = {},\n",
            self.strict_transitions
        ));
        out.push_str(&format!(
            "    consume_on_transition = {},\n",
            self.consume_on_transition
        ));
        out.push_str(&format!(
            "    states: [{}],\n",
            self.state_names().collect::<Vec<_>>().join(", ")
        ));
        if let Some(initial) = &self.initial {
            out.push_str(&format!("    initial: {initial},\n"));
        }
        if let Some(terminal) = &self.terminal {
            out.push_str(&format!("    terminal: {terminal},\n"));
        }
        if !self.transitions.is_empty() {
            out.push_str("    transitions: {\n");
            for transition in &self.transitions {
                out.push_str(&format!("        {transition},\n"));
            }
            out.push_str("    },\n");
        }
        if !self.bridges.is_empty() {
            out.push_str("    bridges: {\n");
            for bridge in &self.bridges {
                out.push_str(&format!("        {bridge},\n"));
            }
            out.push_str("    },\n");
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_graph() -> Graph {
        let mut graph = Graph::new("File");
        graph.add_state(State::new("Closed")).unwrap();
        graph.add_state(State::new("Open")).unwrap();
        graph
            .add_transition(Transition::new("Closed", vec!["Open".into()]))
            .unwrap();
        graph
            .add_transition(Transition::new("Open", vec!["Closed".into()]))
            .unwrap();
        graph
    }

    #[test]
    fn queries_follow_declared_edges() {
        let graph = file_graph();
        assert!(graph.has_transition("Closed", "Open"));
        assert!(graph.has_transition("Open", "Closed"));
        assert!(!graph.has_transition("Closed", "Closed"));
        assert_eq!(graph.valid_destinations("Closed"), ["Open"]);
    }

    #[test]
    fn queries_are_total_on_unknown_states() {
        let graph = file_graph();
        assert!(!graph.has_transition("Missing", "Open"));
        assert!(!graph.has_transition("Closed", "Missing"));
        assert!(graph.valid_destinations("Missing").is_empty());
        assert!(!graph.has_bridge("Missing", "Other", "State"));
    }

    #[test]
    fn duplicate_transitions_dedup_silently() {
        let mut graph = file_graph();
        graph
            .add_transition(Transition::new("Closed", vec!["Open".into()]))
            .unwrap();
        assert_eq!(graph.transitions.len(), 2);
    }

    #[test]
    fn duplicate_state_is_fatal() {
        let mut graph = file_graph();
        let err = graph.add_state(State::new("Open")).unwrap_err();
        assert_eq!(
            err,
            TypestateError::DuplicateState {
                graph: "File".into(),
                state: "Open".into(),
            }
        );
    }

    #[test]
    fn branching_requires_a_result_name() {
        let mut graph = Graph::new("Auth");
        graph.add_state(State::new("Pending")).unwrap();
        graph.add_state(State::new("Success")).unwrap();
        graph.add_state(State::new("Failure")).unwrap();
        let err = graph
            .add_transition(Transition::new(
                "Pending",
                vec!["Success".into(), "Failure".into()],
            ))
            .unwrap_err();
        assert!(matches!(err, TypestateError::BranchWithoutName { .. }));
    }

    #[test]
    fn second_branching_transition_from_same_source_is_fatal() {
        let mut graph = Graph::new("Auth");
        for state in ["Pending", "Success", "Failure", "Other"] {
            graph.add_state(State::new(state)).unwrap();
        }
        graph
            .add_transition(Transition::branching(
                "Pending",
                vec!["Success".into(), "Failure".into()],
                "AuthResult",
            ))
            .unwrap();
        let err = graph
            .add_transition(Transition::branching(
                "Pending",
                vec!["Other".into(), "Failure".into()],
                "X",
            ))
            .unwrap_err();
        assert_eq!(
            err,
            TypestateError::DuplicateBranchingSource {
                graph: "Auth".into(),
                from: "Pending".into(),
            }
        );
    }

    #[test]
    fn wildcard_reaches_every_eligible_source() {
        let mut graph = Graph::new("App");
        for state in ["Running", "Paused", "Stopped"] {
            graph.add_state(State::new(state)).unwrap();
        }
        graph
            .add_transition(Transition::new("Running", vec!["Paused".into()]))
            .unwrap();
        graph
            .add_transition(Transition::new("Paused", vec!["Running".into()]))
            .unwrap();
        graph
            .add_transition(Transition::new(WILDCARD, vec!["Stopped".into()]))
            .unwrap();

        assert!(graph.has_transition("Running", "Stopped"));
        assert!(graph.has_transition("Paused", "Stopped"));
        assert_eq!(graph.valid_destinations("Running"), ["Paused", "Stopped"]);
    }

    #[test]
    fn wildcard_skips_initial_and_terminal_sources() {
        let mut graph = Graph::new("Job");
        for state in ["Queued", "Active", "Done"] {
            graph.add_state(State::new(state)).unwrap();
        }
        graph.initial = Some("Queued".into());
        graph.terminal = Some("Done".into());
        graph
            .add_transition(Transition::new(WILDCARD, vec!["Done".into()]))
            .unwrap();

        assert!(graph.has_transition("Active", "Done"));
        assert!(!graph.has_transition("Queued", "Done"));
        assert!(!graph.has_transition("Done", "Done"));
    }

    #[test]
    fn wildcard_may_not_target_the_initial_state() {
        let mut graph = Graph::new("App");
        for state in ["Running", "Stopped"] {
            graph.add_state(State::new(state)).unwrap();
        }
        graph.initial = Some("Stopped".into());
        graph
            .add_transition(Transition::new(WILDCARD, vec!["Stopped".into()]))
            .unwrap();
        let err = graph.validate().unwrap_err();
        assert_eq!(
            err,
            TypestateError::TransitionIntoInitial {
                graph: "App".into(),
                state: "Stopped".into(),
            }
        );
    }

    #[test]
    fn transition_from_terminal_is_fatal() {
        let mut graph = Graph::new("Connection");
        for state in ["Disconnected", "Connected", "Closed"] {
            graph.add_state(State::new(state)).unwrap();
        }
        graph.terminal = Some("Closed".into());
        graph
            .add_transition(Transition::new("Closed", vec!["Disconnected".into()]))
            .unwrap();
        let err = graph.validate().unwrap_err();
        assert_eq!(
            err,
            TypestateError::TransitionFromTerminal {
                graph: "Connection".into(),
                state: "Closed".into(),
            }
        );
    }

    #[test]
    fn unknown_endpoints_are_fatal() {
        let mut graph = file_graph();
        graph
            .add_transition(Transition::new("Open", vec!["Missing".into()]))
            .unwrap();
        let err = graph.validate().unwrap_err();
        assert_eq!(
            err,
            TypestateError::UnknownEndpoint {
                graph: "File".into(),
                state: "Missing".into(),
            }
        );
    }

    #[test]
    fn bridges_match_explicit_and_wildcard_sources() {
        let mut graph = file_graph();
        graph.add_bridge(Bridge::new("Open", "Archive", "Stored"));
        graph.add_bridge(Bridge::new(WILDCARD, "Audit", "Logged"));

        assert!(graph.has_bridge("Open", "Archive", "Stored"));
        assert!(!graph.has_bridge("Closed", "Archive", "Stored"));
        assert!(graph.has_bridge("Closed", "Audit", "Logged"));
        assert_eq!(graph.bridges_from("Open").len(), 2);
    }

    #[test]
    fn canonical_decl_lists_every_section() {
        let mut graph = file_graph();
        graph.initial = Some("Closed".into());
        graph.add_bridge(Bridge::new("Open", "Archive", "Stored"));
        let printed = graph.canonical_decl();
        assert!(printed.contains("name: File,"));
        assert!(printed.contains("states: [Closed, Open],"));
        assert!(printed.contains("initial: Closed,"));
        assert!(printed.contains("Closed -> Open,"));
        assert!(printed.contains("Open -> Archive::Stored,"));
    }
}
