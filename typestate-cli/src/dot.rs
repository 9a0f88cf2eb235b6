//! GraphViz DOT rendering of registered typestates.
//!
//! The default output is one unified digraph with a cluster per typestate
//! and globally unique `"Graph.State"` node ids, so bridges can run between
//! clusters. `--separate` emits one plain digraph per typestate instead.
//! Wildcard expansions and bridges render dashed, branch edges carry their
//! result type as a label, and `--no-style` strips all of that decoration.

use typestate_core::{Graph, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Splines {
    Spline,
    Ortho,
    Polyline,
    Line,
}

impl Splines {
    fn as_str(self) -> &'static str {
        match self {
            Splines::Spline => "spline",
            Splines::Ortho => "ortho",
            Splines::Polyline => "polyline",
            Splines::Line => "line",
        }
    }
}

pub struct DotOptions {
    pub separate: bool,
    pub styled: bool,
    pub splines: Option<Splines>,
}

pub fn render(registry: &Registry, options: &DotOptions) -> String {
    if options.separate {
        registry
            .graphs()
            .map(|graph| render_separate(graph, options))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        render_unified(registry, options)
    }
}

/// The states a wildcard edge fans out from: everything but the initial
/// and terminal states.
fn wildcard_sources(graph: &Graph) -> Vec<&str> {
    graph
        .state_names()
        .filter(|state| {
            graph.initial.as_deref() != Some(*state) && graph.terminal.as_deref() != Some(*state)
        })
        .collect()
}

fn edge_attrs(dashed: bool, branch: Option<&str>, styled: bool) -> String {
    if !styled {
        return String::new();
    }
    let mut attrs = Vec::new();
    if dashed {
        attrs.push("style=dashed".to_owned());
    }
    if let Some(branch) = branch {
        attrs.push(format!("label=\"{branch}\""));
    }
    if attrs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", attrs.join(", "))
    }
}

fn header(out: &mut String, options: &DotOptions) {
    if options.styled {
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box];\n");
    }
    if let Some(splines) = options.splines {
        out.push_str(&format!("  splines={};\n", splines.as_str()));
    }
}

/// Emits every edge of `graph`, wildcards expanded, with `node!` mapping a
/// state name to its node id.
fn graph_edges(
    out: &mut String,
    graph: &Graph,
    indent: &str,
    options: &DotOptions,
    node: impl Fn(&str) -> String,
) {
    for transition in &graph.transitions {
        let sources: Vec<&str> = if transition.is_wildcard {
            wildcard_sources(graph)
        } else {
            vec![transition.from.as_str()]
        };
        for source in sources {
            for dest in &transition.to {
                let attrs = edge_attrs(
                    transition.is_wildcard,
                    transition.branch.as_deref(),
                    options.styled,
                );
                out.push_str(&format!(
                    "{indent}{} -> {}{attrs};\n",
                    node(source),
                    node(dest)
                ));
            }
        }
    }
}

fn bridge_edges(out: &mut String, graph: &Graph, indent: &str, options: &DotOptions) {
    for bridge in &graph.bridges {
        let sources: Vec<&str> = if bridge.is_wildcard {
            wildcard_sources(graph)
        } else {
            vec![bridge.from.as_str()]
        };
        for source in sources {
            let attrs = edge_attrs(true, None, options.styled);
            out.push_str(&format!(
                "{indent}\"{}.{}\" -> \"{}.{}\"{attrs};\n",
                graph.name, source, bridge.graph, bridge.state
            ));
        }
    }
}

fn render_unified(registry: &Registry, options: &DotOptions) -> String {
    let mut out = String::from("digraph typestates {\n");
    header(&mut out, options);

    for graph in registry.graphs() {
        out.push_str(&format!("  subgraph cluster_{} {{\n", graph.name));
        out.push_str(&format!("    label=\"{}\";\n", graph.name));
        for state in graph.state_names() {
            if options.styled {
                out.push_str(&format!(
                    "    \"{}.{}\" [label=\"{}\"];\n",
                    graph.name, state, state
                ));
            } else {
                out.push_str(&format!("    \"{}.{}\";\n", graph.name, state));
            }
        }
        let name = graph.name.clone();
        graph_edges(&mut out, graph, "    ", options, |state| {
            format!("\"{name}.{state}\"")
        });
        out.push_str("  }\n");
    }

    // Bridges cross cluster boundaries, so they live at the top level.
    for graph in registry.graphs() {
        bridge_edges(&mut out, graph, "  ", options);
    }

    out.push_str("}\n");
    out
}

fn render_separate(graph: &Graph, options: &DotOptions) -> String {
    let mut out = format!("digraph {} {{\n", graph.name);
    header(&mut out, options);
    for state in graph.state_names() {
        out.push_str(&format!("  {state};\n"));
    }
    graph_edges(&mut out, graph, "  ", options, |state| state.to_owned());
    bridge_edges(&mut out, graph, "  ", options);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use typestate_core::{Bridge, State, Transition, WILDCARD};

    fn registry() -> Registry {
        let mut registry = Registry::new();

        let mut app = Graph::new("App");
        for state in ["Running", "Paused", "Stopped"] {
            app.add_state(State::new(state)).unwrap();
        }
        app.add_transition(Transition::new("Running", vec!["Paused".into()]))
            .unwrap();
        app.add_transition(Transition::new(WILDCARD, vec!["Stopped".into()]))
            .unwrap();
        app.add_bridge(Bridge::new("Stopped", "Audit", "Logged"));
        registry.register(app).unwrap();

        let mut audit = Graph::new("Audit");
        audit.add_state(State::new("Logged")).unwrap();
        registry.register(audit).unwrap();

        registry
    }

    fn styled() -> DotOptions {
        DotOptions {
            separate: false,
            styled: true,
            splines: None,
        }
    }

    #[test]
    fn unified_output_clusters_each_typestate() {
        let rendered = render(&registry(), &styled());
        assert!(rendered.starts_with("digraph typestates {"));
        assert!(rendered.contains("rankdir=LR;"));
        assert!(rendered.contains("node [shape=box];"));
        assert!(rendered.contains("subgraph cluster_App {"));
        assert!(rendered.contains("subgraph cluster_Audit {"));
        assert!(rendered.contains("\"App.Running\" -> \"App.Paused\";"));
    }

    #[test]
    fn wildcards_expand_to_dashed_edges() {
        let rendered = render(&registry(), &styled());
        assert!(rendered.contains("\"App.Running\" -> \"App.Stopped\" [style=dashed];"));
        assert!(rendered.contains("\"App.Paused\" -> \"App.Stopped\" [style=dashed];"));
        // The wildcard destination itself is an eligible source too.
        assert!(rendered.contains("\"App.Stopped\" -> \"App.Stopped\" [style=dashed];"));
    }

    #[test]
    fn bridges_render_as_dashed_inter_cluster_edges() {
        let rendered = render(&registry(), &styled());
        assert!(rendered.contains("\"App.Stopped\" -> \"Audit.Logged\" [style=dashed];"));
    }

    #[test]
    fn separate_output_emits_one_digraph_per_typestate() {
        let options = DotOptions {
            separate: true,
            styled: true,
            splines: None,
        };
        let rendered = render(&registry(), &options);
        assert!(rendered.contains("digraph App {"));
        assert!(rendered.contains("digraph Audit {"));
        assert!(rendered.contains("  Running -> Paused;"));
    }

    #[test]
    fn no_style_strips_decoration() {
        let options = DotOptions {
            separate: false,
            styled: false,
            splines: None,
        };
        let rendered = render(&registry(), &options);
        assert!(!rendered.contains("rankdir"));
        assert!(!rendered.contains("style=dashed"));
        assert!(!rendered.contains("[label="));
        assert!(rendered.contains("\"App.Running\" -> \"App.Stopped\";"));
    }

    #[test]
    fn splines_setting_is_forwarded() {
        let options = DotOptions {
            separate: false,
            styled: true,
            splines: Some(Splines::Ortho),
        };
        let rendered = render(&registry(), &options);
        assert!(rendered.contains("splines=ortho;"));
    }

    #[test]
    fn single_state_graph_renders_one_node_and_no_edges() {
        let mut registry = Registry::new();
        let mut lone = Graph::new("Lone");
        lone.add_state(State::new("Only")).unwrap();
        registry.register(lone).unwrap();
        let rendered = render(
            &registry,
            &DotOptions {
                separate: true,
                styled: false,
                splines: None,
            },
        );
        assert!(rendered.contains("digraph Lone {"));
        assert!(rendered.contains("  Only;"));
        assert!(!rendered.contains("->"));
    }
}
