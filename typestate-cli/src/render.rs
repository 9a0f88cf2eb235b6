//! The `codegen` command: a textual preview of the generated artifacts.
//!
//! Renders, for every registered graph, what the macro would emit — state
//! types, discriminator enum, union type, introspection impls, and branch
//! sums — as plain Rust text. The preview reflects the merged view of each
//! graph.

use std::fmt::Write;

use typestate_core::{Graph, Registry, TypestateError};

pub fn render(registry: &Registry) -> Result<String, TypestateError> {
    let mut out = String::new();
    for graph in registry.graphs() {
        if graph.states.is_empty() {
            return Err(TypestateError::EmptyGraph {
                graph: graph.name.clone(),
            });
        }
        render_graph(&mut out, graph);
    }
    Ok(out)
}

fn value_derive(graph: &Graph) -> &'static str {
    if graph.consume_on_transition {
        "#[derive(Debug, PartialEq, Eq)]"
    } else {
        "#[derive(Debug, Clone, Copy, PartialEq, Eq)]"
    }
}

fn render_graph(out: &mut String, graph: &Graph) {
    let name = &graph.name;
    let derive = value_derive(graph);

    let _ = writeln!(out, "// ===== typestate {name} =====");
    let _ = writeln!(out);

    for state in graph.state_names() {
        let _ = writeln!(out, "{derive}");
        let _ = writeln!(out, "pub struct {state};");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    let _ = writeln!(out, "pub enum {name}State {{");
    for state in graph.state_names() {
        let _ = writeln!(out, "    {state},");
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let _ = writeln!(out, "{derive}");
    let _ = writeln!(out, "pub enum {name}States {{");
    for state in graph.state_names() {
        let _ = writeln!(out, "    {state}({state}),");
    }
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    for state in graph.state_names() {
        let _ = writeln!(out, "impl Typestate for {state} {{");
        let _ = writeln!(out, "    type Discriminant = {name}State;");
        let _ = writeln!(out, "    const STATE_NAME: &'static str = \"{state}\";");
        let _ = writeln!(
            out,
            "    fn discriminant(&self) -> {name}State {{ {name}State::{state} }}"
        );
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
    }

    for transition in &graph.transitions {
        let Some(branch) = &transition.branch else {
            continue;
        };
        let _ = writeln!(out, "{derive}");
        let _ = writeln!(out, "pub enum {branch} {{");
        for dest in &transition.to {
            let _ = writeln!(out, "    {dest}({dest}),");
        }
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);
        for dest in &transition.to {
            let _ = writeln!(out, "impl From<{dest}> for {branch} {{ /* injector */ }}");
        }
        let _ = writeln!(out);
    }
}
