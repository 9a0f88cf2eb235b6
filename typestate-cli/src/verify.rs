//! The `verify` command: replay registration and validation over source.
//!
//! Mirrors what the macro pipeline does during compilation, against a fresh
//! registry: parse every declaration in file order, register it, then check
//! every `#[transition]` function with the shared
//! [`check_transition`](typestate_core::check_transition) and sweep for
//! strict-transitions violations — functions whose first parameter is a
//! state of a `strict_transitions` graph but which carry neither marker.

use std::fmt;

use typestate_core::{Registered, Registry, TypestateError, check_transition};

use crate::parse;
use crate::scan::{self, Marker, ScannedFile, SourceUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One `path:line - severity: message` report line.
pub struct Diagnostic {
    pub label: String,
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

/// The verification report printed to stdout.
pub struct Report {
    pub files_scanned: usize,
    pub transitions_checked: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn errors(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(
                f,
                "{}:{} - {}: {}",
                diagnostic.label, diagnostic.line, diagnostic.severity, diagnostic.message
            )?;
        }
        writeln!(
            f,
            "{} files scanned, {} transitions checked, {} errors, {} warnings",
            self.files_scanned,
            self.transitions_checked,
            self.errors(),
            self.warnings()
        )
    }
}

/// Registers every declaration found in the units, collecting diagnostics
/// instead of stopping. Returns the registry, the scanned files, and the
/// first declaration site of each graph, in registration order.
fn build_registry(
    units: &[SourceUnit],
    diagnostics: &mut Vec<Diagnostic>,
) -> (
    Registry,
    Vec<(String, ScannedFile)>,
    Vec<(String, String, usize)>,
) {
    let mut registry = Registry::new();
    let mut scanned_files = Vec::new();
    let mut decl_sites: Vec<(String, String, usize)> = Vec::new();

    for unit in units {
        let scanned = match scan::scan_unit(unit) {
            Ok(scanned) => scanned,
            Err(err) => {
                diagnostics.push(Diagnostic {
                    label: unit.label.clone(),
                    line: err.span().start().line,
                    severity: Severity::Error,
                    message: format!("parse error: {err}"),
                });
                continue;
            }
        };

        for decl in &scanned.decls {
            let mut graph = match parse::parse_declaration(decl.tokens.clone()) {
                Ok(graph) => graph,
                Err(err) => {
                    let line = match err.span().start().line {
                        0 => decl.line,
                        line => line,
                    };
                    diagnostics.push(Diagnostic {
                        label: unit.label.clone(),
                        line,
                        severity: Severity::Error,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            graph.declared_in = unit.label.clone();
            let graph_name = graph.name.clone();
            match registry.register(graph) {
                Ok(Registered::Fresh) => {
                    tracing::debug!(graph = %graph_name, file = %unit.label, "registered typestate");
                    decl_sites.push((graph_name, unit.label.clone(), decl.line));
                }
                Ok(Registered::Merged) => {
                    tracing::debug!(graph = %graph_name, file = %unit.label, "merged typestate");
                }
                Err(err) => diagnostics.push(Diagnostic {
                    label: unit.label.clone(),
                    line: decl.line,
                    severity: Severity::Error,
                    message: err.to_string(),
                }),
            }
        }

        scanned_files.push((unit.label.clone(), scanned));
    }

    (registry, scanned_files, decl_sites)
}

/// Runs the full verification pass.
pub fn verify(units: &[SourceUnit]) -> Report {
    let mut diagnostics = Vec::new();
    let (registry, scanned_files, decl_sites) = build_registry(units, &mut diagnostics);

    let mut transitions_checked = 0;
    for (label, scanned) in &scanned_files {
        for func in &scanned.fns {
            match func.marker {
                Marker::Transition => {
                    transitions_checked += 1;
                    let Some(source) = &func.source else {
                        diagnostics.push(Diagnostic {
                            label: label.clone(),
                            line: func.line,
                            severity: Severity::Error,
                            message: format!(
                                "transition function `{}` must take a state as its first parameter",
                                func.name
                            ),
                        });
                        continue;
                    };
                    let Some(dest) = &func.dest else {
                        diagnostics.push(Diagnostic {
                            label: label.clone(),
                            line: func.line,
                            severity: Severity::Error,
                            message: format!(
                                "transition function `{}` must declare a destination state return type",
                                func.name
                            ),
                        });
                        continue;
                    };
                    if let Err(err) = check_transition(&registry, source, dest) {
                        diagnostics.push(Diagnostic {
                            label: label.clone(),
                            line: func.line,
                            severity: Severity::Error,
                            message: err.to_string(),
                        });
                    }
                }
                Marker::NotATransition => {
                    if let Some(source) = &func.source {
                        if registry.find_owning(source).is_none() {
                            diagnostics.push(Diagnostic {
                                label: label.clone(),
                                line: func.line,
                                severity: Severity::Error,
                                message: TypestateError::UnregisteredState {
                                    state: source.clone(),
                                }
                                .to_string(),
                            });
                        }
                    }
                }
                Marker::Unmarked => {
                    let Some(source) = &func.source else {
                        continue;
                    };
                    if let Some(graph) = registry.find_owning(source) {
                        if graph.strict_transitions {
                            diagnostics.push(Diagnostic {
                                label: label.clone(),
                                line: func.line,
                                severity: Severity::Error,
                                message: TypestateError::StrictTransitionViolation {
                                    graph: graph.name.clone(),
                                    state: source.clone(),
                                }
                                .to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    for (graph_name, label, line) in &decl_sites {
        let Some(graph) = registry.lookup(graph_name) else {
            continue;
        };
        if let Some(terminal) = &graph.terminal {
            let has_incoming = graph
                .transitions
                .iter()
                .any(|t| t.to.iter().any(|dest| dest == terminal));
            if !has_incoming {
                diagnostics.push(Diagnostic {
                    label: label.clone(),
                    line: *line,
                    severity: Severity::Warning,
                    message: format!(
                        "terminal state `{terminal}` of typestate `{graph_name}` has no incoming transition"
                    ),
                });
            }
        }
    }

    Report {
        files_scanned: units.len(),
        transitions_checked,
        diagnostics,
    }
}

/// Builds a registry for the `dot` and `codegen` commands, failing on the
/// first error instead of reporting.
pub fn collect_registry(units: &[SourceUnit]) -> anyhow::Result<Registry> {
    let mut diagnostics = Vec::new();
    let (registry, _, _) = build_registry(units, &mut diagnostics);
    if let Some(first) = diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
    {
        anyhow::bail!("{}:{} - {}", first.label, first.line, first.message);
    }
    Ok(registry)
}
