use criterion::{Criterion, black_box, criterion_group, criterion_main};
use typestate_core::{Graph, Registry, State, Transition, WILDCARD, check_transition};

// ============================================================================
// Graph queries: the validator's hot path during macro expansion
// ============================================================================

fn order_graph() -> Graph {
    let mut graph = Graph::new("Order");
    for state in [
        "Draft",
        "Submitted",
        "Approved",
        "Declined",
        "Packed",
        "Shipped",
        "Delivered",
        "Returned",
        "Archived",
        "Cancelled",
    ] {
        graph.add_state(State::new(state)).unwrap();
    }
    graph
        .add_transition(Transition::new("Draft", vec!["Submitted".into()]))
        .unwrap();
    graph
        .add_transition(Transition::branching(
            "Submitted",
            vec!["Approved".into(), "Declined".into()],
            "Review",
        ))
        .unwrap();
    graph
        .add_transition(Transition::new("Approved", vec!["Packed".into()]))
        .unwrap();
    graph
        .add_transition(Transition::new("Packed", vec!["Shipped".into()]))
        .unwrap();
    graph
        .add_transition(Transition::new("Shipped", vec!["Delivered".into()]))
        .unwrap();
    graph
        .add_transition(Transition::new("Delivered", vec!["Returned".into()]))
        .unwrap();
    graph
        .add_transition(Transition::new("Returned", vec!["Archived".into()]))
        .unwrap();
    graph
        .add_transition(Transition::new(WILDCARD, vec!["Cancelled".into()]))
        .unwrap();
    graph
}

fn benchmark_has_transition(c: &mut Criterion) {
    let graph = order_graph();
    c.bench_function("has_transition_explicit", |b| {
        b.iter(|| black_box(graph.has_transition(black_box("Packed"), black_box("Shipped"))));
    });
    c.bench_function("has_transition_wildcard", |b| {
        b.iter(|| black_box(graph.has_transition(black_box("Delivered"), black_box("Cancelled"))));
    });
}

fn benchmark_valid_destinations(c: &mut Criterion) {
    let graph = order_graph();
    c.bench_function("valid_destinations", |b| {
        b.iter(|| black_box(graph.valid_destinations(black_box("Submitted"))));
    });
}

fn benchmark_check_transition(c: &mut Criterion) {
    let mut registry = Registry::new();
    registry.register(order_graph()).unwrap();
    c.bench_function("check_transition", |b| {
        b.iter(|| black_box(check_transition(&registry, black_box("Shipped"), black_box("Delivered"))));
    });
}

criterion_group!(
    benches,
    benchmark_has_transition,
    benchmark_valid_destinations,
    benchmark_check_transition
);
criterion_main!(benches);
