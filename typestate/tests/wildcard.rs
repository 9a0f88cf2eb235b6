use typestate::{transition, typestate};

typestate! {
    name: App,
    states: [Running, Paused, Stopped],
    transitions: {
        Running -> Paused,
        Paused -> Running,
        * -> Stopped,
    },
}

#[transition]
fn suspend(app: Running) -> Paused {
    let _ = app;
    Paused
}

#[transition]
fn resume(app: Paused) -> Running {
    let _ = app;
    Running
}

// Both of these ride the wildcard edge.
#[transition]
fn stop_running(app: Running) -> Stopped {
    let _ = app;
    Stopped
}

#[transition]
fn stop_paused(app: Paused) -> Stopped {
    let _ = app;
    Stopped
}

#[test]
fn wildcard_admits_every_eligible_source() {
    let app = Running;
    let app = suspend(app);
    let app = resume(app);
    let _stopped = stop_running(app);

    let def = AppState::DEFINITION;
    assert!(def.has_transition("Running", "Stopped"));
    assert!(def.has_transition("Paused", "Stopped"));
}

#[test]
fn wildcard_is_stored_unexpanded() {
    let def = AppState::DEFINITION;
    let wildcard = def
        .transitions
        .iter()
        .find(|t| t.wildcard)
        .expect("the declaration has a wildcard transition");
    assert_eq!(wildcard.from, "*");
    assert_eq!(wildcard.to, ["Stopped"]);
}
