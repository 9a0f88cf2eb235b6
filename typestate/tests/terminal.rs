use typestate::{Typestate, transition, typestate};

typestate! {
    name: Connection,
    states: [Disconnected, Connected, Closed],
    initial: Disconnected,
    terminal: Closed,
    transitions: {
        Disconnected -> Connected,
        Connected -> Closed,
    },
}

#[transition]
fn connect(link: Disconnected) -> Connected {
    let _ = link;
    Connected
}

#[transition]
fn shut_down(link: Connected) -> Closed {
    let _ = link;
    Closed
}

#[test]
fn reaches_the_terminal_state() {
    let link = Disconnected;
    let link = connect(link);
    let closed = shut_down(link);
    assert_eq!(closed.discriminant(), ConnectionState::Closed);
}

#[test]
fn definition_records_initial_and_terminal() {
    let def = ConnectionState::DEFINITION;
    assert_eq!(def.initial, Some("Disconnected"));
    assert_eq!(def.terminal, Some("Closed"));
    // No declared edge leaves the terminal state.
    assert!(def.transitions.iter().all(|t| t.from != "Closed"));
    assert!(def.valid_destinations("Closed").is_empty());
}
