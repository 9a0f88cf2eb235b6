use typestate::{transition, typestate};

typestate! {
    name: AuthFlow,
    states: [Anonymous, Authenticated],
    transitions: {
        Anonymous -> Authenticated,
    },
    bridges: {
        Authenticated -> Session::Active,
    },
}

typestate! {
    name: Session,
    states: [Active, Expired],
    transitions: {
        Active -> Expired,
    },
}

#[transition]
fn log_in(visitor: Anonymous) -> Authenticated {
    let _ = visitor;
    Authenticated
}

// Crosses from AuthFlow into Session over the declared bridge.
#[transition]
fn establish(user: Authenticated) -> Active {
    let _ = user;
    Active
}

#[transition]
fn expire(session: Active) -> Expired {
    let _ = session;
    Expired
}

#[test]
fn bridged_transitions_cross_graphs() {
    let visitor = Anonymous;
    let user = log_in(visitor);
    let session = establish(user);
    let _expired = expire(session);
}

#[test]
fn definition_records_the_bridge() {
    let def = AuthFlowState::DEFINITION;
    assert_eq!(def.bridges.len(), 1);
    let bridge = &def.bridges[0];
    assert_eq!(bridge.from, "Authenticated");
    assert_eq!(bridge.graph, "Session");
    assert_eq!(bridge.state, "Active");
    assert!(!bridge.wildcard);
}
