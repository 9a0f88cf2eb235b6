use typestate::{transition, typestate};

// With `consume_on_transition = false` the generated state types are
// freely copyable instead of move-only.
typestate! {
    name: Sensor,
    consume_on_transition = false,
    states: [Idle, Measuring],
    transitions: {
        Idle -> Measuring,
        Measuring -> Idle,
    },
}

#[transition]
fn start(sensor: Idle) -> Measuring {
    let _ = sensor;
    Measuring
}

#[test]
fn copyable_states_survive_their_transition() {
    let idle = Idle;
    let kept = idle;
    let measuring = start(idle);
    assert_eq!(kept, Idle);
    assert_eq!(measuring, Measuring);
}

#[test]
fn definition_records_the_ownership_policy() {
    assert!(!SensorState::DEFINITION.consume_on_transition);
}
