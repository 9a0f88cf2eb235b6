//! Compile-time typestate graphs.
//!
//! Declare a finite-state machine once, get a family of zero-cost nominal
//! state types, and have every state-changing function checked against the
//! declared graph while it compiles. Nothing is tracked at runtime: the
//! graph, the registry, and the validation all evaporate after type
//! checking, leaving only unit structs and static metadata behind.
//!
//! ```ignore
//! use typestate::{transition, typestate};
//!
//! typestate! {
//!     name: File,
//!     states: [Closed, Open],
//!     initial: Closed,
//!     transitions: {
//!         Closed -> Open,
//!         Open -> Closed,
//!     },
//! }
//!
//! #[transition]
//! fn open(file: Closed) -> Open {
//!     let _ = file;
//!     Open
//! }
//!
//! // fn reopen(file: Open) -> Open { .. } under #[transition] would fail
//! // to compile: `Open -> Open` is not in the graph.
//! ```
//!
//! Branching transitions (`Pending -> Approved | Declined as Outcome`)
//! expand to a tagged sum with one injector per destination; wildcard
//! transitions (`* -> Stopped`) admit every non-initial, non-terminal
//! state as a source; bridges (`Done -> Other::Start`) authorise
//! transitions into a different graph. Graphs are sealed by default —
//! declare `is_sealed = false` to allow a later block to extend one.

pub mod core {
    pub use typestate_core::*;
}

pub use typestate_core::{
    BridgeDefinition, Discriminant, GraphDefinition, TransitionDefinition, Typestate,
};
pub use typestate_macro::{not_a_transition, transition, typestate};
