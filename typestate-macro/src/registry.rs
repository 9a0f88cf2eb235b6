//! Process-wide registry storage for macro invocations.
//!
//! Procedural macros run one at a time inside a single compiler process, but
//! each invocation starts from scratch; the registry therefore lives in a
//! `static` so later declarations and `#[transition]` functions can consult
//! earlier ones within the same compilation. Separate compilation units get
//! separate registries — a bridge into a graph the current unit never
//! declared fails validation with an explicit error.

use std::sync::{LazyLock, Mutex};

use typestate_core::Registry;

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::new()));

/// Runs `f` with exclusive access to the shared registry.
pub fn with<T>(f: impl FnOnce(&mut Registry) -> T) -> T {
    let mut guard = REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}
