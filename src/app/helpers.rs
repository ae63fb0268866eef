//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::SessionState;
use super::view_model::generate_tree_view;

/// Locks the session. A poisoned lock is recovered since every mutation
/// leaves the state consistent before it can panic.
pub fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Locks the `SessionState`, performs a mutation, and on success sends a
/// `SelectionChanged` event carrying the updated tree view.
pub fn with_state_and_notify<F, T, E, P: EventProxy>(
    state: &Mutex<SessionState>,
    proxy: &P,
    update_fn: F,
) -> Result<T, E>
where
    F: FnOnce(&mut SessionState) -> Result<T, E>,
{
    let mut state_guard = lock_state(state);

    let value = update_fn(&mut state_guard)?;

    if let Some(view) = generate_tree_view(&state_guard) {
        proxy.send_event(UserEvent::SelectionChanged(Box::new(view)));
    }
    Ok(value)
}
