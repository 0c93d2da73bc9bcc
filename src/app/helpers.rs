//! Locking and notification helpers shared by commands and tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::generate_ui_state;

/// Locks the shared state.
///
/// A poisoned lock is recovered: every mutation of `AppState` leaves it
/// consistent, so the data is still usable after a panicking holder.
pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends a full `StateUpdate` built from an already locked state.
pub fn notify<P: EventProxy>(state: &AppState, proxy: &P) {
    let ui_state = generate_ui_state(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
}

/// Locks the state, applies `update_fn` and pushes the resulting view to the UI.
pub fn with_state_and_notify<F, P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    update_fn: F,
) where
    F: FnOnce(&mut AppState),
{
    let mut guard = lock_state(state);
    update_fn(&mut guard);
    notify(&guard, proxy);
}
