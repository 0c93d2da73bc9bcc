//! The seam between background tasks and the UI thread.

use super::events::UserEvent;
use tao::event_loop::EventLoopProxy;

/// Delivers `UserEvent`s to whoever renders them.
///
/// Tasks never wait for the UI, so sending cannot fail from the caller's
/// point of view. Tests plug in a channel instead of the event loop.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

impl EventProxy for EventLoopProxy<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // Fails only once the event loop is gone, i.e. while the window closes.
        if let Err(e) = EventLoopProxy::send_event(self, event) {
            tracing::debug!("Dropping event after event loop shutdown: {}", e);
        }
    }
}
