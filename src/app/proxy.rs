//! Where session events go.

use std::sync::Arc;

use super::events::UserEvent;
use tokio::sync::mpsc::UnboundedSender;

/// Receives events from commands and background generations.
///
/// Sending never fails from the caller's point of view; a sink that can no
/// longer deliver drops the event.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

impl EventProxy for UnboundedSender<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // A closed receiver only means nobody is listening anymore.
        if let Err(e) = self.send(event) {
            tracing::debug!("Dropping event, receiver is gone: {:?}", e.0);
        }
    }
}

/// A type-erased [`EventProxy`], so queued requests from different callers
/// can each keep their own.
pub type EventSink = Arc<dyn Fn(UserEvent) + Send + Sync>;

pub fn into_sink<P: EventProxy>(proxy: P) -> EventSink {
    Arc::new(move |event| proxy.send_event(event))
}
