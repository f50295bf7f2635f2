//! Records tracing events so tests can assert on structured log fields

use std::{collections::BTreeMap, fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{
    field::{Field, Visit},
    subscriber::DefaultGuard,
    Event, Subscriber,
};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    Layer,
};

/// Fields of one event, values rendered as text
pub type EventFields = BTreeMap<String, String>;

/// Layer collecting every event seen by its subscriber
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<EventFields>>>,
}

impl LogCapture {
    /// Installs a capturing subscriber as the default for the current thread
    ///
    /// Events are recorded until the returned guard is dropped.
    #[must_use]
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, tracing::subscriber::set_default(subscriber))
    }

    /// Captured events that carry `field`, in emission order
    #[must_use]
    pub fn events_with(&self, field: &str) -> Vec<EventFields> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.contains_key(field))
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldRecorder::default();
        event.record(&mut visitor);
        self.events.lock().push(visitor.0);
    }
}

#[derive(Default)]
struct FieldRecorder(EventFields);

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_captures_event_fields() {
        let (capture, _guard) = LogCapture::install();

        tracing::info!(message_id = %"m-1", outcome = "delivered", "done");
        tracing::info!("no outcome here");

        let events = capture.events_with("outcome");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["message_id"], "m-1");
        assert_eq!(events[0]["outcome"], "delivered");
        assert_eq!(events[0]["message"], "done");
    }
}
