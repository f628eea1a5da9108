//! Test helpers.
//!
//! Captures `tracing` output as JSON objects so tests can assert on the
//! fields the tracing bridges emit.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` under a scoped subscriber and returns every event it emitted,
/// one flattened JSON object per event.
pub(crate) fn capture_events<R>(f: impl FnOnce() -> R) -> (R, Vec<serde_json::Value>) {
    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(buffer.clone()),
    );
    let result = tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().clone();
    let events = String::from_utf8_lossy(&bytes)
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    (result, events)
}

/// Returns only the events emitted with `target`.
pub(crate) fn events_for<'a>(
    events: &'a [serde_json::Value],
    target: &'a str,
) -> impl Iterator<Item = &'a serde_json::Value> + 'a {
    events.iter().filter(move |e| e["target"] == target)
}
