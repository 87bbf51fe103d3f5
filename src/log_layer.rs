//! Renders tracing events into the external log-line contract:
//! `HH:MM:SS.mmm [port] [epoch_ms] message`. Field values other than the
//! formatted message are appended as `key=value` for anything logged with
//! structured fields, matching the corpus's own visitor-based capture.

use std::fmt::Write as _;
use std::io::Write as IoWrite;
use std::sync::Mutex;

use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::Event;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::identity::now_ms;

#[derive(Default)]
struct MessageVisitor {
    message: String,
    extra: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.extra, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.extra, " {}={:?}", field.name(), value);
        }
    }
}

/// Formats every event that crosses it into one line of the external
/// contract and writes it to `sink`. `port` is fixed per node at
/// construction time.
pub struct GossipLogLayer {
    port: u16,
    sink: Mutex<Box<dyn IoWrite + Send>>,
}

impl GossipLogLayer {
    pub fn new(port: u16, sink: Box<dyn IoWrite + Send>) -> Self {
        Self {
            port,
            sink: Mutex::new(sink),
        }
    }

    pub fn stderr(port: u16) -> Self {
        Self::new(port, Box::new(std::io::stderr()))
    }
}

impl<S> Layer<S> for GossipLogLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let now = Local::now();
        let epoch_ms = now_ms();
        let line = format!(
            "{}.{:03} [{}] [{}] {}{}",
            now.format("%H:%M:%S"),
            epoch_ms % 1000,
            self.port,
            epoch_ms,
            visitor.message,
            visitor.extra,
        );

        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{line}");
        }
    }
}
