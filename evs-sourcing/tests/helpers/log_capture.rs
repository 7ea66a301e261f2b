//! Tracing capture for assertions on emitted events
//!
//! Each event is flattened to one line: `LEVEL message key=value ...`, so a
//! test can match on the message or on a structured field.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Panic unless some captured line contains `pattern`
    pub fn assert_contains(&self, pattern: &str) {
        let lines = self.lines();
        assert!(
            lines.iter().any(|l| l.contains(pattern)),
            "no captured event contains '{}'; captured:\n{}",
            pattern,
            lines.join("\n")
        );
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<String>,
}

impl LineVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("{} {}", event.metadata().level(), visitor.message);
        for field in visitor.fields {
            line.push(' ');
            line.push_str(&field);
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

/// Install the capturing subscriber once per test binary
///
/// Every caller shares one capture, so assert on patterns unique to the test.
pub fn init_test_logging() -> LogCapture {
    static CAPTURE: OnceLock<LogCapture> = OnceLock::new();

    CAPTURE
        .get_or_init(|| {
            let capture = LogCapture::default();
            let _ = tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "evs_sourcing=debug".into()),
                )
                .with(capture.clone())
                .try_init();
            capture
        })
        .clone()
}
