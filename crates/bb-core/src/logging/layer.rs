//! Tracing layer that writes one JSON object per event.
//!
//! Correlation fields (`run_id`, `host_id`, `stage`) are taken from the
//! event itself first, then from enclosing spans.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

const CONTEXT_FIELDS: [&str; 3] = ["run_id", "host_id", "stage"];

/// Correlation fields recorded on a span.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    run_id: Option<String>,
    host_id: Option<String>,
    stage: Option<String>,
}

impl SpanContext {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "run_id" => self.run_id = Some(value),
            "host_id" => self.host_id = Some(value),
            "stage" => self.stage = Some(value),
            _ => {}
        }
    }

    fn fill_from(&mut self, other: &SpanContext) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&other.run_id);
        }
        if self.host_id.is_none() {
            self.host_id.clone_from(&other.host_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&other.stage);
        }
    }
}

impl Visit for SpanContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.set(field.name(), format!("{:?}", value));
    }
}

/// Collects the message, correlation fields and everything else.
#[derive(Default)]
struct JsonFieldVisitor {
    context: SpanContext,
    fields: Map<String, Value>,
    message: Option<String>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn insert_text(&mut self, field: &Field, text: String) {
        let name = field.name();
        if name == "message" {
            self.message = Some(text);
        } else if CONTEXT_FIELDS.contains(&name) {
            self.context.set(name, text);
        } else {
            self.insert(field, Value::String(text));
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert_text(field, format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // JSON has no NaN or infinity
        match serde_json::Number::from_f64(value) {
            Some(n) => self.insert(field, Value::Number(n)),
            None => self.insert(field, Value::String(value.to_string())),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

/// JSONL layer; writes to stderr unless given another writer.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = SpanContext::default();
        attrs.record(&mut context);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut context = visitor.context;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(span_ctx) = span.extensions().get::<SpanContext>() {
                    context.fill_from(span_ctx);
                }
            }
        }

        let level: Level = (*event.metadata().level()).into();
        let mut obj = Map::new();
        obj.insert("ts".to_string(), json!(ts.to_rfc3339()));
        obj.insert("level".to_string(), json!(level));
        obj.insert("event".to_string(), json!(event.metadata().target()));
        if let Some(id) = context.run_id {
            obj.insert("run_id".to_string(), json!(id));
        }
        if let Some(id) = context.host_id {
            obj.insert("host_id".to_string(), json!(id));
        }
        if let Some(stage) = context.stage {
            obj.insert("stage".to_string(), json!(stage));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), json!(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let line = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = JsonlLayer::new(BufWriter(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        let output = buffer.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_basic_event() {
        let lines = capture(|| {
            tracing::info!(target: "run.started", message = "starting");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["event"], "run.started");
        assert_eq!(lines[0]["message"], "starting");
        assert!(lines[0]["ts"].is_string());
        assert!(lines[0].get("fields").is_none());
    }

    #[test]
    fn test_context_fields_are_lifted() {
        let lines = capture(|| {
            tracing::warn!(
                target: "drift.backend_failed",
                run_id = "bb-run",
                stage = %"drift",
                backend = "mmd",
                elapsed_ms = 12u64,
                "backend failed"
            );
        });
        assert_eq!(lines[0]["run_id"], "bb-run");
        assert_eq!(lines[0]["stage"], "drift");
        assert_eq!(lines[0]["fields"]["backend"], "mmd");
        assert_eq!(lines[0]["fields"]["elapsed_ms"], 12);
        assert!(lines[0]["fields"].get("run_id").is_none());
    }

    #[test]
    fn test_span_context_is_inherited() {
        let lines = capture(|| {
            let span = tracing::info_span!("run", run_id = "bb-span", host_id = "host-1");
            let _guard = span.enter();
            tracing::info!(stage = "load", rows = 10u64, "loaded");
        });
        assert_eq!(lines[0]["run_id"], "bb-span");
        assert_eq!(lines[0]["host_id"], "host-1");
        assert_eq!(lines[0]["stage"], "load");
    }

    #[test]
    fn test_non_finite_float_kept_as_text() {
        let lines = capture(|| {
            tracing::info!(score = f64::NAN, ok = true, "scored");
        });
        assert_eq!(lines[0]["fields"]["score"], "NaN");
        assert_eq!(lines[0]["fields"]["ok"], true);
    }
}
