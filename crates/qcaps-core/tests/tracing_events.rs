#![forbid(unsafe_code)]
#![cfg(feature = "tracing")]

//! Structured logging integration tests.
//!
//!   cargo test -p qcaps-core --features tracing --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qcaps_core::{CapabilityParser, ParserConfig, parse};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    fields: HashMap<String, String>,
}

#[derive(Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<String>>>,
}

struct CaptureHandle {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<String>>>,
}

impl CaptureHandle {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn spans(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }

    fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}

fn with_captured_events<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let layer = EventCapture::default();
    let handle = CaptureHandle {
        events: layer.events.clone(),
        spans: layer.spans.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

const HELP: &str = "\
QEMU PC emulator version 0.12.3 (qemu-kvm-0.12.3), Copyright (c) 2003-2008 Fabrice Bellard
-drive [file=file][,format=f]
-device driver[,prop[=value][,...]]
";

// ============================================================================
// Events
// ============================================================================

#[test]
fn banner_components_are_logged() {
    let handle = with_captured_events(|| {
        parse(HELP.as_bytes(), Some(b"")).unwrap();
    });

    let banner = handle.with_message("parsed version banner");
    assert_eq!(banner.len(), 1);
    assert_eq!(banner[0].level, Level::DEBUG);
    assert_eq!(banner[0].fields["minor"], "12");
    assert_eq!(banner[0].fields["micro"], "3");
    assert_eq!(banner[0].fields["version"], "12003");

    let kvm = handle.with_message("kvm build detected");
    assert_eq!(kvm.len(), 1);
    assert_eq!(kvm[0].fields["kvm_version"], "0");
}

#[test]
fn each_capability_is_traced_once() {
    let mut result = None;
    let handle = with_captured_events(|| {
        result = Some(parse(HELP.as_bytes(), Some(b"name \"hda-duplex\"\n")).unwrap());
    });
    let result = result.unwrap();

    let traced = handle.with_message("capability detected").len()
        + handle.with_message("device capability detected").len();
    assert_eq!(traced, result.flags.len());
    assert!(
        handle
            .events()
            .iter()
            .filter(|e| e.message.ends_with("capability detected"))
            .all(|e| e.level == Level::TRACE)
    );

    let done = handle.with_message("capability parse complete");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].fields["flag_count"], result.flags.len().to_string());
}

#[test]
fn missing_device_list_warns() {
    let handle = with_captured_events(|| {
        parse(HELP.as_bytes(), None).unwrap();
    });
    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("no device list"));
}

#[test]
fn unexpected_device_list_warns() {
    let handle = with_captured_events(|| {
        parse(b"QEMU PC emulator version 0.10.5\n", Some(b"name \"hda-duplex\"\n")).unwrap();
    });
    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("ignoring"));
}

#[test]
fn clipping_is_logged() {
    let parser = CapabilityParser::with_config(ParserConfig::default().max_input_len(100));
    let handle = with_captured_events(|| {
        let _ = parser.parse(HELP.as_bytes(), None);
    });
    let clipped = handle.with_message("input clipped");
    assert_eq!(clipped.len(), 1);
    assert_eq!(clipped[0].fields["max"], "100");
}

#[test]
fn failed_parse_logs_no_completion() {
    let handle = with_captured_events(|| {
        let _ = parse(b"not an emulator\n", None);
    });
    assert!(handle.with_message("capability parse complete").is_empty());
    assert!(handle.with_message("parsed version banner").is_empty());
}

#[test]
fn parse_runs_inside_a_span() {
    let handle = with_captured_events(|| {
        parse(HELP.as_bytes(), Some(b"")).unwrap();
    });
    assert_eq!(handle.spans(), vec!["parse_help".to_string()]);
}
