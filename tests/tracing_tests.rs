// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests verifying tracing output from taxonomy creation,
//! report dispatch and the default sink.

use std::sync::{Arc, Mutex};

use errtree::{ErrorExtras, KindDeclaration, Metadata, Taxonomy, TaxonomyOptions};
use errtree_config::{KindEntry, TaxonomyConfig};
use errtree_telemetry::CollectingSink;
use serde_json::json;

// ---------------------------------------------------------------------------
// Shared log-capture infrastructure
// ---------------------------------------------------------------------------

/// Thread-safe buffer that captures tracing output.
#[derive(Clone, Default)]
struct LogBuf(Arc<Mutex<Vec<u8>>>);

impl LogBuf {
    fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl std::io::Write for LogBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuf {
    type Writer = LogBuf;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a tracing subscriber that captures all output into a [`LogBuf`].
/// Returns the buffer and a guard that must be held for the test duration.
fn setup_tracing() -> (LogBuf, tracing::subscriber::DefaultGuard) {
    let buf = LogBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}

fn network_taxonomy(options: TaxonomyOptions) -> Taxonomy {
    Taxonomy::new(
        [KindDeclaration::new("NetworkError").with_suffix(|c| format!(" (caused by: {c})"))],
        options,
    )
}

// ---------------------------------------------------------------------------
// Default sink
// ---------------------------------------------------------------------------

#[test]
fn default_sink_logs_error_with_message_and_fields() {
    let (buf, _guard) = setup_tracing();
    let err = network_taxonomy(TaxonomyOptions::new())
        .create_with("Billing", Metadata::new().with("tenant", "acme"))
        .subcontext("Invoices")
        .feature("Send")
        .error_with(
            "NetworkError",
            "upstream refused",
            ErrorExtras::new().cause_message("connection reset"),
        );
    err.report();

    let out = buf.contents();
    assert!(out.contains("ERROR"), "{out}");
    assert!(out.contains("errtree.emit"), "{out}");
    assert!(
        out.contains("Billing/Invoices/Send: upstream refused (caused by: connection reset)"),
        "{out}"
    );
    assert!(out.contains("NetworkError"), "{out}");
    assert!(out.contains("tenant"), "{out}");
    assert!(out.contains("acme"), "{out}");
}

#[test]
fn construction_and_raise_log_nothing_at_error_level() {
    let (buf, _guard) = setup_tracing();
    let feature = network_taxonomy(TaxonomyOptions::new())
        .create("Ctx")
        .feature("F");
    let _ = feature.error("NetworkError", "quiet");
    let _: Result<(), _> = feature.fail("NetworkError", "quiet");
    assert!(!buf.contains("ERROR"));
    assert!(!buf.contains("errtree.emit"));
}

#[test]
fn each_report_emits_once() {
    let (buf, _guard) = setup_tracing();
    let err = network_taxonomy(TaxonomyOptions::new())
        .create("Ctx")
        .feature("F")
        .error("NetworkError", "twice");
    err.report();
    err.report();
    assert_eq!(buf.contents().matches("Ctx/F: twice").count(), 2);
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

#[test]
fn taxonomy_and_root_creation_log_at_debug() {
    let (buf, _guard) = setup_tracing();
    let taxonomy = network_taxonomy(TaxonomyOptions::new().on_report(CollectingSink::new()));
    let _root = taxonomy.create("Orders");
    let out = buf.contents();
    assert!(out.contains("taxonomy created"), "{out}");
    assert!(out.contains("root context created"), "{out}");
    assert!(out.contains("Orders"), "{out}");
    assert!(out.contains("collecting"), "{out}");
}

#[test]
fn dispatch_is_traced_with_sink_name() {
    let (buf, _guard) = setup_tracing();
    network_taxonomy(TaxonomyOptions::new().on_report(CollectingSink::new()))
        .create("Ctx")
        .feature("F")
        .error("NetworkError", "m")
        .report();
    let out = buf.contents();
    assert!(out.contains("TRACE"), "{out}");
    assert!(out.contains("errtree.report"), "{out}");
    assert!(out.contains("dispatching report"), "{out}");
}

#[test]
fn config_warnings_are_logged() {
    let (buf, _guard) = setup_tracing();
    let config = TaxonomyConfig {
        kinds: vec![KindEntry::new("Net"), KindEntry::new("Net")],
        ..Default::default()
    };
    let taxonomy = Taxonomy::from_config(&config, None).unwrap();
    assert_eq!(taxonomy.kinds().len(), 2);
    let out = buf.contents();
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("errtree.taxonomy"), "{out}");
    assert!(out.contains("declared more than once"), "{out}");
}

// ---------------------------------------------------------------------------
// Metadata coercion
// ---------------------------------------------------------------------------

#[test]
fn non_object_metadata_is_coerced_with_warning() {
    let (buf, _guard) = setup_tracing();
    let md = Metadata::from_value(json!([1, 2, 3]));
    assert!(md.is_empty());
    let out = buf.contents();
    assert!(out.contains("errtree.metadata"), "{out}");
    assert!(out.contains("non-object metadata coerced to empty"), "{out}");
}

#[test]
fn null_metadata_is_coerced_silently() {
    let (buf, _guard) = setup_tracing();
    let md = Metadata::from_value(serde_json::Value::Null);
    assert!(md.is_empty());
    assert!(!buf.contains("errtree.metadata"));
}
