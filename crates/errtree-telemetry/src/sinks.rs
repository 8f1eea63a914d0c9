// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in [`ReportSink`] implementations.

use errtree_error::{Metadata, ReportSink, ScopedError};
use std::sync::{Arc, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Default sink: logs each report via `tracing::error!` on target
/// `errtree.emit`.
///
/// Never participates in control flow. Metadata is rendered as a JSON object
/// string so it survives any subscriber format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, error: &ScopedError, metadata: &Metadata) {
        let metadata_json = serde_json::to_string(metadata).unwrap_or_default();
        let cause = error.original_error().map(ToString::to_string);
        tracing::error!(
            target: "errtree.emit",
            kind = error.name(),
            root = error.root_context(),
            path = error.contexts_chunk(),
            feature = error.feature(),
            metadata = %metadata_json,
            cause = ?cause,
            "{}",
            error.message()
        );
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ReportSink for NoopSink {
    fn report(&self, _error: &ScopedError, _metadata: &Metadata) {}

    fn name(&self) -> &str {
        "noop"
    }
}

// ---------------------------------------------------------------------------
// CollectingSink
// ---------------------------------------------------------------------------

/// One recorded report.
#[derive(Debug, Clone)]
pub struct Report {
    /// The reported error.
    pub error: ScopedError,
    /// Merged metadata handed to the sink.
    pub metadata: Metadata,
}

/// Thread-safe in-memory sink.
///
/// Clones share storage, so keep one handle and pass another to the
/// taxonomy.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    inner: Arc<Mutex<Vec<Report>>>,
}

impl CollectingSink {
    /// Create a new, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking sink user must not wedge later reports.
    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All reports recorded so far, oldest first.
    pub fn reports(&self) -> Vec<Report> {
        self.lock().clone()
    }

    /// The most recent report.
    pub fn last(&self) -> Option<Report> {
        self.lock().last().cloned()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of reports recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for CollectingSink {
    fn report(&self, error: &ScopedError, metadata: &Metadata) {
        self.lock().push(Report {
            error: error.clone(),
            metadata: metadata.clone(),
        });
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

// ---------------------------------------------------------------------------
// FanoutSink
// ---------------------------------------------------------------------------

/// Forwards each report to every registered sink, in registration order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl FanoutSink {
    /// Create an empty fanout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FanoutSink::push`].
    #[must_use]
    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.push(Arc::new(sink));
        self
    }

    /// Append a sink.
    pub fn push(&mut self, sink: Arc<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    /// Number of downstream sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no downstream sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of downstream sinks, in order.
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl ReportSink for FanoutSink {
    fn report(&self, error: &ScopedError, metadata: &Metadata) {
        for sink in &self.sinks {
            sink.report(error, metadata);
        }
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
