// SPDX-License-Identifier: MIT OR Apache-2.0
//! The concrete error value and its report sink seam.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::{Identity, Metadata};

/// Shared, type-erased original cause.
pub type Cause = Arc<dyn Error + Send + Sync>;

// ---------------------------------------------------------------------------
// ReportSink
// ---------------------------------------------------------------------------

/// Destination for reported errors.
///
/// Implementations receive the error together with its fully merged
/// metadata. A sink must not panic; whatever blocking or buffering it does is
/// its own business.
pub trait ReportSink: Send + Sync {
    /// Handle one report.
    fn report(&self, error: &ScopedError, metadata: &Metadata);

    /// Human-readable name for this sink (used in diagnostics).
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ReportSink for F
where
    F: Fn(&ScopedError, &Metadata) + Send + Sync,
{
    fn report(&self, error: &ScopedError, metadata: &Metadata) {
        self(error, metadata);
    }
}

// ---------------------------------------------------------------------------
// CauseMessage
// ---------------------------------------------------------------------------

/// A plain-text cause, for wrapping failures that are not `Error` values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CauseMessage(pub String);

impl CauseMessage {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ---------------------------------------------------------------------------
// ScopedError
// ---------------------------------------------------------------------------

/// Fields needed to assemble a [`ScopedError`].
///
/// The message must already be composed; no further formatting happens.
pub struct ScopedErrorParts {
    /// Resolved kind identity.
    pub identity: Identity,
    /// Name of the root context.
    pub root_context: Arc<str>,
    /// Context path, segments joined by `/`.
    pub contexts_chunk: Arc<str>,
    /// Feature name.
    pub feature: Arc<str>,
    /// Fully composed message.
    pub message: String,
    /// Wrapped original cause, if one was supplied.
    pub original_error: Option<Cause>,
    /// Construction-time metadata, stored verbatim.
    pub extended_params: Option<Metadata>,
    /// Context and feature metadata already merged, lowest layers first.
    pub feature_metadata: Arc<Metadata>,
    /// Where reports go.
    pub sink: Arc<dyn ReportSink>,
}

/// An error raised from a feature of a context tree.
///
/// Carries a kind [`Identity`], a composed message of the form
/// `root/sub/feature: message`, an optional cause, and optional
/// construction-time metadata. [`ScopedError::report`] forwards it to the
/// taxonomy's sink without affecting control flow; returning it as `Err`
/// (see [`ScopedError::raise`]) is the raise path. Neither implies the other.
#[derive(Clone)]
pub struct ScopedError {
    identity: Identity,
    root_context: Arc<str>,
    contexts_chunk: Arc<str>,
    feature: Arc<str>,
    message: String,
    original_error: Option<Cause>,
    extended_params: Option<Metadata>,
    feature_metadata: Arc<Metadata>,
    sink: Arc<dyn ReportSink>,
}

impl ScopedError {
    /// Assemble an error from already-resolved parts.
    pub fn from_parts(parts: ScopedErrorParts) -> Self {
        Self {
            identity: parts.identity,
            root_context: parts.root_context,
            contexts_chunk: parts.contexts_chunk,
            feature: parts.feature,
            message: parts.message,
            original_error: parts.original_error,
            extended_params: parts.extended_params,
            feature_metadata: parts.feature_metadata,
            sink: parts.sink,
        }
    }

    /// Kind label, e.g. `"ValidationError"` or `"UnknownError"`.
    pub fn name(&self) -> &str {
        self.identity.label()
    }

    /// The resolved kind identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Composed message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Root context name.
    pub fn root_context(&self) -> &str {
        &self.root_context
    }

    /// Context path (root first, `/`-separated, feature excluded).
    pub fn contexts_chunk(&self) -> &str {
        &self.contexts_chunk
    }

    /// Feature name.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Wrapped original cause.
    pub fn original_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.original_error.as_deref()
    }

    /// Construction-time metadata, exactly as supplied.
    pub fn extended_params(&self) -> Option<&Metadata> {
        self.extended_params.as_ref()
    }

    /// Merged context and feature metadata captured at construction.
    pub fn feature_metadata(&self) -> &Metadata {
        &self.feature_metadata
    }

    /// Whether this error carries `identity`.
    pub fn is(&self, identity: &Identity) -> bool {
        &self.identity == identity
    }

    /// Whether both errors are the same kind under the same root of the same
    /// taxonomy.
    pub fn same_kind(&self, other: &ScopedError) -> bool {
        self.identity == other.identity
    }

    /// Metadata that a report with `extra` would hand to the sink.
    ///
    /// Layers, lowest first: context and feature metadata, construction-time
    /// metadata, then `extra`.
    pub fn report_metadata(&self, extra: Option<&Metadata>) -> Metadata {
        let mut out = Metadata::clone(&self.feature_metadata);
        if let Some(params) = &self.extended_params {
            out.merge(params);
        }
        if let Some(extra) = extra {
            out.merge(extra);
        }
        out
    }

    /// Send this error to the sink with no call-time metadata.
    pub fn report(&self) {
        self.emit(None);
    }

    /// Send this error to the sink with call-time metadata on top.
    pub fn report_with(&self, extra: &Metadata) {
        self.emit(Some(extra));
    }

    /// Send this error to the sink. Every call is an independent dispatch.
    pub fn emit(&self, extra: Option<&Metadata>) {
        let metadata = self.report_metadata(extra);
        tracing::trace!(
            target: "errtree.report",
            kind = %self.identity,
            sink = self.sink.name(),
            keys = metadata.len(),
            "dispatching report"
        );
        self.sink.report(self, &metadata);
    }

    /// Raise: hand this error to `?`/`Err` propagation. Does not report.
    ///
    /// # Errors
    ///
    /// Always returns `Err(self)`.
    pub fn raise<T>(self) -> Result<T, ScopedError> {
        Err(self)
    }
}

impl fmt::Debug for ScopedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ScopedError");
        d.field("name", &self.name());
        d.field("message", &self.message);
        d.field("root_context", &self.root_context);
        d.field("contexts_chunk", &self.contexts_chunk);
        d.field("feature", &self.feature);
        if let Some(ref src) = self.original_error {
            d.field("original_error", &src.to_string());
        }
        if let Some(ref params) = self.extended_params {
            d.field("extended_params", params);
        }
        d.finish()
    }
}

impl fmt::Display for ScopedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ScopedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.original_error
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}
