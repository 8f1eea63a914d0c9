// SPDX-License-Identifier: MIT OR Apache-2.0
//! Feature handles: the leaves that construct errors.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use errtree_error::{Cause, CauseMessage, Identity, Metadata, ScopedError, ScopedErrorParts};

use crate::context::PATH_SEPARATOR;
use crate::taxonomy::RootState;

// ---------------------------------------------------------------------------
// ErrorExtras
// ---------------------------------------------------------------------------

/// Optional inputs to error construction.
#[derive(Clone, Default)]
pub struct ErrorExtras {
    original_error: Option<Cause>,
    metadata: Option<Metadata>,
}

impl ErrorExtras {
    /// No cause, no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an original cause.
    #[must_use]
    pub fn cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.original_error = Some(Arc::new(cause));
        self
    }

    /// Wrap an already shared cause, e.g. one taken from another error.
    #[must_use]
    pub fn cause_arc(mut self, cause: Cause) -> Self {
        self.original_error = Some(cause);
        self
    }

    /// Wrap a plain-text cause.
    #[must_use]
    pub fn cause_message(self, message: impl Into<String>) -> Self {
        self.cause(CauseMessage::new(message))
    }

    /// Construction-time metadata, stored on the error verbatim.
    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl fmt::Debug for ErrorExtras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorExtras")
            .field(
                "original_error",
                &self.original_error.as_ref().map(ToString::to_string),
            )
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FeatureHandle
// ---------------------------------------------------------------------------

/// Leaf of a context tree. Each call builds a fresh [`ScopedError`].
///
/// Construction is pure: nothing is logged, raised or reported until the
/// caller asks for it.
#[derive(Clone)]
pub struct FeatureHandle {
    root: Arc<RootState>,
    contexts_chunk: Arc<str>,
    name: Arc<str>,
    metadata: Arc<Metadata>,
}

impl FeatureHandle {
    pub(crate) fn new(
        root: Arc<RootState>,
        contexts_chunk: Arc<str>,
        name: Arc<str>,
        metadata: Arc<Metadata>,
    ) -> Self {
        Self {
            root,
            contexts_chunk,
            name,
            metadata,
        }
    }

    /// Build an error of `kind` with no cause and no metadata.
    pub fn error(&self, kind: &str, message: impl Into<String>) -> ScopedError {
        self.error_with(kind, message, ErrorExtras::default())
    }

    /// Build an error of `kind`.
    ///
    /// Undeclared kinds resolve to `UnknownError`. The kind's suffix builder
    /// runs only when `extras` carries a cause.
    pub fn error_with(
        &self,
        kind: &str,
        message: impl Into<String>,
        extras: ErrorExtras,
    ) -> ScopedError {
        let (identity, suffix_builder) = self.root.resolve(kind);
        let suffix = match (&extras.original_error, suffix_builder) {
            (Some(cause), Some(build)) => build(&**cause),
            _ => String::new(),
        };
        let message: String = message.into();
        let message = compose_message(&self.contexts_chunk, &self.name, &message, &suffix);
        ScopedError::from_parts(ScopedErrorParts {
            identity: identity.clone(),
            root_context: Arc::clone(&self.root.name),
            contexts_chunk: Arc::clone(&self.contexts_chunk),
            feature: Arc::clone(&self.name),
            message,
            original_error: extras.original_error,
            extended_params: extras.metadata,
            feature_metadata: Arc::clone(&self.metadata),
            sink: Arc::clone(&self.root.sink),
        })
    }

    /// Build an error and raise it immediately.
    ///
    /// # Errors
    ///
    /// Always returns the constructed error.
    pub fn fail<T>(&self, kind: &str, message: impl Into<String>) -> Result<T, ScopedError> {
        self.error(kind, message).raise()
    }

    /// [`FeatureHandle::fail`] with extras.
    ///
    /// # Errors
    ///
    /// Always returns the constructed error.
    pub fn fail_with<T>(
        &self,
        kind: &str,
        message: impl Into<String>,
        extras: ErrorExtras,
    ) -> Result<T, ScopedError> {
        self.error_with(kind, message, extras).raise()
    }

    /// Identity `kind` resolves to under this feature's root.
    pub fn resolve(&self, kind: &str) -> &Identity {
        self.root.resolve(kind).0
    }

    /// Feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the owning context.
    pub fn contexts_chunk(&self) -> &str {
        &self.contexts_chunk
    }

    /// Owning context's metadata with this feature's applied on top.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl fmt::Debug for FeatureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureHandle")
            .field("contexts_chunk", &self.contexts_chunk)
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// `contexts/feature: message` followed by `suffix`.
pub fn compose_message(
    contexts_chunk: &str,
    feature: &str,
    message: &str,
    suffix: &str,
) -> String {
    format!("{contexts_chunk}{PATH_SEPARATOR}{feature}: {message}{suffix}")
}
