// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error values for context-tree taxonomies.
//!
//! Every [`ScopedError`] carries a kind [`Identity`], a composed
//! human-readable message, an optional cause, and [`Metadata`] layered from
//! the scopes it was raised in. Errors are handed to a [`ReportSink`] on
//! demand; construction itself has no side effects.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod identity;
mod metadata;

pub use error::{Cause, CauseMessage, ReportSink, ScopedError, ScopedErrorParts};
pub use identity::{Identity, KindSlot, TaxonomyToken, UNKNOWN_KIND_LABEL};
pub use metadata::{Metadata, MetadataError};

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Whether `value` is an error produced by a feature handle.
///
/// Recognised shapes: a bare [`ScopedError`], `Box<ScopedError>`,
/// `Arc<ScopedError>`, and a [`ScopedError`] behind `Box<dyn Error>`,
/// `Box<dyn Error + Send + Sync>` or a shared [`Cause`]. Wrappers that hide
/// the error in their source chain, such as `anyhow::Error`, are not
/// inspected; use [`find_scoped_error`] on them instead.
pub fn is_scoped_error(value: &dyn Any) -> bool {
    if value.is::<ScopedError>()
        || value.is::<Box<ScopedError>>()
        || value.is::<Arc<ScopedError>>()
    {
        return true;
    }
    if let Some(boxed) = value.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return boxed.is::<ScopedError>();
    }
    if let Some(boxed) = value.downcast_ref::<Box<dyn Error>>() {
        return boxed.is::<ScopedError>();
    }
    if let Some(shared) = value.downcast_ref::<Cause>() {
        return shared.is::<ScopedError>();
    }
    false
}

/// Downcast an error trait object to a [`ScopedError`].
pub fn as_scoped_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ScopedError> {
    err.downcast_ref::<ScopedError>()
}

/// Walk `err` and its `source()` chain, returning the first [`ScopedError`].
pub fn find_scoped_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ScopedError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(scoped) = e.downcast_ref::<ScopedError>() {
            return Some(scoped);
        }
        current = e.source();
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
