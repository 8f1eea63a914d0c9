// SPDX-License-Identifier: MIT OR Apache-2.0
//! errtree
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Hierarchical error taxonomies. A [`Taxonomy`] declares the error kinds an
//! application uses; root contexts, nested subcontexts and features form an
//! immutable tree beneath it; invoking a [`FeatureHandle`] yields a
//! [`ScopedError`] whose message carries the full path, e.g.
//! `Checkout/Cart/AddItem: quantity must be positive`.
//!
//! A constructed error can be raised (returned as `Err`), reported to the
//! taxonomy's [`ReportSink`], both, or neither. Reporting merges metadata
//! with this precedence, lowest first: taxonomy base metadata, root context,
//! subcontexts in nesting order, feature, construction-time extras, and
//! call-time extras.
//!
//! ```
//! use errtree::{ErrorExtras, KindDeclaration, Metadata, Taxonomy, TaxonomyOptions};
//! use errtree_telemetry::CollectingSink;
//!
//! let sink = CollectingSink::new();
//! let taxonomy = Taxonomy::new(
//!     [KindDeclaration::new("NetworkError").with_suffix(|cause| format!(" ({cause})"))],
//!     TaxonomyOptions::new()
//!         .on_report(sink.clone())
//!         .base_metadata(Metadata::new().with("service", "billing")),
//! );
//!
//! let send = taxonomy.create("Billing").subcontext("Invoices").feature("Send");
//! let err = send.error_with(
//!     "NetworkError",
//!     "upstream refused",
//!     ErrorExtras::new().cause_message("connection reset"),
//! );
//! assert_eq!(err.message(), "Billing/Invoices/Send: upstream refused (connection reset)");
//!
//! err.report_with(&Metadata::new().with("attempt", 3));
//! let report = sink.last().unwrap();
//! assert_eq!(report.metadata["service"], "billing");
//! assert_eq!(report.metadata["attempt"], 3);
//! ```

mod context;
mod feature;
mod kind;
mod taxonomy;

pub use context::{ContextNode, PATH_SEPARATOR};
pub use feature::{ErrorExtras, FeatureHandle, compose_message};
pub use kind::{KindDeclaration, SuffixBuilder};
pub use taxonomy::{Taxonomy, TaxonomyOptions, create_taxonomy};

pub use errtree_error::{
    Cause, CauseMessage, Identity, Metadata, MetadataError, ReportSink, ScopedError,
    UNKNOWN_KIND_LABEL, as_scoped_error, find_scoped_error, is_scoped_error,
};
