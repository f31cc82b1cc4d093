//! Declaration-scoped context bundles from unified diffs.
//!
//! Pipeline: [`diff::parse_diff`] recovers the added line numbers per
//! changed file, [`analysis::analyze`] parses each file into declarations
//! and call sites, and [`context::ContextBuilder`] correlates the two into
//! one annotated text bundle for a downstream reasoning consumer.
//!
//! Fetching diffs and file contents is the caller's concern; the builder
//! only sees a [`context::FileFetcher`].

pub mod analysis;
pub mod context;
pub mod diag;
pub mod diff;

pub use analysis::{analyze, Analysis, AnalyzeError, DeclKind, Declaration};
pub use context::{ContextBuilder, FileFetcher, FnFetcher, FsFetcher};
pub use diag::{DiagEvent, DiagLevel, DiagSink, MemorySink, NullSink, StderrSink};
pub use diff::{parse_diff, ChangedLines};
