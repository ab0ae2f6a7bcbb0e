//! asmlint-util - Foundation types for the analyzer pipeline.
//!
//! This crate holds everything the lexer, parser, and semantic analyzer
//! share but none of them own:
//!
//! - [`Span`] and the [`SourceMap`]: byte-range source locations, addressed
//!   globally across all loaded files, with line/column lookup for
//!   diagnostic rendering.
//! - [`Diagnostic`] and the [`Handler`]: structured error/warning values
//!   (labelled spans, notes, help) and the collecting sink they accumulate
//!   in. The handler also owns the per-line panic flag that bounds output
//!   to one diagnostic per malformed source line.
//! - [`ErrorCode`]: the closed enumeration every diagnostic is tagged with.
//! - [`ErrorReported`]: a zero-sized proof that a diagnostic has already
//!   been pushed to the sink. Phase code returns
//!   `Result<T, ErrorReported>` instead of carrying diagnostics around.

pub mod diagnostic;
pub mod error;
pub mod span;

pub use diagnostic::{Diagnostic, ErrorCode, Handler, Label, Level};
pub use error::{ErrorReported, SourceError};
pub use span::{SourceFile, SourceMap, Span, SyntaxContext};
