//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! A [`Diagnostic`] is a structured message: a severity [`Level`], an
//! [`ErrorCode`] from the closed enumeration, a formatted message, one
//! primary labelled span, any number of secondary labelled spans, and
//! optional note/help strings. Diagnostics accumulate in a [`Handler`]
//! and are rendered once at the end of the run.
//!
//! The handler also owns the per-line *panic flag*: the first error
//! reported on a source line sets it, later errors on the same line are
//! suppressed, and the flag is cleared at every line boundary. One root
//! cause, one message.
//!
//! # Examples
//!
//! ```
//! use asmlint_util::diagnostic::{Diagnostic, ErrorCode, Handler};
//! use asmlint_util::span::Span;
//!
//! let handler = Handler::new();
//! let diag = Diagnostic::error(ErrorCode::UndefinedSymbol, "undefined symbol `foo`")
//!     .with_primary_label(Span::new(4, 7), "");
//! handler.report(diag);
//! assert!(handler.has_errors());
//! ```

mod codes;

pub use codes::ErrorCode;

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::error::ErrorReported;
use crate::span::Span;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A rule violation in the analyzed source
    Error,
    /// Suspicious but legal source
    Warning,
    /// Additional context attached to another diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A labelled span inside a diagnostic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A structured diagnostic message
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity
    pub level: Level,
    /// Stable code identifying the rule
    pub code: ErrorCode,
    /// Main message, already formatted
    pub message: String,
    /// The span the diagnostic is about
    pub primary_label: Option<Label>,
    /// Related spans
    pub secondary_labels: Vec<Label>,
    /// Additional context line
    pub note: Option<String>,
    /// Actionable suggestion
    pub help: Option<String>,
    /// Cancelled diagnostics are skipped by the emitters
    cancelled: bool,
}

impl Diagnostic {
    pub fn new(level: Level, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            primary_label: None,
            secondary_labels: Vec::new(),
            note: None,
            help: None,
            cancelled: false,
        }
    }

    /// Create an error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Level::Error, code, message)
    }

    /// Create a warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, code, message)
    }

    /// Set the primary labelled span
    pub fn with_primary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.primary_label = Some(Label {
            span,
            message: message.into(),
        });
        self
    }

    /// Add a secondary labelled span
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.secondary_labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    /// Attach a note line
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Attach a help line
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Withdraw the diagnostic: emitters will skip it.
    ///
    /// Used when a speculative diagnostic turns out to be superseded by a
    /// more precise one before anything is rendered.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Collecting sink for diagnostics.
///
/// Interior mutability lets every pipeline stage hold a shared reference
/// while pushing into it.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    panic_line: Cell<bool>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a diagnostic unconditionally, without touching the panic flag.
    ///
    /// Used for conditions outside any source line, like a file that
    /// failed to open.
    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Report an error under the per-line panic discipline.
    ///
    /// The first error on a line is recorded and sets the panic flag;
    /// while the flag is set, further reports are dropped. Either way the
    /// caller gets an [`ErrorReported`] proof to propagate with `?`.
    pub fn report(&self, diagnostic: Diagnostic) -> ErrorReported {
        if !self.panic_line.get() {
            self.panic_line.set(true);
            self.diagnostics.borrow_mut().push(diagnostic);
        }
        ErrorReported
    }

    /// Report a warning. Warnings bypass the panic flag and never set it.
    pub fn report_warning(&self, diagnostic: Diagnostic) {
        debug_assert_eq!(diagnostic.level, Level::Warning);
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Is the panic flag set for the current line?
    #[inline]
    pub fn panic_line(&self) -> bool {
        self.panic_line.get()
    }

    /// Clear the panic flag; called at every line boundary
    #[inline]
    pub fn clear_panic_line(&self) {
        self.panic_line.set(false);
    }

    /// Clone of the most recently pushed diagnostic, if any
    pub fn last_diagnostic(&self) -> Option<Diagnostic> {
        self.diagnostics.borrow().last().cloned()
    }

    /// Cancel the most recently pushed diagnostic, if any
    pub fn cancel_last(&self) {
        if let Some(last) = self.diagnostics.borrow_mut().last_mut() {
            last.cancel();
        }
    }

    /// True when any non-cancelled diagnostic has been collected
    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| !d.is_cancelled())
    }

    /// Number of non-cancelled errors
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error && !d.is_cancelled())
            .count()
    }

    /// Number of non-cancelled warnings
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning && !d.is_cancelled())
            .count()
    }

    /// Snapshot of all collected diagnostics, cancelled ones included
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}
