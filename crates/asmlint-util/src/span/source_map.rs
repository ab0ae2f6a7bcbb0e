//! Source map for managing source files and computing source locations.
//!
//! Byte positions are global: each file occupies the range
//! `[start_pos, end_pos)` directly after the previous file, so any absolute
//! position identifies both a file and an offset within it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SourceError;

use super::Span;

/// A resolved source location (line and column are zero-based)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
    pub col: usize,
}

/// A source file with its content and position in the global address space
pub struct SourceFile {
    /// File path (or display name for stdin input)
    path: PathBuf,
    /// File content
    src: Arc<str>,
    /// First global byte position belonging to this file
    start_pos: usize,
    /// One past the last global byte position belonging to this file
    end_pos: usize,
    /// Local byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(path: PathBuf, src: impl Into<Arc<str>>, start_pos: usize) -> Self {
        let src = src.into();
        let mut line_starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        let end_pos = start_pos + src.len();
        Self {
            path,
            src,
            start_pos,
            end_pos,
            line_starts,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn src(&self) -> &str {
        &self.src
    }

    #[inline]
    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    #[inline]
    pub fn end_pos(&self) -> usize {
        self.end_pos
    }

    /// Total number of lines in the file
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Map a global byte position to a zero-based line index
    pub fn line_index(&self, pos: usize) -> usize {
        debug_assert!(pos >= self.start_pos && pos <= self.end_pos);
        let local = pos - self.start_pos;
        match self.line_starts.binary_search(&local) {
            Ok(line) => line,
            Err(insert_point) => insert_point - 1,
        }
    }

    /// Get a line's content by zero-based index, without the trailing newline
    pub fn line(&self, line: usize) -> &str {
        if line >= self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.src.len());
        self.src[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Local byte offset where a zero-based line starts
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(0)
    }

    /// Map a global byte position to a zero-based column, counted in
    /// Unicode code points from the start of its line
    pub fn column_index(&self, pos: usize) -> usize {
        let line = self.line_index(pos);
        let line_start = self.line_starts[line];
        let local = pos - self.start_pos;
        self.src[line_start..local].chars().count()
    }

    /// Map a global byte position to a zero-based byte offset within its line
    pub fn column_position(&self, pos: usize) -> usize {
        let line = self.line_index(pos);
        let line_start = self.line_starts[line];
        (pos - self.start_pos) - line_start
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("start_pos", &self.start_pos)
            .field("end_pos", &self.end_pos)
            .field("line_count", &self.line_count())
            .finish()
    }
}

/// Owner of every loaded source file.
///
/// # Examples
///
/// ```
/// use asmlint_util::span::{SourceMap, Span};
///
/// let mut map = SourceMap::new();
/// map.new_source_file("demo.asm", ".CODE\n");
/// assert_eq!(map.span_to_snippet(Span::new(0, 5)).as_deref(), Some(".CODE"));
/// ```
#[derive(Default)]
pub struct SourceMap {
    files: Vec<Arc<SourceFile>>,
}

impl SourceMap {
    #[inline]
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a source text under the given path.
    ///
    /// The file is placed directly after the last registered file in the
    /// global byte address space.
    pub fn new_source_file(
        &mut self,
        path: impl Into<PathBuf>,
        src: impl Into<Arc<str>>,
    ) -> Arc<SourceFile> {
        let start_pos = self.files.last().map_or(0, |f| f.end_pos());
        let file = Arc::new(SourceFile::new(path.into(), src, start_pos));
        self.files.push(Arc::clone(&file));
        file
    }

    /// Read a file from disk and register it.
    ///
    /// A trailing newline is appended so end-of-file diagnostics always
    /// have a line to point into.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<SourceFile>, SourceError> {
        let path = path.as_ref();
        if let Some(existing) = self.source_file(path) {
            return Ok(existing);
        }
        let mut content =
            std::fs::read_to_string(path).map_err(|source| SourceError::FailedToOpen {
                path: path.to_path_buf(),
                source,
            })?;
        content.push('\n');
        Ok(self.new_source_file(path, content))
    }

    /// Find the file containing a global byte position
    pub fn lookup_source_file(&self, pos: usize) -> Option<Arc<SourceFile>> {
        self.files
            .iter()
            .find(|f| f.start_pos() <= pos && pos < f.end_pos())
            .cloned()
    }

    /// Find an already-registered file by path
    pub fn source_file(&self, path: impl AsRef<Path>) -> Option<Arc<SourceFile>> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path() == path).cloned()
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Map a global byte position to one-based (line, column)
    pub fn lookup_line_column(&self, pos: usize) -> Option<(usize, usize)> {
        let file = self.lookup_source_file(pos)?;
        Some((file.line_index(pos) + 1, file.column_index(pos) + 1))
    }

    /// Map a span to its file path and zero-based line/column
    pub fn span_to_location(&self, span: Span) -> Option<Location> {
        let file = self.lookup_source_file(span.lo)?;
        Some(Location {
            path: file.path().to_path_buf(),
            line: file.line_index(span.lo),
            col: file.column_index(span.lo),
        })
    }

    /// Retrieve the source text a span covers
    pub fn span_to_snippet(&self, span: Span) -> Option<String> {
        let file = self.lookup_source_file(span.lo)?;
        let start = span.lo - file.start_pos();
        let end = span.hi - file.start_pos();
        if end > file.src().len() {
            return None;
        }
        Some(file.src()[start..end].to_string())
    }
}
