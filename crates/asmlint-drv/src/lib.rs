//! asmlint-drv - The analyzer driver.
//!
//! Orchestrates one end-to-end run:
//!
//! ```text
//! Source text
//!      |
//!      v
//!   [Lexer] ---> token vector
//!      |
//!      v
//!   [Parser] ---> AST
//!      |
//!      v
//!   [Semantic analysis, two passes] ---> diagnostics
//!      |
//!      v
//!   [Emitter] ---> text or JSON report
//! ```
//!
//! The [`Session`] owns the three shared components (source map, symbol
//! table, diagnostic sink) and threads them through the stages. The
//! process exits 0 whether or not diagnostics were produced; the
//! diagnostics are the product, not a failure mode.

pub mod emitter;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use asmlint_lex::Lexer;
use asmlint_par::Parser;
use asmlint_sem::{SemanticAnalyzer, SymbolTable};
use asmlint_util::{Diagnostic, ErrorCode, Handler, SourceMap};

/// What one invocation should do
#[derive(Clone, Debug)]
pub struct Config {
    /// Source path; also used as the display name for stdin input
    pub path: PathBuf,

    /// Emit diagnostics as a JSON array instead of human-readable text
    pub json: bool,

    /// Read the source from standard input instead of the path
    pub read_stdin: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("demos/test1.asm"),
            json: false,
            read_stdin: false,
        }
    }
}

impl Config {
    /// Parse command-line arguments: a path plus `--json` / `--stdin`
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut config = Config::default();
        for arg in args {
            match arg.as_str() {
                "--json" => config.json = true,
                "--stdin" => config.read_stdin = true,
                other => config.path = PathBuf::from(other),
            }
        }
        config
    }
}

/// State for one analyzer invocation.
///
/// The session is the only shared mutable state in the pipeline: the
/// source map owns every loaded file, the handler collects diagnostics,
/// and the symbol table is populated by the analysis passes.
#[derive(Default)]
pub struct Session {
    pub source_map: SourceMap,
    pub symbols: SymbolTable,
    pub handler: Handler,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `src` under `name` and run the full pipeline on it
    pub fn analyze_source(&mut self, name: impl Into<PathBuf>, src: impl Into<String>) {
        let file = self.source_map.new_source_file(name.into(), src.into());
        let tokens = Lexer::new(&self.handler, file.src(), file.start_pos()).tokenize();
        let mut program = Parser::new(&self.handler, &tokens).parse();
        let Session {
            symbols, handler, ..
        } = self;
        SemanticAnalyzer::new(handler, symbols).analyze(&mut program);
    }

    /// Load a file from disk and analyze it.
    ///
    /// A file that can't be opened produces a single
    /// `FAILED_TO_OPEN_FILE` diagnostic; the analyzer is not entered.
    pub fn analyze_file(&mut self, path: &std::path::Path) {
        let file = match self.source_map.load_file(path) {
            Ok(file) => file,
            Err(err) => {
                self.handler.add_diagnostic(Diagnostic::error(
                    ErrorCode::FailedToOpenFile,
                    err.to_string(),
                ));
                return;
            }
        };
        let tokens = Lexer::new(&self.handler, file.src(), file.start_pos()).tokenize();
        let mut program = Parser::new(&self.handler, &tokens).parse();
        let Session {
            symbols, handler, ..
        } = self;
        SemanticAnalyzer::new(handler, symbols).analyze(&mut program);
    }
}

/// Run one invocation against the process's stdin/stdout
pub fn run(config: &Config) -> Result<()> {
    let mut session = Session::new();

    if config.read_stdin {
        let mut src = String::new();
        std::io::stdin()
            .read_to_string(&mut src)
            .context("failed to read standard input")?;
        if !config.json {
            // give end-of-file diagnostics a line to point into
            src.push('\n');
        }
        session.analyze_source(config.path.clone(), src);
    } else {
        session.analyze_file(&config.path);
    }

    let stdout = std::io::stdout();
    let color = std::io::IsTerminal::is_terminal(&stdout);
    let mut out = stdout.lock();
    if session.handler.has_errors() {
        if config.json {
            emitter::emit_json(&session.source_map, &session.handler.diagnostics(), &mut out)?;
        } else {
            emitter::emit_text(
                &session.source_map,
                &session.handler.diagnostics(),
                &mut out,
                color,
            )?;
        }
    } else if config.json {
        use std::io::Write;
        write!(out, "[]")?;
    } else {
        use std::io::Write;
        writeln!(out, "analysis completed successfully with no errors")?;
    }
    Ok(())
}

/// Entry point used by the binary: parse `std::env::args` and run
pub fn run_cli() -> Result<()> {
    let config = Config::from_args(std::env::args().skip(1));
    run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_args() {
        let config = Config::from_args(
            ["--json", "file.asm", "--stdin"]
                .into_iter()
                .map(String::from),
        );
        assert!(config.json);
        assert!(config.read_stdin);
        assert_eq!(config.path, PathBuf::from("file.asm"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_args(std::iter::empty());
        assert!(!config.json);
        assert!(!config.read_stdin);
        assert_eq!(config.path, PathBuf::from("demos/test1.asm"));
    }

    #[test]
    fn test_session_clean_source() {
        let mut session = Session::new();
        session.analyze_source("demo.asm", ".CODE\n MOV EAX, 1\n END\n");
        assert!(!session.handler.has_errors());
    }

    #[test]
    fn test_session_collects_diagnostics() {
        let mut session = Session::new();
        session.analyze_source("demo.asm", ".CODE\n MOV EAX, 1/0\n END\n");
        assert!(session.handler.has_errors());
        assert_eq!(session.handler.error_count(), 1);
    }

    #[test]
    fn test_missing_file_single_diagnostic() {
        let mut session = Session::new();
        session.analyze_file(std::path::Path::new("definitely/not/here.asm"));
        let diags = session.handler.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, asmlint_util::ErrorCode::FailedToOpenFile);
    }
}
