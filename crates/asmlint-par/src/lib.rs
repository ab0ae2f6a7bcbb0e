//! asmlint-par - Recursive-descent parser with panic-mode recovery.
//!
//! The parser walks the flat token vector once and produces a typed
//! [`ast::Program`]. Three design points carry most of the weight:
//!
//! - **Newlines terminate statements.** Statement dispatch looks at the
//!   first token of a line (plus one token of lookahead for the
//!   `<id> STRUC/PROC/RECORD/EQU/=` forms) and every error recovery path
//!   synchronizes to the next `EndOfLine`.
//! - **Two delimiter stacks.** Expressions track `(` and `[` on one
//!   stack; data initializers track `<` and the `DUP (` bracket on a
//!   separate one, because `<...>` is only meaningful inside an
//!   initializer and `(...)` means different things in the two contexts.
//!   A missing closer is diagnosed at the unbalanced opener.
//! - **One diagnostic per line.** Every report helper goes through the
//!   handler's panic flag; the first error on a line wins and the rest of
//!   the line is skipped.
//!
//! Grammar modules: expression grammar in [`expr`], directive statements
//! in [`items`], data items and initializers in [`data`].

pub mod ast;
pub mod data;
mod expr;
mod items;
#[cfg(test)]
mod tests;

use asmlint_lex::{Token, TokenKind};
use asmlint_util::error::SemResult;
use asmlint_util::{Diagnostic, ErrorCode, ErrorReported, Handler};

use ast::{Directive, Instruction, Program, Statement};

/// Which segment block the parser is currently inside
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegKind {
    Code,
    Data,
}

/// Single-pass recursive-descent parser over a token vector.
///
/// # Example
///
/// ```
/// use asmlint_lex::Lexer;
/// use asmlint_par::Parser;
/// use asmlint_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Lexer::new(&handler, ".CODE\n MOV EAX, 1\n END\n", 0).tokenize();
/// let program = Parser::new(&handler, &tokens).parse();
/// assert_eq!(program.statements.len(), 2);
/// assert!(program.end_dir.is_some());
/// ```
pub struct Parser<'a> {
    handler: &'a Handler,
    tokens: &'a [Token],
    idx: usize,
    current_segment: Option<SegKind>,
    /// Open `(` / `[` tokens of the expression being parsed
    pub(crate) expr_delims: Vec<Token>,
    /// Open `<` / `DUP (` tokens of the initializer being parsed
    pub(crate) init_delims: Vec<Token>,
}

impl<'a> Parser<'a> {
    /// `tokens` must be non-empty and end with `EndOfFile`, which is what
    /// the lexer produces.
    pub fn new(handler: &'a Handler, tokens: &'a [Token]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::EndOfFile)
        ));
        Self {
            handler,
            tokens,
            idx: 0,
            current_segment: None,
            expr_delims: Vec::new(),
            init_delims: Vec::new(),
        }
    }

    // ========================================================================
    // Token stream helpers
    // ========================================================================

    #[inline]
    pub(crate) fn current(&self) -> &'a Token {
        &self.tokens[self.idx]
    }

    /// Advance past the current token; never moves past `EndOfFile`
    pub(crate) fn advance(&mut self) {
        if self.current().kind != TokenKind::EndOfFile {
            self.idx += 1;
        }
    }

    /// Discard tokens up to the next line boundary
    pub(crate) fn synchronize(&mut self) {
        while !self.at_line_end() {
            self.advance();
        }
    }

    #[inline]
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Case-insensitive lexeme match against a canonical uppercase form
    #[inline]
    pub(crate) fn at_word(&self, upper: &str) -> bool {
        self.current().matches(upper)
    }

    #[inline]
    pub(crate) fn at_line_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::EndOfLine | TokenKind::EndOfFile
        )
    }

    /// The token `n` positions ahead, clamped to the trailing `EndOfFile`
    pub(crate) fn lookahead(&self, n: usize) -> &'a Token {
        self.tokens
            .get(self.idx + n)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    pub(crate) fn lookahead_is(&self, n: usize, kind: TokenKind) -> bool {
        self.lookahead(n).kind == kind
    }

    pub(crate) fn lookahead_word(&self, n: usize, upper: &str) -> bool {
        self.lookahead(n).matches(upper)
    }

    /// Consume a token of the expected kind
    pub(crate) fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            let token = self.current().clone();
            self.advance();
            Some(token)
        } else {
            None
        }
    }

    /// Consume a token with the expected (case-insensitive) lexeme
    pub(crate) fn consume_word(&mut self, upper: &str) -> Option<Token> {
        if self.at_word(upper) {
            let token = self.current().clone();
            self.advance();
            Some(token)
        } else {
            None
        }
    }

    // ========================================================================
    // Program and statements
    // ========================================================================

    /// Parse the whole token stream into a program.
    ///
    /// Recovery never aborts the parse: a malformed line is diagnosed,
    /// skipped, and parsing resumes on the next line.
    pub fn parse(mut self) -> Program {
        let mut statements = Vec::new();
        while !self.at_word("END") && !self.at(TokenKind::EndOfFile) {
            if self.at(TokenKind::EndOfLine) {
                self.advance();
                self.handler.clear_panic_line();
                continue;
            }
            match self.parse_statement() {
                Ok(statement) => {
                    if !self.at_line_end() {
                        self.report_expected_end_of_line(self.current());
                        self.synchronize();
                    }
                    statements.push(statement);
                }
                Err(ErrorReported) => self.synchronize(),
            }
            if self.at(TokenKind::EndOfLine) {
                self.advance();
                self.handler.clear_panic_line();
            }
        }

        let end_dir = if self.at_word("END") {
            self.parse_end_dir().ok()
        } else {
            self.report_expected_end_directive(self.current());
            None
        };
        Program {
            statements,
            end_dir,
        }
    }

    fn parse_statement(&mut self) -> SemResult<Statement> {
        if self.at_word(".CODE") || self.at_word(".DATA") || self.at_word(".STACK") {
            if self.at_word(".CODE") {
                self.current_segment = Some(SegKind::Code);
            } else if self.at_word(".DATA") {
                self.current_segment = Some(SegKind::Data);
            }
            return Ok(Statement::Directive(Directive::Seg(self.parse_seg_dir()?)));
        }

        // a declaring keyword with no identifier in front of it
        for kw in ["STRUC", "PROC", "RECORD", "EQU", "="] {
            if self.at_word(kw) {
                return Err(self.report_expected_identifier_before(self.current(), kw));
            }
        }

        if self.lookahead_word(1, "STRUC") {
            return Ok(Statement::Directive(Directive::Struct(
                self.parse_struct_dir()?,
            )));
        }
        if self.lookahead_word(1, "PROC") {
            return Ok(Statement::Directive(Directive::Proc(
                self.parse_proc_dir()?,
            )));
        }
        if self.lookahead_word(1, "RECORD") {
            return Ok(Statement::Directive(Directive::Record(
                self.parse_record_dir()?,
            )));
        }
        if self.lookahead_word(1, "EQU") {
            return Ok(Statement::Directive(Directive::Equ(self.parse_equ_dir()?)));
        }
        if self.lookahead_word(1, "=") {
            return Ok(Statement::Directive(Directive::Equal(
                self.parse_equal_dir()?,
            )));
        }

        match self.current_segment {
            Some(SegKind::Data) => Ok(Statement::Directive(Directive::Data(
                self.parse_data_dir()?,
            ))),
            Some(SegKind::Code) => Ok(Statement::Instruction(self.parse_instruction()?)),
            None => {
                let first = self.current().clone();
                let mut last = first.clone();
                while !self.at_line_end() {
                    last = self.current().clone();
                    self.advance();
                }
                Err(self.report_must_be_in_segment_block(&first, &last))
            }
        }
    }

    pub(crate) fn parse_instruction(&mut self) -> SemResult<Instruction> {
        let mut label = None;
        if self.lookahead_is(1, TokenKind::Colon) {
            if !self.at(TokenKind::Identifier) {
                return Err(self.report_expected_identifier_in_label(self.current()));
            }
            let label_token = self.current().clone();
            self.advance();
            self.advance(); // the colon
            label = Some(label_token);
        }
        if self.at_line_end() {
            // a bare label line is valid
            return Ok(Instruction {
                label,
                mnemonic: None,
                operands: Vec::new(),
            });
        }

        if !self.at(TokenKind::Instruction) {
            return Err(self.report_expected_instruction(self.current()));
        }
        let mnemonic = self.current().clone();
        self.advance();

        let mut operands = Vec::new();
        if self.at_line_end() {
            return Ok(Instruction {
                label,
                mnemonic: Some(mnemonic),
                operands,
            });
        }
        operands.push(self.parse_expression()?);
        while self.at(TokenKind::Comma) {
            self.advance();
            operands.push(self.parse_expression()?);
        }
        if !self.at_line_end() {
            return Err(self.report_expected_comma_or_end_of_line(self.current()));
        }
        Ok(Instruction {
            label,
            mnemonic: Some(mnemonic),
            operands,
        })
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// User-facing rendering of a token in a message
    pub(crate) fn display_lexeme(token: &Token) -> String {
        match token.kind {
            TokenKind::EndOfLine => "\\n".to_string(),
            TokenKind::EndOfFile => "End Of File".to_string(),
            _ => token.lexeme.clone(),
        }
    }

    fn report_expected_end_of_line(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedEndOfLine,
                format!(
                    "expected end of line, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_expected_end_directive(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedEndDirective,
                "expected `END` directive before the end of the file",
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_must_be_in_segment_block(&self, first: &Token, last: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::MustBeInSegmentBlock,
                "statement must be inside a segment block",
            )
            .with_primary_label(first.span.merge(last.span), "")
            .with_help("open a segment with `.CODE`, `.DATA` or `.STACK`"),
        )
    }

    fn report_expected_identifier_before(&self, token: &Token, kw: &str) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedIdentifier,
                format!("expected identifier before `{}`", kw),
            )
            .with_primary_label(token.span, ""),
        )
    }

    pub(crate) fn report_expected_identifier(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedIdentifier,
                format!(
                    "expected identifier, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_expected_identifier_in_label(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedIdentifier,
                format!(
                    "expected identifier before `:`, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, "this needs to be a label name"),
        )
    }

    fn report_expected_instruction(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedInstruction,
                format!(
                    "expected instruction mnemonic, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }

    pub(crate) fn report_expected_comma_or_end_of_line(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedCommaOrEndOfLine,
                format!(
                    "expected `,` or end of line, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }
}
