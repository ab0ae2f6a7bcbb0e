//! Expression grammar.
//!
//! Precedence, loosest to tightest:
//!
//! 1. additive `+ -`
//! 2. multiplicative `* / MOD SHL SHR`
//! 3. low unary `+ - OFFSET TYPE`
//! 4. `PTR` (right-associative)
//! 5. member access and indexing `.` `[...]` `(...)` - a bracket group
//!    following a primary becomes an implicit plus
//! 6. high unary `LENGTH LENGTHOF SIZE SIZEOF WIDTH MASK`
//! 7. primary: parenthesis, square bracket, identifier, number, string,
//!    register, type keyword, `$`
//!
//! The delimiter stack is cleared at every top-level `parse_expression`
//! call; a missing closer is diagnosed at the unbalanced opener.

use asmlint_lex::{Token, TokenKind};
use asmlint_util::error::SemResult;
use asmlint_util::{Diagnostic, ErrorCode, ErrorReported};

use crate::ast::Expr;
use crate::Parser;

/// Operators that may legally follow a primary leaf inside open delimiters
const BINARY_OPERATOR_WORDS: &[&str] = &["+", "-", "*", "/", "PTR", ".", "MOD", "SHL", "SHR"];

impl<'a> Parser<'a> {
    /// Entry point; resets the expression delimiter stack
    pub(crate) fn parse_expression(&mut self) -> SemResult<Expr> {
        self.expr_delims.clear();
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> SemResult<Expr> {
        let mut term = self.parse_multiplicative()?;
        while self.at_word("+") || self.at_word("-") {
            let op = self.current().clone();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            term = Expr::binary(op, term, rhs);
        }
        Ok(term)
    }

    fn parse_multiplicative(&mut self) -> SemResult<Expr> {
        let mut term = self.parse_low_unary()?;
        while self.at_word("*")
            || self.at_word("/")
            || self.at_word("MOD")
            || self.at_word("SHL")
            || self.at_word("SHR")
        {
            let op = self.current().clone();
            self.advance();
            let rhs = self.parse_low_unary()?;
            term = Expr::binary(op, term, rhs);
        }
        Ok(term)
    }

    fn parse_low_unary(&mut self) -> SemResult<Expr> {
        let mut operators = Vec::new();
        while self.at_word("+") || self.at_word("-") || self.at_word("OFFSET") || self.at_word("TYPE")
        {
            operators.push(self.current().clone());
            self.advance();
        }
        let mut term = self.parse_ptr()?;
        for op in operators.into_iter().rev() {
            term = Expr::unary(op, term);
        }
        Ok(term)
    }

    /// `PTR` is right-associative: `a PTR b PTR c` is `a PTR (b PTR c)`
    fn parse_ptr(&mut self) -> SemResult<Expr> {
        let term = self.parse_member_access_and_indexing()?;
        if self.at_word("PTR") {
            let op = self.current().clone();
            self.advance();
            let rhs = self.parse_ptr()?;
            return Ok(Expr::binary(op, term, rhs));
        }
        Ok(term)
    }

    fn parse_member_access_and_indexing(&mut self) -> SemResult<Expr> {
        let mut term = self.parse_high_unary()?;
        loop {
            if self.at(TokenKind::OpenSquareBracket) {
                let open = self.current().clone();
                self.expr_delims.push(open.clone());
                self.advance();
                let inner = self.parse_additive()?;
                let Some(close) = self.consume(TokenKind::CloseSquareBracket) else {
                    return Err(self.report_unclosed_delimiter(self.current()));
                };
                self.expr_delims.pop();
                term = Expr::implicit_plus(term, Expr::square_brackets(open, close, inner));
            } else if self.at(TokenKind::OpenBracket) {
                let open = self.current().clone();
                self.expr_delims.push(open.clone());
                self.advance();
                let inner = self.parse_additive()?;
                let Some(close) = self.consume(TokenKind::CloseBracket) else {
                    return Err(self.report_unclosed_delimiter(self.current()));
                };
                self.expr_delims.pop();
                term = Expr::implicit_plus(term, Expr::brackets(open, close, inner));
            } else if self.at_word(".") {
                let dot = self.current().clone();
                self.advance();
                if !self.at(TokenKind::Identifier) {
                    return Err(self.report_expected_identifier(self.current()));
                }
                let field = Expr::leaf(self.current().clone());
                self.advance();
                term = Expr::binary(dot, term, field);
            } else {
                break;
            }
        }
        Ok(term)
    }

    fn parse_high_unary(&mut self) -> SemResult<Expr> {
        let mut operators = Vec::new();
        while self.at_word("LENGTH")
            || self.at_word("LENGTHOF")
            || self.at_word("SIZE")
            || self.at_word("SIZEOF")
            || self.at_word("WIDTH")
            || self.at_word("MASK")
        {
            operators.push(self.current().clone());
            self.advance();
        }
        let mut term = self.parse_primary()?;
        for op in operators.into_iter().rev() {
            term = Expr::unary(op, term);
        }
        Ok(term)
    }

    fn parse_primary(&mut self) -> SemResult<Expr> {
        if self.at(TokenKind::OpenBracket) {
            let open = self.current().clone();
            self.expr_delims.push(open.clone());
            self.advance();
            let inner = self.parse_additive()?;
            let Some(close) = self.consume(TokenKind::CloseBracket) else {
                return Err(self.report_unclosed_delimiter(self.current()));
            };
            self.expr_delims.pop();
            return Ok(Expr::brackets(open, close, inner));
        }
        if self.at(TokenKind::OpenSquareBracket) {
            let open = self.current().clone();
            self.expr_delims.push(open.clone());
            self.advance();
            let inner = self.parse_additive()?;
            let Some(close) = self.consume(TokenKind::CloseSquareBracket) else {
                return Err(self.report_unclosed_delimiter(self.current()));
            };
            self.expr_delims.pop();
            return Ok(Expr::square_brackets(open, close, inner));
        }
        if self.at(TokenKind::Invalid) {
            // the lexer already diagnosed this token; abandon the line
            // without a second message
            self.advance();
            return Err(ErrorReported);
        }
        if matches!(
            self.current().kind,
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::Register
                | TokenKind::Type
                | TokenKind::Dollar
        ) {
            let token = self.current().clone();
            self.advance();
            // inside unclosed delimiters the next token must continue or
            // close the expression; this is the guard that forbids
            // `(var var)`
            if !self.expr_delims.is_empty() && !self.continues_expression() {
                if matches!(
                    self.current().kind,
                    TokenKind::EndOfLine | TokenKind::EndOfFile | TokenKind::Comma
                ) {
                    return Err(self.report_unclosed_delimiter(self.current()));
                }
                return Err(self.report_expected_operator_or_closing_delimiter(self.current()));
            }
            return Ok(Expr::leaf(token));
        }
        Err(self.report_expected_expression(self.current()))
    }

    /// After a leaf inside open delimiters: a closer, another opener
    /// (implicit plus), or a binary operator keeps the expression going
    fn continues_expression(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::CloseSquareBracket
                | TokenKind::CloseBracket
                | TokenKind::OpenSquareBracket
                | TokenKind::OpenBracket
        ) || BINARY_OPERATOR_WORDS
            .iter()
            .any(|op| self.current().matches(op))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn report_unclosed_delimiter(&self, at: &Token) -> ErrorReported {
        let Some(open) = self.expr_delims.last() else {
            // the stack can't be empty when a closer went missing
            return self.report_expected_expression(at);
        };
        self.handler.report(
            Diagnostic::error(
                ErrorCode::UnclosedDelimiter,
                format!("unclosed delimiter `{}`", open.lexeme),
            )
            .with_primary_label(at.span, "")
            .with_secondary_label(open.span, "unclosed delimiter"),
        )
    }

    fn report_expected_expression(&self, token: &Token) -> ErrorReported {
        if matches!(
            token.kind,
            TokenKind::CloseSquareBracket | TokenKind::CloseBracket
        ) && self.expr_delims.is_empty()
        {
            return self.handler.report(
                Diagnostic::error(
                    ErrorCode::UnexpectedClosingDelimiter,
                    format!("unexpected closing delimiter `{}`", token.lexeme),
                )
                .with_primary_label(token.span, ""),
            );
        }
        let mut diag = Diagnostic::error(
            ErrorCode::ExpectedExpression,
            format!("expected expression, found `{}`", Self::display_lexeme(token)),
        )
        .with_primary_label(token.span, "");
        // `10 * MOD 3` or `PTR [eax]`: the binary reading is the likely
        // intent, so point it out
        let upper = token.upper();
        if matches!(upper.as_str(), "MOD" | "SHL" | "SHR" | "PTR") {
            diag = diag.with_note(format!("{} operator takes 2 arguments", upper));
        }
        self.handler.report(diag)
    }

    fn report_expected_operator_or_closing_delimiter(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedOperatorOrClosingDelimiter,
                format!(
                    "expected operator or closing delimiter, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }
}
