//! Data definition grammar: `name? dataType initValues`.
//!
//! Initializers have their own delimiter stack because `<...>` is legal
//! only here (struct/record instance values) and `(...)` after `DUP` is a
//! repetition group, not an expression group.

use asmlint_lex::{Token, TokenKind};
use asmlint_util::error::SemResult;
use asmlint_util::{Diagnostic, ErrorCode, ErrorReported};

use crate::ast::{DataDir, DataItem, InitValue};
use crate::Parser;

/// The built-in data definition directives
pub const DATA_DIRECTIVES: &[&str] = &["DB", "DW", "DD", "DQ"];

impl<'a> Parser<'a> {
    pub(crate) fn at_data_directive(&self) -> bool {
        DATA_DIRECTIVES.iter().any(|d| self.current().matches(d))
    }

    /// `name? dataType initValues`
    pub(crate) fn parse_data_dir(&mut self) -> SemResult<DataDir> {
        let mut id = None;
        if self.at_data_directive() {
            // unnamed definition like `DB 1, 2`
        } else if self.lookahead(1).kind == TokenKind::Identifier
            || DATA_DIRECTIVES.iter().any(|d| self.lookahead(1).matches(d))
        {
            if !self.at(TokenKind::Identifier) {
                return Err(self.report_expected_identifier(self.current()));
            }
            id = Some(self.current().clone());
            self.advance();
        }
        let item = self.parse_data_item()?;
        Ok(DataDir { id, item })
    }

    /// `dataType initValues` where dataType is `DB`..`DQ` or a
    /// struct/record type name
    pub(crate) fn parse_data_item(&mut self) -> SemResult<DataItem> {
        if !self.at(TokenKind::Identifier) && !self.at_data_directive() {
            return Err(self.report_expected_variable_name_or_data_directive(self.current()));
        }
        let data_type = self.current().clone();
        self.advance();
        let init = self.parse_init_value()?;
        Ok(DataItem { data_type, init })
    }

    /// The full initializer of one data line; always an [`InitValue::List`]
    fn parse_init_value(&mut self) -> SemResult<InitValue> {
        self.init_delims.clear();
        let init = self.parse_initializer_list()?;
        if !self.at_line_end() {
            return Err(self.report_expected_comma_or_end_of_line(self.current()));
        }
        Ok(init)
    }

    fn parse_initializer_list(&mut self) -> SemResult<InitValue> {
        let mut fields = vec![self.parse_single_init_value()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            fields.push(self.parse_single_init_value()?);
        }
        Ok(InitValue::List(fields))
    }

    fn parse_single_init_value(&mut self) -> SemResult<InitValue> {
        if self.at(TokenKind::OpenAngleBracket) {
            let open = self.current().clone();
            self.init_delims.push(open.clone());
            self.advance();
            if self.at(TokenKind::CloseAngleBracket) {
                let close = self.current().clone();
                self.advance();
                self.init_delims.pop();
                return Ok(InitValue::StructOrRecord {
                    open,
                    close,
                    fields: Box::new(InitValue::List(Vec::new())),
                });
            }
            let fields = self.parse_initializer_list()?;
            let Some(close) = self.consume(TokenKind::CloseAngleBracket) else {
                return Err(self.report_unclosed_initializer_delimiter(self.current()));
            };
            self.init_delims.pop();
            return Ok(InitValue::StructOrRecord {
                open,
                close,
                fields: Box::new(fields),
            });
        }

        if self.at(TokenKind::QuestionMark) {
            let token = self.current().clone();
            self.advance();
            return Ok(InitValue::QuestionMark(token));
        }

        let expr = self.parse_expression()?;
        if self.at_word("DUP") {
            let op = self.current().clone();
            self.advance();
            let Some(open) = self.consume(TokenKind::OpenBracket) else {
                return Err(self.report_expected_open_bracket(self.current()));
            };
            self.init_delims.push(open);
            let operands = self.parse_initializer_list()?;
            if self.consume(TokenKind::CloseBracket).is_none() {
                return Err(self.report_unclosed_initializer_delimiter(self.current()));
            }
            self.init_delims.pop();
            return Ok(InitValue::Dup {
                count: expr,
                op,
                operands: Box::new(operands),
            });
        }

        // `<var var>` can't be: after a value inside open initializer
        // delimiters only a closer or a comma may follow
        if !self.init_delims.is_empty()
            && !matches!(
                self.current().kind,
                TokenKind::CloseAngleBracket | TokenKind::CloseBracket | TokenKind::Comma
            )
        {
            if self.at_line_end() {
                return Err(self.report_unclosed_initializer_delimiter(self.current()));
            }
            return Err(self.report_expected_comma_or_closing_delimiter(self.current()));
        }
        Ok(InitValue::Expr(expr))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn report_expected_variable_name_or_data_directive(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedVariableNameOrDataDirective,
                format!(
                    "expected variable name or data directive, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_unclosed_initializer_delimiter(&self, at: &Token) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::UnclosedDelimiterInInitializer,
            "unclosed delimiter in data initializer",
        )
        .with_primary_label(at.span, "");
        if let Some(open) = self.init_delims.last() {
            diag = diag.with_secondary_label(open.span, "unclosed delimiter");
        }
        self.handler.report(diag)
    }

    fn report_expected_comma_or_closing_delimiter(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedCommaOrClosingDelimiter,
                format!(
                    "expected `,` or closing delimiter, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_expected_open_bracket(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedOpenBracket,
                format!(
                    "expected `(` after `DUP`, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }
}
