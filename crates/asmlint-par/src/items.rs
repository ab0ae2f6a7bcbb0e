//! Directive statement grammar: segments, STRUC/PROC blocks, RECORD,
//! EQU/`=` constants, and the closing END.

use asmlint_lex::{Token, TokenKind};
use asmlint_util::error::SemResult;
use asmlint_util::{Diagnostic, ErrorCode, ErrorReported};

use crate::ast::{
    EndDir, EquDir, EqualDir, ProcDir, RecordDir, RecordField, SegDir, StructDir,
};
use crate::Parser;

impl<'a> Parser<'a> {
    /// `.CODE` | `.DATA` | `.STACK expr`
    pub(crate) fn parse_seg_dir(&mut self) -> SemResult<SegDir> {
        let directive = self.current().clone();
        self.advance();
        let mut stack_size = None;
        if directive.matches(".STACK") {
            stack_size = Some(self.parse_expression()?);
        }
        Ok(SegDir {
            directive,
            stack_size,
        })
    }

    /// `<id> STRUC \n <DataDir>* \n <id> ENDS`
    ///
    /// Field lines recover independently: a malformed field is skipped
    /// and the block keeps being parsed.
    pub(crate) fn parse_struct_dir(&mut self) -> SemResult<StructDir> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.report_expected_identifier(self.current()));
        }
        let first_id = self.current().clone();
        self.advance();
        let directive = self
            .consume_word("STRUC")
            .expect("caller checked the STRUC keyword");
        if !self.at(TokenKind::EndOfLine) {
            return Err(self.report_expected_end_of_line_in_block(self.current()));
        }
        self.advance();
        self.handler.clear_panic_line();

        let mut fields = Vec::new();
        while !self.at_word("ENDS")
            && !self.lookahead_word(1, "ENDS")
            && !self.at(TokenKind::EndOfFile)
        {
            if !self.at_line_end() {
                match self.parse_data_dir() {
                    Ok(field) => {
                        if !self.at_line_end() {
                            self.report_expected_end_of_line_in_block(self.current());
                            self.synchronize();
                        }
                        fields.push(field);
                    }
                    Err(ErrorReported) => self.synchronize(),
                }
            }
            if self.at(TokenKind::EndOfLine) {
                self.advance();
                self.handler.clear_panic_line();
            }
        }

        if self.at_word("ENDS") {
            return Err(self.report_missing_identifier_before_block_end(self.current(), "ENDS"));
        }
        if !self.lookahead_word(1, "ENDS") {
            return Err(self.report_expected_block_end(self.current(), "ENDS"));
        }
        if !self.current().matches(&first_id.upper()) {
            return Err(self.report_expected_matching_identifier(self.current(), &first_id));
        }
        let second_id = self.current().clone();
        self.advance();
        let ends = self
            .consume_word("ENDS")
            .expect("lookahead checked the ENDS keyword");
        Ok(StructDir {
            first_id,
            directive,
            fields,
            second_id,
            ends,
        })
    }

    /// `<id> PROC \n <Instruction>* \n <id> ENDP`
    pub(crate) fn parse_proc_dir(&mut self) -> SemResult<ProcDir> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.report_expected_identifier(self.current()));
        }
        let first_id = self.current().clone();
        self.advance();
        let directive = self
            .consume_word("PROC")
            .expect("caller checked the PROC keyword");
        if !self.at(TokenKind::EndOfLine) {
            return Err(self.report_expected_end_of_line_in_block(self.current()));
        }
        self.advance();
        self.handler.clear_panic_line();

        let mut instructions = Vec::new();
        while !self.at_word("ENDP")
            && !self.lookahead_word(1, "ENDP")
            && !self.at(TokenKind::EndOfFile)
        {
            if !self.at_line_end() {
                match self.parse_instruction() {
                    Ok(instruction) => {
                        if !self.at_line_end() {
                            self.report_expected_end_of_line_in_block(self.current());
                            self.synchronize();
                        }
                        instructions.push(instruction);
                    }
                    Err(ErrorReported) => self.synchronize(),
                }
            }
            if self.at(TokenKind::EndOfLine) {
                self.advance();
                self.handler.clear_panic_line();
            }
        }

        if self.at_word("ENDP") {
            return Err(self.report_missing_identifier_before_block_end(self.current(), "ENDP"));
        }
        if !self.lookahead_word(1, "ENDP") {
            return Err(self.report_expected_block_end(self.current(), "ENDP"));
        }
        if !self.current().matches(&first_id.upper()) {
            return Err(self.report_expected_matching_identifier(self.current(), &first_id));
        }
        let second_id = self.current().clone();
        self.advance();
        let endp = self
            .consume_word("ENDP")
            .expect("lookahead checked the ENDP keyword");
        Ok(ProcDir {
            first_id,
            directive,
            instructions,
            second_id,
            endp,
        })
    }

    /// `<id> RECORD field:width[=init] {, field:width[=init]}`
    pub(crate) fn parse_record_dir(&mut self) -> SemResult<RecordDir> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.report_expected_identifier(self.current()));
        }
        let id = self.current().clone();
        self.advance();
        let directive = self
            .consume_word("RECORD")
            .expect("caller checked the RECORD keyword");

        let mut fields = Vec::new();
        loop {
            if !self.at(TokenKind::Identifier) {
                return Err(self.report_expected_identifier(self.current()));
            }
            let field_id = self.current().clone();
            self.advance();
            if self.consume(TokenKind::Colon).is_none() {
                return Err(self.report_expected_colon(self.current()));
            }
            let width = self.parse_expression()?;
            let initial = if self.at_word("=") {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };
            fields.push(RecordField {
                id: field_id,
                width,
                initial,
            });
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(RecordDir {
            id,
            directive,
            fields,
        })
    }

    /// `<id> EQU expr`
    pub(crate) fn parse_equ_dir(&mut self) -> SemResult<EquDir> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.report_expected_identifier(self.current()));
        }
        let id = self.current().clone();
        self.advance();
        let directive = self
            .consume_word("EQU")
            .expect("caller checked the EQU keyword");
        let value = self.parse_expression()?;
        Ok(EquDir {
            id,
            directive,
            value,
        })
    }

    /// `<id> = expr`
    pub(crate) fn parse_equal_dir(&mut self) -> SemResult<EqualDir> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.report_expected_identifier(self.current()));
        }
        let id = self.current().clone();
        self.advance();
        let directive = self
            .consume_word("=")
            .expect("caller checked the `=` keyword");
        let value = self.parse_expression()?;
        Ok(EqualDir {
            id,
            directive,
            value,
        })
    }

    /// `END expr?`
    pub(crate) fn parse_end_dir(&mut self) -> SemResult<EndDir> {
        let directive = self
            .consume_word("END")
            .expect("caller checked the END keyword");
        if self.at_line_end() {
            return Ok(EndDir {
                directive,
                address: None,
            });
        }
        let address = self.parse_expression()?;
        Ok(EndDir {
            directive,
            address: Some(address),
        })
    }

    fn report_expected_end_of_line_in_block(&self, token: &Token) -> ErrorReported {
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

    fn report_missing_identifier_before_block_end(&self, token: &Token, kw: &str) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::MissingIdentifierBeforeBlockEnd,
                format!("expected identifier before `{}`", kw),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_expected_block_end(&self, token: &Token, kw: &str) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedBlockEnd,
                format!("expected `{}`, found `{}`", kw, Self::display_lexeme(token)),
            )
            .with_primary_label(token.span, ""),
        )
    }

    fn report_expected_matching_identifier(&self, found: &Token, expected: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedMatchingIdentifier,
                format!(
                    "expected `{}`, found `{}`",
                    expected.lexeme,
                    Self::display_lexeme(found)
                ),
            )
            .with_primary_label(found.span, "")
            .with_secondary_label(expected.span, "block opened here"),
        )
    }

    fn report_expected_colon(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedColon,
                format!(
                    "expected `:` after record field name, found `{}`",
                    Self::display_lexeme(token)
                ),
            )
            .with_primary_label(token.span, ""),
        )
    }
}
