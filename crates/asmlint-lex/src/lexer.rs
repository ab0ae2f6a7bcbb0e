//! The lexer: source text to a classified token vector.

use asmlint_util::{Diagnostic, ErrorCode, Handler, Span};

use crate::cursor::Cursor;
use crate::{classify_word, Token, TokenKind, DIRECTIVES};

/// Split a number lexeme into its digit part and numeric base.
///
/// A trailing `h`, `b`/`y`, `o`/`q`, or `d`/`t` (case-insensitive) selects
/// base 16, 2, 8, or 10 and is stripped; without a suffix the whole lexeme
/// is decimal.
///
/// # Examples
///
/// ```
/// use asmlint_lex::lexer::split_base_suffix;
///
/// assert_eq!(split_base_suffix("0FFh"), ("0FF", 16));
/// assert_eq!(split_base_suffix("1010b"), ("1010", 2));
/// assert_eq!(split_base_suffix("123"), ("123", 10));
/// ```
pub fn split_base_suffix(lexeme: &str) -> (&str, u32) {
    let Some(last) = lexeme.chars().last() else {
        return (lexeme, 10);
    };
    let base = match last.to_ascii_lowercase() {
        'h' => 16,
        'b' | 'y' => 2,
        'o' | 'q' => 8,
        'd' | 't' => 10,
        _ => return (lexeme, 10),
    };
    (&lexeme[..lexeme.len() - 1], base)
}

/// Is this lexeme a well-formed number under its suffix base?
pub fn is_well_formed_number(lexeme: &str) -> bool {
    let (digits, base) = split_base_suffix(lexeme);
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(base))
}

/// Direct-coded scanner over one source file.
///
/// # Example
///
/// ```
/// use asmlint_lex::{Lexer, TokenKind};
/// use asmlint_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Lexer::new(&handler, "mov eax, 1\n", 0).tokenize();
/// assert_eq!(tokens[0].kind, TokenKind::Instruction);
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
/// ```
pub struct Lexer<'a> {
    handler: &'a Handler,
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    /// `start_pos` is the global byte position of the file's first byte
    /// in the session's source map.
    pub fn new(handler: &'a Handler, src: &'a str, start_pos: usize) -> Self {
        Self {
            handler,
            cursor: Cursor::new(src, start_pos),
        }
    }

    /// Produce the full token vector, terminated by one `EndOfFile`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while !self.cursor.is_at_end() {
            self.skip_blanks();
            if self.cursor.is_at_end() {
                break;
            }
            if let Some(token) = self.next_token() {
                if token.kind == TokenKind::EndOfLine {
                    // one diagnostic per line; the flag resets here
                    self.handler.clear_panic_line();
                }
                tokens.push(token);
            }
        }
        tokens.push(self.end_of_file_token());
        tokens
    }

    /// Skip spaces, tabs and carriage returns, but never newlines
    fn skip_blanks(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r') {
            self.cursor.advance();
        }
    }

    /// Lex one token. Comments produce `None`.
    fn next_token(&mut self) -> Option<Token> {
        let start = self.cursor.global_pos();
        let c = self.cursor.current_char();

        if c == '\n' {
            self.cursor.advance();
            return Some(Token::new(
                TokenKind::EndOfLine,
                "\n",
                Span::new(start, self.cursor.global_pos()),
            ));
        }
        if c == ';' {
            while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                self.cursor.advance();
            }
            return None;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return Some(self.lex_word(start));
        }
        if c.is_ascii_digit() {
            return Some(self.lex_number(start));
        }
        if c == '\'' || c == '"' {
            return Some(self.lex_string(start));
        }
        if c == '.' {
            return Some(self.lex_dot(start));
        }

        self.cursor.advance();
        let span = Span::new(start, self.cursor.global_pos());
        let kind = match c {
            '+' | '-' | '*' | '/' => TokenKind::Operator,
            '=' => TokenKind::Directive,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::OpenBracket,
            ')' => TokenKind::CloseBracket,
            '[' => TokenKind::OpenSquareBracket,
            ']' => TokenKind::CloseSquareBracket,
            '<' => TokenKind::OpenAngleBracket,
            '>' => TokenKind::CloseAngleBracket,
            '$' => TokenKind::Dollar,
            '?' => TokenKind::QuestionMark,
            _ => {
                self.handler.report(
                    Diagnostic::error(
                        ErrorCode::UnexpectedCharacter,
                        format!("unexpected character `{}`", c),
                    )
                    .with_primary_label(span, ""),
                );
                TokenKind::Invalid
            }
        };
        Some(Token::new(kind, c.to_string(), span))
    }

    /// Words: reserved or identifier, decided by the closed sets
    fn lex_word(&mut self, start: usize) -> Token {
        while self.cursor.current_char().is_ascii_alphanumeric() || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice_from(start);
        Token::new(
            classify_word(lexeme),
            lexeme,
            Span::new(start, self.cursor.global_pos()),
        )
    }

    /// Numbers: a leading digit, then alphanumerics (so a base suffix or
    /// stray letters end up inside the lexeme), validated against the
    /// implied base
    fn lex_number(&mut self, start: usize) -> Token {
        while self.cursor.current_char().is_ascii_alphanumeric() {
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice_from(start);
        let span = Span::new(start, self.cursor.global_pos());
        if is_well_formed_number(lexeme) {
            Token::new(TokenKind::Number, lexeme, span)
        } else {
            self.handler.report(
                Diagnostic::error(
                    ErrorCode::ConstantParseError,
                    format!("invalid numeric constant `{}`", lexeme),
                )
                .with_primary_label(span, "")
                .with_note("base suffixes are `h`, `b`, `y`, `o`, `q`, `d`, `t`"),
            );
            Token::new(TokenKind::Invalid, lexeme, span)
        }
    }

    /// String literals: the opening quote decides the closing quote and
    /// both stay part of the lexeme
    fn lex_string(&mut self, start: usize) -> Token {
        let quote = self.cursor.current_char();
        self.cursor.advance();
        while !self.cursor.is_at_end()
            && self.cursor.current_char() != quote
            && self.cursor.current_char() != '\n'
        {
            self.cursor.advance();
        }
        if self.cursor.current_char() == quote {
            self.cursor.advance();
            let lexeme = self.cursor.slice_from(start);
            return Token::new(
                TokenKind::StringLiteral,
                lexeme,
                Span::new(start, self.cursor.global_pos()),
            );
        }
        let span = Span::new(start, self.cursor.global_pos());
        self.handler.report(
            Diagnostic::error(ErrorCode::UnterminatedString, "unterminated string literal")
                .with_primary_label(span, ""),
        );
        Token::new(TokenKind::Invalid, self.cursor.slice_from(start), span)
    }

    /// `.` either begins a segment directive (`.CODE`) or stands alone as
    /// the struct member access operator
    fn lex_dot(&mut self, start: usize) -> Token {
        // speculative read of `.word`; only segment directives are one token
        let mut len = 1;
        while self.cursor.char_at(len).is_ascii_alphanumeric() {
            len += 1;
        }
        let candidate: String = (0..len).map(|i| self.cursor.char_at(i)).collect();
        if len > 1 && DIRECTIVES.iter().any(|d| candidate.eq_ignore_ascii_case(d)) {
            for _ in 0..len {
                self.cursor.advance();
            }
            Token::new(
                TokenKind::Directive,
                candidate,
                Span::new(start, self.cursor.global_pos()),
            )
        } else {
            self.cursor.advance();
            Token::new(
                TokenKind::Operator,
                ".",
                Span::new(start, self.cursor.global_pos()),
            )
        }
    }

    fn end_of_file_token(&self) -> Token {
        let end = self.cursor.global_pos();
        let lo = end.saturating_sub(1);
        Token::new(TokenKind::EndOfFile, "", Span::new(lo, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(&handler, src, 0).tokenize();
        (tokens, handler)
    }

    #[test]
    fn test_identifier() {
        let (tokens, handler) = lex("myVar");
        assert_eq!(tokens.len(), 2); // identifier + EndOfFile
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "myVar");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_reserved_words() {
        let (tokens, _) = lex("EQU mov AX dword ptr");
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[1].kind, TokenKind::Instruction);
        assert_eq!(tokens[2].kind, TokenKind::Register);
        assert_eq!(tokens[3].kind, TokenKind::Type);
        assert_eq!(tokens[4].kind, TokenKind::Operator);
    }

    #[test]
    fn test_segment_directive_is_one_token() {
        let (tokens, _) = lex(".CODE");
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[0].lexeme, ".CODE");
    }

    #[test]
    fn test_dot_before_identifier_stays_operator() {
        let (tokens, _) = lex(".myLabel");
        assert_eq!(tokens[0].kind, TokenKind::Operator);
        assert_eq!(tokens[0].lexeme, ".");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "myLabel");
    }

    #[test]
    fn test_numbers_with_suffixes() {
        for src in ["12345", "0FFh", "1010b", "77o", "123d"] {
            let (tokens, handler) = lex(src);
            assert_eq!(tokens[0].kind, TokenKind::Number, "src = {}", src);
            assert_eq!(tokens[0].lexeme, src);
            assert!(!handler.has_errors(), "src = {}", src);
        }
    }

    #[test]
    fn test_hex_without_leading_digit_is_identifier() {
        let (tokens, handler) = lex("FFh");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "FFh");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_malformed_number() {
        let (tokens, handler) = lex("123XYZ");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(handler.has_errors());
        assert_eq!(
            handler.diagnostics()[0].code,
            ErrorCode::ConstantParseError
        );
    }

    #[test]
    fn test_digits_invalid_in_base() {
        let (tokens, handler) = lex("129b");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_string_literals_keep_quotes() {
        let (tokens, _) = lex("\"Hello, World!\"");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, "\"Hello, World!\"");

        let (tokens, _) = lex("'single'");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, "'single'");
    }

    #[test]
    fn test_mismatched_quote_kinds_do_not_close() {
        let (tokens, handler) = lex("\"abc'\n");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(
            handler.diagnostics()[0].code,
            ErrorCode::UnterminatedString
        );
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, handler) = lex("'oops");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_comment_consumed_silently() {
        let (tokens, handler) = lex("mov ; this is a comment\n");
        assert_eq!(tokens[0].kind, TokenKind::Instruction);
        assert_eq!(tokens[1].kind, TokenKind::EndOfLine);
        assert_eq!(tokens[2].kind, TokenKind::EndOfFile);
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_end_of_line_at_every_newline() {
        let (tokens, _) = lex("a\n\nb\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::EndOfLine,
                TokenKind::EndOfLine,
                TokenKind::Identifier,
                TokenKind::EndOfLine,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_delimiters_and_punctuation() {
        let (tokens, _) = lex("( ) [ ] < > , : $ ? =");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::OpenSquareBracket,
                TokenKind::CloseSquareBracket,
                TokenKind::OpenAngleBracket,
                TokenKind::CloseAngleBracket,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Dollar,
                TokenKind::QuestionMark,
                TokenKind::Directive,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_token_spans_cover_source() {
        let src = "mov eax, 1\n";
        let (tokens, _) = lex(src);
        for token in &tokens {
            assert!(token.span.lo < token.span.hi, "token {:?}", token);
            assert!(token.span.hi <= src.len(), "token {:?}", token);
        }
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 7));
    }

    #[test]
    fn test_global_start_pos_offsets_spans() {
        let handler = Handler::new();
        let tokens = Lexer::new(&handler, "mov", 100).tokenize();
        assert_eq!(tokens[0].span, Span::new(100, 103));
    }

    #[test]
    fn test_panic_flag_clears_at_line_boundary() {
        let handler = Handler::new();
        let _ = Lexer::new(&handler, "12x 34y\n56z\n", 0).tokenize();
        // one diagnostic per malformed line, not per malformed token
        assert_eq!(handler.error_count(), 2);
    }

    #[test]
    fn test_split_base_suffix() {
        assert_eq!(split_base_suffix("0FFh"), ("0FF", 16));
        assert_eq!(split_base_suffix("1y"), ("1", 2));
        assert_eq!(split_base_suffix("77q"), ("77", 8));
        assert_eq!(split_base_suffix("9t"), ("9", 10));
        assert_eq!(split_base_suffix("42"), ("42", 10));
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, handler) = lex("@");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert_eq!(
            handler.diagnostics()[0].code,
            ErrorCode::UnexpectedCharacter
        );
    }
}
