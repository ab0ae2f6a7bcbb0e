//! Parser tests: grammar shapes, diagnostics, and per-line recovery.

use asmlint_lex::Lexer;
use asmlint_util::{ErrorCode, Handler};

use crate::ast::*;
use crate::Parser;

fn parse(src: &str) -> (Program, Handler) {
    let handler = Handler::new();
    let tokens = Lexer::new(&handler, src, 0).tokenize();
    let program = Parser::new(&handler, &tokens).parse();
    (program, handler)
}

fn codes(handler: &Handler) -> Vec<ErrorCode> {
    handler.diagnostics().iter().map(|d| d.code).collect()
}

#[test]
fn test_minimal_program() {
    let (program, handler) = parse(".CODE\n MOV EAX, 1\n END\n");
    assert!(!handler.has_errors());
    assert_eq!(program.statements.len(), 2);
    assert!(program.end_dir.is_some());
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    assert_eq!(instr.mnemonic.as_ref().unwrap().lexeme, "MOV");
    assert_eq!(instr.operands.len(), 2);
}

#[test]
fn test_end_with_entry_point() {
    let (program, handler) = parse(".CODE\nstart: MOV EAX, 1\n END start\n");
    assert!(!handler.has_errors());
    let end_dir = program.end_dir.unwrap();
    assert!(end_dir.address.is_some());
}

#[test]
fn test_missing_end_directive() {
    let (_, handler) = parse(".CODE\n MOV EAX, 1\n");
    assert_eq!(codes(&handler), vec![ErrorCode::ExpectedEndDirective]);
}

#[test]
fn test_bare_label_line() {
    let (program, handler) = parse(".CODE\nstart:\n END\n");
    assert!(!handler.has_errors());
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    assert_eq!(instr.label.as_ref().unwrap().lexeme, "start");
    assert!(instr.mnemonic.is_none());
}

#[test]
fn test_statement_outside_segment() {
    let (_, handler) = parse(" MOV EAX, 1\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::MustBeInSegmentBlock]);
}

#[test]
fn test_data_lines_parse_in_data_segment() {
    let (program, handler) = parse(".DATA\nV DB 1, 2, 3\nDB 4\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Data(named)) = &program.statements[1] else {
        panic!("expected data directive");
    };
    assert_eq!(named.id.as_ref().unwrap().lexeme, "V");
    let InitValue::List(items) = &named.item.init else {
        panic!("expected initializer list");
    };
    assert_eq!(items.len(), 3);

    let Statement::Directive(Directive::Data(unnamed)) = &program.statements[2] else {
        panic!("expected data directive");
    };
    assert!(unnamed.id.is_none());
}

#[test]
fn test_dup_initializer() {
    let (program, handler) = parse(".DATA\nbuf DB 16 DUP (0)\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Data(data)) = &program.statements[1] else {
        panic!("expected data directive");
    };
    let InitValue::List(items) = &data.item.init else {
        panic!("expected list");
    };
    assert!(matches!(items[0], InitValue::Dup { .. }));
}

#[test]
fn test_struct_instance_initializer() {
    let (program, handler) = parse(".DATA\nX S <>\nY S <1, 2>\n END\n");
    assert!(!handler.has_errors());
    for idx in [1, 2] {
        let Statement::Directive(Directive::Data(data)) = &program.statements[idx] else {
            panic!("expected data directive");
        };
        let InitValue::List(items) = &data.item.init else {
            panic!("expected list");
        };
        assert!(matches!(items[0], InitValue::StructOrRecord { .. }));
    }
}

#[test]
fn test_question_mark_initializer() {
    let (program, handler) = parse(".DATA\nV DD ?\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Data(data)) = &program.statements[1] else {
        panic!("expected data directive");
    };
    let InitValue::List(items) = &data.item.init else {
        panic!("expected list");
    };
    assert!(matches!(items[0], InitValue::QuestionMark(_)));
}

#[test]
fn test_struct_block() {
    let (program, handler) = parse(".DATA\nS STRUC\nF DD ?\nG DW 0\nS ENDS\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Struct(s)) = &program.statements[1] else {
        panic!("expected struct directive");
    };
    assert_eq!(s.first_id.lexeme, "S");
    assert_eq!(s.fields.len(), 2);
    assert_eq!(s.second_id.lexeme, "S");
}

#[test]
fn test_struct_mismatched_closing_identifier() {
    let (_, handler) = parse(".DATA\nS STRUC\nF DD ?\nT ENDS\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::ExpectedMatchingIdentifier]);
}

#[test]
fn test_bare_ends_missing_identifier() {
    let (_, handler) = parse(".DATA\nS STRUC\nF DD ?\nENDS\n END\n");
    assert_eq!(
        codes(&handler),
        vec![ErrorCode::MissingIdentifierBeforeBlockEnd]
    );
}

#[test]
fn test_proc_block() {
    let (program, handler) = parse(".CODE\nmain PROC\n MOV EAX, 1\n RET\nmain ENDP\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Proc(p)) = &program.statements[1] else {
        panic!("expected proc directive");
    };
    assert_eq!(p.instructions.len(), 2);
}

#[test]
fn test_keyword_without_identifier() {
    for (src, _kw) in [
        (".DATA\nSTRUC\n END\n", "STRUC"),
        (".CODE\nPROC\n END\n", "PROC"),
        (".DATA\nEQU\n END\n", "EQU"),
        (".DATA\n= 5\n END\n", "="),
        (".DATA\nRECORD\n END\n", "RECORD"),
    ] {
        let (_, handler) = parse(src);
        assert_eq!(codes(&handler), vec![ErrorCode::ExpectedIdentifier], "src = {src:?}");
    }
}

#[test]
fn test_equ_and_equal_directives() {
    let (program, handler) = parse(".DATA\nN EQU 8\nM = N + 1\n END\n");
    assert!(!handler.has_errors());
    assert!(matches!(
        program.statements[1],
        Statement::Directive(Directive::Equ(_))
    ));
    assert!(matches!(
        program.statements[2],
        Statement::Directive(Directive::Equal(_))
    ));
}

#[test]
fn test_record_directive() {
    let (program, handler) = parse(".DATA\nR RECORD high:4, low:4 = 1\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Record(r)) = &program.statements[1] else {
        panic!("expected record directive");
    };
    assert_eq!(r.fields.len(), 2);
    assert_eq!(r.fields[0].id.lexeme, "high");
    assert!(r.fields[0].initial.is_none());
    assert!(r.fields[1].initial.is_some());
}

#[test]
fn test_precedence_multiplication_binds_tighter() {
    let (program, _) = parse(".CODE\n MOV EAX, 1 + 2 * 3\n END\n");
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    let ExprKind::Binary { op, right, .. } = &instr.operands[1].kind else {
        panic!("expected binary operator at the top");
    };
    assert_eq!(op.lexeme, "+");
    assert!(matches!(right.kind, ExprKind::Binary { .. }));
}

#[test]
fn test_implicit_plus_from_indexing() {
    let (program, handler) = parse(".CODE\n MOV EAX, x[4]\n END\n");
    assert!(!handler.has_errors());
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    let ExprKind::ImplicitPlus { left, right } = &instr.operands[1].kind else {
        panic!("expected implicit plus");
    };
    assert!(matches!(left.kind, ExprKind::Leaf { .. }));
    assert!(matches!(right.kind, ExprKind::SquareBrackets { .. }));
}

#[test]
fn test_dot_member_access() {
    let (program, handler) = parse(".CODE\n MOV EAX, x.field\n END\n");
    assert!(!handler.has_errors());
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    let ExprKind::Binary { op, .. } = &instr.operands[1].kind else {
        panic!("expected binary dot");
    };
    assert_eq!(op.lexeme, ".");
}

#[test]
fn test_unary_prefix_operators() {
    let (program, handler) = parse(".CODE\n MOV EAX, OFFSET x\n PUSH -1\n END\n");
    assert!(!handler.has_errors());
    let Statement::Instruction(instr) = &program.statements[1] else {
        panic!("expected instruction");
    };
    let ExprKind::Unary { op, .. } = &instr.operands[1].kind else {
        panic!("expected unary");
    };
    assert_eq!(op.upper(), "OFFSET");
}

#[test]
fn test_unclosed_delimiter() {
    let (_, handler) = parse(".CODE\n MOV EAX, (1 + 2\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::UnclosedDelimiter]);
    let diags = handler.diagnostics();
    // the secondary label points back at the opener
    assert_eq!(diags[0].secondary_labels.len(), 1);
}

#[test]
fn test_unexpected_closing_delimiter() {
    let (_, handler) = parse(".CODE\n MOV EAX, )\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::UnexpectedClosingDelimiter]);
}

#[test]
fn test_adjacent_leaves_inside_delimiters() {
    let (_, handler) = parse(".CODE\n MOV EAX, (1 x)\n END\n");
    assert_eq!(
        codes(&handler),
        vec![ErrorCode::ExpectedOperatorOrClosingDelimiter]
    );
}

#[test]
fn test_expected_expression_notes_binary_operators() {
    let (_, handler) = parse(".CODE\n MOV EAX, 10 * MOD 3\n END\n");
    let diags = handler.diagnostics();
    assert_eq!(diags[0].code, ErrorCode::ExpectedExpression);
    assert_eq!(diags[0].note.as_deref(), Some("MOD operator takes 2 arguments"));
}

#[test]
fn test_one_diagnostic_per_line_with_recovery() {
    let (program, handler) = parse(".CODE\n MOV EAX, (1\n MOV EBX, )\n MOV ECX, 3\n END\n");
    // both bad lines diagnosed once each, the good line still parses
    assert_eq!(
        codes(&handler),
        vec![
            ErrorCode::UnclosedDelimiter,
            ErrorCode::UnexpectedClosingDelimiter,
        ]
    );
    assert_eq!(program.statements.len(), 2); // .CODE + the good MOV
}

#[test]
fn test_stack_segment_with_size() {
    let (program, handler) = parse(".STACK 100h\n.CODE\n END\n");
    assert!(!handler.has_errors());
    let Statement::Directive(Directive::Seg(seg)) = &program.statements[0] else {
        panic!("expected segment directive");
    };
    assert!(seg.stack_size.is_some());
}

#[test]
fn test_trailing_garbage_after_operands() {
    let (_, handler) = parse(".CODE\n MOV EAX, 1 2\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::ExpectedCommaOrEndOfLine]);
}

#[test]
fn test_invalid_token_not_rediagnosed() {
    // the lexer reports the malformed constant; the parser stays silent
    let (_, handler) = parse(".CODE\n MOV EAX, 12xy\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::ConstantParseError]);
}

#[test]
fn test_dup_missing_open_bracket() {
    let (_, handler) = parse(".DATA\nV DB 3 DUP 0\n END\n");
    assert_eq!(codes(&handler), vec![ErrorCode::ExpectedOpenBracket]);
}

#[test]
fn test_unclosed_angle_initializer() {
    let (_, handler) = parse(".DATA\nX S <1, 2\n END\n");
    assert_eq!(
        codes(&handler),
        vec![ErrorCode::UnclosedDelimiterInInitializer]
    );
}
