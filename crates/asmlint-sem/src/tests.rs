//! Analyzer tests: evaluation laws, layout, forward references, and the
//! per-mnemonic operand rules.

use asmlint_lex::Lexer;
use asmlint_par::Parser;
use asmlint_util::{ErrorCode, Handler, Level};

use crate::symbols::SymbolKind;
use crate::{SemanticAnalyzer, SymbolTable};

fn analyze(src: &str) -> (Handler, SymbolTable) {
    let handler = Handler::new();
    let tokens = Lexer::new(&handler, src, 0).tokenize();
    let mut program = Parser::new(&handler, &tokens).parse();
    let mut symbols = SymbolTable::new();
    SemanticAnalyzer::new(&handler, &mut symbols).analyze(&mut program);
    (handler, symbols)
}

fn error_codes(handler: &Handler) -> Vec<ErrorCode> {
    handler
        .diagnostics()
        .iter()
        .filter(|d| d.level == Level::Error && !d.is_cancelled())
        .map(|d| d.code)
        .collect()
}

#[test]
fn test_byte_array_and_dword_register() {
    let src = ".DATA\nV DB 1,2,3\n.CODE\nstart: MOV EAX, V\n END start\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);

    let symbol = symbols.get("V").unwrap();
    let variable = symbol.as_data_variable().unwrap();
    assert_eq!(variable.size_of, 3);
    assert_eq!(variable.length_of, 3);
}

#[test]
fn test_word_variable_byte_register_mismatch() {
    let src = ".DATA\nV DW 1\n.CODE\n MOV AL, V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::OperandsDifferentSize]);
}

#[test]
fn test_esp_with_base_register_in_brackets() {
    let src = ".CODE\n MOV [EAX + ESP], 1\n END\n";
    let (handler, _) = analyze(src);
    let codes = error_codes(&handler);
    assert_eq!(codes.len(), 1);
    assert!(
        codes[0] == ErrorCode::TwoEspRegisters || codes[0] == ErrorCode::IncorrectIndexRegister,
        "unexpected code {:?}",
        codes[0]
    );
}

#[test]
fn test_forward_reference_resolves_in_second_pass() {
    let src = ".DATA\n A DD B\n B DD 5\n .CODE\n MOV EAX, A\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    // B sits right after A's four bytes
    let b = symbols.get("B").unwrap().as_data_variable().unwrap().offset;
    assert_eq!(b, 4);
}

#[test]
fn test_division_by_zero() {
    let src = ".CODE\n MOV EAX, 1/0\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::DivisionByZeroInExpression]
    );
}

#[test]
fn test_struct_field_access() {
    let src = ".DATA\n S STRUC\n F DD ?\n S ENDS\n X S <>\n .CODE\n MOV EAX, X.F\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);

    let SymbolKind::Struct(data) = &symbols.get("S").unwrap().kind else {
        panic!("expected a struct symbol");
    };
    assert_eq!(data.size, 4);
    let x = symbols.get("X").unwrap().as_data_variable().unwrap();
    assert_eq!(x.size_of, 4);
    assert_eq!(x.length_of, 1);
}

#[test]
fn test_struct_layout_is_sum_of_fields() {
    let src = ".DATA\nS STRUC\nA DD ?\nB DW ?\nC DB 1, 2\nS ENDS\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let SymbolKind::Struct(data) = &symbols.get("S").unwrap().kind else {
        panic!("expected a struct symbol");
    };
    assert_eq!(data.size, 8);
    assert_eq!(data.field("A").unwrap().offset, 0);
    assert_eq!(data.field("B").unwrap().offset, 4);
    assert_eq!(data.field("C").unwrap().offset, 6);
}

#[test]
fn test_undefined_symbol_each_referencing_line() {
    let src = ".DATA\nA DD B\n.CODE\n MOV EAX, A\n END\n";
    let (handler, _) = analyze(src);
    // B does not exist: one diagnostic on A's line in pass 1, and A never
    // becomes defined, so the MOV line gets exactly one more in pass 2
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::UndefinedSymbol, ErrorCode::UndefinedSymbol]
    );
}

#[test]
fn test_missing_symbol_is_immediate_error() {
    let src = ".CODE\n MOV EAX, nothing\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::UndefinedSymbol]);
}

#[test]
fn test_equ_and_equal_constants() {
    let src = ".DATA\nN EQU 8\nM = N + 1\nV DD M\n.CODE\n MOV EAX, N\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let SymbolKind::EqualConstant(m) = &symbols.get("M").unwrap().kind else {
        panic!("expected `=` constant");
    };
    assert_eq!(m.value, 9);
}

#[test]
fn test_equ_requires_constant() {
    let src = ".DATA\nV DD 1\nN EQU V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::ExpressionMustBeConstant]
    );
}

#[test]
fn test_record_layout() {
    let src = ".DATA\nR RECORD high:3, mid:4, low:5\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);

    let SymbolKind::Record(record) = &symbols.get("R").unwrap().kind else {
        panic!("expected record symbol");
    };
    assert_eq!(record.width, 12);
    assert_eq!(record.mask, 1 << 11);

    // shifts partition [0, width): the last field sits at bit 0
    let SymbolKind::RecordField(low) = &symbols.get("low").unwrap().kind else {
        panic!("expected record field");
    };
    let SymbolKind::RecordField(mid) = &symbols.get("mid").unwrap().kind else {
        panic!("expected record field");
    };
    let SymbolKind::RecordField(high) = &symbols.get("high").unwrap().kind else {
        panic!("expected record field");
    };
    assert_eq!(low.shift, 0);
    assert_eq!(mid.shift, 5);
    assert_eq!(high.shift, 9);
    assert_eq!(low.width + mid.width + high.width, record.width);
}

#[test]
fn test_record_width_too_big() {
    let src = ".DATA\nR RECORD a:20, b:20\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::RecordWidthTooBig]);
}

#[test]
fn test_record_field_width_must_be_positive() {
    let src = ".DATA\nR RECORD a:0\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::RecordFieldWidthMustBePositive]
    );
}

#[test]
fn test_width_and_mask_operators() {
    let src = ".DATA\nR RECORD a:3, b:5\nV DD WIDTH R\nW DD MASK b\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_width_rejects_data_variables() {
    let src = ".DATA\nV DD 1\nW DD WIDTH V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::UnaryOperatorIncorrectArgument]
    );
}

#[test]
fn test_size_and_length_attributes() {
    // SIZE/LENGTH describe the first initializer, SIZEOF/LENGTHOF the
    // whole definition
    let src = ".DATA\nV DW 4 DUP (1), 2, 3\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let v = symbols.get("V").unwrap().as_data_variable().unwrap();
    assert_eq!(v.size, 8);
    assert_eq!(v.length, 4);
    assert_eq!(v.size_of, 12);
    assert_eq!(v.length_of, 6);
}

#[test]
fn test_db_string_is_byte_array() {
    let src = ".DATA\nV DB \"ABCDE\"\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let v = symbols.get("V").unwrap().as_data_variable().unwrap();
    assert_eq!(v.size_of, 5);
    assert_eq!(v.length_of, 5);
}

#[test]
fn test_long_string_outside_db_rejected() {
    let src = ".DATA\nV DD \"ABCDE\"\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::StringTooLarge]);
}

#[test]
fn test_four_char_string_packs_into_dword() {
    let src = ".DATA\nV DD \"ABCD\"\n.CODE\n MOV EAX, \"AB\"\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_constant_too_large_32bit() {
    let src = ".CODE\n MOV EAX, 100000000h\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::ConstantTooLarge]);
}

#[test]
fn test_dq_takes_64bit_constants() {
    let src = ".DATA\nV DQ 100000000h\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let v = symbols.get("V").unwrap().as_data_variable().unwrap();
    assert_eq!(v.size_of, 8);
}

#[test]
fn test_registers_rejected_in_data_expressions() {
    let src = ".DATA\nV DD EAX\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::CantHaveRegistersInExpression]
    );
}

#[test]
fn test_unfinished_memory_operand_rejected_at_top() {
    let src = ".CODE\n MOV EAX, EBX + 1\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::CantHaveRegistersInExpression]
    );
}

#[test]
fn test_scale_values() {
    let (handler, _) = analyze(".CODE\n MOV EAX, [EBX*2]\n END\n");
    assert_eq!(error_codes(&handler), vec![]);

    let (handler, _) = analyze(".CODE\n MOV EAX, [EBX*3]\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::InvalidScaleValue]);

    let (handler, _) = analyze(".CODE\n MOV EAX, [ESP*2]\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::IncorrectIndexRegister]
    );
}

#[test]
fn test_one_register_per_bracket_pair() {
    let (handler, _) = analyze(".CODE\n MOV EAX, [EBX+ECX]\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::MoreThanOneRegisterInSquareBrackets]
    );

    // an implicit plus of two bracket pairs is the legal spelling
    let (handler, _) = analyze(".CODE\n MOV EAX, [EBX][ECX]\n END\n");
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_more_than_two_registers() {
    let (handler, _) = analyze(".CODE\n MOV EAX, [EBX][ECX][EDX]\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::MoreThanTwoRegisters]);
}

#[test]
fn test_two_esp_in_implicit_plus() {
    let (handler, _) = analyze(".CODE\n MOV [ESP][ESP], 1\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::TwoEspRegisters]);
}

#[test]
fn test_non_32bit_register_in_address() {
    let (handler, _) = analyze(".CODE\n MOV EAX, [BX]\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::Non32bitRegister]);
}

#[test]
fn test_cant_add_two_variables() {
    let src = ".DATA\nA DD 1\nB DD 2\n.CODE\n MOV EAX, A + B\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::CantAddVariables]);
}

#[test]
fn test_address_difference_is_constant() {
    let src = ".DATA\nA DD 1\nB DD 2\n.CODE\n MOV EAX, B - A\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_ptr_overrides_size() {
    let src = ".DATA\nV DW 1\n.CODE\n MOV AL, BYTE PTR V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_ptr_rejects_register_pointee() {
    let src = ".CODE\n MOV EAX, DWORD PTR EBX\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::PtrOperatorIncorrectArgument]
    );
}

#[test]
fn test_offset_operator() {
    let src = ".DATA\nV DW 1\n.CODE\n MOV EAX, OFFSET V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_type_warns_on_untyped_expression() {
    let src = ".CODE\n MOV EAX, TYPE 5\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    assert_eq!(handler.warning_count(), 1);
    let warning = handler
        .diagnostics()
        .into_iter()
        .find(|d| d.level == Level::Warning)
        .unwrap();
    assert_eq!(warning.code, ErrorCode::TypeReturnsZero);
}

#[test]
fn test_jump_targets() {
    let src = ".CODE\nmain PROC\n MOV EAX, 1\nmain ENDP\nstart: JMP start\n CALL main\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_jump_to_variable_rejected() {
    let src = ".DATA\nV DD 1\n.CODE\n JMP V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::OperandMustBeLabel]);
}

#[test]
fn test_forward_jump_resolves() {
    let src = ".CODE\n JMP later\nlater: MOV EAX, 1\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_lea_rules() {
    let src = ".DATA\nV DD 1\n.CODE\n LEA EAX, V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);

    let src = ".DATA\nV DD 1\n.CODE\n LEA AX, V\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::InvalidOperandSize]);
}

#[test]
fn test_two_memory_operands_rejected() {
    let src = ".DATA\nA DD 1\nB DD 2\n.CODE\n MOV A, B\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::CantHaveTwoMemoryOperands]
    );
}

#[test]
fn test_immediate_destination_rejected() {
    let src = ".CODE\n MOV 1, EAX\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::DestOperandCantBeImmediate]
    );
}

#[test]
fn test_immediate_too_big_for_destination() {
    let src = ".CODE\n MOV AL, 300\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::ImmediateTooBig]);
}

#[test]
fn test_push_and_pop_sizes() {
    let (handler, _) = analyze(".CODE\n PUSH EAX\n POP EAX\n PUSH 5\n END\n");
    assert_eq!(error_codes(&handler), vec![]);

    let (handler, _) = analyze(".CODE\n POP AX\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::InvalidOperandSize]);
}

#[test]
fn test_ret_operand() {
    let (handler, _) = analyze(".CODE\n RET\n RET 8\n END\n");
    assert_eq!(error_codes(&handler), vec![]);

    let (handler, _) = analyze(".CODE\n RET 100000\n END\n");
    assert_eq!(error_codes(&handler), vec![ErrorCode::InvalidOperandSize]);
}

#[test]
fn test_shift_count_rules() {
    let (handler, _) = analyze(".CODE\n SHL EAX, 1\n SHR EBX, CL\n END\n");
    assert_eq!(error_codes(&handler), vec![]);

    let (handler, _) = analyze(".CODE\n SHL EAX, EBX\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::OperandMustBeImmediateOrClRegister]
    );
}

#[test]
fn test_movzx_widths() {
    let (handler, _) = analyze(".DATA\nV DB 1\n.CODE\n MOVZX EAX, V\n END\n");
    assert_eq!(error_codes(&handler), vec![]);

    let (handler, _) = analyze(".CODE\n MOVZX AL, AX\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::FirstOperandMustBeBiggerThanSecond]
    );
}

#[test]
fn test_operand_count_mismatch() {
    let (handler, _) = analyze(".CODE\n MOV EAX\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::InvalidNumberOfOperands]
    );

    let (handler, _) = analyze(".CODE\n CDQ EAX\n END\n");
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::InvalidNumberOfOperands]
    );
}

#[test]
fn test_duplicate_labels() {
    let src = ".CODE\nx: MOV EAX, 1\nx: MOV EBX, 2\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::SymbolAlreadyDefined]);
}

#[test]
fn test_equal_constant_can_be_reassigned() {
    let src = ".DATA\nX = 1\nX = 2\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_division_by_forward_zero_reported_in_pass_two() {
    let src = ".DATA\nA DD 1/N\nN EQU 0\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::DivisionByZeroInExpression]
    );
}

#[test]
fn test_dup_initializer_sizing() {
    let src = ".DATA\nbuf DB 16 DUP (0)\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let buf = symbols.get("buf").unwrap().as_data_variable().unwrap();
    assert_eq!(buf.size_of, 16);
    assert_eq!(buf.length_of, 16);
}

#[test]
fn test_nested_dup_multiplies() {
    let src = ".DATA\nbuf DW 2 DUP (3 DUP (0))\n END\n";
    let (handler, symbols) = analyze(src);
    assert_eq!(error_codes(&handler), vec![]);
    let buf = symbols.get("buf").unwrap().as_data_variable().unwrap();
    assert_eq!(buf.size_of, 12);
    assert_eq!(buf.length_of, 6);
}

#[test]
fn test_initializer_too_large() {
    let src = ".DATA\nV DB 300\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::InitializerTooLarge]);
}

#[test]
fn test_struct_initializer_field_count() {
    let src = ".DATA\nS STRUC\nA DD ?\nS ENDS\nX S <1, 2>\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(error_codes(&handler), vec![ErrorCode::TooManyInitialValues]);
}

#[test]
fn test_struct_needs_angle_initializer() {
    let src = ".DATA\nS STRUC\nA DD ?\nS ENDS\nX S 5\n END\n";
    let (handler, _) = analyze(src);
    assert_eq!(
        error_codes(&handler),
        vec![ErrorCode::ExpectedStrucOrRecordInitializer]
    );
}

#[test]
fn test_stack_directive_constant() {
    let (handler, _) = analyze(".STACK 100h\n.CODE\n MOV EAX, 1\n END\n");
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_dollar_is_relocatable_dword() {
    let (handler, _) = analyze(".CODE\n MOV EAX, $\n END\n");
    assert_eq!(error_codes(&handler), vec![]);
}

#[test]
fn test_reanalysis_is_idempotent() {
    let src = ".DATA\nA DD B\nB DD 5\nV DW 1\n.CODE\n MOV AL, V\n MOV EAX, 1/0\n END\n";
    let handler = Handler::new();
    let tokens = Lexer::new(&handler, src, 0).tokenize();
    let mut program = Parser::new(&handler, &tokens).parse();

    let first_handler = Handler::new();
    let mut first_symbols = SymbolTable::new();
    SemanticAnalyzer::new(&first_handler, &mut first_symbols).analyze(&mut program);

    let second_handler = Handler::new();
    let mut second_symbols = SymbolTable::new();
    SemanticAnalyzer::new(&second_handler, &mut second_symbols).analyze(&mut program);

    assert_eq!(error_codes(&first_handler), error_codes(&second_handler));
}
