//! Diagnostic constructors for the analyzer.
//!
//! Every function builds one diagnostic and hands it to the session's
//! handler, which enforces the one-diagnostic-per-line discipline.
//! Warnings bypass the panic flag.

use asmlint_lex::{Token, TokenKind};
use asmlint_par::ast::{Expr, OperandSize, OperandType, RecordField};
use asmlint_util::{Diagnostic, ErrorCode, ErrorReported, Span};
use indexmap::IndexMap;

use crate::eval::register_size;
use crate::SemanticAnalyzer;

/// The user-facing wording for what an expression evaluated to
pub(crate) fn operand_kind_name(expr: &Expr) -> &'static str {
    if let Some(token) = expr.as_leaf() {
        return match token.kind {
            TokenKind::Identifier => "identifier",
            TokenKind::Number | TokenKind::StringLiteral => "constant",
            TokenKind::Type => "builtin type",
            TokenKind::Register => "register",
            TokenKind::Dollar => "address expression",
            _ => "error",
        };
    }
    if expr.ann.constant_value.is_some() {
        return "constant expression";
    }
    match expr.ann.operand_type {
        OperandType::Register => "register",
        OperandType::Immediate => "immediate operand",
        OperandType::UnfinishedMemory => "invalid expression",
        _ => {
            if expr.ann.registers.is_empty() {
                "address expression"
            } else {
                "address expression with modificators"
            }
        }
    }
}

impl<'a> SemanticAnalyzer<'a> {
    // ========================================================================
    // Symbols
    // ========================================================================

    pub(crate) fn report_undefined_symbol(
        &self,
        token: &Token,
        defined_later: bool,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::UndefinedSymbol,
            format!("undefined symbol `{}`", token.lexeme),
        )
        .with_primary_label(token.span, "");
        if defined_later {
            diag = diag.with_note("the symbol is defined later; forward references are not allowed here");
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_symbol_already_defined(
        &self,
        token: &Token,
        previous: &Token,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::SymbolAlreadyDefined,
                format!("symbol `{}` is already defined", token.lexeme),
            )
            .with_primary_label(token.span, "")
            .with_secondary_label(previous.span, "first defined here"),
        )
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(crate) fn report_expression_must_be_constant(&self, expr: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpressionMustBeConstant,
                "expression must be constant",
            )
            .with_primary_label(
                expr.span(),
                format!("expected `constant expression`, found `{}`", operand_kind_name(expr)),
            ),
        )
    }

    pub(crate) fn report_cant_have_registers(&self, expr: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::CantHaveRegistersInExpression,
                "can't have registers in this expression",
            )
            .with_primary_label(expr.span(), "")
            .with_help("wrap the register part in `[...]` to form an address expression"),
        )
    }

    pub(crate) fn report_register_not_allowed(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::CantHaveRegistersInExpression,
                "registers are not allowed in this expression",
            )
            .with_primary_label(token.span, ""),
        )
    }

    pub(crate) fn report_cant_add_variables(
        &self,
        op_span: Option<Span>,
        left: &Expr,
        right: &Expr,
    ) -> ErrorReported {
        let first = crate::eval::first_relocatable_leaf(left);
        let second = crate::eval::first_relocatable_leaf(right);
        let mut diag = Diagnostic::error(
            ErrorCode::CantAddVariables,
            "can't add two relocatable values",
        );
        if let Some(op_span) = op_span {
            diag = diag.with_primary_label(op_span, "");
            if let Some(first) = first {
                diag = diag.with_secondary_label(first.span, "first variable");
            }
            if let Some(second) = second {
                diag = diag.with_secondary_label(second.span, "second variable");
            }
        } else {
            match (first, second) {
                (Some(first), Some(second)) => {
                    diag = diag
                        .with_primary_label(first.span, "first variable")
                        .with_secondary_label(second.span, "second variable");
                }
                _ => {
                    diag = diag.with_primary_label(left.span().merge(right.span()), "");
                }
            }
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_more_than_two_registers(
        &self,
        registers: &IndexMap<Token, Option<i64>>,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::MoreThanTwoRegisters,
            "address expression can't contain more than 2 registers",
        );
        for (idx, reg) in registers.keys().enumerate() {
            if idx == 0 {
                diag = diag.with_primary_label(reg.span, "help: register");
            } else {
                diag = diag.with_secondary_label(reg.span, "help: register");
            }
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_more_than_one_scale(
        &self,
        registers: &IndexMap<Token, Option<i64>>,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::MoreThanOneScale,
            "address expression can't have more than 1 scale factor",
        );
        let mut first = true;
        for (reg, scale) in registers {
            if scale.is_none() {
                continue;
            }
            if first {
                diag = diag.with_primary_label(reg.span, "help: this register has a scale");
                first = false;
            } else {
                diag = diag.with_secondary_label(reg.span, "help: this register has a scale");
            }
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_two_esp(
        &self,
        registers: &IndexMap<Token, Option<i64>>,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::TwoEspRegisters,
            "address expression can't contain `ESP` twice",
        );
        let mut first = true;
        for reg in registers.keys() {
            if !reg.matches("ESP") {
                continue;
            }
            if first {
                diag = diag.with_primary_label(reg.span, "help: this is a ESP register");
                first = false;
            } else {
                diag = diag.with_secondary_label(reg.span, "help: this is a ESP register");
            }
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_non_32bit_register(
        &self,
        registers: &IndexMap<Token, Option<i64>>,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::Non32bitRegister,
            "address expression registers must be 32-bit",
        );
        let mut first = true;
        for reg in registers.keys() {
            let Some(size) = register_size(&reg.lexeme) else {
                continue;
            };
            if size == 4 {
                continue;
            }
            let label = format!("help: this is a {} byte register", size);
            if first {
                diag = diag.with_primary_label(reg.span, label);
                first = false;
            } else {
                diag = diag.with_secondary_label(reg.span, label);
            }
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_more_than_one_register_in_square_brackets(
        &self,
        expr: &Expr,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::MoreThanOneRegisterInSquareBrackets,
                "only one register is allowed inside `[...]`",
            )
            .with_primary_label(expr.span(), ""),
        )
    }

    pub(crate) fn report_invalid_scale_value(
        &self,
        scale_expr: &Expr,
        value: i64,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::InvalidScaleValue, "invalid scale value")
                .with_primary_label(
                    scale_expr.span(),
                    format!("this evaluates to `{}`", value),
                )
                .with_note("scale can only be {1, 2, 4, 8}"),
        )
    }

    pub(crate) fn report_incorrect_index_register(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::IncorrectIndexRegister,
                "`ESP` can't be used as an index register",
            )
            .with_primary_label(token.span, ""),
        )
    }

    pub(crate) fn report_division_by_zero(&self, op: &Token, right: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::DivisionByZeroInExpression,
                "division by zero in expression",
            )
            .with_primary_label(op.span, "")
            .with_secondary_label(right.span(), "this evaluates to `0`"),
        )
    }

    pub(crate) fn report_binary_incorrect_argument(
        &self,
        op: &Token,
        left: &Expr,
        right: &Expr,
    ) -> ErrorReported {
        let op_upper = op.upper();
        let mut diag = Diagnostic::error(
            ErrorCode::BinaryOperatorIncorrectArgument,
            format!("operator `{}` has incorrect arguments", op_upper),
        );
        if left.ann.operand_type == OperandType::Register && op_upper == "*" {
            diag = diag.with_primary_label(op.span, "").with_secondary_label(
                right.span(),
                format!(
                    "expected `constant expression`, found `{}`",
                    operand_kind_name(right)
                ),
            );
        } else if right.ann.operand_type == OperandType::Register && op_upper == "*" {
            diag = diag.with_primary_label(op.span, "").with_secondary_label(
                left.span(),
                format!(
                    "expected `constant expression`, found `{}`",
                    operand_kind_name(left)
                ),
            );
        } else {
            let label = if op_upper == "*" {
                "can only multiply constant expressions or a register by the scale".to_string()
            } else {
                format!("operator `{}` supports only constant expressions", op_upper)
            };
            diag = diag
                .with_primary_label(op.span, label)
                .with_secondary_label(
                    left.span(),
                    format!("help: this has type `{}`", operand_kind_name(left)),
                )
                .with_secondary_label(
                    right.span(),
                    format!("help: this has type `{}`", operand_kind_name(right)),
                );
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_binary_minus_incorrect_argument(
        &self,
        op: &Token,
        left: &Expr,
        right: &Expr,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::BinaryMinusOperatorIncorrectArgument,
                "operator `-` has incorrect arguments",
            )
            .with_primary_label(
                op.span,
                "can only subtract constant expressions or 2 address expressions",
            )
            .with_secondary_label(
                left.span(),
                format!("help: this has type `{}`", operand_kind_name(left)),
            )
            .with_secondary_label(
                right.span(),
                format!("help: this has type `{}`", operand_kind_name(right)),
            ),
        )
    }

    // ========================================================================
    // `.` and `PTR`
    // ========================================================================

    pub(crate) fn report_dot_incorrect_argument(
        &self,
        op: &Token,
        left: &Expr,
        right: &Expr,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::DotOperatorIncorrectArgument,
            "operator `.` has incorrect arguments",
        )
        .with_primary_label(op.span, "");
        if left.ann.constant_value.is_some()
            || left.ann.operand_type == OperandType::Register
            || left.ann.operand_type != OperandType::Memory
        {
            diag = diag.with_secondary_label(
                left.span(),
                format!(
                    "expected `address expression`, found `{}`",
                    operand_kind_name(left)
                ),
            );
        }
        let right_is_field = right
            .as_leaf()
            .map_or(false, |t| t.kind == TokenKind::Identifier);
        if !right_is_field {
            diag = diag.with_secondary_label(
                right.span(),
                format!("expected `identifier`, found `{}`", operand_kind_name(right)),
            );
        }
        self.handler.report(diag)
    }

    pub(crate) fn report_dot_size_not_specified(&self, op: &Token, left: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::DotOperatorSizeNotSpecified,
                "operand of `.` has no known type",
            )
            .with_primary_label(op.span, "")
            .with_secondary_label(left.span(), "this expression needs a struct type"),
        )
    }

    pub(crate) fn report_dot_type_not_struct(&self, op: &Token, actual: &str) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::DotOperatorTypeNotStruct,
                format!("type `{}` is not a struct", actual),
            )
            .with_primary_label(op.span, ""),
        )
    }

    pub(crate) fn report_dot_field_doesnt_exist(
        &self,
        field_token: &Token,
        struct_name: &str,
        field_name: &str,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::DotOperatorFieldDoesntExist,
                format!("struct `{}` has no field `{}`", struct_name, field_name),
            )
            .with_primary_label(field_token.span, ""),
        )
    }

    pub(crate) fn report_ptr_incorrect_argument(
        &self,
        op: &Token,
        left: &Expr,
        right: &Expr,
    ) -> ErrorReported {
        let mut diag = Diagnostic::error(
            ErrorCode::PtrOperatorIncorrectArgument,
            "operator `PTR` has incorrect arguments",
        )
        .with_primary_label(op.span, "");
        let left_is_type = left.as_leaf().map_or(false, |t| {
            t.kind == TokenKind::Type || t.kind == TokenKind::Identifier
        });
        if !left_is_type {
            diag = diag.with_secondary_label(
                left.span(),
                format!("expected `type`, found `{}`", operand_kind_name(left)),
            );
        }
        if matches!(
            right.ann.operand_type,
            OperandType::Register | OperandType::UnfinishedMemory
        ) || (right.ann.operand_type == OperandType::Immediate && !right.ann.is_relocatable)
        {
            diag = diag.with_secondary_label(
                right.span(),
                format!(
                    "expected `address expression`, found `{}`",
                    operand_kind_name(right)
                ),
            );
        }
        self.handler.report(diag)
    }

    // ========================================================================
    // Unary operators and leaves
    // ========================================================================

    pub(crate) fn report_unary_incorrect_argument(
        &self,
        op: &Token,
        operand: &Expr,
    ) -> ErrorReported {
        let op_upper = op.upper();
        let expected = match op_upper.as_str() {
            "LENGTH" | "LENGTHOF" | "SIZE" | "SIZEOF" | "WIDTH" | "MASK" => "expected `identifier`",
            "OFFSET" => "expected `address expression`",
            "TYPE" => "expected valid expression",
            _ => "expected `constant expression`",
        };
        self.handler.report(
            Diagnostic::error(
                ErrorCode::UnaryOperatorIncorrectArgument,
                format!("operator `{}` has an incorrect argument", op_upper),
            )
            .with_primary_label(op.span, "")
            .with_secondary_label(
                operand.span(),
                format!("{}, found `{}`", expected, operand_kind_name(operand)),
            ),
        )
    }

    pub(crate) fn warn_type_returns_zero(&self, op: &Token, operand: &Expr) {
        self.handler.report_warning(
            Diagnostic::warning(ErrorCode::TypeReturnsZero, "operator `TYPE` returns 0 here")
                .with_primary_label(op.span, "")
                .with_secondary_label(operand.span(), "this expression doesn't have a type"),
        );
    }

    pub(crate) fn report_constant_too_large(&self, token: &Token, bits: u32) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::ConstantTooLarge, "constant is too large")
                .with_primary_label(token.span, "")
                .with_note(format!("maximum allowed size is {} bits", bits)),
        )
    }

    pub(crate) fn report_string_too_large(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::StringTooLarge, "string literal is too large")
                .with_primary_label(token.span, "")
                .with_note("only strings up to 4 characters pack into a 32-bit value"),
        )
    }

    // ========================================================================
    // Data definitions
    // ========================================================================

    pub(crate) fn report_invalid_data_type(&self, token: &Token) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::InvalidDataType,
                format!("`{}` is not a data type", token.lexeme),
            )
            .with_primary_label(token.span, "")
            .with_note("a data type is `DB`, `DW`, `DD`, `DQ`, or a struct or record name"),
        )
    }

    pub(crate) fn report_initializer_too_large(
        &self,
        expr: &Expr,
        expected: &OperandSize,
        actual_bytes: i32,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::InitializerTooLarge,
                format!("initializer is too large for `{}`", expected.name),
            )
            .with_primary_label(
                expr.span(),
                format!("this needs {} bytes", actual_bytes),
            ),
        )
    }

    pub(crate) fn report_expected_single_item_initializer(
        &self,
        span: Span,
        type_token: &Token,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedSingleItemInitializer,
                format!("`{}` expects a plain initializer", type_token.upper()),
            )
            .with_primary_label(span, ""),
        )
    }

    pub(crate) fn report_expected_struc_or_record_initializer(
        &self,
        span: Span,
        type_token: &Token,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ExpectedStrucOrRecordInitializer,
                format!("`{}` expects a `<...>` initializer", type_token.lexeme),
            )
            .with_primary_label(span, ""),
        )
    }

    pub(crate) fn report_too_many_initial_values(
        &self,
        span: Span,
        type_token: &Token,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::TooManyInitialValues,
                format!("too many initial values for `{}`", type_token.lexeme),
            )
            .with_primary_label(span, ""),
        )
    }

    // ========================================================================
    // Records
    // ========================================================================

    pub(crate) fn report_record_width_too_big(&self, id: &Token, width: i32) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::RecordWidthTooBig,
                format!("record is {} bits wide; the limit is 32", width),
            )
            .with_primary_label(id.span, ""),
        )
    }

    pub(crate) fn report_record_field_width_must_be_positive(
        &self,
        field: &RecordField,
        width: i64,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::RecordFieldWidthMustBePositive,
                "record field width must be positive",
            )
            .with_primary_label(
                field.width.span(),
                format!("this evaluates to `{}`", width),
            ),
        )
    }

    pub(crate) fn report_record_field_width_too_big(
        &self,
        field: &RecordField,
        width: i64,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::RecordFieldWidthTooBig,
                format!("record field is {} bits wide; the limit is 31", width),
            )
            .with_primary_label(field.width.span(), ""),
        )
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    pub(crate) fn report_invalid_number_of_operands(
        &self,
        mnemonic: &Token,
        found: usize,
        expected: &str,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::InvalidNumberOfOperands,
                format!(
                    "`{}` expects {} operand(s), found {}",
                    mnemonic.upper(),
                    expected,
                    found
                ),
            )
            .with_primary_label(mnemonic.span, ""),
        )
    }

    pub(crate) fn report_cant_have_two_memory_operands(
        &self,
        mnemonic: &Token,
        first: &Expr,
        second: &Expr,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::CantHaveTwoMemoryOperands,
                format!("`{}` can't have two memory operands", mnemonic.upper()),
            )
            .with_primary_label(mnemonic.span, "")
            .with_secondary_label(first.span(), "memory operand")
            .with_secondary_label(second.span(), "memory operand"),
        )
    }

    pub(crate) fn report_dest_operand_cant_be_immediate(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::DestOperandCantBeImmediate,
                "destination operand can't be immediate",
            )
            .with_primary_label(operand.span(), ""),
        )
    }

    pub(crate) fn report_immediate_too_big(
        &self,
        mnemonic: &Token,
        src: &Expr,
        dst_bytes: i32,
        src_bytes: i32,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::ImmediateTooBig,
                format!(
                    "immediate operand needs {} bytes but the destination is {} byte(s)",
                    src_bytes, dst_bytes
                ),
            )
            .with_primary_label(src.span(), "")
            .with_secondary_label(mnemonic.span, ""),
        )
    }

    pub(crate) fn report_operands_different_size(
        &self,
        mnemonic: &Token,
        first: &Expr,
        second: &Expr,
        first_bytes: i32,
        second_bytes: i32,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OperandsDifferentSize,
                format!(
                    "operands have different sizes: {} byte(s) and {} byte(s)",
                    first_bytes, second_bytes
                ),
            )
            .with_primary_label(mnemonic.span, "")
            .with_secondary_label(first.span(), format!("{} byte(s)", first_bytes))
            .with_secondary_label(second.span(), format!("{} byte(s)", second_bytes)),
        )
    }

    pub(crate) fn report_one_operand_must_have_size(
        &self,
        mnemonic: &Token,
        first: &Expr,
        second: &Expr,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OneOperandMustHaveSize,
                "at least one operand must have a size",
            )
            .with_primary_label(mnemonic.span, "")
            .with_secondary_label(first.span(), "no known size")
            .with_secondary_label(second.span(), "no known size"),
        )
    }

    pub(crate) fn report_operand_must_have_size(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::OperandMustHaveSize, "operand must have a size")
                .with_primary_label(operand.span(), "")
                .with_help("use `PTR` to give the operand an explicit size"),
        )
    }

    pub(crate) fn report_operand_must_be_label(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OperandMustBeLabel,
                "operand must be a label or a procedure name",
            )
            .with_primary_label(
                operand.span(),
                format!("found `{}`", operand_kind_name(operand)),
            ),
        )
    }

    pub(crate) fn report_operand_must_be_memory_or_register(
        &self,
        operand: &Expr,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OperandMustBeMemoryOrRegister,
                "operand must be a memory or register operand",
            )
            .with_primary_label(
                operand.span(),
                format!("found `{}`", operand_kind_name(operand)),
            ),
        )
    }

    pub(crate) fn report_operand_must_be_register(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::OperandMustBeRegister, "operand must be a register")
                .with_primary_label(
                    operand.span(),
                    format!("found `{}`", operand_kind_name(operand)),
                ),
        )
    }

    pub(crate) fn report_operand_must_be_memory(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(ErrorCode::OperandMustBeMemory, "operand must be a memory operand")
                .with_primary_label(
                    operand.span(),
                    format!("found `{}`", operand_kind_name(operand)),
                ),
        )
    }

    pub(crate) fn report_operand_must_be_immediate(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OperandMustBeImmediate,
                "operand must be an immediate value",
            )
            .with_primary_label(
                operand.span(),
                format!("found `{}`", operand_kind_name(operand)),
            ),
        )
    }

    pub(crate) fn report_operand_must_be_immediate_or_cl(&self, operand: &Expr) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::OperandMustBeImmediateOrClRegister,
                "shift count must be an immediate value or the `CL` register",
            )
            .with_primary_label(
                operand.span(),
                format!("found `{}`", operand_kind_name(operand)),
            ),
        )
    }

    pub(crate) fn report_first_operand_must_be_bigger(
        &self,
        mnemonic: &Token,
        first: &Expr,
        second: &Expr,
        first_bytes: i32,
        second_bytes: i32,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::FirstOperandMustBeBiggerThanSecond,
                format!(
                    "`{}` needs the destination to be wider than the source",
                    mnemonic.upper()
                ),
            )
            .with_primary_label(mnemonic.span, "")
            .with_secondary_label(first.span(), format!("{} byte(s)", first_bytes))
            .with_secondary_label(second.span(), format!("{} byte(s)", second_bytes)),
        )
    }

    pub(crate) fn report_invalid_operand_size(
        &self,
        operand: &Expr,
        expected: &str,
        actual: i32,
    ) -> ErrorReported {
        self.handler.report(
            Diagnostic::error(
                ErrorCode::InvalidOperandSize,
                format!("invalid operand size: expected {}, found {}", expected, actual),
            )
            .with_primary_label(operand.span(), format!("{} byte(s)", actual)),
        )
    }
}
