//! The expression evaluator.
//!
//! Every AST expression node is annotated with a tuple of (operand type,
//! size, constant value, relocatable flag, register footprint, unresolved
//! flag). Evaluation is bottom-up; the per-operator rules decide how
//! annotations combine and which combinations are errors.
//!
//! A sub-expression that contains a register but has not yet been wrapped
//! by `[...]` is an *unfinished memory operand*. It may flow upward
//! through `+`, `-` and the implicit plus, but `[...]` must finish it
//! before it reaches the top of an operand.

use asmlint_lex::lexer::split_base_suffix;
use asmlint_lex::{Token, TokenKind};
use asmlint_par::ast::{Expr, ExprAnn, ExprKind, OperandSize, OperandType};
use asmlint_util::error::SemResult;

use crate::symbols::SymbolKind;
use crate::SemanticAnalyzer;

/// Evaluation context for one operand
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprCtx {
    /// Registers are legal (instruction operand position)
    pub allow_registers: bool,
    /// An undefined symbol defers the line to pass 2 instead of erroring
    pub allow_forward_references: bool,
    /// This node is the field name on the right of `.`
    pub is_struct_field: bool,
    /// Directly inside a `DB` initializer
    pub is_db_operand: bool,
    /// Directly inside a `DQ` initializer
    pub is_dq_operand: bool,
}

/// Scale factors the address grammar accepts
const VALID_SCALES: &[i64] = &[1, 2, 4, 8];

/// Parse a suffixed number lexeme into an unsigned 32-bit value
pub fn parse_number_u32(lexeme: &str) -> Option<u32> {
    let (digits, base) = split_base_suffix(lexeme);
    u32::from_str_radix(digits, base).ok()
}

/// Parse a suffixed number lexeme into an unsigned 64-bit value
pub fn parse_number_u64(lexeme: &str) -> Option<u64> {
    let (digits, base) = split_base_suffix(lexeme);
    u64::from_str_radix(digits, base).ok()
}

/// The narrowest built-in size a constant fits in
pub fn min_size_for_constant(value: i64) -> OperandSize {
    if (i8::MIN as i64..=u8::MAX as i64).contains(&value) {
        OperandSize::byte()
    } else if (i16::MIN as i64..=u16::MAX as i64).contains(&value) {
        OperandSize::word()
    } else if (i32::MIN as i64..=u32::MAX as i64).contains(&value) {
        OperandSize::dword()
    } else {
        OperandSize::qword()
    }
}

/// Byte width of a register name, or `None` for non-registers
pub fn register_size(name: &str) -> Option<i32> {
    let size = match name.to_ascii_uppercase().as_str() {
        "AL" | "BL" | "CL" | "DL" => 1,
        "AX" | "BX" | "CX" | "DX" | "SI" | "DI" | "BP" | "SP" => 2,
        "EAX" | "EBX" | "ECX" | "EDX" | "ESI" | "EDI" | "EBP" | "ESP" => 4,
        _ => return None,
    };
    Some(size)
}

impl<'a> SemanticAnalyzer<'a> {
    /// Evaluate a full operand expression
    pub(crate) fn visit_expr_root(&mut self, expr: &mut Expr, ctx: ExprCtx) -> SemResult {
        self.expression_depth = 0;
        self.visit_expr(expr, ctx)
    }

    pub(crate) fn visit_expr(&mut self, expr: &mut Expr, ctx: ExprCtx) -> SemResult {
        self.expression_depth += 1;
        let result = self.dispatch_expr(expr, ctx);
        self.expression_depth -= 1;
        result
    }

    fn dispatch_expr(&mut self, expr: &mut Expr, ctx: ExprCtx) -> SemResult {
        let Expr { kind, ann } = expr;
        match kind {
            ExprKind::Brackets { inner, .. } => self.visit_brackets(inner, ann, ctx),
            ExprKind::SquareBrackets { inner, .. } => self.visit_square_brackets(inner, ann, ctx),
            ExprKind::ImplicitPlus { left, right } => {
                self.visit_implicit_plus(left, right, ann, ctx)
            }
            ExprKind::Binary { op, left, right } => {
                let op = op.clone();
                self.visit_binary(&op, left, right, ann, ctx)
            }
            ExprKind::Unary { op, inner } => {
                let op = op.clone();
                self.visit_unary(&op, inner, ann, ctx)
            }
            ExprKind::Leaf { token } => {
                let token = token.clone();
                self.visit_leaf(&token, ann, ctx)
            }
        }
    }

    /// `(...)` is transparent
    fn visit_brackets(&mut self, inner: &mut Expr, ann: &mut ExprAnn, ctx: ExprCtx) -> SemResult {
        self.visit_expr(inner, ctx)?;
        *ann = inner.ann.clone();
        Ok(())
    }

    /// `[...]` finishes an address expression.
    ///
    /// The register checks deferred by `+` land here: at most one
    /// register inside one bracket pair, 32-bit registers only, no two
    /// ESPs, and ESP never as an index.
    fn visit_square_brackets(
        &mut self,
        inner: &mut Expr,
        ann: &mut ExprAnn,
        ctx: ExprCtx,
    ) -> SemResult {
        self.visit_expr(inner, ctx)?;

        ann.unresolved_symbols = inner.ann.unresolved_symbols;
        ann.constant_value = inner.ann.constant_value;
        ann.is_relocatable = inner.ann.is_relocatable;

        match inner.ann.operand_type {
            OperandType::UnfinishedMemory => {
                let esp_count = inner
                    .ann
                    .registers
                    .keys()
                    .filter(|reg| reg.matches("ESP"))
                    .count();
                if esp_count == 2 {
                    return Err(self.report_two_esp(&inner.ann.registers));
                }
                if inner.ann.registers.len() > 1 {
                    // two registers under one bracket pair; with ESP among
                    // them the other register would have to be an index
                    if esp_count == 1 {
                        let esp = inner
                            .ann
                            .registers
                            .keys()
                            .find(|reg| reg.matches("ESP"))
                            .cloned()
                            .expect("esp_count is 1");
                        return Err(self.report_incorrect_index_register(&esp));
                    }
                    return Err(self.report_more_than_one_register_in_square_brackets(inner));
                }
                if self.non_32bit_register(&inner.ann.registers).is_some() {
                    return Err(self.report_non_32bit_register(&inner.ann.registers));
                }
                ann.operand_type = OperandType::Memory;
            }
            OperandType::Register => {
                if self.non_32bit_register(&inner.ann.registers).is_some() {
                    return Err(self.report_non_32bit_register(&inner.ann.registers));
                }
                ann.operand_type = OperandType::Memory;
            }
            other => ann.operand_type = other,
        }

        // modifiers reset a known size once registers are involved
        ann.size = if inner.ann.registers.is_empty() {
            inner.ann.size.clone()
        } else {
            None
        };
        ann.registers = inner.ann.registers.clone();
        Ok(())
    }

    /// `a[b]` and `a(b)`: addition with the strict register validation
    /// applied immediately, so `[esp][esp]` is caught here
    fn visit_implicit_plus(
        &mut self,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
        ctx: ExprCtx,
    ) -> SemResult {
        self.visit_expr(left, ctx)?;
        self.visit_expr(right, ctx)?;

        ann.unresolved_symbols = left.ann.unresolved_symbols || right.ann.unresolved_symbols;

        if left.ann.is_relocatable && right.ann.is_relocatable {
            return Err(self.report_cant_add_variables(None, left, right));
        }
        if left.ann.registers.len() + right.ann.registers.len() > 2 {
            let mut regs = left.ann.registers.clone();
            regs.extend(right.ann.registers.clone());
            return Err(self.report_more_than_two_registers(&regs));
        }

        let mut registers = left.ann.registers.clone();
        registers.extend(right.ann.registers.clone());

        let scale_count = registers.values().filter(|s| s.is_some()).count();
        if scale_count > 1 {
            return Err(self.report_more_than_one_scale(&registers));
        }
        if self.non_32bit_register(&registers).is_some() {
            return Err(self.report_non_32bit_register(&registers));
        }
        let esp_count = registers.keys().filter(|reg| reg.matches("ESP")).count();
        if esp_count == 2 {
            return Err(self.report_two_esp(&registers));
        }

        ann.constant_value = match (left.ann.constant_value, right.ann.constant_value) {
            (Some(l), Some(r)) => Some(l.wrapping_add(r)),
            _ => None,
        };
        ann.is_relocatable = left.ann.is_relocatable || right.ann.is_relocatable;
        ann.operand_type = combine_additive_types(
            left.ann.operand_type,
            right.ann.operand_type,
        );
        ann.size = match (&left.ann.size, &right.ann.size) {
            (Some(l), _) => Some(l.clone()),
            (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        };
        ann.registers = registers;
        Ok(())
    }

    fn visit_binary(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
        ctx: ExprCtx,
    ) -> SemResult {
        let op_upper = op.upper();

        let mut right_ctx = ctx;
        if op_upper == "." {
            right_ctx.is_struct_field = true;
        }
        self.visit_expr(left, ctx)?;
        self.visit_expr(right, right_ctx)?;

        ann.unresolved_symbols = left.ann.unresolved_symbols || right.ann.unresolved_symbols;

        match op_upper.as_str() {
            "." => self.visit_dot(op, left, right, ann),
            "PTR" => self.visit_ptr(op, left, right, ann),
            "*" | "/" | "MOD" | "SHL" | "SHR" => self.visit_multiplicative(op, left, right, ann),
            "+" => self.visit_plus(op, left, right, ann),
            "-" => self.visit_minus(op, left, right, ann),
            _ => unreachable!("unknown binary operator `{}`", op.lexeme),
        }
    }

    /// `expr.field`: struct member access
    fn visit_dot(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
    ) -> SemResult {
        if left.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(left));
        }
        if right.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(right));
        }
        if left.ann.operand_type != OperandType::Memory {
            return Err(self.report_dot_incorrect_argument(op, left, right));
        }
        let field_token = match right.as_leaf() {
            Some(token) if token.kind == TokenKind::Identifier => token.clone(),
            _ => return Err(self.report_dot_incorrect_argument(op, left, right)),
        };
        let Some(size) = left.ann.size.clone() else {
            return Err(self.report_dot_size_not_specified(op, left));
        };

        let (struct_defined, field_size) = {
            let Some(symbol) = self.symbols.get(&size.name) else {
                return Err(self.report_dot_type_not_struct(op, &size.name));
            };
            let SymbolKind::Struct(data) = &symbol.kind else {
                return Err(self.report_dot_type_not_struct(op, &size.name));
            };
            let Some(field) = data.field(&field_token.lexeme) else {
                return Err(self.report_dot_field_doesnt_exist(
                    &field_token,
                    &size.name,
                    &field_token.lexeme,
                ));
            };
            (symbol.was_defined, field.data_type_size.clone())
        };

        ann.constant_value = None;
        ann.is_relocatable = left.ann.is_relocatable;
        ann.operand_type = OperandType::Memory;
        if !struct_defined && self.pass == 1 {
            self.defer_current_line();
            ann.unresolved_symbols = true;
        } else {
            ann.unresolved_symbols = false;
        }
        ann.size = field_size;
        ann.registers = left.ann.registers.clone();
        Ok(())
    }

    /// `type PTR expr`: impose a size on a memory operand
    fn visit_ptr(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
    ) -> SemResult {
        if left.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(left));
        }
        if right.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(right));
        }
        let type_token = match left.as_leaf() {
            Some(token)
                if token.kind == TokenKind::Type || token.kind == TokenKind::Identifier =>
            {
                token.clone()
            }
            _ => return Err(self.report_ptr_incorrect_argument(op, left, right)),
        };
        // the pointee must be memory or a relocatable immediate
        let relocatable_immediate =
            right.ann.operand_type == OperandType::Immediate && right.ann.is_relocatable;
        if right.ann.operand_type != OperandType::Memory && !relocatable_immediate {
            return Err(self.report_ptr_incorrect_argument(op, left, right));
        }

        let imposed_size = if let Some(bytes) = OperandSize::bytes_of_name(&type_token.lexeme) {
            OperandSize::new(type_token.upper(), bytes)
        } else {
            let Some(symbol) = self.symbols.get(&type_token.lexeme) else {
                return Err(self.report_ptr_incorrect_argument(op, left, right));
            };
            let SymbolKind::Struct(data) = &symbol.kind else {
                return Err(self.report_ptr_incorrect_argument(op, left, right));
            };
            OperandSize::new(symbol.token.lexeme.clone(), data.size)
        };

        ann.constant_value = right.ann.constant_value;
        ann.is_relocatable = right.ann.is_relocatable;
        ann.operand_type = right.ann.operand_type;
        // `OFFSET var` is already an address constant; PTR leaves its
        // size alone
        ann.size = if relocatable_immediate {
            right.ann.size.clone()
        } else {
            Some(imposed_size)
        };
        ann.registers = right.ann.registers.clone();
        Ok(())
    }

    /// `* / MOD SHL SHR`, including the `register * scale` form
    fn visit_multiplicative(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
    ) -> SemResult {
        if left.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(left));
        }
        if right.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(right));
        }

        let op_upper = op.upper();
        if op_upper == "*" {
            let scale_pair = if left.ann.constant_value.is_some()
                && right.ann.operand_type == OperandType::Register
            {
                Some((left.ann.constant_value.unwrap(), &*right))
            } else if right.ann.constant_value.is_some()
                && left.ann.operand_type == OperandType::Register
            {
                Some((right.ann.constant_value.unwrap(), &*left))
            } else {
                None
            };
            if let Some((scale, reg_expr)) = scale_pair {
                let reg_token = reg_expr
                    .as_leaf()
                    .expect("a register operand is always a leaf")
                    .clone();
                if !VALID_SCALES.contains(&scale) && !ann.unresolved_symbols {
                    let const_side = if left.ann.constant_value.is_some() {
                        &*left
                    } else {
                        &*right
                    };
                    return Err(self.report_invalid_scale_value(const_side, scale));
                }
                if reg_token.matches("ESP") {
                    return Err(self.report_incorrect_index_register(&reg_token));
                }
                ann.constant_value = None;
                ann.is_relocatable = false;
                ann.operand_type = OperandType::UnfinishedMemory;
                ann.size = None;
                ann.registers.clear();
                ann.registers.insert(reg_token, Some(scale));
                return Ok(());
            }
        }

        let (Some(lv), Some(rv)) = (left.ann.constant_value, right.ann.constant_value) else {
            return Err(self.report_binary_incorrect_argument(op, left, right));
        };
        let value = match op_upper.as_str() {
            "*" => lv.wrapping_mul(rv),
            "/" | "MOD" => {
                if ann.unresolved_symbols {
                    // sentinel until pass 2 supplies the real operands
                    -1
                } else if rv == 0 {
                    return Err(self.report_division_by_zero(op, right));
                } else if op_upper == "/" {
                    lv / rv
                } else {
                    lv % rv
                }
            }
            "SHL" => lv.wrapping_shl(rv as u32),
            "SHR" => ((lv as u64).wrapping_shr(rv as u32)) as i64,
            _ => unreachable!(),
        };
        ann.constant_value = Some(value);
        ann.is_relocatable = false;
        ann.operand_type = OperandType::Immediate;
        ann.size = Some(OperandSize::dword());
        ann.registers.clear();
        Ok(())
    }

    /// Explicit `+`; the register-count checks are delayed until `[...]`
    fn visit_plus(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
    ) -> SemResult {
        if left.ann.is_relocatable && right.ann.is_relocatable {
            return Err(self.report_cant_add_variables(Some(op.span), left, right));
        }
        ann.constant_value = match (left.ann.constant_value, right.ann.constant_value) {
            (Some(l), Some(r)) => Some(l.wrapping_add(r)),
            _ => None,
        };
        ann.is_relocatable = left.ann.is_relocatable || right.ann.is_relocatable;
        ann.operand_type =
            combine_additive_types(left.ann.operand_type, right.ann.operand_type);
        ann.size = match (&left.ann.size, &right.ann.size) {
            (Some(l), _) => Some(l.clone()),
            (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        };
        let mut registers = left.ann.registers.clone();
        registers.extend(right.ann.registers.clone());
        ann.registers = registers;
        Ok(())
    }

    /// `-`: address difference, or subtraction of a constant
    fn visit_minus(
        &mut self,
        op: &Token,
        left: &mut Expr,
        right: &mut Expr,
        ann: &mut ExprAnn,
    ) -> SemResult {
        let left_pure_address = left.ann.is_relocatable && left.ann.registers.is_empty();
        let right_pure_address = right.ann.is_relocatable && right.ann.registers.is_empty();

        if left_pure_address && right_pure_address {
            // the difference of two resolved addresses is a plain constant
            let first = first_relocatable_leaf(left);
            let second = first_relocatable_leaf(right);
            let (Some(first), Some(second)) = (first, second) else {
                return Err(self.report_binary_minus_incorrect_argument(op, left, right));
            };
            let lhs = self
                .symbols
                .get(&first.lexeme)
                .and_then(|s| s.address_offset());
            let rhs = self
                .symbols
                .get(&second.lexeme)
                .and_then(|s| s.address_offset());
            let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                return Err(self.report_binary_minus_incorrect_argument(op, left, right));
            };
            ann.constant_value = Some(lhs as i64 - rhs as i64);
            ann.is_relocatable = false;
            ann.operand_type = OperandType::Immediate;
            ann.size = None;
            ann.registers.clear();
            return Ok(());
        }

        if right.ann.constant_value.is_some() {
            // anything minus a constant keeps the left-hand type
            let rv = right.ann.constant_value.unwrap();
            ann.constant_value = left.ann.constant_value.map(|lv| lv.wrapping_sub(rv));
            ann.is_relocatable = left.ann.is_relocatable;
            ann.operand_type = if left.ann.operand_type == OperandType::Register {
                OperandType::UnfinishedMemory
            } else {
                left.ann.operand_type
            };
            ann.size = left.ann.size.clone();
            ann.registers = left.ann.registers.clone();
            return Ok(());
        }

        if left.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(left));
        }
        if right.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(right));
        }
        Err(self.report_binary_minus_incorrect_argument(op, left, right))
    }

    fn visit_unary(
        &mut self,
        op: &Token,
        inner: &mut Expr,
        ann: &mut ExprAnn,
        ctx: ExprCtx,
    ) -> SemResult {
        self.visit_expr(inner, ctx)?;
        ann.unresolved_symbols = inner.ann.unresolved_symbols;

        if inner.ann.operand_type == OperandType::UnfinishedMemory {
            return Err(self.report_cant_have_registers(inner));
        }

        let op_upper = op.upper();
        match op_upper.as_str() {
            "LENGTH" | "LENGTHOF" => {
                let Some(token) = leaf_identifier(inner) else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                let Some(symbol) = self.symbols.get(&token.lexeme) else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                match &symbol.kind {
                    SymbolKind::Struct(_)
                    | SymbolKind::Record(_)
                    | SymbolKind::RecordField(_) => {
                        return Err(self.report_unary_incorrect_argument(op, inner));
                    }
                    SymbolKind::DataVariable(v) => {
                        ann.constant_value = Some(if op_upper == "LENGTH" {
                            v.length as i64
                        } else {
                            v.length_of as i64
                        });
                    }
                    _ => ann.constant_value = inner.ann.constant_value,
                }
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            "SIZE" | "SIZEOF" => {
                let Some(token) = leaf_identifier(inner) else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                let Some(symbol) = self.symbols.get(&token.lexeme) else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                match &symbol.kind {
                    SymbolKind::RecordField(_) => {
                        return Err(self.report_unary_incorrect_argument(op, inner));
                    }
                    SymbolKind::DataVariable(v) => {
                        ann.constant_value = Some(if op_upper == "SIZE" {
                            v.size as i64
                        } else {
                            v.size_of as i64
                        });
                    }
                    _ => ann.constant_value = inner.ann.constant_value,
                }
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            "WIDTH" | "MASK" => {
                let Some(token) = leaf_identifier(inner) else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                let values = match self.symbols.get(&token.lexeme).map(|s| &s.kind) {
                    Some(SymbolKind::Record(r)) => (r.width as i64, r.mask),
                    Some(SymbolKind::RecordField(f)) => (f.width as i64, f.mask),
                    _ => return Err(self.report_unary_incorrect_argument(op, inner)),
                };
                ann.constant_value = Some(if op_upper == "WIDTH" {
                    values.0
                } else {
                    values.1
                });
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            "OFFSET" => {
                // the operand must be an address expression without
                // registers
                if inner.ann.constant_value.is_some() || !inner.ann.registers.is_empty() {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                }
                ann.constant_value = None;
                ann.is_relocatable = inner.ann.is_relocatable;
                ann.operand_type = OperandType::Immediate;
                ann.size = inner.ann.size.as_ref().map(|_| OperandSize::dword());
                ann.registers.clear();
            }
            "TYPE" => {
                match &inner.ann.size {
                    Some(size) => ann.constant_value = Some(size.bytes as i64),
                    None => {
                        ann.constant_value = Some(0);
                        self.warn_type_returns_zero(op, inner);
                    }
                }
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            "+" | "-" => {
                let Some(value) = inner.ann.constant_value else {
                    return Err(self.report_unary_incorrect_argument(op, inner));
                };
                ann.constant_value = Some(if op_upper == "-" {
                    value.wrapping_neg()
                } else {
                    value
                });
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            _ => unreachable!("unknown unary operator `{}`", op.lexeme),
        }
        Ok(())
    }

    fn visit_leaf(&mut self, token: &Token, ann: &mut ExprAnn, ctx: ExprCtx) -> SemResult {
        match token.kind {
            TokenKind::Identifier => self.visit_identifier_leaf(token, ann, ctx),
            TokenKind::Number => {
                if ctx.is_dq_operand && self.expression_depth == 1 {
                    let Some(value) = parse_number_u64(&token.lexeme) else {
                        return Err(self.report_constant_too_large(token, 64));
                    };
                    ann.constant_value = Some(value as i64);
                } else {
                    let Some(value) = parse_number_u32(&token.lexeme) else {
                        return Err(self.report_constant_too_large(token, 32));
                    };
                    ann.constant_value = Some(value as i64);
                }
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
                Ok(())
            }
            TokenKind::StringLiteral => {
                // the quotes are part of the lexeme; 4 characters is the
                // most that packs into a 32-bit value
                let char_count = token.lexeme.len().saturating_sub(2);
                let db_whole_operand =
                    ctx.is_db_operand && !ctx.allow_registers && self.expression_depth == 1;
                if !db_whole_operand && char_count > 4 {
                    return Err(self.report_string_too_large(token));
                }
                if !ctx.allow_registers && self.expression_depth == 1 {
                    // a whole data initializer; sizing happens above
                    ann.constant_value = None;
                    ann.size = None;
                } else {
                    let bytes = &token.lexeme.as_bytes()[1..token.lexeme.len() - 1];
                    let mut value: i64 = 0;
                    for (i, b) in bytes.iter().enumerate() {
                        value |= (*b as i64) << (8 * i);
                    }
                    ann.constant_value = Some(value);
                    ann.size = None;
                }
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.registers.clear();
                Ok(())
            }
            TokenKind::Register => {
                if !ctx.allow_registers {
                    return Err(self.report_register_not_allowed(token));
                }
                let bytes = register_size(&token.lexeme)
                    .expect("the lexer only classifies known registers");
                ann.constant_value = None;
                ann.is_relocatable = false;
                ann.size = OperandSize::from_bytes(bytes);
                ann.operand_type = OperandType::Register;
                ann.registers.clear();
                ann.registers.insert(token.clone(), None);
                Ok(())
            }
            TokenKind::Dollar => {
                // the current location counter
                ann.constant_value = None;
                ann.is_relocatable = true;
                ann.operand_type = OperandType::Immediate;
                ann.size = Some(OperandSize::dword());
                ann.registers.clear();
                Ok(())
            }
            TokenKind::Type => {
                ann.constant_value =
                    OperandSize::bytes_of_name(&token.lexeme).map(|b| b as i64);
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
                Ok(())
            }
            _ => unreachable!("unexpected leaf token kind {:?}", token.kind),
        }
    }

    fn visit_identifier_leaf(
        &mut self,
        token: &Token,
        ann: &mut ExprAnn,
        ctx: ExprCtx,
    ) -> SemResult {
        if ctx.is_struct_field {
            // resolved by the enclosing `.` operator
            ann.operand_type = OperandType::Unspecified;
            return Ok(());
        }

        let Some(symbol) = self.symbols.get(&token.lexeme) else {
            return Err(self.report_undefined_symbol(token, false));
        };
        if !symbol.was_visited && !ctx.allow_forward_references {
            return Err(self.report_undefined_symbol(token, true));
        }
        if !symbol.was_defined && !ctx.allow_forward_references {
            return Err(self.report_undefined_symbol(token, false));
        }
        if !symbol.was_defined {
            if self.pass == 1 {
                self.defer_current_line();
                ann.unresolved_symbols = true;
            } else {
                // pass 2: everything resolvable has been resolved
                return Err(self.report_undefined_symbol(token, false));
            }
        } else {
            ann.unresolved_symbols = false;
        }

        let symbol = self.symbols.get(&token.lexeme).expect("checked above");
        match &symbol.kind {
            SymbolKind::DataVariable(v) => {
                ann.constant_value = None;
                ann.is_relocatable = true;
                if ctx.allow_registers {
                    // in operand position a data variable is memory;
                    // an array does not impose an element size
                    ann.operand_type = OperandType::Memory;
                    ann.size = if v.length_of > 1 {
                        None
                    } else {
                        v.data_type_size.clone()
                    };
                } else {
                    ann.operand_type = OperandType::Immediate;
                    ann.size = Some(OperandSize::dword());
                }
                ann.registers.clear();
            }
            SymbolKind::Label(_) | SymbolKind::Proc(_) => {
                ann.constant_value = None;
                ann.is_relocatable = true;
                ann.operand_type = OperandType::Immediate;
                ann.size = Some(OperandSize::dword());
                ann.registers.clear();
            }
            SymbolKind::EquConstant(c) | SymbolKind::EqualConstant(c) => {
                ann.constant_value = Some(c.value);
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            SymbolKind::Struct(s) => {
                ann.constant_value = Some(s.size as i64);
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            SymbolKind::Record(r) => {
                ann.constant_value = Some(r.mask);
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
            SymbolKind::RecordField(f) => {
                ann.constant_value = Some(f.shift as i64);
                ann.is_relocatable = false;
                ann.operand_type = OperandType::Immediate;
                ann.size = None;
                ann.registers.clear();
            }
        }
        Ok(())
    }

    /// First register in the map that is not 32 bits wide
    pub(crate) fn non_32bit_register<'m>(
        &self,
        registers: &'m indexmap::IndexMap<Token, Option<i64>>,
    ) -> Option<&'m Token> {
        registers
            .keys()
            .find(|reg| register_size(&reg.lexeme) != Some(4))
    }
}

/// The additive operand-type lattice shared by `+` and the implicit plus
fn combine_additive_types(left: OperandType, right: OperandType) -> OperandType {
    use OperandType::*;
    if left == Immediate && right == Immediate {
        Immediate
    } else if left == Register || right == Register {
        UnfinishedMemory
    } else if left == UnfinishedMemory || right == UnfinishedMemory {
        UnfinishedMemory
    } else if left == Memory || right == Memory {
        Memory
    } else {
        // an Unspecified side only appears on error paths
        Invalid
    }
}

/// The leaf token when the expression is a bare identifier
fn leaf_identifier(expr: &Expr) -> Option<&Token> {
    expr.as_leaf().filter(|t| t.kind == TokenKind::Identifier)
}

/// Depth-first search for the first relocatable leaf
pub(crate) fn first_relocatable_leaf(expr: &Expr) -> Option<Token> {
    if !expr.ann.is_relocatable {
        return None;
    }
    match &expr.kind {
        ExprKind::Leaf { token } => Some(token.clone()),
        ExprKind::Brackets { inner, .. }
        | ExprKind::SquareBrackets { inner, .. }
        | ExprKind::Unary { inner, .. } => first_relocatable_leaf(inner),
        ExprKind::Binary { left, right, .. } | ExprKind::ImplicitPlus { left, right } => {
            first_relocatable_leaf(left).or_else(|| first_relocatable_leaf(right))
        }
    }
}
