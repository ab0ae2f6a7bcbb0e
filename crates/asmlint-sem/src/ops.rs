//! Per-mnemonic operand rules.
//!
//! Operands are evaluated first (registers and forward references
//! allowed); an unfinished memory operand at the top of an operand is
//! rejected before any mnemonic rule runs. A line with unresolved
//! forward references skips its rule checks in pass 1 and gets them in
//! pass 2 instead.

use asmlint_lex::{Token, TokenKind};
use asmlint_par::ast::{Expr, Instruction, OperandType};
use asmlint_util::error::SemResult;
use asmlint_util::ErrorReported;

use crate::eval::{min_size_for_constant, ExprCtx};
use crate::symbols::SymbolKind;
use crate::SemanticAnalyzer;

impl<'a> SemanticAnalyzer<'a> {
    pub(crate) fn visit_instruction(&mut self, instr: &mut Instruction) -> SemResult {
        for operand in &mut instr.operands {
            self.visit_expr_root(
                operand,
                ExprCtx {
                    allow_registers: true,
                    allow_forward_references: true,
                    ..ExprCtx::default()
                },
            )?;
            if operand.ann.operand_type == OperandType::UnfinishedMemory {
                return Err(self.report_cant_have_registers(operand));
            }
        }

        if let Some(label) = &instr.label {
            if self.pass == 1 {
                if let Some(symbol) = self.symbols.get_mut(&label.lexeme) {
                    if let SymbolKind::Label(data) = &mut symbol.kind {
                        data.offset = self.current_offset;
                        symbol.was_visited = true;
                        symbol.was_defined = true;
                    }
                }
            }
        }

        let Some(mnemonic) = instr.mnemonic.clone() else {
            // a bare label line
            return Ok(());
        };

        // leave lines with forward references for the second pass
        if instr.operands.iter().any(|o| o.ann.unresolved_symbols) {
            if self.pass == 1 {
                self.current_offset += 1;
            }
            return Ok(());
        }

        // no instruction takes an 8-byte operand
        for operand in &instr.operands {
            if let Some(size) = &operand.ann.size {
                if ![1, 2, 4].contains(&size.bytes) {
                    return Err(self.report_invalid_operand_size(operand, "{1, 2, 4}", size.bytes));
                }
            }
        }

        self.check_mnemonic(&mnemonic, instr)?;

        if self.pass == 1 {
            self.current_offset += 1;
        }
        Ok(())
    }

    fn check_mnemonic(&mut self, mnemonic: &Token, instr: &mut Instruction) -> SemResult {
        match mnemonic.upper().as_str() {
            "ADC" | "ADD" | "AND" | "CMP" | "MOV" | "OR" | "SBB" | "SUB" | "TEST" | "XOR" => {
                self.check_two_operand_arithmetic(mnemonic, instr)
            }
            "CALL" | "JMP" | "JA" | "JAE" | "JB" | "JBE" | "JC" | "JE" | "JECXZ" | "JG"
            | "JGE" | "JL" | "JLE" | "JNC" | "JNE" | "JNZ" | "JZ" | "LOOP" => {
                self.check_jump(mnemonic, instr)
            }
            "POP" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                let operand = &instr.operands[0];
                self.expect_memory_or_register(operand)?;
                let size = self.expect_sized(operand)?;
                if size != 4 {
                    return Err(self.report_invalid_operand_size(operand, "4", size));
                }
                Ok(())
            }
            "CBW" | "CDQ" | "CWD" | "POPFD" | "PUSHFD" | "EXIT" | "NEWLINE" => {
                self.expect_operand_count(mnemonic, instr, 0, "0")
            }
            "DEC" | "DIV" | "IDIV" | "IMUL" | "INC" | "MUL" | "NEG" | "NOT" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                let operand = &instr.operands[0];
                self.expect_memory_or_register(operand)?;
                self.expect_sized(operand)?;
                Ok(())
            }
            "LEA" => {
                self.expect_operand_count(mnemonic, instr, 2, "2")?;
                let dst = &instr.operands[0];
                let src = &instr.operands[1];
                if dst.ann.operand_type != OperandType::Register {
                    return Err(self.report_operand_must_be_register(dst));
                }
                let dst_size = self.expect_sized(dst)?;
                if dst_size != 4 {
                    return Err(self.report_invalid_operand_size(dst, "4", dst_size));
                }
                if src.ann.operand_type != OperandType::Memory {
                    return Err(self.report_operand_must_be_memory(src));
                }
                Ok(())
            }
            "MOVSX" | "MOVZX" => {
                self.expect_operand_count(mnemonic, instr, 2, "2")?;
                let dst = &instr.operands[0];
                let src = &instr.operands[1];
                if dst.ann.operand_type != OperandType::Register {
                    return Err(self.report_operand_must_be_register(dst));
                }
                self.expect_memory_or_register(src)?;
                let src_size = self.expect_sized(src)?;
                let dst_size = self.expect_sized(dst)?;
                if dst_size <= src_size {
                    return Err(self.report_first_operand_must_be_bigger(
                        mnemonic, dst, src, dst_size, src_size,
                    ));
                }
                Ok(())
            }
            "PUSH" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                self.check_push_like(&mut instr.operands[0], 4)
            }
            "RCL" | "RCR" | "ROL" | "ROR" | "SHL" | "SHR" => {
                self.expect_operand_count(mnemonic, instr, 2, "2")?;
                {
                    let dst = &instr.operands[0];
                    self.expect_memory_or_register(dst)?;
                    self.expect_sized(dst)?;
                }
                let src = &mut instr.operands[1];
                let is_cl = src
                    .as_leaf()
                    .map_or(false, |t| t.kind == TokenKind::Register && t.matches("CL"));
                match src.ann.constant_value {
                    None if !is_cl => Err(self.report_operand_must_be_immediate_or_cl(src)),
                    Some(value) => {
                        let size = min_size_for_constant(value);
                        if size.bytes > 1 {
                            return Err(self.report_invalid_operand_size(src, "1", size.bytes));
                        }
                        Ok(())
                    }
                    None => Ok(()),
                }
            }
            "RET" => {
                if instr.operands.len() > 1 {
                    return Err(self.report_invalid_number_of_operands(
                        mnemonic,
                        instr.operands.len(),
                        "{0, 1}",
                    ));
                }
                if let Some(operand) = instr.operands.first_mut() {
                    if operand.ann.operand_type != OperandType::Immediate {
                        return Err(self.report_operand_must_be_immediate(operand));
                    }
                    if let Some(value) = operand.ann.constant_value {
                        operand.ann.size = Some(min_size_for_constant(value));
                    }
                    let operand = &instr.operands[0];
                    let size = self.expect_sized(operand)?;
                    if size > 2 {
                        return Err(self.report_invalid_operand_size(operand, "2", size));
                    }
                }
                Ok(())
            }
            "XCHG" => {
                self.expect_operand_count(mnemonic, instr, 2, "2")?;
                let first = &instr.operands[0];
                let second = &instr.operands[1];
                if first.ann.operand_type == OperandType::Memory
                    && second.ann.operand_type == OperandType::Memory
                {
                    return Err(self.report_cant_have_two_memory_operands(mnemonic, first, second));
                }
                self.expect_memory_or_register(first)?;
                self.expect_memory_or_register(second)?;
                if let (Some(a), Some(b)) = (&first.ann.size, &second.ann.size) {
                    if a.bytes != b.bytes {
                        return Err(self.report_operands_different_size(
                            mnemonic, first, second, a.bytes, b.bytes,
                        ));
                    }
                }
                Ok(())
            }
            "INCHAR" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                let operand = &instr.operands[0];
                self.expect_memory_or_register(operand)?;
                let size = self.expect_sized(operand)?;
                if size != 1 {
                    return Err(self.report_invalid_operand_size(operand, "1", size));
                }
                Ok(())
            }
            "ININT" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                let operand = &instr.operands[0];
                self.expect_memory_or_register(operand)?;
                let size = self.expect_sized(operand)?;
                if size != 4 {
                    return Err(self.report_invalid_operand_size(operand, "4", size));
                }
                Ok(())
            }
            "OUTI" | "OUTU" | "OUTSTR" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                self.check_push_like(&mut instr.operands[0], 4)
            }
            "OUTCHAR" => {
                self.expect_operand_count(mnemonic, instr, 1, "1")?;
                self.check_push_like(&mut instr.operands[0], 1)
            }
            _ => Ok(()),
        }
    }

    /// The shared two-operand rule: MOV and friends
    fn check_two_operand_arithmetic(
        &mut self,
        mnemonic: &Token,
        instr: &mut Instruction,
    ) -> SemResult {
        self.expect_operand_count(mnemonic, instr, 2, "2")?;
        {
            let dst = &instr.operands[0];
            let src = &instr.operands[1];
            if dst.ann.operand_type == OperandType::Memory
                && src.ann.operand_type == OperandType::Memory
            {
                return Err(self.report_cant_have_two_memory_operands(mnemonic, dst, src));
            }
            if dst.ann.operand_type == OperandType::Immediate {
                return Err(self.report_dest_operand_cant_be_immediate(dst));
            }
            if dst.ann.size.is_none() && src.ann.size.is_none() {
                return Err(self.report_one_operand_must_have_size(mnemonic, dst, src));
            }
        }

        // a constant source takes its narrowest representable size
        let src = &mut instr.operands[1];
        if let Some(value) = src.ann.constant_value {
            src.ann.size = Some(min_size_for_constant(value));
        }

        let dst = &instr.operands[0];
        let src = &instr.operands[1];
        if let (Some(dst_size), Some(src_size)) = (&dst.ann.size, &src.ann.size) {
            if src.ann.constant_value.is_some() {
                if dst_size.bytes < src_size.bytes {
                    return Err(self.report_immediate_too_big(
                        mnemonic,
                        src,
                        dst_size.bytes,
                        src_size.bytes,
                    ));
                }
            } else if dst_size.bytes != src_size.bytes {
                return Err(self.report_operands_different_size(
                    mnemonic,
                    dst,
                    src,
                    dst_size.bytes,
                    src_size.bytes,
                ));
            }
        }
        Ok(())
    }

    /// CALL/JMP and the conditional jumps: the operand must name a label
    /// or a proc
    fn check_jump(&mut self, mnemonic: &Token, instr: &Instruction) -> SemResult {
        self.expect_operand_count(mnemonic, instr, 1, "1")?;
        let operand = &instr.operands[0];
        let Some(token) = operand.as_leaf() else {
            return Err(self.report_operand_must_be_label(operand));
        };
        if token.kind != TokenKind::Identifier {
            return Err(self.report_operand_must_be_label(operand));
        }
        match self.symbols.get(&token.lexeme).map(|s| &s.kind) {
            Some(SymbolKind::Label(_)) | Some(SymbolKind::Proc(_)) => Ok(()),
            _ => Err(self.report_operand_must_be_label(operand)),
        }
    }

    /// PUSH and the output extensions: a constant must fit in
    /// `max_bytes`, anything else must be exactly `max_bytes` wide
    fn check_push_like(&mut self, operand: &mut Expr, max_bytes: i32) -> SemResult {
        if let Some(value) = operand.ann.constant_value {
            operand.ann.size = Some(min_size_for_constant(value));
        }
        let operand = &*operand;
        let size = self.expect_sized(operand)?;
        if operand.ann.constant_value.is_some() {
            if size > max_bytes {
                return Err(self.report_invalid_operand_size(operand, &max_bytes.to_string(), size));
            }
        } else if size != max_bytes {
            return Err(self.report_invalid_operand_size(operand, &max_bytes.to_string(), size));
        }
        Ok(())
    }

    fn expect_operand_count(
        &self,
        mnemonic: &Token,
        instr: &Instruction,
        count: usize,
        expected: &str,
    ) -> SemResult {
        if instr.operands.len() != count {
            return Err(self.report_invalid_number_of_operands(
                mnemonic,
                instr.operands.len(),
                expected,
            ));
        }
        Ok(())
    }


    fn expect_memory_or_register(&self, operand: &Expr) -> SemResult {
        if operand.ann.operand_type != OperandType::Memory
            && operand.ann.operand_type != OperandType::Register
        {
            return Err(self.report_operand_must_be_memory_or_register(operand));
        }
        Ok(())
    }

    /// The operand's size in bytes, or the missing-size diagnostic
    fn expect_sized(&self, operand: &Expr) -> Result<i32, ErrorReported> {
        match &operand.ann.size {
            Some(size) => Ok(size.bytes),
            None => Err(self.report_operand_must_have_size(operand)),
        }
    }
}
