//! asmlint-sem - Two-pass semantic analysis.
//!
//! The language allows forward references inside instructions and data
//! definitions, so analysis runs in two passes:
//!
//! - A **declaration prepass** scans the AST for declaring positions and
//!   inserts a symbol for each (labels, data variables, struct types and
//!   their fields, procs, records and record fields, `EQU`/`=`
//!   constants). Nothing is evaluated yet; every symbol starts with
//!   `was_visited == was_defined == false`.
//! - **Pass 1** walks the whole program. Declarations flip `was_visited`
//!   on entry and `was_defined` once their right-hand side is valid;
//!   every expression is evaluated and annotated. A reference to a
//!   symbol that is not defined yet (where the context permits forward
//!   references) marks the expression unresolved and records the
//!   enclosing line on a worklist. Pass 1 also maintains the running
//!   byte offset: one byte per instruction, the computed size per data
//!   item.
//! - **Pass 2** re-runs only the recorded lines. All symbol values are
//!   populated by now, so evaluation proceeds identically and any
//!   remaining unresolved reference is a hard `UNDEFINED_SYMBOL`.
//!
//! The worklist stores index paths into the program rather than node
//! references, so pass 2 can re-borrow the same nodes mutably; entries
//! are deduplicated so one line is re-analyzed once.

mod eval;
mod ops;
mod reports;
pub mod symbols;
#[cfg(test)]
mod tests;

pub use eval::{min_size_for_constant, parse_number_u32, parse_number_u64, register_size, ExprCtx};
pub use symbols::{Symbol, SymbolKind, SymbolTable};

use asmlint_lex::{Token, TokenKind};
use asmlint_par::ast::{
    DataDir, DataItem, Directive, EndDir, EquDir, EqualDir, Expr, InitValue, OperandSize,
    Program, ProcDir, RecordDir, RecordField, SegDir, Statement, StructDir,
};
use asmlint_par::data::DATA_DIRECTIVES;
use asmlint_util::error::SemResult;
use asmlint_util::Handler;

use symbols::{ConstData, DataVariable, LabelData, RecordData, RecordFieldData, StructData,
    StructField};

/// Index path of a line that may need a second pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRef {
    /// A top-level statement (instruction or data definition)
    Statement(usize),
    /// A field line inside a struct block
    StructField { statement: usize, field: usize },
    /// An instruction line inside a proc block
    ProcInstruction { statement: usize, instruction: usize },
}

/// Where the attributes computed for a data item should be written
enum DataTarget {
    /// A global data variable symbol
    Variable(String),
    /// A field inside a struct symbol
    Field { struct_name: String, field: String },
}

/// The two-pass semantic analyzer.
///
/// Borrows the session's symbol table and diagnostic sink; the AST is
/// annotated in place.
pub struct SemanticAnalyzer<'a> {
    handler: &'a Handler,
    symbols: &'a mut SymbolTable,
    pass: u8,
    expression_depth: u32,
    current_offset: u32,
    current_line: Option<LineRef>,
    second_pass_lines: Vec<LineRef>,
    init_depth: u32,
    init_size: u32,
    init_first_size: Option<u32>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(handler: &'a Handler, symbols: &'a mut SymbolTable) -> Self {
        Self {
            handler,
            symbols,
            pass: 1,
            expression_depth: 0,
            current_offset: 0,
            current_line: None,
            second_pass_lines: Vec::new(),
            init_depth: 0,
            init_size: 0,
            init_first_size: None,
        }
    }

    /// Analyze a parsed program: prepass, pass 1, then pass 2 over the
    /// recorded forward-reference lines.
    pub fn analyze(&mut self, program: &mut Program) {
        self.collect_declarations(program);

        self.pass = 1;
        for idx in 0..program.statements.len() {
            self.handler.clear_panic_line();
            self.visit_statement(program, idx);
        }
        if let Some(end_dir) = program.end_dir.as_mut() {
            self.handler.clear_panic_line();
            self.current_line = None;
            let _ = self.visit_end_dir(end_dir);
        }

        self.pass = 2;
        let lines = std::mem::take(&mut self.second_pass_lines);
        for line in lines {
            self.handler.clear_panic_line();
            self.current_line = Some(line);
            self.revisit_line(program, line);
        }
    }

    /// Record the current line for pass 2, once
    pub(crate) fn defer_current_line(&mut self) {
        if let Some(line) = self.current_line {
            if !self.second_pass_lines.contains(&line) {
                self.second_pass_lines.push(line);
            }
        }
    }

    // ========================================================================
    // Declaration prepass
    // ========================================================================

    fn collect_declarations(&mut self, program: &Program) {
        for statement in &program.statements {
            self.handler.clear_panic_line();
            match statement {
                Statement::Instruction(instr) => {
                    if let Some(label) = &instr.label {
                        self.declare(Symbol::new(
                            label.clone(),
                            SymbolKind::Label(LabelData::default()),
                        ));
                    }
                }
                Statement::Directive(directive) => self.collect_directive(directive),
            }
        }
    }

    fn collect_directive(&mut self, directive: &Directive) {
        match directive {
            Directive::Seg(_) => {}
            Directive::Data(data_dir) => {
                if let Some(id) = &data_dir.id {
                    self.declare(Symbol::new(
                        id.clone(),
                        SymbolKind::DataVariable(DataVariable::new(
                            data_dir.item.data_type.clone(),
                        )),
                    ));
                }
            }
            Directive::Struct(struct_dir) => {
                let mut data = StructData::default();
                for field in &struct_dir.fields {
                    if let Some(id) = &field.id {
                        data.fields
                            .push(StructField::new(id.clone(), field.item.data_type.clone()));
                    }
                }
                self.declare(Symbol::new(
                    struct_dir.first_id.clone(),
                    SymbolKind::Struct(data),
                ));
            }
            Directive::Proc(proc_dir) => {
                self.declare(Symbol::new(
                    proc_dir.first_id.clone(),
                    SymbolKind::Proc(LabelData::default()),
                ));
                for instr in &proc_dir.instructions {
                    if let Some(label) = &instr.label {
                        self.declare(Symbol::new(
                            label.clone(),
                            SymbolKind::Label(LabelData::default()),
                        ));
                    }
                }
            }
            Directive::Record(record_dir) => {
                let data = RecordData {
                    fields: record_dir.fields.iter().map(|f| f.id.lexeme.clone()).collect(),
                    ..RecordData::default()
                };
                self.declare(Symbol::new(record_dir.id.clone(), SymbolKind::Record(data)));
                for field in &record_dir.fields {
                    self.declare(Symbol::new(
                        field.id.clone(),
                        SymbolKind::RecordField(RecordFieldData::default()),
                    ));
                }
            }
            Directive::Equ(equ) => {
                self.declare(Symbol::new(
                    equ.id.clone(),
                    SymbolKind::EquConstant(ConstData::default()),
                ));
            }
            Directive::Equal(equal) => {
                self.declare(Symbol::new(
                    equal.id.clone(),
                    SymbolKind::EqualConstant(ConstData::default()),
                ));
            }
        }
    }

    fn declare(&mut self, symbol: Symbol) {
        if let Some(existing) = self.symbols.get(&symbol.token.lexeme) {
            // `=` constants may be reassigned; everything else clashes
            let reassignment = matches!(existing.kind, SymbolKind::EqualConstant(_))
                && matches!(symbol.kind, SymbolKind::EqualConstant(_));
            if reassignment {
                return;
            }
            let previous = existing.token.clone();
            self.report_symbol_already_defined(&symbol.token, &previous);
        }
        self.symbols.add(symbol);
    }

    // ========================================================================
    // Pass drivers
    // ========================================================================

    fn visit_statement(&mut self, program: &mut Program, idx: usize) {
        match &mut program.statements[idx] {
            Statement::Instruction(instr) => {
                self.current_line = Some(LineRef::Statement(idx));
                let _ = self.visit_instruction(instr);
            }
            Statement::Directive(directive) => match directive {
                Directive::Seg(seg) => {
                    self.current_line = None;
                    let _ = self.visit_seg_dir(seg);
                }
                Directive::Data(data_dir) => {
                    self.current_line = Some(LineRef::Statement(idx));
                    let _ = self.visit_data_dir(data_dir, None);
                }
                Directive::Struct(struct_dir) => self.visit_struct_dir(struct_dir, idx),
                Directive::Proc(proc_dir) => self.visit_proc_dir(proc_dir, idx),
                Directive::Record(record_dir) => {
                    self.current_line = None;
                    let _ = self.visit_record_dir(record_dir);
                }
                Directive::Equ(equ) => {
                    self.current_line = None;
                    let _ = self.visit_equ_dir(equ);
                }
                Directive::Equal(equal) => {
                    self.current_line = None;
                    let _ = self.visit_equal_dir(equal);
                }
            },
        }
    }

    /// Pass 2 re-entry: only instructions and data definitions can carry
    /// forward references
    fn revisit_line(&mut self, program: &mut Program, line: LineRef) {
        match line {
            LineRef::Statement(idx) => match &mut program.statements[idx] {
                Statement::Instruction(instr) => {
                    let _ = self.visit_instruction(instr);
                }
                Statement::Directive(Directive::Data(data_dir)) => {
                    let _ = self.visit_data_dir(data_dir, None);
                }
                _ => {}
            },
            LineRef::StructField { statement, field } => {
                if let Statement::Directive(Directive::Struct(struct_dir)) =
                    &mut program.statements[statement]
                {
                    let struct_id = struct_dir.first_id.clone();
                    let _ = self.visit_data_dir(&mut struct_dir.fields[field], Some(&struct_id));
                }
            }
            LineRef::ProcInstruction { statement, instruction } => {
                if let Statement::Directive(Directive::Proc(proc_dir)) =
                    &mut program.statements[statement]
                {
                    let _ = self.visit_instruction(&mut proc_dir.instructions[instruction]);
                }
            }
        }
    }

    // ========================================================================
    // Directive visitors
    // ========================================================================

    fn visit_seg_dir(&mut self, seg: &mut SegDir) -> SemResult {
        if let Some(expr) = seg.stack_size.as_mut() {
            self.visit_expr_root(expr, ExprCtx::default())?;
            if expr.ann.constant_value.is_none() {
                return Err(self.report_expression_must_be_constant(expr));
            }
        }
        Ok(())
    }

    fn visit_end_dir(&mut self, end_dir: &mut EndDir) -> SemResult {
        if let Some(expr) = end_dir.address.as_mut() {
            self.visit_expr_root(expr, ExprCtx::default())?;
        }
        Ok(())
    }

    fn visit_struct_dir(&mut self, struct_dir: &mut StructDir, stmt_idx: usize) {
        let struct_id = struct_dir.first_id.clone();
        if let Some(symbol) = self.symbols.get_mut(&struct_id.lexeme) {
            symbol.was_visited = true;
        }

        let start_offset = self.current_offset;
        for field_idx in 0..struct_dir.fields.len() {
            self.handler.clear_panic_line();
            self.current_line = Some(LineRef::StructField {
                statement: stmt_idx,
                field: field_idx,
            });
            let _ = self.visit_data_dir(&mut struct_dir.fields[field_idx], Some(&struct_id));
        }
        let size = (self.current_offset - start_offset) as i32;

        if let Some(symbol) = self.symbols.get_mut(&struct_id.lexeme) {
            if let SymbolKind::Struct(data) = &mut symbol.kind {
                data.size = size;
            }
            symbol.was_defined = true;
        }
    }

    fn visit_proc_dir(&mut self, proc_dir: &mut ProcDir, stmt_idx: usize) {
        if let Some(symbol) = self.symbols.get_mut(&proc_dir.first_id.lexeme) {
            symbol.was_visited = true;
            if let SymbolKind::Proc(data) = &mut symbol.kind {
                data.offset = self.current_offset;
            }
            symbol.was_defined = true;
        }

        for instr_idx in 0..proc_dir.instructions.len() {
            self.handler.clear_panic_line();
            self.current_line = Some(LineRef::ProcInstruction {
                statement: stmt_idx,
                instruction: instr_idx,
            });
            let _ = self.visit_instruction(&mut proc_dir.instructions[instr_idx]);
        }
    }

    fn visit_record_dir(&mut self, record_dir: &mut RecordDir) -> SemResult {
        if let Some(symbol) = self.symbols.get_mut(&record_dir.id.lexeme) {
            symbol.was_visited = true;
        }

        let mut total_width: i32 = 0;
        for field in &mut record_dir.fields {
            self.visit_record_field(field)?;
            if let Some(SymbolKind::RecordField(data)) =
                self.symbols.get(&field.id.lexeme).map(|s| &s.kind)
            {
                total_width += data.width;
            }
        }

        if total_width > 32 {
            return Err(self.report_record_width_too_big(&record_dir.id, total_width));
        }

        // shifts are assigned right to left: the last declared field
        // sits at bit 0
        let mut shift: i32 = 0;
        for field in record_dir.fields.iter().rev() {
            if let Some(symbol) = self.symbols.get_mut(&field.id.lexeme) {
                if let SymbolKind::RecordField(data) = &mut symbol.kind {
                    data.shift = shift;
                    data.mask = 1i64 << (data.width - 1);
                    shift += data.width;
                }
                symbol.was_defined = true;
            }
        }

        if let Some(symbol) = self.symbols.get_mut(&record_dir.id.lexeme) {
            if let SymbolKind::Record(data) = &mut symbol.kind {
                data.width = total_width;
                data.mask = 1i64 << (total_width - 1);
            }
            symbol.was_defined = true;
        }
        Ok(())
    }

    fn visit_record_field(&mut self, field: &mut RecordField) -> SemResult {
        if let Some(symbol) = self.symbols.get_mut(&field.id.lexeme) {
            symbol.was_visited = true;
        }

        self.visit_expr_root(&mut field.width, ExprCtx::default())?;
        let Some(width) = field.width.ann.constant_value else {
            return Err(self.report_expression_must_be_constant(&field.width));
        };
        if width <= 0 {
            return Err(self.report_record_field_width_must_be_positive(field, width));
        }
        if width > 31 {
            return Err(self.report_record_field_width_too_big(field, width));
        }
        if let Some(symbol) = self.symbols.get_mut(&field.id.lexeme) {
            if let SymbolKind::RecordField(data) = &mut symbol.kind {
                data.width = width as i32;
            }
        }

        if let Some(initial) = field.initial.as_mut() {
            self.visit_expr_root(initial, ExprCtx::default())?;
            let Some(value) = initial.ann.constant_value else {
                return Err(self.report_expression_must_be_constant(initial));
            };
            if let Some(symbol) = self.symbols.get_mut(&field.id.lexeme) {
                if let SymbolKind::RecordField(data) = &mut symbol.kind {
                    data.initial = value as u32;
                }
            }
        }
        Ok(())
    }

    fn visit_equ_dir(&mut self, equ: &mut EquDir) -> SemResult {
        if let Some(symbol) = self.symbols.get_mut(&equ.id.lexeme) {
            symbol.was_visited = true;
        }
        self.visit_expr_root(&mut equ.value, ExprCtx::default())?;
        let Some(value) = equ.value.ann.constant_value else {
            return Err(self.report_expression_must_be_constant(&equ.value));
        };
        if let Some(symbol) = self.symbols.get_mut(&equ.id.lexeme) {
            if let SymbolKind::EquConstant(data) = &mut symbol.kind {
                data.value = value;
            }
            symbol.was_defined = true;
        }
        Ok(())
    }

    fn visit_equal_dir(&mut self, equal: &mut EqualDir) -> SemResult {
        if let Some(symbol) = self.symbols.get_mut(&equal.id.lexeme) {
            symbol.was_visited = true;
        }
        self.visit_expr_root(&mut equal.value, ExprCtx::default())?;
        let Some(value) = equal.value.ann.constant_value else {
            return Err(self.report_expression_must_be_constant(&equal.value));
        };
        if let Some(symbol) = self.symbols.get_mut(&equal.id.lexeme) {
            if let SymbolKind::EqualConstant(data) = &mut symbol.kind {
                data.value = value;
            }
            symbol.was_defined = true;
        }
        Ok(())
    }

    // ========================================================================
    // Data definitions
    // ========================================================================

    fn visit_data_dir(
        &mut self,
        data_dir: &mut DataDir,
        struct_name: Option<&Token>,
    ) -> SemResult {
        if data_dir.id.is_some() && self.pass == 1 {
            let id = data_dir.id.clone().expect("checked above");
            let target = if let Some(struct_token) = struct_name {
                if let Some(SymbolKind::Struct(data)) = self
                    .symbols
                    .get_mut(&struct_token.lexeme)
                    .map(|s| &mut s.kind)
                {
                    if let Some(field) = data.field_mut(&id.lexeme) {
                        field.was_visited = true;
                        field.offset = self.current_offset;
                    }
                }
                DataTarget::Field {
                    struct_name: struct_token.lexeme.clone(),
                    field: id.lexeme.clone(),
                }
            } else {
                if let Some(symbol) = self.symbols.get_mut(&id.lexeme) {
                    if let SymbolKind::DataVariable(variable) = &mut symbol.kind {
                        symbol.was_visited = true;
                        variable.offset = self.current_offset;
                    }
                }
                DataTarget::Variable(id.lexeme.clone())
            };
            self.visit_data_item(&mut data_dir.item, Some(&target))?;
            self.mark_target_defined(&target);
            Ok(())
        } else {
            self.visit_data_item(&mut data_dir.item, None)
        }
    }

    fn visit_data_item(&mut self, item: &mut DataItem, target: Option<&DataTarget>) -> SemResult {
        let type_token = item.data_type.clone();

        if !is_data_directive(&type_token) {
            let Some(symbol) = self.symbols.get(&type_token.lexeme) else {
                return Err(self.report_undefined_symbol(&type_token, false));
            };
            if !symbol.was_visited {
                return Err(self.report_undefined_symbol(&type_token, true));
            }
            if !symbol.was_defined {
                return Err(self.report_undefined_symbol(&type_token, false));
            }
            if !matches!(symbol.kind, SymbolKind::Struct(_) | SymbolKind::Record(_)) {
                return Err(self.report_invalid_data_type(&type_token));
            }
        }
        if let Some(target) = target {
            let size = self.size_from_token(&type_token);
            self.target_set_type_size(target, size);
        }

        self.init_depth = 0;
        self.init_size = 0;
        self.init_first_size = None;
        self.visit_init_value(&mut item.init, &type_token, 1)?;

        let total = self.init_size;
        if self.pass == 1 {
            self.current_offset += total;
        }

        if let Some(target) = target {
            let type_bytes = self
                .size_from_token(&type_token)
                .map(|s| s.bytes)
                .unwrap_or(0);
            let first = self.init_first_size.unwrap_or(0);
            let (length_of, length) = if type_bytes <= 0 {
                // an empty struct type makes every division degenerate
                (0, 0)
            } else {
                (total / type_bytes as u32, first / type_bytes as u32)
            };
            self.target_set_totals(target, total, length_of, first, length);
        }
        Ok(())
    }

    /// Walk one initializer, accumulating its byte size.
    ///
    /// `mult` is the product of the enclosing `DUP` repeat counts.
    fn visit_init_value(
        &mut self,
        init: &mut InitValue,
        expected_type: &Token,
        mult: u32,
    ) -> SemResult {
        self.init_depth += 1;
        let result = self.visit_init_value_inner(init, expected_type, mult);
        self.init_depth -= 1;
        result
    }

    fn visit_init_value_inner(
        &mut self,
        init: &mut InitValue,
        expected_type: &Token,
        mult: u32,
    ) -> SemResult {
        match init {
            InitValue::Dup { count, operands, .. } => {
                self.visit_expr_root(count, ExprCtx::default())?;
                let Some(value) = count.ann.constant_value else {
                    return Err(self.report_expression_must_be_constant(count));
                };
                let mult = mult.saturating_mul(value.max(0) as u32);
                self.visit_init_value(operands, expected_type, mult)
            }

            InitValue::QuestionMark(_) => {
                let bytes = self
                    .size_from_token(expected_type)
                    .map(|s| s.bytes.max(0) as u32)
                    .unwrap_or(0);
                self.init_size = self.init_size.saturating_add(bytes.saturating_mul(mult));
                Ok(())
            }

            InitValue::Expr(expr) => self.visit_expr_initializer(expr, expected_type, mult),

            InitValue::StructOrRecord { open, close, fields } => {
                if is_data_directive(expected_type) {
                    let span = open.span.merge(close.span);
                    return Err(self.report_expected_single_item_initializer(span, expected_type));
                }
                let shape = self.type_shape(expected_type);
                let InitValue::List(items) = &mut **fields else {
                    return Ok(());
                };
                match shape {
                    Some(TypeShape::Record(field_count)) => {
                        if items.len() > field_count {
                            let span = open.span.merge(close.span);
                            return Err(self.report_too_many_initial_values(span, expected_type));
                        }
                        for item in items.iter_mut() {
                            match item {
                                InitValue::Expr(expr) => {
                                    self.visit_expr_root(
                                        expr,
                                        ExprCtx {
                                            allow_forward_references: true,
                                            ..ExprCtx::default()
                                        },
                                    )?;
                                }
                                InitValue::QuestionMark(_) => {}
                                _ => {
                                    let span = open.span.merge(close.span);
                                    return Err(self.report_expected_single_item_initializer(
                                        span,
                                        expected_type,
                                    ));
                                }
                            }
                        }
                        // a record instance always occupies one DWORD
                        self.init_size = self.init_size.saturating_add(4u32.saturating_mul(mult));
                        Ok(())
                    }
                    Some(TypeShape::Struct(field_types)) => {
                        if items.len() > field_types.len() {
                            let span = open.span.merge(close.span);
                            return Err(self.report_too_many_initial_values(span, expected_type));
                        }
                        for (idx, item) in items.iter_mut().enumerate() {
                            let field_type = field_types[idx].clone();
                            if matches!(item, InitValue::Dup { .. }) {
                                let span = open.span.merge(close.span);
                                return Err(if is_data_directive(&field_type) {
                                    self.report_expected_single_item_initializer(
                                        span,
                                        &field_type,
                                    )
                                } else {
                                    self.report_expected_struc_or_record_initializer(
                                        span,
                                        &field_type,
                                    )
                                });
                            }
                            self.visit_init_value(item, &field_type, mult)?;
                        }
                        // uninitialized trailing fields still occupy
                        // their declared sizes
                        for field_type in field_types.iter().skip(items.len()) {
                            let bytes = self
                                .size_from_token(field_type)
                                .map(|s| s.bytes.max(0) as u32)
                                .unwrap_or(0);
                            self.init_size = self.init_size.saturating_add(bytes.saturating_mul(mult));
                        }
                        Ok(())
                    }
                    None => Ok(()),
                }
            }

            InitValue::List(items) => {
                for (idx, item) in items.iter_mut().enumerate() {
                    let start = self.init_size;
                    self.visit_init_value(item, expected_type, mult)?;
                    if self.init_depth == 1 && idx == 0 {
                        self.init_first_size = Some(self.init_size - start);
                    }
                }
                Ok(())
            }
        }
    }

    fn visit_expr_initializer(
        &mut self,
        expr: &mut Expr,
        expected_type: &Token,
        mult: u32,
    ) -> SemResult {
        if !is_data_directive(expected_type) {
            return Err(
                self.report_expected_struc_or_record_initializer(expr.span(), expected_type)
            );
        }
        let upper = expected_type.upper();
        let ctx = ExprCtx {
            allow_forward_references: true,
            is_db_operand: upper == "DB",
            is_dq_operand: upper == "DQ",
            ..ExprCtx::default()
        };
        self.visit_expr_root(expr, ctx)?;

        // pin down the actual size of the value
        let string_len = expr.as_leaf().and_then(|t| {
            (t.kind == TokenKind::StringLiteral).then(|| t.lexeme.len().saturating_sub(2))
        });
        if let Some(value) = expr.ann.constant_value {
            expr.ann.size = Some(min_size_for_constant(value));
        } else if let Some(len) = string_len {
            expr.ann.size = Some(if upper == "DB" {
                OperandSize::byte()
            } else {
                OperandSize::new("", len as i32)
            });
        }

        let expected_size = self
            .size_from_token(expected_type)
            .expect("data directives always have a size");
        if let Some(size) = &expr.ann.size {
            if expected_size.bytes < size.bytes && !expr.ann.unresolved_symbols {
                return Err(self.report_initializer_too_large(expr, &expected_size, size.bytes));
            }
        }

        let contribution = match string_len {
            // a DB string is a byte array of its character count
            Some(len) if upper == "DB" => len as u32,
            _ => expected_size.bytes.max(0) as u32,
        };
        self.init_size = self.init_size.saturating_add(contribution.saturating_mul(mult));
        Ok(())
    }

    // ========================================================================
    // Symbol bookkeeping helpers
    // ========================================================================

    /// The size named by a data directive or a defined struct/record type
    pub(crate) fn size_from_token(&self, token: &Token) -> Option<OperandSize> {
        if is_data_directive(token) {
            let bytes = match token.upper().as_str() {
                "DB" => 1,
                "DW" => 2,
                "DD" => 4,
                "DQ" => 8,
                _ => unreachable!(),
            };
            return OperandSize::from_bytes(bytes);
        }
        let symbol = self.symbols.get(&token.lexeme)?;
        if !symbol.was_defined {
            return None;
        }
        match &symbol.kind {
            SymbolKind::Struct(data) => {
                Some(OperandSize::new(symbol.token.lexeme.clone(), data.size))
            }
            SymbolKind::Record(_) => Some(OperandSize::new(symbol.token.lexeme.clone(), 4)),
            _ => None,
        }
    }

    fn target_set_type_size(&mut self, target: &DataTarget, size: Option<OperandSize>) {
        match target {
            DataTarget::Variable(name) => {
                if let Some(SymbolKind::DataVariable(v)) =
                    self.symbols.get_mut(name).map(|s| &mut s.kind)
                {
                    v.data_type_size = size;
                }
            }
            DataTarget::Field { struct_name, field } => {
                if let Some(SymbolKind::Struct(data)) =
                    self.symbols.get_mut(struct_name).map(|s| &mut s.kind)
                {
                    if let Some(field) = data.field_mut(field) {
                        field.data_type_size = size;
                    }
                }
            }
        }
    }

    fn target_set_totals(
        &mut self,
        target: &DataTarget,
        size_of: u32,
        length_of: u32,
        size: u32,
        length: u32,
    ) {
        if let DataTarget::Variable(name) = target {
            if let Some(SymbolKind::DataVariable(v)) =
                self.symbols.get_mut(name).map(|s| &mut s.kind)
            {
                v.size_of = size_of;
                v.length_of = length_of;
                v.size = size;
                v.length = length;
            }
        }
    }

    fn mark_target_defined(&mut self, target: &DataTarget) {
        match target {
            DataTarget::Variable(name) => {
                if let Some(symbol) = self.symbols.get_mut(name) {
                    symbol.was_defined = true;
                }
            }
            DataTarget::Field { struct_name, field } => {
                if let Some(SymbolKind::Struct(data)) =
                    self.symbols.get_mut(struct_name).map(|s| &mut s.kind)
                {
                    if let Some(field) = data.field_mut(field) {
                        field.was_defined = true;
                    }
                }
            }
        }
    }

    /// What kind of type an initializer `<...>` is instantiating
    fn type_shape(&self, token: &Token) -> Option<TypeShape> {
        match self.symbols.get(&token.lexeme).map(|s| &s.kind) {
            Some(SymbolKind::Struct(data)) => Some(TypeShape::Struct(
                data.fields.iter().map(|f| f.data_type.clone()).collect(),
            )),
            Some(SymbolKind::Record(data)) => Some(TypeShape::Record(data.fields.len())),
            _ => None,
        }
    }
}

/// Field type tokens of a struct, or the field count of a record
enum TypeShape {
    Struct(Vec<Token>),
    Record(usize),
}

/// Is this token one of `DB DW DD DQ`?
pub(crate) fn is_data_directive(token: &Token) -> bool {
    DATA_DIRECTIVES.iter().any(|d| token.matches(d))
}
