//! Symbols and the symbol table.
//!
//! Every symbol carries the declaring token and the two lifecycle flags
//! the two-pass analyzer runs on:
//!
//! - `was_visited` flips when pass 1 first reaches the declaration;
//! - `was_defined` flips when the declaration's right-hand side is fully
//!   valid.
//!
//! A symbol may be *referenced* before either flag is set; that is the
//! forward-reference case and sends the referencing line to pass 2.
//!
//! Expressions never hold symbol references, only tokens; everything goes
//! through the by-name lookup here, which keeps the AST a strict tree.

use asmlint_lex::Token;
use asmlint_par::ast::OperandSize;
use rustc_hash::FxHashMap;

/// Address-valued symbol data (labels and procs)
#[derive(Clone, Debug, Default)]
pub struct LabelData {
    /// Byte offset within the segment
    pub offset: u32,
}

/// Constant-valued symbol data (`EQU` and `=`)
#[derive(Clone, Debug, Default)]
pub struct ConstData {
    pub value: i64,
}

/// Data variable attributes, filled in when the definition is visited
#[derive(Clone, Debug)]
pub struct DataVariable {
    /// The declared element type (`DB`..`DQ` or a struct/record name)
    pub data_type: Token,
    /// Resolved element size; `None` until the definition is visited
    pub data_type_size: Option<OperandSize>,
    /// Byte offset within the segment
    pub offset: u32,
    /// Bytes of the first initializer (the `SIZE` operator)
    pub size: u32,
    /// Elements of the first initializer (the `LENGTH` operator)
    pub length: u32,
    /// Bytes of the whole definition (the `SIZEOF` operator)
    pub size_of: u32,
    /// Elements of the whole definition (the `LENGTHOF` operator)
    pub length_of: u32,
}

impl DataVariable {
    pub fn new(data_type: Token) -> Self {
        Self {
            data_type,
            data_type_size: None,
            offset: 0,
            size: 0,
            length: 0,
            size_of: 0,
            length_of: 0,
        }
    }
}

/// One field of a struct type.
///
/// Struct fields live inside their struct symbol, not in the global
/// table; the `.` operator reaches them through the struct's size name.
#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub token: Token,
    pub data_type: Token,
    pub data_type_size: Option<OperandSize>,
    pub offset: u32,
    pub was_visited: bool,
    pub was_defined: bool,
}

impl StructField {
    pub fn new(token: Token, data_type: Token) -> Self {
        Self {
            name: token.lexeme.clone(),
            token,
            data_type,
            data_type_size: None,
            offset: 0,
            was_visited: false,
            was_defined: false,
        }
    }
}

/// Struct type data
#[derive(Clone, Debug, Default)]
pub struct StructData {
    /// Total byte size, the sum of the field sizes
    pub size: i32,
    /// Fields in declaration order
    pub fields: Vec<StructField>,
}

impl StructData {
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut StructField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

/// Record type data
#[derive(Clone, Debug, Default)]
pub struct RecordData {
    /// Total bit width of all fields
    pub width: i32,
    pub mask: i64,
    /// Field names in declaration order
    pub fields: Vec<String>,
}

/// One bit field of a record; record fields are global symbols
#[derive(Clone, Debug, Default)]
pub struct RecordFieldData {
    pub width: i32,
    pub shift: i32,
    pub mask: i64,
    pub initial: u32,
}

/// What a name denotes
#[derive(Clone, Debug)]
pub enum SymbolKind {
    DataVariable(DataVariable),
    Label(LabelData),
    Proc(LabelData),
    Struct(StructData),
    Record(RecordData),
    RecordField(RecordFieldData),
    EquConstant(ConstData),
    EqualConstant(ConstData),
}

/// A named entity with its lifecycle flags
#[derive(Clone, Debug)]
pub struct Symbol {
    /// The declaring token
    pub token: Token,
    pub was_visited: bool,
    pub was_defined: bool,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(token: Token, kind: SymbolKind) -> Self {
        Self {
            token,
            was_visited: false,
            was_defined: false,
            kind,
        }
    }

    pub fn as_data_variable(&self) -> Option<&DataVariable> {
        match &self.kind {
            SymbolKind::DataVariable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructData> {
        match &self.kind {
            SymbolKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The segment offset of an address-valued symbol
    pub fn address_offset(&self) -> Option<u32> {
        match &self.kind {
            SymbolKind::DataVariable(v) => Some(v.offset),
            SymbolKind::Label(l) | SymbolKind::Proc(l) => Some(l.offset),
            _ => None,
        }
    }
}

/// Name to symbol mapping.
///
/// Storage is keyed by the exact lexeme; only reserved words are compared
/// case-insensitively, user identifiers are not. Redefinition is
/// last-writer-wins at this level; the analyzer has already diagnosed the
/// clash by the time an overwrite happens.
#[derive(Default)]
pub struct SymbolTable {
    symbols: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a symbol under its declaring token's lexeme, returning the
    /// displaced symbol on redefinition
    pub fn add(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(symbol.token.lexeme.clone(), symbol)
    }

    pub fn remove(&mut self, name: &str) -> Option<Symbol> {
        self.symbols.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn find(&self, token: &Token) -> Option<&Symbol> {
        self.get(&token.lexeme)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asmlint_lex::TokenKind;
    use asmlint_util::Span;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, Span::new(0, name.len()))
    }

    #[test]
    fn test_add_and_find() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new(
            ident("V"),
            SymbolKind::DataVariable(DataVariable::new(ident("DB"))),
        ));
        assert!(table.contains("V"));
        assert!(table.get("V").unwrap().as_data_variable().is_some());
        assert!(table.find(&ident("V")).is_some());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new(ident("Var"), SymbolKind::Label(LabelData::default())));
        assert!(table.get("Var").is_some());
        assert!(table.get("var").is_none());
    }

    #[test]
    fn test_redefinition_is_last_writer_wins() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new(ident("x"), SymbolKind::Label(LabelData::default())));
        let displaced = table.add(Symbol::new(
            ident("x"),
            SymbolKind::EquConstant(ConstData { value: 3 }),
        ));
        assert!(displaced.is_some());
        assert!(matches!(
            table.get("x").unwrap().kind,
            SymbolKind::EquConstant(_)
        ));
    }

    #[test]
    fn test_lifecycle_flags_start_cleared() {
        let symbol = Symbol::new(ident("a"), SymbolKind::Label(LabelData::default()));
        assert!(!symbol.was_visited);
        assert!(!symbol.was_defined);
    }

    #[test]
    fn test_struct_field_lookup() {
        let mut data = StructData::default();
        data.fields.push(StructField::new(ident("F"), ident("DD")));
        assert!(data.field("F").is_some());
        assert!(data.field("G").is_none());
        data.field_mut("F").unwrap().offset = 8;
        assert_eq!(data.field("F").unwrap().offset, 8);
    }

    #[test]
    fn test_address_offset() {
        let mut symbol = Symbol::new(ident("v"), SymbolKind::Label(LabelData { offset: 12 }));
        assert_eq!(symbol.address_offset(), Some(12));
        symbol.kind = SymbolKind::EquConstant(ConstData { value: 1 });
        assert_eq!(symbol.address_offset(), None);
    }

    #[test]
    fn test_remove() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new(ident("a"), SymbolKind::Label(LabelData::default())));
        assert!(table.remove("a").is_some());
        assert!(table.is_empty());
    }
}
