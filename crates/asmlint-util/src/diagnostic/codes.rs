//! The closed enumeration of diagnostic codes.
//!
//! Every diagnostic carries one of these codes. The stable string form
//! (`code.name()`) is what the JSON emitter writes and what editor
//! integrations key on, so variants are append-only.

macro_rules! error_codes {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        /// Stable identity of a diagnostic rule
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($(#[$meta])* $variant,)*
        }

        impl ErrorCode {
            /// The stable SCREAMING_SNAKE_CASE name of this code
            pub const fn name(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $name,)*
                }
            }
        }
    };
}

error_codes! {
    // Lexer
    UnterminatedString => "UNTERMINATED_STRING",
    ConstantParseError => "CONSTANT_PARSE_ERROR",
    UnexpectedCharacter => "UNEXPECTED_CHARACTER",

    // Parser
    UnclosedDelimiter => "UNCLOSED_DELIMITER",
    UnexpectedClosingDelimiter => "UNEXPECTED_CLOSING_DELIMITER",
    ExpectedExpression => "EXPECTED_EXPRESSION",
    ExpectedIdentifier => "EXPECTED_IDENTIFIER",
    ExpectedEndOfLine => "EXPECTED_END_OF_LINE",
    ExpectedEndDirective => "EXPECTED_END_DIRECTIVE",
    MustBeInSegmentBlock => "MUST_BE_IN_SEGMENT_BLOCK",
    ExpectedOperatorOrClosingDelimiter => "EXPECTED_OPERATOR_OR_CLOSING_DELIMITER",
    ExpectedCommaOrEndOfLine => "EXPECTED_COMMA_OR_END_OF_LINE",
    ExpectedCommaOrClosingDelimiter => "EXPECTED_COMMA_OR_CLOSING_DELIMITER",
    ExpectedInstruction => "EXPECTED_INSTRUCTION",
    ExpectedVariableNameOrDataDirective => "EXPECTED_VARIABLE_NAME_OR_DATA_DIRECTIVE",
    /// The closing identifier of a STRUC/PROC block does not match the opening one
    ExpectedMatchingIdentifier => "EXPECTED_MATCHING_IDENTIFIER",
    /// A STRUC/PROC body ran out before its ENDS/ENDP line
    ExpectedBlockEnd => "EXPECTED_BLOCK_END",
    MissingIdentifierBeforeBlockEnd => "MISSING_IDENTIFIER_BEFORE_BLOCK_END",
    ExpectedOpenBracket => "EXPECTED_OPEN_BRACKET",
    ExpectedColon => "EXPECTED_COLON",
    UnclosedDelimiterInInitializer => "UNCLOSED_DELIMITER_IN_INITIALIZER",

    // Semantic analysis
    UndefinedSymbol => "UNDEFINED_SYMBOL",
    SymbolAlreadyDefined => "SYMBOL_ALREADY_DEFINED",
    ExpressionMustBeConstant => "EXPRESSION_MUST_BE_CONSTANT",
    CantHaveRegistersInExpression => "CANT_HAVE_REGISTERS_IN_EXPRESSION",
    CantAddVariables => "CANT_ADD_VARIABLES",
    MoreThanTwoRegisters => "MORE_THAN_TWO_REGISTERS",
    MoreThanOneScale => "MORE_THAN_ONE_SCALE",
    TwoEspRegisters => "TWO_ESP_REGISTERS",
    Non32bitRegister => "NON_32BIT_REGISTER",
    InvalidScaleValue => "INVALID_SCALE_VALUE",
    IncorrectIndexRegister => "INCORRECT_INDEX_REGISTER",
    MoreThanOneRegisterInSquareBrackets => "MORE_THAN_ONE_REGISTER_IN_SQUARE_BRACKETS",
    DivisionByZeroInExpression => "DIVISION_BY_ZERO_IN_EXPRESSION",
    DotOperatorIncorrectArgument => "DOT_OPERATOR_INCORRECT_ARGUMENT",
    DotOperatorSizeNotSpecified => "DOT_OPERATOR_SIZE_NOT_SPECIFIED",
    DotOperatorTypeNotStruct => "DOT_OPERATOR_TYPE_NOT_STRUCT",
    DotOperatorFieldDoesntExist => "DOT_OPERATOR_FIELD_DOESNT_EXIST",
    PtrOperatorIncorrectArgument => "PTR_OPERATOR_INCORRECT_ARGUMENT",
    InvalidNumberOfOperands => "INVALID_NUMBER_OF_OPERANDS",
    CantHaveTwoMemoryOperands => "CANT_HAVE_TWO_MEMORY_OPERANDS",
    DestOperandCantBeImmediate => "DEST_OPERAND_CANT_BE_IMMEDIATE",
    ImmediateTooBig => "IMMEDIATE_TOO_BIG",
    OperandsDifferentSize => "OPERANDS_DIFFERENT_SIZE",
    OneOperandMustHaveSize => "ONE_OPERAND_MUST_HAVE_SIZE",
    OperandMustHaveSize => "OPERAND_MUST_HAVE_SIZE",
    OperandMustBeLabel => "OPERAND_MUST_BE_LABEL",
    OperandMustBeMemoryOrRegister => "OPERAND_MUST_BE_MEMORY_OR_REGISTER",
    OperandMustBeRegister => "OPERAND_MUST_BE_REGISTER",
    OperandMustBeMemory => "OPERAND_MUST_BE_MEMORY",
    OperandMustBeImmediate => "OPERAND_MUST_BE_IMMEDIATE",
    OperandMustBeImmediateOrClRegister => "OPERAND_MUST_BE_IMMEDIATE_OR_CL_REGISTER",
    FirstOperandMustBeBiggerThanSecond => "FIRST_OPERAND_MUST_BE_BIGGER_THAN_SECOND",
    InvalidOperandSize => "INVALID_OPERAND_SIZE",
    InvalidDataType => "INVALID_DATA_TYPE",
    RecordWidthTooBig => "RECORD_WIDTH_TOO_BIG",
    RecordFieldWidthMustBePositive => "RECORD_FIELD_WIDTH_MUST_BE_POSITIVE",
    RecordFieldWidthTooBig => "RECORD_FIELD_WIDTH_TOO_BIG",
    ConstantTooLarge => "CONSTANT_TOO_LARGE",
    StringTooLarge => "STRING_TOO_LARGE",
    UnaryOperatorIncorrectArgument => "UNARY_OPERATOR_INCORRECT_ARGUMENT",
    BinaryMinusOperatorIncorrectArgument => "BINARY_MINUS_OPERATOR_INCORRECT_ARGUMENT",
    BinaryOperatorIncorrectArgument => "BINARY_OPERATOR_INCORRECT_ARGUMENT",
    InitializerTooLarge => "INITIALIZER_TOO_LARGE",
    ExpectedSingleItemInitializer => "EXPECTED_SINGLE_ITEM_INITIALIZER",
    ExpectedStrucOrRecordInitializer => "EXPECTED_STRUC_OR_RECORD_INITIALIZER",
    TooManyInitialValues => "TOO_MANY_INITIAL_VALUES",

    // Warnings
    TypeReturnsZero => "TYPE_RETURNS_ZERO",

    // Driver
    FailedToOpenFile => "FAILED_TO_OPEN_FILE",
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
