use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// The different kinds of tokens recognized by the Nyx scanner.
///
/// Variants without data represent punctuation, operator or keyword tokens.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// '-'
    MINUS,

    /// '-='
    MINUS_EQUAL,

    /// '+'
    PLUS,

    /// '+='
    PLUS_EQUAL,

    /// '/'
    SLASH,

    /// '/='
    SLASH_EQUAL,

    /// '*'
    STAR,

    /// '*='
    STAR_EQUAL,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// A numeric literal
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    IMPORT,
    NIL,
    OR,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    LET,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Variant name without payload, as printed by the token dump.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::MINUS => "MINUS",
            TokenType::MINUS_EQUAL => "MINUS_EQUAL",
            TokenType::PLUS => "PLUS",
            TokenType::PLUS_EQUAL => "PLUS_EQUAL",
            TokenType::SLASH => "SLASH",
            TokenType::SLASH_EQUAL => "SLASH_EQUAL",
            TokenType::STAR => "STAR",
            TokenType::STAR_EQUAL => "STAR_EQUAL",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::IMPORT => "IMPORT",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::LET => "LET",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token: its type, the original lexeme, and where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// Source file (or `STDIO` for the prompt) the token came from.
    #[serde(serialize_with = "serialize_file")]
    pub file: Rc<str>,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,

    /// 1‑based column of the lexeme's first byte.
    pub column: usize,
}

fn serialize_file<S: serde::Serializer>(file: &Rc<str>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(file)
}

impl Token {
    pub fn new(
        token_type: TokenType,
        file: Rc<str>,
        lexeme: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        let lexeme = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, {}:{}",
            token_type, lexeme, line, column
        );

        Self {
            token_type,
            file,
            lexeme,
            line,
            column,
        }
    }

    /// An identifier token that was not scanned from source, e.g. the
    /// implicit `this` and `super` bindings.
    pub fn synthetic(name: &str, at: &Token) -> Self {
        Self {
            token_type: TokenType::IDENTIFIER,
            file: Rc::clone(&at.file),
            lexeme: name.to_owned(),
            line: at.line,
            column: at.column,
        }
    }
}

/// Render a number the way Nyx prints it: `3` for integral values, `3.25`
/// otherwise.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        buf.format(n as i64).to_owned()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = match &self.token_type {
            TokenType::STRING(s) => s.clone(),
            TokenType::NUMBER(n) => format_number(*n),
            _ => "nil".to_owned(),
        };

        write!(
            f,
            "{} {} {}",
            self.token_type.name(),
            self.lexeme,
            literal
        )
    }
}
