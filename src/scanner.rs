//! Module `scanner` implements a one‑pass, streaming lexer for the Nyx language.
//!
//! It transforms source text into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(file, src) -> Scanner<'a>`
//!   Create a new lexer over the input buffer. `file` is stamped on every token
//!   so later diagnostics can name their origin.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, NyxError>` on each `.next()`. Errors do not stop the
//!   scan: the offending character is skipped and the following call resumes
//!   after it, so one run can surface several lexical problems.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `;`.
//! - One‑or‑two character operators: `!` `!=` `=` `==` `<` `<=` `>` `>=`
//!   `+` `+=` `-` `-=` `*` `*=` `/` `/=`.
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated
//!   errors.
//! - Numeric literals: integer and optional fractional part, no exponents.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash
//!   `KEYWORDS` map.
//!
//! Comment skipping jumps straight to the next newline with `memchr`.

use std::iter::FusedIterator;
use std::rc::Rc;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{NyxError, Result};
use crate::token::{Token, TokenType};

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"import" => TokenType::IMPORT,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"let"    => TokenType::LET,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    file: Rc<str>,
    src: &'a str,
    start: usize,               // byte index of the first byte of the current lexeme
    curr: usize,                // byte index one past the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    line_start: usize,          // byte index where the current line begins
    token_line: usize,          // line of the lexeme being scanned
    token_column: usize,        // column of the lexeme being scanned
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(file: impl Into<Rc<str>>, src: &'a str) -> Self {
        let file = file.into();

        info!("Scanner created over {} bytes of {}", src.len(), file);

        Self {
            file,
            src,
            start: 0,
            curr: 0,
            line: 1,
            line_start: 0,
            token_line: 1,
            token_column: 1,
            pending: None,
        }
    }

    /// Scan everything, splitting tokens from errors. The token list always
    /// ends with `EOF`.
    pub fn scan_all(self) -> (Vec<Token>, Vec<NyxError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        (tokens, errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it. Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.bytes()[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.curr;
    }

    /// Pick `with_equal` if the next byte is `=`, otherwise `plain`.
    fn either(&mut self, with_equal: TokenType, plain: TokenType) -> TokenType {
        if self.match_byte(b'=') {
            with_equal
        } else {
            plain
        }
    }

    fn error(&self, message: String) -> NyxError {
        NyxError::lex(&self.file, self.token_line, self.token_column, message)
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`. Real tokens are stored
    /// in `self.pending`; whitespace and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b';' => TokenType::SEMICOLON,

            b'-' => self.either(TokenType::MINUS_EQUAL, TokenType::MINUS),
            b'+' => self.either(TokenType::PLUS_EQUAL, TokenType::PLUS),
            b'*' => self.either(TokenType::STAR_EQUAL, TokenType::STAR),
            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' => {
                if self.match_byte(b'/') {
                    // Leave the newline itself for the main loop so the line
                    // counter stays in one place.
                    match memchr(b'\n', &self.bytes()[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }

                    return Ok(());
                }

                self.either(TokenType::SLASH_EQUAL, TokenType::SLASH)
            }

            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.newline();
                return Ok(());
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Skip the whole character so multi-byte input stays on a
                // char boundary.
                let ch = self.src[self.start..].chars().next().unwrap_or('\u{fffd}');
                self.curr = self.start + ch.len_utf8();

                return Err(self.error(format!("Unexpected character '{}'.", ch)));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Parse a double‑quoted string literal. On return `self.curr` points
    /// past the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.newline();
            }
        }

        if self.is_at_end() {
            return Err(self.error("Unterminated string.".to_owned()));
        }

        self.advance(); // closing quote

        let s: &str = &self.src[self.start + 1..self.curr - 1];
        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // digits only, cannot fail
        TokenType::NUMBER(n)
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes()[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.src.len() {
            // Emit exactly one EOF then terminate.
            if self.curr == self.src.len() {
                self.curr += 1;
                let column = self.src.len() - self.line_start + 1;
                return Some(Ok(Token::new(
                    TokenType::EOF,
                    Rc::clone(&self.file),
                    "",
                    self.line,
                    column,
                )));
            }

            self.start = self.curr;
            self.token_line = self.line;
            self.token_column = self.start - self.line_start + 1;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.token_line);

                return Some(Ok(Token::new(
                    tt,
                    Rc::clone(&self.file),
                    lexeme,
                    self.token_line,
                    self.token_column,
                )));
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
