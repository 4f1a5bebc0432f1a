//! Centralised error hierarchy and diagnostic sink for the **Nyx interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, module loader) convert
//! their failure modes into one of the [`NyxError`] variants defined here. Every
//! language-level variant carries the file, line and column of the offending
//! token so a [`Reporter`] can point at it.
//!
//! The error type **does not** print itself. Printing is the job of the
//! [`Reporter`] installed in the shared [`Diagnostics`] handle.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::rc::Rc;

use log::info;
use thiserror::Error;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NyxError {
    /// Lexical (scanner) error.
    #[error("[{file}:{line}:{column}] Error: {message}")]
    Lex {
        message: String,
        file: Rc<str>,
        /// 1‑based line where the error occurred.
        line: usize,
        /// 1‑based column where the error occurred.
        column: usize,
    },

    /// Syntactic (parser) error.
    #[error("[{file}:{line}:{column}] Error: {message}")]
    Parse {
        message: String,
        file: Rc<str>,
        line: usize,
        column: usize,
    },

    /// Static‑analysis failure (self‑referential initializer, self‑inheritance).
    #[error("[{file}:{line}:{column}] Error: {message}")]
    Resolve {
        message: String,
        file: Rc<str>,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error.
    #[error("[{file}:{line}:{column}] Runtime error: {message}")]
    Runtime {
        message: String,
        file: Rc<str>,
        line: usize,
        column: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl NyxError {
    /// Helper constructor for the **scanner**, which has no token yet.
    pub fn lex<S: Into<String>>(file: &Rc<str>, line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: {}:{}:{}, msg={}", file, line, column, message);

        NyxError::Lex {
            message,
            file: Rc::clone(file),
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        NyxError::Parse {
            message,
            file: Rc::clone(&token.file),
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        NyxError::Resolve {
            message,
            file: Rc::clone(&token.file),
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **runtime**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        NyxError::Runtime {
            message,
            file: Rc::clone(&token.file),
            line: token.line,
            column: token.column,
        }
    }

    /// Bare message without the location prefix.
    pub fn message(&self) -> String {
        match self {
            NyxError::Lex { message, .. }
            | NyxError::Parse { message, .. }
            | NyxError::Resolve { message, .. }
            | NyxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// `(file, line, column)` when the error is tied to source text.
    pub fn location(&self) -> Option<(&str, usize, usize)> {
        match self {
            NyxError::Lex {
                file, line, column, ..
            }
            | NyxError::Parse {
                file, line, column, ..
            }
            | NyxError::Resolve {
                file, line, column, ..
            }
            | NyxError::Runtime {
                file, line, column, ..
            } => Some((file, *line, *column)),
            _ => None,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, NyxError::Runtime { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, NyxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostic sink
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for user-facing diagnostics.
pub trait Reporter {
    fn report(&self, file: &str, line: usize, column: usize, message: &str);
}

/// File name given to code typed at the interactive prompt.
pub const PROMPT_FILE: &str = "STDIO";

/// Prints `error: <message>` followed by the location and, when the file can
/// be read, the offending line with a caret under the column.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl StderrReporter {
    /// Line `line` (1-based) of `file`. Prompt input has no file to read.
    pub fn source_line(file: &str, line: usize) -> Option<String> {
        if file == PROMPT_FILE {
            return None;
        }

        let source = fs::read_to_string(file).ok()?;
        source.lines().nth(line.checked_sub(1)?).map(str::to_owned)
    }
}

impl Reporter for StderrReporter {
    fn report(&self, file: &str, line: usize, column: usize, message: &str) {
        eprintln!("error: {}", message);
        eprintln!(" --> {}:{}:{}", file, line, column);

        if let Some(text) = Self::source_line(file, line) {
            eprintln!(" | {}", text);
            eprintln!(" | {}^ {}", " ".repeat(column.saturating_sub(1)), message);
        }
    }
}

/// A single collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Keeps every diagnostic in memory. Clones share the same buffer, so a
/// caller can hand one clone to [`Diagnostics`] and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Messages only, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, file: &str, line: usize, column: usize, message: &str) {
        self.entries.borrow_mut().push(Diagnostic {
            file: file.to_owned(),
            line,
            column,
            message: message.to_owned(),
        });
    }
}

/// Shared diagnostic state: the installed reporter plus the error flags the
/// driver uses to suppress execution and choose an exit code.
pub struct Diagnostics {
    reporter: Box<dyn Reporter>,
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl Diagnostics {
    pub fn new(reporter: impl Reporter + 'static) -> Rc<Self> {
        Rc::new(Self {
            reporter: Box::new(reporter),
            had_error: Cell::new(false),
            had_runtime_error: Cell::new(false),
        })
    }

    /// Forward `error` to the reporter and raise the matching flag.
    pub fn error(&self, error: &NyxError) {
        let message = error.message();

        match error.location() {
            Some((file, line, column)) => self.reporter.report(file, line, column, &message),
            None => self.reporter.report("<nyx>", 0, 0, &message),
        }

        if error.is_runtime() {
            self.had_runtime_error.set(true);
        } else {
            self.had_error.set(true);
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    /// Clear both flags. The REPL calls this before every input line.
    pub fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }
}
