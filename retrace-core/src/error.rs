//! Error types for the pattern compiler
//!
//! Compilation is the only fallible operation in the engine. A search that
//! finds nothing is a normal outcome and is reported as `false`, never as an
//! error.

use thiserror::Error;

/// An error raised while compiling a pattern
///
/// The first malformed construct aborts compilation; no partial pattern is
/// produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at position {position}")]
pub struct CompileError {
    /// Character offset in the pattern where the problem was detected
    pub position: usize,
    /// The specific kind of compile error
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Create a new compile error at the given pattern offset
    pub fn new(kind: CompileErrorKind, position: usize) -> Self {
        CompileError { position, kind }
    }
}

/// Specific kinds of compile errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// An escape letter with no meaning (e.g. `\q`)
    #[error("unknown escape identifier '\\{0}'")]
    UnknownEscape(char),

    /// A backslash at the very end of the pattern
    #[error("trailing backslash")]
    TrailingEscape,

    /// A `(` without its closing `)`
    #[error("unterminated group")]
    UnterminatedGroup,

    /// A `)` with no group open
    #[error("unmatched ')'")]
    UnmatchedParen,

    /// A `[` without its closing `]`
    #[error("unterminated bracket expression")]
    UnterminatedBracket,

    /// A bracket range whose start is after its end (e.g. `[z-a]`)
    #[error("invalid range '{0}-{1}'")]
    InvalidRange(char, char),

    /// A bracket member that does not fit the 256-entry character table
    #[error("character '{0}' is outside the bracket table")]
    UnsupportedCharacter(char),

    /// A quantifier with nothing repeatable before it
    #[error("quantifier '{0}' does not follow a repeatable atom")]
    DanglingQuantifier(char),

    /// Malformed `{n}`, `{n,}` or `{n,m}` bounds
    #[error("invalid repetition: {0}")]
    InvalidRepetition(String),

    /// A backreference to a group the pattern does not define
    #[error("backreference \\{0} refers to an undefined group")]
    UndefinedBackreference(u32),
}

/// Result type alias for compile operations
pub type Result<T> = std::result::Result<T, CompileError>;
