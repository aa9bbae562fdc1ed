//! Retrace Core Library
//!
//! A small regular-expression engine: a compiler that turns a pattern string
//! into a match graph, and a recursive backtracking matcher that runs the
//! graph against text, with capture groups and backreferences.
//!
//! ```
//! use retrace_core::compile;
//!
//! let pattern = compile(r"^I see (\d (cat|dog|cow)s?)$").unwrap();
//! let mut matcher = pattern.matcher("I see 3 cats");
//! assert!(matcher.find());
//! assert_eq!(matcher.group(1), Some("3 cats"));
//! assert_eq!(matcher.group(2), Some("cat"));
//! ```

pub mod ast;
pub mod engine;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod predicate;

pub use ast::Expr;
pub use engine::{SearchState, UNSET};
pub use error::{CompileError, CompileErrorKind, Result};
pub use graph::{Graph, Node, NodeId, RepeatNode};
pub use matcher::Matcher;
pub use parser::{Ast, Parser, parse};
pub use pattern::{Pattern, compile};
pub use predicate::{CharPredicate, CharSet, CharacterClass};
