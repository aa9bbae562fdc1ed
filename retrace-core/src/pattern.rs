//! Compiled patterns

use crate::ast::Expr;
use crate::error::{CompileError, Result};
use crate::graph::Graph;
use crate::matcher::Matcher;
use crate::parser::parse;
use std::fmt;
use std::str::FromStr;

/// A compiled pattern
///
/// Immutable after compilation, so one `Pattern` can back any number of
/// [`Matcher`]s, including on other threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    source: String,
    expr: Expr,
    graph: Graph,
    group_count: usize,
}

impl Pattern {
    /// Compile a pattern
    ///
    /// # Example
    /// ```
    /// use retrace_core::Pattern;
    ///
    /// let pattern = Pattern::compile(r"(\d+) apples").unwrap();
    /// let mut matcher = pattern.matcher("I got 100 apples");
    /// assert!(matcher.find());
    /// assert_eq!(matcher.group(1), Some("100"));
    /// ```
    pub fn compile(expression: &str) -> Result<Self> {
        let ast = parse(expression)?;
        let graph = Graph::from_expr(&ast.expr);

        log::debug!(
            "compiled pattern {expression:?}: {} group(s), {} node(s)",
            ast.group_count,
            graph.node_count()
        );

        Ok(Pattern {
            source: expression.to_string(),
            expr: ast.expr,
            graph,
            group_count: ast.group_count as usize,
        })
    }

    /// Create a matcher over `text`
    pub fn matcher<'p, 't>(&'p self, text: &'t str) -> Matcher<'p, 't> {
        Matcher::new(self, text)
    }

    /// Check if the pattern matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher(text).find()
    }

    /// The pattern source this was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of capturing groups, not counting group 0
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// The syntax tree the graph was built from
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The compiled match graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Pattern {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::compile(s)
    }
}

/// Compile a pattern
///
/// Shorthand for [`Pattern::compile`].
pub fn compile(expression: &str) -> Result<Pattern> {
    Pattern::compile(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorKind;

    #[test]
    fn test_compile_records_groups() {
        let pattern = compile(r"((\w+) \2) and \1").unwrap();
        assert_eq!(pattern.group_count(), 2);
        assert_eq!(pattern.as_str(), r"((\w+) \2) and \1");
        assert_eq!(pattern.to_string(), r"((\w+) \2) and \1");
    }

    #[test]
    fn test_keeps_parsed_expression() {
        let pattern = compile(r"a\.b{2,}?").unwrap();
        assert_eq!(pattern.expr().to_string(), r"a\.b{2,}?");
        assert!(matches!(pattern.expr(), Expr::Sequence(items) if items.len() == 3));
    }

    #[test]
    fn test_compile_error_propagates() {
        let err = compile("(abc").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnterminatedGroup);
    }

    #[test]
    fn test_from_str() {
        let pattern: Pattern = "d.g".parse().unwrap();
        assert!(pattern.is_match("dog"));
        assert!("d(g".parse::<Pattern>().is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let pattern = compile(r"^(\d+)-\1$").unwrap();
        let pattern = &pattern;
        std::thread::scope(|scope| {
            let handles: Vec<_> = ["1-1", "12-12", "3-4", "77-7"]
                .into_iter()
                .map(|input| scope.spawn(move || pattern.is_match(input)))
                .collect();
            let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(results, vec![true, true, false, false]);
        });
    }
}
