//! Abstract Syntax Tree (AST) for patterns
//!
//! The parser produces an [`Expr`] tree which the graph builder then lowers
//! into the executable node arena. Rendering an `Expr` with `Display` yields a
//! canonical pattern string that compiles back to the same tree.

use crate::predicate::{CharPredicate, CharSet};
use std::fmt;

/// Characters that must be escaped to be matched literally
pub(crate) const METACHARACTERS: &[char] = &[
    '\\', '.', '^', '$', '|', '(', ')', '[', ']', '{', '}', '*', '+', '?',
];

/// An expression in the AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Empty expression (matches the empty string)
    Empty,

    /// A single character test (literal, `.`, `\d`, `\w`, bracket expression)
    Predicate(CharPredicate),

    /// Start of the search window (`^`)
    Begin,

    /// End of the search window (`$`)
    End,

    /// Concatenation
    Sequence(Vec<Expr>),

    /// Alternatives tried in declared order
    Alternation(Vec<Expr>),

    /// A capturing group with its 1-based index
    Group {
        /// Index assigned at the opening parenthesis
        index: u32,
        /// The pattern inside the group
        expr: Box<Expr>,
    },

    /// Bounded or unbounded repetition
    Repeat {
        /// The repeated atom
        expr: Box<Expr>,
        /// Mandatory repetitions
        min: u32,
        /// Upper bound, `None` when unbounded
        max: Option<u32>,
        /// Greedy tries one more repetition before stopping; lazy the reverse
        greedy: bool,
    },

    /// Backreference to a capturing group (`\1` .. `\9`)
    Backreference(u32),
}

impl Expr {
    /// Create a literal character expression
    pub fn literal(c: char) -> Self {
        Expr::Predicate(CharPredicate::Character(c))
    }

    /// Create a sequence, collapsing the empty and single-element cases
    pub fn sequence(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Expr::Empty,
            1 => exprs.remove(0),
            _ => Expr::Sequence(exprs),
        }
    }

    /// Create an alternation, collapsing the single-branch case
    pub fn alternation(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Expr::Empty,
            1 => exprs.remove(0),
            _ => Expr::Alternation(exprs),
        }
    }

    /// Create a capturing group
    pub fn group(index: u32, expr: Expr) -> Self {
        Expr::Group {
            index,
            expr: Box::new(expr),
        }
    }

    /// Create a greedy repetition
    pub fn repeat(expr: Expr, min: u32, max: Option<u32>) -> Self {
        Expr::Repeat {
            expr: Box::new(expr),
            min,
            max,
            greedy: true,
        }
    }

    /// Whether a quantifier may follow this expression
    pub fn is_repeatable(&self) -> bool {
        matches!(
            self,
            Expr::Predicate(_) | Expr::Group { .. } | Expr::Backreference(_)
        )
    }

    /// Convert the AST back to a pattern string
    pub fn to_pattern_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Empty => Ok(()),
            Expr::Predicate(predicate) => write_predicate(f, predicate),
            Expr::Begin => f.write_str("^"),
            Expr::End => f.write_str("$"),
            Expr::Sequence(exprs) => exprs.iter().try_for_each(|e| write!(f, "{e}")),
            Expr::Alternation(exprs) => {
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            Expr::Group { expr, .. } => write!(f, "({expr})"),
            Expr::Repeat {
                expr,
                min,
                max,
                greedy,
            } => {
                write!(f, "{expr}")?;
                match (*min, *max) {
                    (0, None) => f.write_str("*")?,
                    (1, None) => f.write_str("+")?,
                    (0, Some(1)) => f.write_str("?")?,
                    (n, None) => write!(f, "{{{n},}}")?,
                    (n, Some(m)) if n == m => write!(f, "{{{n}}}")?,
                    (n, Some(m)) => write!(f, "{{{n},{m}}}")?,
                }
                if !greedy {
                    f.write_str("?")?;
                }
                Ok(())
            }
            Expr::Backreference(n) => write!(f, "\\{n}"),
        }
    }
}

fn write_predicate(f: &mut fmt::Formatter<'_>, predicate: &CharPredicate) -> fmt::Result {
    match predicate {
        CharPredicate::Character(c) if METACHARACTERS.contains(c) => write!(f, "\\{c}"),
        CharPredicate::Character(c) => write!(f, "{c}"),
        CharPredicate::Any => f.write_str("."),
        CharPredicate::Class(class) => write!(f, "\\{}", class.identifier()),
        CharPredicate::Not(inner) => {
            f.write_str("[^")?;
            write_bracket_body(f, inner)?;
            f.write_str("]")
        }
        CharPredicate::Or(_) | CharPredicate::Set(_) => {
            f.write_str("[")?;
            write_bracket_body(f, predicate)?;
            f.write_str("]")
        }
    }
}

fn write_bracket_body(f: &mut fmt::Formatter<'_>, predicate: &CharPredicate) -> fmt::Result {
    match predicate {
        CharPredicate::Set(set) => write_set(f, set),
        CharPredicate::Or(children) => children
            .iter()
            .try_for_each(|child| write_bracket_body(f, child)),
        CharPredicate::Class(class) => write!(f, "\\{}", class.identifier()),
        CharPredicate::Character(c) => write_member(f, *c),
        CharPredicate::Any | CharPredicate::Not(_) => Ok(()),
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, set: &CharSet) -> fmt::Result {
    let members: Vec<char> = set.iter().collect();
    let mut i = 0;
    while i < members.len() {
        let start = members[i];
        let mut end = i;
        while end + 1 < members.len() && members[end + 1] as u32 == members[end] as u32 + 1 {
            end += 1;
        }
        if end - i >= 3 {
            write_member(f, start)?;
            f.write_str("-")?;
            write_member(f, members[end])?;
        } else {
            for &c in &members[i..=end] {
                write_member(f, c)?;
            }
        }
        i = end + 1;
    }
    Ok(())
}

fn write_member(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    if matches!(c, '\\' | ']' | '^' | '-' | '[') {
        write!(f, "\\{c}")
    } else {
        write!(f, "{c}")
    }
}
