//! Match graph construction
//!
//! The graph is an arena of [`Node`]s addressed by [`NodeId`]. Every node
//! carries the index of its continuation. Alternatives and repetition atoms are
//! sub-graphs that end in the shared [`Node::Last`] node; they are traversed
//! again at run time rather than unrolled here.
//!
//! Construction works back to front: each expression is compiled with its
//! continuation already known, so no node is patched after it is created.

use crate::ast::Expr;
use crate::predicate::CharPredicate;
use std::fmt;

/// A node index in the graph arena
pub type NodeId = usize;

/// Index of the shared terminal node
pub const LAST: NodeId = 0;

/// Repetition of an atom sub-graph
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatNode {
    /// Entry of the repeated sub-graph, which ends in `Last`
    pub atom: NodeId,
    /// Mandatory repetitions
    pub min: u32,
    /// Upper bound, `None` when unbounded
    pub max: Option<u32>,
    /// Try one more repetition before stopping (greedy) or the reverse (lazy)
    pub greedy: bool,
    pub next: NodeId,
}

/// A node in the match graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Search anchor: tries every candidate start position in turn
    Start { next: NodeId },
    /// Consumes one character accepted by the predicate
    Char {
        predicate: CharPredicate,
        next: NodeId,
    },
    /// Zero-width assertion on the start of the search window
    Begin { next: NodeId },
    /// Zero-width assertion on the end of the search window
    End { next: NodeId },
    Repeat(RepeatNode),
    /// Records the start of a capture group
    GroupHead { group: usize, next: NodeId },
    /// Records the end of a capture group
    GroupTail { group: usize, next: NodeId },
    /// Ordered alternatives, each ending in `Last`
    Branch {
        alternatives: Vec<NodeId>,
        next: NodeId,
    },
    /// Requires the text captured by a group to repeat verbatim
    BackReference { group: usize, next: NodeId },
    /// Terminal node shared by every path
    Last,
}

/// The match graph of a compiled pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// All nodes; index 0 is always `Last`
    pub nodes: Vec<Node>,
    /// The `Start` node
    pub root: NodeId,
}

impl Graph {
    /// Build the graph for an AST expression
    pub fn from_expr(expr: &Expr) -> Self {
        let mut graph = Graph {
            nodes: vec![Node::Last],
            root: LAST,
        };
        let first = graph.compile_expr(expr, LAST);
        graph.root = graph.push(Node::Start { next: first });
        graph
    }

    /// Number of nodes in the arena, including `Last` and `Start`
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Compile an expression whose continuation is `next`, returning its entry
    fn compile_expr(&mut self, expr: &Expr, next: NodeId) -> NodeId {
        match expr {
            Expr::Empty => next,
            Expr::Predicate(predicate) => self.push(Node::Char {
                predicate: predicate.clone(),
                next,
            }),
            Expr::Begin => self.push(Node::Begin { next }),
            Expr::End => self.push(Node::End { next }),
            Expr::Sequence(exprs) => exprs
                .iter()
                .rev()
                .fold(next, |next, expr| self.compile_expr(expr, next)),
            Expr::Alternation(exprs) => {
                let alternatives = exprs
                    .iter()
                    .map(|expr| self.compile_expr(expr, LAST))
                    .collect();
                self.push(Node::Branch { alternatives, next })
            }
            Expr::Group { index, expr } => {
                let group = *index as usize;
                let tail = self.push(Node::GroupTail { group, next });
                let inner = self.compile_expr(expr, tail);
                self.push(Node::GroupHead { group, next: inner })
            }
            Expr::Repeat {
                expr,
                min,
                max,
                greedy,
            } => {
                let atom = self.compile_expr(expr, LAST);
                self.push(Node::Repeat(RepeatNode {
                    atom,
                    min: *min,
                    max: *max,
                    greedy: *greedy,
                    next,
                }))
            }
            Expr::Backreference(n) => self.push(Node::BackReference {
                group: *n as usize,
                next,
            }),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Start { next } => write!(f, "start -> {next}"),
            Node::Char { predicate, next } => {
                write!(f, "char {} -> {next}", Expr::Predicate(predicate.clone()))
            }
            Node::Begin { next } => write!(f, "begin -> {next}"),
            Node::End { next } => write!(f, "end -> {next}"),
            Node::Repeat(repeat) => {
                let max = repeat.max.map_or("inf".to_string(), |m| m.to_string());
                let order = if repeat.greedy { "greedy" } else { "lazy" };
                write!(
                    f,
                    "repeat {}..{max} {order} atom {} -> {}",
                    repeat.min, repeat.atom, repeat.next
                )
            }
            Node::GroupHead { group, next } => write!(f, "group-head {group} -> {next}"),
            Node::GroupTail { group, next } => write!(f, "group-tail {group} -> {next}"),
            Node::Branch { alternatives, next } => {
                write!(f, "branch {alternatives:?} -> {next}")
            }
            Node::BackReference { group, next } => write!(f, "backref {group} -> {next}"),
            Node::Last => f.write_str("last"),
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.nodes.iter().enumerate() {
            let marker = if id == self.root { "*" } else { " " };
            writeln!(f, "{marker}{id:>3}: {node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn graph(pattern: &str) -> Graph {
        Graph::from_expr(&parse(pattern).unwrap().expr)
    }

    #[test]
    fn test_empty_pattern() {
        let g = graph("");
        assert_eq!(g.nodes, vec![Node::Last, Node::Start { next: LAST }]);
        assert_eq!(g.root, 1);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn test_sequence_links_forward() {
        let g = graph("ab");
        let Node::Start { next } = g.nodes[g.root] else {
            panic!("root must be a start node");
        };
        let Node::Char { predicate, next } = &g.nodes[next] else {
            panic!("expected the first character");
        };
        assert_eq!(*predicate, CharPredicate::Character('a'));
        let Node::Char { predicate, next } = &g.nodes[*next] else {
            panic!("expected the second character");
        };
        assert_eq!(*predicate, CharPredicate::Character('b'));
        assert_eq!(*next, LAST);
    }

    #[test]
    fn test_alternatives_end_in_last() {
        let g = graph("(a|b)c");
        let branch = g
            .nodes
            .iter()
            .find_map(|node| match node {
                Node::Branch { alternatives, next } => Some((alternatives.clone(), *next)),
                _ => None,
            })
            .unwrap();
        let (alternatives, next) = branch;
        assert_eq!(alternatives.len(), 2);
        for alt in alternatives {
            assert!(matches!(g.nodes[alt], Node::Char { next: LAST, .. }));
        }
        assert!(matches!(g.nodes[next], Node::GroupTail { group: 1, .. }));
    }

    #[test]
    fn test_repeat_atom_ends_in_last() {
        let g = graph("a{2,3}?b");
        let repeat = g
            .nodes
            .iter()
            .find_map(|node| match node {
                Node::Repeat(repeat) => Some(repeat.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!((repeat.min, repeat.max, repeat.greedy), (2, Some(3), false));
        assert!(matches!(g.nodes[repeat.atom], Node::Char { next: LAST, .. }));
        assert!(matches!(g.nodes[repeat.next], Node::Char { .. }));
    }

    #[test]
    fn test_group_wraps_inner() {
        let g = graph("(x)");
        let Node::Start { next } = g.nodes[g.root] else {
            panic!("root must be a start node");
        };
        let Node::GroupHead { group: 1, next } = g.nodes[next] else {
            panic!("expected a group head");
        };
        let Node::Char { next, .. } = &g.nodes[next] else {
            panic!("expected the group body");
        };
        assert!(matches!(g.nodes[*next], Node::GroupTail { group: 1, next: LAST }));
    }

    #[test]
    fn test_display_lists_nodes() {
        let g = graph(r"^\d+$");
        let dump = g.to_string();
        assert!(dump.contains("last"));
        assert!(dump.contains("repeat 1..inf greedy"));
        assert!(dump.contains("begin"));
        assert!(dump.contains("end"));
        assert!(dump.contains(&format!("*{:>3}: start", g.root)));
    }
}
