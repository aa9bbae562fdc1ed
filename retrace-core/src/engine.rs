//! Backtracking execution of the match graph
//!
//! Each node either fails or invokes its continuation and reports whatever the
//! continuation reports. Sub-graphs (alternatives and repetition atoms) end in
//! the shared `Last` node; the dynamic [`Cont`] chain tells `Last` where the
//! enclosing branch or repetition resumes, so every choice point stays open
//! for backtracking.
//!
//! Search order is observable and fixed: alternatives are tried in declared
//! order, greedy repeats try one more iteration before stopping and lazy
//! repeats try stopping first.
//!
//! Execution recurses through continuations, so stack depth grows with the
//! number of open choice points (an unbounded repeat over N characters nests
//! O(N) deep).

use crate::graph::{Graph, Node, NodeId, RepeatNode};

/// Slot value of a capture group that is not currently captured
pub const UNSET: isize = -1;

/// Mutable state of a single search
///
/// Capture slots are shared by the whole backtracking search tree. Capture
/// nodes save the previous slot value on entry and restore it when their
/// continuation fails, so an abandoned attempt never leaves data behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// Start of the search window
    pub from: usize,
    /// End of the search window (exclusive)
    pub to: usize,
    /// Group start slots; index 0 is the whole match
    pub group_starts: Vec<isize>,
    /// Group end slots; index 0 is the whole match
    pub group_ends: Vec<isize>,
    /// Start of the last successful match, or `UNSET`
    pub first: isize,
    /// End position recorded by the terminal node
    pub last: isize,
    /// Whether the search ran into the end of the window
    pub hit_end: bool,
}

impl SearchState {
    /// Create state for a pattern with `group_count` groups over `len` characters
    pub fn new(group_count: usize, len: usize) -> Self {
        let mut state = SearchState {
            from: 0,
            to: len,
            group_starts: vec![UNSET; group_count + 1],
            group_ends: vec![UNSET; group_count + 1],
            first: UNSET,
            last: 0,
            hit_end: false,
        };
        state.reset(len);
        state
    }

    /// Reinitialize the window and scratch fields; capture slots are untouched
    pub fn reset(&mut self, len: usize) {
        self.first = UNSET;
        self.last = 0;
        self.from = 0;
        self.to = len;
    }

    /// Mark every capture slot as unset
    pub fn clear_groups(&mut self) {
        self.group_starts.fill(UNSET);
        self.group_ends.fill(UNSET);
    }

    /// The captured `(start, end)` span of a group, if it is currently captured
    pub fn captured(&self, group: usize) -> Option<(usize, usize)> {
        let start = *self.group_starts.get(group)?;
        let end = *self.group_ends.get(group)?;
        if start < 0 || end < start {
            return None;
        }
        Some((start as usize, end as usize))
    }
}

/// What runs after a sub-graph reaches `Last`
enum Cont<'c> {
    /// The top-level pattern has matched
    Done,
    /// Resume at `next`, then continue with `parent`
    Then { next: NodeId, parent: &'c Cont<'c> },
    /// One more iteration of `repeat` has completed
    Loop {
        repeat: &'c RepeatNode,
        /// Iterations completed including this one
        count: u32,
        /// Where this iteration started
        start: usize,
        parent: &'c Cont<'c>,
    },
}

impl Graph {
    /// Run the graph from its `Start` node, trying start positions from `from`
    pub(crate) fn search(&self, input: &[char], state: &mut SearchState, from: usize) -> bool {
        self.run(self.root, from, input, state, &Cont::Done)
    }

    fn run<'c>(
        &self,
        mut id: NodeId,
        mut index: usize,
        input: &[char],
        state: &mut SearchState,
        mut cont: &'c Cont<'c>,
    ) -> bool {
        loop {
            match &self.nodes[id] {
                Node::Start { next } => {
                    for start in index..=state.to {
                        if self.run(*next, start, input, state, cont) {
                            state.first = start as isize;
                            state.group_starts[0] = start as isize;
                            state.group_ends[0] = state.last;
                            return true;
                        }
                    }
                    state.hit_end = true;
                    return false;
                }
                Node::Char { predicate, next } => {
                    if index >= state.to {
                        state.hit_end = true;
                        return false;
                    }
                    if !predicate.test(input[index]) {
                        return false;
                    }
                    index += 1;
                    id = *next;
                }
                Node::Begin { next } => {
                    if index != state.from {
                        return false;
                    }
                    id = *next;
                }
                Node::End { next } => {
                    if index != state.to {
                        return false;
                    }
                    id = *next;
                }
                Node::GroupHead { group, next } => {
                    let saved = state.group_starts[*group];
                    state.group_starts[*group] = index as isize;
                    if self.run(*next, index, input, state, cont) {
                        return true;
                    }
                    state.group_starts[*group] = saved;
                    return false;
                }
                Node::GroupTail { group, next } => {
                    let saved = state.group_ends[*group];
                    state.group_ends[*group] = index as isize;
                    if self.run(*next, index, input, state, cont) {
                        return true;
                    }
                    state.group_ends[*group] = saved;
                    return false;
                }
                Node::Branch { alternatives, next } => {
                    let after = Cont::Then {
                        next: *next,
                        parent: cont,
                    };
                    return alternatives
                        .iter()
                        .any(|&alternative| self.run(alternative, index, input, state, &after));
                }
                Node::Repeat(repeat) => {
                    return self.repeat(repeat, 0, index, input, state, cont);
                }
                Node::BackReference { group, next } => {
                    let Some((start, end)) = state.captured(*group) else {
                        return false;
                    };
                    let length = end - start;
                    if index + length > state.to {
                        state.hit_end = true;
                        return false;
                    }
                    if input[start..end] != input[index..index + length] {
                        return false;
                    }
                    index += length;
                    id = *next;
                }
                Node::Last => match *cont {
                    Cont::Done => {
                        state.last = index as isize;
                        return true;
                    }
                    Cont::Then { next, parent } => {
                        id = next;
                        cont = parent;
                    }
                    Cont::Loop {
                        repeat,
                        count,
                        start,
                        parent,
                    } => {
                        // Optional iterations must consume input, or `(a*)*` never ends
                        if count > repeat.min && index == start {
                            return false;
                        }
                        return self.repeat(repeat, count, index, input, state, parent);
                    }
                },
            }
        }
    }

    /// Continue a repetition after `count` completed iterations
    fn repeat<'c>(
        &self,
        repeat: &'c RepeatNode,
        count: u32,
        index: usize,
        input: &[char],
        state: &mut SearchState,
        cont: &'c Cont<'c>,
    ) -> bool {
        let again = Cont::Loop {
            repeat,
            count: count + 1,
            start: index,
            parent: cont,
        };

        if count < repeat.min {
            return self.run(repeat.atom, index, input, state, &again);
        }

        let can_extend = repeat.max.is_none_or(|max| count < max);

        if repeat.greedy {
            (can_extend && self.run(repeat.atom, index, input, state, &again))
                || self.run(repeat.next, index, input, state, cont)
        } else {
            self.run(repeat.next, index, input, state, cont)
                || (can_extend && self.run(repeat.atom, index, input, state, &again))
        }
    }
}
