//! Search driver over a single input text
//!
//! A [`Matcher`] owns the mutable state of one search: the search window, the
//! capture slots and the scratch fields written by the graph. It must not be
//! shared between threads while searching; the [`Pattern`] it borrows can be.
//!
//! Positions inside the engine are character indices. [`Matcher::group_range`]
//! translates them to byte offsets of the original `&str`.

use crate::engine::{SearchState, UNSET};
use crate::pattern::Pattern;
use std::ops::Range;

/// Mutable search state over one input text
#[derive(Debug, Clone)]
pub struct Matcher<'p, 't> {
    pattern: &'p Pattern,
    text: &'t str,
    chars: Vec<char>,
    /// Byte offset of every character index, plus the text length
    offsets: Vec<usize>,
    state: SearchState,
}

impl<'p, 't> Matcher<'p, 't> {
    pub(crate) fn new(pattern: &'p Pattern, text: &'t str) -> Self {
        let (offsets, chars): (Vec<usize>, Vec<char>) = text.char_indices().unzip();
        let mut offsets = offsets;
        offsets.push(text.len());

        let state = SearchState::new(pattern.group_count(), chars.len());

        Matcher {
            pattern,
            text,
            chars,
            offsets,
            state,
        }
    }

    /// Reinitialize the search window and scratch fields
    ///
    /// Capture slots are left as they are; [`Matcher::find_from`] clears them
    /// before searching.
    pub fn reset(&mut self) -> &mut Self {
        self.state.reset(self.chars.len());
        self
    }

    /// Search the whole text for the first match
    pub fn find(&mut self) -> bool {
        self.find_from(0)
    }

    /// Search for the first match starting at or after character index `from`
    ///
    /// Only one match is attempted per call. To walk successive matches, call
    /// again with an offset past the previous match.
    pub fn find_from(&mut self, from: usize) -> bool {
        self.reset();
        self.state.clear_groups();
        self.state.hit_end = false;

        let found = self
            .pattern
            .graph()
            .search(&self.chars, &mut self.state, from);
        if !found {
            self.state.first = UNSET;
        }

        log::trace!(
            "search {:?} from {from} over {} char(s): {}",
            self.pattern.as_str(),
            self.chars.len(),
            if found { "matched" } else { "no match" }
        );

        found
    }

    /// Text captured by a group after a successful search
    ///
    /// Group 0 is the whole match. Returns `None` if the last search failed,
    /// the group did not participate in the match, or it does not exist.
    pub fn group(&self, group: usize) -> Option<&'t str> {
        self.group_range(group).map(|range| &self.text[range])
    }

    /// Byte range of a group after a successful search
    pub fn group_range(&self, group: usize) -> Option<Range<usize>> {
        if self.state.first == UNSET {
            return None;
        }
        let (start, end) = self.state.captured(group)?;
        Some(self.offsets[start]..self.offsets[end])
    }

    /// Byte offset where the last match starts
    pub fn start(&self) -> Option<usize> {
        self.group_range(0).map(|range| range.start)
    }

    /// Byte offset where the last match ends
    pub fn end(&self) -> Option<usize> {
        self.group_range(0).map(|range| range.end)
    }

    /// Number of capturing groups in the pattern, not counting group 0
    pub fn group_count(&self) -> usize {
        self.pattern.group_count()
    }

    /// Whether the last search ran into the end of the input
    pub fn hit_end(&self) -> bool {
        self.state.hit_end
    }

    /// The text being searched
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// The pattern this matcher runs
    pub fn pattern(&self) -> &'p Pattern {
        self.pattern
    }
}
