//! Character-level tests used by the match graph
//!
//! Every consuming node in the graph holds a [`CharPredicate`]. Predicates are
//! immutable once built and are shared by every search over a pattern.

use std::fmt;

/// Size of the bracket-expression membership table
pub const TABLE_SIZE: usize = 256;

/// A built-in character class selected by its escape letter
///
/// The set of classes is closed: each escape letter maps to exactly one
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterClass {
    /// ASCII digits (`\d`)
    Digits,
    /// ASCII letters, digits and underscore (`\w`)
    Words,
}

impl CharacterClass {
    /// Look up a class by the letter following the backslash
    pub fn from_identifier(identifier: char) -> Option<Self> {
        match identifier {
            'd' => Some(CharacterClass::Digits),
            'w' => Some(CharacterClass::Words),
            _ => None,
        }
    }

    /// The escape letter for this class
    pub fn identifier(self) -> char {
        match self {
            CharacterClass::Digits => 'd',
            CharacterClass::Words => 'w',
        }
    }

    pub fn test(self, c: char) -> bool {
        match self {
            CharacterClass::Digits => c.is_ascii_digit(),
            CharacterClass::Words => c.is_ascii_alphanumeric() || c == '_',
        }
    }
}

/// Membership table for a bracket expression
///
/// Only the first 256 code points can be members.
#[derive(Clone, PartialEq, Eq)]
pub struct CharSet {
    members: Box<[bool; TABLE_SIZE]>,
}

impl CharSet {
    /// Create an empty set
    pub fn new() -> Self {
        CharSet {
            members: Box::new([false; TABLE_SIZE]),
        }
    }

    /// Add a character, returning `false` if it does not fit the table
    pub fn insert(&mut self, c: char) -> bool {
        match Self::slot(c) {
            Some(slot) => {
                self.members[slot] = true;
                true
            }
            None => false,
        }
    }

    /// Add every character in `start..=end`, returning `false` if the range
    /// is reversed or does not fit the table
    pub fn insert_range(&mut self, start: char, end: char) -> bool {
        match (Self::slot(start), Self::slot(end)) {
            (Some(start), Some(end)) if start <= end => {
                self.members[start..=end].fill(true);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, c: char) -> bool {
        Self::slot(c).is_some_and(|slot| self.members[slot])
    }

    /// Iterate over the members in code point order
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .filter_map(|(slot, _)| char::from_u32(slot as u32))
    }

    fn slot(c: char) -> Option<usize> {
        let slot = c as usize;
        (slot < TABLE_SIZE).then_some(slot)
    }
}

impl Default for CharSet {
    fn default() -> Self {
        CharSet::new()
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A test applied to a single character
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharPredicate {
    /// Exactly this character
    Character(char),
    /// Any character (`.`)
    Any,
    /// Accepts if any child accepts
    Or(Vec<CharPredicate>),
    /// Inverts the inner predicate
    Not(Box<CharPredicate>),
    /// A built-in class (`\d`, `\w`)
    Class(CharacterClass),
    /// A bracket-expression membership table
    Set(CharSet),
}

impl CharPredicate {
    /// Combine predicates into a union, collapsing the single-child case
    pub fn union(mut children: Vec<CharPredicate>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            CharPredicate::Or(children)
        }
    }

    /// Wrap a predicate in a negation
    pub fn negate(inner: CharPredicate) -> Self {
        CharPredicate::Not(Box::new(inner))
    }

    pub fn test(&self, c: char) -> bool {
        match self {
            CharPredicate::Character(value) => *value == c,
            CharPredicate::Any => true,
            CharPredicate::Or(children) => children.iter().any(|child| child.test(c)),
            CharPredicate::Not(inner) => !inner.test(c),
            CharPredicate::Class(class) => class.test(c),
            CharPredicate::Set(set) => set.contains(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_lookup() {
        assert_eq!(
            CharacterClass::from_identifier('d'),
            Some(CharacterClass::Digits)
        );
        assert_eq!(
            CharacterClass::from_identifier('w'),
            Some(CharacterClass::Words)
        );
        assert_eq!(CharacterClass::from_identifier('s'), None);
        assert_eq!(CharacterClass::Words.identifier(), 'w');
    }

    #[test]
    fn test_digits() {
        let digits = CharacterClass::Digits;
        assert!(digits.test('0'));
        assert!(digits.test('9'));
        assert!(!digits.test('a'));
        assert!(!digits.test('٣'));
    }

    #[test]
    fn test_words() {
        let words = CharacterClass::Words;
        for c in ['a', 'Z', '5', '_'] {
            assert!(words.test(c), "{c} should be a word character");
        }
        for c in ['$', '!', ' ', '-', 'é'] {
            assert!(!words.test(c), "{c} should not be a word character");
        }
    }

    #[test]
    fn test_char_set() {
        let mut set = CharSet::new();
        assert!(set.insert('a'));
        assert!(set.insert_range('0', '3'));
        assert!(set.contains('a'));
        assert!(set.contains('2'));
        assert!(!set.contains('4'));
        assert!(!set.contains('b'));
        assert_eq!(set.iter().collect::<String>(), "0123a");
    }

    #[test]
    fn test_char_set_rejects_wide_characters() {
        let mut set = CharSet::new();
        assert!(!set.insert('€'));
        assert!(!set.insert_range('a', '€'));
        assert!(!set.contains('€'));
        assert!(set.insert('ÿ'));
        assert!(set.contains('ÿ'));
    }

    #[test]
    fn test_union_and_negation() {
        let mut set = CharSet::new();
        set.insert('x');
        let predicate = CharPredicate::union(vec![
            CharPredicate::Set(set),
            CharPredicate::Class(CharacterClass::Digits),
        ]);
        assert!(predicate.test('x'));
        assert!(predicate.test('7'));
        assert!(!predicate.test('y'));

        let negated = CharPredicate::negate(predicate);
        assert!(!negated.test('x'));
        assert!(negated.test('y'));
    }

    #[test]
    fn test_union_of_one_collapses() {
        let predicate = CharPredicate::union(vec![CharPredicate::Any]);
        assert_eq!(predicate, CharPredicate::Any);
    }

    #[test]
    fn test_literal_and_any() {
        assert!(CharPredicate::Character('q').test('q'));
        assert!(!CharPredicate::Character('q').test('Q'));
        assert!(CharPredicate::Any.test('\u{1F600}'));
    }
}
