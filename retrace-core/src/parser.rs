//! Parser for patterns
//!
//! A recursive descent parser that scans the pattern once, left to right, and
//! builds an Abstract Syntax Tree (AST). Capture groups are numbered in the
//! order their opening parenthesis appears, regardless of nesting.
//!
//! Grammar (in order of precedence, lowest to highest):
//!   pattern     := alternation
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := quantified*
//!   quantified  := atom ( quantifier '?'? )?
//!   quantifier  := '*' | '+' | '?' | '{' number ( ',' number? )? '}'
//!   atom        := literal | '.' | '^' | '$' | group | bracket | escape
//!   group       := '(' alternation ')'
//!   bracket     := '[' '^'? member* ']'
//!   member      := char | char '-' char | '\' char
//!   escape      := '\' ( 'd' | 'w' | '1'..'9' | punctuation )

use crate::ast::Expr;
use crate::error::{CompileError, CompileErrorKind, Result};
use crate::predicate::{CharPredicate, CharSet, CharacterClass};

/// The result of parsing a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    /// The root expression
    pub expr: Expr,
    /// Number of capturing groups in the pattern
    pub group_count: u32,
}

/// One element of a bracket expression
enum Member {
    Char(char),
    Class(CharacterClass),
}

/// Parser for patterns
pub struct Parser {
    chars: Vec<char>,
    position: usize,
    group_count: u32,
    /// Every backreference seen, with its position, checked once parsing ends
    backreferences: Vec<(u32, usize)>,
}

impl Parser {
    /// Create a new parser for the given pattern
    pub fn new(input: &str) -> Self {
        Parser {
            chars: input.chars().collect(),
            position: 0,
            group_count: 0,
            backreferences: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume `expected` if it is the current character
    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, kind: CompileErrorKind, position: usize) -> Result<T> {
        Err(CompileError::new(kind, position))
    }

    /// Parse the entire pattern
    pub fn parse(mut self) -> Result<Ast> {
        let expr = self.parse_alternation()?;

        // parse_alternation only stops early on a ')' with no group open
        if self.current() == Some(')') {
            return self.error(CompileErrorKind::UnmatchedParen, self.position);
        }

        if let Some(&(group, position)) = self
            .backreferences
            .iter()
            .find(|(group, _)| *group > self.group_count)
        {
            return self.error(CompileErrorKind::UndefinedBackreference(group), position);
        }

        Ok(Ast {
            expr,
            group_count: self.group_count,
        })
    }

    /// alternation := sequence ( '|' sequence )*
    fn parse_alternation(&mut self) -> Result<Expr> {
        let mut alternatives = vec![self.parse_sequence()?];

        while self.eat('|') {
            alternatives.push(self.parse_sequence()?);
        }

        Ok(Expr::alternation(alternatives))
    }

    /// sequence := quantified*
    fn parse_sequence(&mut self) -> Result<Expr> {
        let mut expressions = Vec::new();

        while let Some(c) = self.current() {
            if c == '|' || c == ')' {
                break;
            }
            expressions.push(self.parse_quantified()?);
        }

        Ok(Expr::sequence(expressions))
    }

    /// quantified := atom ( quantifier '?'? )?
    fn parse_quantified(&mut self) -> Result<Expr> {
        let atom = self.parse_atom()?;

        let quantifier_position = self.position;
        let Some((min, max)) = self.parse_quantifier()? else {
            return Ok(atom);
        };

        if !atom.is_repeatable() {
            return self.error(
                CompileErrorKind::DanglingQuantifier(self.chars[quantifier_position]),
                quantifier_position,
            );
        }

        let greedy = !self.eat('?');

        // A second quantifier has nothing repeatable to apply to
        if let Some(c @ ('*' | '+' | '?' | '{')) = self.current() {
            return self.error(CompileErrorKind::DanglingQuantifier(c), self.position);
        }

        Ok(Expr::Repeat {
            expr: Box::new(atom),
            min,
            max,
            greedy,
        })
    }

    /// Parse a quantifier if present, returning its (min, max) bounds
    fn parse_quantifier(&mut self) -> Result<Option<(u32, Option<u32>)>> {
        let bounds = match self.current() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => return self.parse_bounds().map(Some),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(bounds))
    }

    /// Parse `{n}`, `{n,}` or `{n,m}`
    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>)> {
        let open = self.position;
        self.advance(); // consume '{'

        let min = self.parse_number(open)?;
        let max = if self.eat(',') {
            if self.current() == Some('}') {
                None
            } else {
                Some(self.parse_number(open)?)
            }
        } else {
            Some(min)
        };

        if !self.eat('}') {
            let found = match self.current() {
                Some(c) => format!("'{c}'"),
                None => "end of pattern".to_string(),
            };
            return self.error(
                CompileErrorKind::InvalidRepetition(format!("expected '}}', found {found}")),
                open,
            );
        }

        if let Some(max) = max
            && min > max
        {
            return self.error(
                CompileErrorKind::InvalidRepetition(format!(
                    "minimum {min} exceeds maximum {max}"
                )),
                open,
            );
        }

        Ok((min, max))
    }

    fn parse_number(&mut self, open: usize) -> Result<u32> {
        let start = self.position;
        let mut value: u32 = 0;

        while let Some(digit) = self.current().and_then(|c| c.to_digit(10)) {
            value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(value) => value,
                None => {
                    return self.error(
                        CompileErrorKind::InvalidRepetition("bound is too large".to_string()),
                        open,
                    );
                }
            };
            self.advance();
        }

        if self.position == start {
            return self.error(
                CompileErrorKind::InvalidRepetition("expected a number".to_string()),
                open,
            );
        }

        Ok(value)
    }

    /// atom := literal | '.' | '^' | '$' | group | bracket | escape
    fn parse_atom(&mut self) -> Result<Expr> {
        let position = self.position;
        let Some(c) = self.current() else {
            return Ok(Expr::Empty);
        };

        match c {
            '\\' => self.parse_escape(),
            '[' => self.parse_bracket(),
            '(' => self.parse_group(),
            '*' | '+' | '?' | '{' => {
                self.error(CompileErrorKind::DanglingQuantifier(c), position)
            }
            '^' => {
                self.advance();
                Ok(Expr::Begin)
            }
            '$' => {
                self.advance();
                Ok(Expr::End)
            }
            '.' => {
                self.advance();
                Ok(Expr::Predicate(CharPredicate::Any))
            }
            _ => {
                self.advance();
                Ok(Expr::literal(c))
            }
        }
    }

    /// group := '(' alternation ')'
    fn parse_group(&mut self) -> Result<Expr> {
        let open = self.position;
        self.advance(); // consume '('

        self.group_count += 1;
        let index = self.group_count;

        let inner = self.parse_alternation()?;

        if !self.eat(')') {
            return self.error(CompileErrorKind::UnterminatedGroup, open);
        }

        Ok(Expr::group(index, inner))
    }

    /// escape := '\' ( 'd' | 'w' | '1'..'9' | punctuation )
    fn parse_escape(&mut self) -> Result<Expr> {
        let backslash = self.position;
        self.advance(); // consume '\'

        let Some(c) = self.current() else {
            return self.error(CompileErrorKind::TrailingEscape, backslash);
        };
        self.advance();

        // Only a single digit is read, so groups past 9 cannot be referenced
        if let Some(group) = c.to_digit(10).filter(|d| *d != 0) {
            self.backreferences.push((group, backslash));
            return Ok(Expr::Backreference(group));
        }

        match Self::escaped_member(c) {
            Some(Member::Class(class)) => Ok(Expr::Predicate(CharPredicate::Class(class))),
            Some(Member::Char(literal)) => Ok(Expr::literal(literal)),
            None => self.error(CompileErrorKind::UnknownEscape(c), backslash),
        }
    }

    /// Resolve the character after a backslash to a class or a literal
    fn escaped_member(c: char) -> Option<Member> {
        if let Some(class) = CharacterClass::from_identifier(c) {
            Some(Member::Class(class))
        } else if c.is_ascii_punctuation() {
            Some(Member::Char(c))
        } else {
            None
        }
    }

    /// bracket := '[' '^'? member* ']'
    fn parse_bracket(&mut self) -> Result<Expr> {
        let open = self.position;
        self.advance(); // consume '['

        let negated = self.eat('^');
        let mut set = CharSet::new();
        let mut classes = Vec::new();

        loop {
            let position = self.position;
            let member = match self.current() {
                None => return self.error(CompileErrorKind::UnterminatedBracket, open),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(_) => self.parse_member(open)?,
            };

            match member {
                Member::Class(class) => classes.push(CharPredicate::Class(class)),
                Member::Char(start) => {
                    let is_range =
                        self.current() == Some('-') && !matches!(self.peek(), None | Some(']'));

                    if !is_range {
                        self.insert(&mut set, start, position)?;
                        continue;
                    }

                    self.advance(); // consume '-'
                    let end_position = self.position;
                    match self.parse_member(open)? {
                        Member::Char(end) => {
                            if start > end {
                                return self
                                    .error(CompileErrorKind::InvalidRange(start, end), position);
                            }
                            if !set.insert_range(start, end) {
                                let wide = if (start as u32) < 256 { end } else { start };
                                return self.error(
                                    CompileErrorKind::UnsupportedCharacter(wide),
                                    position,
                                );
                            }
                        }
                        // `a-\d` is not a range: keep both ends and the dash
                        Member::Class(class) => {
                            self.insert(&mut set, start, position)?;
                            self.insert(&mut set, '-', end_position - 1)?;
                            classes.push(CharPredicate::Class(class));
                        }
                    }
                }
            }
        }

        let mut members = vec![CharPredicate::Set(set)];
        members.extend(classes);
        let predicate = CharPredicate::union(members);

        Ok(Expr::Predicate(if negated {
            CharPredicate::negate(predicate)
        } else {
            predicate
        }))
    }

    /// member := char | '\' char
    fn parse_member(&mut self, open: usize) -> Result<Member> {
        let position = self.position;
        let Some(c) = self.current() else {
            return self.error(CompileErrorKind::UnterminatedBracket, open);
        };
        self.advance();

        if c != '\\' {
            return Ok(Member::Char(c));
        }

        let Some(escaped) = self.current() else {
            return self.error(CompileErrorKind::UnterminatedBracket, open);
        };
        self.advance();

        Self::escaped_member(escaped)
            .ok_or_else(|| CompileError::new(CompileErrorKind::UnknownEscape(escaped), position))
    }

    fn insert(&self, set: &mut CharSet, c: char, position: usize) -> Result<()> {
        if set.insert(c) {
            Ok(())
        } else {
            self.error(CompileErrorKind::UnsupportedCharacter(c), position)
        }
    }
}

/// Parse a pattern string into an AST
pub fn parse(input: &str) -> Result<Ast> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(pattern: &str) -> CompileErrorKind {
        parse(pattern).unwrap_err().kind
    }

    #[test]
    fn test_parse_literal() {
        let ast = parse("abc").unwrap();
        assert_eq!(ast.expr.to_pattern_string(), "abc");
        assert_eq!(ast.group_count, 0);
    }

    #[test]
    fn test_parse_empty() {
        let ast = parse("").unwrap();
        assert_eq!(ast.expr, Expr::Empty);
    }

    #[test]
    fn test_parse_classes_and_anchors() {
        let ast = parse(r"^\d\w.$").unwrap();
        assert_eq!(ast.expr.to_pattern_string(), r"^\d\w.$");
    }

    #[test]
    fn test_parse_quantifiers() {
        for pattern in ["a*", "a+", "a?", "a{3}", "a{2,}", "a{2,5}", "a*?", "a{1,3}?"] {
            let ast = parse(pattern).unwrap();
            assert_eq!(ast.expr.to_pattern_string(), pattern);
        }
    }

    #[test]
    fn test_parse_lazy_flag() {
        let ast = parse("a+?").unwrap();
        assert!(matches!(
            ast.expr,
            Expr::Repeat {
                min: 1,
                max: None,
                greedy: false,
                ..
            }
        ));
    }

    #[test]
    fn test_group_numbering_follows_open_parens() {
        let ast = parse(r"((\w+) \2) and \1").unwrap();
        assert_eq!(ast.group_count, 2);

        let Expr::Sequence(items) = &ast.expr else {
            panic!("expected a sequence, got {:?}", ast.expr);
        };
        let Expr::Group { index, expr } = &items[0] else {
            panic!("expected the outer group first");
        };
        assert_eq!(*index, 1);
        let Expr::Sequence(inner) = expr.as_ref() else {
            panic!("expected an inner sequence");
        };
        assert!(matches!(inner[0], Expr::Group { index: 2, .. }));
    }

    #[test]
    fn test_parse_alternation_in_group() {
        let ast = parse("(cat|dog|cow)s?").unwrap();
        assert_eq!(ast.expr.to_pattern_string(), "(cat|dog|cow)s?");
        assert_eq!(ast.group_count, 1);
    }

    #[test]
    fn test_parse_empty_branches() {
        let ast = parse("a||b").unwrap();
        assert!(matches!(&ast.expr, Expr::Alternation(alts) if alts.len() == 3));
        assert_eq!(parse("()").unwrap().group_count, 1);
    }

    #[test]
    fn test_parse_bracket() {
        assert_eq!(parse("[abc]").unwrap().expr.to_pattern_string(), "[abc]");
        assert_eq!(parse("[^abc]").unwrap().expr.to_pattern_string(), "[^abc]");
        assert_eq!(parse("[a-z]").unwrap().expr.to_pattern_string(), "[a-z]");
        assert_eq!(
            parse(r"[_\d\w]").unwrap().expr.to_pattern_string(),
            r"[_\d\w]"
        );
    }

    #[test]
    fn test_parse_bracket_dash_edges() {
        let ast = parse("[-a-]").unwrap();
        let Expr::Predicate(predicate) = ast.expr else {
            panic!("expected a predicate");
        };
        assert!(predicate.test('-'));
        assert!(predicate.test('a'));
        assert!(!predicate.test('b'));
    }

    #[test]
    fn test_parse_bracket_escapes() {
        let ast = parse(r"[\]\\]").unwrap();
        let Expr::Predicate(predicate) = ast.expr else {
            panic!("expected a predicate");
        };
        assert!(predicate.test(']'));
        assert!(predicate.test('\\'));
        assert!(!predicate.test('a'));
    }

    #[test]
    fn test_parse_escaped_punctuation() {
        let ast = parse(r"\.\(\\").unwrap();
        assert_eq!(
            ast.expr,
            Expr::sequence(vec![
                Expr::literal('.'),
                Expr::literal('('),
                Expr::literal('\\'),
            ])
        );
    }

    #[test]
    fn test_parse_backreference() {
        let ast = parse(r"(a)\1").unwrap();
        assert_eq!(ast.expr.to_pattern_string(), r"(a)\1");
    }

    #[test]
    fn test_backreference_is_single_digit() {
        let groups = "(a)".repeat(10);
        let ast = parse(&format!(r"{groups}\10")).unwrap();
        let Expr::Sequence(items) = ast.expr else {
            panic!("expected a sequence");
        };
        assert_eq!(items[10], Expr::Backreference(1));
        assert_eq!(items[11], Expr::literal('0'));
    }

    #[test]
    fn test_error_unknown_escape() {
        let err = parse(r"ab\q").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnknownEscape('q'));
        assert_eq!(err.position, 2);
        assert_eq!(kind(r"\0"), CompileErrorKind::UnknownEscape('0'));
        assert_eq!(kind(r"[\s]"), CompileErrorKind::UnknownEscape('s'));
    }

    #[test]
    fn test_error_trailing_escape() {
        assert_eq!(kind("abc\\"), CompileErrorKind::TrailingEscape);
    }

    #[test]
    fn test_error_unterminated_group() {
        let err = parse("x(ab").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnterminatedGroup);
        assert_eq!(err.position, 1);
        assert_eq!(kind("((a)"), CompileErrorKind::UnterminatedGroup);
    }

    #[test]
    fn test_error_unmatched_paren() {
        let err = parse("ab)").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnmatchedParen);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_error_unterminated_bracket() {
        assert_eq!(kind("[abc"), CompileErrorKind::UnterminatedBracket);
        assert_eq!(kind("[^"), CompileErrorKind::UnterminatedBracket);
        assert_eq!(kind(r"[a\"), CompileErrorKind::UnterminatedBracket);
    }

    #[test]
    fn test_error_bracket_ranges() {
        assert_eq!(kind("[z-a]"), CompileErrorKind::InvalidRange('z', 'a'));
        assert_eq!(kind("[€]"), CompileErrorKind::UnsupportedCharacter('€'));
        assert_eq!(kind("[a-€]"), CompileErrorKind::UnsupportedCharacter('€'));
    }

    #[test]
    fn test_error_dangling_quantifier() {
        assert_eq!(kind("+a"), CompileErrorKind::DanglingQuantifier('+'));
        assert_eq!(kind("?"), CompileErrorKind::DanglingQuantifier('?'));
        assert_eq!(kind("a|*b"), CompileErrorKind::DanglingQuantifier('*'));
        assert_eq!(kind("(+)"), CompileErrorKind::DanglingQuantifier('+'));
        assert_eq!(kind("^*"), CompileErrorKind::DanglingQuantifier('*'));
        assert_eq!(kind("a**"), CompileErrorKind::DanglingQuantifier('*'));
        assert_eq!(kind("a+?+"), CompileErrorKind::DanglingQuantifier('+'));
    }

    #[test]
    fn test_error_invalid_repetition() {
        for pattern in ["a{", "a{}", "a{x}", "a{2", "a{2,x}", "a{99999999999}"] {
            assert!(
                matches!(kind(pattern), CompileErrorKind::InvalidRepetition(_)),
                "{pattern} should be rejected"
            );
        }
        assert_eq!(
            kind("a{4,2}"),
            CompileErrorKind::InvalidRepetition("minimum 4 exceeds maximum 2".to_string())
        );
    }

    #[test]
    fn test_error_undefined_backreference() {
        let err = parse(r"(a)\2").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UndefinedBackreference(2));
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_forward_backreference_compiles() {
        assert!(parse(r"\1(a)").is_ok());
    }
}
