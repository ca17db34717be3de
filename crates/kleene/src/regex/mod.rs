// regex grammar (EBNF)
// <regex> ::= <term> { '|' <term> }
//
// <term> ::= { <factor> }            (an empty term denotes ε)
//
// <factor> ::= <base> { '*' | '+' | '?' }   (stacked operators collapse to one)
//
// <base> ::= <char>
// |  'ε'                             (empty string)
// |  '∅'                             (empty language)
// |  '(' <regex> ')'
//
// whitespace is ignored, '#' is reserved for the end marker, parentheses nest
// at most MAX_NESTING deep

use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;

use kleene_util::RangeUInt;

use crate::automaton::{is_symbol_char, EMPTY_SET, END_MARKER, EPSILON};
use crate::error::RegexError;

mod simplify;

pub use simplify::simplify;

pub const MAX_NESTING: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Regex {
    Alternation(Vec<Regex>),
    Concatenation(Vec<Regex>),
    Kleene(Box<Regex>),
    Char(char),
    Epsilon,
    EmptySet,
}

// basic recursive descent parsing
impl Regex {
    fn parse_regex<I>(tokens: &mut Peekable<I>, depth: usize) -> Result<Regex, RegexError>
    where
        I: Iterator<Item = (usize, char)>,
    {
        let mut alternates: Vec<Regex> = vec![Self::parse_term(tokens, depth)?];
        while tokens.peek().is_some_and(|(_, c)| *c == '|') {
            _ = tokens.next();
            alternates.push(Self::parse_term(tokens, depth)?);
        }

        if alternates.len() == 1 {
            Ok(alternates.pop().expect("Must be nonempty"))
        } else {
            Ok(Regex::Alternation(alternates))
        }
    }

    fn parse_term<I>(tokens: &mut Peekable<I>, depth: usize) -> Result<Regex, RegexError>
    where
        I: Iterator<Item = (usize, char)>,
    {
        let mut factors: Vec<Regex> = Vec::new();
        while tokens.peek().is_some_and(|(_, c)| *c != '|' && *c != ')') {
            factors.push(Self::parse_factor(tokens, depth)?);
        }

        match factors.len() {
            0 => Ok(Regex::Epsilon),
            1 => Ok(factors.pop().expect("Must be nonempty")),
            _ => Ok(Regex::Concatenation(factors)),
        }
    }

    fn parse_factor<I>(tokens: &mut Peekable<I>, depth: usize) -> Result<Regex, RegexError>
    where
        I: Iterator<Item = (usize, char)>,
    {
        let factor = Self::parse_base(tokens, depth)?;

        // X** = X*, X++ = X+, X?? = X?, any other mix is X*
        let mut op: Option<char> = None;
        while let Some((_, c)) = tokens.peek().copied() {
            if !matches!(c, '*' | '+' | '?') {
                break;
            }
            _ = tokens.next();
            op = match op {
                Some(prev) if prev != c => Some('*'),
                _ => Some(c),
            };
        }

        let (low, high) = match op {
            Some('*') => (RangeUInt::Finite(0), RangeUInt::Infinite),
            Some('+') => (RangeUInt::Finite(1), RangeUInt::Infinite),
            Some('?') => (RangeUInt::Finite(0), RangeUInt::Finite(1)),
            _ => return Ok(factor),
        };
        Ok(Self::repeat(factor, low, high))
    }

    // desugar bounded repetition into the core operators
    fn repeat(base: Regex, low: RangeUInt, high: RangeUInt) -> Regex {
        match (low, high) {
            (RangeUInt::Finite(0), RangeUInt::Infinite) => Regex::Kleene(Box::new(base)),
            (RangeUInt::Finite(1), RangeUInt::Infinite) => {
                let kleene = Regex::Kleene(Box::new(base.clone()));
                Regex::Concatenation(vec![base, kleene])
            }
            (RangeUInt::Finite(0), RangeUInt::Finite(1)) => {
                Regex::Alternation(vec![base, Regex::Epsilon])
            }
            _ => base,
        }
    }

    fn parse_base<I>(tokens: &mut Peekable<I>, depth: usize) -> Result<Regex, RegexError>
    where
        I: Iterator<Item = (usize, char)>,
    {
        let (at, front) = tokens.next().ok_or(RegexError::UnexpectedEnd)?;
        match front {
            '(' => {
                if depth >= MAX_NESTING {
                    return Err(RegexError::TooDeeplyNested { limit: MAX_NESTING, at });
                }
                let parenthesized_regex = Self::parse_regex(tokens, depth + 1)?;
                if tokens.next().is_some_and(|(_, c)| c == ')') {
                    Ok(parenthesized_regex)
                } else {
                    Err(RegexError::MissingClosingParen(at))
                }
            }
            '*' | '+' | '?' => Err(RegexError::NothingToRepeat { op: front, at }),
            END_MARKER => Err(RegexError::ReservedEndMarker(at)),
            'ε' => Ok(Regex::Epsilon),
            '∅' => Ok(Regex::EmptySet),
            c => {
                debug_assert!(is_symbol_char(c));
                Ok(Regex::Char(c))
            }
        }
    }

    /// Whether the language contains the empty string.
    pub fn nullable(&self) -> bool {
        match self {
            Regex::Alternation(alternates) => alternates.iter().any(Regex::nullable),
            Regex::Concatenation(factors) => factors.iter().all(Regex::nullable),
            Regex::Kleene(_) | Regex::Epsilon => true,
            Regex::Char(_) | Regex::EmptySet => false,
        }
    }

    /// Symbols used by the expression, in order of first appearance.
    pub fn symbols(&self) -> Vec<char> {
        fn walk(re: &Regex, out: &mut Vec<char>) {
            match re {
                Regex::Alternation(children) | Regex::Concatenation(children) => {
                    children.iter().for_each(|child| walk(child, out))
                }
                Regex::Kleene(inner) => walk(inner, out),
                Regex::Char(c) => {
                    if !out.contains(c) {
                        out.push(*c)
                    }
                }
                Regex::Epsilon | Regex::EmptySet => {}
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    fn fmt_atom(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Char(_) | Regex::Epsilon | Regex::EmptySet => write!(f, "{}", self),
            _ => write!(f, "({})", self),
        }
    }
}

impl FromStr for Regex {
    type Err = RegexError;

    fn from_str(re_str: &str) -> Result<Regex, RegexError> {
        let mut tokens = re_str.chars().enumerate().filter(|(_, c)| !c.is_whitespace()).peekable();
        let re = Self::parse_regex(&mut tokens, 0)?;
        match tokens.next() {
            // parse_term only stops early on ')', anything left over is unmatched
            Some((at, _)) => Err(RegexError::UnmatchedClosingParen(at)),
            None => Ok(re),
        }
    }
}

// prints with the fewest parentheses the grammar needs to read it back
impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Alternation(alternates) if alternates.is_empty() => f.write_str(EMPTY_SET),
            Regex::Alternation(alternates) => {
                for (i, alternate) in alternates.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match alternate {
                        Regex::Alternation(_) => write!(f, "({})", alternate)?,
                        _ => write!(f, "{}", alternate)?,
                    }
                }
                Ok(())
            }
            Regex::Concatenation(factors) if factors.is_empty() => f.write_str(EPSILON),
            Regex::Concatenation(factors) => {
                for factor in factors {
                    match factor {
                        Regex::Alternation(_) => write!(f, "({})", factor)?,
                        _ => write!(f, "{}", factor)?,
                    }
                }
                Ok(())
            }
            Regex::Kleene(inner) => {
                inner.fmt_atom(f)?;
                f.write_str("*")
            }
            Regex::Char(c) => write!(f, "{}", c),
            Regex::Epsilon => f.write_str(EPSILON),
            Regex::EmptySet => f.write_str(EMPTY_SET),
        }
    }
}
