use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub const EPSILON: &str = "ε";
pub const EPSILON_ALIAS: &str = "epsilon";
pub const EMPTY_SET: &str = "∅";
pub const END_MARKER: char = '#';

// characters with meaning in the regex grammar, never usable as alphabet symbols
const RESERVED: &[char] = &['(', ')', '|', '*', '+', '?', END_MARKER, 'ε', '∅'];

pub fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !RESERVED.contains(&c)
}

/// A transition label: either a single alphabet character or the empty string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    /// Accepts `ε`, its spelled-out synonym `epsilon`, or a single symbol character.
    pub fn parse(text: &str) -> Option<Symbol> {
        if text == EPSILON || text == EPSILON_ALIAS {
            return Some(Symbol::Epsilon);
        }

        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if is_symbol_char(c) => Some(Symbol::Char(c)),
            _ => None,
        }
    }

    pub fn is_epsilon(self) -> bool {
        self == Symbol::Epsilon
    }

    pub fn as_char(self) -> Option<char> {
        match self {
            Symbol::Epsilon => None,
            Symbol::Char(c) => Some(c),
        }
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Char(c)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => f.write_str(EPSILON),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Symbol::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid transition symbol '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epsilon_spellings() {
        assert_eq!(Symbol::parse("ε"), Some(Symbol::Epsilon));
        assert_eq!(Symbol::parse("epsilon"), Some(Symbol::Epsilon));
        assert_eq!(Symbol::parse("a"), Some(Symbol::Char('a')));
    }

    #[test]
    fn rejects_reserved_and_long_symbols() {
        assert_eq!(Symbol::parse("ab"), None);
        assert_eq!(Symbol::parse(""), None);
        assert_eq!(Symbol::parse("*"), None);
        assert_eq!(Symbol::parse("#"), None);
        assert_eq!(Symbol::parse(" "), None);
    }

    #[test]
    fn epsilon_serializes_as_literal() {
        let json = serde_json::to_string(&Symbol::Epsilon).unwrap();
        assert_eq!(json, "\"ε\"");
        let parsed: Symbol = serde_json::from_str("\"epsilon\"").unwrap();
        assert_eq!(parsed, Symbol::Epsilon);
    }
}
