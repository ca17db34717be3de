use std::fmt;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegexError {
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Missing closing parenthesis for '(' at position {0}")]
    MissingClosingParen(usize),
    #[error("Unmatched ')' at position {0}")]
    UnmatchedClosingParen(usize),
    #[error("Operator '{op}' at position {at} has nothing to repeat")]
    NothingToRepeat { op: char, at: usize },
    #[error("'#' at position {0} is reserved as the end marker")]
    ReservedEndMarker(usize),
    #[error("Parentheses nest deeper than {limit} levels at position {at}")]
    TooDeeplyNested { limit: usize, at: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutomatonKind {
    Nfa,
    Dfa,
}

impl fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonKind::Nfa => f.write_str("NFA"),
            AutomatonKind::Dfa => f.write_str("DFA"),
        }
    }
}

// every problem found in an input automaton, not just the first one
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Invalid {kind}: {}", .problems.join("; "))]
pub struct ValidationError {
    pub kind: AutomatonKind,
    pub problems: Vec<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error(transparent)]
    Regex(#[from] RegexError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Construction exceeded the limit of {limit} DFA states")]
    StateLimitExceeded { limit: usize },
}
