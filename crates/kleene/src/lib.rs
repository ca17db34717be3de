//! Conversions between regular expressions and finite automata, each of which
//! also produces an ordered trace of the stages it went through.
//!
//! - regex → DFA by direct construction over followpos ([`direct`])
//! - NFA → DFA by subset construction ([`subset`])
//! - DFA or NFA → regex by state elimination ([`elimination`])
//!
//! [`convert`] wraps the three engines in request/response types that never
//! return an error; failures are part of the response.

pub mod automaton;
pub mod convert;
pub mod direct;
pub mod elimination;
pub mod error;
pub mod options;
pub mod regex;
pub mod subset;
pub mod trace;

pub use automaton::{
    Automaton, AutomatonJson, Dfa, DfaJson, Nfa, NfaJson, State, Symbol, Transition,
};
pub use convert::{
    DfaResponse, DfaToRegexRequest, NfaToDfaRequest, NfaToRegexRequest, RegexResponse,
    RegexToDfaRequest,
};
pub use error::{ConvertError, RegexError, ValidationError};
pub use options::ConvertOptions;
pub use regex::Regex;
pub use trace::{StepKind, StepRecord, StepRecorder};
