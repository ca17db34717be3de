//! Wire shapes exchanged with transport layers, and the validation that turns
//! them into [`Nfa`]/[`Dfa`] values. Validation reports every problem at once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Automaton, Dfa, Nfa, State, Symbol, Transition};
use crate::error::{AutomatonKind, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionJson {
    pub from: String,
    pub to: String,
    pub symbol: String,
}

impl From<&Transition> for TransitionJson {
    fn from(t: &Transition) -> Self {
        TransitionJson {
            from: t.from.clone(),
            to: t.to.clone(),
            symbol: t.symbol.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfaJson {
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub alphabet: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionJson>,
    #[serde(default)]
    pub start_states: Vec<String>,
    #[serde(default)]
    pub final_states: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfaJson {
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub alphabet: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_state: Option<String>,
    #[serde(default)]
    pub final_states: Vec<String>,
}

/// Output shape of every automaton the engine produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatonJson {
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub alphabet: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_states: Option<Vec<String>>,
    pub final_states: Vec<String>,
}

// lets a produced DFA be fed straight back in as conversion input
impl From<AutomatonJson> for DfaJson {
    fn from(json: AutomatonJson) -> Self {
        let start_state = json
            .start_state
            .or_else(|| json.start_states.and_then(|s| s.into_iter().next()));
        DfaJson {
            transitions: json.transitions.iter().map(TransitionJson::from).collect(),
            states: json.states,
            alphabet: json.alphabet,
            start_state,
            final_states: json.final_states,
        }
    }
}

impl From<AutomatonJson> for NfaJson {
    fn from(json: AutomatonJson) -> Self {
        let start_states = match (json.start_states, json.start_state) {
            (Some(starts), _) => starts,
            (None, Some(start)) => vec![start],
            (None, None) => Vec::new(),
        };
        NfaJson {
            transitions: json.transitions.iter().map(TransitionJson::from).collect(),
            states: json.states,
            alphabet: json.alphabet,
            start_states,
            final_states: json.final_states,
        }
    }
}

// produced automata are trusted as they are, including an empty alphabet
impl From<&AutomatonJson> for Automaton {
    fn from(json: &AutomatonJson) -> Self {
        let mut fa = Automaton::new();
        for state in &json.states {
            fa.add_state(state.clone());
        }
        for transition in &json.transitions {
            fa.add_transition(transition.clone());
        }
        fa.extend_alphabet(json.alphabet.iter().filter_map(|s| Symbol::parse(s)?.as_char()));
        fa
    }
}

// checks shared by NFA and DFA input; the start/final flags are applied by the caller
fn build_checked(
    states: &[State],
    alphabet: &[String],
    transitions: &[TransitionJson],
    finals: &[String],
    problems: &mut Vec<String>,
) -> Automaton {
    let mut fa = Automaton::new();

    if states.is_empty() {
        problems.push("Automaton must have at least one state".to_string());
    }
    for state in states {
        if state.id.is_empty() {
            problems.push("State id must not be empty".to_string());
            continue;
        }
        let mut state = state.clone();
        if state.label.is_empty() {
            state.label = state.id.clone();
        }
        state.is_start = false;
        let id = state.id.clone();
        if !fa.add_state(state) {
            problems.push(format!("Duplicate state id: {}", id));
        }
    }

    let mut symbols: HashSet<char> = HashSet::new();
    for entry in alphabet {
        match Symbol::parse(entry) {
            Some(Symbol::Char(c)) => {
                symbols.insert(c);
            }
            Some(Symbol::Epsilon) => {}
            None => problems.push(format!(
                "Alphabet symbol '{}' must be a single non-reserved character",
                entry
            )),
        }
    }
    if symbols.is_empty() {
        problems.push("Automaton must have non-empty alphabet".to_string());
    }
    fa.extend_alphabet(symbols.iter().copied());

    for t in transitions {
        let mut valid = true;
        if !fa.contains_state(&t.from) {
            problems.push(format!("Transition references invalid from-state: {}", t.from));
            valid = false;
        }
        if !fa.contains_state(&t.to) {
            problems.push(format!("Transition references invalid to-state: {}", t.to));
            valid = false;
        }
        let symbol = match Symbol::parse(&t.symbol) {
            Some(Symbol::Char(c)) if !symbols.contains(&c) => {
                problems.push(format!(
                    "Transition {} -> {} uses symbol '{}' which is not in the alphabet",
                    t.from, t.to, c
                ));
                None
            }
            Some(symbol) => Some(symbol),
            None => {
                problems.push(format!(
                    "Transition {} -> {} has invalid symbol '{}'",
                    t.from, t.to, t.symbol
                ));
                None
            }
        };

        if let (true, Some(symbol)) = (valid, symbol) {
            fa.add_transition(Transition::new(t.from.clone(), t.to.clone(), symbol));
        }
    }

    let flagged: Vec<String> = states.iter().filter(|s| s.is_final).map(|s| s.id.clone()).collect();
    for id in finals.iter().chain(flagged.iter()) {
        if !fa.set_final(id, true) {
            problems.push(format!("Final state references unknown state: {}", id));
        }
    }

    fa
}

impl Nfa {
    /// Validates raw NFA input. Start states are the union of `startStates` and
    /// states flagged `isStart`; likewise for final states.
    pub fn from_json(json: &NfaJson) -> Result<Nfa, ValidationError> {
        let mut problems = Vec::new();
        let mut fa = build_checked(
            &json.states,
            &json.alphabet,
            &json.transitions,
            &json.final_states,
            &mut problems,
        );

        let flagged = json.states.iter().filter(|s| s.is_start).map(|s| &s.id);
        let mut any_start = false;
        for id in json.start_states.iter().chain(flagged) {
            if fa.set_start(id, true) {
                any_start = true;
            } else {
                problems.push(format!("Start state references unknown state: {}", id));
            }
        }
        if !any_start {
            problems.push("NFA must have at least one start state".to_string());
        }

        if problems.is_empty() {
            Ok(Nfa::from_automaton(fa))
        } else {
            Err(ValidationError { kind: AutomatonKind::Nfa, problems })
        }
    }
}

impl Dfa {
    /// Validates raw DFA input. `startState` wins when present; otherwise exactly
    /// one state must be flagged `isStart`.
    pub fn from_json(json: &DfaJson) -> Result<Dfa, ValidationError> {
        let mut problems = Vec::new();
        let mut fa = build_checked(
            &json.states,
            &json.alphabet,
            &json.transitions,
            &json.final_states,
            &mut problems,
        );

        let start = match &json.start_state {
            Some(id) if !id.is_empty() => Some(id.clone()),
            _ => {
                let flagged: Vec<&State> = json.states.iter().filter(|s| s.is_start).collect();
                match flagged.as_slice() {
                    [single] => Some(single.id.clone()),
                    _ => None,
                }
            }
        };

        let start = match start {
            Some(id) if fa.set_start(&id, true) => fa.index_of(&id),
            Some(id) => {
                problems.push(format!("Start state references unknown state: {}", id));
                None
            }
            None => {
                problems.push("DFA must have exactly one start state".to_string());
                None
            }
        };

        match start {
            Some(start) if problems.is_empty() => Ok(Dfa::from_parts(fa, start)),
            _ => Err(ValidationError { kind: AutomatonKind::Dfa, problems }),
        }
    }
}
