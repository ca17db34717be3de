use std::ops::Deref;

use serde::Serialize;

use super::{Automaton, AutomatonJson, State, StateIdx, Symbol, Transition};

/// Deterministic automaton: exactly one start state and at most one transition
/// per `(state, symbol)`. Determinism is not checked on insert; the conversions
/// only ever produce deterministic automata.
#[derive(Clone, Debug)]
pub struct Dfa {
    core: Automaton,
    start: StateIdx,
}

/// One row of a step-by-step simulation. Row 0 is the start state before any input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub step: usize,
    pub state: Option<String>,
    pub symbol: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
}

impl Dfa {
    pub fn new(mut start: State) -> Dfa {
        start.is_start = true;
        let mut core = Automaton::new();
        let id = start.id.clone();
        core.add_state(start);
        let start = core.index_of(&id).expect("start state was just inserted");
        Dfa { core, start }
    }

    // wraps an already checked automaton whose start flag is set on `start`
    pub(crate) fn from_parts(core: Automaton, start: StateIdx) -> Dfa {
        Dfa { core, start }
    }

    /// Builds a DFA from `(from, symbol, to)` triples. States are collected from
    /// the triples plus the start and final ids, and added in sorted order.
    pub fn from_triples(
        alphabet: &[char],
        triples: &[(&str, char, &str)],
        start: &str,
        finals: &[&str],
    ) -> Dfa {
        let mut ids: Vec<&str> = triples.iter().flat_map(|(from, _, to)| [*from, *to]).collect();
        ids.push(start);
        ids.extend_from_slice(finals);
        ids.sort();
        ids.dedup();

        let mut dfa = Dfa::new(State::with_flags(start, true, finals.contains(&start)));
        for id in ids {
            dfa.add_state(State::with_flags(id, false, finals.contains(&id)));
        }
        for (from, symbol, to) in triples {
            dfa.add_transition(Transition::new(*from, *to, *symbol));
        }
        dfa.core.extend_alphabet(alphabet.iter().copied());
        dfa
    }

    /// Adds a non-start state.
    pub fn add_state(&mut self, mut state: State) -> bool {
        state.is_start = false;
        self.core.add_state(state)
    }

    pub fn add_transition(&mut self, transition: Transition) -> bool {
        self.core.add_transition(transition)
    }

    pub fn set_final(&mut self, id: &str, is_final: bool) -> bool {
        self.core.set_final(id, is_final)
    }

    pub fn extend_alphabet(&mut self, symbols: impl IntoIterator<Item = char>) {
        self.core.extend_alphabet(symbols)
    }

    pub fn start_state(&self) -> &State {
        self.core.state_at(self.start)
    }

    pub(crate) fn start_idx(&self) -> StateIdx {
        self.start
    }

    pub fn next_state(&self, id: &str, symbol: char) -> Option<&str> {
        let from = self.core.index_of(id)?;
        self.step(from, symbol).map(|to| self.core.state_at(to).id.as_str())
    }

    fn step(&self, from: StateIdx, symbol: char) -> Option<StateIdx> {
        self.core.targets(from, Symbol::Char(symbol)).next()
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.start;

        for c in input.chars() {
            if !self.core.alphabet().contains(&c) {
                return false;
            }
            match self.step(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }

        self.core.state_at(state).is_final
    }

    /// Walks `input` and records each move. Stops after the first symbol with no
    /// transition; that row has `state: None`.
    pub fn execution_trace(&self, input: &str) -> Vec<TraceEntry> {
        let mut state = self.start;
        let mut trace = vec![TraceEntry {
            step: 0,
            state: Some(self.core.state_at(state).id.clone()),
            symbol: None,
            transition: None,
        }];

        for (i, c) in input.chars().enumerate() {
            let next = self.step(state, c);
            let from = &self.core.state_at(state).id;
            trace.push(TraceEntry {
                step: i + 1,
                state: next.map(|n| self.core.state_at(n).id.clone()),
                symbol: Some(c),
                transition: next
                    .map(|n| format!("{} --{}--> {}", from, c, self.core.state_at(n).id)),
            });

            match next {
                Some(next) => state = next,
                None => break,
            }
        }

        trace
    }

    pub fn to_json(&self) -> AutomatonJson {
        AutomatonJson {
            states: self.core.states().to_vec(),
            transitions: self.core.transitions().to_vec(),
            alphabet: self.core.alphabet().iter().map(|c| c.to_string()).collect(),
            start_state: Some(self.start_state().id.clone()),
            start_states: None,
            final_states: self.core.final_ids().map(String::from).collect(),
        }
    }

    pub fn into_automaton(self) -> Automaton {
        self.core
    }
}

impl Deref for Dfa {
    type Target = Automaton;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // accepts strings over {a, b} ending in "ab"
    fn ends_in_ab() -> Dfa {
        Dfa::from_triples(
            &['a', 'b'],
            &[
                ("q0", 'a', "q1"),
                ("q0", 'b', "q0"),
                ("q1", 'a', "q1"),
                ("q1", 'b', "q2"),
                ("q2", 'a', "q1"),
                ("q2", 'b', "q0"),
            ],
            "q0",
            &["q2"],
        )
    }

    #[test]
    fn accepts_walks_deterministically() {
        let dfa = ends_in_ab();
        assert!(dfa.accepts("ab"));
        assert!(dfa.accepts("bbaab"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("aba"));
        assert!(!dfa.accepts("abc"));
    }

    #[test]
    fn missing_transition_rejects() {
        let dfa = Dfa::from_triples(&['a'], &[("s", 'a', "t")], "s", &["t"]);
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("aa"));
        assert_eq!(dfa.next_state("t", 'a'), None);
        assert_eq!(dfa.next_state("s", 'a'), Some("t"));
    }

    #[test]
    fn execution_trace_stops_at_dead_end() {
        let dfa = Dfa::from_triples(&['a', 'b'], &[("s", 'a', "t")], "s", &["t"]);
        let trace = dfa.execution_trace("ab");

        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0].state.as_deref(), Some("s"));
        assert_eq!(trace[1].transition.as_deref(), Some("s --a--> t"));
        assert_eq!(trace[2].state, None);
        assert_eq!(trace[2].symbol, Some('b'));
    }

    #[test]
    fn to_json_lists_start_and_finals() {
        let json = ends_in_ab().to_json();
        assert_eq!(json.start_state.as_deref(), Some("q0"));
        assert_eq!(json.final_states, vec!["q2"]);
        assert_eq!(json.alphabet, vec!["a", "b"]);
        assert_eq!(json.states.len(), 3);
        assert!(json.start_states.is_none());
    }

    #[test]
    fn clone_is_deep() {
        let original = ends_in_ab();
        let mut copy = original.clone();
        copy.set_final("q0", true);
        assert!(copy.accepts(""));
        assert!(!original.accepts(""));
    }
}
