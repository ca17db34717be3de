//! Automaton data model shared by every conversion engine.
//!
//! [`Automaton`] holds the states, transitions and alphabet. [`Dfa`] and
//! [`Nfa`] wrap it and add the operations that depend on determinism.
//! States keep their insertion order so that every conversion produces the
//! same output for the same input.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use bit_set::BitSet;
use kleene_util::make_type_idx;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

mod dfa;
mod json;
mod nfa;
mod symbol;

pub use dfa::{Dfa, TraceEntry};
pub use json::{AutomatonJson, DfaJson, NfaJson, TransitionJson};
pub use nfa::Nfa;
pub use symbol::{is_symbol_char, Symbol, EMPTY_SET, END_MARKER, EPSILON, EPSILON_ALIAS};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_final: bool,
    // presentation hint only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl State {
    pub fn new(id: impl Into<String>) -> State {
        let id = id.into();
        State {
            label: id.clone(),
            id,
            is_start: false,
            is_final: false,
            position: None,
        }
    }

    pub fn with_flags(id: impl Into<String>, is_start: bool, is_final: bool) -> State {
        State {
            is_start,
            is_final,
            ..State::new(id)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub symbol: Symbol,
}

impl Transition {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        symbol: impl Into<Symbol>,
    ) -> Transition {
        Transition {
            from: from.into(),
            to: to.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "δ({}, {}) = {}", self.from, self.symbol, self.to)
    }
}

make_type_idx!(StateIdx, State);

#[derive(Clone, Debug, Default)]
pub struct Automaton {
    states: Vec<State>,
    ids: HashMap<String, StateIdx>,
    transitions: Vec<Transition>,
    // outgoing edges per state, mirrors `transitions` with interned endpoints
    outgoing: Vec<Vec<(Symbol, StateIdx)>>,
    alphabet: BTreeSet<char>,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton::default()
    }

    /// Adds a state; returns `false` (and keeps the existing one) if the id is taken.
    pub fn add_state(&mut self, state: State) -> bool {
        if self.ids.contains_key(&state.id) {
            return false;
        }

        let id = state.id.clone();
        let idx = StateIdx::from_push(&mut self.states, state);
        self.outgoing.push(Vec::new());
        self.ids.insert(id, idx);
        true
    }

    /// Adds a transition. Unknown endpoints are created as plain states and the
    /// alphabet is extended with the symbol. Inserting an identical transition
    /// twice is a no-op; returns whether anything was inserted.
    pub fn add_transition(&mut self, transition: Transition) -> bool {
        let from = self.ensure_state(&transition.from);
        let to = self.ensure_state(&transition.to);

        let edge = (transition.symbol, to);
        if self.outgoing[from.as_usize()].contains(&edge) {
            return false;
        }

        if let Symbol::Char(c) = transition.symbol {
            self.alphabet.insert(c);
        }
        self.outgoing[from.as_usize()].push(edge);
        self.transitions.push(transition);
        true
    }

    fn ensure_state(&mut self, id: &str) -> StateIdx {
        if let Some(idx) = self.ids.get(id) {
            return *idx;
        }
        self.add_state(State::new(id));
        self.ids[id]
    }

    pub fn extend_alphabet(&mut self, symbols: impl IntoIterator<Item = char>) {
        self.alphabet.extend(symbols);
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.ids.get(id).map(|idx| &self.states[*idx])
    }

    pub fn contains_state(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// `base`, primed until no state of this automaton uses it.
    pub fn fresh_id(&self, base: &str) -> String {
        let mut id = base.to_string();
        while self.contains_state(&id) {
            id.push('\'');
        }
        id
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn transitions_from<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.from == id)
    }

    pub fn transitions_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.to == id)
    }

    pub fn transitions_with_symbol(
        &self,
        symbol: Symbol,
    ) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter().filter(move |t| t.symbol == symbol)
    }

    pub fn start_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().filter(|s| s.is_start).map(|s| s.id.as_str())
    }

    pub fn final_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().filter(|s| s.is_final).map(|s| s.id.as_str())
    }

    pub fn is_final(&self, id: &str) -> bool {
        self.state(id).is_some_and(|s| s.is_final)
    }

    pub fn set_start(&mut self, id: &str, is_start: bool) -> bool {
        match self.ids.get(id) {
            Some(idx) => {
                self.states[*idx].is_start = is_start;
                true
            }
            None => false,
        }
    }

    pub fn set_final(&mut self, id: &str, is_final: bool) -> bool {
        match self.ids.get(id) {
            Some(idx) => {
                self.states[*idx].is_final = is_final;
                true
            }
            None => false,
        }
    }

    /// Keeps only the states matching `keep` and the transitions between them.
    /// The alphabet is left untouched.
    pub fn retain_states(&mut self, keep: impl Fn(&State) -> bool) {
        let states: Vec<State> = self.states.iter().filter(|&s| keep(s)).cloned().collect();
        let transitions: Vec<Transition> = self.transitions.clone();
        let alphabet = std::mem::take(&mut self.alphabet);

        *self = Automaton::new();
        for state in states {
            self.add_state(state);
        }
        for transition in transitions {
            if self.contains_state(&transition.from) && self.contains_state(&transition.to) {
                self.add_transition(transition);
            }
        }
        self.alphabet = alphabet;
    }

    /// Structural problems that make the automaton unusable as conversion input.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.states.is_empty() {
            problems.push("Automaton must have at least one state".to_string());
        }
        if self.alphabet.is_empty() {
            problems.push("Automaton must have non-empty alphabet".to_string());
        }
        problems
    }

    /// Graph view with one node per state, in state order, labelled by state id.
    pub fn to_graph(&self) -> DiGraph<String, String> {
        let mut graph = DiGraph::with_capacity(self.states.len(), self.transitions.len());
        let nodes: Vec<_> = self.states.iter().map(|s| graph.add_node(s.id.clone())).collect();
        for (from, edges) in self.outgoing.iter().enumerate() {
            for (symbol, to) in edges {
                graph.add_edge(nodes[from], nodes[to.as_usize()], symbol.to_string());
            }
        }
        graph
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<StateIdx> {
        self.ids.get(id).copied()
    }

    pub(crate) fn state_at(&self, idx: StateIdx) -> &State {
        &self.states[idx]
    }

    pub(crate) fn targets(
        &self,
        from: StateIdx,
        symbol: Symbol,
    ) -> impl Iterator<Item = StateIdx> + '_ {
        self.outgoing[from.as_usize()]
            .iter()
            .filter(move |(label, _)| *label == symbol)
            .map(|(_, to)| *to)
    }

    /// Extends `set` with every state reachable through epsilon transitions.
    pub(crate) fn epsilon_closure(&self, set: &mut BitSet) {
        let mut stack: Vec<usize> = set.iter().collect();

        while let Some(i) = stack.pop() {
            for (label, next) in &self.outgoing[i] {
                if label.is_epsilon() && set.insert(next.as_usize()) {
                    stack.push(next.as_usize());
                }
            }
        }
    }

    /// States reachable from `set` by consuming exactly `c`, without closure.
    pub(crate) fn delta(&self, set: &BitSet, c: char) -> BitSet {
        let mut result = BitSet::with_capacity(self.states.len());

        for i in set.iter() {
            for (label, next) in &self.outgoing[i] {
                if *label == Symbol::Char(c) {
                    result.insert(next.as_usize());
                }
            }
        }

        result
    }

    /// State ids of an index set, sorted for canonical keys.
    pub(crate) fn sorted_ids(&self, set: &BitSet) -> Vec<String> {
        let mut ids: Vec<String> = set
            .iter()
            .map(|i| self.states[StateIdx::from_usize(i)].id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn index_set<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> BitSet {
        let mut set = BitSet::with_capacity(self.states.len());
        for id in ids {
            if let Some(idx) = self.index_of(id) {
                set.insert(idx.as_usize());
            }
        }
        set
    }

    pub(crate) fn any_final(&self, set: &BitSet) -> bool {
        set.iter().any(|i| self.states[StateIdx::from_usize(i)].is_final)
    }
}

/// Identity key of a set: members sorted, comma-joined and braced, `∅` when empty.
pub fn canonical_key<T: Ord + fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let mut items: Vec<T> = items.into_iter().collect();
    if items.is_empty() {
        return EMPTY_SET.to_string();
    }
    items.sort();
    items.dedup();

    let joined: Vec<String> = items.iter().map(|x| x.to_string()).collect();
    format!("{{{}}}", joined.join(","))
}

// human-readable form used in step descriptions
pub fn format_state_set<T: AsRef<str>>(ids: &[T]) -> String {
    match ids {
        [] => EMPTY_SET.to_string(),
        [single] => single.as_ref().to_string(),
        _ => {
            let mut sorted: Vec<&str> = ids.iter().map(|x| x.as_ref()).collect();
            sorted.sort();
            format!("{{{}}}", sorted.join(", "))
        }
    }
}
