use std::ops::Deref;

use bit_set::BitSet;

use super::{Automaton, AutomatonJson, State, Symbol, Transition};

/// Nondeterministic automaton with any number of start states and epsilon moves.
#[derive(Clone, Debug, Default)]
pub struct Nfa {
    core: Automaton,
}

impl Nfa {
    pub fn new() -> Nfa {
        Nfa::default()
    }

    pub(crate) fn from_automaton(core: Automaton) -> Nfa {
        Nfa { core }
    }

    /// Builds an NFA from `(from, symbol, to)` triples where the symbol is a
    /// single character, `ε` or `epsilon`. Triples with any other symbol are
    /// skipped.
    pub fn from_triples(
        alphabet: &[char],
        triples: &[(&str, &str, &str)],
        starts: &[&str],
        finals: &[&str],
    ) -> Nfa {
        let mut ids: Vec<&str> = triples.iter().flat_map(|(from, _, to)| [*from, *to]).collect();
        ids.extend_from_slice(starts);
        ids.extend_from_slice(finals);
        ids.sort();
        ids.dedup();

        let mut nfa = Nfa::new();
        for id in ids {
            nfa.add_state(State::with_flags(id, starts.contains(&id), finals.contains(&id)));
        }
        for (from, symbol, to) in triples {
            if let Some(symbol) = Symbol::parse(symbol) {
                nfa.add_transition(Transition::new(*from, *to, symbol));
            }
        }
        nfa.core.extend_alphabet(alphabet.iter().copied());
        nfa
    }

    pub fn add_state(&mut self, state: State) -> bool {
        self.core.add_state(state)
    }

    pub fn add_transition(&mut self, transition: Transition) -> bool {
        self.core.add_transition(transition)
    }

    pub fn set_start(&mut self, id: &str, is_start: bool) -> bool {
        self.core.set_start(id, is_start)
    }

    pub fn set_final(&mut self, id: &str, is_final: bool) -> bool {
        self.core.set_final(id, is_final)
    }

    pub fn extend_alphabet(&mut self, symbols: impl IntoIterator<Item = char>) {
        self.core.extend_alphabet(symbols)
    }

    /// Direct successors of `id` on `symbol`, without epsilon closure.
    pub fn next_states(&self, id: &str, symbol: Symbol) -> Vec<&str> {
        match self.core.index_of(id) {
            Some(from) => self
                .core
                .targets(from, symbol)
                .map(|to| self.core.state_at(to).id.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Epsilon-closure of a set of state ids, sorted. Unknown ids are ignored.
    pub fn epsilon_closure<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut set = self.core.index_set(ids);
        self.core.epsilon_closure(&mut set);
        self.core.sorted_ids(&set)
    }

    pub(crate) fn start_set(&self) -> BitSet {
        let mut set = self.core.index_set(self.core.start_ids());
        self.core.epsilon_closure(&mut set);
        set
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.start_set();

        for c in input.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.core.delta(&current, c);
            self.core.epsilon_closure(&mut current);
        }

        self.core.any_final(&current)
    }

    pub fn to_json(&self) -> AutomatonJson {
        AutomatonJson {
            states: self.core.states().to_vec(),
            transitions: self.core.transitions().to_vec(),
            alphabet: self.core.alphabet().iter().map(|c| c.to_string()).collect(),
            start_state: None,
            start_states: Some(self.core.start_ids().map(String::from).collect()),
            final_states: self.core.final_ids().map(String::from).collect(),
        }
    }
}

impl Deref for Nfa {
    type Target = Automaton;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // q0 --ε--> q1, q0 --a--> q0, q1 --b--> q2: accepts a*b
    fn a_star_b() -> Nfa {
        Nfa::from_triples(
            &['a', 'b'],
            &[("q0", "ε", "q1"), ("q0", "a", "q0"), ("q1", "b", "q2")],
            &["q0"],
            &["q2"],
        )
    }

    #[test]
    fn accepts_through_epsilon_moves() {
        let nfa = a_star_b();
        let cases = [
            ("b", true),
            ("ab", true),
            ("aab", true),
            ("a", false),
            ("ba", false),
            ("", false),
        ];
        for (input, expected) in cases {
            assert_eq!(nfa.accepts(input), expected, "input '{}'", input);
        }
    }

    #[test]
    fn epsilon_closure_is_sorted() {
        let nfa = a_star_b();
        assert_eq!(nfa.epsilon_closure(["q0"]), vec!["q0", "q1"]);
        assert_eq!(nfa.epsilon_closure(["q2"]), vec!["q2"]);
    }

    #[test]
    fn next_states_is_plural() {
        let nfa = Nfa::from_triples(&['a'], &[("p", "a", "q"), ("p", "a", "r")], &["p"], &["r"]);
        assert_eq!(nfa.next_states("p", Symbol::Char('a')), vec!["q", "r"]);
        assert!(nfa.next_states("q", Symbol::Char('a')).is_empty());
    }

    #[test]
    fn epsilon_spelled_out_is_accepted() {
        let nfa =
            Nfa::from_triples(&['a'], &[("p", "epsilon", "q"), ("q", "a", "r")], &["p"], &["r"]);
        assert!(nfa.accepts("a"));
        assert_eq!(nfa.transitions()[0].symbol, Symbol::Epsilon);
    }

    #[test]
    fn multiple_start_states() {
        let nfa = Nfa::from_triples(
            &['a', 'b'],
            &[("p", "a", "f"), ("q", "b", "f")],
            &["p", "q"],
            &["f"],
        );
        assert!(nfa.accepts("a"));
        assert!(nfa.accepts("b"));
        assert!(!nfa.accepts("ab"));
        assert_eq!(nfa.to_json().start_states, Some(vec!["p".to_string(), "q".to_string()]));
    }
}
