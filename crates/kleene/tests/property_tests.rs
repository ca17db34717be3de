use std::collections::BTreeSet;

use kleene::direct::regex_to_dfa;
use kleene::elimination::dfa_to_regex;
use kleene::subset::nfa_to_dfa;
use kleene::{ConvertOptions, Dfa, Nfa, Regex, StepRecorder};
use proptest::prelude::*;

// positions reachable after matching `re` against `input` starting at `from`
fn ends(re: &Regex, input: &[char], from: usize) -> BTreeSet<usize> {
    match re {
        Regex::Char(c) => {
            if input.get(from) == Some(c) {
                BTreeSet::from([from + 1])
            } else {
                BTreeSet::new()
            }
        }
        Regex::Epsilon => BTreeSet::from([from]),
        Regex::EmptySet => BTreeSet::new(),
        Regex::Alternation(alternates) => {
            alternates.iter().flat_map(|re| ends(re, input, from)).collect()
        }
        Regex::Concatenation(factors) => {
            let mut current = BTreeSet::from([from]);
            for factor in factors {
                current = current.iter().flat_map(|p| ends(factor, input, *p)).collect();
            }
            current
        }
        Regex::Kleene(inner) => {
            let mut reached = BTreeSet::from([from]);
            let mut frontier = vec![from];
            while let Some(p) = frontier.pop() {
                for next in ends(inner, input, p) {
                    if reached.insert(next) {
                        frontier.push(next);
                    }
                }
            }
            reached
        }
    }
}

fn brute_force_match(re: &Regex, input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    ends(re, &chars, 0).contains(&chars.len())
}

fn arb_regex() -> impl Strategy<Value = Regex> {
    let leaf = prop_oneof![
        6 => prop::sample::select(vec!['a', 'b']).prop_map(Regex::Char),
        1 => Just(Regex::Epsilon),
        1 => Just(Regex::EmptySet),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..=3).prop_map(Regex::Alternation),
            prop::collection::vec(inner.clone(), 2..=3).prop_map(Regex::Concatenation),
            inner.prop_map(|re| Regex::Kleene(Box::new(re))),
        ]
    })
}

fn build_nfa(n: usize, edges: &[(usize, usize, usize)], finals: &[bool]) -> Nfa {
    const SYMBOLS: [&str; 3] = ["a", "b", "ε"];
    let ids: Vec<String> = (0..n).map(|i| format!("q{}", i)).collect();
    let triples: Vec<(&str, &str, &str)> = edges
        .iter()
        .map(|(from, symbol, to)| (ids[*from].as_str(), SYMBOLS[*symbol], ids[*to].as_str()))
        .collect();
    let finals: Vec<&str> = ids
        .iter()
        .zip(finals)
        .filter(|(_, is_final)| **is_final)
        .map(|(id, _)| id.as_str())
        .collect();
    Nfa::from_triples(&['a', 'b'], &triples, &[ids[0].as_str()], &finals)
}

fn arb_nfa() -> impl Strategy<Value = Nfa> {
    (1usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec((0..n, 0usize..3, 0..n), 0..12),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(move |(edges, finals)| build_nfa(n, &edges, &finals))
    })
}

fn build_dfa(n: usize, table: &[Option<usize>], finals: &[bool]) -> Dfa {
    let ids: Vec<String> = (0..n).map(|i| format!("q{}", i)).collect();
    let mut triples = Vec::new();
    for (i, target) in table.iter().enumerate() {
        if let Some(to) = target {
            let symbol = if i % 2 == 0 { 'a' } else { 'b' };
            triples.push((ids[i / 2].as_str(), symbol, ids[*to].as_str()));
        }
    }
    let finals: Vec<&str> = ids
        .iter()
        .zip(finals)
        .filter(|(_, is_final)| **is_final)
        .map(|(id, _)| id.as_str())
        .collect();
    Dfa::from_triples(&['a', 'b'], &triples, &ids[0], &finals)
}

fn arb_dfa() -> impl Strategy<Value = Dfa> {
    (1usize..5).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::option::of(0..n), 2 * n),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(move |(table, finals)| build_dfa(n, &table, &finals))
    })
}

fn direct(re_str: &str) -> Dfa {
    let mut recorder = StepRecorder::new(false);
    regex_to_dfa(re_str, &ConvertOptions::unbounded(), &mut recorder)
        .expect("regex should convert")
        .dfa
}

proptest! {
    #[test]
    fn subset_construction_preserves_language(
        nfa in arb_nfa(),
        inputs in prop::collection::vec("[ab]{0,10}", 8),
    ) {
        let mut recorder = StepRecorder::default();
        let dfa = nfa_to_dfa(&nfa, &ConvertOptions::default(), &mut recorder).unwrap().dfa;
        for input in &inputs {
            prop_assert_eq!(nfa.accepts(input), dfa.accepts(input), "input '{}'", input);
        }
    }

    #[test]
    fn subset_construction_is_deterministic(nfa in arb_nfa()) {
        let mut first = StepRecorder::default();
        let mut second = StepRecorder::default();
        let a = nfa_to_dfa(&nfa, &ConvertOptions::default(), &mut first).unwrap();
        let b = nfa_to_dfa(&nfa, &ConvertOptions::default(), &mut second).unwrap();

        prop_assert_eq!(a.dfa.states(), b.dfa.states());
        prop_assert_eq!(a.dfa.transitions(), b.dfa.transitions());
        prop_assert_eq!(first.steps(), second.steps());
    }

    #[test]
    fn direct_construction_matches_brute_force(
        re in arb_regex(),
        inputs in prop::collection::vec("[ab]{0,8}", 8),
    ) {
        let re_str = re.to_string();
        let dfa = direct(&re_str);
        for input in &inputs {
            prop_assert_eq!(
                dfa.accepts(input),
                brute_force_match(&re, input),
                "regex '{}' on '{}'",
                re_str,
                input
            );
        }
    }

    #[test]
    fn elimination_round_trips(dfa in arb_dfa(), inputs in prop::collection::vec("[ab]{0,8}", 12)) {
        let mut recorder = StepRecorder::default();
        let re_str = dfa_to_regex(&dfa, &mut recorder).unwrap().regex_string();
        let round_trip = direct(&re_str);
        for input in &inputs {
            prop_assert_eq!(
                dfa.accepts(input),
                round_trip.accepts(input),
                "regex '{}' on '{}'",
                re_str,
                input
            );
        }
    }

    #[test]
    fn simplification_is_idempotent_and_sound(
        re in arb_regex(),
        inputs in prop::collection::vec("[ab]{0,6}", 6),
    ) {
        let once = kleene::regex::simplify(&re.to_string()).unwrap();
        let twice = kleene::regex::simplify(&once).unwrap();
        prop_assert_eq!(&twice, &once);

        let simplified: Regex = once.parse().unwrap();
        for input in &inputs {
            prop_assert_eq!(
                brute_force_match(&simplified, input),
                brute_force_match(&re, input),
                "'{}' vs '{}'",
                once,
                re
            );
        }
    }
}
