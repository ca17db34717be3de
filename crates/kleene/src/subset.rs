//! NFA → DFA by subset construction, followed by reachability pruning.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use bit_set::BitSet;
use log::{debug, trace};
use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;
use serde_json::json;

use crate::automaton::{canonical_key, format_state_set, Automaton, Dfa, Nfa, State, Transition};
use crate::error::{AutomatonKind, ConvertError, ValidationError};
use crate::options::ConvertOptions;
use crate::trace::{StepKind, StepRecorder};

/// Result of a successful subset construction.
#[derive(Clone, Debug)]
pub struct SubsetConstruction {
    pub dfa: Dfa,
    /// DFA state id → the NFA states it stands for.
    pub state_mapping: BTreeMap<String, Vec<String>>,
}

/// Checks that `nfa` can be converted, reporting every problem at once.
pub fn validate_nfa(nfa: &Nfa) -> Result<(), ValidationError> {
    let mut problems = nfa.problems();
    if !nfa.states().is_empty() && nfa.start_ids().next().is_none() {
        problems.push("NFA must have at least one start state".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            kind: AutomatonKind::Nfa,
            problems,
        })
    }
}

// closures of state sets, memoized for the duration of one construction
struct ClosureCache<'a> {
    fa: &'a Automaton,
    cache: HashMap<BitSet, BitSet>,
}

impl<'a> ClosureCache<'a> {
    fn new(fa: &'a Automaton) -> ClosureCache<'a> {
        ClosureCache {
            fa,
            cache: HashMap::new(),
        }
    }

    fn closure(&mut self, set: BitSet) -> BitSet {
        if let Some(closed) = self.cache.get(&set) {
            return closed.clone();
        }

        let mut closed = set.clone();
        self.fa.epsilon_closure(&mut closed);
        self.cache.insert(set, closed.clone());
        closed
    }
}

pub fn nfa_to_dfa(
    nfa: &Nfa,
    options: &ConvertOptions,
    recorder: &mut StepRecorder,
) -> Result<SubsetConstruction, ConvertError> {
    validate_nfa(nfa)?;
    recorder.record(
        StepKind::Validate,
        "Validate NFA",
        "Check NFA structure and properties",
        || json!({"nfa": nfa.to_json()}),
    );

    let fa: &Automaton = nfa;
    let mut closures = ClosureCache::new(fa);

    let per_state: BTreeMap<String, Vec<String>> = fa
        .states()
        .iter()
        .map(|s| {
            let closed = closures.closure(fa.index_set([s.id.as_str()]));
            (s.id.clone(), fa.sorted_ids(&closed))
        })
        .collect();
    recorder.record(
        StepKind::EpsilonClosures,
        "Calculate ε-closures",
        "Compute ε-closure for each NFA state",
        || json!({"closures": per_state}),
    );

    let start = closures.closure(fa.index_set(fa.start_ids()));
    let start_members = fa.sorted_ids(&start);
    let start_id = canonical_key(start_members.iter());
    debug!("subset construction starts from {}", start_id);

    let mut dfa = Dfa::new(State::with_flags(start_id.clone(), true, fa.any_final(&start)));
    dfa.extend_alphabet(fa.alphabet().iter().copied());

    let mut state_mapping: BTreeMap<String, Vec<String>> = BTreeMap::new();
    state_mapping.insert(start_id.clone(), start_members);

    // configuration -> DFA state id
    let mut subsets: HashMap<BitSet, String> = HashMap::new();
    subsets.insert(start.clone(), start_id);

    let mut work_queue: VecDeque<BitSet> = VecDeque::new();
    work_queue.push_back(start);

    while let Some(q) = work_queue.pop_front() {
        let q_id = subsets[&q].clone();
        let mut moves = Vec::new();

        for &c in fa.alphabet() {
            let t = fa.delta(&q, c);
            if t.is_empty() {
                continue;
            }
            let t = closures.closure(t);

            let t_id = match subsets.get(&t) {
                Some(id) => id.clone(),
                None => {
                    if !options.allows(subsets.len() + 1) {
                        return Err(ConvertError::StateLimitExceeded {
                            limit: options.max_dfa_states.unwrap_or(subsets.len()),
                        });
                    }

                    let members = fa.sorted_ids(&t);
                    // NFA ids may contain ',' or braces, so two subsets can share a key
                    let id = dfa.fresh_id(&canonical_key(members.iter()));
                    trace!("new DFA state {}", id);
                    dfa.add_state(State::with_flags(id.clone(), false, fa.any_final(&t)));
                    state_mapping.insert(id.clone(), members);
                    subsets.insert(t.clone(), id.clone());
                    work_queue.push_back(t);
                    id
                }
            };

            dfa.add_transition(Transition::new(q_id.clone(), t_id.clone(), c));
            moves.push(json!({"symbol": c.to_string(), "to": t_id}));
        }

        let members = &state_mapping[&q_id];
        recorder.record(
            StepKind::DfaState,
            format!("Process State {}", q_id),
            format!("Compute transitions from NFA states {}", format_state_set(members.as_slice())),
            || {
                json!({
                    "state": q_id,
                    "nfaStates": members,
                    "isFinal": fa.any_final(&q),
                    "transitions": moves,
                })
            },
        );
    }

    recorder.record(
        StepKind::SubsetConstruction,
        "Subset Construction",
        format!("Built {} DFA states from NFA state sets", dfa.states().len()),
        || json!({"dfa": dfa.to_json(), "stateMapping": state_mapping}),
    );

    let pruned = prune_unreachable(&dfa);
    let removed: Vec<&str> = dfa
        .states()
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !pruned.contains_state(id))
        .collect();
    recorder.record(
        StepKind::Minimize,
        "Remove Unreachable States",
        format!("Removed {} unreachable states", removed.len()),
        || json!({"removedStates": removed, "dfa": pruned.to_json()}),
    );
    state_mapping.retain(|id, _| pruned.contains_state(id));

    debug!("subset construction produced {} states", pruned.states().len());
    Ok(SubsetConstruction {
        dfa: pruned,
        state_mapping,
    })
}

/// Copy of `dfa` without the states that cannot be reached from its start
/// state. Running it on its own output changes nothing.
pub fn prune_unreachable(dfa: &Dfa) -> Dfa {
    let graph = dfa.to_graph();
    let mut reachable: HashSet<&str> = HashSet::new();

    let mut bfs = Bfs::new(&graph, NodeIndex::new(dfa.start_idx().as_usize()));
    while let Some(node) = bfs.next(&graph) {
        reachable.insert(graph[node].as_str());
    }

    if reachable.len() == dfa.states().len() {
        return dfa.clone();
    }

    let mut core = dfa.clone().into_automaton();
    core.retain_states(|s| reachable.contains(s.id.as_str()));
    match core.index_of(&dfa.start_state().id) {
        Some(start) => Dfa::from_parts(core, start),
        None => dfa.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_star_b() -> Nfa {
        Nfa::from_triples(
            &['a', 'b'],
            &[("q0", "ε", "q1"), ("q0", "a", "q0"), ("q1", "b", "q2")],
            &["q0"],
            &["q2"],
        )
    }

    #[test]
    fn subset_states_are_canonical_keys() {
        let mut recorder = StepRecorder::default();
        let result = nfa_to_dfa(&a_star_b(), &ConvertOptions::default(), &mut recorder).unwrap();

        assert_eq!(result.dfa.start_state().id, "{q0,q1}");
        assert!(result.dfa.contains_state("{q2}"));
        assert_eq!(result.dfa.final_ids().collect::<Vec<_>>(), vec!["{q2}"]);
        assert_eq!(result.state_mapping["{q0,q1}"], vec!["q0", "q1"]);
    }

    #[test]
    fn steps_in_order() {
        let mut recorder = StepRecorder::default();
        nfa_to_dfa(&a_star_b(), &ConvertOptions::default(), &mut recorder).unwrap();
        let kinds: Vec<StepKind> = recorder.steps().iter().map(|s| s.kind).collect();

        assert_eq!(&kinds[..2], &[StepKind::Validate, StepKind::EpsilonClosures]);
        assert_eq!(&kinds[kinds.len() - 2..], &[StepKind::SubsetConstruction, StepKind::Minimize]);
        assert_eq!(kinds.iter().filter(|k| **k == StepKind::DfaState).count(), 2);
        assert_eq!(recorder.steps()[1].data["closures"]["q0"], json!(["q0", "q1"]));
    }

    #[test]
    fn missing_start_state_is_reported() {
        let nfa = Nfa::from_triples(&['a'], &[("q0", "a", "q1")], &[], &["q1"]);
        let mut recorder = StepRecorder::default();
        let err = nfa_to_dfa(&nfa, &ConvertOptions::default(), &mut recorder).unwrap_err();

        assert_eq!(err.to_string(), "Invalid NFA: NFA must have at least one start state");
        assert!(recorder.is_empty());
    }

    #[test]
    fn state_limit_is_enforced() {
        let options = ConvertOptions {
            max_dfa_states: Some(1),
            record_steps: false,
        };
        let mut recorder = StepRecorder::new(false);
        let err = nfa_to_dfa(&a_star_b(), &options, &mut recorder).unwrap_err();
        assert_eq!(err, ConvertError::StateLimitExceeded { limit: 1 });
    }

    #[test]
    fn pruning_drops_unreachable_and_is_idempotent() {
        let dfa = Dfa::from_triples(&['a'], &[("s", 'a', "t"), ("u", 'a', "t")], "s", &["t"]);
        let pruned = prune_unreachable(&dfa);

        assert!(!pruned.contains_state("u"));
        assert_eq!(pruned.states().len(), 2);
        assert_eq!(pruned.transitions().len(), 1);
        assert_eq!(pruned.start_state().id, "s");
        assert!(pruned.accepts("a"));

        let again = prune_unreachable(&pruned);
        assert_eq!(again.states(), pruned.states());
        assert_eq!(again.transitions(), pruned.transitions());
    }
}
