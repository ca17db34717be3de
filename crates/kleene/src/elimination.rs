//! Automaton → regex by state elimination on a generalized NFA.
//!
//! Edges of a [`Gnfa`] carry whole regexes. After construction every ordered
//! pair of distinct states has an edge, `∅` standing in for "no transition",
//! so eliminating a state never has to special-case missing edges.

use std::collections::HashMap;

use log::{debug, trace};
use serde_json::{json, Value};

use crate::automaton::{Automaton, Dfa, Nfa, Symbol};
use crate::error::{AutomatonKind, ConvertError, ValidationError};
use crate::regex::Regex;
use crate::subset::validate_nfa;
use crate::trace::{StepKind, StepRecorder};

const START_NAME: &str = "qstart";
const ACCEPT_NAME: &str = "qfinal";

#[derive(Clone, Debug)]
pub struct Gnfa {
    // qstart first, then the original states in insertion order, then qfinal
    states: Vec<String>,
    start: String,
    accept: String,
    edges: HashMap<(String, String), Regex>,
}

impl Gnfa {
    /// Wraps `fa` with a fresh start state and a fresh accepting state. Every
    /// start state of `fa` is entered by `ε` from the new start, every final
    /// state leaves by `ε` to the new accepting state.
    pub fn from_automaton(fa: &Automaton) -> Gnfa {
        let start = fa.fresh_id(START_NAME);
        let accept = fa.fresh_id(ACCEPT_NAME);

        let mut states = Vec::with_capacity(fa.states().len() + 2);
        states.push(start.clone());
        states.extend(fa.states().iter().map(|s| s.id.clone()));
        states.push(accept.clone());

        let mut gnfa = Gnfa {
            states,
            start: start.clone(),
            accept: accept.clone(),
            edges: HashMap::new(),
        };

        for id in fa.start_ids() {
            gnfa.add_edge(&start, id, Regex::Epsilon);
        }
        for id in fa.final_ids() {
            gnfa.add_edge(id, &accept, Regex::Epsilon);
        }
        for t in fa.transitions() {
            let label = match t.symbol {
                Symbol::Epsilon => Regex::Epsilon,
                Symbol::Char(c) => Regex::Char(c),
            };
            gnfa.add_edge(&t.from, &t.to, label);
        }

        for p in &gnfa.states {
            for q in &gnfa.states {
                if p != q {
                    gnfa.edges.entry((p.clone(), q.clone())).or_insert(Regex::EmptySet);
                }
            }
        }

        gnfa
    }

    // parallel edges are combined by union
    fn add_edge(&mut self, from: &str, to: &str, label: Regex) {
        let key = (from.to_string(), to.to_string());
        let combined = match self.edges.remove(&key) {
            Some(existing) => Regex::union([existing, label]),
            None => label,
        };
        self.edges.insert(key, combined);
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// Label of the edge `from → to`; `∅` when there is none.
    pub fn label(&self, from: &str, to: &str) -> &Regex {
        const NONE: &Regex = &Regex::EmptySet;
        self.edges.get(&(from.to_string(), to.to_string())).unwrap_or(NONE)
    }

    /// The states elimination has to remove, in elimination order.
    pub fn interior(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|s| **s != self.start && **s != self.accept)
            .cloned()
            .collect()
    }

    /// Removes `r`, rerouting every path `p → r → q` through a direct edge
    /// labelled `R1 (R0)* R2`. Returns the bypass edges that were added.
    pub fn eliminate(&mut self, r: &str) -> Vec<(String, String, Regex)> {
        let self_loop = self.edges.get(&(r.to_string(), r.to_string())).cloned();
        let others: Vec<String> = self.states.iter().filter(|s| *s != r).cloned().collect();
        let mut bypasses = Vec::new();

        for p in &others {
            let incoming = self.label(p, r).clone();
            if incoming == Regex::EmptySet {
                continue;
            }
            for q in &others {
                let outgoing = self.label(r, q).clone();
                if outgoing == Regex::EmptySet {
                    continue;
                }

                let bypass = match &self_loop {
                    Some(loop_label) => {
                        Regex::concat([incoming.clone(), Regex::star(loop_label.clone()), outgoing])
                    }
                    None => Regex::concat([incoming.clone(), outgoing]),
                };
                trace!("bypass {} -> {} via {}: {}", p, q, r, bypass);
                self.add_edge(p, q, bypass.clone());
                bypasses.push((p.clone(), q.clone(), bypass));
            }
        }

        self.edges.retain(|(from, to), _| from != r && to != r);
        self.states.retain(|s| s != r);
        bypasses
    }

    /// Non-`∅` edges in state order, for step snapshots.
    pub fn to_json(&self) -> Value {
        let mut edges = Vec::new();
        for p in &self.states {
            for q in &self.states {
                let label = self.label(p, q);
                if *label != Regex::EmptySet {
                    edges.push(json!({"from": p, "to": q, "regex": label.to_string()}));
                }
            }
        }
        json!({"states": self.states, "start": self.start, "accept": self.accept, "edges": edges})
    }
}

/// Result of a successful elimination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Elimination {
    /// The `qstart → qfinal` label before simplification.
    pub raw: Regex,
    pub regex: Regex,
}

impl Elimination {
    pub fn regex_string(&self) -> String {
        self.regex.to_string()
    }
}

pub fn validate_dfa(dfa: &Dfa) -> Result<(), ValidationError> {
    let problems = dfa.problems();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            kind: AutomatonKind::Dfa,
            problems,
        })
    }
}

pub fn dfa_to_regex(dfa: &Dfa, recorder: &mut StepRecorder) -> Result<Elimination, ConvertError> {
    validate_dfa(dfa)?;
    recorder.record(
        StepKind::Validate,
        "Validate DFA",
        "Check DFA structure and properties",
        || json!({"dfa": dfa.to_json()}),
    );
    Ok(eliminate_all(dfa, recorder))
}

pub fn nfa_to_regex(nfa: &Nfa, recorder: &mut StepRecorder) -> Result<Elimination, ConvertError> {
    validate_nfa(nfa)?;
    recorder.record(
        StepKind::Validate,
        "Validate NFA",
        "Check NFA structure and properties",
        || json!({"nfa": nfa.to_json()}),
    );
    Ok(eliminate_all(nfa, recorder))
}

fn eliminate_all(fa: &Automaton, recorder: &mut StepRecorder) -> Elimination {
    let mut gnfa = Gnfa::from_automaton(fa);
    recorder.record(
        StepKind::CreateGnfa,
        "Create GNFA",
        format!("Add new start state {} and accepting state {}", gnfa.start(), gnfa.accept()),
        || json!({"gnfa": gnfa.to_json()}),
    );

    let order = gnfa.interior();
    debug!("eliminating {} states", order.len());

    for r in &order {
        let before = snapshot(recorder, &gnfa);
        let self_loop = gnfa.label(r, r).clone();
        let bypasses = gnfa.eliminate(r);

        recorder.record(
            StepKind::EliminateState,
            format!("Eliminate State {}", r),
            format!("Remove state {} and reroute {} paths through it", r, bypasses.len()),
            || {
                let new_edges: Vec<Value> = bypasses
                    .iter()
                    .map(|(p, q, re)| json!({"from": p, "to": q, "regex": re.to_string()}))
                    .collect();
                json!({
                    "state": r,
                    "selfLoop": self_loop.to_string(),
                    "newEdges": new_edges,
                    "before": before,
                    "after": gnfa.to_json(),
                    "remainingStates": gnfa.states(),
                })
            },
        );
    }

    let raw = gnfa.label(gnfa.start(), gnfa.accept()).clone();
    recorder.record(
        StepKind::EliminateStates,
        "Eliminate Intermediate States",
        format!("Read the regex off the edge {} → {}", gnfa.start(), gnfa.accept()),
        || json!({"regex": raw.to_string(), "eliminationOrder": order}),
    );

    let regex = raw.simplified();
    recorder.record(
        StepKind::Simplify,
        "Simplify Regular Expression",
        "Apply simplification rules until nothing changes",
        || json!({"original": raw.to_string(), "simplified": regex.to_string()}),
    );

    Elimination { raw, regex }
}

// only built when steps are being kept
fn snapshot(recorder: &StepRecorder, gnfa: &Gnfa) -> Value {
    if recorder.is_enabled() {
        gnfa.to_json()
    } else {
        Value::Null
    }
}
