//! Regex → DFA without an intermediate NFA.
//!
//! The regex is augmented with an end marker `#`, turned into a binary syntax
//! tree whose leaves are numbered, and annotated with nullable, firstpos and
//! lastpos. followpos then links positions, and a DFA state is simply a set of
//! positions. A state is final iff it contains the end marker's position.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use bit_set::BitSet;
use kleene_util::make_type_idx;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::automaton::{canonical_key, Dfa, State, Transition, EMPTY_SET, END_MARKER, EPSILON};
use crate::error::ConvertError;
use crate::options::ConvertOptions;
use crate::regex::Regex;
use crate::trace::{StepKind, StepRecorder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Symbol(char),
    EndMarker,
    Epsilon,
    EmptySet,
    Concat,
    Union,
    Star,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    kind: NodeKind,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    position: Option<usize>,
    nullable: bool,
    firstpos: BitSet,
    lastpos: BitSet,
}

make_type_idx!(NodeIdx, Node);

/// Serializable view of a syntax tree node, used in step snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxTreeJson {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub nullable: bool,
    pub firstpos: Vec<usize>,
    pub lastpos: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<SyntaxTreeJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<SyntaxTreeJson>>,
}

// children are always pushed before their parent, so index order is a post-order
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeIdx,
    // symbol of each position, `None` for the end marker; index 0 is unused
    position_symbols: Vec<Option<char>>,
    followpos: Vec<BitSet>,
}

impl SyntaxTree {
    /// Builds the tree of `(re)#`. Positions are handed out left to right.
    pub fn augmented(re: &Regex) -> SyntaxTree {
        let mut tree = SyntaxTree {
            nodes: Vec::new(),
            root: NodeIdx::from_usize(0),
            position_symbols: vec![None],
            followpos: Vec::new(),
        };

        let body = tree.build(re);
        let end = tree.leaf(NodeKind::EndMarker);
        tree.root = tree.push(NodeKind::Concat, Some(body), Some(end));
        tree
    }

    fn push(&mut self, kind: NodeKind, left: Option<NodeIdx>, right: Option<NodeIdx>) -> NodeIdx {
        let node = Node {
            kind,
            left,
            right,
            position: None,
            nullable: false,
            firstpos: BitSet::new(),
            lastpos: BitSet::new(),
        };
        NodeIdx::from_push(&mut self.nodes, node)
    }

    fn leaf(&mut self, kind: NodeKind) -> NodeIdx {
        let idx = self.push(kind, None, None);
        let symbol = match kind {
            NodeKind::Symbol(c) => Some(c),
            NodeKind::EndMarker => None,
            // ε and ∅ leaves match nothing, so they take no position
            _ => return idx,
        };
        self.nodes[idx].position = Some(self.position_symbols.len());
        self.position_symbols.push(symbol);
        idx
    }

    fn build(&mut self, re: &Regex) -> NodeIdx {
        match re {
            Regex::Alternation(alternates) => {
                self.fold(alternates, NodeKind::Union, NodeKind::EmptySet)
            }
            Regex::Concatenation(factors) => {
                self.fold(factors, NodeKind::Concat, NodeKind::Epsilon)
            }
            Regex::Kleene(inner) => {
                let child = self.build(inner);
                self.push(NodeKind::Star, Some(child), None)
            }
            Regex::Char(c) => self.leaf(NodeKind::Symbol(*c)),
            Regex::Epsilon => self.leaf(NodeKind::Epsilon),
            Regex::EmptySet => self.leaf(NodeKind::EmptySet),
        }
    }

    // n-ary operator as a balanced tree of binary nodes, depth is logarithmic in
    // the number of operands
    fn fold(&mut self, children: &[Regex], op: NodeKind, identity: NodeKind) -> NodeIdx {
        match children {
            [] => self.leaf(identity),
            [only] => self.build(only),
            _ => {
                let (left, right) = children.split_at(children.len() / 2);
                let left = self.fold(left, op, identity);
                let right = self.fold(right, op, identity);
                self.push(op, Some(left), Some(right))
            }
        }
    }

    pub fn position_count(&self) -> usize {
        self.position_symbols.len() - 1
    }

    pub fn end_marker_position(&self) -> usize {
        self.position_count()
    }

    /// Alphabet of the expression, excluding the end marker.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.position_symbols.iter().flatten().copied().collect()
    }

    pub fn root_firstpos(&self) -> Vec<usize> {
        self.nodes[self.root].firstpos.iter().collect()
    }

    /// Computes nullable, firstpos and lastpos for every node.
    pub fn compute_functions(&mut self) {
        for i in 0..self.nodes.len() {
            let idx = NodeIdx::from_usize(i);
            let node = &self.nodes[idx];
            let (nullable, firstpos, lastpos) = match (node.kind, node.left, node.right) {
                (NodeKind::Symbol(_) | NodeKind::EndMarker, _, _) => {
                    let mut pos = BitSet::new();
                    if let Some(p) = node.position {
                        pos.insert(p);
                    }
                    (false, pos.clone(), pos)
                }
                (NodeKind::Epsilon, _, _) => (true, BitSet::new(), BitSet::new()),
                (NodeKind::EmptySet, _, _) => (false, BitSet::new(), BitSet::new()),
                (NodeKind::Union, Some(l), Some(r)) => {
                    let (l, r) = (&self.nodes[l], &self.nodes[r]);
                    let mut firstpos = l.firstpos.clone();
                    firstpos.union_with(&r.firstpos);
                    let mut lastpos = l.lastpos.clone();
                    lastpos.union_with(&r.lastpos);
                    (l.nullable || r.nullable, firstpos, lastpos)
                }
                (NodeKind::Concat, Some(l), Some(r)) => {
                    let (l, r) = (&self.nodes[l], &self.nodes[r]);
                    let mut firstpos = l.firstpos.clone();
                    if l.nullable {
                        firstpos.union_with(&r.firstpos);
                    }
                    let mut lastpos = r.lastpos.clone();
                    if r.nullable {
                        lastpos.union_with(&l.lastpos);
                    }
                    (l.nullable && r.nullable, firstpos, lastpos)
                }
                (NodeKind::Star, Some(c), _) => {
                    let c = &self.nodes[c];
                    (true, c.firstpos.clone(), c.lastpos.clone())
                }
                _ => unreachable!("operator node is missing a child"),
            };

            let node = &mut self.nodes[idx];
            node.nullable = nullable;
            node.firstpos = firstpos;
            node.lastpos = lastpos;
        }
    }

    /// Fills the followpos table. Requires [`SyntaxTree::compute_functions`].
    pub fn compute_followpos(&mut self) {
        let mut followpos = vec![BitSet::new(); self.position_symbols.len()];

        for node in &self.nodes {
            match (node.kind, node.left, node.right) {
                (NodeKind::Concat, Some(l), Some(r)) => {
                    let first_right = &self.nodes[r].firstpos;
                    for p in self.nodes[l].lastpos.iter() {
                        followpos[p].union_with(first_right);
                    }
                }
                (NodeKind::Star, _, _) => {
                    for p in node.lastpos.iter() {
                        followpos[p].union_with(&node.firstpos);
                    }
                }
                _ => {}
            }
        }

        self.followpos = followpos;
    }

    pub fn followpos(&self, position: usize) -> Vec<usize> {
        self.followpos.get(position).map(|f| f.iter().collect()).unwrap_or_default()
    }

    pub fn followpos_table(&self) -> BTreeMap<usize, Vec<usize>> {
        (1..self.position_symbols.len()).map(|p| (p, self.followpos(p))).collect()
    }

    pub fn to_json(&self) -> SyntaxTreeJson {
        // post-order, so both children are finished before their parent
        let mut done: Vec<Option<SyntaxTreeJson>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let json = Self::node_json(node, &mut done);
            done.push(Some(json));
        }
        done[self.root.as_usize()].take().expect("root is the last node built")
    }

    fn node_json(node: &Node, done: &mut [Option<SyntaxTreeJson>]) -> SyntaxTreeJson {
        let (kind, symbol) = match node.kind {
            NodeKind::Symbol(c) => ("symbol", Some(c.to_string())),
            NodeKind::EndMarker => ("symbol", Some(END_MARKER.to_string())),
            NodeKind::Epsilon => ("symbol", Some(EPSILON.to_string())),
            NodeKind::EmptySet => ("symbol", Some(EMPTY_SET.to_string())),
            NodeKind::Concat => ("concat", None),
            NodeKind::Union => ("union", None),
            NodeKind::Star => ("star", None),
        };
        let mut take = |idx: NodeIdx| {
            Box::new(done[idx.as_usize()].take().expect("child is built before its parent"))
        };

        SyntaxTreeJson {
            kind: kind.to_string(),
            symbol,
            position: node.position,
            nullable: node.nullable,
            firstpos: node.firstpos.iter().collect(),
            lastpos: node.lastpos.iter().collect(),
            left: node.left.map(&mut take),
            right: node.right.map(&mut take),
        }
    }

    /// Breadth-first construction over position sets.
    pub fn construct_dfa(
        &self,
        options: &ConvertOptions,
        recorder: &mut StepRecorder,
    ) -> Result<Dfa, ConvertError> {
        let alphabet = self.alphabet();
        let end = self.end_marker_position();

        let start = self.nodes[self.root].firstpos.clone();
        let start_id = canonical_key(start.iter());
        let mut dfa = Dfa::new(State::with_flags(start_id.clone(), true, start.contains(end)));
        dfa.extend_alphabet(alphabet.iter().copied());

        let mut ids: HashMap<BitSet, String> = HashMap::new();
        ids.insert(start.clone(), start_id);
        let mut work_queue: VecDeque<BitSet> = VecDeque::new();
        work_queue.push_back(start);

        while let Some(current) = work_queue.pop_front() {
            let current_id = ids[&current].clone();
            let mut moves = Vec::new();

            for &symbol in &alphabet {
                let mut next = BitSet::new();
                for p in current.iter().filter(|p| self.position_symbols[*p] == Some(symbol)) {
                    next.union_with(&self.followpos[p]);
                }
                if next.is_empty() {
                    continue;
                }

                let next_id = match ids.get(&next) {
                    Some(id) => id.clone(),
                    None => {
                        if !options.allows(ids.len() + 1) {
                            return Err(ConvertError::StateLimitExceeded {
                                limit: options.max_dfa_states.unwrap_or(ids.len()),
                            });
                        }
                        let id = canonical_key(next.iter());
                        trace!("new DFA state {}", id);
                        dfa.add_state(State::with_flags(id.clone(), false, next.contains(end)));
                        ids.insert(next.clone(), id.clone());
                        work_queue.push_back(next);
                        id
                    }
                };

                dfa.add_transition(Transition::new(current_id.clone(), next_id.clone(), symbol));
                moves.push(json!({"symbol": symbol.to_string(), "to": next_id}));
            }

            let is_final = current.contains(end);
            recorder.record(
                StepKind::DfaState,
                format!("Process State {}", current_id),
                format!("Compute the transitions of position set {}", current_id),
                || {
                    json!({
                        "state": current_id,
                        "positions": current.iter().collect::<Vec<_>>(),
                        "isFinal": is_final,
                        "transitions": moves,
                    })
                },
            );
        }

        debug!("direct construction produced {} states", dfa.states().len());
        Ok(dfa)
    }
}

/// Result of a successful direct construction.
#[derive(Clone, Debug)]
pub struct DirectConstruction {
    pub dfa: Dfa,
    pub tree: SyntaxTree,
}

/// Parses `re_str` and builds its DFA, recording each stage.
pub fn regex_to_dfa(
    re_str: &str,
    options: &ConvertOptions,
    recorder: &mut StepRecorder,
) -> Result<DirectConstruction, ConvertError> {
    let regex: Regex = re_str.parse()?;
    let augmented = format!("({}){}", re_str.trim(), END_MARKER);
    recorder.record(
        StepKind::Augment,
        "Create Augmented Regular Expression",
        format!("Add end marker to regex: {} → {}", re_str, augmented),
        || json!({"originalRegex": re_str, "augmentedRegex": augmented}),
    );

    let mut tree = SyntaxTree::augmented(&regex);
    recorder.record(
        StepKind::SyntaxTree,
        "Build Syntax Tree",
        format!("Construct syntax tree with {} positions", tree.position_count()),
        || json!({"syntaxTree": tree.to_json()}),
    );

    tree.compute_functions();
    recorder.record(
        StepKind::Functions,
        "Calculate nullable, firstpos, lastpos",
        "Compute attributes for each node in syntax tree",
        || json!({"syntaxTree": tree.to_json()}),
    );

    tree.compute_followpos();
    recorder.record(
        StepKind::Followpos,
        "Calculate followpos",
        "Compute followpos for each position",
        || json!({"followposTable": tree.followpos_table()}),
    );

    let dfa = tree.construct_dfa(options, recorder)?;
    recorder.record(
        StepKind::ConstructDfa,
        "Construct DFA",
        "Build DFA states and transitions using position sets",
        || json!({"dfa": dfa.to_json()}),
    );

    Ok(DirectConstruction { dfa, tree })
}
