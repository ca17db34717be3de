//! Request/response boundary. Each `convert` call owns its recorder, catches
//! every error and reports it in the response together with the steps that
//! were recorded before the failure.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::automaton::{AutomatonJson, Dfa, DfaJson, Nfa, NfaJson};
use crate::direct::{self, SyntaxTreeJson};
use crate::elimination;
use crate::error::ConvertError;
use crate::options::ConvertOptions;
use crate::subset;
use crate::trace::{StepRecord, StepRecorder};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexToDfaRequest {
    pub regex: String,
    #[serde(default)]
    pub options: ConvertOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfaToDfaRequest {
    pub nfa: NfaJson,
    #[serde(default)]
    pub options: ConvertOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfaToRegexRequest {
    pub dfa: DfaJson,
    #[serde(default)]
    pub options: ConvertOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfaToRegexRequest {
    pub nfa: NfaJson,
    #[serde(default)]
    pub options: ConvertOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfaResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dfa: Option<AutomatonJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_tree: Option<SyntaxTreeJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followpos_table: Option<BTreeMap<usize, Vec<usize>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_nfa: Option<AutomatonJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mapping: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_dfa: Option<AutomatonJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_nfa: Option<AutomatonJson>,
}

// runs one conversion with a fresh recorder; the error is already rendered
fn run<T>(
    name: &str,
    options: &ConvertOptions,
    convert: impl FnOnce(&mut StepRecorder) -> Result<T, ConvertError>,
) -> (Result<T, String>, Option<Vec<StepRecord>>) {
    let mut recorder = StepRecorder::new(options.record_steps);
    let result = convert(&mut recorder).map_err(|e| {
        warn!("{} failed: {}", name, e);
        e.to_string()
    });
    debug!("{} recorded {} steps", name, recorder.len());

    let steps = options.record_steps.then(|| recorder.into_steps());
    (result, steps)
}

impl RegexToDfaRequest {
    pub fn new(regex: impl Into<String>) -> RegexToDfaRequest {
        RegexToDfaRequest {
            regex: regex.into(),
            options: ConvertOptions::default(),
        }
    }

    pub fn convert(&self) -> DfaResponse {
        let (result, steps) = run("regex to DFA", &self.options, |recorder| {
            direct::regex_to_dfa(&self.regex, &self.options, recorder)
        });

        match result {
            Ok(construction) => DfaResponse {
                success: true,
                dfa: Some(construction.dfa.to_json()),
                steps,
                syntax_tree: Some(construction.tree.to_json()),
                followpos_table: Some(construction.tree.followpos_table()),
                ..DfaResponse::default()
            },
            Err(error) => DfaResponse {
                steps,
                error: Some(error),
                ..DfaResponse::default()
            },
        }
    }
}

impl NfaToDfaRequest {
    pub fn convert(&self) -> DfaResponse {
        let mut original = None;
        let (result, steps) = run("NFA to DFA", &self.options, |recorder| {
            let nfa = Nfa::from_json(&self.nfa)?;
            original = Some(nfa.to_json());
            subset::nfa_to_dfa(&nfa, &self.options, recorder)
        });

        match result {
            Ok(construction) => DfaResponse {
                success: true,
                dfa: Some(construction.dfa.to_json()),
                steps,
                original_nfa: original,
                state_mapping: Some(construction.state_mapping),
                ..DfaResponse::default()
            },
            Err(error) => DfaResponse {
                steps,
                error: Some(error),
                original_nfa: original,
                ..DfaResponse::default()
            },
        }
    }
}

impl DfaToRegexRequest {
    pub fn convert(&self) -> RegexResponse {
        let mut original = None;
        let (result, steps) = run("DFA to regex", &self.options, |recorder| {
            let dfa = Dfa::from_json(&self.dfa)?;
            original = Some(dfa.to_json());
            elimination::dfa_to_regex(&dfa, recorder)
        });

        RegexResponse {
            original_dfa: original,
            ..regex_response(result, steps)
        }
    }
}

impl NfaToRegexRequest {
    pub fn convert(&self) -> RegexResponse {
        let mut original = None;
        let (result, steps) = run("NFA to regex", &self.options, |recorder| {
            let nfa = Nfa::from_json(&self.nfa)?;
            original = Some(nfa.to_json());
            elimination::nfa_to_regex(&nfa, recorder)
        });

        RegexResponse {
            original_nfa: original,
            ..regex_response(result, steps)
        }
    }
}

fn regex_response(
    result: Result<elimination::Elimination, String>,
    steps: Option<Vec<StepRecord>>,
) -> RegexResponse {
    match result {
        Ok(elimination) => RegexResponse {
            success: true,
            regex: Some(elimination.regex_string()),
            steps,
            ..RegexResponse::default()
        },
        Err(error) => RegexResponse {
            steps,
            error: Some(error),
            ..RegexResponse::default()
        },
    }
}
