//! Ordered record of the stages a conversion went through, for callers that
//! want to replay or explain it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Validate,
    Augment,
    SyntaxTree,
    Functions,
    Followpos,
    EpsilonClosures,
    DfaState,
    ConstructDfa,
    SubsetConstruction,
    Minimize,
    CreateGnfa,
    EliminateState,
    EliminateStates,
    Simplify,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub title: String,
    pub description: String,
    pub data: Value,
    // 1-based ordinal within the conversion, keeps traces reproducible
    pub timestamp: u64,
}

/// Append-only step log scoped to a single conversion.
#[derive(Debug)]
pub struct StepRecorder {
    steps: Vec<StepRecord>,
    enabled: bool,
}

impl Default for StepRecorder {
    fn default() -> Self {
        StepRecorder::new(true)
    }
}

impl StepRecorder {
    /// A disabled recorder drops every record and never builds the snapshots.
    pub fn new(enabled: bool) -> StepRecorder {
        StepRecorder {
            steps: Vec::new(),
            enabled,
        }
    }

    pub fn record(
        &mut self,
        kind: StepKind,
        title: impl Into<String>,
        description: impl Into<String>,
        data: impl FnOnce() -> Value,
    ) {
        if !self.enabled {
            return;
        }

        let n = self.steps.len() + 1;
        self.steps.push(StepRecord {
            id: format!("step_{}", n),
            kind,
            title: title.into(),
            description: description.into(),
            data: data(),
            timestamp: n as u64,
        });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}
